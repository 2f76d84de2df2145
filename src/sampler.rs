//! Reading the raw analog input and averaging samples to reduce noise.

use core::marker::PhantomData;
use embedded_hal::adc::{Channel, OneShot};
use log::{debug, trace};

/// Something that can take one raw analog reading.
///
/// The reading is whatever the converter produces (e.g. 0-1023 for a 10 bit ADC), as a float.
pub trait AnalogSource {
    type Error;

    fn sample(&mut self) -> Result<f64, Self::Error>;
}

impl<S: AnalogSource + ?Sized> AnalogSource for &mut S {
    type Error = S::Error;

    fn sample(&mut self) -> Result<f64, Self::Error> {
        (**self).sample()
    }
}

/// An ADC channel read through `embedded_hal`'s `OneShot` trait
pub struct AdcInput<'a, ADC, A, WORD, PIN> {
    adc: &'a mut A,
    pin: PIN,
    _word: PhantomData<(ADC, WORD)>,
}

impl<'a, ADC, A, WORD, PIN> AdcInput<'a, ADC, A, WORD, PIN>
where
    A: OneShot<ADC, WORD, PIN>,
    PIN: Channel<ADC>,
    WORD: Into<f64>,
{
    /// Pairs the converter with the pin the battery is wired to
    pub fn new(adc: &'a mut A, pin: PIN) -> Self {
        AdcInput {
            adc,
            pin,
            _word: PhantomData,
        }
    }

    /// Gives back the pin
    pub fn release(self) -> PIN {
        self.pin
    }
}

impl<'a, ADC, A, WORD, PIN> AnalogSource for AdcInput<'a, ADC, A, WORD, PIN>
where
    A: OneShot<ADC, WORD, PIN>,
    PIN: Channel<ADC>,
    WORD: Into<f64>,
{
    type Error = A::Error;

    fn sample(&mut self) -> Result<f64, Self::Error> {
        let word: WORD = nb::block!(self.adc.read(&mut self.pin))?;
        Ok(word.into())
    }
}

/// Reads the source `samples` times and returns the arithmetic mean.
///
/// `samples` must be at least 1. With 0 nothing is read and the result is meaningless.
pub fn average<S: AnalogSource>(source: &mut S, samples: usize) -> Result<f64, S::Error> {
    // running mean, so N identical readings average to exactly that reading
    let mut avg = 0.0;
    for n in 1..=samples {
        let reading = source.sample()?;
        trace!("raw sample {}", reading);
        avg += (reading - avg) / n as f64;
    }

    debug!("average of {} samples: {}", samples, avg);
    Ok(avg)
}
