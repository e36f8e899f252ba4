//! Board wiring for the STM32G0 scoring box.
//!
//! Each connector line has a GPIO that drives it through the series resistor
//! and, except for the drive-only A lines, an ADC input on the line side of
//! that resistor. Floating a line means switching its GPIO to a plain input.

use embassy_stm32::adc::{Adc, AnyAdcChannel, SampleTime};
use embassy_stm32::gpio::{Flex, Pull, Speed};
use embassy_stm32::peripherals::ADC1;
use embassy_time::{Duration, Instant};
use scoring_core::probe::Line;
use scoring_core::{AnalogChannel, AnalogFrontEnd, ConversionTimeout, DriveConfig, Side};

/// A conversion slower than this is reported as a timeout.
const CONVERSION_BUDGET: Duration = Duration::from_micros(20);

const LINES: [Line; 7] = [
    Line::A(Side::Left),
    Line::B(Side::Left),
    Line::C(Side::Left),
    Line::A(Side::Right),
    Line::B(Side::Right),
    Line::C(Side::Right),
    Line::Piste,
];

/// GPIOs driving the seven connector lines.
pub struct DriveLines<'d> {
    pub al: Flex<'d>,
    pub bl: Flex<'d>,
    pub cl: Flex<'d>,
    pub ar: Flex<'d>,
    pub br: Flex<'d>,
    pub cr: Flex<'d>,
    pub piste: Flex<'d>,
}

impl<'d> DriveLines<'d> {
    fn line_mut(&mut self, line: Line) -> &mut Flex<'d> {
        match line {
            Line::A(Side::Left) => &mut self.al,
            Line::B(Side::Left) => &mut self.bl,
            Line::C(Side::Left) => &mut self.cl,
            Line::A(Side::Right) => &mut self.ar,
            Line::B(Side::Right) => &mut self.br,
            Line::C(Side::Right) => &mut self.cr,
            Line::Piste => &mut self.piste,
        }
    }

    fn apply(&mut self, drive: DriveConfig) {
        for line in LINES {
            let pin = self.line_mut(line);
            if drive.drives_high(line) {
                pin.set_high();
                pin.set_as_output(Speed::VeryHigh);
            } else if drive.drives_low(line) {
                pin.set_low();
                pin.set_as_output(Speed::VeryHigh);
            } else {
                pin.set_as_input(Pull::None);
            }
        }
    }
}

/// ADC inputs on the sensed lines.
pub struct SenseInputs {
    pub bl: AnyAdcChannel<ADC1>,
    pub br: AnyAdcChannel<ADC1>,
    pub cl: AnyAdcChannel<ADC1>,
    pub cr: AnyAdcChannel<ADC1>,
    pub piste: AnyAdcChannel<ADC1>,
}

impl SenseInputs {
    fn channel_mut(&mut self, channel: AnalogChannel) -> &mut AnyAdcChannel<ADC1> {
        match channel {
            AnalogChannel::B(Side::Left) => &mut self.bl,
            AnalogChannel::B(Side::Right) => &mut self.br,
            AnalogChannel::C(Side::Left) => &mut self.cl,
            AnalogChannel::C(Side::Right) => &mut self.cr,
            AnalogChannel::Piste => &mut self.piste,
        }
    }
}

/// [`AnalogFrontEnd`] over the board's GPIOs and ADC1.
pub struct BoardFrontEnd<'d> {
    adc: Adc<'d, ADC1>,
    drive: DriveLines<'d>,
    sense: SenseInputs,
    applied: Option<DriveConfig>,
}

impl<'d> BoardFrontEnd<'d> {
    /// Takes ownership of the converter and pins, leaving every line floating.
    pub fn new(mut adc: Adc<'d, ADC1>, drive: DriveLines<'d>, sense: SenseInputs) -> Self {
        adc.set_sample_time(SampleTime::CYCLES12_5);
        let mut front_end = Self {
            adc,
            drive,
            sense,
            applied: None,
        };
        front_end.configure(DriveConfig::RELEASED);
        front_end
    }
}

impl AnalogFrontEnd for BoardFrontEnd<'_> {
    fn configure(&mut self, drive: DriveConfig) {
        // Consecutive measurements often share a configuration.
        if self.applied != Some(drive) {
            self.drive.apply(drive);
            self.applied = Some(drive);
        }
    }

    fn convert(&mut self, channel: AnalogChannel) -> Result<u16, ConversionTimeout> {
        let started = Instant::now();
        let reading = self.adc.blocking_read(self.sense.channel_mut(channel));
        if started.elapsed() > CONVERSION_BUDGET {
            return Err(ConversionTimeout);
        }
        Ok(reading)
    }
}
