//! Path multiplexer and threshold comparison.
//!
//! The analog front-end is a single-owner capability: [`Probe`] holds it by
//! value and every conversion goes through `&mut self`, so a second caller can
//! never reconfigure the drive lines in the middle of another measurement.

mod path;

pub use path::{AnalogChannel, DriveConfig, Line, PATH_COUNT, Path, PerSide, Side};

use core::fmt;

use crate::calibration::{Circuit, Threshold, ThresholdTable};

/// Raw conversion did not finish inside the bounded wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConversionTimeout;

impl fmt::Display for ConversionTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("analog conversion timed out")
    }
}

/// Hardware seam for the connector drivers and the ADC.
pub trait AnalogFrontEnd {
    /// Applies direction and level masks to the seven connector lines.
    fn configure(&mut self, drive: DriveConfig);

    /// Performs one blocking conversion on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionTimeout`] when the converter does not complete in time.
    fn convert(&mut self, channel: AnalogChannel) -> Result<u16, ConversionTimeout>;
}

/// Comparison applied to the raw reading.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Polarity {
    /// Detected when the reading exceeds the threshold.
    Above,
    /// Detected when the reading is under the threshold.
    Below,
}

/// One probe request: which path, which calibrated threshold, which polarity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Measurement {
    pub path: Path,
    pub circuit: Circuit,
    pub polarity: Polarity,
}

impl Measurement {
    #[must_use]
    pub const fn above(path: Path, circuit: Circuit) -> Self {
        Self {
            path,
            circuit,
            polarity: Polarity::Above,
        }
    }

    #[must_use]
    pub const fn below(path: Path, circuit: Circuit) -> Self {
        Self {
            path,
            circuit,
            polarity: Polarity::Below,
        }
    }
}

/// Reasons a measurement produced no usable answer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SenseError {
    Timeout(Path),
    InvalidCalibration(Path),
}

impl fmt::Display for SenseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenseError::Timeout(path) => write!(f, "conversion timeout on {path}"),
            SenseError::InvalidCalibration(path) => {
                write!(f, "no valid threshold for {path}")
            }
        }
    }
}

/// Fault counters kept by the probe.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ProbeStats {
    pub conversions: u32,
    pub timeouts: u32,
    pub invalid_calibration: u32,
}

/// Owns the analog front-end and the thresholds of the active weapon.
pub struct Probe<F> {
    front_end: F,
    thresholds: ThresholdTable,
    stats: ProbeStats,
}

impl<F> Probe<F>
where
    F: AnalogFrontEnd,
{
    pub const fn new(front_end: F, thresholds: ThresholdTable) -> Self {
        Self {
            front_end,
            thresholds,
            stats: ProbeStats {
                conversions: 0,
                timeouts: 0,
                invalid_calibration: 0,
            },
        }
    }

    /// Configures the drive lines for the path, converts once and compares.
    ///
    /// # Errors
    ///
    /// Returns [`SenseError::InvalidCalibration`] without touching the hardware
    /// when the threshold is missing, or [`SenseError::Timeout`] when the
    /// conversion does not complete.
    pub fn sense(&mut self, measurement: Measurement) -> Result<bool, SenseError> {
        let path = measurement.path;
        let threshold = self.thresholds.threshold(path, measurement.circuit);
        let Some(limit) = threshold.value() else {
            self.stats.invalid_calibration = self.stats.invalid_calibration.saturating_add(1);
            return Err(SenseError::InvalidCalibration(path));
        };

        let (drive, channel) = path.wiring();
        self.front_end.configure(drive);
        self.stats.conversions = self.stats.conversions.wrapping_add(1);
        let raw = self.front_end.convert(channel).map_err(|ConversionTimeout| {
            self.stats.timeouts = self.stats.timeouts.saturating_add(1);
            SenseError::Timeout(path)
        })?;

        let raw = i32::from(raw);
        Ok(match measurement.polarity {
            Polarity::Above => raw > limit,
            Polarity::Below => raw < limit,
        })
    }

    /// Fail-safe variant used inside the scan loop: any error reads as "not detected".
    pub fn detect(&mut self, measurement: Measurement) -> bool {
        self.sense(measurement).unwrap_or(false)
    }

    pub fn set_thresholds(&mut self, thresholds: ThresholdTable) {
        self.thresholds = thresholds;
    }

    #[must_use]
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Threshold in force for one measurement.
    #[must_use]
    pub fn threshold(&self, measurement: Measurement) -> Threshold {
        self.thresholds.threshold(measurement.path, measurement.circuit)
    }

    #[must_use]
    pub fn stats(&self) -> ProbeStats {
        self.stats
    }

    pub fn front_end(&self) -> &F {
        &self.front_end
    }

    pub fn front_end_mut(&mut self) -> &mut F {
        &mut self.front_end
    }

    /// Releases the front-end, consuming the probe.
    pub fn into_front_end(self) -> F {
        self.front_end
    }
}
