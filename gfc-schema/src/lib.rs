#[cfg(feature = "args")]
pub mod args;
pub mod config;


use anyhow::{anyhow, ensure};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Highest value accepted by a hwmon `pwm<N>` file.
pub const PWM_MAX: u32 = 255;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DutyScale {
    /// 0-100, converted to the 0-255 PWM range before writing
    Percent,
    /// 0-1000, written to the PWM file as-is
    Permille,
}

impl DutyScale {
    pub fn max(self) -> i32 {
        match self {
            DutyScale::Percent => 100,
            DutyScale::Permille => 1000,
        }
    }

    /// Duty at the given ratio (0.0-1.0) of this scale.
    #[allow(clippy::cast_possible_truncation)]
    pub fn at_ratio(self, ratio: f64) -> Duty {
        let value = (f64::from(self.max()) * ratio.clamp(0.0, 1.0)).round() as i32;
        Duty { value, scale: self }
    }
}

impl Display for DutyScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DutyScale::Percent => "%",
            DutyScale::Permille => "‰",
        };
        Display::fmt(s, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duty {
    pub value: i32,
    pub scale: DutyScale,
}

impl Duty {
    pub fn percent(value: i32) -> Self {
        Self {
            value,
            scale: DutyScale::Percent,
        }
    }

    pub fn permille(value: i32) -> Self {
        Self {
            value,
            scale: DutyScale::Permille,
        }
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            value: self.value.clamp(0, self.scale.max()),
            scale: self.scale,
        }
    }

    /// The value that ends up in the PWM file.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_pwm(self) -> u32 {
        let Duty { value, scale } = self.clamped();
        match scale {
            DutyScale::Percent => {
                (f64::from(value) * f64::from(PWM_MAX) / 100.0).round() as u32
            }
            DutyScale::Permille => value as u32,
        }
    }
}

impl Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.scale)
    }
}

/// Temperature thresholds mapped to fan speed percentages.
///
/// A step `(bound, duty)` applies to temperatures strictly below `bound`.
/// Anything at or above the last bound gets `max`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepTable {
    pub steps: Vec<(f64, i32)>,
    pub max: i32,
}

impl StepTable {
    pub fn duty_at(&self, temp: f64) -> i32 {
        self.steps
            .iter()
            .find(|(bound, _)| temp < *bound)
            .map_or(self.max, |(_, duty)| *duty)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let max = DutyScale::Percent.max();
        for pair in self.steps.windows(2) {
            ensure!(
                pair[0].0 < pair[1].0,
                "Step temperatures must be strictly increasing ({} is followed by {})",
                pair[0].0,
                pair[1].0
            );
        }
        for duty in self.steps.iter().map(|(_, duty)| duty).chain([&self.max]) {
            ensure!(
                (0..=max).contains(duty),
                "Fan speed percentage must be between 0 and {max}, got {duty}"
            );
        }
        Ok(())
    }
}

impl Default for StepTable {
    fn default() -> Self {
        Self {
            steps: vec![(40.0, 0), (50.0, 30), (60.0, 50), (70.0, 70), (80.0, 85)],
            max: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SpeedPolicy {
    Stepped(StepTable),
    Linear { min_temp: i32, max_temp: i32 },
}

impl SpeedPolicy {
    pub fn linear(min_temp: i32, max_temp: i32) -> Self {
        Self::Linear { min_temp, max_temp }
    }

    pub fn scale(&self) -> DutyScale {
        match self {
            SpeedPolicy::Stepped(_) => DutyScale::Percent,
            SpeedPolicy::Linear { .. } => DutyScale::Permille,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn duty_at(&self, temp: f64) -> Duty {
        match self {
            SpeedPolicy::Stepped(table) => Duty::percent(table.duty_at(temp)),
            SpeedPolicy::Linear { min_temp, max_temp } => {
                let (min, max) = (f64::from(*min_temp), f64::from(*max_temp));
                let value = if temp <= min {
                    0
                } else if temp >= max {
                    DutyScale::Permille.max()
                } else {
                    ((temp - min) * 1000.0 / (max - min)).floor() as i32
                };
                Duty::permille(value)
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            SpeedPolicy::Stepped(table) => table.validate(),
            SpeedPolicy::Linear { min_temp, max_temp } => {
                ensure!(
                    min_temp < max_temp,
                    "Minimum temperature ({min_temp}) must be lower than maximum temperature ({max_temp})"
                );
                Ok(())
            }
        }
    }
}

impl Default for SpeedPolicy {
    fn default() -> Self {
        Self::Stepped(StepTable::default())
    }
}

impl Display for SpeedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedPolicy::Stepped(table) => write!(f, "stepped ({} steps)", table.steps.len()),
            SpeedPolicy::Linear { min_temp, max_temp } => {
                write!(f, "linear ({min_temp}°C-{max_temp}°C)")
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureSourceKind {
    #[default]
    Sysfs,
    Nvml,
}

impl FromStr for TemperatureSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sysfs" => Ok(Self::Sysfs),
            "nvml" => Ok(Self::Nvml),
            _ => Err(anyhow!("unknown temperature source '{s}'")),
        }
    }
}

impl Display for TemperatureSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TemperatureSourceKind::Sysfs => "sysfs",
            TemperatureSourceKind::Nvml => "nvml",
        };
        Display::fmt(s, f)
    }
}
