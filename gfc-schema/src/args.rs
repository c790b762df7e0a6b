pub use clap;

use crate::{config::FanControlSettings, SpeedPolicy, TemperatureSourceKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_MIN_TEMP: i32 = 30;
pub const DEFAULT_MAX_TEMP: i32 = 80;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), ")");

/// Temperature based GPU fan control through hwmon
#[derive(Parser)]
#[command(version, long_version = LONG_VERSION)]
pub struct Args {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Control the fan until interrupted (default)
    Run(ControlArgs),
    /// Apply a single control cycle and exit
    Once(ControlArgs),
    /// Search for the GPU fan and print what was found
    Detect(DetectArgs),
}

#[derive(Default, Parser)]
pub struct ControlArgs {
    /// Temperature at which the fan is stopped (selects the linear policy)
    #[arg(long = "min_temp", allow_negative_numbers = true)]
    pub min_temp: Option<i32>,
    /// Temperature at which the fan runs at full speed (selects the linear policy)
    #[arg(long = "max_temp", allow_negative_numbers = true)]
    pub max_temp: Option<i32>,
    /// PWM file to control, skips fan detection
    #[arg(long = "pwm_path")]
    pub pwm_path: Option<PathBuf>,
    #[command(flatten)]
    pub detect: DetectArgs,
    /// Polling interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Where temperatures are read from (sysfs or nvml)
    #[arg(long)]
    pub source: Option<TemperatureSourceKind>,
}

#[derive(Default, Parser)]
pub struct DetectArgs {
    /// Fans above this speed are treated as the GPU fan
    #[arg(long)]
    pub min_rpm: Option<u32>,
    /// Directory containing the hwmon devices
    #[arg(long)]
    pub hwmon_root: Option<PathBuf>,
}

impl DetectArgs {
    pub fn apply_to(&self, settings: &mut FanControlSettings) {
        if let Some(min_rpm) = self.min_rpm {
            settings.min_rpm = min_rpm;
        }
        if let Some(hwmon_root) = &self.hwmon_root {
            settings.hwmon_root.clone_from(hwmon_root);
        }
    }
}

impl ControlArgs {
    /// Overrides the config file values with the ones given on the command line.
    pub fn apply_to(&self, settings: &mut FanControlSettings) {
        self.detect.apply_to(settings);

        if self.min_temp.is_some() || self.max_temp.is_some() {
            let (current_min, current_max) = match settings.policy {
                SpeedPolicy::Linear { min_temp, max_temp } => (min_temp, max_temp),
                SpeedPolicy::Stepped(_) => (DEFAULT_MIN_TEMP, DEFAULT_MAX_TEMP),
            };
            settings.policy = SpeedPolicy::linear(
                self.min_temp.unwrap_or(current_min),
                self.max_temp.unwrap_or(current_max),
            );
        }
        if let Some(pwm_path) = &self.pwm_path {
            settings.pwm_path = Some(pwm_path.clone());
        }
        if let Some(interval_ms) = self.interval_ms {
            settings.interval_ms = interval_ms;
        }
        if let Some(source) = self.source {
            settings.temperature_source = source;
        }
    }
}
