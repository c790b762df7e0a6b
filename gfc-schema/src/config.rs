use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::path::PathBuf;

use crate::{Duty, SpeedPolicy, TemperatureSourceKind};

pub const DEFAULT_HWMON_ROOT: &str = "/sys/class/hwmon";
/// Fans spinning faster than this are assumed to belong to the GPU.
pub const DEFAULT_MIN_RPM: u32 = 2000;

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FanControlSettings {
    #[serde(default = "default_hwmon_root")]
    pub hwmon_root: PathBuf,
    #[serde(default = "default_min_rpm")]
    pub min_rpm: u32,
    /// Controls this PWM file directly instead of searching for a fan
    #[serde(default)]
    pub pwm_path: Option<PathBuf>,
    #[serde(default, with = "serde_yml::with::singleton_map")]
    pub policy: SpeedPolicy,
    #[serde(default)]
    pub temperature_source: TemperatureSourceKind,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Ratio of the policy's scale applied when control stops. `None` leaves the last speed in place.
    #[serialize_always]
    #[serde(default = "default_fallback_speed")]
    pub fallback_speed: Option<f64>,
    #[serde(default = "default_show_rpm")]
    pub show_rpm: bool,
}

impl Default for FanControlSettings {
    fn default() -> Self {
        Self {
            hwmon_root: default_hwmon_root(),
            min_rpm: default_min_rpm(),
            pwm_path: None,
            policy: SpeedPolicy::default(),
            temperature_source: TemperatureSourceKind::default(),
            interval_ms: default_interval_ms(),
            fallback_speed: default_fallback_speed(),
            show_rpm: default_show_rpm(),
        }
    }
}

impl FanControlSettings {
    pub fn fallback_duty(&self) -> Option<Duty> {
        self.fallback_speed
            .map(|ratio| self.policy.scale().at_ratio(ratio))
    }
}

fn default_hwmon_root() -> PathBuf {
    PathBuf::from(DEFAULT_HWMON_ROOT)
}

fn default_min_rpm() -> u32 {
    DEFAULT_MIN_RPM
}

fn default_interval_ms() -> u64 {
    2000
}

#[allow(clippy::unnecessary_wraps)]
fn default_fallback_speed() -> Option<f64> {
    Some(0.5)
}

fn default_show_rpm() -> bool {
    true
}
