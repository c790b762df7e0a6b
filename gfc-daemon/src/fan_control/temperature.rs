use super::FanHandle;
use crate::sysfs::SysFs;
use gfc_schema::TemperatureSourceKind;

#[cfg(feature = "nvidia")]
use {
    anyhow::Context,
    nvml_wrapper::{enum_wrappers::device::TemperatureSensor, Nvml},
    tracing::{error, trace},
};

/// hwmon reports temperatures in millidegrees Celsius.
const MILLIDEGREES_PER_DEGREE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReading {
    pub label: String,
    pub celsius: f64,
}

/// Reads the temperature sensor next to the fan. `None` means the reading should be skipped.
pub fn read_temperature(fs: &impl SysFs, handle: &FanHandle) -> Option<f64> {
    let millidegrees: i32 = fs.read_value(handle.temp_path())?;
    Some(f64::from(millidegrees) / MILLIDEGREES_PER_DEGREE)
}

pub enum TemperatureSource {
    /// `temp1_input` in the fan's hwmon directory
    Sysfs,
    /// Every GPU reported by NVML
    #[cfg(feature = "nvidia")]
    Nvml(Nvml),
}

impl TemperatureSource {
    pub fn new(kind: TemperatureSourceKind) -> anyhow::Result<Self> {
        match kind {
            TemperatureSourceKind::Sysfs => Ok(Self::Sysfs),
            #[cfg(feature = "nvidia")]
            TemperatureSourceKind::Nvml => {
                let nvml = Nvml::init().context("Could not initialize NVML")?;
                Ok(Self::Nvml(nvml))
            }
            #[cfg(not(feature = "nvidia"))]
            TemperatureSourceKind::Nvml => Err(anyhow::anyhow!(
                "gfc was built without NVML support (enable the 'nvidia' feature)"
            )),
        }
    }

    pub fn kind(&self) -> TemperatureSourceKind {
        match self {
            TemperatureSource::Sysfs => TemperatureSourceKind::Sysfs,
            #[cfg(feature = "nvidia")]
            TemperatureSource::Nvml(_) => TemperatureSourceKind::Nvml,
        }
    }

    /// Current temperatures. Empty when nothing could be read this cycle.
    pub fn read(&self, fs: &impl SysFs, handle: &FanHandle) -> Vec<TemperatureReading> {
        match self {
            TemperatureSource::Sysfs => read_temperature(fs, handle)
                .map(|celsius| TemperatureReading {
                    label: handle.temp_path().display().to_string(),
                    celsius,
                })
                .into_iter()
                .collect(),
            #[cfg(feature = "nvidia")]
            TemperatureSource::Nvml(nvml) => read_nvml_temperatures(nvml),
        }
    }
}

#[cfg(feature = "nvidia")]
fn read_nvml_temperatures(nvml: &Nvml) -> Vec<TemperatureReading> {
    let count = match nvml.device_count() {
        Ok(count) => count,
        Err(err) => {
            error!("could not get NVML device count: {err}");
            return vec![];
        }
    };

    (0..count)
        .filter_map(|index| {
            let device = nvml
                .device_by_index(index)
                .map_err(|err| error!("could not get GPU {index}: {err}"))
                .ok()?;
            let temp = device
                .temperature(TemperatureSensor::Gpu)
                .map_err(|err| error!("could not read temperature of GPU {index}: {err}"))
                .ok()?;
            trace!("GPU {index} reports {temp}°C");
            Some(TemperatureReading {
                label: format!("GPU {index}"),
                celsius: f64::from(temp),
            })
        })
        .collect()
}
