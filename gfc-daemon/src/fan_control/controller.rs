use super::{
    actuator,
    locator::locate,
    temperature::{TemperatureReading, TemperatureSource},
    FanHandle,
};
use crate::sysfs::SysFs;
use anyhow::{anyhow, Context};
use gfc_schema::{config::FanControlSettings, Duty};
use std::{future::Future, pin::pin, time::Duration};
use tokio::{select, time::sleep};
use tracing::{debug, error, info};

/// Finds the fan to control: the configured PWM file if there is one, otherwise the
/// first fan found by [`locate`].
pub fn discover(fs: &impl SysFs, settings: &FanControlSettings) -> anyhow::Result<FanHandle> {
    match &settings.pwm_path {
        Some(pwm_path) => {
            let handle = FanHandle::from_pwm_path(fs, pwm_path).context("Invalid PWM path")?;
            info!("using configured {handle}");
            Ok(handle)
        }
        None => locate(fs, &settings.hwmon_root, settings.min_rpm).ok_or_else(|| {
            anyhow!(
                "No GPU fan found (looking for fans > {} RPM in '{}')",
                settings.min_rpm,
                settings.hwmon_root.display()
            )
        }),
    }
}

pub struct FanController<F> {
    fs: F,
    handle: FanHandle,
    source: TemperatureSource,
    settings: FanControlSettings,
}

impl<F: SysFs> FanController<F> {
    pub fn new(
        fs: F,
        handle: FanHandle,
        source: TemperatureSource,
        settings: FanControlSettings,
    ) -> Self {
        Self {
            fs,
            handle,
            source,
            settings,
        }
    }

    pub fn handle(&self) -> &FanHandle {
        &self.handle
    }

    /// Reads the temperature and sets the matching fan speed.
    /// Returns the speeds that were applied successfully.
    pub fn tick(&self) -> Vec<Duty> {
        let readings = self.source.read(&self.fs, &self.handle);
        if readings.is_empty() {
            debug!("no temperature available, skipping cycle");
            return vec![];
        }

        let mut applied = Vec::with_capacity(readings.len());
        for reading in readings {
            let duty = self.settings.policy.duty_at(reading.celsius);

            match actuator::apply(&self.fs, &self.handle, duty) {
                Ok(pwm) => {
                    self.report(&reading, duty, pwm);
                    applied.push(duty);
                }
                Err(err) => error!("could not set fan speed: {err:#}"),
            }
        }
        applied
    }

    /// Runs until `shutdown` completes, then applies the fallback speed.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let interval = Duration::from_millis(self.settings.interval_ms);
        let mut shutdown = pin!(shutdown);

        info!(
            "starting {} fan control on {} with interval {}ms (temperature source: {})",
            self.settings.policy,
            self.handle,
            self.settings.interval_ms,
            self.source.kind()
        );

        loop {
            self.tick();

            select! {
                () = sleep(interval) => (),
                () = &mut shutdown => break,
            }
        }

        self.stop();
    }

    /// Leaves the fan at the configured fallback speed.
    pub fn stop(&self) {
        info!("stopping fan control");

        if let Some(duty) = self.settings.fallback_duty() {
            match actuator::apply(&self.fs, &self.handle, duty) {
                Ok(pwm) => info!("set {} to fallback speed {duty} (pwm {pwm})", self.handle),
                Err(err) => error!("could not set fallback fan speed: {err:#}"),
            }
        }
    }

    fn report(&self, reading: &TemperatureReading, duty: Duty, pwm: u32) {
        let TemperatureReading { label, celsius } = reading;
        let duty = duty.clamped();

        if self.settings.show_rpm {
            let rpm = self
                .fs
                .read_value::<u32>(self.handle.speed_path())
                .map_or_else(|| "unknown".to_owned(), |rpm| rpm.to_string());
            info!("{label}: {celsius:.1}°C | fan {duty} (pwm {pwm}) | {rpm} RPM");
        } else {
            info!("{label}: {celsius:.1}°C | fan {duty} (pwm {pwm})");
        }
    }
}
