#![warn(clippy::pedantic)]

pub mod config;
pub mod fan_control;
pub mod sysfs;
mod system;

#[cfg(test)]
mod tests;

use anyhow::{ensure, Context};
use config::Config;
use fan_control::{
    controller::{discover, FanController},
    temperature::{read_temperature, TemperatureSource},
    FanHandle,
};
use futures::future::select_all;
use gfc_schema::{
    args::{Args, ControlArgs, DetectArgs},
    config::FanControlSettings,
};
use std::{future::Future, str::FromStr};
use sysfs::{HostFs, SysFs};
use tokio::{
    runtime,
    signal::unix::{signal, SignalKind},
};
use tracing::{debug_span, info, Instrument, Level};

const SHUTDOWN_SIGNALS: [SignalKind; 4] = [
    SignalKind::terminate(),
    SignalKind::interrupt(),
    SignalKind::quit(),
    SignalKind::hangup(),
];

/// Find the GPU fan and control it until a shutdown signal arrives.
///
/// # Errors
/// Returns an error when not running as root, when the config is invalid or when no fan is found.
pub fn run(args: &Args, control: &ControlArgs) -> anyhow::Result<()> {
    system::ensure_root()?;
    let settings = control_settings(args, control)?;
    let source = TemperatureSource::new(settings.temperature_source)?;
    let handle = discover(&HostFs, &settings)?;
    let controller = FanController::new(HostFs, handle, source, settings);

    let rt = runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Could not initialize tokio runtime")?;
    rt.block_on(async {
        let shutdown = listen_shutdown()?;
        controller
            .run(shutdown)
            .instrument(debug_span!("fan_control"))
            .await;
        Ok(())
    })
}

/// Find the GPU fan and apply the policy once.
///
/// # Errors
/// Returns an error when not running as root, when no fan is found or the speed could not be set.
pub fn once(args: &Args, control: &ControlArgs) -> anyhow::Result<()> {
    system::ensure_root()?;
    let settings = control_settings(args, control)?;
    let source = TemperatureSource::new(settings.temperature_source)?;
    let handle = discover(&HostFs, &settings)?;
    let controller = FanController::new(HostFs, handle, source, settings);

    let applied = controller.tick();
    ensure!(
        !applied.is_empty(),
        "Could not set the speed of {}",
        controller.handle()
    );
    Ok(())
}

/// Search for the GPU fan and print what was found. Does not write anything.
///
/// # Errors
/// Returns an error when no fan is found.
pub fn detect(args: &Args, detect: &DetectArgs) -> anyhow::Result<()> {
    let mut config = init(args)?;
    detect.apply_to(&mut config.fan_control);

    let settings = FanControlSettings {
        pwm_path: None,
        ..config.fan_control
    };
    let handle = discover(&HostFs, &settings)?;
    print!("{}", describe_fan(&HostFs, &handle));
    Ok(())
}

fn init(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_create()?,
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.daemon.log_level);
    let max_level = Level::from_str(log_level).context("Invalid log level")?;
    tracing_subscriber::fmt().with_max_level(max_level).init();

    Ok(config)
}

fn control_settings(args: &Args, control: &ControlArgs) -> anyhow::Result<FanControlSettings> {
    let mut config = init(args)?;
    control.apply_to(&mut config.fan_control);
    config.validate()?;
    Ok(config.fan_control)
}

fn listen_shutdown() -> anyhow::Result<impl Future<Output = ()>> {
    let mut signals = SHUTDOWN_SIGNALS
        .into_iter()
        .map(signal)
        .collect::<Result<Vec<_>, _>>()
        .context("Could not listen to shutdown signals")?;

    Ok(async move {
        let signal_futures = signals.iter_mut().map(|signal| Box::pin(signal.recv()));
        select_all(signal_futures).await;
        info!("received shutdown signal");
    })
}

fn describe_fan(fs: &impl SysFs, handle: &FanHandle) -> String {
    let speed = fs
        .read_value::<u32>(handle.speed_path())
        .map_or_else(|| "unknown".to_owned(), |rpm| format!("{rpm} RPM"));
    let pwm = fs
        .read_value::<u32>(handle.pwm_path())
        .map(|pwm| format!("Current PWM: {pwm}\n"))
        .unwrap_or_default();
    let temperature = read_temperature(fs, handle)
        .map_or_else(|| "unknown".to_owned(), |temp| format!("{temp:.1}°C"));

    format!(
        "Fan index: {index}\n\
         PWM control: {pwm_path}\n\
         Speed input: {speed_path}\n\
         Current speed: {speed}\n\
         {pwm}\
         Temperature sensor: {temp_path}\n\
         Current temperature: {temperature}\n",
        index = handle.fan_index(),
        pwm_path = handle.pwm_path().display(),
        speed_path = handle.speed_path().display(),
        temp_path = handle.temp_path().display(),
    )
}
