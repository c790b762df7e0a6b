use super::FanHandle;
use crate::sysfs::SysFs;
use gfc_schema::Duty;
use tracing::{trace, warn};

/// Value of `pwm<N>_enable` for manual control.
const MANUAL_CONTROL: &str = "1";

/// Sets the fan speed, returning the value written to the PWM file.
///
/// Manual mode is requested before every write, since drivers may switch back to automatic
/// control on their own.
pub fn apply(fs: &impl SysFs, handle: &FanHandle, duty: Duty) -> anyhow::Result<u32> {
    let pwm = duty.to_pwm();

    let enable_path = handle.enable_path();
    if fs.exists(&enable_path) {
        if let Err(err) = fs.write_value(&enable_path, MANUAL_CONTROL) {
            warn!("could not switch {handle} to manual control: {err:#}");
        }
    }

    fs.write_value(handle.pwm_path(), pwm)?;
    trace!("set {handle} to {} (pwm {pwm})", duty.clamped());

    Ok(pwm)
}
