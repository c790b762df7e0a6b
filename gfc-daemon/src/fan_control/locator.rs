use super::FanHandle;
use crate::sysfs::SysFs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Searches the hwmon devices for the GPU fan.
///
/// hwmon has no reliable way of telling which device a fan belongs to, so the first fan
/// spinning faster than `min_rpm` that also has a PWM control file is assumed to be the GPU's.
/// Unreadable files just disqualify the candidate.
pub fn locate(fs: &impl SysFs, hwmon_root: &Path, min_rpm: u32) -> Option<FanHandle> {
    let devices = match fs.read_dir(hwmon_root) {
        Ok(devices) => devices,
        Err(err) => {
            warn!(
                "could not list hwmon devices in '{}': {err}",
                hwmon_root.display()
            );
            return None;
        }
    };

    for hwmon_dir in devices
        .iter()
        .filter(|path| file_name_matches(path, |name| name.starts_with("hwmon")))
    {
        let entries = match fs.read_dir(hwmon_dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("could not list '{}': {err}", hwmon_dir.display());
                continue;
            }
        };

        for fan_input in entries.iter().filter(|path| {
            file_name_matches(path, |name| {
                name.starts_with("fan") && name.ends_with("_input")
            })
        }) {
            let Some(rpm) = fs.read_value::<u32>(fan_input) else {
                continue;
            };

            if rpm <= min_rpm {
                debug!(
                    "skipping '{}': {rpm} RPM is not above {min_rpm} RPM",
                    fan_input.display()
                );
                continue;
            }

            match FanHandle::for_fan_input(fs, hwmon_dir, fan_input) {
                Some(handle) => {
                    info!("found GPU fan: {handle}, speed {rpm} RPM");
                    return Some(handle);
                }
                None => debug!(
                    "'{}' is spinning at {rpm} RPM but has no PWM control",
                    fan_input.display()
                ),
            }
        }
    }

    warn!("no fan above {min_rpm} RPM found in '{}'", hwmon_root.display());
    None
}

fn file_name_matches(path: &Path, f: impl Fn(&str) -> bool) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(f)
}
