pub mod actuator;
pub mod controller;
pub mod locator;
pub mod temperature;

use crate::sysfs::SysFs;
use anyhow::{ensure, Context};
use std::{
    ffi::OsString,
    fmt::{self, Display},
    path::{Path, PathBuf},
};

const TEMP_FILE_NAME: &str = "temp1_input";

/// A fan that can be controlled through hwmon.
///
/// Only constructed once the PWM file is known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanHandle {
    fan_index: u32,
    pwm_path: PathBuf,
    speed_path: PathBuf,
    temp_path: PathBuf,
}

impl FanHandle {
    /// Builds a handle for the fan behind `fan<N>_input` in a hwmon directory.
    /// Returns `None` when the matching `pwm<N>` file does not exist.
    fn for_fan_input(fs: &impl SysFs, hwmon_dir: &Path, fan_input: &Path) -> Option<Self> {
        let fan_index = index_from_file_name(fan_input)?;
        let pwm_path = hwmon_dir.join(format!("pwm{fan_index}"));

        if !fs.exists(&pwm_path) {
            return None;
        }

        Some(Self {
            fan_index,
            pwm_path,
            speed_path: fan_input.to_owned(),
            temp_path: hwmon_dir.join(TEMP_FILE_NAME),
        })
    }

    /// Builds a handle for an explicitly given `pwm<N>` file, skipping detection.
    pub fn from_pwm_path(fs: &impl SysFs, pwm_path: &Path) -> anyhow::Result<Self> {
        let fan_index = index_from_file_name(pwm_path)
            .with_context(|| format!("'{}' is not a PWM control file", pwm_path.display()))?;
        ensure!(
            fs.exists(pwm_path),
            "PWM file '{}' does not exist",
            pwm_path.display()
        );
        let hwmon_dir = pwm_path.parent().unwrap_or_else(|| Path::new("/"));

        Ok(Self {
            fan_index,
            pwm_path: pwm_path.to_owned(),
            speed_path: hwmon_dir.join(format!("fan{fan_index}_input")),
            temp_path: hwmon_dir.join(TEMP_FILE_NAME),
        })
    }

    pub fn fan_index(&self) -> u32 {
        self.fan_index
    }

    pub fn pwm_path(&self) -> &Path {
        &self.pwm_path
    }

    pub fn speed_path(&self) -> &Path {
        &self.speed_path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// `pwm<N>_enable`, which switches between manual and automatic control.
    pub fn enable_path(&self) -> PathBuf {
        let mut path = OsString::from(self.pwm_path.as_os_str());
        path.push("_enable");
        PathBuf::from(path)
    }
}

impl Display for FanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fan {} ({})", self.fan_index, self.pwm_path.display())
    }
}

/// Collects every digit of the file name, so `fan12_input` gives 12. hwmon numbers fans from 1.
fn index_from_file_name(path: &Path) -> Option<u32> {
    let digits: String = path
        .file_name()?
        .to_str()?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse::<u32>().ok().filter(|index| *index > 0)
}

#[cfg(test)]
mod tests {
    use super::{index_from_file_name, FanHandle};
    use crate::tests::mock_fs::MockFs;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    #[test]
    fn file_name_index() {
        assert_eq!(Some(1), index_from_file_name(Path::new("/hwmon3/fan1_input")));
        assert_eq!(Some(12), index_from_file_name(Path::new("fan12_input")));
        assert_eq!(Some(2), index_from_file_name(Path::new("/hwmon0/pwm2")));
        assert_eq!(None, index_from_file_name(Path::new("/hwmon1/fan_input")));
        assert_eq!(None, index_from_file_name(Path::new("/hwmon1/fan0_input")));
        assert_eq!(None, index_from_file_name(Path::new("/hwmon1/pwm0")));
    }

    #[test]
    fn handle_from_pwm_path() {
        let fs = MockFs::new([("/sys/class/hwmon/hwmon2/pwm1", "128")]);
        let handle = FanHandle::from_pwm_path(&fs, Path::new("/sys/class/hwmon/hwmon2/pwm1")).unwrap();

        assert_eq!(1, handle.fan_index());
        assert_eq!(
            Path::new("/sys/class/hwmon/hwmon2/fan1_input"),
            handle.speed_path()
        );
        assert_eq!(
            Path::new("/sys/class/hwmon/hwmon2/temp1_input"),
            handle.temp_path()
        );
        assert_eq!(
            PathBuf::from("/sys/class/hwmon/hwmon2/pwm1_enable"),
            handle.enable_path()
        );
    }

    #[test]
    fn handle_from_missing_pwm_path() {
        let fs = MockFs::new([("/sys/class/hwmon/hwmon2/pwm1", "128")]);
        assert!(FanHandle::from_pwm_path(&fs, Path::new("/sys/class/hwmon/hwmon2/pwm2")).is_err());
        assert!(FanHandle::from_pwm_path(&fs, Path::new("/sys/class/hwmon/hwmon2/pwm")).is_err());

        fs.set("/sys/class/hwmon/hwmon2/pwm0", "128");
        assert!(FanHandle::from_pwm_path(&fs, Path::new("/sys/class/hwmon/hwmon2/pwm0")).is_err());
    }
}
