pub mod mock_fs;

use crate::{
    describe_fan,
    fan_control::{
        controller::{discover, FanController},
        locator::locate,
        temperature::TemperatureSource,
    },
    sysfs::HostFs,
};
use gfc_schema::{config::FanControlSettings, TemperatureSourceKind};
use pretty_assertions::assert_eq;
use std::{fs, path::Path, time::Duration};
use tempfile::TempDir;

/// Lays out a hwmon tree with a slow CPU fan and a fast GPU fan.
fn hwmon_tree() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let files = [
        ("hwmon0/name", "nct6775\n"),
        ("hwmon0/fan1_input", "850\n"),
        ("hwmon0/pwm1", "90\n"),
        ("hwmon0/pwm1_enable", "5\n"),
        ("hwmon0/temp1_input", "38000\n"),
        ("hwmon1/name", "amdgpu\n"),
        ("hwmon1/fan1_input", "3000\n"),
        ("hwmon1/pwm1", "255\n"),
        ("hwmon1/pwm1_enable", "2\n"),
        ("hwmon1/temp1_input", "35000\n"),
    ];
    for (path, contents) in files {
        let path = root.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    root
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

fn settings(root: &Path) -> FanControlSettings {
    FanControlSettings {
        hwmon_root: root.to_owned(),
        ..Default::default()
    }
}

#[test]
fn locate_on_disk() {
    let root = hwmon_tree();

    let handle = locate(&HostFs, root.path(), 2000).unwrap();
    assert_eq!(1, handle.fan_index());
    assert_eq!(root.path().join("hwmon1/pwm1"), handle.pwm_path());
    assert_eq!(root.path().join("hwmon1/fan1_input"), handle.speed_path());
    assert_eq!(root.path().join("hwmon1/temp1_input"), handle.temp_path());
}

#[test]
fn no_fast_fan_on_disk() {
    let root = hwmon_tree();
    fs::write(root.path().join("hwmon1/fan1_input"), "1900\n").unwrap();

    assert!(discover(&HostFs, &settings(root.path())).is_err());
    assert_eq!("255\n", read(root.path(), "hwmon1/pwm1"));
    assert_eq!("2\n", read(root.path(), "hwmon1/pwm1_enable"));
}

#[test]
fn stepped_control_on_disk() {
    let root = hwmon_tree();
    let settings = settings(root.path());
    let handle = discover(&HostFs, &settings).unwrap();
    let source = TemperatureSource::new(TemperatureSourceKind::Sysfs).unwrap();
    let controller = FanController::new(HostFs, handle, source, settings);

    let mut pwm_values = vec![];
    for temp in ["35000", "55000", "75000"] {
        fs::write(root.path().join("hwmon1/temp1_input"), temp).unwrap();
        controller.tick();
        pwm_values.push(read(root.path(), "hwmon1/pwm1"));
        assert_eq!("1", read(root.path(), "hwmon1/pwm1_enable"));
    }

    assert_eq!(vec!["0", "128", "217"], pwm_values);
    assert_eq!("90\n", read(root.path(), "hwmon0/pwm1"));
    assert_eq!("5\n", read(root.path(), "hwmon0/pwm1_enable"));
}

#[tokio::test(start_paused = true)]
async fn interrupt_restores_fallback_on_disk() {
    let root = hwmon_tree();
    fs::write(root.path().join("hwmon1/temp1_input"), "92000").unwrap();
    let settings = settings(root.path());
    let handle = discover(&HostFs, &settings).unwrap();
    let source = TemperatureSource::new(TemperatureSourceKind::Sysfs).unwrap();
    let controller = FanController::new(HostFs, handle, source, settings);

    controller.run(tokio::time::sleep(Duration::from_secs(3))).await;

    assert_eq!("128", read(root.path(), "hwmon1/pwm1"));
}

#[test]
fn describe_found_fan() {
    let root = hwmon_tree();
    let handle = locate(&HostFs, root.path(), 2000).unwrap();

    let expected = format!(
        "Fan index: 1\n\
         PWM control: {root}/hwmon1/pwm1\n\
         Speed input: {root}/hwmon1/fan1_input\n\
         Current speed: 3000 RPM\n\
         Current PWM: 255\n\
         Temperature sensor: {root}/hwmon1/temp1_input\n\
         Current temperature: 35.0°C\n",
        root = root.path().display()
    );
    assert_eq!(expected, describe_fan(&HostFs, &handle));
}

#[test]
fn describe_fan_with_missing_readings() {
    let root = hwmon_tree();
    let handle = locate(&HostFs, root.path(), 2000).unwrap();
    fs::remove_file(root.path().join("hwmon1/temp1_input")).unwrap();
    fs::write(root.path().join("hwmon1/fan1_input"), "N/A").unwrap();
    fs::remove_file(root.path().join("hwmon1/pwm1")).unwrap();

    let expected = format!(
        "Fan index: 1\n\
         PWM control: {root}/hwmon1/pwm1\n\
         Speed input: {root}/hwmon1/fan1_input\n\
         Current speed: unknown\n\
         Temperature sensor: {root}/hwmon1/temp1_input\n\
         Current temperature: unknown\n",
        root = root.path().display()
    );
    assert_eq!(expected, describe_fan(&HostFs, &handle));
}
