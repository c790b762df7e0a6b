use anyhow::ensure;
use nix::unistd::geteuid;

/// hwmon control files are only writable by root.
pub fn ensure_root() -> anyhow::Result<()> {
    ensure!(geteuid().is_root(), "Must run as root (sudo)");
    Ok(())
}
