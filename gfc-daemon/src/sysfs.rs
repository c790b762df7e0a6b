use anyhow::Context;
use std::{
    fmt::Display,
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// The filesystem operations needed to talk to hwmon.
///
/// Everything that touches sysfs goes through this, so tests can run against an in-memory
/// tree or a temporary directory instead of the real `/sys`.
pub trait SysFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Overwrites an existing file. Never creates new files.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Paths of the entries in a directory, sorted by name.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Reads and parses a single value, e.g. an RPM or millidegree reading.
    fn read_value<T>(&self, path: &Path) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.read_to_string(path) {
            Ok(contents) => match contents.trim().parse() {
                Ok(value) => Some(value),
                Err(err) => {
                    debug!("could not parse value from '{}': {err}", path.display());
                    None
                }
            },
            Err(err) => {
                debug!("could not read file at '{}': {err}", path.display());
                None
            }
        }
    }

    fn write_value(&self, path: &Path, value: impl Display) -> anyhow::Result<()> {
        self.write(path, &value.to_string())
            .with_context(|| format!("Could not write to '{}'", path.display()))
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl SysFs for HostFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).truncate(true);

        let mut file = options.open(path)?;
        io::Write::write_all(&mut file, contents.as_bytes())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}
