use crate::sysfs::SysFs;
use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// In-memory sysfs tree. Clones share state, so a test can keep one copy to inspect
/// what the code under test wrote.
#[derive(Clone, Default)]
pub struct MockFs {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
    read_only: Arc<Mutex<HashSet<PathBuf>>>,
    pub writes: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl MockFs {
    pub fn new<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let fs = Self::default();
        for (path, contents) in files {
            fs.set(path, contents);
        }
        fs
    }

    pub fn set(&self, path: impl AsRef<Path>, contents: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_owned(), contents.to_owned());
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files.lock().unwrap().remove(path.as_ref());
    }

    /// Writes to this file fail with a permission error.
    pub fn deny_writes(&self, path: impl AsRef<Path>) {
        self.read_only
            .lock()
            .unwrap()
            .insert(path.as_ref().to_owned());
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|(path, contents)| (path.display().to_string(), contents.clone()))
            .collect()
    }

    /// Values written to a single file, in order.
    pub fn writes_to(&self, path: impl AsRef<Path>) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(written_path, _)| written_path == path.as_ref())
            .map(|(_, contents)| contents.clone())
            .collect()
    }
}

impl SysFs for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if self.read_only.lock().unwrap().contains(path) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }

        let mut files = self.files.lock().unwrap();
        let file = files
            .get_mut(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        contents.clone_into(file);

        self.writes
            .lock()
            .unwrap()
            .push((path.to_owned(), contents.to_owned()));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap()
            .keys()
            .any(|file| file.starts_with(path))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap();
        let entries: BTreeSet<PathBuf> = files
            .keys()
            .filter_map(|file| file.strip_prefix(path).ok())
            .filter_map(|relative| relative.components().next())
            .map(|child| path.join(child))
            .collect();

        if entries.is_empty() {
            Err(io::Error::from(io::ErrorKind::NotFound))
        } else {
            Ok(entries.into_iter().collect())
        }
    }
}
