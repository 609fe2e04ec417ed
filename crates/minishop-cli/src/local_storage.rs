//! File-backed [`LocalStorage`]: one JSON object of string values, rewritten
//! whole on every `set_item` through a temp file and rename.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use minishop_core::LocalStorage;

pub struct FileLocalStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileLocalStorage {
    /// Opens the storage file, starting empty if it does not exist yet.
    ///
    /// A file that cannot be parsed is treated as empty and will be replaced
    /// on the next write.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "local storage file unreadable; starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, items })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, contents: &[u8]) -> io::Result<()> {
        let tmp_path = self.temp_path();
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, &self.path)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LocalStorage for FileLocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> io::Result<()> {
        let mut next = self.items.clone();
        next.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string_pretty(&next).map_err(io::Error::other)?;
        self.write_file(encoded.as_bytes())?;

        self.items = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_opens_empty_and_is_created_on_write() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");

        let mut storage = FileLocalStorage::open(&path).expect("open");
        assert_eq!(storage.get_item("cart"), None);

        storage.set_item("cart", "[]".to_string()).expect("write");
        assert!(path.exists());

        let reopened = FileLocalStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get_item("cart").as_deref(), Some("[]"));
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "definitely not json").expect("write");

        let storage = FileLocalStorage::open(&path).expect("open");
        assert_eq!(storage.get_item("theme"), None);
    }

    #[test]
    fn write_replaces_file_without_leaving_temp_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"theme":"light"}"#).expect("seed");

        let mut storage = FileLocalStorage::open(&path).expect("open");
        storage.set_item("theme", "dark".to_string()).expect("write");

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);

        let raw = fs::read_to_string(&path).expect("read");
        let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).expect("json");
        assert_eq!(parsed.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn stale_temp_file_does_not_shadow_document() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"cart":"[]"}"#).expect("seed");
        fs::write(dir.path().join("state.json.tmp"), "{\"cart\":").expect("torn write");

        let mut storage = FileLocalStorage::open(&path).expect("open");
        assert_eq!(storage.get_item("cart").as_deref(), Some("[]"));

        storage.set_item("theme", "dark".to_string()).expect("write");
        let reopened = FileLocalStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get_item("cart").as_deref(), Some("[]"));
        assert_eq!(reopened.get_item("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn writes_keep_other_keys() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("state.json");
        let mut storage = FileLocalStorage::open(&path).expect("open");
        storage.set_item("theme", "dark".to_string()).expect("write");
        storage.set_item("cart", "[]".to_string()).expect("write");

        let reopened = FileLocalStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get_item("theme").as_deref(), Some("dark"));
        assert_eq!(reopened.get_item("cart").as_deref(), Some("[]"));
    }
}
