use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use zip::{result::ZipError, write::SimpleFileOptions, ZipArchive, ZipWriter};

use super::npy;
use crate::{
    config::CodecConfig,
    error::{DistError, Result},
};

const ENTRY_SUFFIX: &str = ".npy";

/// The archive path for a distribution saved at `path`.
pub fn archive_path(path: &Path) -> PathBuf {
    path.with_extension("npz")
}

/// Writes keyed 1-D float arrays into an `.npz` archive.
pub struct ArchiveWriter {
    zip: ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ArchiveWriter {
    /// Creates (or truncates) the archive at `path`.
    ///
    /// # Args
    /// * `path` - The archive's file path.
    /// * `config` - How entries are compressed.
    pub fn create(path: &Path, config: &CodecConfig) -> Result<Self> {
        let file = File::create(path)?;

        Ok(Self {
            zip: ZipWriter::new(BufWriter::new(file)),
            options: config.file_options(),
            entries: 0,
        })
    }

    /// Appends the array stored under `key`.
    pub fn write_array(&mut self, key: &str, values: &[f32]) -> Result<()> {
        self.zip
            .start_file(format!("{key}{ENTRY_SUFFIX}"), self.options)?;
        self.zip.write_all(&npy::encode(values))?;
        self.entries += 1;

        log::debug!(key = key, len = values.len(); "archived array");
        Ok(())
    }

    /// Writes the central directory and flushes the file.
    ///
    /// # Returns
    /// The number of arrays written.
    pub fn finish(self) -> Result<usize> {
        let mut inner = self.zip.finish()?;
        inner.flush()?;
        Ok(self.entries)
    }
}

/// Reads keyed 1-D float arrays out of an `.npz` archive.
pub struct ArchiveReader {
    zip: ZipArchive<BufReader<File>>,
}

impl ArchiveReader {
    /// Opens the archive at `path`.
    ///
    /// # Errors
    /// `DistError::Io` if the file is missing or is not a zip archive.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(BufReader::new(file))?;
        Ok(Self { zip })
    }

    /// The keys present in the archive, without the `.npy` suffix.
    pub fn keys(&self) -> Vec<String> {
        self.zip
            .file_names()
            .map(|name| name.strip_suffix(ENTRY_SUFFIX).unwrap_or(name).to_string())
            .collect()
    }

    /// Reads the array stored under `key`.
    ///
    /// # Returns
    /// `None` if the archive has no such key.
    ///
    /// # Errors
    /// `DistError::Io` if the entry is corrupt or not a 1-D float32 array.
    pub fn read_array(&mut self, key: &str) -> Result<Option<Vec<f32>>> {
        for name in [format!("{key}{ENTRY_SUFFIX}"), key.to_string()] {
            let mut entry = match self.zip.by_name(&name) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => continue,
                Err(e) => return Err(e.into()),
            };

            // Declared entry sizes are untrusted.
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;

            return npy::decode(&bytes)
                .map(Some)
                .map_err(|e| DistError::invalid_data(format!("entry '{name}': {e}")));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Compression;

    #[test]
    fn stores_and_finds_arrays_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arrays.npz");

        let mut writer = ArchiveWriter::create(&path, &CodecConfig::default()).unwrap();
        writer.write_array("mu-fc", &[1.0, 2.0]).unwrap();
        writer.write_array("var-fc", &[0.5, 0.25]).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let mut reader = ArchiveReader::open(&path).unwrap();
        let mut keys = reader.keys();
        keys.sort();
        assert_eq!(keys, ["mu-fc", "var-fc"]);

        assert_eq!(reader.read_array("var-fc").unwrap(), Some(vec![0.5, 0.25]));
        assert_eq!(reader.read_array("mu-conv").unwrap(), None);
    }

    #[test]
    fn stored_archives_are_readable_too() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.npz");
        let config = CodecConfig::new(Compression::Stored, None);

        let mut writer = ArchiveWriter::create(&path, &config).unwrap();
        writer.write_array("mu-x", &[4.0]).unwrap();
        writer.finish().unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.read_array("mu-x").unwrap(), Some(vec![4.0]));
    }

    #[test]
    fn garbage_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.npz");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();

        assert!(matches!(ArchiveReader::open(&path), Err(DistError::Io(_))));
    }

    #[test]
    fn extension_becomes_npz() {
        assert_eq!(
            archive_path(Path::new("runs/shard-3.json")),
            PathBuf::from("runs/shard-3.npz")
        );
    }
}
