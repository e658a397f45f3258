use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How archive entries are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

/// Immutable settings for writing distribution archives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    compression: Compression,
    level: Option<i64>,
}

impl CodecConfig {
    /// Creates a new codec configuration.
    ///
    /// # Args
    /// * `compression` - How each array entry is stored in the archive.
    /// * `level` - Compression level, `None` for the method's default. Ignored when `Stored`.
    ///
    /// # Returns
    /// A `CodecConfig` instance.
    pub fn new(compression: Compression, level: Option<i64>) -> Self {
        Self { compression, level }
    }

    /// Reads a configuration from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    /// `DistError::Io` if the file cannot be read, `DistError::Metadata` if it is not valid JSON.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn level(&self) -> Option<i64> {
        match self.compression {
            Compression::Stored => None,
            Compression::Deflated => self.level,
        }
    }

    pub(crate) fn file_options(&self) -> zip::write::SimpleFileOptions {
        let method = match self.compression {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        };

        zip::write::SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(self.level())
    }
}
