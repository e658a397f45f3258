use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{error::Result, family::DistributionKind};

/// The neuron count of one layer, in extraction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerShape {
    pub layer: String,
    pub neurons: usize,
}

/// Companion description of a saved distribution.
///
/// The archive only holds numbers; this carries the layer order, the sample
/// count and the provenance needed to rebuild the distribution from it.
///
/// The `type` tag is kept as written and only interpreted by [`Metadata::kind`],
/// so a file from an unknown family still reads and is refused as a schema
/// mismatch rather than as malformed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub name: String,
    #[serde(default)]
    pub extractor: Option<String>,
    pub num_images: usize,
    pub neurons: Vec<LayerShape>,
}

impl Metadata {
    /// The companion metadata path for a distribution saved at `path`.
    pub fn path_for(path: &Path) -> PathBuf {
        path.with_extension("json")
    }

    /// The distribution family named by the `type` tag.
    ///
    /// # Errors
    /// `DistError::SchemaMismatch` if the tag names no known family.
    pub fn kind(&self) -> Result<DistributionKind> {
        self.type_tag.parse()
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.neurons.iter().map(|shape| shape.layer.as_str())
    }

    /// Reads the metadata saved next to `path`.
    ///
    /// # Errors
    /// `DistError::Io` if unreadable, `DistError::Metadata` if malformed.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(Self::path_for(path))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes the metadata next to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path_for(path), content)?;
        Ok(())
    }
}
