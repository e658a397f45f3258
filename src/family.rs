use std::{fmt, path::Path, str::FromStr};

use rayon::prelude::*;

use crate::{
    config::CodecConfig,
    error::{DistError, Result},
    features::LayerFeatures,
    metadata::Metadata,
};

/// The tag identifying a distribution family on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKind {
    Gaussian,
}

impl DistributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionKind {
    type Err = DistError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gaussian" => Ok(Self::Gaussian),
            other => Err(DistError::SchemaMismatch(format!(
                "unknown distribution type '{other}'"
            ))),
        }
    }
}

/// The capabilities every distribution family provides.
///
/// A family is chosen by its concrete type; the on-disk `KIND` tag is only
/// checked, never dispatched on.
pub trait NeuronDistribution: Sized {
    /// The tag written to and expected from companion metadata.
    const KIND: DistributionKind;

    /// Fits a new distribution from one batch of extracted features.
    fn fit(features: &LayerFeatures<'_>) -> Result<Self>;

    /// Combines two distributions into the one of their pooled samples.
    fn merge(&self, other: &Self) -> Result<Self>;

    /// Writes the archive and its companion metadata next to `path`.
    fn save(&self, path: &Path, config: &CodecConfig) -> Result<()>;

    /// Restores a distribution from the archive next to `path`, described by `meta`.
    fn load(path: &Path, meta: &Metadata) -> Result<Self>;

    /// Describes this distribution the way the companion metadata file does.
    fn metadata(&self) -> Metadata;

    fn sample_count(&self) -> usize;
}

/// Opens a saved distribution, reading its companion metadata first.
///
/// # Args
/// * `path` - The distribution's path; the `.json` and `.npz` extensions are substituted.
///
/// # Errors
/// `DistError::SchemaMismatch` if the file holds another or an unknown family,
/// plus any load error.
pub fn open<D: NeuronDistribution>(path: &Path) -> Result<D> {
    let meta = Metadata::read(path)?;
    let kind = meta.kind()?;
    if kind != D::KIND {
        return Err(DistError::SchemaMismatch(format!(
            "'{}' holds a {kind} distribution, expected {}",
            path.display(),
            D::KIND
        )));
    }

    D::load(path, &meta)
}

/// Merges any number of shard distributions with a parallel tree reduction.
///
/// Merging is associative and commutative, so the reduction order does not
/// change the result beyond floating point rounding.
///
/// # Errors
/// `DistError::DegenerateMerge` if `shards` is empty, plus any merge error.
pub fn merge_all<D>(shards: &[D]) -> Result<D>
where
    D: NeuronDistribution + Clone + Send + Sync,
{
    log::debug!(shards = shards.len(); "merging shards");

    shards
        .par_iter()
        .cloned()
        .map(Ok)
        .try_reduce_with(|a, b| a.merge(&b))
        .unwrap_or(Err(DistError::DegenerateMerge { total: 0 }))
}
