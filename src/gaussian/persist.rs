//! Saving and restoring Gaussian distributions.
//!
//! Every layer is stored as two float32 arrays, `mu-<layer>` and
//! `var-<layer>`, in the `.npz` archive; the layer order and sample count live
//! in the companion `.json` metadata.

use std::path::Path;

use ndarray::Array1;

use super::{GaussianDistribution, LayerStats};
use crate::{
    codec::{archive_path, ArchiveReader, ArchiveWriter},
    config::CodecConfig,
    error::{DistError, Result},
    family::{self, DistributionKind},
    metadata::Metadata,
};

pub fn mu_key(layer: &str) -> String {
    format!("mu-{layer}")
}

pub fn var_key(layer: &str) -> String {
    format!("var-{layer}")
}

/// Reads the statistics of `expected_layers` from the archive next to `path`.
///
/// # Returns
/// The layers in the order they were asked for, widened back to f64.
///
/// # Errors
/// * `DistError::MissingLayer` if an expected layer has no `mu` or `var` entry.
/// * `DistError::Io` if the archive is unreadable or an entry is corrupt.
pub fn read_layers<S: AsRef<str>>(
    path: &Path,
    expected_layers: &[S],
) -> Result<Vec<(String, LayerStats)>> {
    let mut archive = ArchiveReader::open(&archive_path(path))?;

    expected_layers
        .iter()
        .map(|layer| {
            let layer = layer.as_ref();
            let mu = read_entry(&mut archive, layer, &mu_key(layer))?;
            let var = read_entry(&mut archive, layer, &var_key(layer))?;

            let stats = LayerStats::new(mu, var)
                .map_err(|e| DistError::invalid_data(format!("layer '{layer}': {e}")))?;
            Ok((layer.to_string(), stats))
        })
        .collect()
}

fn read_entry(archive: &mut ArchiveReader, layer: &str, key: &str) -> Result<Array1<f64>> {
    let values = archive
        .read_array(key)?
        .ok_or_else(|| DistError::MissingLayer {
            layer: layer.to_string(),
            key: key.to_string(),
        })?;

    Ok(values.into_iter().map(f64::from).collect())
}

impl GaussianDistribution {
    /// Saves the distribution as `path.npz` plus its `path.json` metadata.
    ///
    /// Statistics are narrowed to float32 on the way out.
    ///
    /// # Errors
    /// `DistError::Io` if either file cannot be written.
    pub fn save(&self, path: &Path, config: &CodecConfig) -> Result<()> {
        let archive = archive_path(path);
        let mut writer = ArchiveWriter::create(&archive, config)?;

        for (layer, stats) in &self.layers {
            let mu: Vec<f32> = stats.mu.iter().map(|&v| v as f32).collect();
            let var: Vec<f32> = stats.var.iter().map(|&v| v as f32).collect();

            writer.write_array(&mu_key(layer), &mu)?;
            writer.write_array(&var_key(layer), &var)?;
        }

        let entries = writer.finish()?;
        self.metadata().write(path)?;

        log::info!(
            entries = entries,
            samples = self.sample_count;
            "saved gaussian distribution to {}",
            archive.display()
        );
        Ok(())
    }

    /// Loads the distribution saved next to `path`, as described by `meta`.
    ///
    /// # Errors
    /// * `DistError::SchemaMismatch` if `meta` describes another or an unknown family.
    /// * `DistError::MissingLayer` if a layer listed in `meta` is not archived.
    /// * `DistError::Io` if the archive is unreadable or disagrees with `meta`,
    ///   or if `meta` lists layers but zero samples.
    pub fn load(path: &Path, meta: &Metadata) -> Result<Self> {
        let kind = meta.kind()?;
        if kind != DistributionKind::Gaussian {
            return Err(DistError::SchemaMismatch(format!(
                "metadata describes a {kind} distribution"
            )));
        }

        if meta.num_images == 0 && !meta.neurons.is_empty() {
            return Err(DistError::invalid_data(format!(
                "metadata lists {} layer(s) but zero samples",
                meta.neurons.len()
            )));
        }

        let names: Vec<&str> = meta.layer_names().collect();
        let layers = read_layers(path, names.as_slice())?;

        for ((layer, stats), shape) in layers.iter().zip(&meta.neurons) {
            if stats.len() != shape.neurons {
                return Err(DistError::invalid_data(format!(
                    "layer '{layer}' has {} neurons, metadata says {}",
                    stats.len(),
                    shape.neurons
                )));
            }
        }

        log::info!(
            layers = layers.len(),
            samples = meta.num_images;
            "loaded gaussian distribution"
        );

        Ok(Self {
            layers,
            sample_count: meta.num_images,
            extractor: meta.extractor.clone(),
        })
    }

    /// Loads the distribution saved next to `path`, reading its metadata first.
    pub fn open(path: &Path) -> Result<Self> {
        family::open(path)
    }
}
