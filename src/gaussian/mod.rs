//! Per-neuron Gaussian summaries of layer activations.

mod fit;
mod merge;
pub mod persist;
mod query;

use std::path::Path;

use ndarray::Array1;

use crate::{
    config::CodecConfig,
    error::{DistError, Result},
    family::{DistributionKind, NeuronDistribution},
    features::LayerFeatures,
    metadata::{LayerShape, Metadata},
};

/// Mean and unbiased variance of every neuron in one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStats {
    mu: Array1<f64>,
    var: Array1<f64>,
}

impl LayerStats {
    /// Creates the statistics of a layer.
    ///
    /// # Args
    /// * `mu` - Per-neuron means.
    /// * `var` - Per-neuron variances, same length as `mu`.
    ///
    /// # Errors
    /// `DistError::Shape` if the lengths differ or a variance is negative or NaN.
    pub fn new(mu: Array1<f64>, var: Array1<f64>) -> Result<Self> {
        if mu.len() != var.len() {
            return Err(DistError::shape(
                "",
                format!("{} means but {} variances", mu.len(), var.len()),
            ));
        }

        if let Some(bad) = var.iter().find(|v| v.is_nan() || **v < 0.0) {
            return Err(DistError::shape("", format!("invalid variance {bad}")));
        }

        Ok(Self { mu, var })
    }

    pub fn mu(&self) -> &Array1<f64> {
        &self.mu
    }

    pub fn var(&self) -> &Array1<f64> {
        &self.var
    }

    /// The number of neurons in the layer.
    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }
}

/// Mean and variance of a single neuron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeuronStats {
    pub mu: f64,
    pub var: f64,
}

/// A dataset fingerprint: the Gaussian parameters of every neuron of every
/// extracted layer, plus how many samples they summarize.
///
/// Values are immutable once built. Fitting, loading and merging all return
/// new distributions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaussianDistribution {
    layers: Vec<(String, LayerStats)>,
    sample_count: usize,
    extractor: Option<String>,
}

impl GaussianDistribution {
    /// An empty distribution: no layers, no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a distribution from already computed statistics.
    ///
    /// # Args
    /// * `layers` - Per-layer statistics in their canonical order.
    /// * `sample_count` - How many samples the statistics summarize.
    ///
    /// # Errors
    /// `DistError::Shape` if a layer name repeats, or if layers are given with
    /// a `sample_count` of zero.
    pub fn from_layers<S: Into<String>>(
        layers: impl IntoIterator<Item = (S, LayerStats)>,
        sample_count: usize,
    ) -> Result<Self> {
        let mut collected: Vec<(String, LayerStats)> = Vec::new();
        for (name, stats) in layers {
            let name = name.into();
            if collected.iter().any(|(seen, _)| *seen == name) {
                return Err(DistError::shape(&name, "layer given more than once"));
            }
            collected.push((name, stats));
        }

        if let (0, Some((first, _))) = (sample_count, collected.first()) {
            return Err(DistError::shape(first, "statistics summarize zero samples"));
        }

        Ok(Self {
            layers: collected,
            sample_count,
            extractor: None,
        })
    }

    /// Tags the distribution with the name of the feature extractor that produced its inputs.
    pub fn with_extractor<S: Into<String>>(mut self, extractor: S) -> Self {
        self.extractor = Some(extractor.into());
        self
    }

    pub fn kind(&self) -> DistributionKind {
        DistributionKind::Gaussian
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn extractor(&self) -> Option<&str> {
        self.extractor.as_deref()
    }

    /// Whether the variances were measured.
    ///
    /// A distribution summarizing a single sample carries zero placeholders instead.
    pub fn has_measured_variance(&self) -> bool {
        self.sample_count > 1
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            type_tag: self.kind().to_string(),
            name: self.kind().to_string(),
            extractor: self.extractor.clone(),
            num_images: self.sample_count,
            neurons: self
                .layers
                .iter()
                .map(|(layer, stats)| LayerShape {
                    layer: layer.clone(),
                    neurons: stats.len(),
                })
                .collect(),
        }
    }

    fn find(&self, layer: &str) -> Option<&LayerStats> {
        self.layers
            .iter()
            .find_map(|(name, stats)| (name == layer).then_some(stats))
    }
}

impl NeuronDistribution for GaussianDistribution {
    const KIND: DistributionKind = DistributionKind::Gaussian;

    fn fit(features: &LayerFeatures<'_>) -> Result<Self> {
        GaussianDistribution::fit(features)
    }

    fn merge(&self, other: &Self) -> Result<Self> {
        GaussianDistribution::merge(self, other)
    }

    fn save(&self, path: &Path, config: &CodecConfig) -> Result<()> {
        GaussianDistribution::save(self, path, config)
    }

    fn load(path: &Path, meta: &Metadata) -> Result<Self> {
        GaussianDistribution::load(path, meta)
    }

    fn metadata(&self) -> Metadata {
        GaussianDistribution::metadata(self)
    }

    fn sample_count(&self) -> usize {
        self.sample_count
    }
}
