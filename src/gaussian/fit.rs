use ndarray::{Array1, Array2, Axis};

use super::{GaussianDistribution, LayerStats};
use crate::{
    error::{DistError, Result},
    features::{flatten_batch, LayerFeatures},
};

impl GaussianDistribution {
    /// Fits the per-neuron mean and unbiased variance of every layer.
    ///
    /// Every call yields a fresh distribution; nothing accumulates across calls.
    ///
    /// # Args
    /// * `features` - One `[samples, ...]` tensor per layer, all with the same sample count.
    ///
    /// # Returns
    /// The fitted distribution, layers in the order they were given.
    ///
    /// # Errors
    /// `DistError::Shape` if there are no layers, a layer has no samples, or the
    /// layers disagree on the sample count.
    pub fn fit(features: &LayerFeatures<'_>) -> Result<Self> {
        if features.is_empty() {
            return Err(DistError::shape("", "no layers to fit"));
        }

        let mut layers = Vec::with_capacity(features.len());
        let mut sample_count = None;

        for (layer, batch) in features.iter() {
            let flat = flatten_batch(layer, batch)?;
            let samples = flat.nrows();

            match sample_count {
                None => sample_count = Some(samples),
                Some(expected) if expected != samples => {
                    return Err(DistError::shape(
                        layer,
                        format!("{samples} samples, previous layers had {expected}"),
                    ));
                }
                Some(_) => {}
            }

            log::debug!(layer = layer, samples = samples, neurons = flat.ncols(); "fitting layer");
            layers.push((layer.to_string(), gaussian_params(layer, &flat)?));
        }

        Ok(Self {
            layers,
            sample_count: sample_count.unwrap_or_default(),
            extractor: None,
        })
    }
}

/// Per-neuron mean and Bessel-corrected variance of a `[samples, neurons]` matrix.
///
/// A single sample has no measurable variance; it is reported as zero with a warning.
fn gaussian_params(layer: &str, flat: &Array2<f64>) -> Result<LayerStats> {
    let mu = flat
        .mean_axis(Axis(0))
        .ok_or_else(|| DistError::shape(layer, "batch holds zero samples"))?;

    let var = if flat.nrows() > 1 {
        flat.var_axis(Axis(0), 1.0)
    } else {
        log::warn!(layer = layer; "only one sample, variance is set to 0");
        Array1::zeros(mu.len())
    };

    Ok(LayerStats { mu, var })
}
