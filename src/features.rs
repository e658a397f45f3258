use ndarray::{Array2, ArrayViewD};

use crate::error::{DistError, Result};

/// The per-layer activations produced by one extractor call, in extraction order.
///
/// Every tensor has the batch dimension first. Layer names are unique.
#[derive(Debug, Clone, Default)]
pub struct LayerFeatures<'a> {
    layers: Vec<(String, ArrayViewD<'a, f32>)>,
}

impl<'a> LayerFeatures<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Appends the activations of a layer.
    ///
    /// # Args
    /// * `layer` - The layer's name.
    /// * `batch` - Its activations, shaped `[samples, ...]`.
    ///
    /// # Errors
    /// `DistError::Shape` if a layer with the same name was already added.
    pub fn push<S: Into<String>>(&mut self, layer: S, batch: ArrayViewD<'a, f32>) -> Result<()> {
        let layer = layer.into();
        if self.layers.iter().any(|(name, _)| *name == layer) {
            return Err(DistError::shape(&layer, "layer given more than once"));
        }

        self.layers.push((layer, batch));
        Ok(())
    }

    /// Builder flavour of [`LayerFeatures::push`].
    pub fn with<S: Into<String>>(mut self, layer: S, batch: ArrayViewD<'a, f32>) -> Result<Self> {
        self.push(layer, batch)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArrayViewD<'a, f32>)> {
        self.layers.iter().map(|(name, batch)| (name.as_str(), batch))
    }
}

/// Flattens every non-sample dimension of `batch` into a single neuron axis.
///
/// # Args
/// * `layer` - The layer name, for error reporting.
/// * `batch` - The activations, shaped `[samples, ...]`.
///
/// # Returns
/// A `[samples, neurons]` matrix widened to f64.
///
/// # Errors
/// `DistError::Shape` if the tensor has no batch axis or no samples.
pub fn flatten_batch(layer: &str, batch: &ArrayViewD<'_, f32>) -> Result<Array2<f64>> {
    let Some((&samples, rest)) = batch.shape().split_first() else {
        return Err(DistError::shape(layer, "tensor has no batch dimension"));
    };

    if samples == 0 {
        return Err(DistError::shape(layer, "batch holds zero samples"));
    }

    let neurons = rest.iter().product::<usize>();

    // `mapv` yields a standard layout array, so a row-major reshape always succeeds.
    batch
        .mapv(f64::from)
        .into_shape_with_order((samples, neurons))
        .map_err(|e| DistError::shape(layer, e.to_string()))
}
