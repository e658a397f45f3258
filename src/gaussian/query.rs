use ndarray::Array1;

use super::{GaussianDistribution, LayerStats, NeuronStats};
use crate::error::{DistError, Result};

impl GaussianDistribution {
    /// The statistics of one neuron.
    ///
    /// # Errors
    /// `DistError::Index` if the layer is unknown or `index` is out of its range.
    pub fn neuron(&self, layer: &str, index: usize) -> Result<NeuronStats> {
        let Some(stats) = self.find(layer) else {
            return Err(DistError::Index {
                layer: layer.to_string(),
                index,
                neurons: None,
            });
        };

        match (stats.mu.get(index), stats.var.get(index)) {
            (Some(&mu), Some(&var)) => Ok(NeuronStats { mu, var }),
            _ => Err(DistError::Index {
                layer: layer.to_string(),
                index,
                neurons: Some(stats.len()),
            }),
        }
    }

    /// The statistics of every neuron in a layer.
    ///
    /// # Errors
    /// `DistError::Key` if the layer is unknown.
    pub fn layer(&self, layer: &str) -> Result<&LayerStats> {
        self.find(layer)
            .ok_or_else(|| DistError::Key(layer.to_string()))
    }

    /// The statistics of every neuron, layers concatenated in their fitting/loading order.
    pub fn all(&self) -> LayerStats {
        let mu = Array1::from_iter(self.layers.iter().flat_map(|(_, s)| s.mu.iter().copied()));
        let var = Array1::from_iter(self.layers.iter().flat_map(|(_, s)| s.var.iter().copied()));
        LayerStats { mu, var }
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(name, _)| name.as_str())
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Neuron count of `layer`, `None` if unknown.
    pub fn neuron_count(&self, layer: &str) -> Option<usize> {
        self.find(layer).map(LayerStats::len)
    }

    /// Neuron count across all layers.
    pub fn num_neurons(&self) -> usize {
        self.layers.iter().map(|(_, stats)| stats.len()).sum()
    }
}
