use super::{GaussianDistribution, LayerStats};
use crate::error::{DistError, Result};

impl GaussianDistribution {
    /// Combines two distributions into the one their pooled samples would fit to.
    ///
    /// Uses the pairwise (Chan et al.) update, so only the summaries and sample
    /// counts are needed. Neither input is modified.
    ///
    /// # Args
    /// * `other` - A distribution over the same layers and neuron counts.
    ///
    /// # Returns
    /// A new distribution over `self.sample_count() + other.sample_count()` samples,
    /// layers in `self`'s order.
    ///
    /// # Errors
    /// * `DistError::DegenerateMerge` if fewer than two samples would be pooled.
    ///   Checked first, so it wins over a schema mismatch.
    /// * `DistError::SchemaMismatch` if the layers, neuron counts or extractors differ.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        let total = self.sample_count + other.sample_count;
        if total < 2 {
            return Err(DistError::DegenerateMerge { total });
        }

        self.check_compatible(other)?;

        let n_a = self.sample_count as f64;
        let n_b = other.sample_count as f64;

        let layers = self
            .layers
            .iter()
            .map(|(name, a)| {
                let b = other.find(name).ok_or_else(|| DistError::Key(name.clone()))?;
                Ok((name.clone(), combine(a, n_a, b, n_b)))
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            n_a = self.sample_count,
            n_b = other.sample_count,
            layers = layers.len();
            "merged distributions"
        );

        Ok(Self {
            layers,
            sample_count: total,
            extractor: self.extractor.clone().or_else(|| other.extractor.clone()),
        })
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        if let (Some(a), Some(b)) = (&self.extractor, &other.extractor) {
            if a != b {
                return Err(DistError::SchemaMismatch(format!(
                    "fitted with different extractors: '{a}' and '{b}'"
                )));
            }
        }

        for (name, stats) in &self.layers {
            match other.find(name) {
                None => {
                    return Err(DistError::SchemaMismatch(format!(
                        "layer '{name}' is missing from the other distribution"
                    )));
                }
                Some(theirs) if theirs.len() != stats.len() => {
                    return Err(DistError::SchemaMismatch(format!(
                        "layer '{name}' has {} neurons on one side and {} on the other",
                        stats.len(),
                        theirs.len()
                    )));
                }
                Some(_) => {}
            }
        }

        if let Some((extra, _)) = other.layers.iter().find(|(name, _)| self.find(name).is_none()) {
            return Err(DistError::SchemaMismatch(format!(
                "layer '{extra}' is missing from this distribution"
            )));
        }

        Ok(())
    }
}

/// Pooled mean and unbiased variance of two groups of `n_a` and `n_b` samples.
///
/// Requires `n_a + n_b >= 2`.
fn combine(a: &LayerStats, n_a: f64, b: &LayerStats, n_b: f64) -> LayerStats {
    let n = n_a + n_b;
    let mu = (&a.mu * n_a + &b.mu * n_b) / n;

    let spread_a = (&a.mu - &mu).mapv(|d| d * d) * n_a;
    let spread_b = (&b.mu - &mu).mapv(|d| d * d) * n_b;
    let var = (&a.var * (n_a - 1.0) + spread_a + &b.var * (n_b - 1.0) + spread_b) / (n - 1.0);

    LayerStats { mu, var }
}
