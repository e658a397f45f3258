//! Per-neuron statistics of extracted features ("visual DNA"): fit them from
//! activation batches, persist them, and merge shards into the statistics of
//! their pooled samples.

pub mod codec;
pub mod config;
pub mod error;
pub mod family;
pub mod features;
pub mod gaussian;
pub mod metadata;

pub use config::{CodecConfig, Compression};
pub use error::{DistError, Result};
pub use family::{merge_all, open, DistributionKind, NeuronDistribution};
pub use features::LayerFeatures;
pub use gaussian::{GaussianDistribution, LayerStats, NeuronStats};
pub use metadata::{LayerShape, Metadata};
