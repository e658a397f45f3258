use std::{error::Error, fmt, io};

/// The crate's result type.
pub type Result<T> = std::result::Result<T, DistError>;

/// Every failure the statistics engine can report.
#[derive(Debug)]
pub enum DistError {
    /// A feature batch or set of statistics is malformed (no samples, no batch axis,
    /// mismatched lengths...). `layer` is empty when no single layer is at fault.
    Shape { layer: String, reason: String },
    /// Two distributions cannot be combined, or a file holds another family.
    SchemaMismatch(String),
    /// A merge would end up with fewer than two samples, so the variance denominator is not positive.
    DegenerateMerge { total: usize },
    /// An expected layer has no entry in the archive.
    MissingLayer { layer: String, key: String },
    /// The archive could not be written, read or decoded.
    Io(io::Error),
    /// The companion metadata could not be encoded or decoded.
    Metadata(serde_json::Error),
    /// Neuron query out of range. `neurons` is `None` when the layer itself is unknown.
    Index {
        layer: String,
        index: usize,
        neurons: Option<usize>,
    },
    /// Layer query for an unknown layer.
    Key(String),
}

impl DistError {
    pub(crate) fn shape(layer: &str, reason: impl Into<String>) -> Self {
        Self::Shape {
            layer: layer.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_data(msg: impl Into<String>) -> Self {
        Self::Io(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
    }
}

impl fmt::Display for DistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape { layer, reason } if layer.is_empty() => write!(f, "shape error: {reason}"),
            Self::Shape { layer, reason } => write!(f, "shape error in layer '{layer}': {reason}"),
            Self::SchemaMismatch(msg) => write!(f, "schema mismatch: {msg}"),
            Self::DegenerateMerge { total } => write!(
                f,
                "degenerate merge: {total} total sample(s), at least 2 are needed"
            ),
            Self::MissingLayer { layer, key } => {
                write!(f, "missing layer '{layer}': archive has no '{key}' entry")
            }
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Metadata(e) => write!(f, "metadata error: {e}"),
            Self::Index {
                layer,
                index,
                neurons: Some(neurons),
            } => write!(
                f,
                "neuron {index} out of range for layer '{layer}' with {neurons} neuron(s)"
            ),
            Self::Index {
                layer,
                index,
                neurons: None,
            } => write!(f, "neuron {index} requested from unknown layer '{layer}'"),
            Self::Key(layer) => write!(f, "unknown layer '{layer}'"),
        }
    }
}

impl Error for DistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Metadata(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DistError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for DistError {
    fn from(e: serde_json::Error) -> Self {
        Self::Metadata(e)
    }
}

impl From<zip::result::ZipError> for DistError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(e) => Self::Io(e),
            other => Self::Io(io::Error::new(io::ErrorKind::InvalidData, other)),
        }
    }
}
