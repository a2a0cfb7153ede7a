use thiserror::Error;

/// Errors surfaced by graph construction and the distance algebra.
///
/// All of these signal caller-side violations; nothing is retried and no
/// partial result is returned once one is raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unknown layer `{0}`")]
    UnknownLayer(String),

    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("nodes `{from}` and `{to}` are not connected")]
    NotConnected { from: String, to: String },

    #[error("invalid weight {weight} for {subject}")]
    InvalidWeight { subject: String, weight: f64 },

    #[error("duplicate edge `{from}` -> `{to}` in layer `{layer}`")]
    DuplicateEdge {
        from: String,
        to: String,
        layer: String,
    },

    #[error("dimension mismatch: {left} layers vs {right} layers")]
    DimensionMismatch { left: usize, right: usize },

    #[error("layer index {index} out of range for {layers} layers")]
    InvalidLayerIndex { index: usize, layers: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
