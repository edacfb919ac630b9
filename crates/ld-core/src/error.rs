use thiserror::Error;

/// Errors raised at the boundary where external geometry enters the core.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PathError {
    /// A segment needs 2 (line), 3 (quadratic) or 4 (cubic) points.
    #[error("a segment needs 2, 3 or 4 points, got {count}")]
    MalformedSegment { count: usize },

    #[error("invalid path data at byte {offset}: {reason}")]
    InvalidPathData { offset: usize, reason: String },

    #[error("unsupported path command '{0}'")]
    UnsupportedCommand(char),

    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// The primitive does not exist or carries no path data.
    #[error("primitive '{0}' is not a path")]
    NotAPath(String),
}
