//! Error type returned by the security service.

use crate::data::RepositoryError;
use crate::image::ImageError;

/// A collaborator failure, carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityError {
    /// The repository rejected or failed a call
    Repository(RepositoryError),
    /// The image service could not classify a frame
    Image(ImageError),
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityError::Repository(e) => write!(f, "Repository error: {e}"),
            SecurityError::Image(e) => write!(f, "Image service error: {e}"),
        }
    }
}

impl std::error::Error for SecurityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SecurityError::Repository(e) => Some(e),
            SecurityError::Image(e) => Some(e),
        }
    }
}

impl From<RepositoryError> for SecurityError {
    fn from(e: RepositoryError) -> Self {
        SecurityError::Repository(e)
    }
}

impl From<ImageError> for SecurityError {
    fn from(e: ImageError) -> Self {
        SecurityError::Image(e)
    }
}
