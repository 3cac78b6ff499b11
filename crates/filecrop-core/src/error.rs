//! Error taxonomy for the crop session.
//!
//! Every failure is terminal for the operation that raised it: nothing is
//! retried, the operator is told through a blocking alert and the technical
//! detail goes to the diagnostic log.

use thiserror::Error;

use crate::editor::CanvasError;
use crate::encode::EncodeError;

/// Errors surfaced by [`CropSession`](crate::session::CropSession) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropError {
    /// Save or data extraction was attempted with no editor attached.
    #[error("Cropper not initialized")]
    NoActiveEditor,

    /// A save is already waiting for its response.
    #[error("A cropped image is already being saved")]
    SaveInFlight,

    /// The cropped bitmap could not be produced or encoded.
    #[error("Could not get cropped image data: {0}")]
    EncodingUnavailable(String),

    /// The endpoint answered with `success: false`.
    #[error("Server rejected cropped image: {0}")]
    ServerRejected(String),

    /// The request never produced a well-formed response.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The image to crop could not be loaded or decoded.
    #[error("Image could not be loaded: {0}")]
    ImageLoad(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<EncodeError> for CropError {
    fn from(err: EncodeError) -> Self {
        CropError::EncodingUnavailable(err.to_string())
    }
}

impl From<CanvasError> for CropError {
    fn from(err: CanvasError) -> Self {
        CropError::EncodingUnavailable(err.to_string())
    }
}

/// Failure to complete the save request at the transport level.
///
/// Covers network errors as well as responses whose body is not the
/// expected JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<TransportError> for CropError {
    fn from(err: TransportError) -> Self {
        CropError::Transport(err.0)
    }
}
