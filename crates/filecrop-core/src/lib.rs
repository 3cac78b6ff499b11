//! Filecrop Core - crop dialog controller
//!
//! This crate provides the core of the file manager's crop dialog: the
//! session controller that ties the dialog, the crop editor and the save
//! request together, plus the editor itself (crop box geometry, cropped
//! canvas rendering) and PNG data-URI encoding.
//!
//! Nothing here touches the DOM or the network; the page side is reached
//! through [`session::CropHost`] and [`session::SaveTransport`].

pub mod config;
pub mod editor;
pub mod encode;
pub mod error;
pub mod session;

pub use config::{ClosePolicy, CropConfig, Messages};
pub use editor::{CanvasOptions, CropBox, CropWidget, EditorOptions, Handle, ImageEditor};
pub use error::{CropError, TransportError};
pub use session::{
    save_with, CropHost, CropSession, ImageSource, LoadTicket, PendingSave, SaveRequest,
    SaveResponse, SaveTransport, SessionPhase,
};

pub use image::{RgbImage, RgbaImage};
