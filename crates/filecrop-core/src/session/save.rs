//! The save round-trip: request/response bodies and the transport seam.

use std::cell::RefCell;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::{CropSession, LoadTicket};
use crate::editor::CropWidget;
use crate::error::{CropError, TransportError};
use crate::session::CropHost;

/// JSON body POSTed to the save endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub image_path: String,
    /// `data:image/png;base64,...`
    pub image_data: String,
}

/// JSON body the save endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    /// Parse a response body. A body that is not the expected object counts
    /// as a transport failure, not a rejection.
    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        serde_json::from_str(body)
            .map_err(|e| TransportError::new(format!("malformed save response: {e}")))
    }
}

/// A save that has been validated and encoded but not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub(super) ticket: LoadTicket,
    pub endpoint: String,
    pub request: SaveRequest,
    /// `request` serialized as JSON
    pub body: String,
}

impl PendingSave {
    /// Ticket of the dialog session this save belongs to.
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }
}

/// Delivers a save request and yields the raw response body.
pub trait SaveTransport {
    fn post(&self, endpoint: &str, body: String) -> impl Future<Output = Result<String, TransportError>>;
}

/// Run a full save: begin, post, complete.
///
/// The session is only borrowed around the synchronous steps, so other page
/// events (including a new `open_crop`) can use it while the request is in
/// flight.
pub async fn save_with<W, H, T>(session: &RefCell<CropSession<W, H>>, transport: &T) -> Result<(), CropError>
where
    W: CropWidget,
    H: CropHost,
    T: SaveTransport,
{
    let pending = session.borrow_mut().begin_save()?;
    let response = transport
        .post(&pending.endpoint, pending.body.clone())
        .await
        .and_then(|body| SaveResponse::from_json(&body));
    session.borrow_mut().complete_save(pending, response)
}
