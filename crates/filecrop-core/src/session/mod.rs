//! The crop dialog controller.
//!
//! A [`CropSession`] owns at most one editor at a time and moves through
//! `Closed → Loading → Editing → Closed`. With
//! [`ClosePolicy::AfterResponse`] a save parks the editor in `Saving` until
//! the response is in.
//!
//! # Suspension points
//!
//! - Image load: [`CropSession::open_crop`] hands out a [`LoadTicket`]; only
//!   [`CropSession::image_loaded`] with the current ticket attaches an
//!   editor. Load events of superseded opens are dropped.
//! - Save request: [`CropSession::begin_save`] returns a [`PendingSave`]
//!   for the transport; [`CropSession::complete_save`] takes the outcome.
//!   [`save_with`] glues the two around an async transport.

mod host;
mod save;

pub use host::{CropHost, ImageSource};
pub use save::{save_with, PendingSave, SaveRequest, SaveResponse, SaveTransport};

use crate::config::{ClosePolicy, CropConfig};
use crate::editor::CropWidget;
use crate::error::{CropError, TransportError};

/// Identifies one `open_crop` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// Externally visible phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Closed,
    Loading,
    Editing,
    Saving,
}

#[derive(Debug)]
enum SessionState<W> {
    Closed,
    Loading {
        ticket: LoadTicket,
        image_path: String,
    },
    Editing {
        ticket: LoadTicket,
        image_path: String,
        editor: W,
    },
    Saving {
        ticket: LoadTicket,
        image_path: String,
        editor: W,
    },
}

/// Controller for the crop dialog.
#[derive(Debug)]
pub struct CropSession<W, H> {
    config: CropConfig,
    host: H,
    state: SessionState<W>,
    last_ticket: u64,
}

impl<W: CropWidget, H: CropHost> CropSession<W, H> {
    /// Create a closed session. Fails if `config` does not validate.
    pub fn new(config: CropConfig, host: H) -> Result<Self, CropError> {
        config.validate()?;
        Ok(Self {
            config,
            host,
            state: SessionState::Closed,
            last_ticket: 0,
        })
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Closed => SessionPhase::Closed,
            SessionState::Loading { .. } => SessionPhase::Loading,
            SessionState::Editing { .. } => SessionPhase::Editing,
            SessionState::Saving { .. } => SessionPhase::Saving,
        }
    }

    /// The live editor, if any.
    pub fn editor(&self) -> Option<&W> {
        match &self.state {
            SessionState::Editing { editor, .. } | SessionState::Saving { editor, .. } => Some(editor),
            _ => None,
        }
    }

    /// Mutable access to the editor while the crop box can still change.
    pub fn editor_mut(&mut self) -> Option<&mut W> {
        match &mut self.state {
            SessionState::Editing { editor, .. } => Some(editor),
            _ => None,
        }
    }

    /// Path bound by the current `open_crop`, until the dialog closes.
    pub fn target_path(&self) -> Option<&str> {
        match &self.state {
            SessionState::Closed => None,
            SessionState::Loading { image_path, .. }
            | SessionState::Editing { image_path, .. }
            | SessionState::Saving { image_path, .. } => Some(image_path),
        }
    }

    /// Ticket of the most recent `open_crop`, while that session is live.
    pub fn current_ticket(&self) -> Option<LoadTicket> {
        match &self.state {
            SessionState::Closed => None,
            SessionState::Loading { ticket, .. }
            | SessionState::Editing { ticket, .. }
            | SessionState::Saving { ticket, .. } => Some(*ticket),
        }
    }

    /// Show the dialog for `source` and bind `image_path`.
    ///
    /// Any live editor is destroyed right away; the new one attaches in
    /// [`image_loaded`](Self::image_loaded) once the image has loaded.
    pub fn open_crop(&mut self, source: impl Into<ImageSource>, image_path: impl Into<String>) -> LoadTicket {
        let source = source.into();
        let image_path = image_path.into();

        self.destroy_editor();
        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);
        log::debug!("opening crop dialog {ticket:?} for {image_path}");

        self.host.present_image(&source, &image_path);
        self.host.show_modal();
        self.state = SessionState::Loading { ticket, image_path };
        ticket
    }

    /// The image for `ticket` finished loading: attach a fresh editor.
    ///
    /// Returns `Ok(false)` when `ticket` belongs to a superseded open and
    /// the event was ignored.
    pub fn image_loaded(&mut self, ticket: LoadTicket, source: W::Source) -> Result<bool, CropError> {
        let image_path = match &self.state {
            SessionState::Loading {
                ticket: current,
                image_path,
            } if *current == ticket => image_path.clone(),
            _ => {
                log::warn!("ignoring load event for stale crop dialog {ticket:?}");
                return Ok(false);
            }
        };

        // Loading holds no editor; this covers any other path that left one behind
        self.destroy_editor();

        match W::attach(source, &self.config.editor) {
            Ok(editor) => {
                log::debug!("crop editor attached for {image_path}");
                self.state = SessionState::Editing {
                    ticket,
                    image_path,
                    editor,
                };
                Ok(true)
            }
            Err(err) => {
                let message = self.config.messages.load_failed.clone();
                self.fail(&err, &message);
                Err(err)
            }
        }
    }

    /// The image for `ticket` could not be loaded.
    pub fn image_failed(&mut self, ticket: LoadTicket, reason: &str) {
        if !matches!(&self.state, SessionState::Loading { ticket: current, .. } if *current == ticket) {
            log::warn!("ignoring load failure for stale crop dialog {ticket:?}");
            return;
        }
        let err = CropError::ImageLoad(reason.to_string());
        let message = self.config.messages.load_failed.clone();
        self.fail(&err, &message);
    }

    /// Hide the dialog and destroy the editor. Safe to call at any time.
    pub fn close_crop(&mut self) {
        self.host.hide_modal();
        self.destroy_editor();
        self.state = SessionState::Closed;
    }

    /// The cropped image as a PNG data URI, or `None` without an editor.
    pub fn cropped_image_data(&self) -> Option<String> {
        match self.render_data_uri() {
            Ok(uri) => Some(uri),
            Err(err) => {
                log::debug!("no cropped image data: {err}");
                None
            }
        }
    }

    fn render_data_uri(&self) -> Result<String, CropError> {
        let editor = self.editor().ok_or(CropError::NoActiveEditor)?;
        editor.cropped_data_uri(&self.config.canvas)
    }

    /// Validate, encode and package the save; clean up the dialog.
    ///
    /// On success the returned [`PendingSave`] must be delivered and its
    /// outcome passed to [`complete_save`](Self::complete_save). Every error
    /// has already been reported to the operator and the dialog is closed.
    pub fn begin_save(&mut self) -> Result<PendingSave, CropError> {
        let (ticket, image_path) = match &self.state {
            SessionState::Editing {
                ticket, image_path, ..
            } => (*ticket, image_path.clone()),
            SessionState::Saving { .. } => {
                let err = CropError::SaveInFlight;
                let message = self.config.messages.save_in_flight.clone();
                self.report(&err, &message);
                return Err(err);
            }
            _ => {
                let err = CropError::NoActiveEditor;
                let message = self.config.messages.not_initialized.clone();
                self.fail(&err, &message);
                return Err(err);
            }
        };

        let encoded = self.render_data_uri().and_then(|image_data| {
            let request = SaveRequest {
                image_path,
                image_data,
            };
            serde_json::to_string(&request)
                .map(|body| (request, body))
                .map_err(|e| CropError::EncodingUnavailable(e.to_string()))
        });
        let (request, body) = match encoded {
            Ok(encoded) => encoded,
            Err(err) => {
                let message = self.config.messages.encoding_unavailable.clone();
                self.fail(&err, &message);
                return Err(err);
            }
        };

        let pending = PendingSave {
            ticket,
            endpoint: self.config.endpoint.clone(),
            request,
            body,
        };
        log::debug!(
            "saving cropped {} to {}",
            pending.request.image_path,
            pending.endpoint
        );

        match self.config.close_policy {
            ClosePolicy::Immediate => self.close_crop(),
            ClosePolicy::AfterResponse => {
                let state = std::mem::replace(&mut self.state, SessionState::Closed);
                self.state = match state {
                    SessionState::Editing {
                        ticket,
                        image_path,
                        editor,
                    } => SessionState::Saving {
                        ticket,
                        image_path,
                        editor,
                    },
                    other => other,
                };
            }
        }
        Ok(pending)
    }

    /// Handle the outcome of a save started by [`begin_save`](Self::begin_save).
    ///
    /// Notifies the operator; reloads the page after a successful save when
    /// configured. Under [`ClosePolicy::AfterResponse`] the dialog closes
    /// here, unless it has since been reopened for another image.
    pub fn complete_save(
        &mut self,
        pending: PendingSave,
        response: Result<SaveResponse, TransportError>,
    ) -> Result<(), CropError> {
        if matches!(&self.state, SessionState::Saving { ticket, .. } if *ticket == pending.ticket) {
            self.close_crop();
        }

        match response {
            Ok(SaveResponse { success: true, .. }) => {
                log::debug!("cropped {} saved", pending.request.image_path);
                let message = self.config.messages.saved.clone();
                self.host.alert(&message);
                if self.config.reload_on_success {
                    self.host.reload_page();
                }
                Ok(())
            }
            Ok(SaveResponse { error, .. }) => {
                let detail = error.unwrap_or_else(|| "Unknown error".to_string());
                let err = CropError::ServerRejected(detail.clone());
                let message = format!("{}{}", self.config.messages.rejected_prefix, detail);
                self.report(&err, &message);
                Err(err)
            }
            Err(transport) => {
                let err = CropError::from(transport);
                let message = self.config.messages.transport_failure.clone();
                self.report(&err, &message);
                Err(err)
            }
        }
    }

    /// Diagnostic plus alert.
    fn report(&mut self, err: &CropError, message: &str) {
        self.host.diagnostic(&err.to_string());
        self.host.alert(message);
    }

    /// Report, then close the dialog.
    fn fail(&mut self, err: &CropError, message: &str) {
        self.report(err, message);
        self.close_crop();
    }

    fn destroy_editor(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Closed);
        self.state = match state {
            SessionState::Editing { editor, .. } | SessionState::Saving { editor, .. } => {
                editor.destroy();
                SessionState::Closed
            }
            other => other,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{CanvasError, CanvasOptions, CropBox, EditorOptions, ImageEditor};
    use crate::encode::png_data_uri;
    use futures::executor::block_on;
    use image::{RgbImage, RgbaImage};
    use std::cell::{Cell, RefCell};
    use std::future::Future;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum HostEvent {
        Present(String, String),
        Show,
        Hide,
        Alert(String),
        Reload,
        Diagnostic(String),
    }

    #[derive(Debug, Default)]
    struct RecordingHost {
        events: Vec<HostEvent>,
    }

    impl RecordingHost {
        fn alerts(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    HostEvent::Alert(m) => Some(m.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn diagnostics(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    HostEvent::Diagnostic(m) => Some(m.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn reloads(&self) -> usize {
            self.events.iter().filter(|e| **e == HostEvent::Reload).count()
        }
    }

    impl CropHost for RecordingHost {
        fn present_image(&mut self, source: &ImageSource, image_path: &str) {
            self.events
                .push(HostEvent::Present(source.as_src().to_string(), image_path.to_string()));
        }

        fn show_modal(&mut self) {
            self.events.push(HostEvent::Show);
        }

        fn hide_modal(&mut self) {
            self.events.push(HostEvent::Hide);
        }

        fn alert(&mut self, message: &str) {
            self.events.push(HostEvent::Alert(message.to_string()));
        }

        fn reload_page(&mut self) {
            self.events.push(HostEvent::Reload);
        }

        fn diagnostic(&mut self, message: &str) {
            self.events.push(HostEvent::Diagnostic(message.to_string()));
        }
    }

    /// Widget that counts live instances through a shared counter.
    #[derive(Debug)]
    struct MockWidget {
        live: Rc<Cell<usize>>,
        name: String,
        broken_canvas: bool,
    }

    #[derive(Debug, Clone)]
    struct MockSource {
        live: Rc<Cell<usize>>,
        name: String,
        broken_canvas: bool,
    }

    impl MockSource {
        fn new(live: &Rc<Cell<usize>>, name: &str) -> Self {
            Self {
                live: Rc::clone(live),
                name: name.to_string(),
                broken_canvas: false,
            }
        }
    }

    impl CropWidget for MockWidget {
        type Source = MockSource;

        fn attach(source: MockSource, _options: &EditorOptions) -> Result<Self, CropError> {
            source.live.set(source.live.get() + 1);
            Ok(Self {
                live: source.live,
                name: source.name,
                broken_canvas: source.broken_canvas,
            })
        }

        fn crop_box(&self) -> CropBox {
            CropBox::new(0.0, 0.0, 4.0, 4.0)
        }

        fn set_crop_box(&mut self, _crop_box: CropBox) -> bool {
            false
        }

        fn reset(&mut self) {}

        fn cropped_data_uri(&self, _options: &CanvasOptions) -> Result<String, CropError> {
            if self.broken_canvas {
                return Err(CanvasError::EmptySource.into());
            }
            Ok(png_data_uri(&RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255])))?)
        }

        fn destroy(self) {
            self.live.set(self.live.get() - 1);
        }
    }

    struct MockTransport {
        response: Result<String, TransportError>,
        posts: RefCell<Vec<(String, String)>>,
    }

    impl MockTransport {
        fn answering(body: &str) -> Self {
            Self {
                response: Ok(body.to_string()),
                posts: RefCell::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(TransportError::new(message)),
                posts: RefCell::new(Vec::new()),
            }
        }
    }

    impl SaveTransport for MockTransport {
        fn post(&self, endpoint: &str, body: String) -> impl Future<Output = Result<String, TransportError>> {
            self.posts.borrow_mut().push((endpoint.to_string(), body));
            let response = self.response.clone();
            async move { response }
        }
    }

    type MockSession = CropSession<MockWidget, RecordingHost>;

    fn session() -> MockSession {
        CropSession::new(CropConfig::default(), RecordingHost::default()).unwrap()
    }

    fn session_with(config: CropConfig) -> MockSession {
        CropSession::new(config, RecordingHost::default()).unwrap()
    }

    /// Open `path` and deliver its load event.
    fn open_loaded(session: &mut MockSession, live: &Rc<Cell<usize>>, path: &str) {
        let ticket = session.open_crop(format!("/files{path}"), path);
        assert_eq!(session.image_loaded(ticket, MockSource::new(live, path)), Ok(true));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = CropConfig::default();
        config.endpoint = String::new();
        let result = CropSession::<MockWidget, _>::new(config, RecordingHost::default());
        assert!(matches!(result, Err(CropError::InvalidConfig(_))));
    }

    #[test]
    fn test_open_shows_modal_and_binds_path() {
        let mut s = session();
        s.open_crop("/files/a/b.jpg", "/a/b.jpg");
        assert_eq!(s.phase(), SessionPhase::Loading);
        assert_eq!(s.target_path(), Some("/a/b.jpg"));
        assert!(s.editor().is_none());
        assert_eq!(
            s.host().events,
            vec![
                HostEvent::Present("/files/a/b.jpg".to_string(), "/a/b.jpg".to_string()),
                HostEvent::Show,
            ]
        );
    }

    #[test]
    fn test_editor_attaches_only_after_load() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        let ticket = s.open_crop("/files/x.png", "/x.png");
        assert_eq!(live.get(), 0);

        assert_eq!(s.image_loaded(ticket, MockSource::new(&live, "x")), Ok(true));
        assert_eq!(s.phase(), SessionPhase::Editing);
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn test_reopen_destroys_previous_editor() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        open_loaded(&mut s, &live, "/first.jpg");
        s.open_crop("/files/second.jpg", "/second.jpg");
        assert_eq!(live.get(), 0);
        assert_eq!(s.target_path(), Some("/second.jpg"));
    }

    #[test]
    fn test_close_destroys_editor() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        open_loaded(&mut s, &live, "/a.jpg");
        s.close_crop();
        assert_eq!(live.get(), 0);
        assert_eq!(s.phase(), SessionPhase::Closed);
        assert_eq!(s.target_path(), None);
        assert_eq!(s.host().events.last(), Some(&HostEvent::Hide));
    }

    #[test]
    fn test_close_without_editor_is_noop() {
        let mut s = session();
        s.close_crop();
        s.close_crop();
        assert_eq!(s.phase(), SessionPhase::Closed);
        assert!(s.editor().is_none());
        assert!(s.host().alerts().is_empty());
        assert!(s.host().diagnostics().is_empty());
    }

    #[test]
    fn test_cropped_image_data_without_editor_is_none() {
        let mut s = session();
        assert_eq!(s.cropped_image_data(), None);
        s.open_crop("/files/a.jpg", "/a.jpg");
        assert_eq!(s.cropped_image_data(), None);
    }

    #[test]
    fn test_cropped_image_data_is_png_data_uri() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        open_loaded(&mut s, &live, "/a.jpg");
        let data = s.cropped_image_data().unwrap();
        assert!(data.starts_with("data:image/png;base64,"));
    }

    // Scenario A
    #[test]
    fn test_save_success_posts_reloads_and_closes() {
        let live = Rc::new(Cell::new(0));
        let s = RefCell::new(session());
        open_loaded(&mut s.borrow_mut(), &live, "/a/b.jpg");

        let transport = MockTransport::answering(r#"{"success": true}"#);
        assert_eq!(block_on(save_with(&s, &transport)), Ok(()));

        let posts = transport.posts.borrow();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "/crop");
        let body: SaveRequest = serde_json::from_str(&posts[0].1).unwrap();
        assert_eq!(body.image_path, "/a/b.jpg");
        assert!(body.image_data.starts_with("data:image/png;base64,"));

        let s = s.borrow();
        assert_eq!(s.host().reloads(), 1);
        assert_eq!(s.host().alerts(), vec!["Image cropped and saved successfully!"]);
        assert!(s.editor().is_none());
        assert_eq!(live.get(), 0);
    }

    // Scenario B
    #[test]
    fn test_save_rejected_alerts_detail_without_reload() {
        let live = Rc::new(Cell::new(0));
        let s = RefCell::new(session());
        open_loaded(&mut s.borrow_mut(), &live, "/a/b.jpg");

        let transport = MockTransport::answering(r#"{"success": false, "error": "disk full"}"#);
        let result = block_on(save_with(&s, &transport));
        assert_eq!(result, Err(CropError::ServerRejected("disk full".to_string())));

        let s = s.borrow();
        let alerts = s.host().alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("disk full"));
        assert_eq!(s.host().reloads(), 0);
        assert!(s.editor().is_none());
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_save_rejected_without_detail() {
        let live = Rc::new(Cell::new(0));
        let s = RefCell::new(session());
        open_loaded(&mut s.borrow_mut(), &live, "/a.jpg");

        let transport = MockTransport::answering(r#"{"success": false}"#);
        let result = block_on(save_with(&s, &transport));
        assert_eq!(result, Err(CropError::ServerRejected("Unknown error".to_string())));
    }

    // Scenario C
    #[test]
    fn test_save_transport_failure() {
        let live = Rc::new(Cell::new(0));
        let s = RefCell::new(session());
        open_loaded(&mut s.borrow_mut(), &live, "/a.jpg");

        let transport = MockTransport::failing("connection refused");
        let result = block_on(save_with(&s, &transport));
        assert_eq!(result, Err(CropError::Transport("connection refused".to_string())));

        let s = s.borrow();
        assert_eq!(
            s.host().alerts(),
            vec!["Error saving cropped image. See console for details."]
        );
        assert!(s.host().diagnostics()[0].contains("connection refused"));
        assert_eq!(s.host().reloads(), 0);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_save_malformed_response_is_transport_failure() {
        let live = Rc::new(Cell::new(0));
        let s = RefCell::new(session());
        open_loaded(&mut s.borrow_mut(), &live, "/a.jpg");

        let transport = MockTransport::answering("Internal Server Error");
        let result = block_on(save_with(&s, &transport));
        assert!(matches!(result, Err(CropError::Transport(_))));
        assert_eq!(s.borrow().host().reloads(), 0);
    }

    // Scenario D
    #[test]
    fn test_save_before_open_makes_no_request() {
        let s = RefCell::new(session());
        let transport = MockTransport::answering(r#"{"success": true}"#);

        let result = block_on(save_with(&s, &transport));
        assert_eq!(result, Err(CropError::NoActiveEditor));
        assert!(transport.posts.borrow().is_empty());

        let s = s.borrow();
        assert_eq!(s.host().diagnostics(), vec!["Cropper not initialized"]);
        assert_eq!(s.host().alerts(), vec!["Cropper not initialized"]);
        assert_eq!(s.host().reloads(), 0);
    }

    #[test]
    fn test_save_while_loading_makes_no_request() {
        let s = RefCell::new(session());
        s.borrow_mut().open_crop("/files/a.jpg", "/a.jpg");
        let transport = MockTransport::answering(r#"{"success": true}"#);

        let result = block_on(save_with(&s, &transport));
        assert_eq!(result, Err(CropError::NoActiveEditor));
        assert!(transport.posts.borrow().is_empty());
        assert_eq!(s.borrow().phase(), SessionPhase::Closed);
    }

    #[test]
    fn test_save_with_broken_canvas_skips_request() {
        let live = Rc::new(Cell::new(0));
        let s = RefCell::new(session());
        {
            let mut s = s.borrow_mut();
            let ticket = s.open_crop("/files/a.jpg", "/a.jpg");
            let mut source = MockSource::new(&live, "a");
            source.broken_canvas = true;
            s.image_loaded(ticket, source).unwrap();
        }

        let transport = MockTransport::answering(r#"{"success": true}"#);
        let result = block_on(save_with(&s, &transport));
        assert!(matches!(result, Err(CropError::EncodingUnavailable(_))));
        assert!(transport.posts.borrow().is_empty());

        let s = s.borrow();
        assert_eq!(s.host().alerts(), vec!["Could not get cropped image data"]);
        assert_eq!(s.host().diagnostics().len(), 1);
        assert!(s.editor().is_none());
        assert_eq!(live.get(), 0);
    }

    // Scenario E
    #[test]
    fn test_overlapping_opens_keep_second_image() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        let first = s.open_crop("/files/one.jpg", "/one.jpg");
        let second = s.open_crop("/files/two.jpg", "/two.jpg");

        assert_eq!(s.image_loaded(first, MockSource::new(&live, "one")), Ok(false));
        assert_eq!(s.image_loaded(second, MockSource::new(&live, "two")), Ok(true));

        assert_eq!(live.get(), 1);
        assert_eq!(s.target_path(), Some("/two.jpg"));
        assert_eq!(s.editor().map(|e| e.name.as_str()), Some("two"));
    }

    #[test]
    fn test_overlapping_opens_loaded_in_reverse_order() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        let first = s.open_crop("/files/one.jpg", "/one.jpg");
        let second = s.open_crop("/files/two.jpg", "/two.jpg");

        assert_eq!(s.image_loaded(second, MockSource::new(&live, "two")), Ok(true));
        assert_eq!(s.image_loaded(first, MockSource::new(&live, "one")), Ok(false));

        assert_eq!(live.get(), 1);
        assert_eq!(s.editor().map(|e| e.name.as_str()), Some("two"));
    }

    #[test]
    fn test_duplicate_load_event_is_ignored() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        let ticket = s.open_crop("/files/a.jpg", "/a.jpg");
        assert_eq!(s.image_loaded(ticket, MockSource::new(&live, "a")), Ok(true));
        assert_eq!(s.image_loaded(ticket, MockSource::new(&live, "a")), Ok(false));
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn test_image_failed_reports_and_closes() {
        let mut s = session();
        let ticket = s.open_crop("/files/gone.jpg", "/gone.jpg");
        s.image_failed(ticket, "404");

        assert_eq!(s.phase(), SessionPhase::Closed);
        assert_eq!(s.host().alerts(), vec!["Could not load the image for cropping."]);
        assert!(s.host().diagnostics()[0].contains("404"));
    }

    #[test]
    fn test_stale_image_failure_is_ignored() {
        let mut s = session();
        let stale = s.open_crop("/files/one.jpg", "/one.jpg");
        s.open_crop("/files/two.jpg", "/two.jpg");
        s.image_failed(stale, "404");
        assert_eq!(s.phase(), SessionPhase::Loading);
        assert!(s.host().alerts().is_empty());
    }

    #[test]
    fn test_reload_can_be_disabled() {
        let live = Rc::new(Cell::new(0));
        let mut config = CropConfig::default();
        config.reload_on_success = false;
        let s = RefCell::new(session_with(config));
        open_loaded(&mut s.borrow_mut(), &live, "/a.jpg");

        let transport = MockTransport::answering(r#"{"success": true}"#);
        assert_eq!(block_on(save_with(&s, &transport)), Ok(()));
        assert_eq!(s.borrow().host().reloads(), 0);
    }

    #[test]
    fn test_immediate_policy_closes_before_response() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        open_loaded(&mut s, &live, "/a.jpg");

        let pending = s.begin_save().unwrap();
        assert_eq!(s.phase(), SessionPhase::Closed);
        assert_eq!(live.get(), 0);
        assert_eq!(pending.request.image_path, "/a.jpg");

        s.complete_save(pending, Ok(SaveResponse { success: true, error: None }))
            .unwrap();
        assert_eq!(s.host().reloads(), 1);
    }

    #[test]
    fn test_after_response_policy_keeps_dialog_until_outcome() {
        let live = Rc::new(Cell::new(0));
        let mut config = CropConfig::default();
        config.close_policy = ClosePolicy::AfterResponse;
        let mut s = session_with(config);
        open_loaded(&mut s, &live, "/a.jpg");

        let pending = s.begin_save().unwrap();
        assert_eq!(s.phase(), SessionPhase::Saving);
        assert_eq!(live.get(), 1);

        // A second confirm while saving is refused
        assert_eq!(s.begin_save(), Err(CropError::SaveInFlight));
        assert_eq!(s.phase(), SessionPhase::Saving);

        let result = s.complete_save(pending, Err(TransportError::new("offline")));
        assert!(result.is_err());
        assert_eq!(s.phase(), SessionPhase::Closed);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_saving_editor_is_read_only_and_keeps_path() {
        let live = Rc::new(Cell::new(0));
        let mut config = CropConfig::default();
        config.close_policy = ClosePolicy::AfterResponse;
        let mut s = session_with(config);
        open_loaded(&mut s, &live, "/a.jpg");

        let pending = s.begin_save().unwrap();
        assert_eq!(s.phase(), SessionPhase::Saving);
        assert!(s.editor().is_some());
        assert!(s.editor_mut().is_none());
        assert_eq!(s.target_path(), Some("/a.jpg"));
        assert!(s.cropped_image_data().is_some());

        s.complete_save(pending, Ok(SaveResponse { success: true, error: None }))
            .unwrap();
        assert_eq!(s.target_path(), None);
        assert!(s.editor().is_none());
    }

    #[test]
    fn test_after_response_does_not_close_reopened_dialog() {
        let live = Rc::new(Cell::new(0));
        let mut config = CropConfig::default();
        config.close_policy = ClosePolicy::AfterResponse;
        let mut s = session_with(config);
        open_loaded(&mut s, &live, "/a.jpg");

        let pending = s.begin_save().unwrap();
        open_loaded(&mut s, &live, "/b.jpg");
        assert_eq!(live.get(), 1);

        s.complete_save(pending, Ok(SaveResponse { success: true, error: None }))
            .unwrap();
        assert_eq!(s.phase(), SessionPhase::Editing);
        assert_eq!(s.target_path(), Some("/b.jpg"));
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn test_editor_mut_only_while_editing() {
        let live = Rc::new(Cell::new(0));
        let mut s = session();
        assert!(s.editor_mut().is_none());
        open_loaded(&mut s, &live, "/a.jpg");
        assert!(s.editor_mut().is_some());
    }

    #[test]
    fn test_image_editor_end_to_end() {
        let s = RefCell::new(
            CropSession::<ImageEditor, _>::new(CropConfig::default(), RecordingHost::default()).unwrap(),
        );
        let ticket = s.borrow_mut().open_crop("/files/big.png", "/big.png");
        let source = RgbaImage::from_pixel(1500, 750, image::Rgba([0, 0, 255, 0]));
        assert_eq!(s.borrow_mut().image_loaded(ticket, source), Ok(true));

        let transport = MockTransport::answering(r#"{"success": true}"#);
        assert_eq!(block_on(save_with(&s, &transport)), Ok(()));

        let posts = transport.posts.borrow();
        let body: SaveRequest = serde_json::from_str(&posts[0].1).unwrap();
        let payload = body.image_data.strip_prefix("data:image/png;base64,").unwrap();
        use base64::Engine as _;
        let png = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();

        // 1200x600 crop box fitted into 800x800, transparency flattened to white
        assert_eq!(decoded.dimensions(), (800, 400));
        assert_eq!(decoded.get_pixel(10, 10).0, [255, 255, 255]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
