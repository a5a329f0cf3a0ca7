//! The daemon loop.
//!
//! The daemon is either idle or running one [`Session`]:
//!
//! ```text
//!            session_started
//!   Idle  ─────────────────────▶  Active ──┐ file
//!    ▲                              │  ◀───┘
//!    └──────────────────────────────┘
//!            session_finished
//! ```
//!
//! Requests are handled strictly one at a time, in the order they arrive.
//! Anything sent in the wrong state is answered with
//! [`Response::Rejected`] and otherwise ignored.

use crate::error::{Error, ErrorKind};
use crate::message::{FileRequest, Request, Response, SessionResult, SessionStarted};
use crate::service::{MetadataLoader, ThumbnailService};
use crate::session::Session;
use async_stream::stream;
use ferry_naming::MetadataBundle;
use ferry_storage::BackendHandle;
use futures::{Stream, StreamExt};
use std::ops::Deref;
use std::sync::Arc;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::instrument;

/// Source of the current (local, wall-clock) time.
pub type Clock = Arc<dyn Fn() -> PrimitiveDateTime + Send + Sync>;

/// The local time, or UTC if the local offset cannot be determined.
pub fn local_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PrimitiveDateTime::new(now.date(), now.time())
}

enum State {
    Idle,
    Active(Box<Session>),
}

/// Whether the daemon should keep reading requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Terminate,
}

pub struct Daemon {
    backend: BackendHandle,
    metadata: Option<Arc<dyn MetadataLoader>>,
    thumbnails: Option<Arc<dyn ThumbnailService>>,
    clock: Clock,
    state: State,
}

impl Daemon {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            backend,
            metadata: None,
            thumbnails: None,
            clock: Arc::new(local_now),
            state: State::Idle,
        }
    }

    pub fn with_metadata_loader(mut self, loader: Arc<dyn MetadataLoader>) -> Self {
        self.metadata = Some(loader);
        self
    }

    pub fn with_thumbnail_service(mut self, service: Arc<dyn ThumbnailService>) -> Self {
        self.thumbnails = Some(service);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// Handles one request. `Terminate` produces no response of its own,
    /// only the results of a session it had to close.
    #[instrument(skip_all)]
    pub async fn handle(&mut self, request: Request) -> (Vec<Response>, Control) {
        match request {
            Request::SessionStarted(start) => (self.start(&start).into_iter().collect(), Control::Continue),
            Request::File(file) => (vec![self.file(&file).await], Control::Continue),
            Request::SessionFinished => (vec![self.finish()], Control::Continue),
            Request::Terminate => {
                let responses = match self.take_session() {
                    Some(result) => {
                        tracing::warn!("Terminated during a session; counters flushed early");
                        vec![Response::Session(result)]
                    },
                    None => vec![],
                };
                tracing::info!("Terminating");
                (responses, Control::Terminate)
            },
        }
    }

    /// Starting a session has no response unless it is rejected.
    fn start(&mut self, start: &SessionStarted) -> Option<Response> {
        if self.is_active() {
            return Some(rejected("a session is already active"));
        }
        let session = Session::start(start, self.backend.clone(), (self.clock)());
        tracing::info!(
            downloads_today = session.sequences().downloads_today().count,
            stored_sequence_no = session.sequences().stored_sequence_no(),
            "Session started"
        );
        self.state = State::Active(Box::new(session));
        None
    }

    async fn file(&mut self, file: &FileRequest) -> Response {
        let download_time = (self.clock)();
        let metadata = self.metadata_for(file).await;
        let State::Active(session) = &mut self.state else {
            return rejected("file request outside of a session");
        };
        let result = session.process(file, metadata.as_ref(), download_time).await;
        if let (Some(thumbnails), Some(path)) = (&self.thumbnails, &result.destination_path) {
            if let Err(e) = thumbnails.placed(path, file.kind).await {
                tracing::warn!(path = %path.display(), error = %e.deref(), "Thumbnail service failed");
            }
        }
        Response::File(result)
    }

    fn finish(&mut self) -> Response {
        match self.take_session() {
            Some(result) => Response::Session(result),
            None => rejected("no active session to finish"),
        }
    }

    fn take_session(&mut self) -> Option<SessionResult> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Active(session) => {
                let result = session.finish();
                tracing::info!(
                    placed = result.placed,
                    failed = result.failed,
                    downloads_today = result.downloads_today.count,
                    stored_sequence_no = result.stored_sequence_no,
                    "Session finished"
                );
                Some(result)
            },
            State::Idle => None,
        }
    }

    /// Inline metadata wins; otherwise the loader is asked. `None` when
    /// neither produces anything.
    async fn metadata_for(&self, file: &FileRequest) -> Option<MetadataBundle> {
        if let Some(metadata) = &file.metadata {
            return Some(metadata.clone());
        }
        if !file.download_succeeded || !self.is_active() {
            return None;
        }
        let loader = self.metadata.as_ref()?;
        match loader.load(&file.source, file.kind).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!(source = %file.source_name, error = %e.deref(), "Could not load metadata");
                None
            },
        }
    }
}

fn rejected(reason: &str) -> Response {
    tracing::warn!(reason, "Request rejected");
    Response::Rejected { reason: reason.to_string() }
}

/// Runs the daemon over a stream of requests, yielding every response.
///
/// Items that failed to parse are answered with [`Response::Rejected`] and
/// the loop carries on. The stream ends when `requests` does, or after a
/// `terminate` request.
pub fn serve<'a, S>(daemon: &'a mut Daemon, requests: S) -> impl Stream<Item = Response> + 'a
where
    S: Stream<Item = Result<Request, Error>> + 'a,
{
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let mut requests = std::pin::pin!(requests);
        while let Some(request) = requests.next().await {
            let request = match request {
                Ok(request) => request,
                Err(e) => {
                    let reason = match e.deref() {
                        ErrorKind::Protocol(reason) => reason.clone(),
                        other => other.to_string(),
                    };
                    yield rejected(&reason);
                    continue;
                },
            };
            let (responses, control) = daemon.handle(request).await;
            for response in responses {
                yield response;
            }
            if control == Control::Terminate {
                return;
            }
        }
    })
}
