//! Status transports: the push stream and the poll fallback.
//!
//! Both implement [`Transport`]; the controller depends only on that trait so
//! either side can be replaced by a scripted fake in tests. Transports never
//! touch the display: they emit [`TransportEvent`]s through an [`EventSink`].

mod error;
pub mod poll;
pub mod stream;

pub use error::TransportError;
pub use poll::PollTransport;
pub use stream::StreamTransport;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::auth::TokenProvider;
use crate::endpoint::Endpoints;
use crate::retry::PollCadence;
use crate::snapshot::StatusSnapshot;

/// Which transport produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Stream,
    Poll,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stream => f.write_str("stream"),
            TransportKind::Poll => f.write_str("poll"),
        }
    }
}

/// Something a transport observed.
#[derive(Debug)]
pub enum TransportEvent {
    /// Stream connection established.
    Opened,
    /// A parsed status observation.
    Snapshot(StatusSnapshot),
    /// Stream received its `job_finished` frame and closed itself.
    Finished,
    /// Connection-level failure (stream) or a failed fetch (poll).
    Failed(TransportError),
}

/// Event tagged with its source and the start generation it belongs to.
#[derive(Debug)]
pub struct Envelope {
    pub kind: TransportKind,
    pub epoch: u64,
    pub event: TransportEvent,
}

/// Channel handle given to a transport on `start`.
#[derive(Debug, Clone)]
pub struct EventSink {
    kind: TransportKind,
    epoch: u64,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventSink {
    pub fn new(kind: TransportKind, epoch: u64, tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { kind, epoch, tx }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns false once the controller is gone; transports should then exit.
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx
            .send(Envelope {
                kind: self.kind,
                epoch: self.epoch,
                event,
            })
            .is_ok()
    }
}

/// A source of status snapshots for one job.
pub trait Transport: Send {
    /// Begin delivering events for `job_id`. Any previous run is stopped first.
    fn start(&mut self, job_id: &str, sink: EventSink);

    /// Close the connection or cancel the pending fetch. Idempotent.
    fn stop(&mut self);

    /// True while a connection or fetch loop is live.
    fn is_active(&self) -> bool;
}

/// The pair of transports a controller arbitrates between.
pub struct Transports {
    pub stream: Box<dyn Transport>,
    pub poll: Box<dyn Transport>,
}

impl Transports {
    pub fn new(stream: impl Transport + 'static, poll: impl Transport + 'static) -> Self {
        Self {
            stream: Box::new(stream),
            poll: Box::new(poll),
        }
    }

    /// HTTP stream and poll transports sharing one client and credential source.
    pub fn http(
        client: reqwest::Client,
        endpoints: Endpoints,
        credentials: Arc<dyn TokenProvider>,
        timeouts: HttpTimeouts,
        cadence: PollCadence,
    ) -> Self {
        Self::new(
            StreamTransport::new(
                client.clone(),
                endpoints.clone(),
                Arc::clone(&credentials),
                timeouts.stream_idle,
            ),
            PollTransport::new(client, endpoints, credentials, cadence, timeouts.request),
        )
    }
}

/// Per-transport time limits.
#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    /// Whole-request limit for one status poll.
    pub request: Duration,
    /// Longest silence tolerated on an open stream.
    pub stream_idle: Duration,
}

/// Shared HTTP client. No overall timeout: the stream connection is long-lived.
pub fn http_client(connect_timeout: Duration) -> Result<reqwest::Client, TransportError> {
    Ok(reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!("jobwatch/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Owned background task that is aborted when stopped or dropped.
#[derive(Debug, Default)]
pub(crate) struct TaskSlot {
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TaskSlot {
    pub(crate) fn replace(&mut self, handle: tokio::task::JoinHandle<()>) {
        self.clear();
        self.handle = Some(handle);
    }

    pub(crate) fn clear(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.clear();
    }
}
