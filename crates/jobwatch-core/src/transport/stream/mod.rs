//! Push transport over server-sent events.
//!
//! Opens one long-lived connection per start, converts each `data` payload
//! into a snapshot and reports connection failures exactly once per run.
//! A connection that goes quiet for longer than the idle timeout is reported
//! as failed. Reconnect policy belongs to the controller; this transport never
//! retries.

mod parse;

pub use parse::SseDecoder;

use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenProvider;
use crate::endpoint::Endpoints;
use crate::snapshot::parse_frame;

use super::{EventSink, TaskSlot, Transport, TransportError, TransportEvent};

pub struct StreamTransport {
    client: reqwest::Client,
    endpoints: Endpoints,
    credentials: Arc<dyn TokenProvider>,
    idle_timeout: Duration,
    task: TaskSlot,
}

impl StreamTransport {
    pub fn new(
        client: reqwest::Client,
        endpoints: Endpoints,
        credentials: Arc<dyn TokenProvider>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoints,
            credentials,
            idle_timeout,
            task: TaskSlot::default(),
        }
    }
}

impl Transport for StreamTransport {
    fn start(&mut self, job_id: &str, sink: EventSink) {
        let client = self.client.clone();
        let endpoints = self.endpoints.clone();
        let credentials = Arc::clone(&self.credentials);
        let job_id = job_id.to_string();
        let idle_timeout = self.idle_timeout;
        self.task.replace(tokio::spawn(async move {
            let session = StreamSession {
                client: &client,
                endpoints: &endpoints,
                credentials: credentials.as_ref(),
                idle_timeout,
            };
            if let Err(err) = session.run(&job_id, &sink).await {
                tracing::warn!(job_id = %job_id, epoch = sink.epoch(), error = %err, "status stream failed");
                sink.send(TransportEvent::Failed(err));
            }
        }));
    }

    fn stop(&mut self) {
        self.task.clear();
    }

    fn is_active(&self) -> bool {
        self.task.is_live()
    }
}

struct StreamSession<'a> {
    client: &'a reqwest::Client,
    endpoints: &'a Endpoints,
    credentials: &'a dyn TokenProvider,
    idle_timeout: Duration,
}

impl StreamSession<'_> {
    /// Runs one stream session. `Ok` means the stream ended with `job_finished`
    /// (or the controller went away); any `Err` is a connection-level failure.
    async fn run(&self, job_id: &str, sink: &EventSink) -> Result<(), TransportError> {
        let token = self
            .credentials
            .current_token()
            .ok_or(TransportError::MissingCredential)?;
        let url = self.endpoints.stream_url(job_id, &token)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        if !sink.send(TransportEvent::Opened) {
            return Ok(());
        }
        self.read_events(response, job_id, sink).await
    }

    async fn read_events(
        &self,
        response: reqwest::Response,
        job_id: &str,
        sink: &EventSink,
    ) -> Result<(), TransportError> {
        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        loop {
            let chunk = match tokio::time::timeout(self.idle_timeout, body.next()).await {
                Ok(Some(chunk)) => chunk?,
                Ok(None) => return Err(TransportError::Closed),
                Err(_) => return Err(TransportError::Idle(self.idle_timeout)),
            };
            for payload in decoder.push(&chunk) {
                let (frame, snapshot) = match parse_frame(&payload) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        tracing::warn!(job_id = %job_id, error = %err, "skipping malformed stream message");
                        continue;
                    }
                };
                if !sink.send(TransportEvent::Snapshot(snapshot)) {
                    return Ok(());
                }
                if frame.is_job_finished() {
                    tracing::debug!(job_id = %job_id, "stream reported job_finished, closing");
                    sink.send(TransportEvent::Finished);
                    return Ok(());
                }
            }
        }
    }
}
