//! Poll transport: fetch the status endpoint on a fixed cadence.
//!
//! Fetches run strictly one after another inside a single task, so two fetches
//! for the same job never overlap. The loop ends on its own after a terminal
//! snapshot and otherwise retries indefinitely until stopped.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenProvider;
use crate::endpoint::Endpoints;
use crate::retry::PollCadence;
use crate::snapshot::{parse_frame, StatusSnapshot};

use super::{EventSink, TaskSlot, Transport, TransportError, TransportEvent};

pub struct PollTransport {
    client: reqwest::Client,
    endpoints: Endpoints,
    credentials: Arc<dyn TokenProvider>,
    cadence: PollCadence,
    request_timeout: Duration,
    task: TaskSlot,
}

impl PollTransport {
    pub fn new(
        client: reqwest::Client,
        endpoints: Endpoints,
        credentials: Arc<dyn TokenProvider>,
        cadence: PollCadence,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoints,
            credentials,
            cadence,
            request_timeout,
            task: TaskSlot::default(),
        }
    }
}

impl Transport for PollTransport {
    fn start(&mut self, job_id: &str, sink: EventSink) {
        let fetcher = StatusFetcher {
            client: self.client.clone(),
            endpoints: self.endpoints.clone(),
            credentials: Arc::clone(&self.credentials),
            request_timeout: self.request_timeout,
        };
        let job_id = job_id.to_string();
        let cadence = self.cadence;
        tracing::debug!(job_id = %job_id, "starting status polling");
        self.task
            .replace(tokio::spawn(poll_loop(fetcher, job_id, cadence, sink)));
    }

    fn stop(&mut self) {
        self.task.clear();
    }

    fn is_active(&self) -> bool {
        self.task.is_live()
    }
}

async fn poll_loop(fetcher: StatusFetcher, job_id: String, cadence: PollCadence, sink: EventSink) {
    loop {
        let failed = match fetcher.fetch(&job_id).await {
            Ok(snapshot) => {
                let terminal = snapshot.is_terminal();
                if !sink.send(TransportEvent::Snapshot(snapshot)) || terminal {
                    return;
                }
                false
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "status poll failed");
                if !sink.send(TransportEvent::Failed(err)) {
                    return;
                }
                true
            }
        };
        tokio::time::sleep(cadence.next_delay(failed)).await;
    }
}

/// One-shot status fetch against the poll endpoint.
#[derive(Clone)]
pub struct StatusFetcher {
    pub client: reqwest::Client,
    pub endpoints: Endpoints,
    pub credentials: Arc<dyn TokenProvider>,
    pub request_timeout: Duration,
}

impl StatusFetcher {
    /// Perform a single fetch. The bearer header is sent only when a token exists.
    pub async fn fetch(&self, job_id: &str) -> Result<StatusSnapshot, TransportError> {
        let url = self.endpoints.status_url(job_id)?;
        let mut request = self.client.get(url).timeout(self.request_timeout);
        if let Some(token) = self.credentials.current_token() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let (_, snapshot) = parse_frame(&body)?;
        Ok(snapshot)
    }
}
