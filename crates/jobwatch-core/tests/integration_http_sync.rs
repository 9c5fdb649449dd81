//! End-to-end sync sessions against a local HTTP status server.

mod common;

use common::status_server::{self, frame, StreamSession};
use jobwatch_core::auth::StaticToken;
use jobwatch_core::config::SyncConfig;
use jobwatch_core::endpoint::Endpoints;
use jobwatch_core::transport::{http_client, HttpTimeouts, Transports};
use jobwatch_core::{spawn, JobStatus, JobUpdate, Outcome, SyncHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Short intervals; no animation and no simulated ticks so updates are exact.
fn fast_config() -> SyncConfig {
    SyncConfig {
        reconnect_base_ms: 10,
        poll_interval_ms: 20,
        poll_error_interval_ms: 20,
        animation_threshold: 100.0,
        staleness_window_ms: 60_000,
        ..SyncConfig::default()
    }
}

fn start(
    server: &status_server::StatusServer,
    token: Option<&str>,
) -> (SyncHandle, mpsc::UnboundedReceiver<JobUpdate>) {
    start_with_idle(server, token, Duration::from_secs(5))
}

fn start_with_idle(
    server: &status_server::StatusServer,
    token: Option<&str>,
    stream_idle: Duration,
) -> (SyncHandle, mpsc::UnboundedReceiver<JobUpdate>) {
    let config = fast_config();
    let client = http_client(Duration::from_secs(2)).unwrap();
    let endpoints = Endpoints::new(&server.base_url).unwrap();
    let credentials = Arc::new(StaticToken::new(token.map(str::to_string)));
    let transports = Transports::http(
        client,
        endpoints,
        credentials.clone(),
        HttpTimeouts {
            request: Duration::from_secs(2),
            stream_idle,
        },
        config.poll_cadence(),
    );
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = spawn("job-1", config, credentials, transports, tx).unwrap();
    (handle, rx)
}

async fn finish(handle: SyncHandle) -> Outcome {
    tokio::time::timeout(Duration::from_secs(10), handle.join())
        .await
        .expect("session did not end in time")
        .expect("driver task panicked")
}

fn drain(rx: &mut mpsc::UnboundedReceiver<JobUpdate>) -> Vec<JobUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

fn progress_values(updates: &[JobUpdate]) -> Vec<f64> {
    updates
        .iter()
        .filter_map(|u| match u {
            JobUpdate::Progress(state) => Some(state.displayed_progress),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn poll_only_session_reaches_completion() {
    let server = status_server::start(
        vec![
            (200, frame("processing", 10)),
            (200, frame("processing", 15)),
            (
                200,
                r#"{"status":"completed","progress_percentage":100,"property_id":7}"#.to_string(),
            ),
        ],
        vec![],
    );
    let (handle, mut rx) = start(&server, None);

    let outcome = finish(handle).await;
    assert_eq!(
        outcome,
        Outcome::Completed {
            result_id: Some("7".into())
        }
    );

    let updates = drain(&mut rx);
    assert_eq!(progress_values(&updates), vec![10.0, 15.0, 100.0]);
    assert!(matches!(
        updates.last(),
        Some(JobUpdate::Completed { result_id: Some(id), snapshot }) if id == "7" && snapshot.status == JobStatus::Completed
    ));
    assert_eq!(server.stream_hits(), 0);
    assert_eq!(server.poll_hits(), 3);
    assert!(server.poll_auth().iter().all(Option::is_none));
}

#[tokio::test]
async fn poll_errors_are_retried_until_failure_is_reported() {
    let server = status_server::start(
        vec![
            (500, String::new()),
            (200, frame("processing", 20)),
            (
                200,
                r#"{"status":"failed","progress_percentage":20,"error_message":"bad url"}"#.to_string(),
            ),
        ],
        vec![],
    );
    let (handle, mut rx) = start(&server, None);

    let outcome = finish(handle).await;
    assert_eq!(
        outcome,
        Outcome::Failed {
            message: "bad url".into()
        }
    );
    let updates = drain(&mut rx);
    assert_eq!(
        updates.iter().filter(|u| matches!(u, JobUpdate::Failed(_))).count(),
        1
    );
    assert_eq!(server.poll_hits(), 3);
}

#[tokio::test]
async fn stream_delivers_snapshots_until_job_finished() {
    let server = status_server::start(
        vec![],
        vec![StreamSession::Frames {
            payloads: vec![
                frame("processing", 30),
                "not json".to_string(),
                r#"{"type":"job_finished","status":"completed","progress_percentage":100,"property_id":"p-9"}"#
                    .to_string(),
            ],
            hold_open: false,
        }],
    );
    let (handle, mut rx) = start(&server, Some("secret"));

    let outcome = finish(handle).await;
    assert_eq!(
        outcome,
        Outcome::Completed {
            result_id: Some("p-9".into())
        }
    );
    assert_eq!(progress_values(&drain(&mut rx)), vec![30.0, 100.0]);
    assert_eq!(server.poll_hits(), 0);
    assert_eq!(
        server.stream_targets(),
        vec!["/api/import-jobs/job-1/stream?token=secret".to_string()]
    );
}

#[tokio::test]
async fn rejected_streams_fall_back_to_polling() {
    let server = status_server::start(
        vec![(
            200,
            r#"{"status":"completed","progress_percentage":100,"property_id":3}"#.to_string(),
        )],
        vec![
            StreamSession::Reject(502),
            StreamSession::Reject(502),
            StreamSession::Reject(502),
        ],
    );
    let (handle, _rx) = start(&server, Some("secret"));

    let outcome = finish(handle).await;
    assert_eq!(
        outcome,
        Outcome::Completed {
            result_id: Some("3".into())
        }
    );
    assert_eq!(server.stream_hits(), 3);
    assert_eq!(server.poll_hits(), 1);
    assert_eq!(server.poll_auth(), vec![Some("Bearer secret".to_string())]);
}

#[tokio::test]
async fn stream_closed_without_job_finished_is_reopened() {
    let server = status_server::start(
        vec![],
        vec![
            StreamSession::Frames {
                payloads: vec![frame("processing", 20)],
                hold_open: false,
            },
            StreamSession::Frames {
                payloads: vec![
                    frame("processing", 50),
                    r#"{"type":"job_finished","status":"completed","progress_percentage":100}"#.to_string(),
                ],
                hold_open: false,
            },
        ],
    );
    let (handle, mut rx) = start(&server, Some("secret"));

    let outcome = finish(handle).await;
    assert_eq!(outcome, Outcome::Completed { result_id: None });
    assert_eq!(server.stream_hits(), 2);
    assert_eq!(server.poll_hits(), 0);
    assert_eq!(progress_values(&drain(&mut rx)), vec![20.0, 50.0, 100.0]);
}

#[tokio::test]
async fn silent_stream_is_dropped_and_reopened() {
    let server = status_server::start(
        vec![],
        vec![
            StreamSession::Frames {
                payloads: vec![frame("processing", 25)],
                hold_open: true,
            },
            StreamSession::Frames {
                payloads: vec![
                    r#"{"type":"job_finished","status":"completed","progress_percentage":100,"property_id":11}"#
                        .to_string(),
                ],
                hold_open: false,
            },
        ],
    );
    let (handle, mut rx) = start_with_idle(&server, Some("secret"), Duration::from_millis(200));

    let outcome = finish(handle).await;
    assert_eq!(
        outcome,
        Outcome::Completed {
            result_id: Some("11".into())
        }
    );
    assert_eq!(server.stream_hits(), 2);
    assert_eq!(server.poll_hits(), 0);
    assert_eq!(progress_values(&drain(&mut rx)), vec![25.0, 100.0]);
}

#[tokio::test]
async fn stop_closes_the_stream_and_silences_updates() {
    let server = status_server::start(
        vec![],
        vec![StreamSession::Frames {
            payloads: vec![frame("processing", 40)],
            hold_open: true,
        }],
    );
    let (handle, mut rx) = start(&server, Some("secret"));

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no update in time");
    assert!(matches!(first, Some(JobUpdate::Progress(ref s)) if s.displayed_progress == 40.0));

    handle.stop();
    assert_eq!(finish(handle).await, Outcome::Stopped);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(drain(&mut rx).is_empty());
    assert_eq!(server.stream_hits(), 1);
    assert_eq!(server.poll_hits(), 0);
}
