//! Synchronization controller: the single authority over displayed progress.
//!
//! The controller picks the active transport, arbitrates the animator and the
//! staleness simulator against real snapshots, and fires the terminal
//! callback exactly once. All of its methods are synchronous and take the
//! current time; [`spawn`] runs it on one task so every event, timer and
//! command is processed to completion before the next one.

mod run;
mod state;
mod timers;


pub use run::{spawn, SyncControls, SyncHandle};
pub use state::{SyncState, TransportMode, TransportState};

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::animator::Animation;
use crate::auth::TokenProvider;
use crate::config::SyncConfig;
use crate::display::DisplayState;
use crate::observer::{JobObserver, Outcome};
use crate::retry::{classify, FailureKind, ReconnectDecision, ReconnectPolicy};
use crate::simulator::{SimulatorTick, StalenessSimulator};
use crate::snapshot::{JobStatus, StatusSnapshot};
use crate::transport::{Envelope, EventSink, TransportError, TransportEvent, TransportKind, Transports};

use self::timers::{TimerSlot, TimerSlots};

/// Message passed to `on_error` when a failed job carries no message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Import failed";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("job id must not be empty")]
    EmptyJobId,
}

pub struct SyncController<O: JobObserver> {
    job_id: String,
    config: SyncConfig,
    policy: ReconnectPolicy,
    simulator: StalenessSimulator,
    credentials: Arc<dyn TokenProvider>,
    transports: Transports,
    events_tx: mpsc::UnboundedSender<Envelope>,
    observer: O,

    display: DisplayState,
    state: SyncState,
    transport: TransportState,
    timers: TimerSlots,
    animation: Option<Animation>,
    /// When and at what value the last real snapshot was merged.
    last_real: Option<(Instant, f64)>,
    /// When the last animation put its final frame on screen.
    animation_ended_at: Option<Instant>,

    // Generation of the currently running transport of each kind; 0 = none.
    stream_epoch: u64,
    poll_epoch: u64,
    next_epoch: u64,

    outcome: Option<Outcome>,
    stopped: bool,
}

impl<O: JobObserver> SyncController<O> {
    pub(crate) fn new(
        job_id: String,
        config: SyncConfig,
        credentials: Arc<dyn TokenProvider>,
        transports: Transports,
        observer: O,
        events_tx: mpsc::UnboundedSender<Envelope>,
    ) -> Result<Self, StartError> {
        if job_id.trim().is_empty() {
            return Err(StartError::EmptyJobId);
        }
        Ok(Self {
            job_id,
            policy: config.reconnect_policy(),
            simulator: config.simulator(),
            config,
            credentials,
            transports,
            events_tx,
            observer,
            display: DisplayState::default(),
            state: SyncState::Connecting,
            transport: TransportState::default(),
            timers: TimerSlots::default(),
            animation: None,
            last_real: None,
            animation_ended_at: None,
            stream_epoch: 0,
            poll_epoch: 0,
            next_epoch: 0,
            outcome: None,
            stopped: false,
        })
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// True while any timer slot is armed.
    pub fn has_pending_timers(&self) -> bool {
        !self.timers.is_idle()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Open the first transport: the stream when enabled and a credential
    /// exists, polling otherwise.
    pub fn start(&mut self) {
        tracing::info!(job_id = %self.job_id, "tracking import job");
        if !self.config.stream_enabled {
            self.enter_polling("streaming disabled");
        } else if self.credentials.current_token().is_none() {
            self.enter_polling("no access credential");
        } else {
            self.open_stream();
        }
    }

    /// Route one transport event. Events from a transport run that has since
    /// been stopped are dropped.
    pub fn handle(&mut self, envelope: Envelope, now: Instant) {
        if self.stopped {
            return;
        }
        let current = match envelope.kind {
            TransportKind::Stream => self.stream_epoch,
            TransportKind::Poll => self.poll_epoch,
        };
        if current == 0 || envelope.epoch != current {
            tracing::debug!(
                job_id = %self.job_id,
                kind = %envelope.kind,
                epoch = envelope.epoch,
                "dropping event from stopped transport"
            );
            return;
        }

        match (envelope.kind, envelope.event) {
            (_, TransportEvent::Snapshot(snapshot)) => self.on_snapshot(snapshot, now),
            (TransportKind::Stream, TransportEvent::Opened) => {
                self.transport.consecutive_stream_failures = 0;
                self.state = SyncState::Streaming;
                tracing::debug!(job_id = %self.job_id, "status stream open");
            }
            (TransportKind::Stream, TransportEvent::Finished) => self.on_stream_finished(),
            (TransportKind::Stream, TransportEvent::Failed(err)) => self.on_stream_failure(err, now),
            (TransportKind::Poll, TransportEvent::Failed(err)) => {
                // The poll transport reschedules itself at the error cadence.
                tracing::debug!(job_id = %self.job_id, error = %err, "poll failed, staying on polling");
            }
            (TransportKind::Poll, TransportEvent::Opened | TransportEvent::Finished) => {}
        }
    }

    /// Merge a real snapshot into the display.
    pub fn on_snapshot(&mut self, snapshot: StatusSnapshot, now: Instant) {
        if self.stopped {
            return;
        }
        self.timers.disarm(TimerSlot::Simulator);
        self.cancel_animation();

        let target = snapshot.progress_percentage;
        let current = self.display.displayed_progress;
        let delta = target - current;
        // A real value below what is shown but not below the previous real value
        // only means simulated progress ran ahead; hold instead of regressing.
        let simulated_ahead = delta < 0.0 && self.last_real.is_some_and(|(_, last)| target >= last);
        if snapshot.is_terminal() {
            self.display.set_progress(target);
        } else if delta > self.config.animation_threshold {
            let animation = Animation::plan(
                current,
                target,
                self.config.animation_duration(),
                self.config.animation_steps,
            );
            tracing::debug!(job_id = %self.job_id, from = current, to = target, "animating progress jump");
            self.timers.arm(TimerSlot::Animation, now + animation.interval());
            self.animation = Some(animation);
        } else if !simulated_ahead {
            self.display.set_progress(target);
        }
        self.last_real = Some((now, target));

        self.display.merge_fields(&snapshot);
        self.observer.on_progress(&self.display);

        match snapshot.status {
            JobStatus::Completed | JobStatus::Failed => self.finish(&snapshot),
            JobStatus::Processing => {
                self.timers
                    .arm(TimerSlot::Simulator, now + self.simulator.window);
            }
            _ => {}
        }
    }

    /// Run every timer slot whose deadline is at or before `now`.
    pub fn fire_due(&mut self, now: Instant) {
        if self.stopped {
            return;
        }
        let animated = match self.timers.take_due(TimerSlot::Animation, now) {
            Some(deadline) => {
                self.animation_tick(deadline);
                true
            }
            None => false,
        };
        if self.timers.take_due(TimerSlot::Reconnect, now).is_some() {
            self.reconnect();
        }
        if let Some(deadline) = self.timers.take_due(TimerSlot::Simulator, now) {
            self.simulator_tick(deadline, now, animated);
        }
    }

    /// Caller-requested cancellation: notify once, then tear down.
    pub fn cancel(&mut self) {
        if self.stopped {
            return;
        }
        tracing::info!(job_id = %self.job_id, "tracking cancelled by caller");
        self.observer.on_cancel();
        self.outcome = Some(Outcome::Cancelled);
        self.stop();
    }

    /// Tear down animation, simulator, reconnect timer and both transports.
    /// Safe to call any number of times.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.animation = None;
        self.timers.clear();
        self.transports.stream.stop();
        self.transports.poll.stop();
        self.stream_epoch = 0;
        self.poll_epoch = 0;
        if self.outcome.is_none() {
            self.outcome = Some(Outcome::Stopped);
        }
        tracing::debug!(job_id = %self.job_id, state = %self.state, "controller stopped");
    }

    pub(crate) fn into_outcome(self) -> Outcome {
        self.outcome.clone().unwrap_or(Outcome::Stopped)
    }

    fn finish(&mut self, snapshot: &StatusSnapshot) {
        self.state = SyncState::Terminal;
        match snapshot.status {
            JobStatus::Completed => {
                tracing::info!(job_id = %self.job_id, result_id = ?snapshot.result_id, "import completed");
                self.observer
                    .on_complete(snapshot.result_id.as_deref(), snapshot);
                self.outcome = Some(Outcome::Completed {
                    result_id: snapshot.result_id.clone(),
                });
            }
            _ => {
                let message = snapshot
                    .error_message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                tracing::info!(job_id = %self.job_id, error = %message, "import failed");
                self.observer.on_error(&message);
                self.outcome = Some(Outcome::Failed { message });
            }
        }
        self.stop();
    }

    fn cancel_animation(&mut self) {
        if self.animation.take().is_some() {
            self.timers.disarm(TimerSlot::Animation);
        }
    }

    fn animation_tick(&mut self, deadline: Instant) {
        let Some(animation) = self.animation.as_mut() else {
            return;
        };
        if let Some(value) = animation.next_frame() {
            self.display.set_progress(value);
        }
        if animation.is_finished() {
            tracing::debug!(job_id = %self.job_id, target = animation.target(), "animation finished");
            self.animation = None;
            self.animation_ended_at = Some(deadline);
        } else {
            let next = deadline + animation.interval();
            self.timers.arm(TimerSlot::Animation, next);
        }
        self.observer.on_progress(&self.display);
    }

    /// `animated` is true when an animation frame was applied on this same tick.
    fn simulator_tick(&mut self, deadline: Instant, now: Instant, animated: bool) {
        let animating = animated || self.animation.is_some();
        match self.simulator.tick(&self.display, self.quiet_since(), animating, now) {
            SimulatorTick::Advance(value) => {
                self.display.set_progress(value);
                self.observer.on_progress(&self.display);
                self.timers
                    .arm(TimerSlot::Simulator, deadline + self.simulator.interval);
            }
            SimulatorTick::Skip => {
                self.timers
                    .arm(TimerSlot::Simulator, deadline + self.simulator.interval);
            }
            SimulatorTick::Stop => {}
        }
    }

    /// Later of the last real snapshot and the end of the last animation.
    fn quiet_since(&self) -> Option<Instant> {
        let real = self.last_real.map(|(at, _)| at);
        match (real, self.animation_ended_at) {
            (Some(real), Some(ended)) => Some(real.max(ended)),
            (real, ended) => real.or(ended),
        }
    }

    fn open_stream(&mut self) {
        self.state = SyncState::Connecting;
        self.stream_epoch = self.bump_epoch();
        let sink = EventSink::new(TransportKind::Stream, self.stream_epoch, self.events_tx.clone());
        tracing::debug!(job_id = %self.job_id, epoch = self.stream_epoch, "opening status stream");
        self.transports.stream.start(&self.job_id, sink);
    }

    fn close_stream(&mut self) {
        self.transports.stream.stop();
        self.stream_epoch = 0;
    }

    fn reconnect(&mut self) {
        if self.transport.mode != TransportMode::Stream || self.state != SyncState::Degraded {
            return;
        }
        self.open_stream();
    }

    fn on_stream_failure(&mut self, err: TransportError, now: Instant) {
        if classify(&err) == FailureKind::Malformed {
            tracing::warn!(job_id = %self.job_id, error = %err, "ignoring malformed stream message");
            return;
        }
        self.close_stream();
        self.transport.consecutive_stream_failures += 1;
        let failures = self.transport.consecutive_stream_failures;
        match self.policy.decide(failures) {
            ReconnectDecision::RetryAfter(delay) => {
                tracing::warn!(
                    job_id = %self.job_id,
                    failures,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "status stream failed, reconnecting"
                );
                self.state = SyncState::Degraded;
                self.timers.arm(TimerSlot::Reconnect, now + delay);
            }
            ReconnectDecision::FallBackToPolling => {
                self.enter_polling("stream failure threshold reached");
            }
        }
    }

    fn on_stream_finished(&mut self) {
        self.close_stream();
        // A terminal snapshot would already have stopped the controller.
        self.enter_polling("stream finished without a terminal status");
    }

    fn enter_polling(&mut self, reason: &str) {
        self.close_stream();
        self.timers.disarm(TimerSlot::Reconnect);
        self.transport.mode = TransportMode::Polling;
        self.state = SyncState::Polling;
        self.poll_epoch = self.bump_epoch();
        tracing::info!(
            job_id = %self.job_id,
            failures = self.transport.consecutive_stream_failures,
            reason,
            "switching to status polling"
        );
        let sink = EventSink::new(TransportKind::Poll, self.poll_epoch, self.events_tx.clone());
        self.transports.poll.start(&self.job_id, sink);
    }

    fn bump_epoch(&mut self) -> u64 {
        self.next_epoch += 1;
        self.next_epoch
    }
}
