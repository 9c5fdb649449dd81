//! In-memory transport whose events are pushed by the test.

use jobwatch_core::transport::{EventSink, Transport, TransportEvent};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    starts: u32,
    stops: u32,
    active: bool,
    sink: Option<EventSink>,
}

#[derive(Clone, Default)]
pub struct FakeTransport(Arc<Mutex<State>>);

impl FakeTransport {
    pub fn starts(&self) -> u32 {
        self.0.lock().unwrap().starts
    }

    pub fn stops(&self) -> u32 {
        self.0.lock().unwrap().stops
    }

    pub fn active(&self) -> bool {
        self.0.lock().unwrap().active
    }

    pub fn sink(&self) -> EventSink {
        self.0.lock().unwrap().sink.clone().expect("transport was started")
    }

    /// Returns false once the controller has gone away.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.sink().send(event)
    }
}

impl Transport for FakeTransport {
    fn start(&mut self, _job_id: &str, sink: EventSink) {
        let mut s = self.0.lock().unwrap();
        s.starts += 1;
        s.active = true;
        s.sink = Some(sink);
    }

    fn stop(&mut self) {
        let mut s = self.0.lock().unwrap();
        s.stops += 1;
        s.active = false;
    }

    fn is_active(&self) -> bool {
        self.0.lock().unwrap().active
    }
}
