//! Named timer slots owned by the controller.
//!
//! Each slot holds at most one deadline; arming a slot replaces whatever it
//! held. The driver sleeps until the earliest armed deadline.

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerSlot {
    Animation,
    Simulator,
    Reconnect,
}

#[derive(Debug, Default)]
pub(crate) struct TimerSlots {
    animation: Option<Instant>,
    simulator: Option<Instant>,
    reconnect: Option<Instant>,
}

impl TimerSlots {
    fn slot_mut(&mut self, slot: TimerSlot) -> &mut Option<Instant> {
        match slot {
            TimerSlot::Animation => &mut self.animation,
            TimerSlot::Simulator => &mut self.simulator,
            TimerSlot::Reconnect => &mut self.reconnect,
        }
    }

    pub(crate) fn arm(&mut self, slot: TimerSlot, at: Instant) {
        *self.slot_mut(slot) = Some(at);
    }

    pub(crate) fn disarm(&mut self, slot: TimerSlot) {
        *self.slot_mut(slot) = None;
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self, slot: TimerSlot) -> bool {
        match slot {
            TimerSlot::Animation => self.animation.is_some(),
            TimerSlot::Simulator => self.simulator.is_some(),
            TimerSlot::Reconnect => self.reconnect.is_some(),
        }
    }

    /// Disarm and return the slot's deadline if it has passed.
    pub(crate) fn take_due(&mut self, slot: TimerSlot, now: Instant) -> Option<Instant> {
        let entry = self.slot_mut(slot);
        if entry.is_some_and(|at| at <= now) {
            entry.take()
        } else {
            None
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        [self.animation, self.simulator, self.reconnect]
            .into_iter()
            .flatten()
            .min()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.next_deadline().is_none()
    }
}
