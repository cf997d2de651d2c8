//! Browser-style timers on a tokio runtime.
//!
//! A timer task owns no alarm state. It only sends a [`TimerEvent`] to the
//! frame loop, which routes it through [`TimerSlot::accepts`]. Each slot
//! holds at most one live task; arming or cancelling bumps its generation,
//! so events a cancelled task already queued are recognised as stale.

use std::time::Duration;

use tokio::{
    runtime::Handle,
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at, sleep_until},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Deadline,
    Countdown,
    Tone,
    Relocation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerEvent {
    pub kind: TimerKind,
    pub generation: u64,
}

pub type EventSender = mpsc::UnboundedSender<TimerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TimerEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug)]
pub struct TimerSlot {
    kind: TimerKind,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            generation: 0,
            handle: None,
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Fires once at `deadline`, replacing whatever this slot was running.
    pub fn once(&mut self, runtime: &Handle, events: &EventSender, deadline: Instant) {
        let event = self.rearm();
        let events = events.clone();
        self.handle = Some(runtime.spawn(async move {
            sleep_until(deadline).await;
            let _ = events.send(event);
        }));
    }

    /// Fires every `period`, first one period from now. Replaces whatever
    /// this slot was running.
    pub fn every(&mut self, runtime: &Handle, events: &EventSender, period: Duration) {
        let event = self.rearm();
        let events = events.clone();
        self.handle = Some(runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(event).is_err() {
                    break;
                }
            }
        }));
    }

    /// Returns true if a timer was running.
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Marks a one-shot timer as spent once its event has been handled.
    pub fn complete(&mut self) {
        self.handle = None;
    }

    pub fn accepts(&self, event: &TimerEvent) -> bool {
        event.kind == self.kind && event.generation == self.generation && self.is_active()
    }

    fn rearm(&mut self) -> TimerEvent {
        self.cancel();
        TimerEvent {
            kind: self.kind,
            generation: self.generation,
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
