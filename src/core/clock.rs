use super::error::{InvalidScheduleError, SimulationError};
use super::event::SimEvent;
use super::event_scheduler::{EventHandle, EventScheduler};
use super::types::SimTime;
use log::debug;

/// Lifecycle of a clock over one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
    /// The queue emptied before the requested horizon. Cleared by `reset()`.
    Drained,
}

/// Receives events popped by the clock. Handlers run to completion and may
/// schedule follow-up events on the clock they are given.
pub trait EventHandler {
    fn handle_event(
        &mut self,
        event: SimEvent,
        clock: &mut SimulationClock,
    ) -> Result<(), SimulationError>;
}

/// Observer trait for clock progress
pub trait ClockObserver {
    /// Called when simulated time moves forward
    fn on_time_advance(&mut self, old_time: SimTime, new_time: SimTime);

    /// Called after an event has been handled
    fn on_event_dispatched(&mut self, time: SimTime, event: &SimEvent);
}

pub struct SimulationClock {
    scheduler: EventScheduler,
    now: SimTime,
    state: ClockState,
    dispatched: u64,
    observers: Vec<Box<dyn ClockObserver + Send>>,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self {
            scheduler: EventScheduler::new(),
            now: 0.0,
            state: ClockState::Idle,
            dispatched: 0,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn ClockObserver + Send>) {
        self.observers.push(observer);
    }

    /// Schedule an event at an absolute time
    pub fn schedule(
        &mut self,
        event: SimEvent,
        at_time: SimTime,
    ) -> Result<EventHandle, InvalidScheduleError> {
        if !at_time.is_finite() || at_time < self.now {
            return Err(InvalidScheduleError {
                at_time,
                now: self.now,
            });
        }
        Ok(self.scheduler.schedule_event(event, at_time))
    }

    /// Schedule an event `delay` time units from now
    pub fn schedule_in(
        &mut self,
        event: SimEvent,
        delay: SimTime,
    ) -> Result<EventHandle, InvalidScheduleError> {
        self.schedule(event, self.now + delay)
    }

    /// Cancel a pending event. Cancelling a dispatched event is a no-op.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        self.scheduler.cancel(handle)
    }

    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.scheduler.is_pending(handle)
    }

    /// Pop the earliest event, move time to it and dispatch it.
    /// Returns the time of the dispatched event, or None if the queue is empty.
    pub fn advance<H: EventHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<Option<SimTime>, SimulationError> {
        if self.state == ClockState::Idle {
            self.state = ClockState::Running;
        }

        let scheduled = match self.scheduler.pop_next() {
            Some(scheduled) => scheduled,
            None => {
                self.state = ClockState::Drained;
                return Ok(None);
            }
        };

        let old_time = self.now;
        self.now = scheduled.at_time;
        if old_time != self.now {
            for observer in &mut self.observers {
                observer.on_time_advance(old_time, self.now);
            }
        }

        debug!("t={:.3} dispatching {}", self.now, scheduled.event);
        handler.handle_event(scheduled.event, self)?;
        self.dispatched += 1;

        for observer in &mut self.observers {
            observer.on_event_dispatched(self.now, &scheduled.event);
        }

        Ok(Some(self.now))
    }

    /// Dispatch every event at or before `end_time`, then move time to `end_time`
    pub fn run_until<H: EventHandler>(
        &mut self,
        end_time: SimTime,
        handler: &mut H,
    ) -> Result<SimTime, SimulationError> {
        if !end_time.is_finite() {
            return Err(SimulationError::InvalidHorizon { end_time });
        }
        if self.state == ClockState::Idle {
            self.state = ClockState::Running;
        }

        while let Some(next_time) = self.scheduler.peek_next_time() {
            if next_time > end_time {
                break;
            }
            self.advance(handler)?;
        }

        if self.scheduler.is_empty() {
            self.state = ClockState::Drained;
        }

        if end_time > self.now {
            let old_time = self.now;
            self.now = end_time;
            for observer in &mut self.observers {
                observer.on_time_advance(old_time, end_time);
            }
        }

        Ok(self.now)
    }

    /// Back to an empty, idle clock at time 0. Observers are kept.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.now = 0.0;
        self.state = ClockState::Idle;
        self.dispatched = 0;
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Number of events handled since the last reset
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    pub fn has_pending_events(&self) -> bool {
        self.scheduler.has_events()
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}
