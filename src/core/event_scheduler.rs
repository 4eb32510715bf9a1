use super::event::SimEvent;
use super::types::SimTime;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Handle returned when an event is scheduled, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

impl EventHandle {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct ScheduledEvent {
    pub at_time: SimTime,
    pub sequence_num: u64,
    pub event: SimEvent,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.at_time.total_cmp(&other.at_time) == Ordering::Equal
            && self.sequence_num == other.sequence_num
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .at_time
            .total_cmp(&self.at_time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Time-ordered event queue. Equal timestamps pop in schedule order.
#[derive(Debug, Default)]
pub struct EventScheduler {
    event_queue: BinaryHeap<ScheduledEvent>,
    sequence_counter: u64,
    /// Sequence numbers of events that are neither dispatched nor cancelled
    live: HashSet<u64>,
}

impl EventScheduler {
    /// Create a new EventScheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event at an absolute time. Time validation is the clock's job.
    pub fn schedule_event(&mut self, event: SimEvent, at_time: SimTime) -> EventHandle {
        let sequence_num = self.sequence_counter;
        self.sequence_counter += 1;

        self.event_queue.push(ScheduledEvent {
            at_time,
            sequence_num,
            event,
        });
        self.live.insert(sequence_num);

        EventHandle(sequence_num)
    }

    /// Cancel a pending event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        // The heap entry stays behind and is skipped when it surfaces
        self.live.remove(&handle.0)
    }

    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.live.contains(&handle.0)
    }

    /// Pop the earliest live event
    pub fn pop_next(&mut self) -> Option<ScheduledEvent> {
        self.discard_cancelled();
        let scheduled = self.event_queue.pop()?;
        self.live.remove(&scheduled.sequence_num);
        Some(scheduled)
    }

    /// Time of the earliest live event without removing it
    pub fn peek_next_time(&mut self) -> Option<SimTime> {
        self.discard_cancelled();
        self.event_queue.peek().map(|scheduled| scheduled.at_time)
    }

    /// Check if there are any live events remaining in the queue
    pub fn has_events(&self) -> bool {
        !self.live.is_empty()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drop every pending event. The sequence keeps counting so handles
    /// issued before the clear never match a later event.
    pub fn clear(&mut self) {
        self.event_queue.clear();
        self.live.clear();
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.event_queue.peek() {
            if self.live.contains(&top.sequence_num) {
                break;
            }
            self.event_queue.pop();
        }
    }
}
