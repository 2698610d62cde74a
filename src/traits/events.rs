//! Event sink abstraction.
//!
//! The controller reports everything observable (state changes, alerts,
//! status refreshes) through an [`EventSink`]. Sinks must not block; a
//! network sink should queue and publish from its own loop.

use heapless::Deque;

use crate::events::DoorEvent;

/// Receiver for [`DoorEvent`]s emitted by the controller.
///
/// # Example
///
/// ```rust
/// use rs_garage::traits::EventSink;
/// use rs_garage::{DoorEvent, DoorState};
///
/// struct Printer;
///
/// impl EventSink for Printer {
///     fn publish(&mut self, event: DoorEvent) {
///         if let DoorEvent::StateChanged(state) = event {
///             assert_eq!(state, DoorState::Opening);
///         }
///     }
/// }
///
/// Printer.publish(DoorEvent::StateChanged(DoorState::Opening));
/// ```
pub trait EventSink {
    /// Deliver one event.
    fn publish(&mut self, event: DoorEvent);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn publish(&mut self, event: DoorEvent) {
        (**self).publish(event)
    }
}

/// Sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, _event: DoorEvent) {}
}

/// Number of events an [`EventQueue`] holds.
pub const EVENT_QUEUE_CAPACITY: usize = 32;

/// Bounded FIFO sink for handing events to a publisher loop.
///
/// Backed by a fixed [`heapless::Deque`], so queuing never allocates.
/// When full, the oldest event is dropped so the latest state always
/// gets through.
///
/// ```rust
/// use rs_garage::traits::{EventBuffer, EventSink};
/// use rs_garage::DoorEvent;
///
/// let mut queue = EventBuffer::<2>::new();
/// queue.publish(DoorEvent::Started);
/// queue.publish(DoorEvent::ConfigChanged(1));
/// queue.publish(DoorEvent::ConfigChanged(2));
///
/// let drained: Vec<_> = queue.drain().collect();
/// assert_eq!(drained, vec![DoorEvent::ConfigChanged(1), DoorEvent::ConfigChanged(2)]);
/// assert_eq!(queue.dropped(), 1);
/// ```
#[derive(Debug)]
pub struct EventBuffer<const N: usize> {
    events: Deque<DoorEvent, N>,
    dropped: usize,
}

/// The event buffer used by the services and the firmware loop.
pub type EventQueue = EventBuffer<EVENT_QUEUE_CAPACITY>;

impl<const N: usize> EventBuffer<N> {
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
            dropped: 0,
        }
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = DoorEvent> + '_ {
        core::iter::from_fn(move || self.events.pop_front())
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<const N: usize> Default for EventBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventSink for EventBuffer<N> {
    fn publish(&mut self, event: DoorEvent) {
        if self.events.is_full() {
            self.events.pop_front();
            self.dropped += 1;
        }
        // Only fails for a zero-capacity buffer.
        if self.events.push_back(event).is_err() {
            self.dropped += 1;
        }
    }
}
