//! System event queue.
//!
//! Events are produced by:
//! - the poll timer (hardware timer callback or tick-source task)
//! - the status registry (flag transitions)
//! - the command transport (opcodes from the host)
//!
//! Events are consumed by the dispatcher task, one at a time, in FIFO
//! order.  No kind has priority over another.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Timer ISR   │────▶│              │     │              │
//! │ Status reg. │────▶│  EventQueue  │────▶│  Dispatcher  │
//! │ Transport   │────▶│ (crit. sect.)│     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;

use crate::error::QueueError;
use crate::status::StatusFlag;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 32;

/// A flag transition observed by the status registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub flag: StatusFlag,
    /// `true` if the flag became set, `false` if it became clear.
    pub set: bool,
}

/// Everything the dispatcher can be woken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The poll timer reached its deadline.
    TimerTick,
    /// A status flag changed state.
    StatusChanged(StatusChange),
    /// Raw command opcode from the host.  Not validated at this layer.
    Command(u32),
}

impl Event {
    pub const fn status_set(flag: StatusFlag) -> Self {
        Self::StatusChanged(StatusChange { flag, set: true })
    }

    pub const fn status_cleared(flag: StatusFlag) -> Self {
        Self::StatusChanged(StatusChange { flag, set: false })
    }
}

// ── Queue ─────────────────────────────────────────────────────
//
// Many producers (ISR, timer task, transport task), one consumer (the
// dispatcher).  `try_send` takes a short critical section and never
// blocks, so it is safe from interrupt context.

/// Bounded multi-producer event queue with a single consumer.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_CAP>,
    dropped: AtomicU32,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an event.  Safe from ISR context.
    ///
    /// On a full queue the event is handed back inside the error and the
    /// drop counter is incremented.
    pub fn post(&self, event: Event) -> Result<(), QueueError> {
        match self.channel.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(ev)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(QueueError::Full(ev))
            }
        }
    }

    /// Transport entry point for a raw command opcode.
    /// Returns `false` if the queue was full.
    pub fn post_command(&self, opcode: u32) -> bool {
        match self.post(Event::Command(opcode)) {
            Ok(()) => true,
            Err(e) => {
                warn!("command {} rejected: {}", opcode, e);
                false
            }
        }
    }

    /// Wait for the next event.  The dispatcher's only suspension point.
    pub async fn receive(&self) -> Event {
        self.channel.receive().await
    }

    /// Pop the next event without waiting.
    pub fn try_receive(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Events rejected because the queue was full, since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Process-wide queue used by the firmware binary.  Interrupt producers
/// reach the dispatcher through this static.
pub static SYSTEM_EVENTS: EventQueue = EventQueue::new();
