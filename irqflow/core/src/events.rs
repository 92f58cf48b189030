//! Event kinds and the message value carried by the event channel

use core::fmt;

use crate::CoreError;

/// Discriminant of a [`TaskMessage`].
///
/// The set is closed: the consumer matches on it exhaustively, so a kind
/// it does not recognize cannot be constructed. Raw values coming from
/// outside Rust go through [`TryFrom<u32>`], which rejects unknown tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventKind {
    /// Debounced push-button edge
    Button = 0,
    /// CPU resumed from deep sleep
    Wake = 1,
    /// Periodic timer expiry
    Timer = 2,
}

impl EventKind {
    /// Every kind, in discriminant order
    pub const ALL: [EventKind; 3] = [EventKind::Button, EventKind::Wake, EventKind::Timer];

    /// Raw discriminant value
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Upper-case name used in logs and console output
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::Button => "BUTTON",
            EventKind::Wake => "WAKE",
            EventKind::Timer => "TIMER",
        }
    }
}

impl TryFrom<u32> for EventKind {
    type Error = CoreError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.raw() == raw)
            .ok_or(CoreError::UnknownEvent(raw))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventKind {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.name());
    }
}

/// Message delivered from interrupt producers to the application task.
///
/// Messages are plain values: they are copied into the channel on send
/// and copied out on receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskMessage {
    pub kind: EventKind,
}

impl TaskMessage {
    pub const BUTTON: TaskMessage = TaskMessage::new(EventKind::Button);
    pub const WAKE: TaskMessage = TaskMessage::new(EventKind::Wake);
    pub const TIMER: TaskMessage = TaskMessage::new(EventKind::Timer);

    /// Create a message of the given kind
    pub const fn new(kind: EventKind) -> Self {
        Self { kind }
    }

    /// Kind of this message
    pub const fn kind(&self) -> EventKind {
        self.kind
    }
}

impl From<EventKind> for TaskMessage {
    fn from(kind: EventKind) -> Self {
        TaskMessage::new(kind)
    }
}

impl fmt::Display for TaskMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskMessage({})", self.kind)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskMessage {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "TaskMessage({})", self.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip_covers_every_kind() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::try_from(kind.raw()), Ok(kind));
        }
    }

    #[test]
    fn unknown_raw_kind_is_rejected() {
        assert_eq!(EventKind::try_from(7), Err(CoreError::UnknownEvent(7)));
    }

    #[test]
    fn message_constants_carry_their_kind() {
        assert_eq!(TaskMessage::BUTTON.kind(), EventKind::Button);
        assert_eq!(TaskMessage::WAKE.kind(), EventKind::Wake);
        assert_eq!(TaskMessage::from(EventKind::Timer), TaskMessage::TIMER);
    }
}
