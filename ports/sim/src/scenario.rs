//! Scripted hardware events.
//!
//! A scenario is a comma-separated list of `kind@tick` entries:
//!
//! - `press@50`: a clean button press at tick 50
//! - `bounce@80`: a press released on the fourth debounce sample
//! - `timer@100`: one periodic counter/timer interrupt
//! - `cmd@120:gpio read 16`: a console line

use std::collections::VecDeque;
use std::str::FromStr;

use irqflow_core::Instant;

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    Press,
    Bounce,
    Timer,
    Command(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub at: Instant,
    pub event: SimEvent,
}

impl FromStr for ScheduledEvent {
    type Err = SimError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let entry = entry.trim();
        let (kind, rest) = entry
            .split_once('@')
            .ok_or_else(|| SimError::InvalidEvent(entry.to_owned()))?;
        let (tick, line) = match rest.split_once(':') {
            Some((tick, line)) => (tick, Some(line)),
            None => (rest, None),
        };
        let tick: u64 = tick
            .trim()
            .parse()
            .map_err(|_| SimError::InvalidTick(entry.to_owned()))?;

        let event = match (kind.trim(), line) {
            ("press", None) => SimEvent::Press,
            ("bounce", None) => SimEvent::Bounce,
            ("timer", None) => SimEvent::Timer,
            ("cmd", Some(line)) => SimEvent::Command(line.trim().to_owned()),
            _ => return Err(SimError::InvalidEvent(entry.to_owned())),
        };
        Ok(ScheduledEvent {
            at: Instant::from_ticks(tick),
            event,
        })
    }
}

/// Events ordered by time; equal times keep their listed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    events: VecDeque<ScheduledEvent>,
}

impl Scenario {
    pub fn new(mut events: Vec<ScheduledEvent>) -> Self {
        events.sort_by_key(|event| event.at);
        Self {
            events: events.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Next event due at or before `limit`, if any
    pub fn pop_due(&mut self, limit: Option<Instant>) -> Option<ScheduledEvent> {
        let next = self.events.front()?;
        match limit {
            Some(limit) if next.at > limit => None,
            _ => self.events.pop_front(),
        }
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(list: &str) -> Result<Self, Self::Err> {
        let events = list
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<ScheduledEvent>, _>>()?;
        Ok(Scenario::new(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sorts_by_tick() {
        let scenario: Scenario = "timer@30, press@10, cmd@20:gpio read 16".parse().unwrap();
        let mut scenario = scenario;
        assert_eq!(scenario.len(), 3);
        assert_eq!(scenario.pop_due(None).map(|e| e.event), Some(SimEvent::Press));
        assert_eq!(
            scenario.pop_due(None).map(|e| e.event),
            Some(SimEvent::Command("gpio read 16".into()))
        );
        assert_eq!(scenario.pop_due(Some(Instant::from_ticks(29))), None);
        assert_eq!(scenario.pop_due(Some(Instant::from_ticks(30))).map(|e| e.event), Some(SimEvent::Timer));
        assert!(scenario.is_empty());
    }

    #[test]
    fn test_rejects_malformed_entries() {
        assert!(matches!("press".parse::<Scenario>(), Err(SimError::InvalidEvent(_))));
        assert!(matches!("press@soon".parse::<Scenario>(), Err(SimError::InvalidTick(_))));
        assert!(matches!("cmd@5".parse::<Scenario>(), Err(SimError::InvalidEvent(_))));
        assert!(matches!("jump@5".parse::<Scenario>(), Err(SimError::InvalidEvent(_))));
    }
}
