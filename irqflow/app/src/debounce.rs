//! Button debounce filter.
//!
//! Runs inside the GPIO interrupt handler: the input is sampled a fixed
//! number of times with a busy-wait between samples, and the edge is
//! accepted only if every sample reads the asserted level. There is no
//! state across invocations; every edge runs the full window again.

use irqflow_hal::{DelayNs, Level};

use crate::config::DebounceConfig;

/// Something that can be sampled for a digital level.
pub trait LevelSource {
    fn sample(&mut self) -> Level;
}

impl<F> LevelSource for F
where
    F: FnMut() -> Level,
{
    fn sample(&mut self) -> Level {
        self()
    }
}

/// Result of one debounce session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceOutcome {
    /// Every sample in the window read the asserted level
    Confirmed,
    /// Sample `at_sample` (zero-based) read the other level
    Bounced { at_sample: u32 },
}

impl DebounceOutcome {
    pub const fn is_confirmed(self) -> bool {
        matches!(self, DebounceOutcome::Confirmed)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DebounceOutcome {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DebounceOutcome::Confirmed => defmt::write!(fmt, "Confirmed"),
            DebounceOutcome::Bounced { at_sample } => {
                defmt::write!(fmt, "Bounced({})", at_sample)
            }
        }
    }
}

/// Confirm that `source` stays asserted for the whole window.
///
/// Each sample is followed by one busy-wait interval, so a confirmed
/// edge costs the full window of interrupt latency; a bounce aborts on
/// the first deasserted sample without waiting further.
pub fn debounce<S, D>(config: &DebounceConfig, source: &mut S, delay: &mut D) -> DebounceOutcome
where
    S: LevelSource + ?Sized,
    D: DelayNs + ?Sized,
{
    for at_sample in 0..config.samples() {
        if source.sample() != config.asserted {
            return DebounceOutcome::Bounced { at_sample };
        }
        delay.delay_ms(config.interval_ms);
    }
    DebounceOutcome::Confirmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingDelay {
        total_ms: u32,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += ns / 1_000_000;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms;
        }
    }

    fn scripted(levels: &[u8]) -> impl FnMut() -> Level + '_ {
        let mut iter = levels.iter();
        move || Level::from(iter.next().copied().unwrap_or(0) != 0)
    }

    #[test]
    fn test_stable_press_is_confirmed() {
        let mut delay = CountingDelay::default();
        let mut source = scripted(&[1; 10]);
        let outcome = debounce(&DebounceConfig::default(), &mut source, &mut delay);
        assert_eq!(outcome, DebounceOutcome::Confirmed);
        assert_eq!(delay.total_ms, 20);
    }

    #[test]
    fn test_release_inside_window_is_a_bounce() {
        let mut delay = CountingDelay::default();
        let mut source = scripted(&[1, 1, 1, 0, 1, 1, 1, 1, 1, 1]);
        let outcome = debounce(&DebounceConfig::default(), &mut source, &mut delay);
        assert_eq!(outcome, DebounceOutcome::Bounced { at_sample: 3 });
        assert_eq!(delay.total_ms, 6);
    }

    #[test]
    fn test_release_on_last_sample_is_a_bounce() {
        let mut delay = CountingDelay::default();
        let mut source = scripted(&[1, 1, 1, 1, 1, 1, 1, 1, 1, 0]);
        let outcome = debounce(&DebounceConfig::default(), &mut source, &mut delay);
        assert!(!outcome.is_confirmed());
    }

    #[test]
    fn test_window_shorter_than_interval_still_reads_pin() {
        let config = DebounceConfig {
            window_ms: 1,
            interval_ms: 2,
            ..DebounceConfig::default()
        };
        let mut delay = CountingDelay::default();
        let mut reads = 0;
        let mut source = || {
            reads += 1;
            Level::Low
        };
        let outcome = debounce(&config, &mut source, &mut delay);
        assert_eq!(outcome, DebounceOutcome::Bounced { at_sample: 0 });
        assert_eq!(reads, 1);
    }

    #[test]
    fn test_active_low_button() {
        let config = DebounceConfig {
            asserted: Level::Low,
            ..DebounceConfig::default()
        };
        let mut delay = CountingDelay::default();
        let mut source = scripted(&[0; 10]);
        assert!(debounce(&config, &mut source, &mut delay).is_confirmed());
    }
}
