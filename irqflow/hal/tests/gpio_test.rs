use std::collections::HashMap;
use std::sync::Mutex;

use irqflow_hal::{pin_mask, Gpio, Level, PinMode};

#[derive(Default)]
struct Pins {
    levels: Mutex<HashMap<u32, Level>>,
}

impl Gpio for Pins {
    fn configure(&self, _pin: u32, _mode: PinMode) {}

    fn read(&self, pin: u32) -> Level {
        self.levels.lock().unwrap().get(&pin).copied().unwrap_or_default()
    }

    fn write(&self, pin: u32, level: Level) {
        self.levels.lock().unwrap().insert(pin, level);
    }
}

#[test]
fn default_toggle_inverts_current_level() {
    let pins = Pins::default();
    pins.toggle(14);
    assert_eq!(pins.read(14), Level::High);
    pins.toggle(14);
    assert_eq!(pins.read(14), Level::Low);
}

#[test]
fn level_converts_from_and_to_bool() {
    assert_eq!(Level::from(true), Level::High);
    assert!(!bool::from(Level::Low));
    assert_eq!(!Level::Low, Level::High);
}

#[test]
fn pin_mask_selects_one_bit() {
    assert_eq!(pin_mask(0), 1);
    assert_eq!(pin_mask(16), 1 << 16);
    assert_eq!(pin_mask(63), 1 << 63);
}

#[test]
fn pin_mask_past_the_bank_is_empty() {
    assert_eq!(pin_mask(64), 0);
    assert_eq!(pin_mask(70), 0);
}
