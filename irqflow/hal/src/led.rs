//! Board LED array

pub trait LedArray: Send + Sync {
    /// Configure every LED pin as an output
    fn init_leds(&self);

    /// Number of LEDs on the board
    fn led_count(&self) -> usize;

    /// Drive every LED from `mask`, bit `n` for LED `n`
    fn led_out(&self, mask: u32);

    fn led_on(&self, index: usize);

    fn led_off(&self, index: usize);

    fn led_toggle(&self, index: usize);

    fn leds_off(&self) {
        self.led_out(0);
    }
}
