//! LED bank on the SiFive GPIO block.

use core::ptr::{read_volatile, write_volatile};

/// Output enable register.
const GPIO_OUTPUT_EN: usize = 0x08;

/// Output value register.
const GPIO_OUTPUT_VAL: usize = 0x0C;

/// Number of LEDs wired to pins 0..LED_COUNT.
pub const LED_COUNT: usize = 8;

/// The LEDs of one GPIO block.
pub struct Leds {
    base: usize,
}

impl Leds {
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let reg = (self.base + offset) as *mut u32;
        unsafe { write_volatile(reg, f(read_volatile(reg))) };
    }

    /// Configures the LED pins as outputs, all off.
    pub fn init(&self) {
        let mask = (1u32 << LED_COUNT) - 1;
        self.modify(GPIO_OUTPUT_VAL, |v| v & !mask);
        self.modify(GPIO_OUTPUT_EN, |v| v | mask);
    }

    pub fn set(&self, index: usize) {
        if index < LED_COUNT {
            self.modify(GPIO_OUTPUT_VAL, |v| v | 1 << index);
        }
    }

    pub fn clear(&self, index: usize) {
        if index < LED_COUNT {
            self.modify(GPIO_OUTPUT_VAL, |v| v & !(1 << index));
        }
    }

    pub fn toggle(&self, index: usize) {
        if index < LED_COUNT {
            self.modify(GPIO_OUTPUT_VAL, |v| v ^ 1 << index);
        }
    }
}
