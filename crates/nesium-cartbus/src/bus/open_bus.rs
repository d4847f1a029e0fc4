//! Floating data-bus model.
//!
//! The 2A03/2C02 data bus floats when no device drives it: reads from
//! unclaimed addresses return whatever value was last on the bus. Every
//! driven read result and every write refreshes the latch.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenBus {
    value: u8,
}

impl OpenBus {
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Resets the open-bus state to its power-on value.
    pub fn reset(&mut self) {
        self.value = 0;
    }

    /// Current floating value.
    pub fn sample(&self) -> u8 {
        self.value
    }

    /// Latches a freshly driven value onto the bus.
    pub fn latch(&mut self, value: u8) {
        self.value = value;
    }
}
