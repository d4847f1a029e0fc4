//! VRC-style IRQ counter and the interrupt line it drives.
//!
//! Konami's VRC4/VRC6/VRC7 share one timer design: an 8-bit latch, a live
//! counter and a control register at the top of the register space.
//!
//! | Control bit | Meaning                                        |
//! |-------------|------------------------------------------------|
//! | 0 (`A`)     | re-enable the counter when the IRQ is acknowledged |
//! | 1 (`E`)     | enable; writing it set reloads counter and prescaler |
//! | 2 (`M`)     | 1 = count every CPU cycle, 0 = scanline mode    |
//!
//! Scanline mode is a prescaler, not a PPU hook: it subtracts 3 per CPU cycle
//! from 341 and clocks the counter each time it runs out, which lands on
//! 113⅔ CPU cycles per scanline.

use bitflags::bitflags;

bitflags! {
    /// Sources that can pull the CPU `/IRQ` line low.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IrqSource: u8 {
        const MAPPER = 0b0000_0001;
        const FRAME_COUNTER = 0b0000_0010;
        const DMC = 0b0000_0100;
        const EXTERNAL = 0b0000_1000;
    }
}

bitflags! {
    /// Decoded IRQ control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IrqControl: u8 {
        const ENABLE_AFTER_ACK = 0b0000_0001;
        const ENABLE = 0b0000_0010;
        const CYCLE_MODE = 0b0000_0100;
    }
}

/// Capability to drive the CPU interrupt line.
pub trait Interruptable {
    fn assert_irq(&mut self, source: IrqSource);

    fn clear_irq(&mut self, source: IrqSource);

    /// Whether `source` currently holds the line.
    fn irq_asserted(&self, source: IrqSource) -> bool;

    /// Level of the wired-OR line as the CPU sees it.
    fn irq_line(&self) -> bool;
}

/// Wired-OR `/IRQ` line; each source holds it until it lets go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IrqLine {
    held: IrqSource,
}

impl IrqLine {
    pub const fn new() -> Self {
        Self {
            held: IrqSource::empty(),
        }
    }

    pub fn sources(&self) -> IrqSource {
        self.held
    }
}

impl Interruptable for IrqLine {
    fn assert_irq(&mut self, source: IrqSource) {
        self.held.insert(source);
    }

    fn clear_irq(&mut self, source: IrqSource) {
        self.held.remove(source);
    }

    fn irq_asserted(&self, source: IrqSource) -> bool {
        self.held.intersects(source)
    }

    fn irq_line(&self) -> bool {
        !self.held.is_empty()
    }
}

/// Prescaler reload value; the prescaler loses 3 per CPU cycle.
const SCANLINE_PRESCALER: i16 = 341;
const PRESCALER_STEP: i16 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "savestate-serde",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct IrqCounter {
    latch: u8,
    counter: u8,
    prescaler: i16,
    enabled: bool,
    enable_after_ack: bool,
    cycle_mode: bool,
    source: u8,
}

impl Default for IrqCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqCounter {
    pub fn new() -> Self {
        Self::with_source(IrqSource::MAPPER)
    }

    /// Counter that reports through `source` instead of [`IrqSource::MAPPER`].
    pub fn with_source(source: IrqSource) -> Self {
        Self {
            latch: 0,
            counter: 0,
            prescaler: SCANLINE_PRESCALER,
            enabled: false,
            enable_after_ack: false,
            cycle_mode: false,
            source: source.bits(),
        }
    }

    fn source(&self) -> IrqSource {
        IrqSource::from_bits_truncate(self.source)
    }

    pub fn latch(&self) -> u8 {
        self.latch
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn cycle_mode(&self) -> bool {
        self.cycle_mode
    }

    pub fn set_latch(&mut self, value: u8) {
        self.latch = value;
    }

    /// VRC4 writes the latch a nibble at a time (`$F000` low, `$F001` high).
    pub fn set_latch_low_nibble(&mut self, value: u8) {
        self.latch = (self.latch & 0xF0) | (value & 0x0F);
    }

    pub fn set_latch_high_nibble(&mut self, value: u8) {
        self.latch = (self.latch & 0x0F) | ((value & 0x0F) << 4);
    }

    pub fn set_control(&mut self, value: u8, sink: &mut dyn Interruptable) {
        let control = IrqControl::from_bits_truncate(value);
        self.enable_after_ack = control.contains(IrqControl::ENABLE_AFTER_ACK);
        self.enabled = control.contains(IrqControl::ENABLE);
        self.cycle_mode = control.contains(IrqControl::CYCLE_MODE);

        if self.enabled {
            self.counter = self.latch;
            self.prescaler = SCANLINE_PRESCALER;
            sink.clear_irq(self.source());
        }
    }

    /// Releases the line. The live counter and latch keep their values.
    pub fn acknowledge(&mut self, sink: &mut dyn Interruptable) {
        sink.clear_irq(self.source());
        if self.enable_after_ack {
            self.enabled = true;
        }
    }

    /// Advances the counter by one CPU cycle.
    pub fn tick(&mut self, sink: &mut dyn Interruptable) {
        if !self.enabled {
            return;
        }

        if self.cycle_mode {
            self.clock(sink);
        } else {
            self.prescaler -= PRESCALER_STEP;
            if self.prescaler <= 0 {
                self.prescaler += SCANLINE_PRESCALER;
                self.clock(sink);
            }
        }
    }

    fn clock(&mut self, sink: &mut dyn Interruptable) {
        match self.counter.checked_sub(1) {
            Some(next) => self.counter = next,
            None => {
                self.counter = self.latch;
                sink.assert_irq(self.source());
            }
        }
    }

    /// Power-on state; releases the line if this counter held it.
    pub fn reset(&mut self, sink: &mut dyn Interruptable) {
        let source = self.source();
        *self = Self::with_source(source);
        sink.clear_irq(source);
    }
}
