//! Cartridge-side bus mapping for the NES.
//!
//! A [`Board`] holds per-address dispatch tables for the CPU and PPU buses.
//! Inserting a [`Cartridge`] lets its mapper install routes for PRG, CHR,
//! work RAM and its own registers; from then on bank switches only change
//! register state, never the tables. VRC-family boards also drive the CPU
//! `/IRQ` line through an [`Interruptable`] sink.

pub mod board;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod error;
pub mod irq;
pub mod memory;

pub use board::{Board, Peripherals, Unmapped};
pub use bus::{AddressBus, BankSize, BusSlot, CpuBus, DeviceId, Owner, PpuBus};
pub use cartridge::{Cartridge, MirrorMode, PcbClass, RomImage, RomInfo};
pub use config::{LoadConfig, Region};
pub use error::{Error, Result};
pub use irq::{Interruptable, IrqCounter, IrqLine, IrqSource};
