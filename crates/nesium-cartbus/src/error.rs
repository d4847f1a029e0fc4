use thiserror::Error;

/// Largest PRG image accepted (the NES 2.0 header ceiling).
pub const MAX_PRG_ROM_SIZE: usize = 4 * 1024 * 1024;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A cartridge without PRG ROM has nothing to put on the CPU bus.
    #[error("PRG ROM image is empty")]
    EmptyPrgRom,

    #[error("PRG ROM image is {len} bytes, larger than the {MAX_PRG_ROM_SIZE} byte limit")]
    PrgRomTooLarge { len: usize },

    #[error("unknown region `{0}` (expected auto, ntsc, pal or dendy)")]
    UnknownRegion(String),
}
