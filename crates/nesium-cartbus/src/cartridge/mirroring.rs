use crate::memory::ppu as ppu_mem;

/// Nametable mirroring modes.
///
/// The PPU exposes four logical 1 KiB nametables at `$2000-$2FFF` (mirrored
/// through `$3EFF`); the cartridge decides which physical page backs each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "savestate-serde",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum MirrorMode {
    /// `$2000`/`$2400` share page 0, `$2800`/`$2C00` share page 1.
    #[default]
    Horizontal,
    /// `$2000`/`$2800` share page 0, `$2400`/`$2C00` share page 1.
    Vertical,
    /// All four tables show page 0.
    SingleScreenA,
    /// All four tables show page 1.
    SingleScreenB,
    /// Four distinct pages (cartridge supplies the extra 2 KiB).
    FourScreen,
}

impl MirrorMode {
    /// Physical page behind each logical nametable.
    pub const fn pages(self) -> [u8; 4] {
        match self {
            MirrorMode::Horizontal => [0, 0, 1, 1],
            MirrorMode::Vertical => [0, 1, 0, 1],
            MirrorMode::SingleScreenA => [0, 0, 0, 0],
            MirrorMode::SingleScreenB => [1, 1, 1, 1],
            MirrorMode::FourScreen => [0, 1, 2, 3],
        }
    }
}

/// The four-nametable address decode, rewritten whenever the mirroring mode
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NametableMap {
    mode: MirrorMode,
    pages: [u8; 4],
}

impl Default for NametableMap {
    fn default() -> Self {
        Self::new(MirrorMode::default())
    }
}

impl NametableMap {
    pub const fn new(mode: MirrorMode) -> Self {
        Self {
            mode,
            pages: mode.pages(),
        }
    }

    pub fn mode(&self) -> MirrorMode {
        self.mode
    }

    /// Rebinds the decode for `mode`. Returns `true` when anything changed.
    pub fn remap(&mut self, mode: MirrorMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.pages = mode.pages();
        true
    }

    /// Translates a PPU address in `$2000-$3EFF` into an index within the
    /// 4 KiB nametable RAM.
    #[inline]
    pub fn resolve(&self, addr: u16) -> usize {
        let rel = (addr.wrapping_sub(ppu_mem::NAMETABLE_BASE) & 0x0FFF) as usize;
        let table = rel / ppu_mem::NAMETABLE_SIZE as usize;
        let offset = rel % ppu_mem::NAMETABLE_SIZE as usize;
        self.pages[table] as usize * ppu_mem::NAMETABLE_SIZE as usize + offset
    }
}
