//! PPU-side CHR storage.
//!
//! A board exposes either CHR ROM *or* CHR RAM on the pattern-table bus.
//! [`ChrStorage`] hides which, so banked reads and writes share one path:
//! indices wrap to the storage length and writes to ROM are dropped.

use crate::memory::ppu as ppu_mem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChrStorage {
    Rom(Box<[u8]>),
    Ram(Box<[u8]>),
}

impl ChrStorage {
    /// CHR ROM when the image has any, otherwise CHR RAM of the declared size
    /// (8 KiB when the header declares none).
    pub fn select(chr_rom: Box<[u8]>, chr_ram_size: usize) -> Self {
        if !chr_rom.is_empty() {
            return ChrStorage::Rom(chr_rom);
        }
        let size = if chr_ram_size == 0 {
            ppu_mem::CHR_SIZE
        } else {
            chr_ram_size
        };
        ChrStorage::Ram(vec![0; size].into_boxed_slice())
    }

    fn bytes(&self) -> Option<&[u8]> {
        match self {
            ChrStorage::Rom(data) | ChrStorage::Ram(data) if !data.is_empty() => Some(&data[..]),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChrStorage::Rom(data) | ChrStorage::Ram(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ram(&self) -> bool {
        matches!(self, ChrStorage::Ram(_))
    }

    /// Reads `base + offset`, wrapped to the storage length.
    pub fn read_indexed(&self, base: usize, offset: usize) -> Option<u8> {
        self.bytes().map(|data| data[(base + offset) % data.len()])
    }

    /// Writes `base + offset` when the storage is RAM.
    pub fn write_indexed(&mut self, base: usize, offset: usize, data: u8) {
        if let ChrStorage::Ram(ram) = self {
            if !ram.is_empty() {
                let idx = (base + offset) % ram.len();
                ram[idx] = data;
            }
        }
    }

    pub fn as_ram(&self) -> Option<&[u8]> {
        match self {
            ChrStorage::Ram(ram) => Some(&ram[..]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_rom_when_present() {
        let chr = ChrStorage::select(vec![1, 2, 3].into_boxed_slice(), 0x2000);
        assert_eq!(chr.len(), 3);
        assert_eq!(chr.read_indexed(0, 4), Some(2));
        assert!(!chr.is_ram());
    }

    #[test]
    fn falls_back_to_default_ram() {
        let chr = ChrStorage::select(Box::default(), 0);
        assert_eq!(chr.len(), 0x2000);
        assert!(chr.is_ram());
    }

    #[test]
    fn indexed_access_wraps() {
        let mut chr = ChrStorage::select(Box::default(), 0x400);
        chr.write_indexed(0x400, 5, 0xAB);
        assert_eq!(chr.read_indexed(0, 5), Some(0xAB));
        assert_eq!(chr.read_indexed(0x800, 5), Some(0xAB));
    }

    #[test]
    fn rom_ignores_writes() {
        let mut rom = ChrStorage::Rom(vec![7; 16].into_boxed_slice());
        rom.write_indexed(0, 0, 1);
        assert_eq!(rom.read_indexed(0, 0), Some(7));
        assert_eq!(rom.as_ram(), None);
    }
}
