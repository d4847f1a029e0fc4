//! Cartridge contents as handed over by the ROM loader.
//!
//! File parsing lives elsewhere; by the time a [`RomImage`] exists the PRG and
//! CHR sections are split out and the header reduced to [`RomInfo`].

use crate::{
    cartridge::mirroring::MirrorMode,
    config::Region,
    error::{Error, MAX_PRG_ROM_SIZE, Result},
};

/// Header-derived facts about a cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RomInfo {
    pub mapper: u16,
    pub submapper: u16,
    pub mirroring: MirrorMode,
    pub region: Region,
    /// CRC32 of the PRG image; the override database key.
    pub crc32: u32,
    /// Declared work RAM (volatile + battery) in bytes.
    pub prg_ram_size: usize,
    /// Declared CHR RAM in bytes; only used when there is no CHR ROM.
    pub chr_ram_size: usize,
}

impl RomInfo {
    pub fn new(mapper: u16) -> Self {
        Self {
            mapper,
            ..Self::default()
        }
    }

    pub fn with_submapper(mut self, submapper: u16) -> Self {
        self.submapper = submapper;
        self
    }

    pub fn with_mirroring(mut self, mirroring: MirrorMode) -> Self {
        self.mirroring = mirroring;
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_crc32(mut self, crc32: u32) -> Self {
        self.crc32 = crc32;
        self
    }

    pub fn with_prg_ram_size(mut self, size: usize) -> Self {
        self.prg_ram_size = size;
        self
    }

    pub fn with_chr_ram_size(mut self, size: usize) -> Self {
        self.chr_ram_size = size;
        self
    }

    /// Fills in the checksum from the PRG bytes.
    #[cfg(feature = "cartridge-db")]
    pub fn with_prg_checksum(mut self, prg: &[u8]) -> Self {
        self.crc32 = crc32fast::hash(prg);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomImage {
    prg: Box<[u8]>,
    chr: Box<[u8]>,
    info: RomInfo,
}

impl RomImage {
    /// Wraps loader output. PRG must be non-empty; everything else, however
    /// odd, is left for the mapper to wrap around.
    pub fn new(
        prg: impl Into<Box<[u8]>>,
        chr: impl Into<Box<[u8]>>,
        info: RomInfo,
    ) -> Result<Self> {
        let prg = prg.into();
        if prg.is_empty() {
            return Err(Error::EmptyPrgRom);
        }
        if prg.len() > MAX_PRG_ROM_SIZE {
            return Err(Error::PrgRomTooLarge { len: prg.len() });
        }
        Ok(Self {
            prg,
            chr: chr.into(),
            info,
        })
    }

    pub fn prg(&self) -> &[u8] {
        &self.prg
    }

    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    pub fn info(&self) -> &RomInfo {
        &self.info
    }

    pub(crate) fn info_mut(&mut self) -> &mut RomInfo {
        &mut self.info
    }

    /// Drops PRG bytes past `len`. Never empties the image.
    pub(crate) fn truncate_prg(&mut self, len: usize) {
        let len = len.max(1);
        if len < self.prg.len() {
            self.prg = self.prg[..len].into();
        }
    }

    pub(crate) fn into_parts(self) -> (Box<[u8]>, Box<[u8]>, RomInfo) {
        (self.prg, self.chr, self.info)
    }
}
