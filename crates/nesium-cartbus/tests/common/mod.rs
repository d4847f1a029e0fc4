#![allow(dead_code)]

use anyhow::Result;
use ctor::ctor;
use nesium_cartbus::{Board, LoadConfig, MirrorMode, RomImage, RomInfo};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub const KIB: usize = 1024;

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_file(true)
        .with_line_number(true)
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

/// Bytes that differ between neighbouring offsets and between banks.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i ^ (i >> 8) ^ (i >> 13).wrapping_mul(31)) as u8)
        .collect()
}

/// Every byte holds the index of the `bank`-sized bank it sits in.
pub fn banked(len: usize, bank: usize) -> Vec<u8> {
    (0..len).map(|i| (i / bank) as u8).collect()
}

pub struct RomBuilder {
    prg: Vec<u8>,
    chr: Vec<u8>,
    info: RomInfo,
}

impl RomBuilder {
    pub fn new(mapper: u16) -> Self {
        Self {
            prg: patterned(32 * KIB),
            chr: Vec::new(),
            info: RomInfo::new(mapper),
        }
    }

    pub fn submapper(mut self, submapper: u16) -> Self {
        self.info = self.info.with_submapper(submapper);
        self
    }

    pub fn prg(mut self, prg: Vec<u8>) -> Self {
        self.prg = prg;
        self
    }

    pub fn chr(mut self, chr: Vec<u8>) -> Self {
        self.chr = chr;
        self
    }

    pub fn prg_ram(mut self, size: usize) -> Self {
        self.info = self.info.with_prg_ram_size(size);
        self
    }

    pub fn mirroring(mut self, mode: MirrorMode) -> Self {
        self.info = self.info.with_mirroring(mode);
        self
    }

    pub fn crc32(mut self, crc32: u32) -> Self {
        self.info = self.info.with_crc32(crc32);
        self
    }

    pub fn build(self) -> Result<RomImage> {
        Ok(RomImage::new(self.prg, self.chr, self.info)?)
    }

    /// A board with this image already inserted.
    pub fn board(self) -> Result<Board> {
        let mut board = Board::new();
        board.load_rom(self.build()?, &LoadConfig::default());
        Ok(board)
    }
}
