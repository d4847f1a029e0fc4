use std::borrow::Cow;

use crate::{
    bus::{CpuBus, PpuBus, ReadHandler, Route, WriteHandler},
    config::{LoadConfig, Region},
    irq::Interruptable,
};

use self::mapper::{Mapper0, Mapper1, Mapper2, Mapper3, Mapper7, Mapper23, Mapper24};

#[cfg(feature = "cartridge-db")]
pub mod database;
pub mod mapper;
pub mod mirroring;
pub mod pcb;
pub mod rom;
pub mod swizzle;

pub use mapper::{Mapper, MapperCore, Port};
pub use mirroring::{MirrorMode, NametableMap};
pub use pcb::{PcbClass, classify_pcb, refine_sxrom};
pub use rom::{RomImage, RomInfo};
pub use swizzle::Swizzle;

/// Every board this crate can emulate.
#[derive(Debug, Clone)]
pub enum MapperKind {
    Nrom(Mapper0),
    Mmc1(Mapper1),
    Uxrom(Mapper2),
    Cnrom(Mapper3),
    Axrom(Mapper7),
    Vrc2_4(Mapper23),
    Vrc6(Mapper24),
}

#[derive(Debug, Clone)]
pub struct Cartridge {
    mapper: MapperKind,
    region: Region,
}

impl Cartridge {
    /// Builds the board for `rom`, after applying any override the built-in
    /// database holds for its checksum.
    pub fn init_with_rom(rom: RomImage, config: &LoadConfig) -> Self {
        #[cfg(feature = "cartridge-db")]
        {
            Self::init_with_database(rom, config, database::database())
        }
        #[cfg(not(feature = "cartridge-db"))]
        {
            Self::build(rom, config, None)
        }
    }

    /// Like [`Cartridge::init_with_rom`], consulting `db` instead of the
    /// built-in table.
    #[cfg(feature = "cartridge-db")]
    pub fn init_with_database(
        mut rom: RomImage,
        config: &LoadConfig,
        db: &database::OverrideDatabase,
    ) -> Self {
        let entry = if config.use_database {
            db.lookup(rom.info().crc32)
        } else {
            None
        };
        if let Some(entry) = entry {
            entry.apply_to(&mut rom);
        }
        Self::build(rom, config, entry.and_then(|entry| entry.region))
    }

    fn build(rom: RomImage, config: &LoadConfig, database_region: Option<Region>) -> Self {
        let info = *rom.info();
        let region = Region::resolve(config.region, database_region, info.region);
        let prg_ram_size = config.prg_ram_size.unwrap_or(info.prg_ram_size);
        let prg_len = rom.prg().len();
        let chr_len = rom.chr().len();
        let declared = classify_pcb(info.mapper, info.submapper);
        let pcb = refine_sxrom(declared, prg_len, chr_len == 0, prg_ram_size);
        if pcb != declared {
            tracing::debug!(board = pcb.name(), "picked SxROM board from memory sizes");
        }

        let mapper = match pcb {
            PcbClass::Nrom => MapperKind::Nrom(Mapper0::new(rom, pcb, prg_ram_size)),
            PcbClass::Unknown => {
                tracing::warn!(
                    mapper = info.mapper,
                    submapper = info.submapper,
                    "unsupported mapper, falling back to NROM"
                );
                MapperKind::Nrom(Mapper0::new(rom, pcb, prg_ram_size))
            }
            PcbClass::Mmc1
            | PcbClass::Snrom
            | PcbClass::Surom
            | PcbClass::Sorom
            | PcbClass::Sxrom
            | PcbClass::Serom => MapperKind::Mmc1(Mapper1::new(rom, pcb, prg_ram_size)),
            PcbClass::Uxrom => MapperKind::Uxrom(Mapper2::new(rom, pcb, prg_ram_size)),
            PcbClass::Cnrom => MapperKind::Cnrom(Mapper3::new(rom, pcb, prg_ram_size)),
            PcbClass::Axrom => MapperKind::Axrom(Mapper7::new(rom, pcb, prg_ram_size)),
            PcbClass::Vrc2a
            | PcbClass::Vrc2b
            | PcbClass::Vrc2c
            | PcbClass::Vrc4a
            | PcbClass::Vrc4b
            | PcbClass::Vrc4c
            | PcbClass::Vrc4d
            | PcbClass::Vrc4e
            | PcbClass::Vrc4f
            | PcbClass::Vrc4a4c
            | PcbClass::Vrc2b4e
            | PcbClass::Vrc4b4d => MapperKind::Vrc2_4(Mapper23::new(rom, pcb, prg_ram_size)),
            PcbClass::Vrc6a | PcbClass::Vrc6b => {
                MapperKind::Vrc6(Mapper24::new(rom, pcb, prg_ram_size))
            }
        };

        let cartridge = Self { mapper, region };
        tracing::info!(
            mapper = info.mapper,
            submapper = info.submapper,
            pcb = pcb.name(),
            prg_rom = prg_len,
            chr_rom = chr_len,
            mirroring = ?cartridge.mirroring(),
            region = %region,
            "cartridge loaded"
        );
        cartridge
    }

    pub fn mapper(&self) -> &dyn Mapper {
        match &self.mapper {
            MapperKind::Nrom(m) => m,
            MapperKind::Mmc1(m) => m,
            MapperKind::Uxrom(m) => m,
            MapperKind::Cnrom(m) => m,
            MapperKind::Axrom(m) => m,
            MapperKind::Vrc2_4(m) => m,
            MapperKind::Vrc6(m) => m,
        }
    }

    pub fn mapper_mut(&mut self) -> &mut dyn Mapper {
        match &mut self.mapper {
            MapperKind::Nrom(m) => m,
            MapperKind::Mmc1(m) => m,
            MapperKind::Uxrom(m) => m,
            MapperKind::Cnrom(m) => m,
            MapperKind::Axrom(m) => m,
            MapperKind::Vrc2_4(m) => m,
            MapperKind::Vrc6(m) => m,
        }
    }

    pub fn kind(&self) -> &MapperKind {
        &self.mapper
    }

    /// Installs the board's routes on both buses and its mirroring on the
    /// nametable decode.
    pub fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap) {
        self.mapper().apply_map(cpu, ppu, nametables);
    }

    /// Executes a cartridge-owned read route; `None` lets the bus float.
    pub fn read(&self, route: &Route<ReadHandler>) -> Option<u8> {
        self.mapper().core().read_route(route)
    }

    /// Executes a cartridge-owned write route.
    pub fn write(&mut self, route: &Route<WriteHandler>, value: u8, irq: &mut dyn Interruptable) {
        match route.handler {
            WriteHandler::Register(port) => {
                self.mapper_mut().write_register(port, route.param, value, irq)
            }
            _ => self.mapper_mut().core_mut().write_route(route, value),
        }
    }

    pub fn tick(&mut self, irq: &mut dyn Interruptable) {
        self.mapper_mut().tick(irq);
    }

    /// Power-on register state. Memories keep their contents.
    pub fn reset(&mut self, irq: &mut dyn Interruptable) {
        self.mapper_mut().reset(irq);
    }

    pub fn info(&self) -> &RomInfo {
        self.mapper().core().info()
    }

    pub fn mapper_id(&self) -> u16 {
        self.info().mapper
    }

    pub fn submapper(&self) -> u16 {
        self.info().submapper
    }

    pub fn pcb(&self) -> PcbClass {
        self.mapper().core().pcb()
    }

    pub fn name(&self) -> Cow<'static, str> {
        self.mapper().name()
    }

    pub fn mirroring(&self) -> MirrorMode {
        self.mapper().core().mirroring()
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Work RAM, for battery-backed saves.
    pub fn prg_ram(&self) -> &[u8] {
        self.mapper().core().prg_ram()
    }

    pub fn prg_ram_mut(&mut self) -> &mut [u8] {
        self.mapper_mut().core_mut().prg_ram_mut()
    }
}
