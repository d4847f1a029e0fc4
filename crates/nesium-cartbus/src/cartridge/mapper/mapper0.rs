use std::borrow::Cow;

use crate::{
    bus::{CpuBus, PpuBus},
    cartridge::{
        mapper::{Mapper, MapperCore, Port},
        mirroring::NametableMap,
        pcb::PcbClass,
        rom::RomImage,
    },
    irq::Interruptable,
    memory::cpu as cpu_mem,
};

// Mapper 0 – NROM, no banking at all.
//
// | Area | Address range     | Behaviour                                  | IRQ/Audio |
// |------|-------------------|--------------------------------------------|-----------|
// | CPU  | `$6000-$7FFF`     | Optional PRG-RAM (when declared)           | None      |
// | CPU  | `$8000-$FFFF`     | PRG-ROM, mirrored when smaller than 32 KiB | None      |
// | PPU  | `$0000-$1FFF`     | CHR ROM/RAM, unbanked                      | None      |
// | PPU  | `$2000-$3EFF`     | Mirroring from the header                  | None      |
//
// Also the fallback board for mapper numbers nothing else claims.

#[derive(Debug, Clone)]
pub struct Mapper0 {
    core: MapperCore,
}

impl Mapper0 {
    pub fn new(rom: RomImage, pcb: PcbClass, prg_ram_size: usize) -> Self {
        Self {
            core: MapperCore::new(rom, pcb, prg_ram_size),
        }
    }
}

impl Mapper for Mapper0 {
    fn core(&self) -> &MapperCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapperCore {
        &mut self.core
    }

    fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap) {
        self.core.map_prg_ram(cpu);
        self.core.map_prg_direct(cpu, cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END);
        self.core.map_chr_direct(ppu);
        self.core.apply_controllable_mirror_map(nametables);
    }

    fn write_register(
        &mut self,
        _port: Port,
        _addr: u16,
        _value: u8,
        _irq: &mut dyn Interruptable,
    ) {
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("NROM")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bus::ReadHandler, cartridge::rom::RomInfo};

    fn nrom(prg_len: usize) -> Mapper0 {
        let prg: Vec<u8> = (0..prg_len).map(|i| i as u8).collect();
        let rom = RomImage::new(prg, vec![0; 0x2000], RomInfo::new(0)).expect("valid image");
        Mapper0::new(rom, PcbClass::Nrom, 0)
    }

    #[test]
    fn nrom128_mirrors_into_upper_half() {
        let mapper = nrom(0x4000);
        let mut cpu = CpuBus::new();
        let mut ppu = PpuBus::new();
        let mut nt = NametableMap::default();
        mapper.apply_map(&mut cpu, &mut ppu, &mut nt);

        let low = cpu.slot(0x8123).read;
        let high = cpu.slot(0xC123).read;
        assert_eq!(low.handler, ReadHandler::PrgDirect);
        assert_eq!(low.param, high.param);
        assert_eq!(mapper.core().read_prg_direct(high.param), 0x23);
    }

    #[test]
    fn no_prg_ram_leaves_window_open() {
        let mapper = nrom(0x8000);
        let mut cpu = CpuBus::new();
        let mut ppu = PpuBus::new();
        let mut nt = NametableMap::default();
        mapper.apply_map(&mut cpu, &mut ppu, &mut nt);
        assert_eq!(cpu.slot(0x6000).read.handler, ReadHandler::OpenBus);
        assert_eq!(cpu.slot(0x7FFF).read.handler, ReadHandler::OpenBus);
    }
}
