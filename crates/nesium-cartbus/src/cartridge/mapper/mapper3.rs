use std::borrow::Cow;

use crate::{
    bus::{BankSize, CpuBus, PpuBus},
    cartridge::{
        mapper::{Mapper, MapperCore, Port},
        mirroring::NametableMap,
        pcb::PcbClass,
        rom::RomImage,
    },
    irq::Interruptable,
    memory::cpu as cpu_mem,
};

// Mapper 3 – CNROM 8 KiB CHR banking.
//
// | Area | Address range     | Behaviour                                  | IRQ/Audio |
// |------|-------------------|--------------------------------------------|-----------|
// | CPU  | `$6000-$7FFF`     | Optional PRG-RAM                           | None      |
// | CPU  | `$8000-$FFFF`     | PRG-ROM, mirrored like NROM                | None      |
// | CPU  | `$8000-$FFFF`     | CHR bank select (write, bus conflicts)     | None      |
// | PPU  | `$0000-$1FFF`     | 8 KiB switchable CHR bank                  | None      |
// | PPU  | `$2000-$3EFF`     | Mirroring from header (no registers)       | None      |

const SUBMAPPER_NO_CONFLICTS: u16 = 1;

#[derive(Debug, Clone)]
pub struct Mapper3 {
    core: MapperCore,
    bus_conflicts: bool,
}

impl Mapper3 {
    pub fn new(rom: RomImage, pcb: PcbClass, prg_ram_size: usize) -> Self {
        let bus_conflicts = rom.info().submapper != SUBMAPPER_NO_CONFLICTS;
        Self {
            core: MapperCore::new(rom, pcb, prg_ram_size),
            bus_conflicts,
        }
    }

    pub fn selected_chr_bank(&self) -> u16 {
        self.core.chr_bank(0)
    }
}

impl Mapper for Mapper3 {
    fn core(&self) -> &MapperCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapperCore {
        &mut self.core
    }

    fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap) {
        let rom = cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END;
        self.core.map_prg_ram(cpu);
        self.core.map_prg_direct(cpu, rom.clone());
        self.core.map_registers(cpu, rom, Port::BankSelect);
        self.core.map_chr_banks(ppu, BankSize::K8);
        self.core.apply_controllable_mirror_map(nametables);
    }

    fn write_register(&mut self, port: Port, addr: u16, value: u8, _irq: &mut dyn Interruptable) {
        if port != Port::BankSelect {
            return;
        }
        let value = if self.bus_conflicts {
            let param = self.core.direct_param(addr - cpu_mem::PRG_ROM_START);
            value & self.core.read_prg_direct(param)
        } else {
            value
        };
        self.core.set_chr_bank(0, value as u16);
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("CNROM")
    }
}
