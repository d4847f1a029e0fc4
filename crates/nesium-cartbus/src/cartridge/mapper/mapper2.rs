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

// Mapper 2 – UxROM simple 16 KiB PRG banking.
//
// | Area | Address range     | Behaviour                                  | IRQ/Audio |
// |------|-------------------|--------------------------------------------|-----------|
// | CPU  | `$6000-$7FFF`     | Optional PRG-RAM (when present)            | None      |
// | CPU  | `$8000-$BFFF`     | 16 KiB switchable PRG-ROM bank             | None      |
// | CPU  | `$C000-$FFFF`     | 16 KiB fixed PRG-ROM bank (last)           | None      |
// | CPU  | `$8000-$FFFF`     | Bank select (write, bus conflicts)         | None      |
// | PPU  | `$0000-$1FFF`     | CHR ROM/RAM (no mapper-side CHR banking)   | None      |
// | PPU  | `$2000-$3EFF`     | Mirroring from header (no registers)       | None      |

/// CPU `$C000`: boundary between the switchable 16 KiB window (`$8000-$BFFF`)
/// and the fixed 16 KiB window mapped to the last PRG bank.
const UXROM_FIXED_WINDOW_START: u16 = 0xC000;

/// NES 2.0 submapper 1: the board drives the data bus itself, no conflicts.
const SUBMAPPER_NO_CONFLICTS: u16 = 1;

#[derive(Debug, Clone)]
pub struct Mapper2 {
    core: MapperCore,
    /// Covers every bank the image has, rounded up to a power of two.
    select_mask: u16,
    bus_conflicts: bool,
}

impl Mapper2 {
    pub fn new(rom: RomImage, pcb: PcbClass, prg_ram_size: usize) -> Self {
        let bus_conflicts = rom.info().submapper != SUBMAPPER_NO_CONFLICTS;
        let mut core = MapperCore::new(rom, pcb, prg_ram_size);
        core.set_fixed_bank(BankSize::K16);

        let banks = core.prg_bank_count(BankSize::K16);
        let select_mask = (banks.next_power_of_two() - 1).min(u16::MAX as usize) as u16;

        Self {
            core,
            select_mask,
            bus_conflicts,
        }
    }

    pub fn selected_bank(&self) -> u16 {
        self.core.prg_bank(0)
    }

    /// The ROM byte visible at `addr`, which the board ANDs with the CPU's
    /// value on conflicting writes.
    fn rom_byte(&self, addr: u16) -> u8 {
        if addr < UXROM_FIXED_WINDOW_START {
            self.core
                .read_prg_bank(0, BankSize::K16, addr - cpu_mem::PRG_ROM_START)
        } else {
            let param = self.core.fixed_param(addr - UXROM_FIXED_WINDOW_START);
            self.core.read_prg_fixed(param)
        }
    }
}

impl Mapper for Mapper2 {
    fn core(&self) -> &MapperCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapperCore {
        &mut self.core
    }

    fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap) {
        self.core.map_prg_ram(cpu);
        self.core.map_prg_bank(
            cpu,
            cpu_mem::PRG_ROM_START..=UXROM_FIXED_WINDOW_START - 1,
            0,
            BankSize::K16,
        );
        self.core
            .map_prg_fixed(cpu, UXROM_FIXED_WINDOW_START..=cpu_mem::CPU_ADDR_END);
        self.core.map_registers(
            cpu,
            cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END,
            Port::BankSelect,
        );
        self.core.map_chr_direct(ppu);
        self.core.apply_controllable_mirror_map(nametables);
    }

    fn write_register(&mut self, port: Port, addr: u16, value: u8, _irq: &mut dyn Interruptable) {
        if port != Port::BankSelect {
            return;
        }
        let value = if self.bus_conflicts {
            value & self.rom_byte(addr)
        } else {
            value
        };
        self.core.set_prg_bank(0, value as u16 & self.select_mask);
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("UxROM")
    }
}
