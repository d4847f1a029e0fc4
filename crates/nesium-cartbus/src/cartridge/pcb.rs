//! Normalising (mapper, submapper) pairs to physical board designs.
//!
//! One iNES mapper number can stand for several incompatible circuits. The
//! Konami VRC2/VRC4 boards are the classic case: mappers 21, 23 and 25 each
//! cover two chips whose register selector pins hang off different CPU
//! address lines, and only the NES 2.0 submapper tells them apart.
//!
//! | Mapper | Sub | Board  | Selector pins |
//! |--------|-----|--------|---------------|
//! | 21     | 1   | VRC4a  | A1, A2        |
//! | 21     | 2   | VRC4c  | A6, A7        |
//! | 22     | 0   | VRC2a  | A1, A0        |
//! | 23     | 1   | VRC4f  | A0, A1        |
//! | 23     | 2   | VRC4e  | A2, A3        |
//! | 23     | 3   | VRC2b  | A0, A1        |
//! | 25     | 1   | VRC4b  | A1, A0        |
//! | 25     | 2   | VRC4d  | A3, A2        |
//! | 25     | 3   | VRC2c  | A1, A0        |
//!
//! Submapper 0 (plain iNES dumps) lands on a combined class that decodes both
//! candidate wirings at once.
//!
//! MMC1 has the opposite problem: the header rarely names the SxROM board, but
//! the boards that rewire PRG A18 or the work RAM address lines can be told
//! apart by their memory sizes. [`refine_sxrom`] does that once the image is
//! known.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "savestate-serde",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum PcbClass {
    Nrom,
    Uxrom,
    Cnrom,
    Axrom,
    /// MMC1 board with no extra wiring (SAROM, SKROM, SLROM, SGROM, ...).
    Mmc1,
    /// MMC1, 8 KiB CHR RAM; CHR register bit 4 also disables work RAM.
    Snrom,
    /// MMC1, 512 KiB PRG; CHR register bit 4 drives PRG A18.
    Surom,
    /// MMC1, 16 KiB work RAM paged by CHR register bit 3.
    Sorom,
    /// MMC1, 512 KiB PRG and 32 KiB work RAM paged by CHR bits 2-3.
    Sxrom,
    /// MMC1 with a fixed 32 KiB PRG window (SEROM, SHROM, SH1ROM).
    Serom,
    Vrc2a,
    Vrc2b,
    Vrc2c,
    Vrc4a,
    Vrc4b,
    Vrc4c,
    Vrc4d,
    Vrc4e,
    Vrc4f,
    /// Mapper 21 without a submapper: VRC4a or VRC4c.
    Vrc4a4c,
    /// Mapper 23 without a submapper: VRC2b or VRC4e.
    Vrc2b4e,
    /// Mapper 25 without a submapper: VRC4b or VRC4d.
    Vrc4b4d,
    Vrc6a,
    Vrc6b,
    /// No row matched.
    Unknown,
}

impl PcbClass {
    pub fn name(self) -> &'static str {
        match self {
            PcbClass::Nrom => "NROM",
            PcbClass::Uxrom => "UxROM",
            PcbClass::Cnrom => "CNROM",
            PcbClass::Axrom => "AxROM",
            PcbClass::Mmc1 => "SxROM",
            PcbClass::Snrom => "SNROM",
            PcbClass::Surom => "SUROM",
            PcbClass::Sorom => "SOROM",
            PcbClass::Sxrom => "SXROM",
            PcbClass::Serom => "SEROM",
            PcbClass::Vrc2a => "VRC2a",
            PcbClass::Vrc2b => "VRC2b",
            PcbClass::Vrc2c => "VRC2c",
            PcbClass::Vrc4a => "VRC4a",
            PcbClass::Vrc4b => "VRC4b",
            PcbClass::Vrc4c => "VRC4c",
            PcbClass::Vrc4d => "VRC4d",
            PcbClass::Vrc4e => "VRC4e",
            PcbClass::Vrc4f => "VRC4f",
            PcbClass::Vrc4a4c => "VRC4a/VRC4c",
            PcbClass::Vrc2b4e => "VRC2b/VRC4e",
            PcbClass::Vrc4b4d => "VRC4b/VRC4d",
            PcbClass::Vrc6a => "VRC6a",
            PcbClass::Vrc6b => "VRC6b",
            PcbClass::Unknown => "unknown",
        }
    }

    pub fn is_mmc1(self) -> bool {
        matches!(
            self,
            PcbClass::Mmc1
                | PcbClass::Snrom
                | PcbClass::Surom
                | PcbClass::Sorom
                | PcbClass::Sxrom
                | PcbClass::Serom
        )
    }

    /// VRC2 chips: no IRQ, no PRG swap mode, 1-bit mirroring.
    pub fn is_vrc2(self) -> bool {
        matches!(self, PcbClass::Vrc2a | PcbClass::Vrc2b | PcbClass::Vrc2c)
    }

    /// Any member of the VRC2/VRC4 family.
    pub fn is_vrc2_4(self) -> bool {
        self.is_vrc2()
            || matches!(
                self,
                PcbClass::Vrc4a
                    | PcbClass::Vrc4b
                    | PcbClass::Vrc4c
                    | PcbClass::Vrc4d
                    | PcbClass::Vrc4e
                    | PcbClass::Vrc4f
                    | PcbClass::Vrc4a4c
                    | PcbClass::Vrc2b4e
                    | PcbClass::Vrc4b4d
            )
    }

    pub fn is_vrc6(self) -> bool {
        matches!(self, PcbClass::Vrc6a | PcbClass::Vrc6b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcbClassEntry {
    pub mapper: u16,
    /// `None` matches every submapper.
    pub submapper: Option<u16>,
    pub class: PcbClass,
}

const fn exact(mapper: u16, submapper: u16, class: PcbClass) -> PcbClassEntry {
    PcbClassEntry {
        mapper,
        submapper: Some(submapper),
        class,
    }
}

const fn any(mapper: u16, class: PcbClass) -> PcbClassEntry {
    PcbClassEntry {
        mapper,
        submapper: None,
        class,
    }
}

/// Searched top to bottom; exact rows must come before wildcards.
pub static PCB_TABLE: &[PcbClassEntry] = &[
    any(0, PcbClass::Nrom),
    exact(1, 5, PcbClass::Serom),
    any(1, PcbClass::Mmc1),
    any(2, PcbClass::Uxrom),
    any(3, PcbClass::Cnrom),
    any(7, PcbClass::Axrom),
    exact(22, 0, PcbClass::Vrc2a),
    exact(23, 3, PcbClass::Vrc2b),
    exact(25, 3, PcbClass::Vrc2c),
    exact(21, 1, PcbClass::Vrc4a),
    exact(25, 1, PcbClass::Vrc4b),
    exact(21, 2, PcbClass::Vrc4c),
    exact(25, 2, PcbClass::Vrc4d),
    exact(23, 2, PcbClass::Vrc4e),
    exact(23, 1, PcbClass::Vrc4f),
    any(24, PcbClass::Vrc6a),
    any(26, PcbClass::Vrc6b),
    any(21, PcbClass::Vrc4a4c),
    any(22, PcbClass::Vrc2a),
    any(23, PcbClass::Vrc2b4e),
    any(25, PcbClass::Vrc4b4d),
];

/// Board for a declared mapper/submapper pair; [`PcbClass::Unknown`] when
/// nothing matches.
pub fn classify_pcb(mapper: u16, submapper: u16) -> PcbClass {
    PCB_TABLE
        .iter()
        .find(|entry| {
            entry.mapper == mapper && entry.submapper.is_none_or(|sub| sub == submapper)
        })
        .map_or(PcbClass::Unknown, |entry| entry.class)
}

const SUROM_MIN_PRG: usize = 256 * 1024;
const SOROM_WORK_RAM: usize = 16 * 1024;
const SXROM_WORK_RAM: usize = 32 * 1024;

/// Picks the SxROM board for a generic MMC1 dump from the sizes its wiring
/// depends on. Any other class is returned unchanged.
pub fn refine_sxrom(pcb: PcbClass, prg_len: usize, chr_ram: bool, prg_ram_size: usize) -> PcbClass {
    if pcb != PcbClass::Mmc1 {
        return pcb;
    }
    if prg_ram_size >= SXROM_WORK_RAM {
        PcbClass::Sxrom
    } else if prg_ram_size >= SOROM_WORK_RAM {
        PcbClass::Sorom
    } else if prg_len > SUROM_MIN_PRG {
        PcbClass::Surom
    } else if chr_ram && prg_ram_size > 0 {
        PcbClass::Snrom
    } else {
        PcbClass::Mmc1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submapper_disambiguates_vrc_boards() {
        assert_eq!(classify_pcb(23, 1), PcbClass::Vrc4f);
        assert_eq!(classify_pcb(25, 3), PcbClass::Vrc2c);
        assert_ne!(classify_pcb(23, 1), classify_pcb(25, 3));
        assert_eq!(classify_pcb(21, 2), PcbClass::Vrc4c);
        assert_eq!(classify_pcb(25, 2), PcbClass::Vrc4d);
    }

    #[test]
    fn plain_ines_dumps_get_combined_classes() {
        assert_eq!(classify_pcb(21, 0), PcbClass::Vrc4a4c);
        assert_eq!(classify_pcb(23, 0), PcbClass::Vrc2b4e);
        assert_eq!(classify_pcb(25, 0), PcbClass::Vrc4b4d);
        assert_eq!(classify_pcb(22, 0), PcbClass::Vrc2a);
    }

    #[test]
    fn wildcard_rows_ignore_submapper() {
        assert_eq!(classify_pcb(1, 0), PcbClass::Mmc1);
        assert_eq!(classify_pcb(1, 3), PcbClass::Mmc1);
        assert_eq!(classify_pcb(0, 5), PcbClass::Nrom);
        assert_eq!(classify_pcb(24, 0), PcbClass::Vrc6a);
        assert_eq!(classify_pcb(26, 9), PcbClass::Vrc6b);
    }

    #[test]
    fn unknown_mapper_falls_to_default() {
        assert_eq!(classify_pcb(4, 0), PcbClass::Unknown);
        assert_eq!(classify_pcb(0xFFFF, 0xFFFF), PcbClass::Unknown);
    }

    #[test]
    fn exact_rows_precede_wildcards() {
        for (i, entry) in PCB_TABLE.iter().enumerate() {
            if entry.submapper.is_none() {
                continue;
            }
            let shadowed = PCB_TABLE[..i]
                .iter()
                .any(|earlier| earlier.mapper == entry.mapper && earlier.submapper.is_none());
            assert!(!shadowed, "row {i} is unreachable");
        }
    }

    #[test]
    fn sxrom_boards_follow_memory_sizes() {
        const K: usize = 1024;
        let refine = |prg, chr_ram, ram| refine_sxrom(PcbClass::Mmc1, prg, chr_ram, ram);
        assert_eq!(refine(512 * K, true, 32 * K), PcbClass::Sxrom);
        assert_eq!(refine(256 * K, false, 16 * K), PcbClass::Sorom);
        assert_eq!(refine(512 * K, true, 8 * K), PcbClass::Surom);
        assert_eq!(refine(128 * K, true, 8 * K), PcbClass::Snrom);
        assert_eq!(refine(128 * K, true, 0), PcbClass::Mmc1);
        assert_eq!(refine(256 * K, false, 8 * K), PcbClass::Mmc1);
    }

    #[test]
    fn refinement_leaves_declared_boards_alone() {
        assert_eq!(classify_pcb(1, 5), PcbClass::Serom);
        assert_eq!(refine_sxrom(PcbClass::Serom, 0x80000, true, 0x8000), PcbClass::Serom);
        assert_eq!(refine_sxrom(PcbClass::Uxrom, 0x80000, true, 0x8000), PcbClass::Uxrom);
    }

    #[test]
    fn family_predicates() {
        assert!(PcbClass::Surom.is_mmc1());
        assert!(!PcbClass::Surom.is_vrc2_4());
        assert!(PcbClass::Vrc2c.is_vrc2());
        assert!(PcbClass::Vrc2c.is_vrc2_4());
        assert!(PcbClass::Vrc4b4d.is_vrc2_4());
        assert!(!PcbClass::Vrc4b4d.is_vrc2());
        assert!(PcbClass::Vrc6b.is_vrc6());
        assert!(!PcbClass::Axrom.is_vrc2_4());
    }
}
