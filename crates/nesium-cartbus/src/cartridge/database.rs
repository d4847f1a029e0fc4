//! Per-title fixes for cartridges whose headers misstate the hardware.
//!
//! Entries are keyed by the CRC32 of the PRG image. The table is built on
//! first use; a checksum listed twice keeps its first entry and the rest are
//! reported once through `tracing`.

use std::collections::{HashMap, hash_map::Entry};

use once_cell::sync::Lazy;

use crate::{
    cartridge::{mirroring::MirrorMode, rom::RomImage},
    config::Region,
};

/// Overrides for one title. `None` leaves the declared value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomOverride {
    pub crc32: u32,
    /// Only the first `n` bytes of PRG are real; the rest is overdump.
    pub prg_rom_size: Option<usize>,
    pub mirroring: Option<MirrorMode>,
    pub region: Option<Region>,
    pub mapper: Option<u16>,
    pub submapper: Option<u16>,
}

impl RomOverride {
    /// Raw mapper value meaning "keep the declared mapper".
    pub const NO_MAPPER: u16 = 0xFFFF;

    pub const fn new(crc32: u32) -> Self {
        Self {
            crc32,
            prg_rom_size: None,
            mirroring: None,
            region: None,
            mapper: None,
            submapper: None,
        }
    }

    pub const fn mirroring(mut self, mode: MirrorMode) -> Self {
        self.mirroring = Some(mode);
        self
    }

    pub const fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub const fn mapper(mut self, mapper: u16) -> Self {
        self.mapper = if mapper == Self::NO_MAPPER {
            None
        } else {
            Some(mapper)
        };
        self
    }

    pub const fn submapper(mut self, submapper: u16) -> Self {
        self.submapper = Some(submapper);
        self
    }

    pub const fn prg_rom_size(mut self, bytes: usize) -> Self {
        self.prg_rom_size = Some(bytes);
        self
    }

    /// Rewrites the declared fields of `rom` this entry overrides. The region
    /// is left to [`Region::resolve`], which ranks it against the user's
    /// preference.
    pub fn apply_to(&self, rom: &mut RomImage) {
        let crc32 = format!("{:08X}", self.crc32);

        if let Some(len) = self.prg_rom_size {
            if len < rom.prg().len() {
                tracing::debug!(
                    crc32 = %crc32,
                    from = rom.prg().len(),
                    to = len,
                    "override: PRG ROM size"
                );
                rom.truncate_prg(len);
            }
        }

        let info = rom.info_mut();
        if let Some(mode) = self.mirroring.filter(|mode| *mode != info.mirroring) {
            tracing::debug!(
                crc32 = %crc32,
                from = ?info.mirroring,
                to = ?mode,
                "override: mirroring"
            );
            info.mirroring = mode;
        }
        if let Some(mapper) = self.mapper.filter(|mapper| *mapper != info.mapper) {
            tracing::debug!(crc32 = %crc32, from = info.mapper, to = mapper, "override: mapper");
            info.mapper = mapper;
        }
        if let Some(submapper) = self.submapper.filter(|sub| *sub != info.submapper) {
            tracing::debug!(
                crc32 = %crc32,
                from = info.submapper,
                to = submapper,
                "override: submapper"
            );
            info.submapper = submapper;
        }
        if let Some(region) = self.region.filter(|region| *region != info.region) {
            tracing::debug!(
                crc32 = %crc32,
                declared = %info.region,
                to = %region,
                "override: region"
            );
        }
    }
}

/// Checksum-indexed override table.
#[derive(Debug, Clone, Default)]
pub struct OverrideDatabase {
    entries: HashMap<u32, RomOverride>,
    duplicates: Vec<u32>,
}

impl OverrideDatabase {
    pub fn from_entries(rows: &[RomOverride]) -> Self {
        let mut entries = HashMap::with_capacity(rows.len());
        let mut duplicates = Vec::new();

        for row in rows {
            match entries.entry(row.crc32) {
                Entry::Vacant(slot) => {
                    slot.insert(*row);
                }
                Entry::Occupied(_) => {
                    tracing::warn!(
                        crc32 = %format_args!("{:08X}", row.crc32),
                        "duplicate ROM override entry ignored"
                    );
                    duplicates.push(row.crc32);
                }
            }
        }

        Self {
            entries,
            duplicates,
        }
    }

    pub fn lookup(&self, crc32: u32) -> Option<&RomOverride> {
        self.entries.get(&crc32)
    }

    /// Checksums that appeared more than once while building the table.
    pub fn duplicates(&self) -> &[u32] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static DATABASE: Lazy<OverrideDatabase> = Lazy::new(|| OverrideDatabase::from_entries(BUILTIN));

/// The built-in table.
pub fn database() -> &'static OverrideDatabase {
    &DATABASE
}

pub fn lookup_override(crc32: u32) -> Option<&'static RomOverride> {
    DATABASE.lookup(crc32)
}

#[rustfmt::skip]
static BUILTIN: &[RomOverride] = &[
    // 3 in 1 Supergun (Asia) (Unl)
    RomOverride::new(0x789270E0).region(Region::Pal),
    // 25th Anniversary Super Mario Bros. (Europe) (Promo, Virtual Console)
    RomOverride::new(0x967A605F).region(Region::Pal),
    // Action in New York (Europe)
    RomOverride::new(0x2E1790A4).region(Region::Pal),
    // Addams Family, The - Pugsley's Scavenger Hunt (Europe) (Beta)
    RomOverride::new(0x6A741EC6).region(Region::Pal),
    // Addams Family, The - Pugsley's Scavenger Hunt (Europe)
    RomOverride::new(0x4FD3C549).region(Region::Pal),
    // Addams Family, The (Europe) (En,Fr,De)
    RomOverride::new(0x0FA94D88).region(Region::Pal),
    // Adventures in the Magic Kingdom (Europe)
    RomOverride::new(0x0E3A7F49).region(Region::Pal),
    // Adventures of Bayou Billy, The (Europe)
    RomOverride::new(0xFBFC6A6C).region(Region::Pal),
    // Adventures of Lolo (Europe)
    RomOverride::new(0x8E773E04).region(Region::Pal),
    // Adventures of Rad Gravity, The (Europe)
    RomOverride::new(0xE4C1A245).region(Region::Pal),
    // Air Fortress (Europe)
    RomOverride::new(0x991CBDF2).region(Region::Pal),
    // Airwolf (Europe)
    RomOverride::new(0xF71A9931).region(Region::Pal),
    // Aladdin (Europe)
    RomOverride::new(0x41D32FD7).region(Region::Pal),
    // Alpha Mission (Europe)
    RomOverride::new(0x3F8FCCF9).region(Region::Pal),
    // Anticipation (Europe)
    RomOverride::new(0xB391A86D).region(Region::Pal),
    // Asterix (Europe) (En,Fr,De,Es,It)
    RomOverride::new(0xED77B453).region(Region::Pal),
    // Attack of the Killer Tomatoes (Europe)
    RomOverride::new(0x58EC824F).region(Region::Pal),
    // Aussie Rules Footy (Australia)
    RomOverride::new(0xC004915A).region(Region::Pal),
    // Barbie (Europe)
    RomOverride::new(0x0538A4E9).region(Region::Pal),
    // Barker Bill's Trick Shooting (Europe)
    RomOverride::new(0x2970D05B).region(Region::Pal),
    // Battle of Olympus, The (Europe)
    RomOverride::new(0xA97567A4).region(Region::Pal),
    // Battletoads (Europe)
    RomOverride::new(0x524A5A32).region(Region::Pal),
    // Battletoads-Double Dragon (Europe)
    RomOverride::new(0x23D7D48F).region(Region::Pal),
    // Bigfoot (Europe)
    RomOverride::new(0x629E060B).region(Region::Pal),
    // Bionic Commando (Europe)
    RomOverride::new(0xFA7EE642).region(Region::Pal),
    // Blaster Master (Europe)
    RomOverride::new(0xB40870A2).region(Region::Pal),
    // Boulder Dash (Europe)
    RomOverride::new(0x54A0C2F0).region(Region::Pal),
    // Bubble Bobble (Europe)
    RomOverride::new(0x1F0D03F8).region(Region::Pal),
    // Castlevania (Europe)
    RomOverride::new(0xA93527E2).region(Region::Pal),
    // Castlevania II - Simon's Quest (Europe)
    RomOverride::new(0x72DDBD39).region(Region::Pal),
    // Championship Rally (Europe)
    RomOverride::new(0x10B4CE4D).region(Region::Pal),
    // Chessmaster, The (Europe)
    RomOverride::new(0x64C97986).region(Region::Pal),
    // Chevaliers du Zodiaque, Les - La Legende d'Or (France)
    RomOverride::new(0x98C546E0).region(Region::Dendy),
    // Chip 'n Dale - Rescue Rangers (Europe)
    RomOverride::new(0xAC7A54CC).region(Region::Pal),
    // Chip 'n Dale - Rescue Rangers 2 (Europe)
    RomOverride::new(0xCCE5A91F).region(Region::Pal),
    // City Connection (Europe)
    RomOverride::new(0xBBB3DE0A).region(Region::Pal),
    // Corvette ZR-1 Challenge (Europe)
    RomOverride::new(0x07637EE4).region(Region::Pal),
    // Cosmos Cop (Asia) (Mega Soft) (Unl)
    RomOverride::new(0x18EC3D59).region(Region::Pal),
    // Creatom (Spain) (Gluk Video) (Unl)
    RomOverride::new(0xA435A17F).region(Region::Pal),
    // Crime Busters (Unknown) (Unl)
    RomOverride::new(0x1A8B558E).region(Region::Pal),
    // Darkman (Europe)
    RomOverride::new(0x6D84EEE3).region(Region::Pal),
    // Darkwing Duck (Europe)
    RomOverride::new(0x895CBAF8).region(Region::Pal),
    // Defender of the Crown (France)
    RomOverride::new(0x2FD2E632).region(Region::Dendy),
    // Defender of the Crown (Europe)
    RomOverride::new(0x68F9B5F5).region(Region::Pal),
    // Die Hard (Europe)
    RomOverride::new(0xE45EC669).region(Region::Pal),
    // Double Dragon (Europe)
    RomOverride::new(0x144CA9E5).region(Region::Pal),
    // Double Dragon II - The Revenge (Europe)
    RomOverride::new(0x9ED831E7).region(Region::Pal),
    // Double Dragon III - The Sacred Stones (Europe)
    RomOverride::new(0xC7198F2D).region(Region::Pal),
    // Dynablaster (Europe)
    RomOverride::new(0x34BB757B).region(Region::Pal),
    // Eliminator Boat Duel (Europe)
    RomOverride::new(0x5202FD30).region(Region::Pal),
    // Elite (Europe) (En,Fr,De)
    RomOverride::new(0xA4BDCC1D).region(Region::Pal),
    // Faxanadu (Europe)
    RomOverride::new(0x76C161E3).region(Region::Pal),
    // Ferrari Grand Prix Challenge (Europe)
    RomOverride::new(0x8B73FB1B).region(Region::Pal),
    // Four Players' Tennis (Europe)
    RomOverride::new(0xE16F25CC).region(Region::Pal),
    // Guerrilla War (Europe)
    RomOverride::new(0xAECDBE24).region(Region::Pal),
    // Huang Di (Asia) (Unl)
    RomOverride::new(0xBC19F17E).region(Region::Pal),
    // Hudson Hawk (Europe)
    RomOverride::new(0x16F4A933).region(Region::Pal),
    // Ice Hockey (Europe)
    RomOverride::new(0xCCCC1034).region(Region::Pal),
    // Kid Icarus (Europe)
    RomOverride::new(0xD67FD6A6).region(Region::Pal),
    // Legend of Zelda, The (Europe)
    RomOverride::new(0xED7F5555).region(Region::Pal),
    // Lion King, The (Europe)
    RomOverride::new(0x89984244).region(Region::Pal),
    // Little Red Hood - Xiao Hong Mao (Asia) (Unl)
    RomOverride::new(0x166D036B).region(Region::Pal),
    // Maniac Mansion (Europe)
    RomOverride::new(0xF59CFC3D).region(Region::Pal),
    // Mega Man (Europe)
    RomOverride::new(0x94476A70).region(Region::Pal),
    // Metal Fighter (Asia) (Sachen) (Unl)
    RomOverride::new(0x51062125).region(Region::Pal),
    // Metal Gear (Europe)
    RomOverride::new(0x84C4A12E).region(Region::Pal),
    // Metroid (Europe)
    RomOverride::new(0x7751588D).region(Region::Pal),
    // Mind Blower Pak (Australia) (Unl)
    RomOverride::new(0xE7933763).region(Region::Pal),
    // Operation Wolf (Europe)
    RomOverride::new(0x54C34223).region(Region::Pal),
    // Parasol Stars - The Story of Bubble Bobble III (Europe) (Beta)
    RomOverride::new(0x381AAEF6).region(Region::Pal),
    // Policeman (Spain) (Gluk Video) (Unl)
    RomOverride::new(0x65FE1590).region(Region::Pal),
    // Probotector (Europe)
    RomOverride::new(0xB13F00D4).region(Region::Pal),
    // Qi Wang - Chinese Chess (Asia) (Unl)
    RomOverride::new(0x0744648C).region(Region::Pal),
    // San Guo Zhi - Qun Xiong Zheng Ba (Asia) (Unl)
    RomOverride::new(0x81E8992C).region(Region::Pal),
    // Solomon's Key (Europe)
    RomOverride::new(0x3067E376).region(Region::Pal),
    // Super Cartridge Ver 6 - 6 in 1 (Asia) (Unl)
    RomOverride::new(0xA08C46F5).region(Region::Pal),
    // Super Mario Bros. + Duck Hunt (Europe)
    RomOverride::new(0xE8F8F7A5).region(Region::Pal),
    // Total Funpak (Australia) (Unl)
    RomOverride::new(0x853C368D).region(Region::Pal),
    // Venice Beach Volleyball (Asia) (Unl)
    RomOverride::new(0x271FB5A4).region(Region::Pal),
    // Wei Lai Xiao Zi (Asia) (Unl)
    RomOverride::new(0xB242E6B6).region(Region::Pal),
    // Zhi Li Xiao Zhuang Yuan (China) (Unl)
    RomOverride::new(0x346709B4).region(Region::Pal),
    // Doraemon.
    RomOverride::new(0xB00ABE1C).mirroring(MirrorMode::Vertical),
    // Ms. Pac Man.
    RomOverride::new(0x4B2DCE64).mirroring(MirrorMode::Horizontal),
    // Zippy Race.
    RomOverride::new(0xE16BB5FE).mirroring(MirrorMode::Horizontal),
    // Wrecking Crew (JUE)
    RomOverride::new(0x4328B273).mapper(0),
];
