//! Load-time configuration for cartridges.

pub mod region;

pub use region::Region;

/// Options applied when a cartridge is inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// Region requested by the user; [`Region::Auto`] defers to the cartridge.
    pub region: Region,
    /// Apply per-title fixes from the built-in override database.
    pub use_database: bool,
    /// Work RAM size to use when the loader could not tell.
    pub prg_ram_size: Option<usize>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            region: Region::Auto,
            use_database: true,
            prg_ram_size: None,
        }
    }
}

impl LoadConfig {
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_database(mut self, enabled: bool) -> Self {
        self.use_database = enabled;
        self
    }

    pub fn with_prg_ram_size(mut self, size: usize) -> Self {
        self.prg_ram_size = Some(size);
        self
    }
}
