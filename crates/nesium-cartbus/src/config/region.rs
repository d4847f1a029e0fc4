use core::{fmt, str::FromStr};

use crate::error::Error;

/// Region / timing profile a cartridge runs under.
///
/// Used both for what a ROM declares (`Auto` meaning "not stated") and for
/// what the user asks for (`Auto` meaning "let the cartridge decide").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "savestate-serde",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Region {
    #[default]
    Auto,
    /// North American / Japanese NTSC timing.
    Ntsc,
    /// European PAL timing.
    Pal,
    /// Dendy-style hybrid timing used by Famiclones.
    Dendy,
}

impl Region {
    /// Resolve the effective region.
    ///
    /// - A user preference other than `Auto` always wins.
    /// - Otherwise a database override beats the declared region.
    /// - A cartridge that states nothing runs as NTSC.
    pub fn resolve(preference: Region, database: Option<Region>, declared: Region) -> Region {
        match preference {
            Region::Auto => match database.unwrap_or(declared) {
                Region::Auto => Region::Ntsc,
                other => other,
            },
            other => other,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Region::Auto => "auto",
            Region::Ntsc => "ntsc",
            Region::Pal => "pal",
            Region::Dendy => "dendy",
        };
        f.write_str(s)
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Region::Auto),
            "ntsc" => Ok(Region::Ntsc),
            "pal" => Ok(Region::Pal),
            "dendy" => Ok(Region::Dendy),
            _ => Err(Error::UnknownRegion(s.to_string())),
        }
    }
}
