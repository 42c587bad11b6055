//! Built-in Booth Presets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DspError;

/// Named combination of echo, room and volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoothPreset {
    Normal,
    Echo,
    Room,
    Stage,
}

/// Levels a preset applies, in setter units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetLevels {
    pub echo: f32,
    pub room: f32,
    pub volume: f32,
}

/// List of built-in presets
pub const PRESETS: &[(BoothPreset, PresetLevels)] = &[
    (BoothPreset::Normal, PresetLevels { echo: 0.00, room: 0.10, volume: 1.05 }), // Least delay
    (BoothPreset::Echo, PresetLevels { echo: 0.65, room: 0.12, volume: 1.08 }),
    (BoothPreset::Room, PresetLevels { echo: 0.00, room: 1.00, volume: 1.06 }),
    (BoothPreset::Stage, PresetLevels { echo: 1.00, room: 0.35, volume: 1.15 }),
];

impl BoothPreset {
    pub const ALL: [BoothPreset; 4] = [
        BoothPreset::Normal,
        BoothPreset::Echo,
        BoothPreset::Room,
        BoothPreset::Stage,
    ];

    pub fn levels(self) -> PresetLevels {
        match self {
            BoothPreset::Normal => PRESETS[0].1,
            BoothPreset::Echo => PRESETS[1].1,
            BoothPreset::Room => PRESETS[2].1,
            BoothPreset::Stage => PRESETS[3].1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BoothPreset::Normal => "NORMAL",
            BoothPreset::Echo => "ECHO",
            BoothPreset::Room => "ROOM",
            BoothPreset::Stage => "STAGE",
        }
    }
}

impl fmt::Display for BoothPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoothPreset {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoothPreset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DspError::UnknownPreset(s.to_string()))
    }
}
