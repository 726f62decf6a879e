//! Block material ids

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;

/// Material id of a single cell. `Air` marks absence.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockId {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Wood = 4,
    Leaves = 5,
    Planks = 6,
    Cobble = 7,
}

impl BlockId {
    /// Every non-air block, in id order
    pub const SOLID: [BlockId; 7] = [
        BlockId::Grass,
        BlockId::Dirt,
        BlockId::Stone,
        BlockId::Wood,
        BlockId::Leaves,
        BlockId::Planks,
        BlockId::Cobble,
    ];

    pub fn is_air(self) -> bool {
        self == BlockId::Air
    }

    /// Display color as 0xRRGGBB
    pub fn color_hex(self) -> u32 {
        match self {
            BlockId::Air => 0x000000,
            BlockId::Grass => 0x55aa55,
            BlockId::Dirt => 0x8b5a2b,
            BlockId::Stone => 0x888888,
            BlockId::Wood => 0x8a5c2e,
            BlockId::Leaves => 0x3fa73f,
            BlockId::Planks => 0xb48a56,
            BlockId::Cobble => 0x777777,
        }
    }

    /// Display color as 8-bit RGB
    pub fn color_rgb8(self) -> [u8; 3] {
        let hex = self.color_hex();
        [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
    }

    /// Display color as normalized RGB
    pub fn color(self) -> Vec3 {
        let [r, g, b] = self.color_rgb8();
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockId::Air => "Air",
            BlockId::Grass => "Grass",
            BlockId::Dirt => "Dirt",
            BlockId::Stone => "Stone",
            BlockId::Wood => "Wood",
            BlockId::Leaves => "Leaves",
            BlockId::Planks => "Planks",
            BlockId::Cobble => "Cobblestone",
        }
    }
}

impl TryFrom<u8> for BlockId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BlockId::Air),
            1 => Ok(BlockId::Grass),
            2 => Ok(BlockId::Dirt),
            3 => Ok(BlockId::Stone),
            4 => Ok(BlockId::Wood),
            5 => Ok(BlockId::Leaves),
            6 => Ok(BlockId::Planks),
            7 => Ok(BlockId::Cobble),
            other => Err(other),
        }
    }
}
