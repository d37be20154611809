use serde::Serialize;

use super::position::BlockPos;

/// Legacy numeric block identifier (pre-flattening worlds).
///
/// Chunk storage splits the id into a low byte and an optional high nibble,
/// so every id decoded from a region file fits in 12 bits. `BlockId::AIR` (0)
/// is the only id the engine interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The universal "empty" block.
    pub const AIR: BlockId = BlockId(0);

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One block occupying one cell.
///
/// Records streamed out of a chunk carry world coordinates; records handed to
/// the schematic serializer carry grid coordinates (see [`BlockRecord::relative_to`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRecord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub id: BlockId,
    /// Metadata nibble (0..=15).
    pub data: u8,
}

impl BlockRecord {
    pub const fn new(x: i64, y: i64, z: i64, id: BlockId, data: u8) -> Self {
        Self { x, y, z, id, data }
    }

    pub const fn pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }

    /// Same block, with coordinates re-based so that `origin` becomes (0, 0, 0).
    pub const fn relative_to(&self, origin: BlockPos) -> Self {
        Self {
            x: self.x - origin.x,
            y: self.y - origin.y,
            z: self.z - origin.z,
            id: self.id,
            data: self.data,
        }
    }

    pub const fn is_air(&self) -> bool {
        self.id.is_air()
    }
}
