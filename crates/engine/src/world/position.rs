use serde::Serialize;

/// Absolute block position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

/// Chunk column position (each chunk is 16x16 blocks horizontally).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub const fn block_origin(&self, y: i64) -> BlockPos {
        BlockPos::new((self.x as i64) << 4, y, (self.z as i64) << 4)
    }

    /// Slot of this chunk inside its region file (0..32 each axis).
    pub const fn region_slot(&self) -> (usize, usize) {
        (self.x.rem_euclid(32) as usize, self.z.rem_euclid(32) as usize)
    }

    /// Location label used as the key of world scan results: `x:<bx>, z:<bz>`
    /// where `bx`/`bz` are the block coordinates of the chunk's corner.
    pub fn label(&self) -> String {
        let origin = self.block_origin(0);
        format!("x:{}, z:{}", origin.x, origin.z)
    }
}

/// Block position local to a chunk (x, z in 0..16, y in 0..256).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalBlockPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl LocalBlockPos {
    pub const fn section_index(&self) -> usize {
        (self.y >> 4) as usize
    }

    pub const fn section_local_y(&self) -> u8 {
        self.y & 0xF
    }

    /// World position of this cell inside chunk `chunk`.
    pub const fn to_world(&self, chunk: ChunkPos) -> BlockPos {
        let origin = chunk.block_origin(0);
        BlockPos::new(origin.x + self.x as i64, self.y as i64, origin.z + self.z as i64)
    }
}
