//! Dense block grid for schematic export.

use crate::error::XrayError;
use crate::world::block::{BlockId, BlockRecord};
use crate::world::chunk::{CHUNK_HEIGHT, ChunkColumn, SECTION_SIZE};
use crate::world::position::{BlockPos, ChunkPos};

/// A `[y][z][x]` grid of block ids and metadata.
///
/// Height is always a full chunk column; width and length are sized from the
/// number of chunks fed in. Cells never written stay air with metadata 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchematicGrid {
    width: usize,
    height: usize,
    length: usize,
    blocks: Vec<u16>,
    data: Vec<u8>,
}

impl SchematicGrid {
    /// Empty grid sized for `chunk_count` chunks: `256 × 16n × 16n`.
    pub fn new(chunk_count: usize) -> Self {
        let side = SECTION_SIZE * chunk_count;
        let volume = CHUNK_HEIGHT * side * side;
        Self {
            width: side,
            height: CHUNK_HEIGHT,
            length: side,
            blocks: vec![0; volume],
            data: vec![0; volume],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// `(height, length, width)`, matching the `[y][z][x]` layout.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.length, self.width)
    }

    fn index(&self, x: i64, y: i64, z: i64) -> Option<usize> {
        let x = usize::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = usize::try_from(y).ok().filter(|&y| y < self.height)?;
        let z = usize::try_from(z).ok().filter(|&z| z < self.length)?;
        Some((y * self.length + z) * self.width + x)
    }

    /// Write one cell. Coordinates outside the grid are rejected, never
    /// clipped or wrapped.
    pub fn set(&mut self, x: i64, y: i64, z: i64, id: BlockId, data: u8) -> Result<(), XrayError> {
        let i = self.index(x, y, z).ok_or(XrayError::Bounds {
            x,
            y,
            z,
            width: self.width,
            height: self.height,
            length: self.length,
        })?;
        self.blocks[i] = id.0;
        self.data[i] = data;
        Ok(())
    }

    pub fn get(&self, x: i64, y: i64, z: i64) -> Option<(BlockId, u8)> {
        self.index(x, y, z)
            .map(|i| (BlockId(self.blocks[i]), self.data[i]))
    }

    /// Block id plane in `[y][z][x]` order.
    pub fn blocks(&self) -> &[u16] {
        &self.blocks
    }

    /// Metadata plane in `[y][z][x]` order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of non-air cells.
    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|&&id| id != 0).count()
    }
}

/// Build a grid from one block list per chunk.
///
/// Records must already carry grid-relative coordinates; any record falling
/// outside `256 × 16n × 16n` aborts with [`XrayError::Bounds`].
pub fn serialize<L: AsRef<[BlockRecord]>>(chunk_block_lists: &[L]) -> Result<SchematicGrid, XrayError> {
    let mut grid = SchematicGrid::new(chunk_block_lists.len());
    for list in chunk_block_lists {
        for block in list.as_ref() {
            grid.set(block.x, block.y, block.z, block.id, block.data)?;
        }
    }
    tracing::debug!(
        "Serialized {} chunk(s) into a {}x{}x{} grid",
        chunk_block_lists.len(),
        grid.width,
        grid.height,
        grid.length
    );
    Ok(grid)
}

/// Serialize decoded chunks, re-basing every block onto the smallest chunk
/// corner among them.
///
/// The chunks must fit inside the `16n × 16n` footprint measured from that
/// corner, e.g. a single chunk, or `n` chunks along one row.
pub fn serialize_chunks(chunks: &[ChunkColumn]) -> Result<SchematicGrid, XrayError> {
    let Some(origin) = chunks
        .iter()
        .map(|c| c.pos())
        .reduce(|a, b| ChunkPos::new(a.x.min(b.x), a.z.min(b.z)))
    else {
        return Ok(SchematicGrid::new(0));
    };
    let origin: BlockPos = origin.block_origin(0);

    let lists: Vec<Vec<BlockRecord>> = chunks
        .iter()
        .map(|chunk| chunk.blocks().map(|b| b.relative_to(origin)).collect())
        .collect();
    serialize(&lists)
}
