//! Spatial data model: block ids and records, positions, legacy chunk columns.

pub mod block;
pub mod chunk;
pub mod position;

pub use block::{BlockId, BlockRecord};
pub use chunk::{ChunkColumn, ChunkSection, stream_blocks};
pub use position::{BlockPos, ChunkPos, LocalBlockPos};
