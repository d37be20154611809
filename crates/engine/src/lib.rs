//! Data model and algorithms for indexing legacy (1.6-era) Minecraft worlds:
//! block catalog, chunk block streams, per-chunk aggregation and schematic
//! grids. No filesystem access lives here.

pub mod catalog;
pub mod classify;
pub mod error;
pub mod schematic;
pub mod world;

pub use catalog::{BlockCatalogEntry, Catalog};
pub use classify::BlockCountTable;
pub use error::XrayError;
pub use schematic::SchematicGrid;
