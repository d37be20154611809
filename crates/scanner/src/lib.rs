//! Filesystem side of the xray tool: locating a client's cached region files,
//! extracting chunks from them, scanning whole worlds and exporting
//! schematics.

pub mod export;
pub mod locator;
pub mod region;
pub mod scan;
pub mod settings;

pub use locator::{Dimension, RegionLocator};
pub use scan::{FailurePolicy, ScanOptions, WorldScanResult};
