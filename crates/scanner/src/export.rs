//! MCEdit `.schematic` export (gzip-compressed NBT, "Alpha" materials).

use std::fs;
use std::io::Write;
use std::path::Path;

use fastnbt::ByteArray;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use xray_engine::XrayError;
use xray_engine::schematic::SchematicGrid;

/// Root compound of an MCEdit schematic.
#[derive(Serialize, Deserialize, Debug)]
pub struct SchematicNbt {
    #[serde(rename = "Width")]
    pub width: i16,
    #[serde(rename = "Height")]
    pub height: i16,
    #[serde(rename = "Length")]
    pub length: i16,
    #[serde(rename = "Materials")]
    pub materials: String,
    /// Low eight bits of each block id, `[y][z][x]`.
    #[serde(rename = "Blocks")]
    pub blocks: ByteArray,
    /// High four bits of each block id, two per byte. Only present when an id
    /// exceeds 255.
    #[serde(rename = "AddBlocks", default, skip_serializing_if = "Option::is_none")]
    pub add_blocks: Option<ByteArray>,
    #[serde(rename = "Data")]
    pub data: ByteArray,
    #[serde(rename = "Entities", default)]
    pub entities: Vec<fastnbt::Value>,
    #[serde(rename = "TileEntities", default)]
    pub tile_entities: Vec<fastnbt::Value>,
}

impl SchematicNbt {
    /// Pack a grid into the MCEdit layout.
    ///
    /// Fails when a dimension does not fit the format's 16-bit sizes.
    pub fn from_grid(grid: &SchematicGrid) -> Result<Self, String> {
        let dim = |name: &str, v: usize| {
            i16::try_from(v).map_err(|_| format!("{name} {v} exceeds the schematic size limit"))
        };

        let ids = grid.blocks();
        let blocks = ids.iter().map(|&id| (id & 0xFF) as u8 as i8).collect();
        let add_blocks = ids.iter().any(|&id| id > 0xFF).then(|| {
            let mut packed = vec![0u8; ids.len().div_ceil(2)];
            for (i, &id) in ids.iter().enumerate() {
                let high = ((id >> 8) & 0xF) as u8;
                if i & 1 == 0 {
                    packed[i >> 1] |= high;
                } else {
                    packed[i >> 1] |= high << 4;
                }
            }
            ByteArray::new(packed.into_iter().map(|b| b as i8).collect())
        });

        Ok(Self {
            width: dim("width", grid.width())?,
            height: dim("height", grid.height())?,
            length: dim("length", grid.length())?,
            materials: "Alpha".to_string(),
            blocks: ByteArray::new(blocks),
            add_blocks,
            data: ByteArray::new(grid.data().iter().map(|&d| d as i8).collect()),
            entities: Vec::new(),
            tile_entities: Vec::new(),
        })
    }
}

/// Write `grid` to `path` as a gzip-compressed schematic, creating parent
/// directories and overwriting any existing file.
pub fn write_schematic(grid: &SchematicGrid, path: &Path) -> Result<(), XrayError> {
    let encode_err = |reason: String| XrayError::Encode {
        path: path.to_path_buf(),
        reason,
    };

    let nbt = SchematicNbt::from_grid(grid).map_err(encode_err)?;
    let nbt_bytes = fastnbt::to_bytes(&nbt).map_err(|e| encode_err(e.to_string()))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&nbt_bytes)
        .map_err(|e| XrayError::io(path, e))?;
    let compressed = encoder.finish().map_err(|e| XrayError::io(path, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| XrayError::io(parent, e))?;
    }
    fs::write(path, compressed).map_err(|e| XrayError::io(path, e))?;

    tracing::info!(
        "Schematic {}x{}x{} written to {}",
        grid.width(),
        grid.height(),
        grid.length(),
        path.display()
    );
    Ok(())
}
