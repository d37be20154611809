//! Chunk extraction from Anvil region files (`.mca`) in the legacy numeric
//! block layout used by 1.6-era worlds.
//!
//! The location table is read here so that empty slots are skipped without
//! touching the payload; decompression goes through `fastanvil` and NBT
//! decoding through `fastnbt`.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use fastnbt::ByteArray;
use serde::{Deserialize, Serialize};

use xray_engine::XrayError;
use xray_engine::world::chunk::{ChunkColumn, ChunkSection, NIBBLE_BYTES};
use xray_engine::world::position::ChunkPos;

/// Chunks along each side of a region.
pub const REGION_SIDE: usize = 32;
/// Chunk slots in one region file.
pub const REGION_SLOTS: usize = REGION_SIDE * REGION_SIDE;
/// Bytes in one region sector.
pub const SECTOR_BYTES: usize = 4096;
/// Location table plus timestamp table.
pub const HEADER_BYTES: usize = 2 * SECTOR_BYTES;

// ── Header ──────────────────────────────────────────────────────────────────

/// One entry of the location table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkLocation {
    /// Offset of the chunk payload, in sectors from the start of the file.
    pub sector_offset: u32,
    /// Payload length in sectors.
    pub sector_count: u8,
}

impl ChunkLocation {
    /// `(0, 0)` marks a slot with no chunk stored.
    pub const fn is_empty(&self) -> bool {
        self.sector_offset == 0 && self.sector_count == 0
    }

    /// Check that the 5-byte chunk header this entry points at lies inside
    /// `file` and announces a payload that fits.
    pub fn check_payload(&self, file: &[u8]) -> Result<(), String> {
        let start = self.sector_offset as usize * SECTOR_BYTES;
        if start < HEADER_BYTES {
            return Err(format!("sector offset {} points into the header", self.sector_offset));
        }
        let Some(prefix) = file.get(start..start + 5) else {
            return Err(format!(
                "sector offset {} lies past the end of the file",
                self.sector_offset
            ));
        };
        let length = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if length == 0 {
            return Err("chunk length is 0".to_string());
        }
        if start + 4 + length > file.len() {
            return Err(format!("chunk length {length} runs past the end of the file"));
        }
        Ok(())
    }
}

/// The 1024 location entries at the start of a region file.
#[derive(Debug, Clone)]
pub struct RegionHeader {
    locations: Box<[ChunkLocation; REGION_SLOTS]>,
}

impl RegionHeader {
    /// Parse the location table from the start of a region file.
    ///
    /// Fails when fewer than [`HEADER_BYTES`] bytes are available.
    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < HEADER_BYTES {
            return Err(format!(
                "file is {} bytes, shorter than the {HEADER_BYTES}-byte header",
                bytes.len()
            ));
        }
        let mut locations = Box::new([ChunkLocation::default(); REGION_SLOTS]);
        for (slot, entry) in bytes[..SECTOR_BYTES].chunks_exact(4).enumerate() {
            locations[slot] = ChunkLocation {
                sector_offset: u32::from_be_bytes([0, entry[0], entry[1], entry[2]]),
                sector_count: entry[3],
            };
        }
        Ok(Self { locations })
    }

    /// Entry for region-relative slot `(x, z)`, both in `0..32`.
    pub fn location(&self, x: usize, z: usize) -> ChunkLocation {
        self.locations[x + z * REGION_SIDE]
    }

    pub fn is_occupied(&self, x: usize, z: usize) -> bool {
        !self.location(x, z).is_empty()
    }

    /// Occupied slots in sweep order (`x` outer, `z` inner).
    pub fn occupied_slots(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..REGION_SIDE)
            .flat_map(|x| (0..REGION_SIDE).map(move |z| (x, z)))
            .filter(|&(x, z)| self.is_occupied(x, z))
    }
}

// ── Chunk NBT structs (serde) ───────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Default)]
struct LegacyChunkNbt {
    #[serde(rename = "Level", default, skip_serializing_if = "Option::is_none")]
    level: Option<LevelNbt>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct LevelNbt {
    #[serde(rename = "xPos", default, skip_serializing_if = "Option::is_none")]
    x_pos: Option<i32>,
    #[serde(rename = "zPos", default, skip_serializing_if = "Option::is_none")]
    z_pos: Option<i32>,
    #[serde(rename = "Sections", default)]
    sections: Vec<SectionNbt>,
}

#[derive(Serialize, Deserialize, Debug)]
struct SectionNbt {
    #[serde(rename = "Y")]
    y: i8,
    #[serde(rename = "Blocks")]
    blocks: ByteArray,
    #[serde(rename = "Add", default, skip_serializing_if = "Option::is_none")]
    add: Option<ByteArray>,
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    data: Option<ByteArray>,
}

fn to_unsigned(array: ByteArray) -> Vec<u8> {
    array.into_inner().into_iter().map(|b| b as u8).collect()
}

fn to_signed(bytes: &[u8]) -> ByteArray {
    ByteArray::new(bytes.iter().map(|&b| b as i8).collect())
}

/// Decode one chunk payload. `Ok(None)` when the chunk lacks coordinates.
fn decode_chunk(nbt_bytes: &[u8]) -> Result<Option<ChunkColumn>, String> {
    let chunk: LegacyChunkNbt = fastnbt::from_bytes(nbt_bytes).map_err(|e| e.to_string())?;
    let Some(level) = chunk.level else {
        return Ok(None);
    };
    let (Some(x), Some(z)) = (level.x_pos, level.z_pos) else {
        return Ok(None);
    };

    let mut column = ChunkColumn::new(ChunkPos::new(x, z));
    for section in level.sections {
        let data = section
            .data
            .map(to_unsigned)
            .unwrap_or_else(|| vec![0; NIBBLE_BYTES]);
        let section = ChunkSection::from_raw(
            section.y,
            to_unsigned(section.blocks),
            section.add.map(to_unsigned),
            data,
        )
        .map_err(|e| e.to_string())?;
        column.insert_section(section).map_err(|e| e.to_string())?;
    }
    Ok(Some(column))
}

/// Encode a column in the legacy layout. All-air sections are left out.
fn encode_chunk(column: &ChunkColumn) -> LegacyChunkNbt {
    let pos = column.pos();
    let sections = column
        .sections()
        .filter(|s| !s.is_empty())
        .map(|s| SectionNbt {
            y: s.y(),
            blocks: to_signed(s.blocks_bytes()),
            add: s.add_bytes().map(to_signed),
            data: Some(to_signed(s.data_bytes())),
        })
        .collect();
    LegacyChunkNbt {
        level: Some(LevelNbt {
            x_pos: Some(pos.x),
            z_pos: Some(pos.z),
            sections,
        }),
    }
}

// ── Load ────────────────────────────────────────────────────────────────────

fn read_region(path: &Path) -> Result<(RegionHeader, Vec<u8>), XrayError> {
    let bytes = fs::read(path).map_err(|e| XrayError::io(path, e))?;
    let header = RegionHeader::parse(&bytes).map_err(|reason| XrayError::format(path, reason))?;
    Ok((header, bytes))
}

fn open_region(
    path: &Path,
    bytes: Vec<u8>,
) -> Result<fastanvil::Region<Cursor<Vec<u8>>>, XrayError> {
    fastanvil::Region::from_stream(Cursor::new(bytes))
        .map_err(|e| XrayError::format(path, format!("unreadable region: {e}")))
}

fn check_slot(
    path: &Path,
    header: &RegionHeader,
    bytes: &[u8],
    x: usize,
    z: usize,
) -> Result<(), XrayError> {
    header
        .location(x, z)
        .check_payload(bytes)
        .map_err(|reason| XrayError::format(path, format!("chunk slot ({x}, {z}): {reason}")))
}

fn read_slot(
    path: &Path,
    region: &mut fastanvil::Region<Cursor<Vec<u8>>>,
    x: usize,
    z: usize,
) -> Result<Option<ChunkColumn>, XrayError> {
    let Some(nbt_bytes) = region
        .read_chunk(x, z)
        .map_err(|e| XrayError::format(path, format!("chunk slot ({x}, {z}): {e}")))?
    else {
        return Ok(None);
    };
    decode_chunk(&nbt_bytes)
        .map_err(|reason| XrayError::format(path, format!("chunk slot ({x}, {z}): {reason}")))
}

/// Every chunk stored in the region file at `path` that carries coordinates.
///
/// Slots at the `(0, 0)` sentinel are skipped without decoding. Any chunk that
/// fails to decompress or decode fails the whole file.
pub fn extract_chunks(path: &Path) -> Result<Vec<ChunkColumn>, XrayError> {
    let start = Instant::now();
    let (header, bytes) = read_region(path)?;

    let slots: Vec<(usize, usize)> = header.occupied_slots().collect();
    if slots.is_empty() {
        tracing::debug!("{}: no chunks stored", path.display());
        return Ok(Vec::new());
    }
    for &(x, z) in &slots {
        check_slot(path, &header, &bytes, x, z)?;
    }

    let mut region = open_region(path, bytes)?;
    let mut chunks = Vec::with_capacity(slots.len());
    let mut dropped = 0usize;
    for (x, z) in slots {
        match read_slot(path, &mut region, x, z)? {
            Some(column) => chunks.push(column),
            None => dropped += 1,
        }
    }

    tracing::debug!(
        "{}: {} chunk(s), {} without coordinates ({:.2?})",
        path.display(),
        chunks.len(),
        dropped,
        start.elapsed(),
    );
    Ok(chunks)
}

/// The chunk in region-relative slot `(x, z)`, if one is stored there.
pub fn read_chunk_at(path: &Path, x: usize, z: usize) -> Result<Option<ChunkColumn>, XrayError> {
    if x >= REGION_SIDE || z >= REGION_SIDE {
        return Err(XrayError::format(
            path,
            format!("chunk slot ({x}, {z}) is outside the 32x32 region grid"),
        ));
    }
    let (header, bytes) = read_region(path)?;
    if !header.is_occupied(x, z) {
        return Ok(None);
    }
    check_slot(path, &header, &bytes, x, z)?;
    let mut region = open_region(path, bytes)?;
    read_slot(path, &mut region, x, z)
}

// ── Save ────────────────────────────────────────────────────────────────────

/// Write `chunks` into a new region file at `path`, each at the slot given by
/// its position modulo 32. An existing file is overwritten.
pub fn write_region(path: &Path, chunks: &[ChunkColumn]) -> Result<(), XrayError> {
    let encode_err = |reason: String| XrayError::Encode {
        path: path.to_path_buf(),
        reason,
    };

    let mut region = fastanvil::Region::new(Cursor::new(Vec::new()))
        .map_err(|e| encode_err(format!("creating region: {e}")))?;
    for column in chunks {
        let pos = column.pos();
        let nbt_bytes = fastnbt::to_bytes(&encode_chunk(column))
            .map_err(|e| encode_err(format!("serializing chunk ({}, {}): {e}", pos.x, pos.z)))?;
        let (x, z) = pos.region_slot();
        region
            .write_chunk(x, z, &nbt_bytes)
            .map_err(|e| encode_err(format!("writing chunk ({}, {}): {e}", pos.x, pos.z)))?;
    }

    let data = region
        .into_inner()
        .map_err(|e| encode_err(format!("flushing region: {e}")))?
        .into_inner();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| XrayError::io(parent, e))?;
    }
    fs::write(path, data).map_err(|e| XrayError::io(path, e))?;
    tracing::debug!("Wrote {} chunk(s) to {}", chunks.len(), path.display());
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
