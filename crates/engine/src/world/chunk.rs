use super::block::{BlockId, BlockRecord};
use super::position::{ChunkPos, LocalBlockPos};
use crate::error::XrayError;

/// Number of blocks along each axis of a chunk section.
pub const SECTION_SIZE: usize = 16;
/// Total block count in one section.
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;
/// Byte length of a packed nibble array covering one section.
pub const NIBBLE_BYTES: usize = SECTION_VOLUME / 2;
/// Sections stacked in one chunk column.
pub const SECTIONS_PER_CHUNK: usize = 16;
/// Height of a chunk column in blocks.
pub const CHUNK_HEIGHT: usize = SECTION_SIZE * SECTIONS_PER_CHUNK;
/// Block count of a whole chunk column, air included.
pub const CHUNK_VOLUME: usize = SECTION_VOLUME * SECTIONS_PER_CHUNK;

/// A 16x16x16 cube of blocks in the legacy numeric layout.
///
/// Stored the way region files store it, YZX order (`y*256 + z*16 + x`):
/// one low byte per block id, an optional `add` nibble array holding bits
/// 8..12 of the id, and a `data` nibble array holding the metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkSection {
    y: i8,
    blocks: Box<[u8; SECTION_VOLUME]>,
    add: Option<Box<[u8; NIBBLE_BYTES]>>,
    data: Box<[u8; NIBBLE_BYTES]>,
}

impl ChunkSection {
    pub fn new_empty(y: i8) -> Self {
        Self {
            y,
            blocks: Box::new([0; SECTION_VOLUME]),
            add: None,
            data: Box::new([0; NIBBLE_BYTES]),
        }
    }

    /// Build a section from the raw arrays found in chunk NBT.
    pub fn from_raw(
        y: i8,
        blocks: Vec<u8>,
        add: Option<Vec<u8>>,
        data: Vec<u8>,
    ) -> Result<Self, XrayError> {
        let blocks = fixed::<SECTION_VOLUME>(y, "Blocks", blocks)?;
        let data = fixed::<NIBBLE_BYTES>(y, "Data", data)?;
        let add = add.map(|add| fixed::<NIBBLE_BYTES>(y, "Add", add)).transpose()?;
        Ok(Self {
            y,
            blocks,
            add,
            data,
        })
    }

    #[inline]
    const fn index(x: u8, y: u8, z: u8) -> usize {
        (y as usize) * SECTION_SIZE * SECTION_SIZE + (z as usize) * SECTION_SIZE + (x as usize)
    }

    pub fn y(&self) -> i8 {
        self.y
    }

    #[inline]
    pub fn get(&self, x: u8, y: u8, z: u8) -> (BlockId, u8) {
        self.get_index(Self::index(x, y, z))
    }

    #[inline]
    fn get_index(&self, i: usize) -> (BlockId, u8) {
        let high = self.add.as_deref().map_or(0, |add| nibble(add, i));
        let id = (self.blocks[i] as u16) | ((high as u16) << 8);
        (BlockId(id), nibble(&self.data[..], i))
    }

    /// Write a block. Ids are truncated to the 12 bits the format can hold.
    pub fn set(&mut self, x: u8, y: u8, z: u8, id: BlockId, data: u8) {
        let i = Self::index(x, y, z);
        self.blocks[i] = (id.0 & 0xFF) as u8;
        let high = ((id.0 >> 8) & 0xF) as u8;
        if high != 0 || self.add.is_some() {
            let add = self.add.get_or_insert_with(|| Box::new([0; NIBBLE_BYTES]));
            set_nibble(&mut add[..], i, high);
        }
        set_nibble(&mut self.data[..], i, data & 0xF);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == 0)
            && self.add.as_deref().is_none_or(|add| add.iter().all(|&b| b == 0))
    }

    pub fn blocks_bytes(&self) -> &[u8] {
        &self.blocks[..]
    }

    pub fn add_bytes(&self) -> Option<&[u8]> {
        self.add.as_deref().map(|add| &add[..])
    }

    pub fn data_bytes(&self) -> &[u8] {
        &self.data[..]
    }
}

fn fixed<const N: usize>(
    section_y: i8,
    field: &'static str,
    bytes: Vec<u8>,
) -> Result<Box<[u8; N]>, XrayError> {
    bytes
        .into_boxed_slice()
        .try_into()
        .map_err(|bytes: Box<[u8]>| XrayError::MalformedSection {
            section_y,
            field,
            expected: N,
            actual: bytes.len(),
        })
}

#[inline]
fn nibble(array: &[u8], i: usize) -> u8 {
    let byte = array[i >> 1];
    if i & 1 == 0 { byte & 0xF } else { byte >> 4 }
}

#[inline]
fn set_nibble(array: &mut [u8], i: usize, value: u8) {
    let byte = &mut array[i >> 1];
    if i & 1 == 0 {
        *byte = (*byte & 0xF0) | (value & 0xF);
    } else {
        *byte = (*byte & 0x0F) | ((value & 0xF) << 4);
    }
}

/// A 256-block-high column of sections, indexed by section Y (0..16).
///
/// Absent sections are all air.
#[derive(Clone, Debug)]
pub struct ChunkColumn {
    pos: ChunkPos,
    sections: [Option<ChunkSection>; SECTIONS_PER_CHUNK],
}

impl ChunkColumn {
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            sections: std::array::from_fn(|_| None),
        }
    }

    pub fn with_sections(
        pos: ChunkPos,
        sections: impl IntoIterator<Item = ChunkSection>,
    ) -> Result<Self, XrayError> {
        let mut column = Self::new(pos);
        for section in sections {
            column.insert_section(section)?;
        }
        Ok(column)
    }

    /// Place a section, replacing any section already stored at its Y.
    pub fn insert_section(&mut self, section: ChunkSection) -> Result<(), XrayError> {
        let slot = usize::try_from(section.y)
            .ok()
            .and_then(|y| self.sections.get_mut(y))
            .ok_or(XrayError::SectionOutOfRange {
                section_y: section.y,
            })?;
        *slot = Some(section);
        Ok(())
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn get_block(&self, pos: LocalBlockPos) -> (BlockId, u8) {
        match &self.sections[pos.section_index()] {
            Some(section) => section.get(pos.x, pos.section_local_y(), pos.z),
            None => (BlockId::AIR, 0),
        }
    }

    pub fn set_block(&mut self, pos: LocalBlockPos, id: BlockId, data: u8) {
        let section_idx = pos.section_index();
        self.sections[section_idx]
            .get_or_insert_with(|| ChunkSection::new_empty(section_idx as i8))
            .set(pos.x, pos.section_local_y(), pos.z, id, data);
    }

    pub fn sections(&self) -> impl Iterator<Item = &ChunkSection> {
        self.sections.iter().flatten()
    }

    pub fn section_count(&self) -> usize {
        self.sections().count()
    }

    /// Every cell of the column, air included, in world coordinates.
    ///
    /// Sections are visited bottom to top, each in storage order (y, z, x).
    pub fn blocks(&self) -> impl Iterator<Item = BlockRecord> + '_ {
        let pos = self.pos;
        self.sections
            .iter()
            .enumerate()
            .flat_map(move |(section_idx, section)| {
                (0..SECTION_VOLUME).map(move |i| {
                    let local = LocalBlockPos {
                        x: (i & 0xF) as u8,
                        y: (section_idx * SECTION_SIZE + (i >> 8)) as u8,
                        z: ((i >> 4) & 0xF) as u8,
                    };
                    let (id, data) = section
                        .as_ref()
                        .map_or((BlockId::AIR, 0), |s| s.get_index(i));
                    let world = local.to_world(pos);
                    BlockRecord::new(world.x, world.y, world.z, id, data)
                })
            })
    }
}

/// Materialize every block of `chunk`, air included.
pub fn stream_blocks(chunk: &ChunkColumn) -> Vec<BlockRecord> {
    let mut blocks = Vec::with_capacity(CHUNK_VOLUME);
    blocks.extend(chunk.blocks());
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_nibble_packing() {
        let mut section = ChunkSection::new_empty(0);
        section.set(0, 0, 0, BlockId(1), 3);
        section.set(1, 0, 0, BlockId(2), 12);
        assert_eq!(section.get(0, 0, 0), (BlockId(1), 3));
        assert_eq!(section.get(1, 0, 0), (BlockId(2), 12));
        assert_eq!(section.data_bytes()[0], 0xC3);
        assert!(section.add_bytes().is_none());
    }

    #[test]
    fn test_extended_ids_use_add_array() {
        let mut section = ChunkSection::new_empty(2);
        section.set(5, 6, 7, BlockId(0x4A2), 9);
        assert_eq!(section.get(5, 6, 7), (BlockId(0x4A2), 9));
        assert!(section.add_bytes().is_some());
        assert_eq!(section.blocks_bytes()[ChunkSection::index(5, 6, 7)], 0xA2);
    }

    #[test]
    fn test_from_raw_rejects_short_arrays() {
        let err = ChunkSection::from_raw(3, vec![0; 4096], None, vec![0; 100]).unwrap_err();
        match err {
            XrayError::MalformedSection {
                section_y,
                field,
                expected,
                actual,
            } => {
                assert_eq!(section_y, 3);
                assert_eq!(field, "Data");
                assert_eq!(expected, NIBBLE_BYTES);
                assert_eq!(actual, 100);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_from_raw_reads_add_and_data() {
        let mut blocks = vec![0u8; SECTION_VOLUME];
        let mut add = vec![0u8; NIBBLE_BYTES];
        let mut data = vec![0u8; NIBBLE_BYTES];
        blocks[1] = 0x10;
        add[0] = 0x20; // high nibble -> index 1
        data[0] = 0x50;
        let section = ChunkSection::from_raw(0, blocks, Some(add), data).unwrap();
        assert_eq!(section.get(1, 0, 0), (BlockId(0x210), 5));
        assert_eq!(section.get(0, 0, 0), (BlockId::AIR, 0));
    }

    #[test]
    fn test_section_out_of_range() {
        let mut column = ChunkColumn::new(ChunkPos::new(0, 0));
        assert!(matches!(
            column.insert_section(ChunkSection::new_empty(16)),
            Err(XrayError::SectionOutOfRange { section_y: 16 })
        ));
        assert!(column.insert_section(ChunkSection::new_empty(-1)).is_err());
        assert_eq!(column.section_count(), 0);
    }

    #[test]
    fn test_blocks_cover_full_volume() {
        let mut column = ChunkColumn::new(ChunkPos::new(2, -1));
        column.set_block(LocalBlockPos { x: 3, y: 100, z: 4 }, BlockId(56), 0);

        let blocks = stream_blocks(&column);
        assert_eq!(blocks.len(), CHUNK_VOLUME);

        let cells: HashSet<(i64, i64, i64)> = blocks.iter().map(|b| (b.x, b.y, b.z)).collect();
        assert_eq!(cells.len(), CHUNK_VOLUME);
        assert!(blocks.iter().all(|b| (32..48).contains(&b.x)));
        assert!(blocks.iter().all(|b| (-16..0).contains(&b.z)));
        assert!(blocks.iter().all(|b| (0..256).contains(&b.y)));

        let solid: Vec<_> = blocks.iter().filter(|b| !b.is_air()).collect();
        assert_eq!(solid.len(), 1);
        assert_eq!((solid[0].x, solid[0].y, solid[0].z), (35, 100, -12));
        assert_eq!(solid[0].id, BlockId(56));
    }
}
