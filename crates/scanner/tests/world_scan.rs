//! World scans over a fake game root laid out like the client's cache.

use std::fs;
use std::path::{Path, PathBuf};

use xray_engine::XrayError;
use xray_engine::catalog::{BlockCatalogEntry, Catalog};
use xray_engine::world::block::BlockId;
use xray_engine::world::chunk::ChunkColumn;
use xray_engine::world::position::{ChunkPos, LocalBlockPos};
use xray_scanner::locator::{Dimension, RegionLocator};
use xray_scanner::region::{HEADER_BYTES, write_region};
use xray_scanner::scan::{FailurePolicy, ScanOptions, scan_region_files, scan_world};

fn catalog() -> Catalog {
    Catalog::from_entries(
        [
            BlockCatalogEntry::new(1, 0, "Stone"),
            BlockCatalogEntry::new(49, 0, "Obsidian"),
            BlockCatalogEntry::new(54, 0, "Chest"),
        ],
        "test",
    )
    .unwrap()
}

fn column_with(pos: ChunkPos, blocks: &[(u8, u8, u8, u16)]) -> ChunkColumn {
    let mut column = ChunkColumn::new(pos);
    for &(x, y, z, id) in blocks {
        column.set_block(LocalBlockPos { x, y, z }, BlockId(id), 0);
    }
    column
}

fn region_dir(root: &Path, world: &str, dimension: Dimension) -> PathBuf {
    let dir = RegionLocator::new(root)
        .worlds_root()
        .join(world)
        .join(dimension.subpath());
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Two region files for server "blue": one with a stone+chest chunk and an
/// all-air chunk, one with an obsidian chunk.
fn fake_world(root: &Path) -> Vec<PathBuf> {
    let dir = region_dir(root, "blue_1.6.4", Dimension::Overworld);
    let first = dir.join("r.0.0.mca");
    write_region(
        &first,
        &[
            column_with(ChunkPos::new(0, 0), &[(0, 0, 0, 1), (1, 0, 0, 1), (2, 64, 2, 54)]),
            column_with(ChunkPos::new(1, 0), &[]),
        ],
    )
    .unwrap();
    let second = dir.join("r.1.0.mca");
    write_region(&second, &[column_with(ChunkPos::new(33, 2), &[(5, 5, 5, 49)])]).unwrap();
    vec![first, second]
}

#[test]
fn locator_finds_server_worlds_only() {
    let root = tempfile::tempdir().unwrap();
    let expected = fake_world(root.path());
    let moon = region_dir(root.path(), "blue_1.6.4", Dimension::Lune).join("r.0.0.mca");
    write_region(&moon, &[]).unwrap();
    let other = region_dir(root.path(), "red_1.6.4", Dimension::Overworld).join("r.0.0.mca");
    write_region(&other, &[]).unwrap();
    fs::write(expected[0].with_extension("mcr"), b"old format").unwrap();

    let locator = RegionLocator::new(root.path());
    assert_eq!(locator.find_region_files("Blue", Dimension::Overworld).unwrap(), expected);
    assert_eq!(
        locator.find_region_files("blue", Dimension::from_name("atlantis")).unwrap(),
        expected
    );
    assert_eq!(locator.find_region_files("blue", Dimension::Lune).unwrap(), [moon]);
    assert!(locator.find_region_files("blue", Dimension::Mars).unwrap().is_empty());
    assert!(locator.find_region_files("green", Dimension::Overworld).unwrap().is_empty());
}

#[test]
fn scan_counts_every_non_empty_chunk() {
    let root = tempfile::tempdir().unwrap();
    fake_world(root.path());

    let result = scan_world(
        &RegionLocator::new(root.path()),
        "blue",
        Dimension::Overworld,
        &catalog(),
        ScanOptions::default(),
    )
    .unwrap();

    assert_eq!(result.chunks.len(), 2);
    let home = result.get("x:0, z:0").unwrap();
    assert_eq!(home.get("Stone"), Some(2));
    assert_eq!(home.get("Chest"), Some(1));
    // the all-air chunk at chunk (1, 0) leaves no entry
    assert!(result.get("x:16, z:0").is_none());
    assert_eq!(result.get("x:528, z:32").unwrap().get("Obsidian"), Some(1));

    let totals = result.totals();
    assert_eq!(totals.total(), 4);
    assert!(result.skipped.is_empty());
}

#[test]
fn parallel_scan_matches_sequential() {
    let root = tempfile::tempdir().unwrap();
    let paths = fake_world(root.path());
    let catalog = catalog();

    let sequential = scan_region_files(&paths, &catalog, ScanOptions::default()).unwrap();
    let parallel = scan_region_files(
        &paths,
        &catalog,
        ScanOptions {
            parallel: true,
            ..ScanOptions::default()
        },
    )
    .unwrap();

    assert_eq!(
        sequential.chunks.iter().collect::<Vec<_>>(),
        parallel.chunks.iter().collect::<Vec<_>>()
    );
}

#[test]
fn corrupt_file_aborts_or_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let mut paths = fake_world(root.path());
    let broken = paths[0].with_file_name("r.5.5.mca");
    fs::write(&broken, [7u8; 300]).unwrap();
    paths.insert(1, broken.clone());
    let catalog = catalog();

    for parallel in [false, true] {
        let options = ScanOptions {
            failure_policy: FailurePolicy::Abort,
            parallel,
        };
        let err = scan_region_files(&paths, &catalog, options).unwrap_err();
        assert!(matches!(err, XrayError::Format { ref path, .. } if *path == broken));

        let options = ScanOptions {
            failure_policy: FailurePolicy::SkipCorrupt,
            parallel,
        };
        let result = scan_region_files(&paths, &catalog, options).unwrap();
        assert_eq!(result.chunks.len(), 2);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, broken);
    }
}

#[test]
fn zero_length_chunk_is_skipped_not_fatal() {
    let root = tempfile::tempdir().unwrap();
    let mut paths = fake_world(root.path());
    let broken = paths[0].with_file_name("r.2.2.mca");
    let mut bytes = vec![0u8; HEADER_BYTES + 4096];
    bytes[..4].copy_from_slice(&[0, 0, 2, 1]);
    bytes[HEADER_BYTES + 4] = 2;
    fs::write(&broken, bytes).unwrap();
    paths.push(broken.clone());

    for parallel in [false, true] {
        let options = ScanOptions {
            failure_policy: FailurePolicy::SkipCorrupt,
            parallel,
        };
        let result = scan_region_files(&paths, &catalog(), options).unwrap();
        assert_eq!(result.chunks.len(), 2);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, broken);
        assert!(result.skipped[0].reason.contains("length is 0"));
    }
}

#[test]
fn empty_world_scans_to_nothing() {
    let root = tempfile::tempdir().unwrap();
    let result = scan_world(
        &RegionLocator::new(root.path()),
        "blue",
        Dimension::Edora,
        &catalog(),
        ScanOptions::default(),
    )
    .unwrap();
    assert!(result.is_empty());
}

#[test]
fn shipped_catalog_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/ids.json");
    let catalog = Catalog::load(&path).unwrap();
    assert_eq!(catalog.resolve_name(BlockId(49), 0), "Obsidian");
    assert_eq!(catalog.resolve_name(BlockId(35), 14), "Red Wool");
    assert_eq!(catalog.resolve_name(BlockId(17), 7), "Oak Wood");
}
