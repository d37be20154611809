//! Whole-world scans: every region file of a server/dimension, every chunk in
//! it, one block count table per chunk.

use std::path::{Path, PathBuf};
use std::time::Instant;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use xray_engine::XrayError;
use xray_engine::catalog::Catalog;
use xray_engine::classify::{BlockCountTable, count_by_name};
use xray_engine::world::chunk::stream_blocks;

use crate::locator::{Dimension, RegionLocator};
use crate::region::extract_chunks;

/// What to do when a region file cannot be read or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing file and return its error. Parallel scans
    /// return the error of whichever failing file is reached first.
    #[default]
    Abort,
    /// Log the file, record it in [`WorldScanResult::skipped`] and keep going.
    SkipCorrupt,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub failure_policy: FailurePolicy,
    /// Process files on the rayon pool. Output is identical to a sequential scan.
    pub parallel: bool,
}

/// A region file left out of a scan under [`FailurePolicy::SkipCorrupt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRegion {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-chunk block counts keyed by chunk label (`x:<bx>, z:<bz>`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorldScanResult {
    pub chunks: IndexMap<String, BlockCountTable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRegion>,
}

impl WorldScanResult {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&BlockCountTable> {
        self.chunks.get(label)
    }

    /// Counts summed over every chunk.
    pub fn totals(&self) -> BlockCountTable {
        let mut totals = BlockCountTable::new();
        for table in self.chunks.values() {
            totals.merge(table);
        }
        totals
    }
}

type FileTables = Vec<(String, BlockCountTable)>;

/// Count tables for every non-empty chunk of one region file.
fn scan_file(path: &Path, catalog: &Catalog) -> Result<FileTables, XrayError> {
    let chunks = extract_chunks(path)?;
    let mut tables = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let blocks = stream_blocks(chunk);
        let table = count_by_name(&blocks, catalog);
        if !table.is_empty() {
            tables.push((chunk.pos().label(), table));
        }
    }
    tracing::debug!(
        "{}: {} of {} chunk(s) hold blocks",
        path.display(),
        tables.len(),
        chunks.len()
    );
    Ok(tables)
}

/// Scan an explicit list of region files.
///
/// Results are merged in the order of `paths`; a label seen twice keeps the
/// table of the later file.
pub fn scan_region_files(
    paths: &[PathBuf],
    catalog: &Catalog,
    options: ScanOptions,
) -> Result<WorldScanResult, XrayError> {
    let start = Instant::now();

    let outcomes: Vec<Result<FileTables, XrayError>> = if options.parallel {
        let scanned = paths.par_iter().map(|p| scan_file(p, catalog));
        match options.failure_policy {
            // stops handing out files once one fails
            FailurePolicy::Abort => scanned
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(Ok)
                .collect(),
            FailurePolicy::SkipCorrupt => scanned.collect(),
        }
    } else {
        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            let outcome = scan_file(path, catalog);
            let failed = outcome.is_err();
            outcomes.push(outcome);
            if failed && options.failure_policy == FailurePolicy::Abort {
                break;
            }
        }
        outcomes
    };

    let mut result = WorldScanResult::default();
    for (path, outcome) in paths.iter().zip(outcomes) {
        match outcome {
            Ok(tables) => result.chunks.extend(tables),
            Err(e) => match options.failure_policy {
                FailurePolicy::Abort => return Err(e),
                FailurePolicy::SkipCorrupt => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    result.skipped.push(SkippedRegion {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    tracing::info!(
        "Scanned {} region file(s): {} chunk(s) with blocks, {} skipped ({:.2?})",
        paths.len(),
        result.chunks.len(),
        result.skipped.len(),
        start.elapsed(),
    );
    Ok(result)
}

/// Scan every region file of `server` in `dimension`.
pub fn scan_world(
    locator: &RegionLocator,
    server: &str,
    dimension: Dimension,
    catalog: &Catalog,
    options: ScanOptions,
) -> Result<WorldScanResult, XrayError> {
    let paths = locator.find_region_files(server, dimension)?;
    tracing::info!(
        "Scanning {} region file(s) of {} ({})",
        paths.len(),
        server,
        dimension
    );
    scan_region_files(&paths, catalog, options)
}
