use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use xray_engine::catalog::Catalog;
use xray_engine::classify::{count_by_name, count_matching, positions_matching};
use xray_engine::schematic::serialize_chunks;
use xray_engine::world::block::BlockId;
use xray_engine::world::chunk::{ChunkColumn, stream_blocks};
use xray_engine::world::position::ChunkPos;
use xray_scanner::export::write_schematic;
use xray_scanner::locator::Dimension;
use xray_scanner::region::{extract_chunks, read_chunk_at};
use xray_scanner::scan::{FailurePolicy, ScanOptions, scan_world};
use xray_scanner::settings::Settings;

/// How many entries `find` and `extract` list before summarizing.
const FIND_LIST_LIMIT: usize = 20;
const EXTRACT_LIST_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "xray", about = "Index blocks in NationsGlory client region files")]
struct Cli {
    /// Game data directory (defaults to the launcher's .NationsGlory folder)
    #[arg(long, global = true, env = "NG_DIR")]
    game_root: Option<PathBuf>,

    /// Block catalog JSON (array of {item_id, metadata, name})
    #[arg(long, global = true, env = "XRAY_CATALOG")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ChunkArgs {
    /// Region file (.mca)
    #[arg(long)]
    file: PathBuf,
    /// Chunk X coordinate (taken modulo 32 inside the region)
    #[arg(long, allow_hyphen_values = true)]
    chunk_x: i32,
    /// Chunk Z coordinate (taken modulo 32 inside the region)
    #[arg(long, allow_hyphen_values = true)]
    chunk_z: i32,
}

#[derive(Subcommand)]
enum Command {
    /// List region files of a server and dimension
    Find {
        #[arg(long)]
        server: String,
        /// overworld, lune, mars, edora or "edora asteroide"
        #[arg(long, default_value = "overworld")]
        dimension: String,
    },
    /// List the chunks stored in a region file
    Extract {
        #[arg(long)]
        file: PathBuf,
    },
    /// Count blocks by name in one chunk
    Analyze {
        #[command(flatten)]
        chunk: ChunkArgs,
    },
    /// Count (and optionally locate) one block id/metadata in a chunk
    FindBlocks {
        #[command(flatten)]
        chunk: ChunkArgs,
        #[arg(long)]
        block_id: u16,
        #[arg(long, default_value_t = 0)]
        data: u8,
        /// Print the coordinates of every match
        #[arg(long, default_value_t = false)]
        positions: bool,
    },
    /// Export one chunk as an MCEdit schematic
    Schematic {
        #[command(flatten)]
        chunk: ChunkArgs,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Count blocks in every chunk of a server and dimension
    World {
        #[arg(long)]
        server: String,
        #[arg(long, default_value = "overworld")]
        dimension: String,
        /// Skip unreadable region files instead of stopping
        #[arg(long, default_value_t = false)]
        skip_corrupt: bool,
        /// Process region files in parallel
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Write the result as JSON to this file instead of printing a report
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Build a catalog from the NationsGUI mappings in the Forge client log
    ImportCatalog {
        /// Log to read (defaults to the game's ForgeModLoader-client-0.log)
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(long, short)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(cli.game_root, cli.catalog);

    match cli.command {
        Command::Find { server, dimension } => {
            let dimension = Dimension::from_name(&dimension);
            let files = settings
                .locator()?
                .find_region_files(&server, dimension)
                .with_context(|| format!("listing region files of {server}"))?;
            println!("Found {} MCA files:", files.len());
            for (i, file) in files.iter().take(FIND_LIST_LIMIT).enumerate() {
                println!("{}. {}", i + 1, file_name(file));
            }
            if files.len() > FIND_LIST_LIMIT {
                println!("...and {} more files", files.len() - FIND_LIST_LIMIT);
            }
        }

        Command::Extract { file } => {
            let chunks = extract_chunks(&file)
                .with_context(|| format!("extracting chunks from {}", file.display()))?;
            println!("Found {} chunks in {}", chunks.len(), file_name(&file));
            for (i, chunk) in chunks.iter().take(EXTRACT_LIST_LIMIT).enumerate() {
                let pos = chunk.pos();
                println!("{}. Chunk at (x:{}, z:{})", i + 1, pos.x, pos.z);
            }
        }

        Command::Analyze { chunk } => {
            let catalog = load_catalog(&settings)?;
            let column = load_chunk(&chunk)?;
            let table = count_by_name(&stream_blocks(&column), &catalog);
            println!(
                "Block counts for chunk (x:{}, z:{}):",
                chunk.chunk_x, chunk.chunk_z
            );
            for (name, count) in table.sorted_by_count() {
                println!("{name}: {count}");
            }
        }

        Command::FindBlocks {
            chunk,
            block_id,
            data,
            positions,
        } => {
            let catalog = load_catalog(&settings)?;
            let column = load_chunk(&chunk)?;
            let id = BlockId(block_id);
            let blocks = stream_blocks(&column);
            let name = catalog.resolve_name(id, data.into());

            let found = count_matching(id, data, &blocks);
            println!(
                "Found {} of {} in chunk (x:{}, z:{})",
                found, name, chunk.chunk_x, chunk.chunk_z
            );
            if positions {
                for pos in positions_matching(id, data, &blocks) {
                    println!("  {} {} {}", pos.x, pos.y, pos.z);
                }
            }
        }

        Command::Schematic { chunk, output } => {
            let column = load_chunk(&chunk)?;
            let grid = serialize_chunks(std::slice::from_ref(&column))
                .context("building schematic grid")?;
            write_schematic(&grid, &output)
                .with_context(|| format!("writing schematic {}", output.display()))?;
            println!("Schematic file generated successfully at {}", output.display());
        }

        Command::World {
            server,
            dimension,
            skip_corrupt,
            parallel,
            json,
        } => {
            let catalog = load_catalog(&settings)?;
            let dimension = Dimension::from_name(&dimension);
            let options = ScanOptions {
                failure_policy: if skip_corrupt {
                    FailurePolicy::SkipCorrupt
                } else {
                    FailurePolicy::Abort
                },
                parallel,
            };
            let result = scan_world(&settings.locator()?, &server, dimension, &catalog, options)
                .with_context(|| format!("scanning {server} ({dimension})"))?;

            if let Some(path) = json {
                let text = serde_json::to_string_pretty(&result)?;
                fs::write(&path, text)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Scan of {} chunks written to {}", result.chunks.len(), path.display());
                return Ok(());
            }

            for (label, table) in &result.chunks {
                println!("[{label}]");
                for (name, count) in table.sorted_by_count() {
                    println!("  {name}: {count}");
                }
            }
            println!("Totals over {} chunks:", result.chunks.len());
            for (name, count) in result.totals().sorted_by_count() {
                println!("  {name}: {count}");
            }
            for skipped in &result.skipped {
                println!("Skipped {}: {}", skipped.path.display(), skipped.reason);
            }
        }

        Command::ImportCatalog { log, output } => {
            let log = match log {
                Some(log) => log,
                None => settings.forge_log_path()?,
            };
            let text = fs::read_to_string(&log)
                .with_context(|| format!("reading Forge log {}", log.display()))?;
            let catalog = Catalog::from_forge_log(text.lines());
            if catalog.is_empty() {
                bail!("no item mappings found in {}", log.display());
            }
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output, catalog.to_json_string()?)
                .with_context(|| format!("writing catalog {}", output.display()))?;
            println!("Imported {} entries into {}", catalog.len(), output.display());
        }
    }

    Ok(())
}

fn load_catalog(settings: &Settings) -> Result<Catalog> {
    Catalog::load(&settings.catalog_path)
        .with_context(|| format!("loading catalog {}", settings.catalog_path.display()))
}

fn load_chunk(args: &ChunkArgs) -> Result<ChunkColumn> {
    let (x, z) = ChunkPos::new(args.chunk_x, args.chunk_z).region_slot();
    match read_chunk_at(&args.file, x, z)
        .with_context(|| format!("reading {}", args.file.display()))?
    {
        Some(column) => Ok(column),
        None => bail!(
            "no chunk stored at (x:{}, z:{}) in {}",
            args.chunk_x,
            args.chunk_z,
            args.file.display()
        ),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
