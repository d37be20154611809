//! Finds the region files the client cached for a server and dimension.
//!
//! Layout on disk:
//! `<game root>/versions/stable/saves/mapwriter_mp_worlds/<server>*/<dimension subpath>/*.mca`

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use xray_engine::XrayError;

/// Worlds directory relative to the game root.
const WORLDS_DIR: [&str; 4] = ["versions", "stable", "saves", "mapwriter_mp_worlds"];

/// A NationsGlory dimension and where its region files live inside a world
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    #[default]
    Overworld,
    Lune,
    Mars,
    Edora,
    EdoraAsteroide,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Overworld,
        Dimension::Lune,
        Dimension::Mars,
        Dimension::Edora,
        Dimension::EdoraAsteroide,
    ];

    /// Parse a user-supplied name. Unknown names fall back to the overworld.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "overworld" => Dimension::Overworld,
            "lune" | "moon" => Dimension::Lune,
            "mars" => Dimension::Mars,
            "edora" => Dimension::Edora,
            "edora asteroide" | "edora-asteroide" | "edora_asteroide" => Dimension::EdoraAsteroide,
            other => {
                tracing::debug!("Unknown dimension {:?}, using overworld", other);
                Dimension::Overworld
            }
        }
    }

    /// Directory holding the `.mca` files, relative to a world directory.
    pub const fn subpath(self) -> &'static str {
        match self {
            Dimension::Overworld => "region",
            Dimension::Lune => "DIM-28/region",
            Dimension::Mars => "DIM-29",
            Dimension::Edora => "DIM-31",
            Dimension::EdoraAsteroide => "DIM-32",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Dimension::Overworld => "overworld",
            Dimension::Lune => "lune",
            Dimension::Mars => "mars",
            Dimension::Edora => "edora",
            Dimension::EdoraAsteroide => "edora asteroide",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves server/dimension pairs to region files under one game root.
#[derive(Debug, Clone)]
pub struct RegionLocator {
    game_root: PathBuf,
}

impl RegionLocator {
    pub fn new(game_root: impl Into<PathBuf>) -> Self {
        Self {
            game_root: game_root.into(),
        }
    }

    /// The `mapwriter_mp_worlds` directory.
    pub fn worlds_root(&self) -> PathBuf {
        WORLDS_DIR.iter().fold(self.game_root.clone(), |p, part| p.join(part))
    }

    /// Every `.mca` file of `dimension` in worlds whose directory name starts
    /// with the lowercased `server`, sorted by path.
    ///
    /// Missing directories produce no matches rather than an error.
    pub fn find_region_files(
        &self,
        server: &str,
        dimension: Dimension,
    ) -> Result<Vec<PathBuf>, XrayError> {
        let prefix = server.to_lowercase();
        let worlds_root = self.worlds_root();

        let mut files = Vec::new();
        for world_dir in list_dir(&worlds_root)? {
            let matches_server = world_dir
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix));
            if !matches_server || !world_dir.is_dir() {
                continue;
            }

            let region_dir = dimension
                .subpath()
                .split('/')
                .fold(world_dir, |p, part| p.join(part));
            files.extend(
                list_dir(&region_dir)?
                    .into_iter()
                    .filter(|p| p.extension().is_some_and(|ext| ext == "mca") && p.is_file()),
            );
        }
        files.sort();

        tracing::debug!(
            "Found {} region file(s) for server {:?} in {}",
            files.len(),
            server,
            dimension
        );
        Ok(files)
    }
}

/// Entries of `dir`; empty when the directory does not exist.
fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, XrayError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Ok(Vec::new());
        }
        Err(e) => return Err(XrayError::io(dir, e)),
    };
    entries
        .map(|entry| entry.map(|e| e.path()).map_err(|e| XrayError::io(dir, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_subpaths() {
        let subpaths: Vec<&str> = Dimension::ALL.iter().map(|d| d.subpath()).collect();
        assert_eq!(
            subpaths,
            ["region", "DIM-28/region", "DIM-29", "DIM-31", "DIM-32"]
        );
    }

    #[test]
    fn test_dimension_aliases() {
        assert_eq!(Dimension::from_name("  Lune "), Dimension::Lune);
        assert_eq!(Dimension::from_name("moon"), Dimension::Lune);
        assert_eq!(Dimension::from_name("MARS"), Dimension::Mars);
        assert_eq!(Dimension::from_name("edora asteroide"), Dimension::EdoraAsteroide);
        assert_eq!(Dimension::from_name("edora_asteroide"), Dimension::EdoraAsteroide);
        for d in Dimension::ALL {
            assert_eq!(Dimension::from_name(d.name()), d);
        }
    }

    #[test]
    fn test_unknown_dimension_is_overworld() {
        assert_eq!(Dimension::from_name("atlantis"), Dimension::Overworld);
        assert_eq!(Dimension::from_name("atlantis").subpath(), "region");
        assert_eq!(Dimension::from_name(""), Dimension::Overworld);
    }

    #[test]
    fn test_worlds_root() {
        let locator = RegionLocator::new("/games/.NationsGlory");
        assert_eq!(
            locator.worlds_root(),
            Path::new("/games/.NationsGlory/versions/stable/saves/mapwriter_mp_worlds")
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let locator = RegionLocator::new("/definitely/not/a/game/root");
        let files = locator.find_region_files("blue", Dimension::Overworld).unwrap();
        assert!(files.is_empty());
    }
}
