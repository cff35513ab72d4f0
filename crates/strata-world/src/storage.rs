//! On-disk section files and the authoring/runtime storage roots.
//!
//! Each section lives in its own file, named by [`section_file_name`].
//!
//! - **Authoring** mode reads and writes `<game_dir>/maps/`, the shipped map
//!   assets.
//! - **Runtime** mode writes only to `<user_dir>/` and reads from there first,
//!   falling back to `<game_dir>/maps/` for sections the player has never
//!   saved. The shipped copy is never modified in this mode.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use strata_config::IoMode;
use strata_coords::SectionCoord;

use crate::error::WorldError;
use crate::section::Section;
use crate::section_serial;

/// Subdirectory of the game directory holding the shipped section files.
pub const MAPS_DIR: &str = "maps";

/// Persistence seam used by [`SectionCache`](crate::SectionCache).
pub trait SectionBackend {
    /// Reads the persisted copy of a section. `Ok(None)` means none exists yet.
    fn load(&mut self, coord: SectionCoord) -> Result<Option<Section>, WorldError>;

    /// Persists a section, replacing any earlier copy at the write location.
    fn save(&mut self, section: &Section) -> Result<(), WorldError>;
}

/// Largest section coordinate that fits the short two-digit file name.
const SHORT_NAME_MAX: u64 = 0xff;

/// File name for a section: `map` followed by the coordinates as two
/// zero-padded hexadecimal fields.
///
/// Fields are two digits wide while both coordinates are at most `0xff`, and
/// sixteen digits wide otherwise. The two forms differ in length, so no two
/// sections share a name.
pub fn section_file_name(coord: SectionCoord) -> String {
    if coord.x <= SHORT_NAME_MAX && coord.y <= SHORT_NAME_MAX {
        format!("map{:02x}{:02x}", coord.x, coord.y)
    } else {
        format!("map{:016x}{:016x}", coord.x, coord.y)
    }
}

/// Section files under a game directory and a per-user save directory.
#[derive(Clone, Debug)]
pub struct SectionStorage {
    game_dir: PathBuf,
    user_dir: PathBuf,
    mode: IoMode,
}

impl SectionStorage {
    pub fn new(game_dir: impl Into<PathBuf>, user_dir: impl Into<PathBuf>, mode: IoMode) -> Self {
        Self {
            game_dir: game_dir.into(),
            user_dir: user_dir.into(),
            mode,
        }
    }

    pub fn mode(&self) -> IoMode {
        self.mode
    }

    /// Switches the root used by future loads and saves.
    pub fn set_mode(&mut self, mode: IoMode) {
        self.mode = mode;
    }

    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }

    pub fn user_dir(&self) -> &Path {
        &self.user_dir
    }

    /// Location of the shipped copy of a section.
    pub fn authoring_path(&self, coord: SectionCoord) -> PathBuf {
        self.game_dir.join(MAPS_DIR).join(section_file_name(coord))
    }

    /// Location of the player's saved copy of a section.
    pub fn user_path(&self, coord: SectionCoord) -> PathBuf {
        self.user_dir.join(section_file_name(coord))
    }

    /// Where a save of `coord` goes under the current mode.
    pub fn write_path(&self, coord: SectionCoord) -> PathBuf {
        match self.mode {
            IoMode::Authoring => self.authoring_path(coord),
            IoMode::Runtime => self.user_path(coord),
        }
    }

    /// Paths tried, in order, when loading `coord` under the current mode.
    pub fn read_paths(&self, coord: SectionCoord) -> Vec<PathBuf> {
        match self.mode {
            IoMode::Authoring => vec![self.authoring_path(coord)],
            IoMode::Runtime => vec![self.user_path(coord), self.authoring_path(coord)],
        }
    }
}

impl SectionBackend for SectionStorage {
    fn load(&mut self, coord: SectionCoord) -> Result<Option<Section>, WorldError> {
        for path in self.read_paths(coord) {
            let start = Instant::now();
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(section = %coord, path = %path.display(), "no section file");
                    continue;
                }
                Err(e) => return Err(WorldError::io(path, e)),
            };
            let section =
                section_serial::decode(coord, &bytes).map_err(|e| WorldError::codec(&path, e))?;
            tracing::info!(
                section = %coord,
                path = %path.display(),
                bytes = bytes.len(),
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "loaded section"
            );
            return Ok(Some(section));
        }
        Ok(None)
    }

    fn save(&mut self, section: &Section) -> Result<(), WorldError> {
        let start = Instant::now();
        let coord = section.coord();
        let path = self.write_path(coord);
        let bytes = section_serial::encode(section).map_err(|e| WorldError::codec(&path, e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WorldError::io(parent, e))?;
        }
        // Write beside the target and rename over it, so a failed write never
        // leaves a truncated section file behind.
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &bytes).map_err(|e| WorldError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| WorldError::io(&path, e))?;

        tracing::info!(
            section = %coord,
            path = %path.display(),
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "saved section"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
