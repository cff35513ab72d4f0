//! World-coordinate facade over the section cache.
//!
//! [`WorldStore`] is what the game and editor talk to. Every call takes world
//! coordinates, splits them into a section and a local offset, acquires the
//! section through the [`SectionCache`] (loading or evicting as needed), and
//! reads or writes one grid cell. It also tracks the caller's focus position
//! and which storage root ([`IoMode`]) is active.
//!
//! All I/O is synchronous and happens on the calling thread, only when a call
//! touches a section that is not resident or on [`WorldStore::save_all`].

use std::sync::Arc;

use strata_config::{Config, IoMode};
use strata_coords::{LocalPos, SectionCoord, WorldPos};

use crate::error::WorldError;
use crate::observer::SectionObserver;
use crate::registry::{ContentId, ContentRegistry};
use crate::section::Section;
use crate::section_cache::{DEFAULT_CACHE_CAPACITY, SectionCache};
use crate::storage::SectionStorage;

/// Focus position of a store that was not given one.
pub const DEFAULT_FOCUS: (u64, u64) = (5000, 5000);

/// Sectioned, cached, persistent world grid addressed by world coordinates.
pub struct WorldStore<O> {
    registry: Arc<ContentRegistry>,
    observer: O,
    storage: SectionStorage,
    cache: SectionCache,
    focus: (u64, u64),
}

impl<O: SectionObserver> WorldStore<O> {
    /// Creates a store with the default cache capacity.
    pub fn new(registry: Arc<ContentRegistry>, observer: O, storage: SectionStorage) -> Self {
        Self::with_capacity(registry, observer, storage, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(
        registry: Arc<ContentRegistry>,
        observer: O,
        storage: SectionStorage,
        capacity: usize,
    ) -> Self {
        Self {
            registry,
            observer,
            storage,
            cache: SectionCache::new(capacity),
            focus: DEFAULT_FOCUS,
        }
    }

    /// Creates a store from the storage, cache, and start settings in `config`.
    pub fn from_config(config: &Config, registry: Arc<ContentRegistry>, observer: O) -> Self {
        let storage = SectionStorage::new(
            &config.storage.game_dir,
            &config.storage.user_dir,
            config.storage.io_mode,
        );
        let mut store = Self::with_capacity(registry, observer, storage, config.cache.capacity);
        store.focus = (config.world.start[0], config.world.start[1]);
        store
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn storage(&self) -> &SectionStorage {
        &self.storage
    }

    pub fn io_mode(&self) -> IoMode {
        self.storage.mode()
    }

    /// Switches the storage root for future loads and saves.
    ///
    /// Resident sections stay cached; they are written to the new root when
    /// they are next saved.
    pub fn set_io_mode(&mut self, mode: IoMode) {
        tracing::debug!(?mode, "switching io mode");
        self.storage.set_mode(mode);
    }

    // -- focus --

    pub fn focus(&self) -> (u64, u64) {
        self.focus
    }

    /// Section containing the focus position.
    pub fn focus_section(&self) -> SectionCoord {
        strata_coords::section_of(self.focus.0, self.focus.1)
    }

    /// Moves the focus to `(x, y)`.
    ///
    /// Returns `true` only if both coordinates are non-negative and differ
    /// from the current focus. Never performs I/O.
    pub fn move_to(&mut self, x: i64, y: i64) -> bool {
        let (Ok(x), Ok(y)) = (u64::try_from(x), u64::try_from(y)) else {
            return false;
        };
        if (x, y) == self.focus {
            return false;
        }
        self.focus = (x, y);
        true
    }

    // -- cells --

    /// Places `content` in the cell at `(x, y, z)`, replacing what was there.
    pub fn set_cell(&mut self, x: i64, y: i64, z: i64, content: ContentId) -> Result<(), WorldError> {
        self.check_content(content)?;
        let (section, local) = self.locate(x, y, z)?;
        section.set_cell(local, Some(content));
        Ok(())
    }

    /// Clears the cell at `(x, y, z)`. Returns `false` if it was already empty.
    pub fn erase_cell(&mut self, x: i64, y: i64, z: i64) -> Result<bool, WorldError> {
        let (section, local) = self.locate(x, y, z)?;
        Ok(section.set_cell(local, None).is_some())
    }

    pub fn get_cell(&mut self, x: i64, y: i64, z: i64) -> Result<Option<ContentId>, WorldError> {
        let (section, local) = self.locate(x, y, z)?;
        Ok(section.cell(local))
    }

    // -- edges --

    /// Places an edge overlay on the ground column `(x, y)`.
    pub fn set_edge(&mut self, x: i64, y: i64, content: ContentId) -> Result<(), WorldError> {
        self.check_content(content)?;
        let (section, local) = self.locate(x, y, 0)?;
        section.set_edge(local, Some(content));
        Ok(())
    }

    /// Removes the edge overlay at `(x, y)`. Returns `false` if there was none.
    pub fn clear_edge(&mut self, x: i64, y: i64) -> Result<bool, WorldError> {
        let (section, local) = self.locate(x, y, 0)?;
        Ok(section.set_edge(local, None).is_some())
    }

    pub fn get_edge(&mut self, x: i64, y: i64) -> Result<Option<ContentId>, WorldError> {
        let (section, local) = self.locate(x, y, 0)?;
        Ok(section.edge(local))
    }

    // -- extras --

    /// Appends a decoration to the end of the cell's extra list.
    pub fn add_extra(&mut self, x: i64, y: i64, z: i64, content: ContentId) -> Result<(), WorldError> {
        self.check_content(content)?;
        let (section, local) = self.locate(x, y, z)?;
        section.push_extra(local, content);
        Ok(())
    }

    /// Removes the first occurrence of `content` from the cell's extra list.
    pub fn erase_extra(
        &mut self,
        x: i64,
        y: i64,
        z: i64,
        content: ContentId,
    ) -> Result<bool, WorldError> {
        let (section, local) = self.locate(x, y, z)?;
        Ok(section.remove_extra(local, content))
    }

    /// Empties the cell's extra list. Returns `true` if anything was removed.
    pub fn erase_all_extras(&mut self, x: i64, y: i64, z: i64) -> Result<bool, WorldError> {
        let (section, local) = self.locate(x, y, z)?;
        Ok(section.clear_extras(local))
    }

    /// The cell's extras in insertion order.
    pub fn get_extras(&mut self, x: i64, y: i64, z: i64) -> Result<&[ContentId], WorldError> {
        let (section, local) = self.locate(x, y, z)?;
        Ok(section.extras(local))
    }

    // -- persistence --

    /// Writes every resident section to the active root without evicting.
    ///
    /// The observer is asked for each section's current data first.
    pub fn save_all(&mut self) -> Result<(), WorldError> {
        tracing::info!(sections = self.cache.len(), mode = ?self.storage.mode(), "saving world");
        self.cache.flush_all(&mut self.storage, &mut self.observer)
    }

    /// Coordinates of the sections currently held in memory.
    pub fn resident_sections(&self) -> impl Iterator<Item = SectionCoord> + '_ {
        self.cache.resident()
    }

    /// Validates a world coordinate and acquires its section.
    fn locate(&mut self, x: i64, y: i64, z: i64) -> Result<(&mut Section, LocalPos), WorldError> {
        let pos =
            WorldPos::from_signed(x, y, z).ok_or(WorldError::InvalidCoordinate { x, y, z })?;
        let (coord, local) = strata_coords::split(pos);
        let section = self
            .cache
            .acquire(coord, &mut self.storage, &mut self.observer)?;
        Ok((section, local))
    }

    fn check_content(&self, content: ContentId) -> Result<(), WorldError> {
        if self.registry.contains(content) {
            Ok(())
        } else {
            Err(WorldError::UnknownContent(content))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
