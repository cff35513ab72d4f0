//! Hook through which the owning game or editor layer exchanges per-section
//! state with the store.
//!
//! The store calls [`SectionObserver::section_loaded`] exactly once each time a
//! section becomes resident and [`SectionObserver::section_saving`] exactly once
//! each time a section is written, whether by eviction or by an explicit
//! [`WorldStore::save_all`](crate::WorldStore::save_all). The blob returned by
//! `section_saving` is what gets persisted; it is captured before encoding.

use rustc_hash::FxHashMap;
use strata_coords::SectionCoord;

use crate::section::SectionData;

/// Owner of the free-form [`SectionData`] attached to each section.
pub trait SectionObserver {
    /// A section was decoded or cold-created and is now resident.
    fn section_loaded(&mut self, coord: SectionCoord, data: &SectionData);

    /// A section is about to be written. Returns the data to persist with it.
    fn section_saving(&mut self, coord: SectionCoord) -> SectionData;
}

/// Observer that keeps each section's data exactly as it was loaded.
///
/// Useful for tools that edit the grids but have no state of their own; data
/// written by the game survives a load/save cycle untouched.
#[derive(Debug, Default)]
pub struct RetainObserver {
    data: FxHashMap<SectionCoord, SectionData>,
}

impl RetainObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data currently held for `coord`, if that section has been loaded.
    pub fn get(&self, coord: SectionCoord) -> Option<&SectionData> {
        self.data.get(&coord)
    }

    /// Mutable access, so a tool can edit the data before the next save.
    pub fn get_mut(&mut self, coord: SectionCoord) -> Option<&mut SectionData> {
        self.data.get_mut(&coord)
    }
}

impl SectionObserver for RetainObserver {
    fn section_loaded(&mut self, coord: SectionCoord, data: &SectionData) {
        self.data.insert(coord, data.clone());
    }

    fn section_saving(&mut self, coord: SectionCoord) -> SectionData {
        self.data.get(&coord).cloned().unwrap_or_default()
    }
}

impl<T: SectionObserver + ?Sized> SectionObserver for &mut T {
    fn section_loaded(&mut self, coord: SectionCoord, data: &SectionData) {
        (**self).section_loaded(coord, data);
    }

    fn section_saving(&mut self, coord: SectionCoord) -> SectionData {
        (**self).section_saving(coord)
    }
}

impl<T: SectionObserver + ?Sized> SectionObserver for Box<T> {
    fn section_loaded(&mut self, coord: SectionCoord, data: &SectionData) {
        (**self).section_loaded(coord, data);
    }

    fn section_saving(&mut self, coord: SectionCoord) -> SectionData {
        (**self).section_saving(coord)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
