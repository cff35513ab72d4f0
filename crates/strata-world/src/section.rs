//! Dense per-section storage: cells, ground edges, decoration extras, and the
//! observer-owned data blob.
//!
//! A [`Section`] covers `SECTION_SIZE × SECTION_SIZE × SECTION_Z_SIZE` cells.
//! Each cell holds at most one primary [`ContentId`]; each ground column holds
//! at most one edge overlay; each cell holds an ordered list of extras.
//! All placement policy lives in the [`WorldStore`](crate::WorldStore).

use rustc_hash::FxHashMap;
use strata_coords::{LocalPos, SECTION_AREA, SECTION_VOLUME, SectionCoord};

use crate::registry::ContentId;

/// Free-form per-section state owned by the [`SectionObserver`](crate::SectionObserver).
///
/// The store never looks inside it; it is persisted as JSON alongside the grids.
pub type SectionData = serde_json::Map<String, serde_json::Value>;

/// One section of the world, resident in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    coord: SectionCoord,
    /// Primary content per cell, indexed by [`LocalPos::index`].
    cells: Vec<Option<ContentId>>,
    /// Edge overlay per ground column, indexed by [`LocalPos::column_index`].
    edges: Vec<Option<ContentId>>,
    /// Non-empty extra lists keyed by cell index. Most cells have none.
    extras: FxHashMap<usize, Vec<ContentId>>,
    data: SectionData,
}

impl Section {
    /// Creates an all-empty section with no data.
    pub fn new(coord: SectionCoord) -> Self {
        Self {
            coord,
            cells: vec![None; SECTION_VOLUME],
            edges: vec![None; SECTION_AREA],
            extras: FxHashMap::default(),
            data: SectionData::new(),
        }
    }

    pub fn coord(&self) -> SectionCoord {
        self.coord
    }

    // -- cells --

    pub fn cell(&self, pos: LocalPos) -> Option<ContentId> {
        self.cells[pos.index()]
    }

    /// Stores `content` at `pos` and returns what was there before.
    pub fn set_cell(&mut self, pos: LocalPos, content: Option<ContentId>) -> Option<ContentId> {
        std::mem::replace(&mut self.cells[pos.index()], content)
    }

    /// All cells in grid order.
    pub fn cells(&self) -> &[Option<ContentId>] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Option<ContentId>] {
        &mut self.cells
    }

    // -- edges --

    /// Edge overlay of the ground column containing `pos` (`pos.z` is ignored).
    pub fn edge(&self, pos: LocalPos) -> Option<ContentId> {
        self.edges[pos.column_index()]
    }

    /// Stores an edge overlay and returns the previous one.
    pub fn set_edge(&mut self, pos: LocalPos, content: Option<ContentId>) -> Option<ContentId> {
        std::mem::replace(&mut self.edges[pos.column_index()], content)
    }

    pub fn edges(&self) -> &[Option<ContentId>] {
        &self.edges
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [Option<ContentId>] {
        &mut self.edges
    }

    // -- extras --

    /// Extras at `pos` in insertion order. Empty if there are none.
    pub fn extras(&self, pos: LocalPos) -> &[ContentId] {
        self.extras
            .get(&pos.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends an extra to the end of the list at `pos`. Duplicates are allowed.
    pub fn push_extra(&mut self, pos: LocalPos, content: ContentId) {
        self.extras.entry(pos.index()).or_default().push(content);
    }

    /// Removes the first occurrence of `content` at `pos`.
    ///
    /// Returns `false` if `content` was not present.
    pub fn remove_extra(&mut self, pos: LocalPos, content: ContentId) -> bool {
        let index = pos.index();
        let Some(list) = self.extras.get_mut(&index) else {
            return false;
        };
        let Some(at) = list.iter().position(|&c| c == content) else {
            return false;
        };
        list.remove(at);
        if list.is_empty() {
            self.extras.remove(&index);
        }
        true
    }

    /// Removes every extra at `pos`. Returns `true` if any were removed.
    pub fn clear_extras(&mut self, pos: LocalPos) -> bool {
        self.extras.remove(&pos.index()).is_some()
    }

    /// Number of cells holding at least one extra.
    pub fn extra_cell_count(&self) -> usize {
        self.extras.len()
    }

    /// Extras at a raw cell index; used by the codec to walk the grid in order.
    pub(crate) fn extras_at(&self, index: usize) -> &[ContentId] {
        self.extras.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn set_extras_at(&mut self, index: usize, list: Vec<ContentId>) {
        if list.is_empty() {
            self.extras.remove(&index);
        } else {
            self.extras.insert(index, list);
        }
    }

    // -- data --

    pub fn data(&self) -> &SectionData {
        &self.data
    }

    pub fn set_data(&mut self, data: SectionData) {
        self.data = data;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
