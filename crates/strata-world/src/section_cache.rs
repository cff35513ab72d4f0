//! Bounded write-back cache of resident sections.
//!
//! The [`SectionCache`] holds at most `capacity` sections. Acquiring a section
//! that is not resident evicts the least-recently-acquired one, saving it
//! synchronously first; a section is never dropped without a successful save.
//!
//! Recency is an access counter, not a wall clock, so eviction order is fully
//! deterministic. Hits resolve through a hash index; picking a victim scans
//! the slots.

use rustc_hash::FxHashMap;
use strata_coords::SectionCoord;

use crate::error::WorldError;
use crate::observer::SectionObserver;
use crate::section::Section;
use crate::storage::SectionBackend;

/// Number of sections kept resident by default.
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

#[derive(Debug)]
struct Slot {
    section: Section,
    /// Value of the access counter at the last acquire of this section.
    last_access: u64,
}

/// Fixed-capacity LRU cache of [`Section`]s with synchronous write-back.
#[derive(Debug)]
pub struct SectionCache {
    slots: Vec<Slot>,
    index: FxHashMap<SectionCoord, usize>,
    capacity: usize,
    clock: u64,
}

impl SectionCache {
    /// Creates an empty cache. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            index: FxHashMap::default(),
            capacity,
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident sections.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, coord: SectionCoord) -> bool {
        self.index.contains_key(&coord)
    }

    /// Resident section coordinates in slot order.
    pub fn resident(&self) -> impl Iterator<Item = SectionCoord> + '_ {
        self.slots.iter().map(|slot| slot.section.coord())
    }

    /// Looks at a resident section without touching its recency.
    pub fn peek(&self, coord: SectionCoord) -> Option<&Section> {
        self.index.get(&coord).map(|&i| &self.slots[i].section)
    }

    /// Returns the section at `coord`, loading it if needed.
    ///
    /// On a miss with a full cache the least-recently-acquired section is
    /// saved and evicted first. If that save fails the call returns the error
    /// and the victim stays resident, so nothing is lost and the call can be
    /// retried. A section with no persisted copy is created empty.
    pub fn acquire<B, O>(
        &mut self,
        coord: SectionCoord,
        backend: &mut B,
        observer: &mut O,
    ) -> Result<&mut Section, WorldError>
    where
        B: SectionBackend + ?Sized,
        O: SectionObserver + ?Sized,
    {
        let slot = match self.index.get(&coord) {
            Some(&slot) => {
                tracing::trace!(section = %coord, slot, "section cache hit");
                slot
            }
            None => {
                tracing::debug!(section = %coord, "section cache miss");
                self.evict_if_needed(backend, observer)?;
                self.load(coord, backend, observer)?
            }
        };

        self.clock += 1;
        let entry = &mut self.slots[slot];
        entry.last_access = self.clock;
        Ok(&mut entry.section)
    }

    /// Saves every resident section without evicting any.
    ///
    /// All sections are attempted; the first error encountered is returned.
    pub fn flush_all<B, O>(&mut self, backend: &mut B, observer: &mut O) -> Result<(), WorldError>
    where
        B: SectionBackend + ?Sized,
        O: SectionObserver + ?Sized,
    {
        let mut first_error = None;
        for slot in &mut self.slots {
            if let Err(e) = write_back(&mut slot.section, backend, observer) {
                tracing::error!(section = %slot.section.coord(), error = %e, "failed to save section");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Frees one slot if the cache is full, saving the victim first.
    fn evict_if_needed<B, O>(&mut self, backend: &mut B, observer: &mut O) -> Result<(), WorldError>
    where
        B: SectionBackend + ?Sized,
        O: SectionObserver + ?Sized,
    {
        if self.slots.len() < self.capacity {
            return Ok(());
        }
        let Some(victim) = self.least_recent() else {
            return Ok(());
        };

        let coord = self.slots[victim].section.coord();
        write_back(&mut self.slots[victim].section, backend, observer)?;

        self.slots.swap_remove(victim);
        self.index.remove(&coord);
        if let Some(moved) = self.slots.get(victim) {
            self.index.insert(moved.section.coord(), victim);
        }
        tracing::debug!(section = %coord, "evicted section");
        Ok(())
    }

    /// Loads or cold-creates `coord` into a new slot and returns its index.
    fn load<B, O>(
        &mut self,
        coord: SectionCoord,
        backend: &mut B,
        observer: &mut O,
    ) -> Result<usize, WorldError>
    where
        B: SectionBackend + ?Sized,
        O: SectionObserver + ?Sized,
    {
        let section = match backend.load(coord)? {
            Some(section) => section,
            None => {
                tracing::debug!(section = %coord, "creating empty section");
                Section::new(coord)
            }
        };
        observer.section_loaded(coord, section.data());

        let slot = self.slots.len();
        self.slots.push(Slot {
            section,
            last_access: self.clock,
        });
        self.index.insert(coord, slot);
        Ok(slot)
    }

    /// Slot with the oldest access; ties go to the lowest slot index.
    fn least_recent(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .min_by_key(|(i, slot)| (slot.last_access, *i))
            .map(|(i, _)| i)
    }
}

impl Default for SectionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// Captures the observer's data for `section` and persists it.
fn write_back<B, O>(section: &mut Section, backend: &mut B, observer: &mut O) -> Result<(), WorldError>
where
    B: SectionBackend + ?Sized,
    O: SectionObserver + ?Sized,
{
    let data = observer.section_saving(section.coord());
    section.set_data(data);
    backend.save(section)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
