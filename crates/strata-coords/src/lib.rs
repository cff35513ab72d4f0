//! World, section, and section-local coordinate spaces.
//!
//! The world is an unbounded non-negative X/Y plane with a fixed vertical
//! extent. It is partitioned into square sections of [`SECTION_SIZE`] cells
//! per side and [`SECTION_Z_SIZE`] cells tall.
//!
//! # Coordinate Spaces
//!
//! 1. **World Space**: [`WorldPos`], absolute cell coordinates
//! 2. **Section Space**: [`SectionCoord`], index of the section on the X/Y grid
//! 3. **Local Space**: [`LocalPos`], offset of a cell inside its section
//!
//! [`split`] and [`join`] convert between world space and the
//! `(section, local)` pair. Both are derived from the same division so that
//! `join(split(p)) == p` for every valid position.
//!
//! Negative world coordinates are not part of any space here. Callers holding
//! signed input validate it with [`WorldPos::from_signed`] first.

use std::fmt;

/// Side length of a section on the X and Y axes, in cells.
pub const SECTION_SIZE: usize = 200;

/// Vertical extent of the world (and of every section), in cells.
pub const SECTION_Z_SIZE: usize = 24;

/// Number of ground columns in a section (`SECTION_SIZE²`).
pub const SECTION_AREA: usize = SECTION_SIZE * SECTION_SIZE;

/// Number of cells in a section (`SECTION_SIZE² × SECTION_Z_SIZE`).
pub const SECTION_VOLUME: usize = SECTION_AREA * SECTION_Z_SIZE;

const SIZE: u64 = SECTION_SIZE as u64;

/// An absolute cell position in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldPos {
    pub x: u64,
    pub y: u64,
    pub z: u8,
}

impl WorldPos {
    /// Creates a world position. `z` must be below [`SECTION_Z_SIZE`].
    pub fn new(x: u64, y: u64, z: u8) -> Self {
        debug_assert!((z as usize) < SECTION_Z_SIZE);
        Self { x, y, z }
    }

    /// Validates a signed coordinate triple.
    ///
    /// Returns `None` for negative `x`/`y` or for `z` outside
    /// `[0, SECTION_Z_SIZE)`.
    pub fn from_signed(x: i64, y: i64, z: i64) -> Option<Self> {
        let x = u64::try_from(x).ok()?;
        let y = u64::try_from(y).ok()?;
        if !(0..SECTION_Z_SIZE as i64).contains(&z) {
            return None;
        }
        Some(Self { x, y, z: z as u8 })
    }

    /// The section containing this position.
    pub fn section(&self) -> SectionCoord {
        section_of(self.x, self.y)
    }

    /// This position expressed relative to its section's origin.
    pub fn local(&self) -> LocalPos {
        LocalPos {
            x: (self.x % SIZE) as u16,
            y: (self.y % SIZE) as u16,
            z: self.z,
        }
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Identifies a section on the X/Y section grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionCoord {
    pub x: u64,
    pub y: u64,
}

impl SectionCoord {
    pub fn new(x: u64, y: u64) -> Self {
        Self { x, y }
    }

    /// World X/Y of the section's `(0, 0)` local column.
    pub fn origin(&self) -> (u64, u64) {
        (self.x * SIZE, self.y * SIZE)
    }
}

impl fmt::Display for SectionCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A cell position inside a section.
///
/// `x` and `y` are in `[0, SECTION_SIZE)`, `z` is in `[0, SECTION_Z_SIZE)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: u16,
    pub y: u16,
    pub z: u8,
}

impl LocalPos {
    pub fn new(x: u16, y: u16, z: u8) -> Self {
        debug_assert!((x as usize) < SECTION_SIZE && (y as usize) < SECTION_SIZE);
        debug_assert!((z as usize) < SECTION_Z_SIZE);
        Self { x, y, z }
    }

    /// Linear index into a dense `SECTION_VOLUME` grid.
    ///
    /// Layout is x-major, then y, then z: `(x * SECTION_SIZE + y) * SECTION_Z_SIZE + z`.
    #[inline]
    pub fn index(&self) -> usize {
        self.column_index() * SECTION_Z_SIZE + self.z as usize
    }

    /// Linear index of this position's ground column in a `SECTION_AREA` grid.
    #[inline]
    pub fn column_index(&self) -> usize {
        self.x as usize * SECTION_SIZE + self.y as usize
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index < SECTION_VOLUME);
        let z = index % SECTION_Z_SIZE;
        let column = index / SECTION_Z_SIZE;
        Self {
            x: (column / SECTION_SIZE) as u16,
            y: (column % SECTION_SIZE) as u16,
            z: z as u8,
        }
    }
}

/// Section containing the world column `(x, y)`.
#[inline]
pub fn section_of(x: u64, y: u64) -> SectionCoord {
    SectionCoord {
        x: x / SIZE,
        y: y / SIZE,
    }
}

/// Decomposes a world position into its section and the local offset within it.
#[inline]
pub fn split(pos: WorldPos) -> (SectionCoord, LocalPos) {
    (pos.section(), pos.local())
}

/// Reassembles a world position from a section and a local offset.
#[inline]
pub fn join(section: SectionCoord, local: LocalPos) -> WorldPos {
    let (ox, oy) = section.origin();
    WorldPos {
        x: ox + local.x as u64,
        y: oy + local.y as u64,
        z: local.z,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_of_boundaries() {
        assert_eq!(section_of(0, 0), SectionCoord::new(0, 0));
        assert_eq!(section_of(199, 199), SectionCoord::new(0, 0));
        assert_eq!(section_of(200, 0), SectionCoord::new(1, 0));
        assert_eq!(section_of(0, 200), SectionCoord::new(0, 1));
        assert_eq!(section_of(5000, 5000), SectionCoord::new(25, 25));
    }

    #[test]
    fn test_local_wraps_at_section_size() {
        let local = WorldPos::new(210, 399, 7).local();
        assert_eq!(local, LocalPos::new(10, 199, 7));
    }

    #[test]
    fn test_join_split_roundtrip() {
        for &(x, y) in &[(0u64, 0u64), (10, 10), (199, 200), (4321, 98765), (u64::MAX, 3)] {
            for z in [0u8, 11, (SECTION_Z_SIZE - 1) as u8] {
                let pos = WorldPos::new(x, y, z);
                let (section, local) = split(pos);
                assert_eq!(join(section, local), pos, "roundtrip failed for {pos}");
            }
        }
    }

    #[test]
    fn test_local_bijection_within_one_section() {
        let section = SectionCoord::new(3, 7);
        let (ox, oy) = section.origin();
        for lx in (0..SECTION_SIZE as u16).step_by(13) {
            for ly in (0..SECTION_SIZE as u16).step_by(17) {
                for z in 0..SECTION_Z_SIZE as u8 {
                    let world = WorldPos::new(ox + lx as u64, oy + ly as u64, z);
                    assert_eq!(world.section(), section);
                    assert_eq!(world.local(), LocalPos::new(lx, ly, z));
                }
            }
        }
    }

    #[test]
    fn test_from_signed_rejects_out_of_range() {
        assert!(WorldPos::from_signed(-1, 0, 0).is_none());
        assert!(WorldPos::from_signed(0, -5, 0).is_none());
        assert!(WorldPos::from_signed(0, 0, -1).is_none());
        assert!(WorldPos::from_signed(0, 0, SECTION_Z_SIZE as i64).is_none());
        assert_eq!(
            WorldPos::from_signed(12, 34, 5),
            Some(WorldPos::new(12, 34, 5))
        );
    }

    #[test]
    fn test_index_layout_is_x_major() {
        assert_eq!(LocalPos::new(0, 0, 1).index(), 1);
        assert_eq!(LocalPos::new(0, 1, 0).index(), SECTION_Z_SIZE);
        assert_eq!(LocalPos::new(1, 0, 0).index(), SECTION_SIZE * SECTION_Z_SIZE);
        assert_eq!(
            LocalPos::new(199, 199, 23).index(),
            SECTION_VOLUME - 1
        );
    }

    #[test]
    fn test_from_index_inverts_index() {
        for index in [0, 1, 23, 24, 4799, 4800, SECTION_VOLUME / 2, SECTION_VOLUME - 1] {
            assert_eq!(LocalPos::from_index(index).index(), index);
        }
    }
}
