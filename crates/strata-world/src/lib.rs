//! Sectioned world grid with a versioned on-disk format, an LRU section cache,
//! and a world-coordinate facade.

mod error;
pub mod observer;
pub mod registry;
pub mod section;
pub mod section_cache;
pub mod section_serial;
pub mod storage;
pub mod store;

pub use error::WorldError;
pub use observer::{RetainObserver, SectionObserver};
pub use registry::{ContentDef, ContentId, ContentRegistry, RegistryError};
pub use section::{Section, SectionData};
pub use section_cache::{DEFAULT_CACHE_CAPACITY, SectionCache};
pub use section_serial::{CodecError, FORMAT_VERSION, MAX_PAYLOAD};
pub use storage::{MAPS_DIR, SectionBackend, SectionStorage, section_file_name};
pub use store::{DEFAULT_FOCUS, WorldStore};

pub use strata_config::IoMode;
pub use strata_coords::{LocalPos, SectionCoord, WorldPos};
