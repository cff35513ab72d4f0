//! End-to-end behaviour of `WorldStore` against real section files.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use strata_config::Config;
use strata_world::{
    ContentDef, ContentId, ContentRegistry, FORMAT_VERSION, IoMode, RetainObserver, SectionCoord,
    SectionData, SectionObserver, SectionStorage, WorldError, WorldStore, section_file_name,
};

/// Observer that records every hook call and stamps a save counter into the data.
#[derive(Default)]
struct Recorder {
    loaded: Vec<(SectionCoord, SectionData)>,
    saving: Vec<SectionCoord>,
}

impl SectionObserver for Recorder {
    fn section_loaded(&mut self, coord: SectionCoord, data: &SectionData) {
        self.loaded.push((coord, data.clone()));
    }

    fn section_saving(&mut self, coord: SectionCoord) -> SectionData {
        self.saving.push(coord);
        let mut data = SectionData::new();
        data.insert("saves".to_string(), self.saving.len().into());
        data
    }
}

fn registry() -> Arc<ContentRegistry> {
    let mut registry = ContentRegistry::new();
    for name in ["grass", "sand", "water", "rock", "tree", "wall", "door", "bush"] {
        registry.register(ContentDef::named(name)).unwrap();
    }
    Arc::new(registry)
}

fn store(root: &Path, mode: IoMode) -> WorldStore<Recorder> {
    let storage = SectionStorage::new(root.join("game"), root.join("user"), mode);
    WorldStore::new(registry(), Recorder::default(), storage)
}

#[test]
fn set_cell_then_get_cell() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = store(dir.path(), IoMode::Authoring);

    world.set_cell(10, 10, 0, ContentId(5)).unwrap();
    assert_eq!(world.get_cell(10, 10, 0).unwrap(), Some(ContentId(5)));
    assert_eq!(
        world.resident_sections().collect::<Vec<_>>(),
        vec![SectionCoord::new(0, 0)]
    );
}

#[test]
fn fifth_section_evicts_least_recent() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = store(dir.path(), IoMode::Authoring);

    for k in 0..5 {
        world.get_cell(0, k * 200, 0).unwrap();
    }

    assert_eq!(world.observer().saving, vec![SectionCoord::new(0, 0)]);
    assert_eq!(world.observer().loaded.len(), 5);
    assert_eq!(world.resident_sections().count(), 4);

    let maps = dir.path().join("game").join("maps");
    assert!(maps.join(section_file_name(SectionCoord::new(0, 0))).exists());
    assert!(!maps.join(section_file_name(SectionCoord::new(0, 1))).exists());
}

#[test]
fn touching_a_section_protects_it_from_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = store(dir.path(), IoMode::Authoring);

    for k in 0..4 {
        world.get_cell(0, k * 200, 0).unwrap();
    }
    // (0,0) becomes most recent, so (0,1) is the victim.
    world.get_cell(5, 5, 5).unwrap();
    world.get_cell(0, 4 * 200, 0).unwrap();

    assert_eq!(world.observer().saving, vec![SectionCoord::new(0, 1)]);
}

#[test]
fn extras_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut world = store(dir.path(), IoMode::Authoring);
        world.add_extra(42, 17, 3, ContentId(4)).unwrap();
        world.add_extra(42, 17, 3, ContentId(7)).unwrap();
        world.add_extra(42, 17, 3, ContentId(4)).unwrap();
        world.save_all().unwrap();
    }

    let mut world = store(dir.path(), IoMode::Authoring);
    assert_eq!(
        world.get_extras(42, 17, 3).unwrap(),
        &[ContentId(4), ContentId(7), ContentId(4)]
    );
}

#[test]
fn observer_data_roundtrips_through_save() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut world = store(dir.path(), IoMode::Authoring);
        world.set_cell(1, 1, 1, ContentId(0)).unwrap();
        world.save_all().unwrap();
        world.save_all().unwrap();
        assert_eq!(world.observer().saving.len(), 2);
    }

    let mut world = store(dir.path(), IoMode::Authoring);
    world.get_cell(1, 1, 1).unwrap();
    let (coord, data) = &world.observer().loaded[0];
    assert_eq!(*coord, SectionCoord::new(0, 0));
    assert_eq!(data.get("saves"), Some(&2.into()));
}

#[test]
fn runtime_mode_falls_back_to_shipped_copy() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut author = store(dir.path(), IoMode::Authoring);
        author.set_cell(300, 300, 2, ContentId(1)).unwrap();
        author.save_all().unwrap();
    }

    {
        let mut player = store(dir.path(), IoMode::Runtime);
        assert_eq!(player.get_cell(300, 300, 2).unwrap(), Some(ContentId(1)));
        player.set_cell(300, 300, 2, ContentId(6)).unwrap();
        player.save_all().unwrap();
    }

    let mut player = store(dir.path(), IoMode::Runtime);
    assert_eq!(player.get_cell(300, 300, 2).unwrap(), Some(ContentId(6)));

    let mut author = store(dir.path(), IoMode::Authoring);
    assert_eq!(author.get_cell(300, 300, 2).unwrap(), Some(ContentId(1)));
}

#[test]
fn move_to_current_focus_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = store(dir.path(), IoMode::Authoring);
    let (x, y) = world.focus();

    assert!(!world.move_to(x as i64, y as i64));
    assert!(world.observer().loaded.is_empty());
    assert!(world.move_to(0, 0));
    assert!(world.observer().loaded.is_empty());
}

#[test]
fn erase_cell_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = store(dir.path(), IoMode::Authoring);

    assert!(!world.erase_cell(9, 9, 9).unwrap());
    world.set_cell(9, 9, 9, ContentId(3)).unwrap();
    assert!(world.erase_cell(9, 9, 9).unwrap());
    assert_eq!(world.get_cell(9, 9, 9).unwrap(), None);
}

#[test]
fn invalid_coordinates_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = store(dir.path(), IoMode::Authoring);

    for (x, y, z) in [(-1, 0, 0), (0, -200, 0), (0, 0, -1), (0, 0, 24)] {
        let result = world.get_cell(x, y, z);
        assert!(
            matches!(result, Err(WorldError::InvalidCoordinate { .. })),
            "({x}, {y}, {z}) gave {result:?}"
        );
    }
    assert!(world.observer().loaded.is_empty());
}

#[test]
fn corrupt_section_file_surfaces_error() {
    let dir = tempfile::tempdir().unwrap();
    let maps = dir.path().join("game").join("maps");
    std::fs::create_dir_all(&maps).unwrap();
    std::fs::write(maps.join("map0000"), b"not a section").unwrap();

    let mut world = store(dir.path(), IoMode::Authoring);
    let result = world.get_cell(0, 0, 0);
    assert!(
        matches!(result, Err(WorldError::CorruptData { .. })),
        "got {result:?}"
    );
    assert_eq!(world.resident_sections().count(), 0);
}

#[test]
fn distant_sections_keep_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut world = store(dir.path(), IoMode::Authoring);
        // Sections (0x12, 0x304) and (0x123, 0x04).
        world.set_cell(3600, 154_400, 0, ContentId(1)).unwrap();
        world.set_cell(58_200, 800, 0, ContentId(2)).unwrap();
        world.save_all().unwrap();
    }

    let mut world = store(dir.path(), IoMode::Authoring);
    assert_eq!(world.get_cell(3600, 154_400, 0).unwrap(), Some(ContentId(1)));
    assert_eq!(world.get_cell(58_200, 800, 0).unwrap(), Some(ContentId(2)));
    assert_eq!(world.get_cell(3600, 154_400, 1).unwrap(), None);
    assert_eq!(world.get_cell(58_200, 800, 1).unwrap(), None);
}

#[test]
fn newer_format_version_surfaces_as_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let maps = dir.path().join("game").join("maps");
    std::fs::create_dir_all(&maps).unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&[FORMAT_VERSION + 1, 0, 0, 0, 0]).unwrap();
    std::fs::write(maps.join("map0000"), encoder.finish().unwrap()).unwrap();

    let mut world = store(dir.path(), IoMode::Authoring);
    let result = world.get_cell(0, 0, 0);
    assert!(
        matches!(result, Err(WorldError::UnsupportedVersion { version: 4, .. })),
        "got {result:?}"
    );
    assert_eq!(world.resident_sections().count(), 0);
    assert!(world.observer().loaded.is_empty());
}

#[test]
fn store_built_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("config");

    let mut config = Config::load_or_create(&config_dir).unwrap();
    config.storage.game_dir = dir.path().join("game");
    config.storage.user_dir = dir.path().join("user");
    config.storage.io_mode = IoMode::Runtime;
    config.world.start = [250, 10];
    config.save(&config_dir).unwrap();

    let config = Config::load_or_create(&config_dir).unwrap();
    {
        let mut world = WorldStore::from_config(&config, registry(), RetainObserver::new());
        assert_eq!(world.focus_section(), SectionCoord::new(1, 0));
        world.set_cell(250, 10, 0, ContentId(3)).unwrap();
        world.save_all().unwrap();
    }
    assert!(dir.path().join("user").join("map0100").exists());
    assert!(!dir.path().join("game").join("maps").exists());

    // Switching to authoring through a reloaded config reads the shipped root.
    let mut edited = config.clone();
    edited.storage.io_mode = IoMode::Authoring;
    edited.save(&config_dir).unwrap();
    let reloaded = config.reload(&config_dir).unwrap().expect("config changed");

    let mut world = WorldStore::from_config(&reloaded, registry(), RetainObserver::new());
    assert_eq!(world.io_mode(), IoMode::Authoring);
    assert_eq!(world.get_cell(250, 10, 0).unwrap(), None);
}
