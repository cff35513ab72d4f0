//! Content registry: maps compact [`ContentId`] values to [`ContentDef`] metadata.
//!
//! The registry is built once at startup (typically from the game's content
//! definition file) and shared with the [`WorldStore`](crate::WorldStore) and
//! whatever layer renders or simulates the content. IDs are dense and start
//! at 0. "No content" is not an ID; cells use `Option<ContentId>` for that.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Index of a content definition in a [`ContentRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub u16);

/// Descriptor for one kind of placeable content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDef {
    /// Unique name (e.g. "wall.stone", "plant.fern").
    pub name: String,
    /// Free-form boolean tags interpreted by the game layer.
    #[serde(default)]
    pub flags: Vec<String>,
}

impl ContentDef {
    /// A definition with no flags.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: Vec::new(),
        }
    }

    /// Returns `true` if `flag` is one of this definition's tags.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Errors that can occur while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A definition with the same name has already been registered.
    #[error("duplicate content name: {0}")]
    DuplicateName(String),
    /// Every [`ContentId`] value is in use.
    #[error("content registry is full (max {} entries)", u16::MAX)]
    RegistryFull,
    /// The definition list is not valid JSON.
    #[error("invalid content definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`ContentId`] → [`ContentDef`] with O(1) lookup in both directions.
#[derive(Debug, Default)]
pub struct ContentRegistry {
    /// Dense array where `index == ContentId.0`.
    defs: Vec<ContentDef>,
    name_to_id: HashMap<String, ContentId>,
}

impl ContentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a JSON array of definitions, assigning IDs in
    /// array order.
    ///
    /// ```
    /// use strata_world::ContentRegistry;
    ///
    /// let json = r#"[{ "name": "grass" }, { "name": "fern", "flags": ["decoration"] }]"#;
    /// let registry = ContentRegistry::from_json(json).unwrap();
    /// assert_eq!(registry.len(), 2);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let defs: Vec<ContentDef> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for def in defs {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Registers a definition and returns its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken, or
    /// [`RegistryError::RegistryFull`] once `u16::MAX` definitions exist.
    pub fn register(&mut self, def: ContentDef) -> Result<ContentId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.defs.len() >= u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }

        let id = ContentId(self.defs.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.defs.push(def);
        Ok(id)
    }

    /// Returns the definition for `id`, or `None` if it was never registered.
    pub fn get(&self, id: ContentId) -> Option<&ContentDef> {
        self.defs.get(id.0 as usize)
    }

    /// Returns `true` if `id` refers to a registered definition.
    pub fn contains(&self, id: ContentId) -> bool {
        (id.0 as usize) < self.defs.len()
    }

    /// Returns the ID for a named definition.
    pub fn lookup_by_name(&self, name: &str) -> Option<ContentId> {
        self.name_to_id.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterates over `(id, definition)` pairs in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (ContentId, &ContentDef)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, def)| (ContentId(i as u16), def))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
