//! The durable attribute/tag store the builder persists through.
//!
//! Values are opaque strings; callers encode structured data as RON. Tags attach a room to a
//! `(tag, category)` pair and can be queried in reverse.

use crate::rooms::RoomId;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("store data is malformed: {0}")]
    Ron(#[from] ron::Error),
}

pub trait AttributeStore {
    fn set_tag(&mut self, room: RoomId, tag: &str, category: &str) -> Result<(), StoreError>;

    /// Drops every tag `room` carries in `category`.
    fn clear_tags(&mut self, room: RoomId, category: &str) -> Result<(), StoreError>;

    fn rooms_by_tag(&self, tag: &str, category: &str) -> BTreeSet<RoomId>;

    fn set_attribute(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    fn attribute(&self, key: &str) -> Option<String>;
}

/// Category -> tag -> rooms.
type TagTable = BTreeMap<String, BTreeMap<String, BTreeSet<RoomId>>>;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MemoryStore {
    attributes: BTreeMap<String, String>,
    tags: TagTable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttributeStore for MemoryStore {
    fn set_tag(&mut self, room: RoomId, tag: &str, category: &str) -> Result<(), StoreError> {
        self.tags
            .entry(category.to_string())
            .or_default()
            .entry(tag.to_string())
            .or_default()
            .insert(room);

        Ok(())
    }

    fn clear_tags(&mut self, room: RoomId, category: &str) -> Result<(), StoreError> {
        if let Some(by_tag) = self.tags.get_mut(category) {
            for rooms in by_tag.values_mut() {
                rooms.remove(&room);
            }
            by_tag.retain(|_, rooms| !rooms.is_empty());
        }

        Ok(())
    }

    fn rooms_by_tag(&self, tag: &str, category: &str) -> BTreeSet<RoomId> {
        self.tags
            .get(category)
            .and_then(|by_tag| by_tag.get(tag))
            .cloned()
            .unwrap_or_default()
    }

    fn set_attribute(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.attributes.insert(key.to_string(), value);

        Ok(())
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.get(key).cloned()
    }
}

/// A `MemoryStore` mirrored to a RON file. Every mutation rewrites the file before returning.
pub struct RonFileStore {
    path: PathBuf,
    contents: MemoryStore,
}

impl RonFileStore {
    /// Opens `path`, starting empty if the file doesn't exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let contents = match fs::read_to_string(&path) {
            Ok(text) => ron::de::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => MemoryStore::new(),
            Err(e) => return Err(e.into()),
        };
        let store = RonFileStore { path, contents };
        log::debug!("Opened attribute store at {}", store.path().display());

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let text = ron::ser::to_string_pretty(&self.contents, ron::ser::PrettyConfig::default())?;

        // Replace atomically so a crash mid-write leaves the previous state intact.
        let tmp = self.path.with_extension("ron.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

impl AttributeStore for RonFileStore {
    fn set_tag(&mut self, room: RoomId, tag: &str, category: &str) -> Result<(), StoreError> {
        self.contents.set_tag(room, tag, category)?;
        self.flush()
    }

    fn clear_tags(&mut self, room: RoomId, category: &str) -> Result<(), StoreError> {
        self.contents.clear_tags(room, category)?;
        self.flush()
    }

    fn rooms_by_tag(&self, tag: &str, category: &str) -> BTreeSet<RoomId> {
        self.contents.rooms_by_tag(tag, category)
    }

    fn set_attribute(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.contents.set_attribute(key, value)?;
        self.flush()
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.contents.attribute(key)
    }
}
