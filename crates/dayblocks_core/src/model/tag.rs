//! Tag records.
//!
//! Tags are referenced by id from time blocks, habits and todos. Deleting a
//! tag leaves those references dangling; readers resolve lookup-or-skip.

use super::new_id;
use serde::{Deserialize, Serialize};

pub type TagId = String;

/// Named, colored label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    /// CSS hex color, e.g. `#3a86ff`.
    pub color: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Partial update for a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl TagPatch {
    pub fn apply(&self, tag: &mut Tag) {
        if let Some(name) = &self.name {
            tag.name = name.clone();
        }
        if let Some(color) = &self.color {
            tag.color = color.clone();
        }
    }
}

/// Tags seeded when the store has no `tags` entry.
pub fn default_tags() -> Vec<Tag> {
    [
        ("1", "Work", "#3a86ff"),
        ("2", "Personal", "#8338ec"),
        ("3", "Health", "#38b000"),
        ("4", "Learning", "#ffbe0b"),
    ]
    .into_iter()
    .map(|(id, name, color)| Tag {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

/// Resolves tag ids against the tag list, skipping ids that no longer exist.
pub fn resolve_tags<'a>(tag_ids: &[TagId], tags: &'a [Tag]) -> Vec<&'a Tag> {
    tag_ids
        .iter()
        .filter_map(|id| tags.iter().find(|tag| &tag.id == id))
        .collect()
}
