//! Tag use-case service.
//!
//! Deleting a tag intentionally leaves `tag_ids` on blocks, habits and todos
//! untouched; readers resolve tags lookup-or-skip.

use crate::model::tag::{Tag, TagPatch};
use crate::model::validate_title;
use crate::repo::kv_repo::KvRepository;
use crate::service::error::{PlannerError, PlannerResult};
use crate::store::keys::TagsKey;
use crate::store::PlannerStore;
use log::info;

pub struct TagService<'s, R: KvRepository> {
    store: &'s mut PlannerStore<R>,
}

impl<'s, R: KvRepository> TagService<'s, R> {
    pub fn new(store: &'s mut PlannerStore<R>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> &[Tag] {
        self.store.get::<TagsKey>()
    }

    pub fn get(&self, id: &str) -> Option<&Tag> {
        self.list().iter().find(|tag| tag.id == id)
    }

    pub fn add(&mut self, name: &str, color: &str) -> PlannerResult<Tag> {
        validate_title(name)?;
        let tag = Tag::new(name.trim(), color.trim());
        let created = tag.clone();
        self.store.update::<TagsKey, _>(|tags| tags.push(tag))?;
        info!("event=tag_create module=service status=ok tag_id={}", created.id);
        Ok(created)
    }

    pub fn update(&mut self, id: &str, patch: &TagPatch) -> PlannerResult<Tag> {
        if let Some(name) = &patch.name {
            validate_title(name)?;
        }
        self.store.try_update::<TagsKey, _, PlannerError>(|tags| {
            let tag = tags
                .iter_mut()
                .find(|tag| tag.id == id)
                .ok_or_else(|| PlannerError::TagNotFound(id.to_string()))?;
            patch.apply(tag);
            Ok(tag.clone())
        })
    }

    pub fn delete(&mut self, id: &str) -> PlannerResult<()> {
        self.store.try_update::<TagsKey, _, PlannerError>(|tags| {
            let before = tags.len();
            tags.retain(|tag| tag.id != id);
            if tags.len() == before {
                return Err(PlannerError::TagNotFound(id.to_string()));
            }
            Ok(())
        })?;
        info!("event=tag_delete module=service status=ok tag_id={id}");
        Ok(())
    }
}
