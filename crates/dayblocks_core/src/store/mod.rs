//! Planner store: typed, cached access to the persistent key-value layout.
//!
//! # Responsibility
//! - Load every planner collection once, falling back to defaults.
//! - Route all mutations through one update path that persists, refreshes
//!   the in-memory cache and notifies subscribers.
//!
//! # Invariants
//! - The cache only changes after the new value was written successfully.
//! - A failed or rejected mutation leaves both cache and storage untouched.
//! - Absent and unparsable entries are indistinguishable to callers: both
//!   yield the key's default.
//! - Single-threaded: listeners are plain `FnMut` closures, not `Send`.

pub mod keys;

use crate::heatmap::HeatmapView;
use crate::model::habit::Habit;
use crate::model::module::Module;
use crate::model::tag::Tag;
use crate::model::time_block::TimeBlock;
use crate::model::todo::Todo;
use crate::repo::kv_repo::{KvRepository, RepoError};
use keys::{HabitsKey, HeatmapViewKey, ModulesKey, StoreKey, TagsKey, TimeBlocksKey, TodosKey};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failures. Reads never fail on bad data; writes can.
#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    Serialize {
        key: &'static str,
        source: serde_json::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Serialize { key, source } => {
                write!(f, "failed to serialize store entry `{key}`: {source}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Serialize { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// In-memory snapshot of every persisted planner collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerState {
    pub time_blocks: Vec<TimeBlock>,
    pub tags: Vec<Tag>,
    pub modules: Vec<Module>,
    pub habits: Vec<Habit>,
    pub todos: Vec<Todo>,
    pub heatmap_view: HeatmapView,
}

impl Default for PlannerState {
    fn default() -> Self {
        Self {
            time_blocks: TimeBlocksKey::default_value(),
            tags: TagsKey::default_value(),
            modules: ModulesKey::default_value(),
            habits: HabitsKey::default_value(),
            todos: TodosKey::default_value(),
            heatmap_view: HeatmapViewKey::default_value(),
        }
    }
}

/// Handle returned by [`PlannerStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&'static str)>;

/// Typed store over a raw key-value repository.
pub struct PlannerStore<R: KvRepository> {
    repo: R,
    state: PlannerState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<R: KvRepository> PlannerStore<R> {
    /// Loads all planner entries from `repo`.
    ///
    /// # Errors
    /// - Only transport errors from the repository. Missing or corrupt
    ///   values fall back to defaults and are logged.
    pub fn load(repo: R) -> StoreResult<Self> {
        let state = PlannerState {
            time_blocks: load_entry::<TimeBlocksKey, _>(&repo)?,
            tags: load_entry::<TagsKey, _>(&repo)?,
            modules: load_entry::<ModulesKey, _>(&repo)?,
            habits: load_entry::<HabitsKey, _>(&repo)?,
            todos: load_entry::<TodosKey, _>(&repo)?,
            heatmap_view: load_entry::<HeatmapViewKey, _>(&repo)?,
        };
        debug!(
            "event=store_load module=store status=ok time_blocks={} tags={} habits={} todos={}",
            state.time_blocks.len(),
            state.tags.len(),
            state.habits.len(),
            state.todos.len()
        );

        Ok(Self {
            repo,
            state,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    /// Cached value for `K`.
    pub fn get<K: StoreKey>(&self) -> &K::Value {
        K::slot(&self.state)
    }

    /// Replaces the value for `K`.
    pub fn set<K: StoreKey>(&mut self, value: K::Value) -> StoreResult<()> {
        self.update::<K, _>(|slot| *slot = value)
    }

    /// Mutates the value for `K` through the single write path.
    pub fn update<K, T>(&mut self, mutate: impl FnOnce(&mut K::Value) -> T) -> StoreResult<T>
    where
        K: StoreKey,
    {
        self.try_update::<K, T, StoreError>(|slot| Ok(mutate(slot)))
    }

    /// Like [`update`](Self::update), but the mutation may reject.
    ///
    /// On `Err` from `mutate` nothing is written and nobody is notified.
    pub fn try_update<K, T, E>(
        &mut self,
        mutate: impl FnOnce(&mut K::Value) -> Result<T, E>,
    ) -> Result<T, E>
    where
        K: StoreKey,
        E: From<StoreError>,
    {
        let mut next = K::slot(&self.state).clone();
        let output = mutate(&mut next)?;

        let encoded = serde_json::to_string(&next).map_err(|source| StoreError::Serialize {
            key: K::KEY,
            source,
        })?;
        if let Err(err) = self.repo.set(K::KEY, &encoded) {
            error!(
                "event=store_write module=store status=error key={} error={}",
                K::KEY,
                err
            );
            return Err(StoreError::from(err).into());
        }

        *K::slot_mut(&mut self.state) = next;
        debug!(
            "event=store_write module=store status=ok key={} bytes={}",
            K::KEY,
            encoded.len()
        );
        self.notify(K::KEY);
        Ok(output)
    }

    /// Registers a listener called with the key of every committed write.
    pub fn subscribe(&mut self, listener: impl FnMut(&'static str) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    fn notify(&mut self, key: &'static str) {
        for (_, listener) in &mut self.listeners {
            listener(key);
        }
    }
}

fn load_entry<K: StoreKey, R: KvRepository>(repo: &R) -> StoreResult<K::Value> {
    let Some(raw) = repo.get(K::KEY)? else {
        return Ok(K::default_value());
    };

    match serde_json::from_str::<K::Value>(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(
                "event=store_load module=store status=fallback key={} reason=parse_failed error={}",
                K::KEY,
                err
            );
            Ok(K::default_value())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::keys::{HeatmapViewKey, ModulesKey, TagsKey, TimeBlocksKey};
    use super::{PlannerState, PlannerStore, StoreError};
    use crate::heatmap::HeatmapView;
    use crate::repo::kv_repo::{InMemoryKvRepository, KvRepository};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn load_from_empty_repository_yields_defaults() {
        let store = PlannerStore::load(InMemoryKvRepository::new()).expect("load");
        assert_eq!(store.state(), &PlannerState::default());
        assert_eq!(store.get::<TagsKey>().len(), 4);
        assert_eq!(store.get::<ModulesKey>().len(), 4);
        assert!(store.get::<TimeBlocksKey>().is_empty());
    }

    #[test]
    fn corrupt_entries_fall_back_to_defaults() {
        let repo = InMemoryKvRepository::with_entries([
            ("tags", "{not json"),
            ("heatmapView", "\"decade\""),
        ]);
        let store = PlannerStore::load(repo).expect("load");
        assert_eq!(store.get::<TagsKey>().len(), 4);
        assert_eq!(*store.get::<HeatmapViewKey>(), HeatmapView::Week);
    }

    #[test]
    fn update_persists_and_notifies_subscribers() {
        let mut store = PlannerStore::load(InMemoryKvRepository::new()).expect("load");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = store.subscribe(move |key| sink.borrow_mut().push(key));

        store
            .set::<HeatmapViewKey>(HeatmapView::Year)
            .expect("set view");
        assert_eq!(*store.get::<HeatmapViewKey>(), HeatmapView::Year);
        assert_eq!(
            store
                .repository()
                .get("heatmapView")
                .expect("raw read")
                .as_deref(),
            Some("\"year\"")
        );
        assert_eq!(seen.borrow().as_slice(), ["heatmapView"]);

        assert!(store.unsubscribe(subscription));
        store
            .set::<HeatmapViewKey>(HeatmapView::Month)
            .expect("set view");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn rejected_mutation_leaves_state_untouched() {
        let mut store = PlannerStore::load(InMemoryKvRepository::new()).expect("load");
        let result = store.try_update::<TagsKey, (), StoreError>(|tags| {
            tags.clear();
            Err(StoreError::Repo(crate::repo::kv_repo::RepoError::InvalidKey(
                "rejected".to_string(),
            )))
        });
        assert!(result.is_err());
        assert_eq!(store.get::<TagsKey>().len(), 4);
        assert_eq!(store.repository().get("tags").expect("raw read"), None);
    }

    #[test]
    fn reload_sees_previous_writes() {
        let mut store = PlannerStore::load(InMemoryKvRepository::new()).expect("load");
        store
            .update::<TagsKey, _>(|tags| tags.retain(|tag| tag.id != "2"))
            .expect("update");
        let repo = store.into_repository();

        let reloaded = PlannerStore::load(repo).expect("reload");
        assert_eq!(reloaded.get::<TagsKey>().len(), 3);
    }
}
