//! Widget module registry.
//!
//! # Responsibility
//! - Install/uninstall the optional widgets (timer, heatmap, habits, todos).
//! - Gate widget operations on install state.
//!
//! # Invariants
//! - Unknown or missing modules count as not installed.
//! - Toggling never adds or removes catalog entries.

use crate::model::module::{Module, ModuleKind};
use crate::repo::kv_repo::KvRepository;
use crate::service::error::{PlannerError, PlannerResult};
use crate::store::keys::ModulesKey;
use crate::store::PlannerStore;
use log::info;

pub struct ModuleService<'s, R: KvRepository> {
    store: &'s mut PlannerStore<R>,
}

impl<'s, R: KvRepository> ModuleService<'s, R> {
    pub fn new(store: &'s mut PlannerStore<R>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> &[Module] {
        self.store.get::<ModulesKey>()
    }

    pub fn is_installed(&self, kind: ModuleKind) -> bool {
        is_installed(self.list(), kind)
    }

    /// Fails with `ModuleNotInstalled` unless `kind` is installed.
    pub fn ensure_installed(&self, kind: ModuleKind) -> PlannerResult<()> {
        if self.is_installed(kind) {
            return Ok(());
        }
        Err(PlannerError::ModuleNotInstalled(kind))
    }

    /// Flips the install flag of module `id` and returns the updated record.
    pub fn toggle(&mut self, id: &str) -> PlannerResult<Module> {
        let module = self
            .store
            .try_update::<ModulesKey, _, PlannerError>(|modules| {
                let module = modules
                    .iter_mut()
                    .find(|module| module.id == id)
                    .ok_or_else(|| PlannerError::ModuleNotFound(id.to_string()))?;
                module.installed = !module.installed;
                Ok(module.clone())
            })?;
        info!(
            "event=module_toggle module=service status=ok module_id={} installed={}",
            module.id, module.installed
        );
        Ok(module)
    }

    /// Sets the install flag explicitly; no write when already in that state.
    pub fn set_installed(&mut self, kind: ModuleKind, installed: bool) -> PlannerResult<Module> {
        let current = self
            .list()
            .iter()
            .find(|module| module.id == kind.id())
            .cloned()
            .ok_or_else(|| PlannerError::ModuleNotFound(kind.id().to_string()))?;
        if current.installed == installed {
            return Ok(current);
        }
        self.toggle(kind.id())
    }
}

/// Install check over a module list, for callers holding only a snapshot.
pub fn is_installed(modules: &[Module], kind: ModuleKind) -> bool {
    modules
        .iter()
        .any(|module| module.id == kind.id() && module.installed)
}
