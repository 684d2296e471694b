//! Activity heatmap use-cases.

use crate::heatmap::{build_heatmap, Heatmap, HeatmapView};
use crate::repo::kv_repo::KvRepository;
use crate::service::error::PlannerResult;
use crate::store::keys::{HeatmapViewKey, TimeBlocksKey};
use crate::store::PlannerStore;
use chrono::NaiveDate;
use log::debug;

pub struct HeatmapService<'s, R: KvRepository> {
    store: &'s mut PlannerStore<R>,
}

impl<'s, R: KvRepository> HeatmapService<'s, R> {
    pub fn new(store: &'s mut PlannerStore<R>) -> Self {
        Self { store }
    }

    pub fn view(&self) -> HeatmapView {
        *self.store.get::<HeatmapViewKey>()
    }

    /// Persists the selected window. Re-selecting the current view is a no-op.
    pub fn set_view(&mut self, view: HeatmapView) -> PlannerResult<()> {
        if self.view() == view {
            return Ok(());
        }
        self.store.set::<HeatmapViewKey>(view)?;
        debug!(
            "event=heatmap_view module=service status=ok view={}",
            view.as_str()
        );
        Ok(())
    }

    /// Builds the heatmap for the persisted view, ending at `today`.
    pub fn build(&self, today: NaiveDate) -> Heatmap {
        build_heatmap(self.store.get::<TimeBlocksKey>(), self.view(), today)
    }
}

#[cfg(test)]
mod tests {
    use super::HeatmapService;
    use crate::heatmap::HeatmapView;
    use crate::repo::kv_repo::{InMemoryKvRepository, KvRepository};
    use crate::store::PlannerStore;
    use chrono::NaiveDate;

    #[test]
    fn view_preference_persists_under_heatmap_view_key() {
        let mut store = PlannerStore::load(InMemoryKvRepository::new()).expect("load");
        let mut heatmap = HeatmapService::new(&mut store);
        assert_eq!(heatmap.view(), HeatmapView::Week);

        heatmap.set_view(HeatmapView::Year).expect("set view");
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).expect("valid date");
        assert_eq!(heatmap.build(today).view, HeatmapView::Year);

        let raw = store
            .repository()
            .get("heatmapView")
            .expect("read")
            .expect("present");
        assert_eq!(raw, "\"year\"");
    }
}
