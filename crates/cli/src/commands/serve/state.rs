//! Application state shared across request handlers.

use std::sync::Arc;

use agro_registry_domain::usecases::{
    CropService, DashboardService, FarmService, HarvestService, ProducerService,
};
use agro_registry_domain::{Clock, RegistryStore, ReportStore};

/// One service per entity plus the dashboard, all over the same store.
pub(crate) struct AppState {
    pub(crate) producers: ProducerService<dyn RegistryStore>,
    pub(crate) farms: FarmService<dyn RegistryStore>,
    pub(crate) harvests: HarvestService<dyn RegistryStore>,
    pub(crate) crops: CropService<dyn RegistryStore>,
    pub(crate) dashboard: DashboardService<dyn ReportStore>,
}

impl AppState {
    pub(crate) fn new<S>(store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: RegistryStore + ReportStore + 'static,
    {
        let registry: Arc<dyn RegistryStore> = store.clone();
        let reports: Arc<dyn ReportStore> = store;

        Self {
            producers: ProducerService::new(Arc::clone(&registry), Arc::clone(&clock)),
            farms: FarmService::new(Arc::clone(&registry), Arc::clone(&clock)),
            harvests: HarvestService::new(Arc::clone(&registry), Arc::clone(&clock)),
            crops: CropService::new(registry, clock),
            dashboard: DashboardService::new(reports),
        }
    }
}
