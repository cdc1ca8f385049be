//! Dashboard use case - aggregate figures across the registry

use std::sync::Arc;

use crate::{
    error::ServiceError,
    model::{CropArea, DashboardStats, LandUse, LandUseKind, StateCount},
    ports::ReportStore,
};

/// Aggregates report queries into dashboard figures. Missing sums are
/// reported as zero.
pub struct DashboardService<R: ReportStore + ?Sized> {
    reports: Arc<R>,
}

impl<R: ReportStore + ?Sized> DashboardService<R> {
    pub fn new(reports: Arc<R>) -> Self {
        Self { reports }
    }

    pub async fn stats(&self) -> Result<DashboardStats, ServiceError> {
        let total_farms = self.reports.count_farms().await?;
        let total_hectares = self.reports.sum_total_area().await?.unwrap_or(0.0);
        let total_producers = self.reports.count_producers().await?;
        let total_crops = self.reports.count_crops().await?;

        Ok(DashboardStats {
            total_farms,
            total_hectares,
            total_producers,
            total_crops,
        })
    }

    pub async fn farms_by_state(&self) -> Result<Vec<StateCount>, ServiceError> {
        Ok(self
            .reports
            .farms_by_state()
            .await?
            .into_iter()
            .map(|(state, count)| StateCount { state, count })
            .collect())
    }

    pub async fn crops_by_type(&self) -> Result<Vec<CropArea>, ServiceError> {
        Ok(self
            .reports
            .crop_area_by_name()
            .await?
            .into_iter()
            .map(|(crop, area)| CropArea {
                crop,
                area: area.unwrap_or(0.0),
            })
            .collect())
    }

    pub async fn land_use(&self) -> Result<Vec<LandUse>, ServiceError> {
        let (arable, vegetation) = self.reports.land_use_sums().await?;

        Ok(vec![
            LandUse {
                kind: LandUseKind::Arable,
                area: arable.unwrap_or(0.0),
            },
            LandUse {
                kind: LandUseKind::Vegetation,
                area: vegetation.unwrap_or(0.0),
            },
        ])
    }
}
