//! Crop service: harvest reference around CRUD

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    model::{Crop, CropPatch, EntityKind, NewCrop},
    ports::{Clock, RegistryStore},
    usecases::guards::ReferenceGuard,
};

pub struct CropService<St: RegistryStore + ?Sized> {
    store: Arc<St>,
    clock: Arc<dyn Clock>,
}

impl<St: RegistryStore + ?Sized> CropService<St> {
    pub fn new(store: Arc<St>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, input: NewCrop) -> Result<Crop, ServiceError> {
        ReferenceGuard::new(self.store.as_ref())
            .harvest(input.harvest_id)
            .await?;

        let now = self.clock.now();
        let crop = Crop {
            id: Uuid::new_v4(),
            harvest_id: input.harvest_id,
            name: input.name,
            area: input.area,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_crop(&crop).await?;
        tracing::info!(crop_id = %created.id, harvest_id = %created.harvest_id, "Created crop");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<Crop>, ServiceError> {
        Ok(self.store.list_crops().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Crop, ServiceError> {
        ReferenceGuard::new(self.store.as_ref()).crop(id).await
    }

    pub async fn update(&self, id: Uuid, patch: CropPatch) -> Result<Crop, ServiceError> {
        let guard = ReferenceGuard::new(self.store.as_ref());
        let mut crop = guard.crop(id).await?;

        if let Some(harvest_id) = patch.harvest_id {
            guard.harvest(harvest_id).await?;
        }

        patch.apply_to(&mut crop);
        crop.updated_at = self.clock.now();

        let updated = self
            .store
            .update_crop(&crop)
            .await
            .map_err(|e| ServiceError::from_write(EntityKind::Crop, e))?;
        tracing::info!(crop_id = %id, "Updated crop");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        ReferenceGuard::new(self.store.as_ref()).crop(id).await?;

        self.store
            .delete_crop(id)
            .await
            .map_err(|e| ServiceError::from_write(EntityKind::Crop, e))?;
        tracing::info!(crop_id = %id, "Deleted crop");
        Ok(())
    }
}
