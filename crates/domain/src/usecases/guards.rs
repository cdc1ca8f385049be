//! Existence and uniqueness guards run by the entity services

use uuid::Uuid;

use crate::{
    error::ServiceError,
    model::{Crop, EntityKind, Farm, Harvest, Producer},
    ports::RegistryStore,
};

/// Turn a lookup result into the located record or a `NotFound` for `kind`
pub fn require_exists<T>(kind: EntityKind, id: Uuid, found: Option<T>) -> Result<T, ServiceError> {
    found.ok_or_else(|| {
        tracing::debug!(kind = %kind, id = %id, "Referenced record missing");
        ServiceError::NotFound(kind)
    })
}

/// Confirms that a referenced record exists and hands it back for reuse
pub struct ReferenceGuard<'a, St: RegistryStore + ?Sized> {
    store: &'a St,
}

impl<'a, St: RegistryStore + ?Sized> ReferenceGuard<'a, St> {
    pub fn new(store: &'a St) -> Self {
        Self { store }
    }

    pub async fn producer(&self, id: Uuid) -> Result<Producer, ServiceError> {
        let found = self.store.get_producer(id).await?;
        require_exists(EntityKind::Producer, id, found)
    }

    pub async fn farm(&self, id: Uuid) -> Result<Farm, ServiceError> {
        let found = self.store.get_farm(id).await?;
        require_exists(EntityKind::Farm, id, found)
    }

    pub async fn harvest(&self, id: Uuid) -> Result<Harvest, ServiceError> {
        let found = self.store.get_harvest(id).await?;
        require_exists(EntityKind::Harvest, id, found)
    }

    pub async fn crop(&self, id: Uuid) -> Result<Crop, ServiceError> {
        let found = self.store.get_crop(id).await?;
        require_exists(EntityKind::Crop, id, found)
    }
}

/// Confirms no other producer holds a normalized document
///
/// Not atomic with the following write; the store's own constraint rejects
/// whichever concurrent writer loses.
pub struct DocumentGuard<'a, St: RegistryStore + ?Sized> {
    store: &'a St,
}

impl<'a, St: RegistryStore + ?Sized> DocumentGuard<'a, St> {
    pub fn new(store: &'a St) -> Self {
        Self { store }
    }

    pub async fn check_available(&self, document: &str) -> Result<(), ServiceError> {
        self.check(document, None).await
    }

    /// Same as `check_available`, ignoring the producer being updated
    pub async fn check_available_excluding(
        &self,
        document: &str,
        current_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.check(document, Some(current_id)).await
    }

    async fn check(&self, document: &str, exclude: Option<Uuid>) -> Result<(), ServiceError> {
        match self
            .store
            .find_producer_by_document(document, exclude)
            .await?
        {
            Some(holder) => {
                tracing::info!(holder_id = %holder.id, "Document already registered");
                Err(ServiceError::Conflict)
            }
            None => Ok(()),
        }
    }
}
