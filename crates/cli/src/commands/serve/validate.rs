//! Request body checks applied before a payload reaches a service.
//!
//! These only reject malformed input (blank text, documents without
//! digits, unusable crop areas). Integrity rules live in the domain.

use agro_registry_domain::{
    CropPatch, FarmPatch, HarvestPatch, NewCrop, NewFarm, NewHarvest, NewProducer,
    ProducerPatch, ServiceError,
};

fn text(field: &'static str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn optional_text(field: &'static str, value: Option<&String>) -> Result<(), ServiceError> {
    value.map_or(Ok(()), |v| text(field, v))
}

fn document(value: &str) -> Result<(), ServiceError> {
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(ServiceError::validation("document", "must contain digits"));
    }
    Ok(())
}

fn area(field: &'static str, value: f64) -> Result<(), ServiceError> {
    if !value.is_finite() {
        return Err(ServiceError::validation(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ServiceError::validation(field, "must not be negative"));
    }
    Ok(())
}

pub(crate) fn new_producer(input: &NewProducer) -> Result<(), ServiceError> {
    text("name", &input.name)?;
    document(&input.document)
}

pub(crate) fn producer_patch(patch: &ProducerPatch) -> Result<(), ServiceError> {
    optional_text("name", patch.name.as_ref())?;
    patch.document.as_deref().map_or(Ok(()), document)
}

pub(crate) fn new_farm(input: &NewFarm) -> Result<(), ServiceError> {
    text("name", &input.name)?;
    text("city", &input.city)?;
    text("state", &input.state)
}

pub(crate) fn farm_patch(patch: &FarmPatch) -> Result<(), ServiceError> {
    optional_text("name", patch.name.as_ref())?;
    optional_text("city", patch.city.as_ref())?;
    optional_text("state", patch.state.as_ref())
}

pub(crate) fn new_harvest(input: &NewHarvest) -> Result<(), ServiceError> {
    text("season", &input.season)
}

pub(crate) fn harvest_patch(patch: &HarvestPatch) -> Result<(), ServiceError> {
    optional_text("season", patch.season.as_ref())
}

pub(crate) fn new_crop(input: &NewCrop) -> Result<(), ServiceError> {
    text("name", &input.name)?;
    area("area", input.area)
}

pub(crate) fn crop_patch(patch: &CropPatch) -> Result<(), ServiceError> {
    optional_text("name", patch.name.as_ref())?;
    patch.area.map_or(Ok(()), |a| area("area", a))
}
