//! HTTP route handlers: health, entity CRUD and dashboard figures.

use std::sync::Arc;

use agro_registry_domain::{
    Crop, CropArea, CropPatch, DashboardStats, Farm, FarmPatch, Harvest, HarvestPatch, LandUse,
    NewCrop, NewFarm, NewHarvest, NewProducer, Producer, ProducerDetail, ProducerPatch,
    ProducerSummary, StateCount,
};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::error::ApiError;
use super::state::AppState;
use super::validate;

type Shared = State<Arc<AppState>>;
type ApiResult<T> = Result<T, ApiError>;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not_found", "message": "route not found" })),
    )
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

// Producers

pub(crate) async fn create_producer(
    State(state): Shared,
    Json(input): Json<NewProducer>,
) -> ApiResult<(StatusCode, Json<Producer>)> {
    validate::new_producer(&input)?;
    let producer = state.producers.create(input).await?;
    Ok((StatusCode::CREATED, Json(producer)))
}

/// GET /producers lists every producer with its farms.
pub(crate) async fn list_producers(
    State(state): Shared,
) -> ApiResult<Json<Vec<ProducerSummary>>> {
    Ok(Json(state.producers.list().await?))
}

/// GET /producers/{id} returns the producer with its farms, harvests and crops.
pub(crate) async fn get_producer(
    State(state): Shared,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProducerDetail>> {
    Ok(Json(state.producers.detail(id).await?))
}

pub(crate) async fn update_producer(
    State(state): Shared,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProducerPatch>,
) -> ApiResult<Json<Producer>> {
    validate::producer_patch(&patch)?;
    Ok(Json(state.producers.update(id, patch).await?))
}

pub(crate) async fn delete_producer(
    State(state): Shared,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.producers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Farms

pub(crate) async fn create_farm(
    State(state): Shared,
    Json(input): Json<NewFarm>,
) -> ApiResult<(StatusCode, Json<Farm>)> {
    validate::new_farm(&input)?;
    let farm = state.farms.create(input).await?;
    Ok((StatusCode::CREATED, Json(farm)))
}

pub(crate) async fn list_farms(State(state): Shared) -> ApiResult<Json<Vec<Farm>>> {
    Ok(Json(state.farms.list().await?))
}

pub(crate) async fn get_farm(State(state): Shared, Path(id): Path<Uuid>) -> ApiResult<Json<Farm>> {
    Ok(Json(state.farms.get(id).await?))
}

pub(crate) async fn update_farm(
    State(state): Shared,
    Path(id): Path<Uuid>,
    Json(patch): Json<FarmPatch>,
) -> ApiResult<Json<Farm>> {
    validate::farm_patch(&patch)?;
    Ok(Json(state.farms.update(id, patch).await?))
}

pub(crate) async fn delete_farm(State(state): Shared, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.farms.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Harvests

pub(crate) async fn create_harvest(
    State(state): Shared,
    Json(input): Json<NewHarvest>,
) -> ApiResult<(StatusCode, Json<Harvest>)> {
    validate::new_harvest(&input)?;
    let harvest = state.harvests.create(input).await?;
    Ok((StatusCode::CREATED, Json(harvest)))
}

pub(crate) async fn list_harvests(State(state): Shared) -> ApiResult<Json<Vec<Harvest>>> {
    Ok(Json(state.harvests.list().await?))
}

pub(crate) async fn get_harvest(
    State(state): Shared,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Harvest>> {
    Ok(Json(state.harvests.get(id).await?))
}

pub(crate) async fn update_harvest(
    State(state): Shared,
    Path(id): Path<Uuid>,
    Json(patch): Json<HarvestPatch>,
) -> ApiResult<Json<Harvest>> {
    validate::harvest_patch(&patch)?;
    Ok(Json(state.harvests.update(id, patch).await?))
}

pub(crate) async fn delete_harvest(
    State(state): Shared,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.harvests.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Crops

pub(crate) async fn create_crop(
    State(state): Shared,
    Json(input): Json<NewCrop>,
) -> ApiResult<(StatusCode, Json<Crop>)> {
    validate::new_crop(&input)?;
    let crop = state.crops.create(input).await?;
    Ok((StatusCode::CREATED, Json(crop)))
}

pub(crate) async fn list_crops(State(state): Shared) -> ApiResult<Json<Vec<Crop>>> {
    Ok(Json(state.crops.list().await?))
}

pub(crate) async fn get_crop(State(state): Shared, Path(id): Path<Uuid>) -> ApiResult<Json<Crop>> {
    Ok(Json(state.crops.get(id).await?))
}

pub(crate) async fn update_crop(
    State(state): Shared,
    Path(id): Path<Uuid>,
    Json(patch): Json<CropPatch>,
) -> ApiResult<Json<Crop>> {
    validate::crop_patch(&patch)?;
    Ok(Json(state.crops.update(id, patch).await?))
}

pub(crate) async fn delete_crop(State(state): Shared, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.crops.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Dashboard

pub(crate) async fn dashboard_stats(State(state): Shared) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.dashboard.stats().await?))
}

pub(crate) async fn dashboard_farms_by_state(
    State(state): Shared,
) -> ApiResult<Json<Vec<StateCount>>> {
    Ok(Json(state.dashboard.farms_by_state().await?))
}

pub(crate) async fn dashboard_crops_by_type(
    State(state): Shared,
) -> ApiResult<Json<Vec<CropArea>>> {
    Ok(Json(state.dashboard.crops_by_type().await?))
}

pub(crate) async fn dashboard_land_use(State(state): Shared) -> ApiResult<Json<Vec<LandUse>>> {
    Ok(Json(state.dashboard.land_use().await?))
}
