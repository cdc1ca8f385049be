//! Application use cases / business logic

pub mod crops;
pub mod dashboard;
pub mod farms;
pub mod guards;
pub mod harvests;
pub mod producers;

#[cfg(test)]
pub(crate) mod testing;

pub use crops::CropService;
pub use dashboard::DashboardService;
pub use farms::FarmService;
pub use guards::{DocumentGuard, ReferenceGuard, require_exists};
pub use harvests::HarvestService;
pub use producers::ProducerService;
