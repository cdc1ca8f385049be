//! Report command - print dashboard figures

use anyhow::Result;
use agro_registry_domain::usecases::DashboardService;
use agro_registry_domain::{CropArea, DashboardStats, LandUse, LandUseKind, ReportStore, StateCount};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::ReportArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct Report {
    stats: DashboardStats,
    farms_by_state: Vec<StateCount>,
    crops_by_type: Vec<CropArea>,
    land_use: Vec<LandUse>,
}

pub async fn execute(args: ReportArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = super::open_store(&config).await?;

    let report = build_report(&DashboardService::new(store)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

async fn build_report<R: ReportStore + ?Sized>(dashboard: &DashboardService<R>) -> Result<Report> {
    Ok(Report {
        stats: dashboard.stats().await?,
        farms_by_state: dashboard.farms_by_state().await?,
        crops_by_type: dashboard.crops_by_type().await?,
        land_use: dashboard.land_use().await?,
    })
}

fn print_report(report: &Report) {
    println!("agro-registry Dashboard");
    println!("=======================");
    println!();
    println!("Producers:      {}", report.stats.total_producers);
    println!("Farms:          {}", report.stats.total_farms);
    println!("Crops:          {}", report.stats.total_crops);
    println!("Total hectares: {}", report.stats.total_hectares);

    println!();
    println!("Farms by state:");
    if report.farms_by_state.is_empty() {
        println!("  (none)");
    }
    for entry in &report.farms_by_state {
        println!("  {:<4} {}", entry.state, entry.count);
    }

    println!();
    println!("Planted area by crop:");
    if report.crops_by_type.is_empty() {
        println!("  (none)");
    }
    for entry in &report.crops_by_type {
        println!("  {:<16} {} ha", entry.crop, entry.area);
    }

    println!();
    println!("Land use:");
    for entry in &report.land_use {
        let label = match entry.kind {
            LandUseKind::Arable => "Arable",
            LandUseKind::Vegetation => "Vegetation",
        };
        println!("  {:<12} {} ha", label, entry.area);
    }
}
