//! Doctor command - validate configuration and show status

use anyhow::Result;
use agro_registry_adapters::store::SqliteRegistryStore;
use agro_registry_domain::ReportStore;
use axum::http::HeaderValue;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    database: CheckResult,
    server: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        database: CheckResult::error("Not checked"),
        server: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.database = check_database(&config.general.database_path).await;
        report.server = check_server(config);
    }

    // Determine overall status
    let checks = [&report.config, &report.database, &report.server];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_database(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::warn(format!(
            "Database {} does not exist yet; 'serve' or 'seed' will create it",
            path.display()
        ));
    }

    let store = match SqliteRegistryStore::open_existing(path).await {
        Ok(s) => s,
        Err(e) => {
            return CheckResult::error(format!(
                "Failed to open database {}: {}",
                path.display(),
                e
            ));
        }
    };

    if let Err(e) = store.ping().await {
        return CheckResult::error(format!("Database not responding: {}", e));
    }

    let (producers, farms, crops) = match (
        store.count_producers().await,
        store.count_farms().await,
        store.count_crops().await,
    ) {
        (Ok(p), Ok(f), Ok(c)) => (p, f, c),
        _ => return CheckResult::error("Failed to count registry records"),
    };

    let details = serde_json::json!({
        "path": path.display().to_string(),
        "producers": producers,
        "farms": farms,
        "crops": crops,
    });

    CheckResult::ok(format!(
        "{}: {} producers, {} farms, {} crops",
        path.display(),
        producers,
        farms,
        crops
    ))
    .with_details(details)
}

fn check_server(config: &AppConfig) -> CheckResult {
    let server = &config.server;

    if server.port == 0 {
        return CheckResult::error("Server port must not be 0");
    }

    let invalid: Vec<&String> = server
        .cors_origins
        .iter()
        .filter(|origin| origin.parse::<HeaderValue>().is_err())
        .collect();
    if !invalid.is_empty() {
        return CheckResult::error(format!("Invalid CORS origins: {:?}", invalid));
    }

    if server.cors_origins.is_empty() {
        return CheckResult::warn(format!(
            "Listening on {}:{}, no CORS origins allowed",
            server.host, server.port
        ));
    }

    CheckResult::ok(format!(
        "Listening on {}:{}, CORS origins: {}",
        server.host,
        server.port,
        server.cors_origins.join(", ")
    ))
}

fn print_report(report: &DoctorReport) {
    println!("agro-registry Doctor Report");
    println!("===========================");
    println!();

    print_check("Config", &report.config);
    print_check("Database", &report.database);
    print_check("Server", &report.server);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: agro-registry serve");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_check_rejects_bad_origin() {
        let mut config = AppConfig::default();
        assert!(check_server(&config).is_ok());

        config.server.cors_origins = vec!["http://bad\norigin".to_string()];
        assert!(check_server(&config).is_error());

        config.server.cors_origins.clear();
        assert_eq!(check_server(&config).status, "warn");
    }

    #[tokio::test]
    async fn test_database_check_leaves_missing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.sqlite");

        let missing = check_database(&path).await;
        assert_eq!(missing.status, "warn");
        assert!(!path.exists());

        SqliteRegistryStore::new(&path).await.unwrap();
        let present = check_database(&path).await;
        assert!(present.is_ok());
        assert_eq!(present.details.unwrap()["producers"], 0);
    }
}
