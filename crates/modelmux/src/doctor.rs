// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `modelmux doctor` command implementation.
//!
//! Runs diagnostic checks against the modelmux environment to identify
//! configuration issues, storage problems, and discovery connectivity.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use modelmux_config::ModelmuxConfig;
use modelmux_core::ModelmuxError;
use modelmux_discovery::{CatalogSource, OllamaClient};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

/// Run the `modelmux doctor` command.
///
/// Runs quick diagnostic checks. With `--deep`, runs additional intensive checks.
/// With `--plain`, disables colored output.
pub async fn run_doctor(
    config: &ModelmuxConfig,
    deep: bool,
    plain: bool,
) -> Result<(), ModelmuxError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = Vec::new();

    // Quick checks (always run)
    results.push(check_config().await);
    results.push(check_database(&config.storage.database_path).await);
    results.push(check_discovery(config).await);
    results.push(check_health_endpoint(config).await);

    // Deep checks (only with --deep)
    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_memory_baseline().await);
    }

    // Print results
    println!();
    println!("  modelmux doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        let duration_ms = result.duration.as_millis();
        let status_symbol;
        let line;

        match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    status_symbol = "✓".green().to_string();
                    line = format!(
                        "    {status_symbol} {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                } else {
                    line = format!(
                        "    [OK]   {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    status_symbol = "!".yellow().to_string();
                    line = format!(
                        "    {status_symbol} {:<20} {} ({duration_ms}ms)",
                        result.name,
                        result.message.yellow()
                    );
                } else {
                    line = format!(
                        "    [WARN] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    status_symbol = "✗".red().to_string();
                    line = format!(
                        "    {status_symbol} {:<20} {} ({duration_ms}ms)",
                        result.name,
                        result.message.red()
                    );
                } else {
                    line = format!(
                        "    [FAIL] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
        }

        println!("{line}");
    }

    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }

    println!();

    Ok(())
}

/// Check configuration loads without errors.
async fn check_config() -> CheckResult {
    let start = Instant::now();
    match modelmux_config::load_and_validate() {
        Ok(_) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Pass,
            message: "valid".to_string(),
            duration: start.elapsed(),
        },
        Err(errors) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Fail,
            message: format!("{} error(s)", errors.len()),
            duration: start.elapsed(),
        },
    }
}

/// Check database file exists, opens, and has a catalog.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(db_path);

    if !path.exists() {
        return CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Warn,
            message: format!("not found: {db_path} (will be created on first run)"),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let query_result: Result<i64, tokio_rusqlite::Error<rusqlite::Error>> = conn
                .call(|conn| -> Result<i64, rusqlite::Error> {
                    conn.query_row("SELECT COUNT(*) FROM model_pricing", [], |row| row.get(0))
                })
                .await;

            match query_result {
                Ok(count) => CheckResult {
                    name: "Database".to_string(),
                    status: CheckStatus::Pass,
                    message: format!("{count} catalog models"),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name: "Database".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("query failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Check the local discovery endpoint responds to a model listing.
async fn check_discovery(config: &ModelmuxConfig) -> CheckResult {
    let start = Instant::now();

    if !config.discovery.enabled {
        return CheckResult {
            name: "Discovery".to_string(),
            status: CheckStatus::Warn,
            message: "disabled in config".to_string(),
            duration: start.elapsed(),
        };
    }

    let client = match OllamaClient::with_timeout(
        &config.discovery.base_url,
        Duration::from_secs(config.discovery.timeout_secs),
    ) {
        Ok(c) => c,
        Err(e) => {
            return CheckResult {
                name: "Discovery".to_string(),
                status: CheckStatus::Fail,
                message: format!("HTTP client error: {e}"),
                duration: start.elapsed(),
            };
        }
    };

    match client.list_models().await {
        Ok(models) => CheckResult {
            name: "Discovery".to_string(),
            status: CheckStatus::Pass,
            message: format!("{} models visible", models.len()),
            duration: start.elapsed(),
        },
        Err(_) => CheckResult {
            name: "Discovery".to_string(),
            status: CheckStatus::Warn,
            message: format!(
                "not reachable at {} (local runtime may not be running)",
                config.discovery.base_url
            ),
            duration: start.elapsed(),
        },
    }
}

/// Check gateway health endpoint.
async fn check_health_endpoint(config: &ModelmuxConfig) -> CheckResult {
    let start = Instant::now();
    let host = &config.server.bind_address;
    let port = config.server.port;
    let url = format!("http://{host}:{port}/health");

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult {
                name: "Health endpoint".to_string(),
                status: CheckStatus::Fail,
                message: format!("HTTP client error: {e}"),
                duration: start.elapsed(),
            };
        }
    };

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => CheckResult {
            name: "Health endpoint".to_string(),
            status: CheckStatus::Pass,
            message: "reachable".to_string(),
            duration: start.elapsed(),
        },
        Ok(resp) => CheckResult {
            name: "Health endpoint".to_string(),
            status: CheckStatus::Warn,
            message: format!("status {}", resp.status()),
            duration: start.elapsed(),
        },
        Err(_) => CheckResult {
            name: "Health endpoint".to_string(),
            status: CheckStatus::Warn,
            message: format!("not reachable at {url} (server may not be running)"),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(db_path);

    if !path.exists() {
        return CheckResult {
            name: "DB integrity".to_string(),
            status: CheckStatus::Warn,
            message: "database not found (skipped)".to_string(),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result: Result<Vec<String>, tokio_rusqlite::Error<rusqlite::Error>> = conn
                .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                    let rows: Vec<String> = stmt
                        .query_map([], |row| row.get(0))?
                        .filter_map(|r| r.ok())
                        .collect();
                    Ok(rows)
                })
                .await;

            match result {
                Ok(rows) if rows.len() == 1 && rows[0] == "ok" => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Pass,
                    message: "ok".to_string(),
                    duration: start.elapsed(),
                },
                Ok(rows) => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("{} issue(s) found", rows.len()),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("check failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name: "DB integrity".to_string(),
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: memory baseline via jemalloc.
async fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);

        CheckResult {
            name: "Memory baseline".to_string(),
            status: CheckStatus::Pass,
            message: format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            duration: start.elapsed(),
        }
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult {
            name: "Memory baseline".to_string(),
            status: CheckStatus::Warn,
            message: "jemalloc not available on MSVC".to_string(),
            duration: start.elapsed(),
        }
    }
}
