// src/handler.rs

//! AWS Lambda handler for the harvester.

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::{DeletionGuard, GuardConfig, RunReport, SyncEngine, run_collection};
use crate::services::{self, ScrapeContext};
use crate::storage::S3Store;
use crate::utils::http;

/// Config loader for the Lambda environment.
///
/// Reads TOML files relative to the S3 store prefix, so the config lives
/// next to the data it controls.
pub struct LambdaConfigLoader {
    store: S3Store,
    prefix: String,
}

impl LambdaConfigLoader {
    pub fn new(store: S3Store, config_prefix: &str) -> Self {
        Self {
            store,
            prefix: config_prefix.trim_matches('/').to_string(),
        }
    }

    pub async fn load_config(&self) -> Result<Config> {
        let key = format!("{}/config.toml", self.prefix);
        info!("Loading config file from S3: {}", key);

        let bytes = self
            .store
            .read_bytes_optional(&key)
            .await?
            .ok_or_else(|| AppError::config(format!("Config file not found in S3: {key}")))?;

        let content = String::from_utf8(bytes)
            .map_err(|e| AppError::config(format!("Config file {key} is not valid UTF-8: {e}")))?;
        Ok(toml::from_str(&content)?)
    }
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    info!("Handling event: {:?}", event);

    match run_lambda_collection().await {
        Ok(report) => {
            let status = if report.has_failures() {
                "partial"
            } else {
                "success"
            };
            info!(
                "Lambda execution finished ({status}): {} inserted, {} removed",
                report.total_inserted(),
                report.total_removed()
            );
            Ok(serde_json::json!({ "status": status, "report": report }))
        }
        Err(e) => {
            error!("Lambda execution failed: {}", e);
            Ok(serde_json::json!({ "status": "error", "message": e.to_string() }))
        }
    }
}

/// Internal collection logic for the Lambda environment.
async fn run_lambda_collection() -> Result<RunReport> {
    let store = S3Store::from_env().await?;
    let config_prefix =
        std::env::var("CONFIG_S3_PREFIX").unwrap_or_else(|_| "config".to_string());

    let loader = LambdaConfigLoader::new(store.clone(), &config_prefix);
    let config = loader.load_config().await?;
    config.validate()?;

    let api_key = std::env::var(&config.api.api_key_env).ok();
    if api_key.is_none() {
        return Err(AppError::config(format!(
            "{} not set in the environment",
            config.api.api_key_env
        )));
    }

    let client = http::create_api_client(&config.http, &config.api, api_key.as_deref())?;
    let config = Arc::new(config);
    let ctx = ScrapeContext::new(client, Arc::clone(&config));

    let engine = SyncEngine::with_guard(DeletionGuard::with_config(GuardConfig::from(
        &config.sync,
    )));
    let scrapers = services::all_scrapers();

    run_collection(&ctx, &store, &engine, &scrapers).await
}
