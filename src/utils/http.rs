// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, HttpConfig};

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Create a client for the vendor API with the shared request headers
/// attached to every request (accept, locale, market, API key).
pub fn create_api_client(
    http: &HttpConfig,
    api: &ApiConfig,
    api_key: Option<&str>,
) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("app-locale"),
        header_value(&api.locale)?,
    );
    headers.insert(
        HeaderName::from_static("app-market"),
        header_value(&api.market)?,
    );
    if let Some(key) = api_key {
        headers.insert(HeaderName::from_static("apikey"), header_value(key)?);
    }

    let client = Client::builder()
        .user_agent(&http.user_agent)
        .timeout(Duration::from_secs(http.timeout_secs))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("Invalid header value '{value}': {e}")))
}

/// Fetch a URL and deserialize the JSON response.
pub async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json::<T>().await?)
}

/// Fetch a URL with query parameters and deserialize the JSON response.
pub async fn fetch_json_with_query<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json::<T>().await?)
}

/// Fetch a page and return its raw HTML.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}
