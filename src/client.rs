use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::{BflError, Result};
use crate::request::{EditRequest, GenerationRequest};
use crate::retry::{self, DEFAULT_RETRY_AFTER_SECS};
use crate::types::{GenerationResult, Region};

/// Timeout for a single API request attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for downloading a generated image.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Default wall-clock deadline for one submit+poll lifecycle.
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// Default ceiling on concurrent in-flight generations per client.
const DEFAULT_MAX_CONCURRENT: usize = 24;

/// Authentication header carried on every API call.
const API_KEY_HEADER: &str = "x-key";

/// Async client for the BFL FLUX generation API.
///
/// Submits generation jobs, polls them to completion with capped backoff,
/// retries transient failures, and bounds the number of concurrent
/// generations with a semaphore. Clones share the HTTP connection pool and
/// the concurrency gate.
///
/// # Example
/// ```no_run
/// use bfl_rs::{BflClient, GenerationRequest, Region};
///
/// # async fn example() -> bfl_rs::Result<()> {
/// let client = BflClient::new("my-api-key").with_region(Region::Eu);
///
/// let result = client
///     .generate("flux-2-pro", &GenerationRequest::new("a sunset over mountains"))
///     .await?;
/// client.download(&result.url, "sunset.png").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BflClient {
    http: Client,
    base_url: String,
    api_key: String,
    poll_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl BflClient {
    /// Create a client for the global region with default limits.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: Region::Global.base_url().to_string(),
            api_key: api_key.into(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
        }
    }

    /// Route requests to a specific API region.
    pub fn with_region(mut self, region: Region) -> Self {
        self.base_url = region.base_url().to_string();
        self
    }

    /// Point the client at a custom endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the default 120 s polling deadline.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Cap concurrent in-flight generations for this client and its clones.
    ///
    /// See [`recommended_concurrency`](crate::types::recommended_concurrency)
    /// for the documented per-model limits.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max_concurrent));
        self
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Concurrency slots currently free.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    // ── Generation ──────────────────────────────────────────────────

    /// Generate an image from a text prompt.
    ///
    /// Validates dimensions locally, waits for a concurrency slot, submits
    /// the job, then polls until it is ready or the client's poll timeout
    /// elapses. The slot is held for the whole submit+poll lifetime.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        self.generate_with_timeout(model, request, self.poll_timeout)
            .await
    }

    /// [`generate`](Self::generate) with a per-call polling deadline.
    pub async fn generate_with_timeout(
        &self,
        model: &str,
        request: &GenerationRequest,
        deadline: Duration,
    ) -> Result<GenerationResult> {
        request.validate()?;
        let payload = request.payload();

        let _permit = self
            .permits
            .acquire()
            .await
            .expect("semaphore is never closed");
        let (id, result) = self.submit_and_poll(model, &payload, deadline).await?;
        build_result(id, result, &payload)
    }

    /// Edit an image with a FLUX Kontext model (image-to-image).
    ///
    /// Same submit+poll flow as [`generate`](Self::generate), without
    /// dimension validation; output size is determined by the model.
    pub async fn edit(&self, model: &str, request: &EditRequest) -> Result<GenerationResult> {
        let payload = request.payload();

        let _permit = self
            .permits
            .acquire()
            .await
            .expect("semaphore is never closed");
        let (id, result) = self.submit_and_poll(model, &payload, self.poll_timeout).await?;
        build_result(id, result, &payload)
    }

    /// Generate one image per prompt, concurrently.
    ///
    /// Every prompt reuses `template` with its prompt swapped in. Items
    /// run under the client's concurrency gate and fail independently;
    /// results come back in input order.
    pub async fn generate_batch(
        &self,
        model: &str,
        prompts: &[String],
        template: &GenerationRequest,
    ) -> Vec<Result<GenerationResult>> {
        let tasks = prompts.iter().map(|prompt| {
            let mut request = template.clone();
            request.prompt = prompt.clone();
            async move {
                let outcome = self.generate(model, &request).await;
                if let Err(ref err) = outcome {
                    tracing::error!(error = %err, prompt = %request.prompt, "Batch item failed");
                }
                outcome
            }
        });
        futures::future::join_all(tasks).await
    }

    // ── Download ────────────────────────────────────────────────────

    /// Download a generated image to a local path.
    ///
    /// Result URLs are pre-signed and expire roughly ten minutes after the
    /// job completes; download promptly. No API key is sent.
    pub async fn download(&self, url: &str, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let response = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| BflError::Network {
                context: format!("Failed to fetch image from {}", url),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(BflError::Api {
                status: response.status().as_u16(),
                code: "download_failed".to_string(),
                message: format!("Image URL returned HTTP {}", response.status().as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| BflError::Network {
            context: "Failed to read image bytes".to_string(),
            source: e,
        })?;
        tokio::fs::write(path, &bytes).await?;
        Ok(path.to_path_buf())
    }

    // ── Submit and poll ─────────────────────────────────────────────

    async fn submit_and_poll(
        &self,
        model: &str,
        payload: &Value,
        deadline: Duration,
    ) -> Result<(String, Value)> {
        let endpoint = format!("{}/v1/{}", self.base_url, model);

        let submit = retry::retry_request("Submit", || {
            self.request(Method::POST, &endpoint, Some(payload))
        })
        .await?;
        let (id, polling_url) = extract_job(&submit)?;
        tracing::debug!(%id, "Generation job submitted");

        let result = retry::poll(deadline, || {
            self.request(Method::GET, &polling_url, None)
        })
        .await?;
        Ok((id, result))
    }

    /// One attempt of an authenticated API call.
    async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut builder = self
            .http
            .request(method, url)
            .timeout(REQUEST_TIMEOUT)
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| BflError::Network {
            context: format!("Request to {} failed", url),
            source: e,
        })?;

        let status = response.status().as_u16();
        if status == 200 {
            return response.json().await.map_err(|e| BflError::Network {
                context: "Failed to parse API response".to_string(),
                source: e,
            });
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<Value>(&text) {
            Ok(body) => (
                body.get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                body.get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown error")
                    .to_string(),
            ),
            Err(_) => ("unknown".to_string(), text),
        };
        Err(BflError::from_status(status, &code, &message, retry_after))
    }
}

/// Pull the job id and polling URL out of a submit response.
///
/// A missing id falls back to the last `=`-separated segment of the polling
/// URL, which carries the id as a query parameter.
fn extract_job(submit: &Value) -> Result<(String, String)> {
    let polling_url = submit
        .get("polling_url")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| BflError::InvalidResponse("Response missing polling_url".to_string()))?;

    let id = submit
        .get("id")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| {
            polling_url
                .rsplit('=')
                .next()
                .unwrap_or(polling_url.as_str())
                .to_string()
        });

    Ok((id, polling_url))
}

/// Assemble a [`GenerationResult`] from the terminal Ready payload.
///
/// Width and height fall back to the submitted payload's values; zero means
/// neither side reported them (image edits).
fn build_result(id: String, result: Value, payload: &Value) -> Result<GenerationResult> {
    let url = result
        .get("sample")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| BflError::InvalidResponse("Result missing sample URL".to_string()))?;

    let dimension = |key: &str| {
        result
            .get(key)
            .or_else(|| payload.get(key))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32
    };

    Ok(GenerationResult {
        id,
        url,
        width: dimension("width"),
        height: dimension("height"),
        raw: result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_defaults() {
        let client = BflClient::new("key");
        assert_eq!(client.base_url(), "https://api.bfl.ai");
        assert_eq!(client.poll_timeout, DEFAULT_POLL_TIMEOUT);
        assert_eq!(client.available_permits(), DEFAULT_MAX_CONCURRENT);
    }

    #[test]
    fn test_client_builder() {
        let client = BflClient::new("key")
            .with_region(Region::Us)
            .with_poll_timeout(Duration::from_secs(30))
            .with_max_concurrent(6);
        assert_eq!(client.base_url(), "https://api.us.bfl.ai");
        assert_eq!(client.poll_timeout, Duration::from_secs(30));
        assert_eq!(client.available_permits(), 6);
    }

    #[test]
    fn test_custom_base_url_trims_trailing_slash() {
        let client = BflClient::new("key").with_base_url("http://localhost:9000/");
        assert_eq!(client.base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_clones_share_the_gate() {
        let client = BflClient::new("key").with_max_concurrent(2);
        let clone = client.clone();
        let permit = client.permits.try_acquire().unwrap();
        assert_eq!(clone.available_permits(), 1);
        drop(permit);
        assert_eq!(clone.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_gate_blocks_excess_callers() {
        let client = BflClient::new("key").with_max_concurrent(2);

        let first = client.permits.clone().acquire_owned().await.unwrap();
        let _second = client.permits.clone().acquire_owned().await.unwrap();
        assert_eq!(client.available_permits(), 0);

        // A third caller cannot enter while both slots are held.
        assert!(client.permits.try_acquire().is_err());

        let permits = client.permits.clone();
        let waiter = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.unwrap();
        });

        // Still blocked until a slot frees.
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
    }

    #[test]
    fn test_extract_job_with_id() {
        let submit = json!({
            "id": "abc-123",
            "polling_url": "https://api.bfl.ai/v1/get_result?id=abc-123"
        });
        let (id, url) = extract_job(&submit).unwrap();
        assert_eq!(id, "abc-123");
        assert_eq!(url, "https://api.bfl.ai/v1/get_result?id=abc-123");
    }

    #[test]
    fn test_extract_job_id_falls_back_to_polling_url() {
        let submit = json!({
            "polling_url": "https://api.bfl.ai/v1/get_result?id=xyz-789"
        });
        let (id, _) = extract_job(&submit).unwrap();
        assert_eq!(id, "xyz-789");
    }

    #[test]
    fn test_extract_job_missing_polling_url() {
        let result = extract_job(&json!({"id": "abc"}));
        assert!(matches!(result, Err(BflError::InvalidResponse(_))));
    }

    #[test]
    fn test_build_result_uses_server_dimensions() {
        let result = build_result(
            "job-1".to_string(),
            json!({"sample": "https://img", "width": 1280, "height": 720}),
            &json!({"width": 1024, "height": 1024}),
        )
        .unwrap();
        assert_eq!(result.url, "https://img");
        assert_eq!(result.width, 1280);
        assert_eq!(result.height, 720);
    }

    #[test]
    fn test_build_result_falls_back_to_request_dimensions() {
        let result = build_result(
            "job-1".to_string(),
            json!({"sample": "https://img"}),
            &json!({"width": 1024, "height": 768}),
        )
        .unwrap();
        assert_eq!(result.width, 1024);
        assert_eq!(result.height, 768);
    }

    #[test]
    fn test_build_result_missing_sample_fails() {
        let result = build_result(
            "job-1".to_string(),
            json!({"status": "Ready"}),
            &json!({"width": 1024, "height": 1024}),
        );
        assert!(matches!(result, Err(BflError::InvalidResponse(_))));
    }

    #[test]
    fn test_build_result_keeps_raw_payload() {
        let result = build_result(
            "job-1".to_string(),
            json!({"sample": "https://img", "seed": 42}),
            &json!({"width": 64, "height": 64}),
        )
        .unwrap();
        assert_eq!(result.raw["seed"], 42);
    }
}
