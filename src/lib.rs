//! # bfl-rs
//!
//! Async Rust client for the [BFL FLUX](https://docs.bfl.ai) image
//! generation API.
//!
//! Provides a typed client for the submit-and-poll generation flow, with
//! local parameter validation, bounded retries with backoff, a per-client
//! concurrency gate, batch generation, image editing (FLUX Kontext), and
//! webhook signature verification.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bfl_rs::{BflClient, GenerationRequest, OutputFormat, Region};
//!
//! # async fn example() -> bfl_rs::Result<()> {
//! let client = BflClient::new(std::env::var("BFL_API_KEY").unwrap())
//!     .with_region(Region::Global);
//!
//! let request = GenerationRequest::new("a serene mountain landscape at golden hour")
//!     .size(1024, 1024)
//!     .output_format(OutputFormat::Png);
//!
//! let result = client.generate("flux-2-pro", &request).await?;
//! println!("Generated: {}", result.url);
//!
//! // Result URLs expire after ~10 minutes
//! client.download(&result.url, "output.png").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Each client instance holds a counting semaphore (24 permits by default)
//! and every generation occupies one permit from submission until its job
//! reaches a terminal state. Clones share the gate, so a single limit can
//! be enforced across tasks. For models with a lower documented ceiling,
//! size the gate with [`BflClient::with_max_concurrent`] and
//! [`types::recommended_concurrency`].
//!
//! ## Webhooks
//!
//! Pass a webhook URL and secret via [`GenerationRequest::webhook`] and the
//! API will POST the completion payload with an `X-BFL-Signature` header.
//! Verify it with [`webhook::verify_signature`] before trusting the body.

pub mod client;
pub mod error;
pub mod request;
pub mod retry;
pub mod types;
pub mod webhook;

pub use client::BflClient;
pub use error::{BflError, Result};
pub use request::{EditRequest, GenerationRequest};
pub use types::{GenerationResult, JobStatus, OutputFormat, Region};
