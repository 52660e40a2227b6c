use serde_json::{json, Map, Value};

use crate::error::{BflError, Result};
use crate::types::OutputFormat;

/// Maximum total pixel count accepted by the API (4 megapixels).
const MAX_PIXELS: u64 = 4_000_000;

/// Width and height must be multiples of this.
const DIMENSION_STEP: u32 = 16;

/// Smallest accepted edge length in pixels.
const MIN_DIMENSION: u32 = 64;

/// Reference images beyond the first are capped at this many.
const MAX_REFERENCE_IMAGES: usize = 7;

/// Builder for a text-to-image generation request.
///
/// Defaults to 1024x1024 png output with safety tolerance 2.
///
/// # Example
/// ```
/// use bfl_rs::{GenerationRequest, OutputFormat};
///
/// let request = GenerationRequest::new("a sunset over mountains")
///     .size(1024, 768)
///     .seed(42)
///     .output_format(OutputFormat::Jpeg);
///
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub seed: Option<u64>,
    pub safety_tolerance: u8,
    pub output_format: OutputFormat,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub extra: Map<String, Value>,
}

impl GenerationRequest {
    /// Create a new request with the given prompt and default parameters.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: 1024,
            height: 1024,
            seed: None,
            safety_tolerance: 2,
            output_format: OutputFormat::Png,
            webhook_url: None,
            webhook_secret: None,
            extra: Map::new(),
        }
    }

    /// Set output dimensions. Both must be multiples of 16, at least 64,
    /// and the product may not exceed 4,000,000 pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set a fixed seed for reproducible output. Unset, the server picks one.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the moderation tolerance, 0 (strict) to 5 (permissive).
    pub fn safety_tolerance(mut self, tolerance: u8) -> Self {
        self.safety_tolerance = tolerance;
        self
    }

    /// Set the output image format.
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Register a webhook for completion notification. The secret is used
    /// by the server to sign the delivered payload; verify it with
    /// [`crate::webhook::verify_signature`].
    pub fn webhook(mut self, url: impl Into<String>, secret: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self.webhook_secret = Some(secret.into());
        self
    }

    /// Attach a model-specific parameter not covered by the typed fields
    /// (e.g. `"prompt_upsampling": true`). Typed fields always win over a
    /// colliding extra key.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Check the dimension constraints without touching the network.
    pub fn validate(&self) -> Result<()> {
        validate_dimensions(self.width, self.height)
    }

    /// Build the JSON request body.
    ///
    /// Extras are inserted first so the validated fields can never be
    /// clobbered by an extension key.
    pub fn payload(&self) -> Value {
        let mut body = self.extra.clone();
        body.insert("prompt".to_string(), json!(self.prompt));
        body.insert("width".to_string(), json!(self.width));
        body.insert("height".to_string(), json!(self.height));
        body.insert("safety_tolerance".to_string(), json!(self.safety_tolerance));
        body.insert("output_format".to_string(), json!(self.output_format.as_str()));
        if let Some(seed) = self.seed {
            body.insert("seed".to_string(), json!(seed));
        }
        if let Some(ref url) = self.webhook_url {
            body.insert("webhook_url".to_string(), json!(url));
        }
        if let Some(ref secret) = self.webhook_secret {
            body.insert("webhook_secret".to_string(), json!(secret));
        }
        Value::Object(body)
    }
}

/// Builder for an image-to-image edit request (FLUX Kontext models).
///
/// Takes an input image as a base64 string or URL plus edit instructions.
/// Up to seven additional reference images are sent as `input_image_2`
/// through `input_image_8`; any beyond that are dropped.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub prompt: String,
    pub input_image: String,
    pub reference_images: Vec<String>,
    pub extra: Map<String, Value>,
}

impl EditRequest {
    /// Create a new edit request from instructions and an input image.
    pub fn new(prompt: impl Into<String>, input_image: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            input_image: input_image.into(),
            reference_images: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Add an additional reference image (base64 or URL).
    pub fn reference(mut self, image: impl Into<String>) -> Self {
        self.reference_images.push(image.into());
        self
    }

    /// Attach a model-specific parameter not covered by the typed fields.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Build the JSON request body.
    pub fn payload(&self) -> Value {
        let mut body = self.extra.clone();
        body.insert("prompt".to_string(), json!(self.prompt));
        body.insert("input_image".to_string(), json!(self.input_image));
        for (i, image) in self
            .reference_images
            .iter()
            .take(MAX_REFERENCE_IMAGES)
            .enumerate()
        {
            body.insert(format!("input_image_{}", i + 2), json!(image));
        }
        Value::Object(body)
    }
}

/// Reject dimensions the API would refuse, before any network call.
pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width % DIMENSION_STEP != 0 {
        return Err(BflError::Validation(format!(
            "Width {} must be a multiple of {}",
            width, DIMENSION_STEP
        )));
    }
    if height % DIMENSION_STEP != 0 {
        return Err(BflError::Validation(format!(
            "Height {} must be a multiple of {}",
            height, DIMENSION_STEP
        )));
    }
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(BflError::Validation(format!(
            "Total pixels ({}x{}) exceeds 4MP limit",
            width, height
        )));
    }
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(BflError::Validation(format!(
            "Minimum dimension is {} pixels",
            MIN_DIMENSION
        )));
    }
    Ok(())
}
