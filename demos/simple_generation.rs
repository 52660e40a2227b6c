//! Generate a single image from a text prompt and save it locally.
//!
//! Requires a BFL API key:
//!
//! ```sh
//! BFL_API_KEY=... cargo run --example simple_generation
//! ```

use bfl_rs::{BflClient, GenerationRequest, OutputFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = match std::env::var("BFL_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Set the BFL_API_KEY environment variable");
            return Ok(());
        }
    };

    let client = BflClient::new(api_key);

    let request = GenerationRequest::new("a serene mountain landscape at golden hour")
        .size(1024, 1024)
        .output_format(OutputFormat::Png);

    println!("Generating image...");
    let result = client.generate("flux-2-pro", &request).await?;
    println!("Job {} finished: {}", result.id, result.url);

    // The URL expires about ten minutes after completion
    let path = client.download(&result.url, "output.png").await?;
    println!("Saved: {}", path.display());

    Ok(())
}
