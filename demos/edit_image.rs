//! Edit an existing image with a FLUX Kontext model.
//!
//! ```sh
//! BFL_API_KEY=... cargo run --example edit_image -- input.png
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};
use bfl_rs::types::recommended_concurrency;
use bfl_rs::{BflClient, EditRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = match std::env::var("BFL_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Set the BFL_API_KEY environment variable");
            return Ok(());
        }
    };

    let input_path = std::env::args().nth(1).unwrap_or_else(|| "input.png".to_string());
    let bytes = std::fs::read(&input_path)?;
    let input_image = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));

    let model = "flux-kontext-max";
    let client = BflClient::new(api_key).with_max_concurrent(recommended_concurrency(model));

    let request = EditRequest::new("make it look like a winter evening", input_image);

    println!("Editing {}...", input_path);
    let result = client.edit(model, &request).await?;
    let path = client.download(&result.url, "edited.png").await?;
    println!("Saved: {}", path.display());

    Ok(())
}
