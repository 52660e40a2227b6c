//! Generate several prompts concurrently under the client's concurrency gate.
//!
//! ```sh
//! BFL_API_KEY=... cargo run --example batch_generation
//! ```

use bfl_rs::{BflClient, GenerationRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = match std::env::var("BFL_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Set the BFL_API_KEY environment variable");
            return Ok(());
        }
    };

    let client = BflClient::new(api_key).with_max_concurrent(4);

    let prompts: Vec<String> = [
        "a red fox in fresh snow",
        "a lighthouse at dusk, long exposure",
        "a rainy neon-lit street, reflections",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    let template = GenerationRequest::new("").size(1024, 768);

    println!("Generating {} images...", prompts.len());
    let results = client.generate_batch("flux-2-pro", &prompts, &template).await;

    for (prompt, outcome) in prompts.iter().zip(results) {
        match outcome {
            Ok(result) => {
                let filename = format!("{}.png", result.id);
                client.download(&result.url, &filename).await?;
                println!("ok   {} -> {}", prompt, filename);
            }
            Err(err) => println!("fail {} ({})", prompt, err),
        }
    }

    Ok(())
}
