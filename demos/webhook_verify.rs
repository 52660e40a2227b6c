//! Verify a completion webhook's signature.
//!
//! Simulates what a webhook receiver does with the raw body and the
//! `X-BFL-Signature` header before trusting the payload.
//!
//! ```sh
//! cargo run --example webhook_verify
//! ```

use bfl_rs::webhook;

fn main() {
    let secret = "whsec_demo";
    let body = br#"{"id":"abc-123","status":"Ready","result":{"sample":"https://delivery.bfl.ai/..."}}"#;

    // The header the API would attach to the delivery
    let header = webhook::sign_payload(body, secret);
    println!("X-BFL-Signature: {}", header);

    // Receiver side: verify before parsing
    assert!(webhook::verify_signature(body, &header, secret));
    println!("genuine payload verifies: true");

    let mut tampered = body.to_vec();
    tampered[10] ^= 1;
    println!(
        "tampered payload verifies: {}",
        webhook::verify_signature(&tampered, &header, secret)
    );

    println!(
        "missing prefix verifies:   {}",
        webhook::verify_signature(body, header.trim_start_matches("sha256="), secret)
    );
}
