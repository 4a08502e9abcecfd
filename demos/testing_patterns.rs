//! Testing patterns example - exercising retry and timeout logic without a network
//!
//! `ScriptedOperation` stands in for an upstream call whose outcomes are
//! decided in advance, and the assertion macros check how failures are
//! classified. Run `cargo test --example testing_patterns` to see the tests.

use std::time::Duration;

use slackwater::{with_timeout, Failure, Retry, TimeoutError};

// ============================================================================
// Domain
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Quote {
    symbol: String,
    price_cents: u64,
}

/// Map an upstream HTTP status to a failure.
fn upstream_failure(status: u16) -> Failure {
    match status {
        429 => Failure::new("rate limited").with_status(429),
        404 => Failure::new("unknown symbol").with_status(404),
        s => Failure::new(format!("upstream returned {}", s)).with_status(s),
    }
}

/// Fetch a quote through `fetch`, guarding every attempt with a deadline
/// and retrying transient failures.
async fn fetch_quote<F, Fut>(retry: &Retry, mut fetch: F) -> Result<Quote, Failure>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<Quote, Failure>>,
{
    retry
        .run(|attempt| {
            let call = fetch(attempt);
            async move {
                with_timeout(call, Duration::from_millis(250), Some("quote lookup timed out"))
                    .await
                    .map_err(Failure::from)
            }
        })
        .await
}

// ============================================================================
// Pure tests
// ============================================================================


// ============================================================================
// Async tests
// ============================================================================


#[tokio::main]
async fn main() {
    println!("=== Testing Patterns Example ===\n");
    println!("This example shows how to test retry and timeout logic.");
    println!("Run `cargo test --example testing_patterns` to see the tests in action.\n");
    println!("Key observations:");
    println!("  1. ScriptedOperation replaces the network with a fixed script");
    println!("  2. Paused tokio time makes deadlines deterministic");
    println!("  3. Classification is checked with assertion macros");

    let retry = Retry::new().with_max_retries(1);
    let result = fetch_quote(&retry, |_| async {
        Ok(Quote {
            symbol: "ACME".to_string(),
            price_cents: 12_345,
        })
    })
    .await;

    match result {
        Ok(quote) => println!("\nQuote: {} at {} cents", quote.symbol, quote.price_cents),
        Err(failure) => println!("\nLookup failed: {}", failure),
    }
    println!(
        "Sample classification: 429 retryable = {}, 404 retryable = {}",
        slackwater::is_retryable(Some(&upstream_failure(429))),
        slackwater::is_retryable(Some(&upstream_failure(404))),
    );
}
