//! Retry Patterns Example
//!
//! Demonstrates the timeout guard and the retry driver on simulated
//! upstream calls:
//! - Basic retry of transient failures
//! - Backoff strategies
//! - Conditional retry (retry_if)
//! - Retry with a hook
//! - Timeout handling
//! - A guarded attempt inside a retry loop
//!
//! Run with: cargo run --example retry_patterns
//!
//! The driver's `tracing` events are printed at DEBUG level.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use slackwater::prelude::*;
use slackwater::retry::RetryEvent;

// ==================== Basic Retry ====================

/// Example 1: Transient failures are retried until the call succeeds.
async fn example_basic_retry() {
    println!("\n=== Example 1: Basic Retry ===");

    let attempts = Arc::new(AtomicU32::new(0));

    let result = Retry::new()
        .with_max_retries(5)
        .with_backoff(BackoffPolicy::exponential(Duration::from_millis(50)))
        .run(|attempt| {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                println!("  Attempt {}", attempt);
                if attempt < 2 {
                    Err(Failure::new("connection reset").with_code("ECONNRESET"))
                } else {
                    Ok("success!")
                }
            }
        })
        .await;

    match result {
        Ok(value) => println!(
            "Success after {} calls: {}",
            attempts.load(Ordering::SeqCst),
            value
        ),
        Err(failure) => println!("Gave up: {}", failure),
    }
}

// ==================== Backoff Strategies ====================

/// Example 2: How delays grow under each strategy.
fn example_backoff_strategies() {
    println!("\n=== Example 2: Backoff Strategies ===");

    let base = Duration::from_millis(100);
    let policies = [
        ("constant", BackoffPolicy::constant(base)),
        ("linear", BackoffPolicy::linear(base)),
        ("exponential", BackoffPolicy::exponential(base)),
        ("fibonacci", BackoffPolicy::fibonacci(base)),
    ];

    for (name, policy) in policies {
        let delays: Vec<_> = (0..5).map(|n| policy.delay(n).as_millis()).collect();
        println!("{:>12}: {:?} ms", name, delays);
    }

    let defaults: Vec<_> = (0..5).map(|n| default_backoff(n).as_millis()).collect();
    println!("{:>12}: {:?} ms", "default", defaults);
}

// ==================== Conditional Retry ====================

/// Example 3: Only 5xx responses are retried; a 404 stops immediately.
async fn example_conditional_retry() {
    println!("\n=== Example 3: Conditional Retry ===");

    let calls = AtomicU32::new(0);

    let result = Retry::new()
        .with_max_retries(5)
        .with_backoff(|_: u32| Duration::from_millis(10))
        .retry_if(|failure: &Failure| failure.status.is_some_and(|s| s >= 500))
        .run(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Failure::new("user not found").with_status(404)) }
        })
        .await;

    println!(
        "Result: {:?} after {} call(s)",
        result,
        calls.load(Ordering::SeqCst)
    );
}

// ==================== Retry with Hooks ====================

/// Example 4: Observe every retry before the driver sleeps.
async fn example_retry_with_hooks() {
    println!("\n=== Example 4: Retry with Hooks ===");

    let result = Retry::new()
        .with_max_retries(3)
        .with_backoff(BackoffPolicy::linear(Duration::from_millis(20)))
        .on_retry(|event: &RetryEvent<'_, Failure>| {
            println!(
                "  attempt {} failed ({}), next try in {:?}, elapsed {:?}",
                event.attempt, event.error, event.next_delay, event.elapsed
            );
        })
        .run(|attempt| async move {
            if attempt < 3 {
                Err(Failure::new("service unavailable").with_status(503))
            } else {
                Ok(attempt)
            }
        })
        .await;

    println!("Result: {:?}", result);
}

// ==================== Timeout ====================

/// Example 5: A slow operation loses the race against its deadline.
async fn example_timeout() {
    println!("\n=== Example 5: Timeout ===");

    let fast = with_timeout(
        async { Ok::<_, Failure>("fast response") },
        Duration::from_millis(100),
        None,
    )
    .await;
    println!("Fast: {:?}", fast);

    let slow = with_timeout(
        async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, Failure>("slow response")
        },
        Duration::from_millis(100),
        Some("profile lookup exceeded 100ms"),
    )
    .await;

    match slow {
        Ok(value) => println!("Slow: {}", value),
        Err(TimeoutError::Timeout { message, .. }) => println!("Slow: timed out ({})", message),
        Err(TimeoutError::Inner(failure)) => println!("Slow: failed ({})", failure),
    }
}

// ==================== Retry with Timeout ====================

/// Example 6: Each attempt gets its own deadline; a timed-out attempt is
/// retried because `ETIMEDOUT` is transient.
async fn example_retry_with_timeout() {
    println!("\n=== Example 6: Retry with Timeout ===");

    let result = Retry::new()
        .with_max_retries(3)
        .with_backoff(|_: u32| Duration::from_millis(10))
        .run(|attempt| async move {
            let latency = if attempt == 0 { 300 } else { 10 };
            with_timeout(
                async move {
                    tokio::time::sleep(Duration::from_millis(latency)).await;
                    Ok::<_, Failure>(format!("answered on attempt {}", attempt))
                },
                Duration::from_millis(100),
                None,
            )
            .await
            .map_err(Failure::from)
        })
        .await;

    println!("Result: {:?}", result);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("======================================");
    println!("       Retry Patterns Example         ");
    println!("======================================");

    example_basic_retry().await;
    example_backoff_strategies();
    example_conditional_retry().await;
    example_retry_with_hooks().await;
    example_timeout().await;
    example_retry_with_timeout().await;

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
