//! Example: Configuring retry behavior for LLM API calls
//!
//! This example demonstrates:
//! 1. Preset policies (default, custom, conservative, no-retry, high-throughput)
//! 2. Recovering from rate limiting with the single-result executor
//! 3. Streaming retry, where a restart replays items already delivered
//!
//! Run with:
//! ```bash
//! RUST_LOG=backstop_core=debug cargo run -p backstop-core --example retry_config
//! ```

use backstop_core::prelude::*;
use futures::{StreamExt, stream};
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Retries up to 5 times starting at 0.5s, capped at 30s.
fn custom_policy() -> Result<RetryPolicy, ConfigError> {
    RetryPolicy::new(5, 0.5, 30.0, 2.0, true)
}

/// Slower, predictable backoff for providers with strict quotas.
fn aggressive_backoff_policy() -> Result<RetryPolicy, ConfigError> {
    RetryPolicy::new(3, 2.0, 120.0, 3.0, false)
}

/// Fewer retries for third-party gateways.
fn conservative_policy() -> Result<RetryPolicy, ConfigError> {
    RetryPolicy::builder().max_retries(2).build()
}

/// Quick retries that spread out concurrent requests.
fn high_throughput_policy() -> Result<RetryPolicy, ConfigError> {
    RetryPolicy::builder()
        .max_retries(2)
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(5))
        .jitter(true)
        .build()
}

fn describe(label: &str, policy: &RetryPolicy) {
    let schedule: Vec<String> = (0..policy.max_retries())
        .map(|attempt| format!("{:.2}s", policy.delay_for(attempt).as_secs_f64()))
        .collect();
    println!(
        "  {:<16} attempts={} base={} jitter={:<5} schedule=[{}]",
        label,
        policy.max_attempts(),
        policy.exponential_base(),
        policy.jitter(),
        schedule.join(", ")
    );
}

/// Example 1: Preset policies and their backoff schedules (jittered ones vary per run)
fn example_presets() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Preset Policies ===\n");

    describe("default", &RetryPolicy::default());
    describe("custom", &custom_policy()?);
    describe("aggressive", &aggressive_backoff_policy()?);
    describe("conservative", &conservative_policy()?);
    describe("no-retry", &RetryPolicy::disabled());
    describe("high-throughput", &high_throughput_policy()?);

    let from_env = RetryPolicy::from_env()?;
    describe("from env", &from_env);

    Ok(())
}

/// Example 2: A call that hits rate limiting twice before succeeding
async fn example_rate_limited_call() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Recovering From Rate Limiting ===\n");

    let executor = RetryExecutor::new(high_throughput_policy()?);
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let answer = executor
        .retry(
            || async {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                println!("  Call {}", call);
                match call {
                    1 => Err(ApiError::new("Resource exhausted").with_code(429)),
                    2 => Err(ApiError::new("Service Unavailable")),
                    _ => Ok("Machine learning is ..."),
                }
            },
            "generate content",
        )
        .await?;

    println!(
        "\n  Answer after {} calls in {:?}: {}",
        calls.load(Ordering::SeqCst),
        start.elapsed(),
        answer
    );

    let refused: Result<(), ApiError> = executor
        .retry(
            || async { Err(ApiError::new("API key not valid").with_code(400)) },
            "generate content",
        )
        .await;
    if let Err(err) = refused {
        println!("  Permanent failure is not retried: {}", err);
    }

    Ok(())
}

/// Example 3: Streaming retry with visible duplication
async fn example_streaming_restart() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Streaming Restart ===\n");

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let mut chunks = RetryExecutor::new(high_throughput_policy()?).retry_stream(
        move || {
            let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
            let tail = if first {
                Err(ApiError::new("Connection error: stream reset"))
            } else {
                Ok("chunk-2")
            };
            stream::iter(vec![Ok("chunk-1"), tail])
        },
        DEFAULT_STREAM_OPERATION_NAME,
    );

    while let Some(chunk) = chunks.next().await {
        println!("  received {}", chunk?);
    }
    println!(
        "\n  The stream was opened {} times; \"chunk-1\" arrived twice.",
        calls.load(Ordering::SeqCst)
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    example_presets()?;
    example_rate_limited_call().await?;
    example_streaming_restart().await?;

    Ok(())
}
