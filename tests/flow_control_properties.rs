//! Property-based tests for classification, backoff and deadline races.

use proptest::prelude::*;
use std::time::Duration;

use slackwater::delay::MAX_TIMEOUT;
use slackwater::{
    default_backoff, is_retryable, with_timeout, Backoff, BackoffPolicy, Classify, Failure, Retry,
};

fn failure_strategy() -> impl Strategy<Value = Failure> {
    let code = prop_oneof![
        Just("ECONNRESET".to_string()),
        Just("ETIMEDOUT".to_string()),
        Just("ENOTFOUND".to_string()),
        "[A-Z]{1,8}",
    ];
    let name = prop_oneof![Just("AbortError".to_string()), "[A-Za-z]{1,10}"];

    (
        proptest::option::of(any::<u16>()),
        proptest::option::of(code),
        proptest::option::of(name),
        ".{0,16}",
    )
        .prop_map(|(status, code, name, message)| Failure {
            status,
            code,
            name,
            message,
        })
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime")
}

proptest! {
    #[test]
    fn prop_classifier_is_pure(failure in failure_strategy()) {
        let first = is_retryable(Some(&failure));
        let second = is_retryable(Some(&failure));
        prop_assert_eq!(first, second);
        prop_assert_eq!(first, failure.is_retryable());
    }

    #[test]
    fn prop_client_errors_never_retry_without_other_signals(status in 400u16..500) {
        prop_assume!(status != 429);
        let failure = Failure::new("client error").with_status(status);
        prop_assert!(!failure.is_retryable());
    }

    #[test]
    fn prop_server_errors_always_retry(status in 500u16..600, message in ".{0,16}") {
        prop_assert!(Failure::new(message).with_status(status).is_retryable());
    }

    #[test]
    fn prop_fields_outside_the_rule_do_not_retry(failure in failure_strategy()) {
        let status_hit = failure.status.is_some_and(|s| s == 429 || (500..600).contains(&s));
        let name_hit = failure.name.as_deref() == Some("AbortError");
        let code_hit = matches!(failure.code.as_deref(), Some("ECONNRESET") | Some("ETIMEDOUT"));
        prop_assert_eq!(failure.is_retryable(), status_hit || name_hit || code_hit);
    }

    #[test]
    fn prop_default_backoff_is_bounded_and_monotonic(attempt in 0u32..10_000) {
        let delay = default_backoff(attempt);
        prop_assert!(delay >= Duration::from_millis(2000));
        prop_assert!(delay <= Duration::from_millis(8000));
        prop_assert!(default_backoff(attempt.saturating_add(1)) >= delay);
    }

    #[test]
    fn prop_capped_policies_respect_cap(
        base_ms in 0u64..10_000,
        cap_ms in 0u64..60_000,
        attempt in any::<u32>(),
    ) {
        let cap = Duration::from_millis(cap_ms);
        let base = Duration::from_millis(base_ms);
        for policy in [
            BackoffPolicy::constant(base),
            BackoffPolicy::linear(base),
            BackoffPolicy::exponential(base),
            BackoffPolicy::fibonacci(base),
        ] {
            prop_assert!(policy.with_max_delay(cap).delay(attempt) <= cap);
        }
    }

    #[test]
    fn prop_deadline_race(latency_ms in 0u64..200, timeout_ms in 1u64..200) {
        let rt = paused_runtime();
        let result = rt.block_on(with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(latency_ms)).await;
                Ok::<_, Failure>(latency_ms)
            },
            Duration::from_millis(timeout_ms),
            None,
        ));

        if latency_ms < timeout_ms {
            prop_assert_eq!(result, Ok(latency_ms));
        } else {
            let err = result.unwrap_err();
            prop_assert!(err.is_timeout());
            prop_assert_eq!(err.code(), Some("ETIMEDOUT"));
        }
    }

    #[test]
    fn prop_zero_budget_means_single_call(failure in failure_strategy()) {
        let rt = paused_runtime();
        let calls = std::cell::Cell::new(0u32);

        let result = rt.block_on(
            Retry::new()
                .with_backoff(|_: u32| Duration::ZERO)
                .run(|_| {
                    calls.set(calls.get() + 1);
                    let failure = failure.clone();
                    async move { Err::<(), _>(failure) }
                }),
        );

        prop_assert_eq!(result, Err(failure));
        prop_assert_eq!(calls.get(), 1);
    }
}

#[test]
fn oversized_policy_delays_are_clamped_when_slept() {
    let policy = BackoffPolicy::constant(Duration::MAX);
    assert_eq!(slackwater::delay::clamp(policy.delay(0)), MAX_TIMEOUT);
}
