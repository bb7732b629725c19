use std::thread;
use std::time::Duration;

/// How long to keep polling a UI state transition
///
/// `loop_count` is the number of retries after the first attempt, so a
/// bounded policy calls the producer at most `loop_count + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (None = retry forever)
    pub loop_count: Option<usize>,
    /// Sleep between attempts
    pub interval: Duration,
}

impl RetryPolicy {
    /// Create a bounded policy
    pub const fn new(loop_count: usize, interval: Duration) -> Self {
        RetryPolicy {
            loop_count: Some(loop_count),
            interval,
        }
    }

    /// Create a policy that polls until satisfied
    pub const fn unbounded(interval: Duration) -> Self {
        RetryPolicy {
            loop_count: None,
            interval,
        }
    }

    /// Worst-case time spent sleeping, if bounded
    pub fn max_wait(&self) -> Option<Duration> {
        self.loop_count
            .map(|count| self.interval.saturating_mul(count.min(u32::MAX as usize) as u32))
    }
}

/// Call `produce` until `done` accepts its value or the policy runs out
///
/// The last produced value is returned either way; callers re-check it to
/// tell success from timeout. Running out of retries is not an error.
pub fn retry_until<T>(
    mut produce: impl FnMut() -> T,
    mut done: impl FnMut(&T) -> bool,
    policy: RetryPolicy,
) -> T {
    let mut value = produce();
    let mut remaining = policy.loop_count;

    while !done(&value) {
        match remaining.as_mut() {
            Some(0) => break,
            Some(count) => *count -= 1,
            None => {}
        }
        thread::sleep(policy.interval);
        value = produce();
    }

    value
}

/// Poll until `produce` returns `Some`
pub fn retry_until_some<T>(produce: impl FnMut() -> Option<T>, policy: RetryPolicy) -> Option<T> {
    retry_until(produce, Option::is_some, policy)
}

/// Poll until `check` returns true; returns the final answer
pub fn wait_until(check: impl FnMut() -> bool, policy: RetryPolicy) -> bool {
    retry_until(check, |ok| *ok, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_satisfied_first_call_does_not_sleep() {
        let policy = RetryPolicy::new(10, Duration::from_secs(5));
        let started = Instant::now();
        let mut calls = 0;

        let value = retry_until(
            || {
                calls += 1;
                42
            },
            |v| *v == 42,
            policy,
        );

        assert_eq!(value, 42);
        assert_eq!(calls, 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_never_satisfied_calls_loop_count_plus_one() {
        let policy = RetryPolicy::new(4, Duration::from_millis(1));
        let mut calls = 0;

        let value = retry_until(
            || {
                calls += 1;
                calls
            },
            |_| false,
            policy,
        );

        assert_eq!(calls, 5);
        assert_eq!(value, 5); // last produced value
    }

    #[test]
    fn test_zero_loop_count_is_single_attempt() {
        let mut calls = 0;
        let found = retry_until_some(
            || {
                calls += 1;
                None::<u8>
            },
            RetryPolicy::new(0, Duration::from_millis(1)),
        );

        assert_eq!(found, None);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_unbounded_polls_until_satisfied() {
        let mut calls = 0;
        let ok = wait_until(
            || {
                calls += 1;
                calls == 25
            },
            RetryPolicy::unbounded(Duration::from_millis(1)),
        );

        assert!(ok);
        assert_eq!(calls, 25);
    }

    #[test]
    fn test_max_wait() {
        let policy = RetryPolicy::new(40, Duration::from_millis(25));
        assert_eq!(policy.max_wait(), Some(Duration::from_secs(1)));
        assert_eq!(RetryPolicy::unbounded(Duration::from_millis(25)).max_wait(), None);
    }
}
