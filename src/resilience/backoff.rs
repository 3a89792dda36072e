//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Shape of the delay curve between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Fraction of the capped delay added at random, 0.0 - 1.0.
    pub jitter: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl Backoff {
    /// Delay before retrying after failed attempt `attempt` (1-indexed), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_secs_f64() * 1000.0 * self.multiplier.powi(exponent);
        let max_ms = self.max_delay.as_secs_f64() * 1000.0;
        // powi overflows to inf for large attempts; min() keeps the cap
        Duration::from_secs_f64(delay_ms.min(max_ms).max(0.0) / 1000.0)
    }

    /// Delay before retrying after failed attempt `attempt`, with jitter applied.
    ///
    /// The result lies in `[base, base * (1 + jitter)]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 || base.is_zero() {
            return base;
        }

        let factor: f64 = rand::thread_rng().gen_range(0.0..1.0);
        base + base.mul_f64(jitter * factor)
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, backoff: &Backoff) -> Duration {
    backoff.delay(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_backoff() -> Backoff {
        Backoff {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }

    #[test]
    fn test_backoff_calculation() {
        let backoff = Backoff { jitter: 0.0, ..reference_backoff() };
        assert_eq!(backoff.base_delay(0), Duration::ZERO);
        assert_eq!(backoff.delay(1), Duration::from_millis(1000));
        assert_eq!(backoff.delay(2), Duration::from_millis(2000));
        assert_eq!(backoff.delay(3), Duration::from_millis(4000));
        assert_eq!(backoff.delay(6), Duration::from_millis(30_000));
        assert_eq!(backoff.delay(200), Duration::from_millis(30_000));
    }

    #[test]
    fn test_jitter_bounds() {
        let backoff = reference_backoff();
        for attempt in 1..=8 {
            let base = backoff.base_delay(attempt);
            let upper = base.mul_f64(1.1);
            for _ in 0..50 {
                let delay = calculate_backoff(attempt, &backoff);
                assert!(delay >= base, "attempt {attempt}: {delay:?} < {base:?}");
                assert!(delay <= upper, "attempt {attempt}: {delay:?} > {upper:?}");
            }
        }
    }

    #[test]
    fn test_constant_backoff() {
        let backoff = Backoff {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            multiplier: 1.0,
            jitter: 0.0,
        };
        assert_eq!(backoff.delay(1), backoff.delay(5));
    }
}
