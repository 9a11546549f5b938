//! Request pacing for the scraped sites.
//!
//! Fixed or randomized sleeps between requests, a pause between groups of
//! requests, and a longer cool-down after a failed fetch.

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    None,
    Fixed(Duration),
    /// Uniform between `min` and `max`, inclusive.
    Jitter { min: Duration, max: Duration },
}

impl Delay {
    pub fn sample(&self) -> Duration {
        match *self {
            Delay::None => Duration::ZERO,
            Delay::Fixed(d) => d,
            Delay::Jitter { min, max } => {
                let min_ms = min.as_millis() as u64;
                let max_ms = (max.as_millis() as u64).max(min_ms);
                Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    pub between_requests: Delay,
    pub between_groups: Delay,
    pub cooldown: Duration,
}

impl Throttle {
    /// No sleeping at all; used by tests.
    pub fn disabled() -> Self {
        Self {
            between_requests: Delay::None,
            between_groups: Delay::None,
            cooldown: Duration::ZERO,
        }
    }

    /// Sleep between two requests.
    pub async fn pause(&self) {
        nap(self.between_requests.sample()).await;
    }

    /// Sleep between two groups of requests (e.g. two stats).
    pub async fn pause_group(&self) {
        nap(self.between_groups.sample()).await;
    }

    /// Back off after a failed request.
    pub async fn cool_down(&self) {
        nap(self.cooldown).await;
    }
}

async fn nap(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    debug!("Sleeping {:?}", duration);
    sleep(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_within_bounds() {
        let delay = Delay::Jitter {
            min: Duration::from_secs(6),
            max: Duration::from_secs(15),
        };
        for _ in 0..200 {
            let d = delay.sample();
            assert!(d >= Duration::from_secs(6) && d <= Duration::from_secs(15));
        }
    }

    #[test]
    fn test_degenerate_jitter() {
        let delay = Delay::Jitter {
            min: Duration::from_secs(3),
            max: Duration::from_secs(3),
        };
        assert_eq!(delay.sample(), Duration::from_secs(3));
    }

    #[test]
    fn test_jitter_spreads_across_range() {
        let delay = Delay::Jitter {
            min: Duration::ZERO,
            max: Duration::from_millis(1000),
        };
        let seen: std::collections::HashSet<Duration> = (0..200).map(|_| delay.sample()).collect();
        assert!(seen.len() > 10);
    }

    #[test]
    fn test_inverted_jitter_uses_min() {
        let delay = Delay::Jitter {
            min: Duration::from_secs(5),
            max: Duration::from_secs(2),
        };
        assert_eq!(delay.sample(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_disabled_throttle_returns_immediately() {
        let throttle = Throttle::disabled();
        throttle.pause().await;
        throttle.pause_group().await;
        throttle.cool_down().await;
        assert_eq!(throttle.between_requests.sample(), Duration::ZERO);
    }
}
