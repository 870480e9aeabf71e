// =====================================================
// ROW RATE LIMITER
// Tick gate consulted once per row; blocks the scan loop
// until the next tick is due.
// =====================================================

use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

const MIN_TICK: Duration = Duration::from_millis(1);

pub struct RateLimiter {
    period: Option<Duration>,
    ticker: Option<Interval>,
}

impl RateLimiter {
    /// `rows_per_second == 0` disables throttling.
    pub fn per_second(rows_per_second: u32) -> Self {
        let period = (rows_per_second > 0)
            .then(|| (Duration::from_secs(1) / rows_per_second).max(MIN_TICK));
        Self {
            period,
            ticker: None,
        }
    }

    pub fn unlimited() -> Self {
        Self::per_second(0)
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub async fn acquire(&mut self) {
        let Some(period) = self.period else {
            return;
        };
        // The interval needs a running timer, so it is created on first use.
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn zero_rate_is_unlimited() {
        assert_eq!(RateLimiter::per_second(0).period(), None);
        assert_eq!(
            RateLimiter::per_second(4).period(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(RateLimiter::per_second(1_000_000).period(), Some(MIN_TICK));
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_out_acquisitions() {
        let mut limiter = RateLimiter::per_second(10);
        let started = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        // First tick is immediate, the next three wait 100ms each.
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn unlimited_never_waits() {
        let mut limiter = RateLimiter::unlimited();
        let started = Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
