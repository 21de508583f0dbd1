//! Request rate limiting.
//!
//! Combines a parallelism cap with a sliding one-minute window of call
//! timestamps. A permit must be held for the duration of each API call.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window rate limiter shared by all in-flight requests.
pub struct RateLimiter {
    calls_per_minute: usize,
    timestamps: Mutex<VecDeque<Instant>>,
    parallel: Arc<Semaphore>,
}

/// Held for the duration of one API call.
pub struct RatePermit {
    _permit: OwnedSemaphorePermit,
}

impl RateLimiter {
    pub fn new(calls_per_minute: usize, max_parallel: usize) -> Self {
        Self {
            calls_per_minute: calls_per_minute.max(1),
            timestamps: Mutex::new(VecDeque::new()),
            parallel: Arc::new(Semaphore::new(max_parallel.max(1))),
        }
    }

    /// Wait until both the parallelism cap and the call window allow
    /// another request.
    pub async fn acquire(&self) -> RatePermit {
        let permit = self
            .parallel
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore closed");

        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock().await;
                let now = Instant::now();
                while timestamps
                    .front()
                    .map(|t| now.duration_since(*t) >= WINDOW)
                    .unwrap_or(false)
                {
                    timestamps.pop_front();
                }

                if timestamps.len() < self.calls_per_minute {
                    timestamps.push_back(now);
                    return RatePermit { _permit: permit };
                }

                // Sleep outside the lock so other tasks can recheck.
                WINDOW - now.duration_since(timestamps[0])
            };
            tracing::debug!(?wait, "rate window full, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_up_to_the_window_limit() {
        let limiter = RateLimiter::new(3, 8);
        let _a = limiter.acquire().await;
        let _b = limiter.acquire().await;
        let _c = limiter.acquire().await;

        let timestamps = limiter.timestamps.lock().await;
        assert_eq!(timestamps.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn blocks_once_the_window_is_full() {
        let limiter = Arc::new(RateLimiter::new(2, 8));
        let _a = limiter.acquire().await;
        let _b = limiter.acquire().await;

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let _c = limiter.acquire().await;
            })
        };

        // Not yet: the window still holds two fresh timestamps.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!waiter.is_finished());

        // After the window slides, the third call goes through.
        tokio::time::sleep(Duration::from_secs(61)).await;
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn parallelism_is_capped() {
        let limiter = Arc::new(RateLimiter::new(100, 1));
        let first = limiter.acquire().await;

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let _second = limiter.acquire().await;
            })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
    }
}
