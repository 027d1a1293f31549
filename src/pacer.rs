use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token-bucket throttle for outbound API calls. One `pause().await`
/// precedes every network call; tests use `Pacer::none()` so nothing
/// ever sleeps.
pub struct Pacer {
    bucket: Option<Mutex<Bucket>>,
}

struct Bucket {
    tokens: f64,
    capacity: f64,
    per_sec: f64,
    refilled_at: Instant,
}

impl Pacer {
    /// No throttling at all.
    pub fn none() -> Self {
        Pacer { bucket: None }
    }

    /// Allow `per_sec` calls per second, with up to `burst` immediately.
    pub fn per_second(per_sec: f64, burst: f64) -> Self {
        let per_sec = per_sec.max(0.001);
        let capacity = burst.max(1.0);
        Pacer {
            bucket: Some(Mutex::new(Bucket {
                tokens: capacity,
                capacity,
                per_sec,
                refilled_at: Instant::now(),
            })),
        }
    }

    /// Take one token, sleeping until it is available.
    pub async fn pause(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };
        let wait = {
            let mut b = bucket.lock().unwrap();
            b.reserve(Instant::now())
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

impl Bucket {
    /// Consume one token and return how long the caller must wait for it.
    /// Debt accumulates, so queued callers space out evenly.
    fn reserve(&mut self, now: Instant) -> Duration {
        let elapsed = now.duration_since(self.refilled_at).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.per_sec).min(self.capacity);
        self.refilled_at = now;
        self.tokens -= 1.0;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.tokens / self.per_sec)
        }
    }
}
