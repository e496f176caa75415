use rand::Rng;
use std::time::Duration;

/// Exponential backoff: `initial * 2^attempt`, capped at `max`, optionally with ±25% jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    pub jitter: bool,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            jitter: true,
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        let delay = self.initial.saturating_mul(factor).min(self.max);

        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let mut rng = rand::thread_rng();
        delay.mul_f64(rng.gen_range(0.75..=1.25))
    }

    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
