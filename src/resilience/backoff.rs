//! Exponential backoff with jitter and per-iteration overrides.

use std::time::Duration;

/// Asynchronous retry pacer.
///
/// Each [`Backoff::backoff`] call sleeps for the next exponent of `base`
/// (capped at `maximum`) plus random jitter, until `max_retries` is
/// reached or [`Backoff::finish`] is called. A rate-limit header can
/// override the next sleep via [`Backoff::set_next_backoff`].
///
/// ```no_run
/// # use switchboard_core::resilience::Backoff;
/// # async fn example() -> anyhow::Result<()> {
/// let mut backoff = Backoff::new().max_retries(4);
/// loop {
///     match try_call().await {
///         Ok(_) => break,
///         Err(retry_after) => {
///             backoff.set_next_backoff(retry_after);
///             if backoff.backoff().await.is_none() {
///                 anyhow::bail!("retries depleted");
///             }
///         }
///     }
/// }
/// # Ok(())
/// # }
/// # async fn try_call() -> Result<(), Option<std::time::Duration>> { Ok(()) }
/// ```
#[derive(Debug)]
pub struct Backoff {
    base: f64,
    maximum: Duration,
    jitter_multiplier: f64,
    max_retries: Option<u32>,
    exponent: u32,
    retries: u32,
    next_override: Option<Duration>,
    finished: bool,
    started: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: 2.0,
            maximum: Duration::from_secs(64),
            jitter_multiplier: 1.0,
            max_retries: None,
            exponent: 0,
            retries: 0,
            next_override: None,
            finished: false,
            started: false,
        }
    }
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of [`Backoff::backoff`] sleeps between resets.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries.max(1));
        self
    }

    pub fn base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    /// Ceiling for a single sleep, before jitter.
    pub fn maximum(mut self, maximum: Duration) -> Self {
        self.maximum = maximum;
        self
    }

    /// Multiplier for the random jitter; zero disables it.
    pub fn jitter_multiplier(mut self, multiplier: f64) -> Self {
        self.jitter_multiplier = multiplier;
        self
    }

    /// Start the exponent above zero to skip the shortest sleeps.
    pub fn initial_increment(mut self, increment: u32) -> Self {
        self.exponent = increment;
        self
    }

    /// Whether `max_retries` has been reached.
    pub fn is_depleted(&self) -> bool {
        self.max_retries
            .is_some_and(|max_retries| self.retries >= max_retries)
    }

    /// Number of sleeps performed since the last reset.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Sleep for the override or the next exponent.
    ///
    /// Returns the retry count after sleeping, or [`None`] without
    /// sleeping when finished or depleted.
    pub async fn backoff(&mut self) -> Option<u32> {
        if self.finished || self.is_depleted() {
            return None;
        }

        self.started = true;
        // The exponent advances even when an override is used, mirroring a
        // rate-limited call still counting against the schedule.
        let exponential = self.next_delay();
        let delay = match self.next_override.take() {
            Some(delay) => delay + self.jitter(),
            None => exponential,
        };

        self.retries += 1;
        tokio::time::sleep(delay).await;
        Some(self.retries)
    }

    /// Iterator-style stepping: the first call returns immediately so the
    /// initial attempt isn't delayed; later calls sleep like
    /// [`Backoff::backoff`]. Returns [`None`] once depleted or finished.
    pub async fn next(&mut self) -> Option<u32> {
        if !self.started {
            self.started = true;
            return Some(0);
        }
        self.backoff().await
    }

    /// Mark the backoff as finished to break out of the current loop.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Restore the original state so the instance can be reused.
    pub fn reset(&mut self) {
        self.exponent = 0;
        self.retries = 0;
        self.next_override = None;
        self.finished = false;
        self.started = false;
    }

    /// Override the next sleep, e.g. from a `Retry-After` header. The
    /// exponent is not advanced past it; passing [`None`] clears a
    /// previously set override.
    pub fn set_next_backoff(&mut self, delay: Option<Duration>) {
        self.next_override = delay;
    }

    fn next_delay(&mut self) -> Duration {
        let exponential = self.base.powi(self.exponent as i32);
        self.exponent = self.exponent.saturating_add(1);
        let capped = Duration::from_secs_f64(exponential.min(self.maximum.as_secs_f64()).max(0.0));
        capped + self.jitter()
    }

    fn jitter(&self) -> Duration {
        if self.jitter_multiplier <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(fastrand::f64() * self.jitter_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn no_jitter() -> Backoff {
        Backoff::new().jitter_multiplier(0.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_sequence() {
        let mut backoff = no_jitter();
        for expected_secs in [1.0, 2.0, 4.0, 8.0] {
            let before = Instant::now();
            backoff.backoff().await.unwrap();
            assert_eq!(before.elapsed(), Duration::from_secs_f64(expected_secs));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_maximum_caps_single_sleep() {
        let mut backoff = no_jitter().maximum(Duration::from_secs(4));
        for _ in 0..4 {
            backoff.backoff().await.unwrap();
        }
        let before = Instant::now();
        backoff.backoff().await.unwrap();
        assert_eq!(before.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_retries_depletes() {
        let mut backoff = no_jitter().max_retries(2);
        assert_eq!(backoff.backoff().await, Some(1));
        assert_eq!(backoff.backoff().await, Some(2));
        assert!(backoff.is_depleted());
        assert_eq!(backoff.backoff().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_does_not_sleep_first() {
        let mut backoff = no_jitter();
        let before = Instant::now();
        assert_eq!(backoff.next().await, Some(0));
        assert_eq!(before.elapsed(), Duration::ZERO);

        backoff.next().await.unwrap();
        assert_eq!(before.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_replaces_one_sleep() {
        let mut backoff = no_jitter();
        backoff.set_next_backoff(Some(Duration::from_secs(30)));

        let before = Instant::now();
        backoff.backoff().await.unwrap();
        assert_eq!(before.elapsed(), Duration::from_secs(30));

        // The override is consumed; the schedule continues where it was.
        let before = Instant::now();
        backoff.backoff().await.unwrap();
        assert_eq!(before.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_and_reset() {
        let mut backoff = no_jitter().max_retries(5);
        backoff.backoff().await.unwrap();
        backoff.finish();
        assert_eq!(backoff.backoff().await, None);

        backoff.reset();
        assert_eq!(backoff.retries(), 0);
        assert_eq!(backoff.next().await, Some(0));
    }
}
