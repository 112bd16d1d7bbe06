use std::time::{Duration, Instant};

/// Logs the wall-clock time spent in a scope.
///
/// Intermediate points are logged with [`ScopedTimer::set_point`] and the
/// total time is logged when the timer is dropped. Everything goes to the
/// `debug` level of the [`log`] facade.
///
/// # Example
///
/// ```
/// use prida_deconv::timer::ScopedTimer;
///
/// let mut timer = ScopedTimer::new("preprocess");
/// // ... first stage
/// timer.set_point();
/// // ... second stage
/// assert_eq!(timer.points(), 1);
/// ```
#[derive(Debug)]
pub struct ScopedTimer {
    name: String,
    start: Instant,
    last_point: Instant,
    points: usize,
}

impl ScopedTimer {
    /// Start a timer with the given scope name.
    pub fn new(name: impl Into<String>) -> Self {
        let start = Instant::now();
        Self {
            name: name.into(),
            start,
            last_point: start,
            points: 0,
        }
    }

    /// Log the time elapsed since the previous point and return it.
    pub fn set_point(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.last_point;
        self.points += 1;
        self.last_point = now;

        log::debug!(
            "[{}] point {} time = {} ms",
            self.name,
            self.points,
            elapsed.as_millis()
        );

        elapsed
    }

    /// Number of points logged so far.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Time elapsed since the timer started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        log::debug!(
            "[{}] work time = {} ms",
            self.name,
            self.elapsed().as_millis()
        );
    }
}
