use prida_image::ImageSize;

/// State of the optimizer after one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationInfo {
    /// Pyramid level, 0 being the finest.
    pub level: usize,
    /// Iteration index within the level.
    pub iteration: usize,
    /// Number of iterations run at every level.
    pub total_iterations: usize,
    /// Residual norm of the estimates the iteration started from.
    pub residual_norm: f64,
    /// Step size applied to the latent image.
    pub image_step: f64,
    /// Step size applied to the kernel.
    pub kernel_step: f64,
    /// Sum of the updated kernel.
    pub kernel_sum: f64,
    /// Smallest weight of the updated kernel.
    pub kernel_min: f64,
}

/// Summary of a finished pyramid level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelInfo {
    /// Pyramid level, 0 being the finest.
    pub level: usize,
    /// Number of levels in the pyramid.
    pub num_levels: usize,
    /// Regularization weight of the level.
    pub lambda: f64,
    /// Size of the observation at this level.
    pub image_size: ImageSize,
    /// Size of the kernel at this level.
    pub kernel_size: ImageSize,
    /// Size of the latent image at this level.
    pub latent_size: ImageSize,
    /// Residual norm once the level completed.
    pub residual_norm: f64,
}

/// Callbacks invoked by the coarse-to-fine driver.
///
/// Callbacks only observe the run, the estimates are never changed.
pub trait ProgressCallback {
    /// Called after every optimizer iteration.
    fn on_iteration(&mut self, _info: &IterationInfo) {}

    /// Called when all iterations of a level are done.
    fn on_level_complete(&mut self, _info: &LevelInfo) {}
}

/// Silent callback.
impl ProgressCallback for () {}

impl<P: ProgressCallback + ?Sized> ProgressCallback for &mut P {
    fn on_iteration(&mut self, info: &IterationInfo) {
        (**self).on_iteration(info);
    }

    fn on_level_complete(&mut self, info: &LevelInfo) {
        (**self).on_level_complete(info);
    }
}

/// Reports the progress through the [`log`] facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogProgress {
    /// Log every `log_interval` iterations. Zero disables iteration logs.
    pub log_interval: usize,
}

impl Default for LogProgress {
    fn default() -> Self {
        Self { log_interval: 100 }
    }
}

impl ProgressCallback for LogProgress {
    fn on_iteration(&mut self, info: &IterationInfo) {
        if self.log_interval == 0 || (info.iteration + 1) % self.log_interval != 0 {
            return;
        }
        log::debug!(
            "level {} iteration {}/{}: residual = {:.6e}, image step = {:.3e}, kernel step = {:.3e}",
            info.level,
            info.iteration + 1,
            info.total_iterations,
            info.residual_norm,
            info.image_step,
            info.kernel_step
        );
    }

    fn on_level_complete(&mut self, info: &LevelInfo) {
        log::info!(
            "level {}/{} done: lambda = {}, image {}x{}, kernel {}x{}, residual = {:.6e}",
            info.num_levels - info.level,
            info.num_levels,
            info.lambda,
            info.image_size.width,
            info.image_size.height,
            info.kernel_size.width,
            info.kernel_size.height,
            info.residual_norm
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        iterations: usize,
        levels: usize,
    }

    impl ProgressCallback for Counter {
        fn on_iteration(&mut self, _info: &IterationInfo) {
            self.iterations += 1;
        }

        fn on_level_complete(&mut self, _info: &LevelInfo) {
            self.levels += 1;
        }
    }

    fn notify(progress: &mut impl ProgressCallback) {
        let info = IterationInfo {
            level: 0,
            iteration: 0,
            total_iterations: 1,
            residual_norm: 1.0,
            image_step: 0.1,
            kernel_step: 0.1,
            kernel_sum: 1.0,
            kernel_min: 0.0,
        };
        progress.on_iteration(&info);
        progress.on_level_complete(&LevelInfo {
            level: 0,
            num_levels: 1,
            lambda: 0.1,
            image_size: ImageSize::square(3),
            kernel_size: ImageSize::square(3),
            latent_size: ImageSize::square(5),
            residual_norm: 1.0,
        });
    }

    #[test]
    fn test_callback_through_reference() {
        let mut counter = Counter::default();
        notify(&mut &mut counter);
        notify(&mut counter);
        assert_eq!(counter.iterations, 2);
        assert_eq!(counter.levels, 2);

        // the unit callback and the logger accept the same calls
        notify(&mut ());
        notify(&mut LogProgress::default());
    }
}
