#![deny(missing_docs)]
//! # Prida Deconv
//!
//! Blind deconvolution of a single blurred image. The latent sharp image and
//! the blur kernel are estimated jointly by an alternating optimization that
//! runs from a coarse resolution with a small kernel up to the full
//! resolution.

use prida_image::{Image, ImageSize};
use prida_imgproc::crop::crop_window;

use crate::{
    coarse_to_fine::coarse_to_fine,
    errors::DeconvError,
    kernel::Kernel,
    progress::{LogProgress, ProgressCallback},
    timer::ScopedTimer,
};

/// Coarse-to-fine driver.
pub mod coarse_to_fine;

/// Error types for blind deconvolution.
pub mod errors;

/// Blur kernel type.
pub mod kernel;

/// Alternating optimization of the latent image and the kernel.
pub mod optimizer;

/// Progress reporting callbacks.
pub mod progress;

/// Multiscale pyramid construction.
pub mod pyramid;

/// Scoped wall-clock timer.
pub mod timer;

/// Parameters of a blind deconvolution run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlindDeconvConfig {
    /// Size of the kernel at the finest level. Both sides must be odd.
    pub kernel_size: ImageSize,
    /// Total-variation weight at the finest level.
    pub lambda: f64,
    /// Factor applied to the weight from one level to the next coarser one.
    pub lambda_multiplier: f64,
    /// Coarser levels are only added while their weight stays below this value.
    pub max_lambda: f64,
    /// Factor dividing the kernel sides from one level to the next coarser one.
    pub kernel_size_multiplier: f64,
    /// Number of optimizer iterations run at every level.
    pub iterations: usize,
}

impl BlindDeconvConfig {
    /// Creates a new `BlindDeconvConfig` with the default schedule.
    pub fn new(kernel_size: ImageSize, lambda: f64) -> Self {
        Self {
            kernel_size,
            lambda,
            lambda_multiplier: 1.9,
            max_lambda: 1.1e-1,
            kernel_size_multiplier: 1.1,
            iterations: 1000,
        }
    }

    /// Set the factor between the weights of consecutive levels.
    pub fn with_lambda_multiplier(mut self, lambda_multiplier: f64) -> Self {
        self.lambda_multiplier = lambda_multiplier;
        self
    }

    /// Set the weight ceiling of the coarsest level.
    pub fn with_max_lambda(mut self, max_lambda: f64) -> Self {
        self.max_lambda = max_lambda;
        self
    }

    /// Set the factor between the kernel sides of consecutive levels.
    pub fn with_kernel_size_multiplier(mut self, kernel_size_multiplier: f64) -> Self {
        self.kernel_size_multiplier = kernel_size_multiplier;
        self
    }

    /// Set the number of iterations per level.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Check that the parameters describe a valid run.
    ///
    /// # Errors
    ///
    /// Returns [`DeconvError::InvalidConfiguration`] naming the first offending parameter.
    pub fn validate(&self) -> Result<(), DeconvError> {
        let invalid = |msg: String| -> Result<(), DeconvError> {
            Err(DeconvError::InvalidConfiguration(msg))
        };

        let ImageSize { width, height } = self.kernel_size;
        if width % 2 == 0 || height % 2 == 0 {
            return invalid(format!(
                "kernel sides must be odd and positive, got {width}x{height}"
            ));
        }

        if !(self.lambda.is_finite() && self.lambda > 0.0) {
            return invalid(format!("lambda must be positive, got {}", self.lambda));
        }

        if !(self.lambda_multiplier.is_finite() && self.lambda_multiplier > 1.0) {
            return invalid(format!(
                "lambda multiplier must be greater than 1, got {}",
                self.lambda_multiplier
            ));
        }

        if !(self.kernel_size_multiplier.is_finite() && self.kernel_size_multiplier > 1.0) {
            return invalid(format!(
                "kernel size multiplier must be greater than 1, got {}",
                self.kernel_size_multiplier
            ));
        }

        if !(self.max_lambda.is_finite() && self.max_lambda > 0.0) {
            return invalid(format!(
                "max lambda must be positive, got {}",
                self.max_lambda
            ));
        }

        Ok(())
    }
}

/// Result of a blind deconvolution run.
#[derive(Debug, Clone, PartialEq)]
pub struct BlindDeconvolution<const C: usize> {
    /// Recovered sharp image, aligned with the (odd-cropped) observation.
    pub image: Image<f64, C>,
    /// Recovered latent image over the full support of the blur.
    pub latent: Image<f64, C>,
    /// Recovered blur kernel.
    pub kernel: Kernel,
}

/// Crop an image to odd sides by dropping its last row and/or column.
pub fn crop_to_odd<const C: usize>(image: &Image<f64, C>) -> Result<Image<f64, C>, DeconvError> {
    let size = image.size();
    if size.area() == 0 {
        return Err(DeconvError::ImageError(prida_image::ImageError::EmptyImage));
    }

    if size.width % 2 == 1 && size.height % 2 == 1 {
        return Ok(image.clone());
    }

    let odd = ImageSize {
        width: size.width - (1 - size.width % 2),
        height: size.height - (1 - size.height % 2),
    };

    Ok(crop_window(image, odd, 0, 0)?)
}

/// Recover the sharp image and the blur kernel of a blurred observation.
///
/// The observation is cropped to odd sides, then the coarse-to-fine
/// optimization runs with progress logged through [`LogProgress`].
///
/// # Arguments
///
/// * `observed` - The blurred image with values in [0, 1].
/// * `config` - The deconvolution parameters.
///
/// # Example
///
/// ```
/// use prida_deconv::{blind_deconvolve, BlindDeconvConfig};
/// use prida_image::{Image, ImageSize};
///
/// let observed = Image::<f64, 1>::from_size_val(ImageSize::square(10), 0.5).unwrap();
/// let config = BlindDeconvConfig::new(ImageSize::square(3), 0.01).with_iterations(5);
///
/// let result = blind_deconvolve(&observed, &config).unwrap();
///
/// assert_eq!(result.image.size(), ImageSize::square(9));
/// assert_eq!(result.latent.size(), ImageSize::square(11));
/// assert_eq!(result.kernel.size(), ImageSize::square(3));
/// ```
pub fn blind_deconvolve<const C: usize>(
    observed: &Image<f64, C>,
    config: &BlindDeconvConfig,
) -> Result<BlindDeconvolution<C>, DeconvError> {
    blind_deconvolve_with_progress(observed, config, &mut LogProgress::default())
}

/// Same as [`blind_deconvolve`] with a caller supplied progress callback.
pub fn blind_deconvolve_with_progress<const C: usize>(
    observed: &Image<f64, C>,
    config: &BlindDeconvConfig,
    progress: &mut impl ProgressCallback,
) -> Result<BlindDeconvolution<C>, DeconvError> {
    let mut timer = ScopedTimer::new("blind_deconvolve");

    config.validate()?;

    let observed = crop_to_odd(observed)?;
    timer.set_point();

    let state = coarse_to_fine(&observed, config, progress)?;

    let image = crop_window(
        &state.latent,
        observed.size(),
        config.kernel_size.width / 2,
        config.kernel_size.height / 2,
    )?;

    Ok(BlindDeconvolution {
        image,
        latent: state.latent,
        kernel: state.kernel,
    })
}
