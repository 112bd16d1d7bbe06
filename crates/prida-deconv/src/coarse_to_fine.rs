use prida_image::{Image, ImageSize};
use prida_imgproc::{
    padding::{spatial_padding, Padding2D, PaddingMode},
    resize::resize_bilinear,
};

use crate::{
    errors::DeconvError,
    kernel::Kernel,
    optimizer::{residual_norm, OptimizerState},
    progress::{LevelInfo, ProgressCallback},
    pyramid::build_pyramid,
    timer::ScopedTimer,
    BlindDeconvConfig,
};

/// Initial latent image: the observation with its borders replicated by half
/// the kernel size on every side.
pub fn initial_latent<const C: usize>(
    observed: &Image<f64, C>,
    kernel_size: ImageSize,
) -> Result<Image<f64, C>, DeconvError> {
    let padding = Padding2D::symmetric(kernel_size.height / 2, kernel_size.width / 2);
    let mut latent = Image::from_size_val(padding.padded_size(observed.size()), 0.0)?;
    spatial_padding(
        observed,
        &mut latent,
        padding,
        PaddingMode::Replicate,
        [0.0; C],
    )?;
    Ok(latent)
}

/// Estimate the latent image and the kernel of an observation, coarse to fine.
///
/// The latent image starts as the replicate-padded observation and the
/// kernel as a box of the configured size.
///
/// # Arguments
///
/// * `observed` - The blurred observation.
/// * `config` - The deconvolution parameters.
/// * `progress` - Receives the iteration and level reports.
///
/// # Returns
///
/// The optimizer state at the finest level.
pub fn coarse_to_fine<const C: usize>(
    observed: &Image<f64, C>,
    config: &BlindDeconvConfig,
    progress: &mut impl ProgressCallback,
) -> Result<OptimizerState<C>, DeconvError> {
    config.validate()?;

    let latent = initial_latent(observed, config.kernel_size)?;
    let kernel = Kernel::uniform(config.kernel_size)?;

    coarse_to_fine_from(observed, latent, kernel.into_image(), config, progress)
}

/// Run the coarse-to-fine optimization from caller supplied estimates.
///
/// The kernel weights are normalized first and do not need to sum to one. At
/// the entry of every level, from coarsest to finest, the latent image is
/// resampled to the working size of the level and the kernel to the kernel
/// size of the level, then renormalized.
///
/// # Arguments
///
/// * `observed` - The blurred observation.
/// * `latent` - The initial latent image, of any size.
/// * `kernel_weights` - The initial nonnegative kernel weights, of any odd size.
/// * `config` - The deconvolution parameters.
/// * `progress` - Receives the iteration and level reports.
pub fn coarse_to_fine_from<const C: usize>(
    observed: &Image<f64, C>,
    latent: Image<f64, C>,
    kernel_weights: Image<f64, 1>,
    config: &BlindDeconvConfig,
    progress: &mut impl ProgressCallback,
) -> Result<OptimizerState<C>, DeconvError> {
    let mut timer = ScopedTimer::new("coarse_to_fine");

    config.validate()?;
    if latent.size().area() == 0 {
        return Err(DeconvError::ImageError(prida_image::ImageError::EmptyImage));
    }

    let mut state = OptimizerState::new(latent, Kernel::from_weights(kernel_weights)?);

    let pyramid = {
        let _timer = ScopedTimer::new("build_pyramid");
        build_pyramid(observed, config)?
    };
    timer.set_point();

    let num_levels = pyramid.len();
    for (level, scale) in pyramid.iter().enumerate().rev() {
        let working_size = scale.latent_size();

        let mut latent = Image::from_size_val(working_size, 0.0)?;
        resize_bilinear(&state.latent, &mut latent)?;
        state = OptimizerState::new(latent, state.kernel.resize(scale.kernel_size)?);

        state.run(
            &scale.image,
            scale.lambda,
            config.iterations,
            level,
            progress,
        )?;

        let residual = residual_norm(&scale.image, &state.latent, &state.kernel)?;
        log::info!(
            "working on scale {} with lambda = {} and kernel size {}x{}, residual = {:.6e}",
            level + 1,
            scale.lambda,
            scale.kernel_size.width,
            scale.kernel_size.height,
            residual
        );
        progress.on_level_complete(&LevelInfo {
            level,
            num_levels,
            lambda: scale.lambda,
            image_size: scale.image_size(),
            kernel_size: scale.kernel_size,
            latent_size: working_size,
            residual_norm: residual,
        });
        timer.set_point();
    }

    Ok(state)
}
