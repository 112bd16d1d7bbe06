use prida_image::{Image, ImageError};
use prida_imgproc::{
    core::{l2_distance, max_abs},
    filter::{convolve2d_alloc, ConvolutionMode},
    flip::rotate180,
    parallel::par_map_channels,
    total_variation::tv_gradient,
};

use crate::{
    errors::DeconvError,
    kernel::Kernel,
    progress::{IterationInfo, ProgressCallback},
    pyramid::latent_size,
};

/// Relative size of a gradient step with respect to the estimate.
const STEP_SCALE: f64 = 1e-3;

/// Lower bound on the gradient magnitude used to compute a step size.
const GRADIENT_FLOOR: f64 = 1e-31;

/// Upper bound on the multiplicative kernel factor.
const MAX_KERNEL_FACTOR: f64 = 1000.0;

/// Current estimates of the optimizer at one pyramid level.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerState<const C: usize> {
    /// Latent sharp image covering the full support of the blur.
    pub latent: Image<f64, C>,
    /// Current kernel estimate.
    pub kernel: Kernel,
}

/// Step sizes and residual of one optimizer iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    /// Residual norm of the estimates before the update.
    pub residual_norm: f64,
    /// Step size applied to the latent image.
    pub image_step: f64,
    /// Step size applied to the kernel.
    pub kernel_step: f64,
}

// per channel gradients of the data term
struct ChannelGradients {
    latent: Image<f64, 1>,
    kernel: Image<f64, 1>,
    residual_sq: f64,
}

fn step_size(estimate_max: f64, gradient_max: f64) -> f64 {
    STEP_SCALE * estimate_max / GRADIENT_FLOOR.max(gradient_max)
}

fn check_latent_size<const C: usize>(
    observed: &Image<f64, C>,
    state: &OptimizerState<C>,
) -> Result<(), DeconvError> {
    let expected = latent_size(observed.size(), state.kernel.size());
    if state.latent.size() != expected {
        return Err(DeconvError::LatentSizeMismatch(
            state.latent.size(),
            expected,
        ));
    }
    Ok(())
}

/// Residual of the blur model for one channel.
fn channel_residual(
    latent: &Image<f64, 1>,
    kernel: &Image<f64, 1>,
    observed: &Image<f64, 1>,
) -> Result<Image<f64, 1>, ImageError> {
    let mut residual = convolve2d_alloc(latent, kernel, ConvolutionMode::Valid)?;
    residual
        .as_slice_mut()
        .iter_mut()
        .zip(observed.as_slice())
        .for_each(|(r, f)| *r -= f);
    Ok(residual)
}

/// Compute the norm of the blur model residual `||u * k - f||` over all channels.
///
/// # Arguments
///
/// * `observed` - The blurred observation `f`.
/// * `latent` - The latent image `u`, larger than `f` by the kernel size minus one.
/// * `kernel` - The kernel `k`.
///
/// # Errors
///
/// Fails if the latent image does not have the working size of the observation.
pub fn residual_norm<const C: usize>(
    observed: &Image<f64, C>,
    latent: &Image<f64, C>,
    kernel: &Kernel,
) -> Result<f64, DeconvError> {
    let expected = latent_size(observed.size(), kernel.size());
    if latent.size() != expected {
        return Err(DeconvError::LatentSizeMismatch(latent.size(), expected));
    }

    let observed_channels = observed.split_channels()?;
    let distances = par_map_channels(latent, |c, latent_c| {
        let blurred = convolve2d_alloc(&latent_c, kernel.as_image(), ConvolutionMode::Valid)?;
        Ok::<_, DeconvError>(l2_distance(&blurred, &observed_channels[c])?)
    })?;

    Ok(distances.iter().map(|d| d * d).sum::<f64>().sqrt())
}

impl<const C: usize> OptimizerState<C> {
    /// Create the optimizer state from a latent image and a kernel.
    pub fn new(latent: Image<f64, C>, kernel: Kernel) -> Self {
        Self { latent, kernel }
    }

    /// Run one alternating iteration.
    ///
    /// The latent image takes a gradient step on the data term plus the
    /// total-variation term weighted by `lambda`. The kernel takes a
    /// multiplicative step driven by the residual of the estimates the
    /// iteration started from and is renormalized to unit sum. Both step
    /// sizes are a fixed fraction of the estimate magnitude relative to the
    /// gradient magnitude.
    ///
    /// # Arguments
    ///
    /// * `observed` - The blurred observation at the level resolution.
    /// * `lambda` - The total-variation weight.
    ///
    /// # Errors
    ///
    /// Fails if the latent image does not have the working size of the observation.
    pub fn step(&mut self, observed: &Image<f64, C>, lambda: f64) -> Result<StepInfo, DeconvError> {
        check_latent_size(observed, self)?;

        let kernel = self.kernel.as_image();
        let flipped_kernel = rotate180(kernel)?;
        let observed_channels = observed.split_channels()?;

        // the residual is shared by the latent and the kernel gradients
        let gradients = par_map_channels(&self.latent, |c, latent_c| {
            let residual = channel_residual(&latent_c, kernel, &observed_channels[c])?;
            let latent_grad = convolve2d_alloc(&residual, &flipped_kernel, ConvolutionMode::Full)?;
            let kernel_grad =
                convolve2d_alloc(&rotate180(&latent_c)?, &residual, ConvolutionMode::Valid)?;
            let residual_sq = residual.as_slice().iter().map(|r| r * r).sum::<f64>();

            Ok::<_, DeconvError>(ChannelGradients {
                latent: latent_grad,
                kernel: kernel_grad,
                residual_sq,
            })
        })?;

        let residual_norm = gradients.iter().map(|g| g.residual_sq).sum::<f64>().sqrt();

        // latent step
        let (data_planes, kernel_planes): (Vec<_>, Vec<_>) = gradients
            .into_iter()
            .map(|g| (g.latent, g.kernel))
            .unzip();
        let mut latent_grad = Image::<f64, C>::from_channels(&data_planes)?;

        let mut tv = Image::<f64, C>::from_size_val(self.latent.size(), 0.0)?;
        tv_gradient(&self.latent, &mut tv)?;

        latent_grad
            .as_slice_mut()
            .iter_mut()
            .zip(tv.as_slice())
            .for_each(|(g, t)| *g -= lambda * t);

        let image_step = step_size(max_abs(&self.latent), max_abs(&latent_grad));

        // kernel step, accumulated in channel order
        let mut kernel_grad = Image::<f64, 1>::from_size_val(self.kernel.size(), 0.0)?;
        for plane in kernel_planes.iter() {
            kernel_grad
                .as_slice_mut()
                .iter_mut()
                .zip(plane.as_slice())
                .for_each(|(acc, v)| *acc += v);
        }

        let kernel_step = step_size(max_abs(kernel), max_abs(&kernel_grad));

        let updated = kernel
            .as_slice()
            .iter()
            .zip(kernel_grad.as_slice())
            .map(|(&k, &g)| {
                let eta = kernel_step / (k + f64::EPSILON);
                k * (-eta * g).exp().min(MAX_KERNEL_FACTOR)
            })
            .collect();
        let kernel = Kernel::from_weights(Image::new(self.kernel.size(), updated)?)?;

        self.latent
            .as_slice_mut()
            .iter_mut()
            .zip(latent_grad.as_slice())
            .for_each(|(u, g)| *u -= image_step * g);
        self.kernel = kernel;

        Ok(StepInfo {
            residual_norm,
            image_step,
            kernel_step,
        })
    }

    /// Run a fixed number of iterations at one pyramid level.
    ///
    /// # Arguments
    ///
    /// * `observed` - The blurred observation at the level resolution.
    /// * `lambda` - The total-variation weight.
    /// * `iterations` - The number of iterations to run.
    /// * `level` - The pyramid level, forwarded to the callback.
    /// * `progress` - Called after every iteration.
    pub fn run(
        &mut self,
        observed: &Image<f64, C>,
        lambda: f64,
        iterations: usize,
        level: usize,
        progress: &mut impl ProgressCallback,
    ) -> Result<(), DeconvError> {
        check_latent_size(observed, self)?;

        for iteration in 0..iterations {
            let step = self.step(observed, lambda)?;

            let weights = self.kernel.as_image().as_slice();
            progress.on_iteration(&IterationInfo {
                level,
                iteration,
                total_iterations: iterations,
                residual_norm: step.residual_norm,
                image_step: step.image_step,
                kernel_step: step.kernel_step,
                kernel_sum: self.kernel.sum(),
                kernel_min: weights.iter().copied().fold(f64::INFINITY, f64::min),
            });
        }

        Ok(())
    }
}
