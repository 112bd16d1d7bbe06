use prida_image::{Image, ImageSize};
use prida_imgproc::resize::resize_bilinear;

use crate::{errors::DeconvError, BlindDeconvConfig};

/// Kernel sides never shrink below this value.
pub const SMALLEST_KERNEL_SIDE: usize = 3;

/// Kernel size and regularization weight of one pyramid level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSchedule {
    /// Size of the kernel estimated at this level.
    pub kernel_size: ImageSize,
    /// Regularization weight used at this level.
    pub lambda: f64,
}

/// One resolution of the coarse-to-fine pyramid.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidLevel<const C: usize> {
    /// Observation resampled to the level resolution.
    pub image: Image<f64, C>,
    /// Size of the kernel estimated at this level.
    pub kernel_size: ImageSize,
    /// Regularization weight used at this level.
    pub lambda: f64,
}

impl<const C: usize> PyramidLevel<C> {
    /// Size of the observation at this level.
    pub fn image_size(&self) -> ImageSize {
        self.image.size()
    }

    /// Size of the latent image, which covers the full support of the blur.
    pub fn latent_size(&self) -> ImageSize {
        latent_size(self.image.size(), self.kernel_size)
    }
}

/// Size of the latent image whose VALID convolution with a kernel of
/// `kernel_size` has `image_size`.
pub fn latent_size(image_size: ImageSize, kernel_size: ImageSize) -> ImageSize {
    ImageSize {
        width: image_size.width + kernel_size.width - 1,
        height: image_size.height + kernel_size.height - 1,
    }
}

// one step of the kernel schedule along an axis
fn shrink_kernel_side(prev: usize, multiplier: f64) -> usize {
    let mut next = (prev as f64 / multiplier).round() as i64;

    if next % 2 == 0 {
        next -= 1;
    }

    if next == prev as i64 {
        next -= 2;
    }

    next.max(SMALLEST_KERNEL_SIDE as i64) as usize
}

// image side following the realized shrink of the kernel side
fn shrink_image_side(
    prev_image: usize,
    prev_kernel: usize,
    kernel: usize,
) -> Result<usize, DeconvError> {
    let factor = prev_kernel as f64 / kernel as f64;
    let mut side = (prev_image as f64 / factor).round() as i64;

    if side % 2 == 0 {
        side -= 1;
    }

    if side < 1 {
        return Err(DeconvError::InvalidConfiguration(format!(
            "image side {prev_image} vanishes when the kernel shrinks from {prev_kernel} to {kernel}"
        )));
    }

    Ok(side as usize)
}

/// Compute the kernel sizes and regularization weights of all levels.
///
/// Level 0 carries the configured kernel size and weight. Every further
/// level divides the kernel sides by the size multiplier, keeps them odd and
/// strictly decreasing with a floor of [`SMALLEST_KERNEL_SIDE`], and
/// multiplies the weight by the weight multiplier. Levels are added while
/// both kernel sides are above the floor and the next weight stays below the
/// ceiling, so at least one level is always returned.
///
/// # Example
///
/// ```
/// use prida_deconv::{pyramid::level_schedule, BlindDeconvConfig};
/// use prida_image::ImageSize;
///
/// let config = BlindDeconvConfig::new(ImageSize::square(7), 0.01);
/// let schedule = level_schedule(&config);
///
/// let sides = schedule.iter().map(|l| l.kernel_size.width).collect::<Vec<_>>();
/// assert_eq!(sides, vec![7, 5, 3]);
/// ```
pub fn level_schedule(config: &BlindDeconvConfig) -> Vec<LevelSchedule> {
    let mut schedule = vec![LevelSchedule {
        kernel_size: config.kernel_size,
        lambda: config.lambda,
    }];

    let mut rows = config.kernel_size.height;
    let mut cols = config.kernel_size.width;
    let mut lambda = config.lambda;

    while rows > SMALLEST_KERNEL_SIDE
        && cols > SMALLEST_KERNEL_SIDE
        && lambda * config.lambda_multiplier < config.max_lambda
    {
        lambda *= config.lambda_multiplier;
        rows = shrink_kernel_side(rows, config.kernel_size_multiplier);
        cols = shrink_kernel_side(cols, config.kernel_size_multiplier);

        schedule.push(LevelSchedule {
            kernel_size: ImageSize {
                width: cols,
                height: rows,
            },
            lambda,
        });
    }

    schedule
}

/// Build the multiscale pyramid of an observation.
///
/// The kernel sizes and weights come from [`level_schedule`]. The image size
/// of each level is the size of the previous level divided by the realized
/// shrink ratio of the kernel on that axis, rounded and made odd. Every level
/// resamples the original observation.
///
/// # Arguments
///
/// * `image` - The observation at full resolution.
/// * `config` - The deconvolution parameters.
///
/// # Returns
///
/// The levels ordered from finest (index 0) to coarsest.
///
/// # Errors
///
/// Fails if the configuration is invalid or if a level would have an empty image.
pub fn build_pyramid<const C: usize>(
    image: &Image<f64, C>,
    config: &BlindDeconvConfig,
) -> Result<Vec<PyramidLevel<C>>, DeconvError> {
    config.validate()?;

    if image.size().area() == 0 {
        return Err(DeconvError::ImageError(prida_image::ImageError::EmptyImage));
    }

    let schedule = level_schedule(config);

    let mut levels = Vec::with_capacity(schedule.len());
    levels.push(PyramidLevel {
        image: image.clone(),
        kernel_size: schedule[0].kernel_size,
        lambda: schedule[0].lambda,
    });

    let mut image_size = image.size();
    for pair in schedule.windows(2) {
        let (prev, level) = (&pair[0], &pair[1]);

        image_size = ImageSize {
            width: shrink_image_side(
                image_size.width,
                prev.kernel_size.width,
                level.kernel_size.width,
            )?,
            height: shrink_image_side(
                image_size.height,
                prev.kernel_size.height,
                level.kernel_size.height,
            )?,
        };

        let mut resized = Image::from_size_val(image_size, 0.0)?;
        resize_bilinear(image, &mut resized)?;

        levels.push(PyramidLevel {
            image: resized,
            kernel_size: level.kernel_size,
            lambda: level.lambda,
        });
    }

    log::debug!(
        "built pyramid with {} levels, coarsest image {}x{}",
        levels.len(),
        image_size.width,
        image_size.height
    );

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shrink_kernel_side() {
        assert_eq!(shrink_kernel_side(15, 1.1), 13);
        assert_eq!(shrink_kernel_side(11, 1.1), 9);
        // 5 / 1.1 rounds back to 5
        assert_eq!(shrink_kernel_side(5, 1.1), 3);
        assert_eq!(shrink_kernel_side(5, 4.0), 3);
    }

    #[test]
    fn test_schedule_kernel_floor() {
        let config = BlindDeconvConfig::new(ImageSize::square(15), 0.002);
        let schedule = level_schedule(&config);

        let sides = schedule
            .iter()
            .map(|l| l.kernel_size.height)
            .collect::<Vec<_>>();
        assert_eq!(sides, vec![15, 13, 11, 9, 7, 5, 3]);

        for (s, level) in schedule.iter().enumerate() {
            assert_relative_eq!(level.lambda, 0.002 * 1.9f64.powi(s as i32), epsilon = 1e-15);
        }
    }

    #[test]
    fn test_schedule_lambda_ceiling() {
        // 0.06 * 1.9 exceeds the ceiling straight away
        let config = BlindDeconvConfig::new(ImageSize::square(31), 0.06);
        assert_eq!(level_schedule(&config).len(), 1);

        let config = BlindDeconvConfig::new(ImageSize::square(31), 0.02);
        let schedule = level_schedule(&config);
        assert_eq!(schedule.len(), 3);
        assert!(schedule.iter().all(|l| l.lambda < config.max_lambda));
    }

    #[test]
    fn test_small_kernel_single_level() {
        for side in [1, 3] {
            let config = BlindDeconvConfig::new(ImageSize::square(side), 0.001);
            assert_eq!(level_schedule(&config).len(), 1);
        }
    }

    #[test]
    fn test_non_square_kernel() {
        let config = BlindDeconvConfig::new(
            ImageSize {
                width: 9,
                height: 5,
            },
            0.001,
        );
        let schedule = level_schedule(&config);
        let sizes = schedule.iter().map(|l| l.kernel_size).collect::<Vec<_>>();
        assert_eq!(
            sizes,
            vec![
                ImageSize {
                    width: 9,
                    height: 5
                },
                ImageSize {
                    width: 7,
                    height: 3
                },
            ]
        );
    }

    #[test]
    fn test_build_pyramid_sizes() -> Result<(), DeconvError> {
        let image = Image::<f64, 1>::from_size_val(ImageSize::square(101), 0.5)?;
        let config = BlindDeconvConfig::new(ImageSize::square(15), 0.002);

        let levels = build_pyramid(&image, &config)?;

        let sides = levels
            .iter()
            .map(|l| l.image_size().width)
            .collect::<Vec<_>>();
        assert_eq!(sides, vec![101, 87, 73, 59, 45, 31, 19]);

        assert_eq!(levels[0].image, image);
        for level in levels.iter() {
            assert_eq!(level.image_size().width, level.image_size().height);
            assert!(level.image.as_slice().iter().all(|&v| (v - 0.5).abs() < 1e-12));
            assert_eq!(
                level.latent_size(),
                latent_size(level.image_size(), level.kernel_size)
            );
        }

        Ok(())
    }

    #[test]
    fn test_build_pyramid_vanishing_image() -> Result<(), DeconvError> {
        // the kernel shrinks from 15 to 3 in one step
        let image = Image::<f64, 1>::from_size_val(ImageSize::square(2), 0.5)?;
        let config =
            BlindDeconvConfig::new(ImageSize::square(15), 0.002).with_kernel_size_multiplier(4.0);

        assert!(matches!(
            build_pyramid(&image, &config),
            Err(DeconvError::InvalidConfiguration(_))
        ));

        Ok(())
    }
}
