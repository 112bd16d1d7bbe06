use prida_image::{Image, ImageSize};
use prida_imgproc::{core::sum, resize::resize_bilinear};

use crate::errors::DeconvError;

/// A blur kernel (point-spread function).
///
/// The kernel has odd sides, nonnegative entries and sums to one. Every
/// constructor enforces these constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel(Image<f64, 1>);

/// Check that a kernel size has odd, positive sides.
fn check_kernel_size(size: ImageSize) -> Result<(), DeconvError> {
    if size.width % 2 == 0 || size.height % 2 == 0 {
        return Err(DeconvError::InvalidKernel(format!(
            "kernel sides must be odd and positive, got {}x{}",
            size.width, size.height
        )));
    }
    Ok(())
}

impl Kernel {
    /// Create a box kernel where every entry has the same weight.
    ///
    /// # Example
    ///
    /// ```
    /// use prida_deconv::kernel::Kernel;
    /// use prida_image::ImageSize;
    ///
    /// let kernel = Kernel::uniform(ImageSize::square(3)).unwrap();
    /// assert!((kernel.sum() - 1.0).abs() < 1e-12);
    /// ```
    pub fn uniform(size: ImageSize) -> Result<Self, DeconvError> {
        check_kernel_size(size)?;
        let image = Image::from_size_val(size, 1.0 / size.area() as f64)?;
        Ok(Self(image))
    }

    /// Create a kernel from unnormalized weights.
    ///
    /// # Errors
    ///
    /// Fails if the sides are not odd, if any weight is negative or not finite,
    /// or if the weights sum to zero.
    pub fn from_weights(weights: Image<f64, 1>) -> Result<Self, DeconvError> {
        check_kernel_size(weights.size())?;

        if let Some(w) = weights
            .as_slice()
            .iter()
            .find(|w| !w.is_finite() || **w < 0.0)
        {
            return Err(DeconvError::InvalidKernel(format!(
                "kernel weights must be finite and nonnegative, found {w}"
            )));
        }

        let total = sum(&weights);
        if total <= 0.0 || !total.is_finite() {
            return Err(DeconvError::InvalidKernel(format!(
                "kernel weights must have a positive sum, got {total}"
            )));
        }

        Ok(Self(weights.map(|w| w / total)))
    }

    /// Resample the kernel to a new odd size and renormalize it.
    pub fn resize(&self, size: ImageSize) -> Result<Self, DeconvError> {
        check_kernel_size(size)?;
        let mut resized = Image::from_size_val(size, 0.0)?;
        resize_bilinear(&self.0, &mut resized)?;
        Self::from_weights(resized)
    }

    /// Size of the kernel.
    pub fn size(&self) -> ImageSize {
        self.0.size()
    }

    /// Number of kernel rows.
    pub fn rows(&self) -> usize {
        self.0.rows()
    }

    /// Number of kernel columns.
    pub fn cols(&self) -> usize {
        self.0.cols()
    }

    /// Sum of all weights. Equal to one up to rounding.
    pub fn sum(&self) -> f64 {
        sum(&self.0)
    }

    /// Borrow the weights as an image.
    pub fn as_image(&self) -> &Image<f64, 1> {
        &self.0
    }

    /// Consume the kernel and return its weights.
    pub fn into_image(self) -> Image<f64, 1> {
        self.0
    }
}
