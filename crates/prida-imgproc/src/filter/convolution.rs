use std::borrow::Cow;

use prida_image::{Image, ImageError, ImageSize};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::flip::rotate180;
use crate::padding::{spatial_padding, Padding2D, PaddingMode};

/// Output size convention of a 2D convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolutionMode {
    /// Every position where the kernel overlaps the input at least partially.
    ///
    /// The output size is `input + kernel - 1` per axis.
    Full,
    /// Only positions where the kernel fully overlaps the input.
    ///
    /// The output size is `input - kernel + 1` per axis.
    Valid,
}

impl ConvolutionMode {
    /// Compute the size of the convolution output.
    ///
    /// # Arguments
    ///
    /// * `src` - The size of the input.
    /// * `kernel` - The size of the kernel.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidDimensions`] if either operand is empty or, in
    /// [`ConvolutionMode::Valid`], if the kernel is larger than the input on any axis.
    ///
    /// # Example
    ///
    /// ```
    /// use prida_image::ImageSize;
    /// use prida_imgproc::filter::ConvolutionMode;
    ///
    /// let src = ImageSize { width: 9, height: 7 };
    /// let kernel = ImageSize { width: 3, height: 5 };
    ///
    /// assert_eq!(ConvolutionMode::Full.output_size(src, kernel).unwrap(), [11, 11].into());
    /// assert_eq!(ConvolutionMode::Valid.output_size(src, kernel).unwrap(), [7, 3].into());
    /// assert!(ConvolutionMode::Valid.output_size(kernel, src).is_err());
    /// ```
    pub fn output_size(&self, src: ImageSize, kernel: ImageSize) -> Result<ImageSize, ImageError> {
        let invalid = || {
            ImageError::InvalidDimensions(kernel.width, kernel.height, src.width, src.height)
        };

        if src.area() == 0 || kernel.area() == 0 {
            return Err(invalid());
        }

        match self {
            ConvolutionMode::Full => Ok(ImageSize {
                width: src.width + kernel.width - 1,
                height: src.height + kernel.height - 1,
            }),
            ConvolutionMode::Valid => {
                if kernel.width > src.width || kernel.height > src.height {
                    return Err(invalid());
                }
                Ok(ImageSize {
                    width: src.width - kernel.width + 1,
                    height: src.height - kernel.height + 1,
                })
            }
        }
    }
}

/// Correlate `src` with `kernel` over the fully-overlapping positions.
///
/// PRECONDITION: `dst` has size `src - kernel + 1` per axis.
fn correlate_valid(src: &Image<f64, 1>, kernel: &Image<f64, 1>, dst: &mut Image<f64, 1>) {
    let src_cols = src.cols();
    let (kernel_rows, kernel_cols) = (kernel.rows(), kernel.cols());
    let src_data = src.as_slice();
    let kernel_data = kernel.as_slice();
    let dst_cols = dst.cols();

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_cols)
        .enumerate()
        .for_each(|(r, dst_row)| {
            for (c, out) in dst_row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for kr in 0..kernel_rows {
                    let src_offset = (r + kr) * src_cols + c;
                    let src_row = &src_data[src_offset..src_offset + kernel_cols];
                    let kernel_row = &kernel_data[kr * kernel_cols..(kr + 1) * kernel_cols];
                    acc += src_row
                        .iter()
                        .zip(kernel_row)
                        .map(|(s, k)| s * k)
                        .sum::<f64>();
                }
                *out = acc;
            }
        });
}

/// Compute the true 2D convolution of a single-channel image with a kernel.
///
/// The kernel is rotated by 180 degrees before sliding it over the input, so
/// this is a convolution and not a correlation. In [`ConvolutionMode::Full`]
/// the input is zero-padded by `kernel - 1` on every side first.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, 1).
/// * `kernel` - The kernel with shape (KH, KW, 1).
/// * `dst` - The output image, sized according to [`ConvolutionMode::output_size`].
/// * `mode` - The output size convention.
///
/// # Errors
///
/// Returns [`ImageError::InvalidDimensions`] if the operands do not fit the mode and
/// [`ImageError::InvalidImageSize`] if `dst` does not have the expected size.
///
/// # Example
///
/// ```
/// use prida_image::{Image, ImageSize};
/// use prida_imgproc::filter::{convolve2d, ConvolutionMode};
///
/// let src = Image::<f64, 1>::new(ImageSize { width: 3, height: 1 }, vec![1.0, 2.0, 3.0]).unwrap();
/// let kernel = Image::<f64, 1>::new(ImageSize { width: 2, height: 1 }, vec![1.0, 10.0]).unwrap();
///
/// let mut full = Image::<f64, 1>::from_size_val(ImageSize { width: 4, height: 1 }, 0.0).unwrap();
/// convolve2d(&src, &kernel, &mut full, ConvolutionMode::Full).unwrap();
/// assert_eq!(full.as_slice(), &[1.0, 12.0, 23.0, 30.0]);
///
/// let mut valid = Image::<f64, 1>::from_size_val(ImageSize { width: 2, height: 1 }, 0.0).unwrap();
/// convolve2d(&src, &kernel, &mut valid, ConvolutionMode::Valid).unwrap();
/// assert_eq!(valid.as_slice(), &[12.0, 23.0]);
/// ```
pub fn convolve2d(
    src: &Image<f64, 1>,
    kernel: &Image<f64, 1>,
    dst: &mut Image<f64, 1>,
    mode: ConvolutionMode,
) -> Result<(), ImageError> {
    let expected = mode.output_size(src.size(), kernel.size())?;
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            expected.width,
            expected.height,
        ));
    }

    let flipped = rotate180(kernel)?;

    let padded = match mode {
        ConvolutionMode::Valid => Cow::Borrowed(src),
        ConvolutionMode::Full => {
            let padding = Padding2D::symmetric(kernel.rows() - 1, kernel.cols() - 1);
            let mut padded = Image::from_size_val(padding.padded_size(src.size()), 0.0)?;
            spatial_padding(src, &mut padded, padding, PaddingMode::Constant, [0.0])?;
            Cow::Owned(padded)
        }
    };

    correlate_valid(&padded, &flipped, dst);

    Ok(())
}

/// Allocate the output and compute the true 2D convolution.
///
/// Convenience wrapper around [`convolve2d`].
pub fn convolve2d_alloc(
    src: &Image<f64, 1>,
    kernel: &Image<f64, 1>,
    mode: ConvolutionMode,
) -> Result<Image<f64, 1>, ImageError> {
    let size = mode.output_size(src.size(), kernel.size())?;
    let mut dst = Image::from_size_val(size, 0.0)?;
    convolve2d(src, kernel, &mut dst, mode)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_image(size: ImageSize, rng: &mut StdRng) -> Result<Image<f64, 1>, ImageError> {
        let data = (0..size.area()).map(|_| rng.random_range(-1.0..1.0)).collect();
        Image::new(size, data)
    }

    // direct evaluation of the convolution sum with implicit zero padding
    fn naive_full(src: &Image<f64, 1>, kernel: &Image<f64, 1>) -> Vec<f64> {
        let (h, w) = (src.rows() as isize, src.cols() as isize);
        let (kh, kw) = (kernel.rows() as isize, kernel.cols() as isize);
        let mut out = Vec::new();
        for i in 0..(h + kh - 1) {
            for j in 0..(w + kw - 1) {
                let mut acc = 0.0;
                for p in 0..kh {
                    for q in 0..kw {
                        let (y, x) = (i - p, j - q);
                        if y >= 0 && y < h && x >= 0 && x < w {
                            acc += src.as_slice()[(y * w + x) as usize]
                                * kernel.as_slice()[(p * kw + q) as usize];
                        }
                    }
                }
                out.push(acc);
            }
        }
        out
    }

    #[test]
    fn test_output_shapes() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_val([7, 5].into(), 1.0)?;
        let kernel = Image::<f64, 1>::from_size_val([3, 3].into(), 1.0)?;

        let full = convolve2d_alloc(&src, &kernel, ConvolutionMode::Full)?;
        assert_eq!(full.size(), [9, 7].into());

        let valid = convolve2d_alloc(&src, &kernel, ConvolutionMode::Valid)?;
        assert_eq!(valid.size(), [5, 3].into());

        Ok(())
    }

    #[test]
    fn test_valid_kernel_too_large() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_val([5, 5].into(), 1.0)?;

        let tall = Image::<f64, 1>::from_size_val([3, 7].into(), 1.0)?;
        assert_eq!(
            convolve2d_alloc(&src, &tall, ConvolutionMode::Valid),
            Err(ImageError::InvalidDimensions(3, 7, 5, 5))
        );

        let wide = Image::<f64, 1>::from_size_val([6, 1].into(), 1.0)?;
        assert_eq!(
            convolve2d_alloc(&src, &wide, ConvolutionMode::Valid),
            Err(ImageError::InvalidDimensions(6, 1, 5, 5))
        );

        // the same operands are fine for the full mode
        assert!(convolve2d_alloc(&src, &tall, ConvolutionMode::Full).is_ok());

        Ok(())
    }

    #[test]
    fn test_dst_size_mismatch() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_val([5, 5].into(), 1.0)?;
        let kernel = Image::<f64, 1>::from_size_val([3, 3].into(), 1.0)?;
        let mut dst = Image::<f64, 1>::from_size_val([5, 5].into(), 0.0)?;

        let res = convolve2d(&src, &kernel, &mut dst, ConvolutionMode::Valid);
        assert_eq!(res, Err(ImageError::InvalidImageSize(5, 5, 3, 3)));

        Ok(())
    }

    #[test]
    fn test_full_matches_direct_sum() -> Result<(), ImageError> {
        let mut rng = StdRng::seed_from_u64(7);
        let src = random_image([6, 5].into(), &mut rng)?;

        // single row and single column kernels pad one axis only
        for kernel_size in [[3, 5], [3, 1], [1, 3], [1, 1]] {
            let kernel = random_image(kernel_size.into(), &mut rng)?;

            let full = convolve2d_alloc(&src, &kernel, ConvolutionMode::Full)?;
            let expected = naive_full(&src, &kernel);

            assert_eq!(full.as_slice().len(), expected.len());
            for (v, e) in full.as_slice().iter().zip(expected.iter()) {
                assert_relative_eq!(*v, *e, epsilon = 1e-12);
            }
        }

        Ok(())
    }

    #[test]
    fn test_full_with_single_row_kernel() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::new([3, 3].into(), (1..=9).map(|v| v as f64).collect())?;
        let kernel = Image::<f64, 1>::from_size_val([3, 1].into(), 1.0)?;

        let full = convolve2d_alloc(&src, &kernel, ConvolutionMode::Full)?;
        assert_eq!(full.size(), [5, 3].into());

        #[rustfmt::skip]
        assert_eq!(
            full.as_slice(),
            &[
                1.0, 3.0, 6.0, 5.0, 3.0,
                4.0, 9.0, 15.0, 11.0, 6.0,
                7.0, 15.0, 24.0, 17.0, 9.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_valid_is_center_of_full() -> Result<(), ImageError> {
        let mut rng = StdRng::seed_from_u64(11);
        let src = random_image([8, 7].into(), &mut rng)?;
        let kernel = random_image([3, 5].into(), &mut rng)?;

        let full = convolve2d_alloc(&src, &kernel, ConvolutionMode::Full)?;
        let valid = convolve2d_alloc(&src, &kernel, ConvolutionMode::Valid)?;

        // the valid window starts at (kernel - 1) inside the full output
        for r in 0..valid.rows() {
            for c in 0..valid.cols() {
                let v = valid.get([r, c, 0]).copied().unwrap_or(f64::NAN);
                let f = full.get([r + 4, c + 2, 0]).copied().unwrap_or(f64::NAN);
                assert_relative_eq!(v, f, epsilon = 1e-12);
            }
        }

        Ok(())
    }

    #[test]
    fn test_delta_kernel_is_identity() -> Result<(), ImageError> {
        let mut rng = StdRng::seed_from_u64(3);
        let src = random_image([5, 4].into(), &mut rng)?;
        let delta = Image::<f64, 1>::new([1, 1].into(), vec![1.0])?;

        let valid = convolve2d_alloc(&src, &delta, ConvolutionMode::Valid)?;
        assert_eq!(valid, src);

        Ok(())
    }

    #[test]
    fn test_convolution_flips_the_kernel() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = Image::<f64, 1>::new([3, 3].into(), vec![
            0.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 0.0,
        ])?;
        #[rustfmt::skip]
        let kernel = Image::<f64, 1>::new([3, 3].into(), vec![
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0,
        ])?;

        // an impulse reproduces the kernel itself, not its rotation
        let full = convolve2d_alloc(&src, &kernel, ConvolutionMode::Full)?;
        let center = [1, 2, 3, 1, 2, 3, 1, 2, 3]
            .iter()
            .zip([1, 1, 1, 2, 2, 2, 3, 3, 3].iter())
            .map(|(&c, &r)| full.get([r, c, 0]).copied().unwrap_or(f64::NAN))
            .collect::<Vec<_>>();
        assert_eq!(center, kernel.as_slice());

        Ok(())
    }
}
