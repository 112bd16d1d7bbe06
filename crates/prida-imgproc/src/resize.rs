use prida_image::{Image, ImageError};
use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Source sample position for one destination coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisSample {
    // lower source index
    i0: usize,
    // upper source index, equal to `i0` at the border
    i1: usize,
    // weight of the upper sample
    frac: f64,
}

/// Compute the source positions along one axis.
///
/// Pixel centers are aligned (`src = (dst + 0.5) * scale - 0.5`) and samples
/// falling outside the source are clamped to the border pixel.
fn axis_samples(src_len: usize, dst_len: usize) -> Vec<AxisSample> {
    let scale = src_len as f64 / dst_len as f64;

    (0..dst_len)
        .map(|d| {
            let pos = (d as f64 + 0.5) * scale - 0.5;
            let floor = pos.floor();
            let mut frac = pos - floor;
            let mut i0 = floor as isize;

            if i0 < 0 {
                i0 = 0;
                frac = 0.0;
            }
            if i0 >= src_len as isize - 1 {
                i0 = src_len as isize - 1;
                frac = 0.0;
            }

            let i0 = i0 as usize;
            AxisSample {
                i0,
                i1: (i0 + 1).min(src_len - 1),
                frac,
            }
        })
        .collect()
}

/// Resize an image to a new size using bilinear interpolation.
///
/// The output size is given by the size of `dst`. The sampling grid aligns the
/// pixel centers of both images and replicates the border pixels, so resizing
/// to the same size returns an exact copy.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container.
///
/// # Errors
///
/// An error is returned if either image has no pixels.
///
/// # Example
///
/// ```
/// use prida_image::{Image, ImageSize};
/// use prida_imgproc::resize::resize_bilinear;
///
/// let image = Image::<_, 3>::new(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     vec![0f64; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let new_size = ImageSize {
///     width: 2,
///     height: 3,
/// };
///
/// let mut image_resized = Image::<_, 3>::from_size_val(new_size, 0.0).unwrap();
///
/// resize_bilinear(&image, &mut image_resized).unwrap();
///
/// assert_eq!(image_resized.num_channels(), 3);
/// assert_eq!(image_resized.size().width, 2);
/// assert_eq!(image_resized.size().height, 3);
/// ```
pub fn resize_bilinear<const C: usize>(
    src: &Image<f64, C>,
    dst: &mut Image<f64, C>,
) -> Result<(), ImageError> {
    if src.size().area() == 0 || dst.size().area() == 0 {
        return Err(ImageError::EmptyImage);
    }

    let xs = axis_samples(src.cols(), dst.cols());
    let ys = axis_samples(src.rows(), dst.rows());

    let src_stride = src.cols() * C;
    let src_data = src.as_slice();
    let dst_stride = dst.cols() * C;

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_stride)
        .zip(ys.par_iter())
        .for_each(|(dst_row, sy)| {
            let row0 = &src_data[sy.i0 * src_stride..(sy.i0 + 1) * src_stride];
            let row1 = &src_data[sy.i1 * src_stride..(sy.i1 + 1) * src_stride];

            for (dst_pixel, sx) in dst_row.chunks_exact_mut(C).zip(xs.iter()) {
                for (k, out) in dst_pixel.iter_mut().enumerate() {
                    let p00 = row0[sx.i0 * C + k];
                    let p01 = row0[sx.i1 * C + k];
                    let p10 = row1[sx.i0 * C + k];
                    let p11 = row1[sx.i1 * C + k];

                    let top = p00 * (1.0 - sx.frac) + p01 * sx.frac;
                    let bottom = p10 * (1.0 - sx.frac) + p11 * sx.frac;
                    *out = top * (1.0 - sy.frac) + bottom * sy.frac;
                }
            }
        });

    Ok(())
}
