use prida_image::{Image, ImageError};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Lower bound on the gradient magnitudes in [`tv_gradient`].
pub const TV_EPSILON: f64 = 1e-3;

/// Compute the gradient of the isotropic total variation of an image.
///
/// Each channel is processed independently. Neighbours outside the image are
/// replaced by the nearest border pixel, and every gradient magnitude is
/// bounded below by [`TV_EPSILON`]. With `x` running along the rows and `y`
/// along the columns, the output at every pixel is
///
/// ```text
/// (fx+ + fy+) / max(|(fx+, fy+)|, eps)
///     - fx- / max(|(fx-, fy~)|, eps)
///     - fy- / max(|(fx~, fy-)|, eps)
/// ```
///
/// where `fx+`, `fy+` are forward differences, `fx-`, `fy-` backward
/// differences, `fy~` the forward column difference one row up and `fx~` the
/// forward row difference one column to the left.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dst` - The output image with the same shape as `src`.
///
/// # Errors
///
/// Returns an error if `src` and `dst` differ in size.
///
/// # Example
///
/// ```
/// use prida_image::{Image, ImageSize};
/// use prida_imgproc::total_variation::tv_gradient;
///
/// let src = Image::<f64, 1>::new(ImageSize { width: 2, height: 1 }, vec![0.0, 1.0]).unwrap();
/// let mut dst = Image::<f64, 1>::from_size_val(src.size(), 0.0).unwrap();
///
/// tv_gradient(&src, &mut dst).unwrap();
///
/// assert_eq!(dst.as_slice(), &[1.0, -1.0]);
/// ```
pub fn tv_gradient<const C: usize>(
    src: &Image<f64, C>,
    dst: &mut Image<f64, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    if src.size().area() == 0 {
        return Ok(());
    }

    let (rows, cols) = (src.rows() as isize, src.cols() as isize);
    let src_data = src.as_slice();

    // value at a clamped position
    let at = |r: isize, c: isize, ch: usize| -> f64 {
        let r = r.clamp(0, rows - 1) as usize;
        let c = c.clamp(0, cols - 1) as usize;
        src_data[(r * cols as usize + c) * C + ch]
    };

    dst.as_slice_mut()
        .par_chunks_exact_mut(cols as usize * C)
        .enumerate()
        .for_each(|(r, dst_row)| {
            let r = r as isize;
            for (c, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
                let c = c as isize;
                for (ch, out) in dst_pixel.iter_mut().enumerate() {
                    let center = at(r, c, ch);
                    let up = at(r - 1, c, ch);
                    let left = at(r, c - 1, ch);

                    let fx_forw = at(r + 1, c, ch) - center;
                    let fy_forw = at(r, c + 1, ch) - center;
                    let fx_back = center - up;
                    let fy_back = center - left;
                    let fx_mixed = at(r + 1, c - 1, ch) - left;
                    let fy_mixed = at(r - 1, c + 1, ch) - up;

                    let norm_forw = fx_forw.hypot(fy_forw).max(TV_EPSILON);
                    let norm_up = fy_mixed.hypot(fx_back).max(TV_EPSILON);
                    let norm_left = fx_mixed.hypot(fy_back).max(TV_EPSILON);

                    *out = (fx_forw + fy_forw) / norm_forw - fx_back / norm_up - fy_back / norm_left;
                }
            }
        });

    Ok(())
}
