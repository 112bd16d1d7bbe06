use prida_image::{Image, ImageError, ImageSize};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

/// Copy the window of `src` whose top-left pixel is `(x, y)` into `dst`.
///
/// The window has the size of `dst`.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image, sized like the window.
/// * `x` - The column of the top-left pixel of the window.
/// * `y` - The row of the top-left pixel of the window.
///
/// # Errors
///
/// Returns [`ImageError::InvalidImageSize`] with the far corner of the window
/// and the size of `src` if the window does not lie inside `src`.
///
/// # Examples
///
/// ```rust
/// use prida_image::{Image, ImageSize};
/// use prida_imgproc::crop::crop_image;
///
/// #[rustfmt::skip]
/// let image = Image::<f64, 2>::new(ImageSize { width: 3, height: 2 }, vec![
///     0.0, 0.5,   1.0, 1.5,   2.0, 2.5,
///     3.0, 3.5,   4.0, 4.5,   5.0, 5.5,
/// ]).unwrap();
///
/// let mut window = Image::<f64, 2>::from_size_val(ImageSize { width: 2, height: 1 }, 0.0).unwrap();
///
/// crop_image(&image, &mut window, 1, 1).unwrap();
///
/// assert_eq!(window.as_slice(), &[4.0, 4.5, 5.0, 5.5]);
/// ```
pub fn crop_image<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    x: usize,
    y: usize,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    let (right, bottom) = (x + dst.cols(), y + dst.rows());
    if right > src.cols() || bottom > src.rows() {
        return Err(ImageError::InvalidImageSize(
            right,
            bottom,
            src.cols(),
            src.rows(),
        ));
    }

    if dst.size().area() == 0 {
        return Ok(());
    }

    let (first, last) = (x * C, right * C);
    let dst_stride = dst.cols() * C;

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_stride)
        .zip(src.as_slice().par_chunks_exact(src.cols() * C).skip(y))
        .for_each(|(dst_row, src_row)| dst_row.copy_from_slice(&src_row[first..last]));

    Ok(())
}

/// Allocate a window of `size` at `(x, y)` and copy it out of `src`.
///
/// Convenience wrapper around [`crop_image`].
pub fn crop_window<T, const C: usize>(
    src: &Image<T, C>,
    size: ImageSize,
    x: usize,
    y: usize,
) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Default + Send + Sync,
{
    let mut dst = Image::from_size_val(size, T::default())?;
    crop_image(src, &mut dst, x, y)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::{crop_image, crop_window};
    use prida_image::{Image, ImageError, ImageSize};

    fn ramp(size: ImageSize) -> Result<Image<u8, 1>, ImageError> {
        Image::new(size, (0..size.area() as u8).collect())
    }

    #[test]
    fn test_crop_bottom_right_corner() -> Result<(), ImageError> {
        let image = ramp([4, 3].into())?;

        let window = crop_window(&image, [2, 2].into(), 2, 1)?;

        assert_eq!(window.as_slice(), &[6, 7, 10, 11]);

        Ok(())
    }

    #[test]
    fn test_crop_full_extent_is_a_copy() -> Result<(), ImageError> {
        let image = ramp([3, 5].into())?;
        assert_eq!(crop_window(&image, image.size(), 0, 0)?, image);
        Ok(())
    }

    #[test]
    fn test_crop_out_of_bounds() -> Result<(), ImageError> {
        let image = Image::<f64, 1>::from_size_val([3, 3].into(), 0.0)?;
        let mut cropped = Image::<f64, 1>::from_size_val([2, 2].into(), 0.0)?;

        let res = crop_image(&image, &mut cropped, 2, 0);
        assert_eq!(res, Err(ImageError::InvalidImageSize(4, 2, 3, 3)));

        let res = crop_window(&image, [1, 2].into(), 0, 2);
        assert_eq!(res, Err(ImageError::InvalidImageSize(1, 4, 3, 3)));

        Ok(())
    }

    #[test]
    fn test_crop_empty_window() -> Result<(), ImageError> {
        let image = ramp([3, 3].into())?;
        let window = crop_window(&image, [0, 2].into(), 3, 1)?;
        assert_eq!(window.size().area(), 0);
        Ok(())
    }
}
