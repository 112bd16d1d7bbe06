use prida_image::{Image, ImageError};

/// Rotate the input image by 180 degrees.
///
/// Equivalent to flipping the image both horizontally and vertically. The
/// channel order inside each pixel is preserved.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
///
/// # Returns
///
/// The rotated image.
///
/// # Example
///
/// ```
/// use prida_image::{Image, ImageSize};
/// use prida_imgproc::flip::rotate180;
///
/// let image = Image::<f64, 1>::new(
///     ImageSize {
///         width: 3,
///         height: 2,
///     },
///     vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
/// )
/// .unwrap();
///
/// let rotated = rotate180(&image).unwrap();
///
/// assert_eq!(rotated.as_slice(), &[5.0, 4.0, 3.0, 2.0, 1.0, 0.0]);
/// ```
pub fn rotate180<T, const C: usize>(src: &Image<T, C>) -> Result<Image<T, C>, ImageError>
where
    T: Copy,
{
    let data = src
        .as_slice()
        .chunks_exact(C)
        .rev()
        .flatten()
        .copied()
        .collect();

    Image::new(src.size(), data)
}
