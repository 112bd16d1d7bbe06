use crate::{Image, ImageError};

/// Cast the pixel data of an image to a different type.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image.
/// * `scale` - The scale to multiply the pixel data with.
///
/// Example:
///
/// ```
/// use prida_image::{Image, ImageSize};
/// use prida_image::ops::cast_and_scale;
///
/// let image = Image::<u8, 1>::new(
///  ImageSize {
///   width: 2,
///  height: 1,
/// },
/// vec![0u8, 255],
/// ).unwrap();
///
/// let mut image_f64 = Image::from_size_val(image.size(), 0.0f64).unwrap();
///
/// cast_and_scale(&image, &mut image_f64, 1. / 255.0).unwrap();
///
/// assert_eq!(image_f64.get([0, 0, 0]), Some(&0.0f64));
/// assert_eq!(image_f64.get([0, 1, 0]), Some(&1.0f64));
/// ```
pub fn cast_and_scale<T, U, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<U, C>,
    scale: U,
) -> Result<(), ImageError>
where
    T: Copy + num_traits::NumCast,
    U: Copy + num_traits::NumCast + std::ops::Mul<U, Output = U>,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    dst.as_slice_mut()
        .iter_mut()
        .zip(src.as_slice().iter())
        .try_for_each(|(out, &inp)| {
            let x = U::from(inp).ok_or(ImageError::CastError)?;
            *out = x * scale;
            Ok::<(), ImageError>(())
        })?;

    Ok(())
}

/// Replicate a single-channel image into every channel of a `C`-channel image.
///
/// ```
/// use prida_image::{Image, ImageSize};
/// use prida_image::ops::broadcast_channels;
///
/// let gray = Image::<u8, 1>::new(ImageSize { width: 2, height: 1 }, vec![7, 9]).unwrap();
/// let rgb: Image<u8, 3> = broadcast_channels(&gray).unwrap();
///
/// assert_eq!(rgb.as_slice(), &[7, 7, 7, 9, 9, 9]);
/// ```
pub fn broadcast_channels<T: Copy, const C: usize>(
    src: &Image<T, 1>,
) -> Result<Image<T, C>, ImageError> {
    let data = src
        .as_slice()
        .iter()
        .flat_map(|&v| std::iter::repeat(v).take(C))
        .collect();

    Image::new(src.size(), data)
}

/// Check whether all channels of an image hold identical values.
///
/// Images whose planes are pixel-identical carry no color information and can be
/// processed as a single channel.
pub fn is_gray<T: Copy + PartialEq, const C: usize>(src: &Image<T, C>) -> bool {
    src.as_slice()
        .chunks_exact(C)
        .all(|pixel| pixel.iter().all(|v| *v == pixel[0]))
}
