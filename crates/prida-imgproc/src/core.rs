use prida_image::{Image, ImageError};

/// Compute the largest absolute value of an image.
///
/// Returns `0.0` for an image without pixels.
///
/// # Example
///
/// ```
/// use prida_image::{Image, ImageSize};
/// use prida_imgproc::core::max_abs;
///
/// let image = Image::<f64, 1>::new(
///    ImageSize {
///      width: 3,
///      height: 1,
///  },
/// vec![0.5, -2.0, 1.0],
/// ).unwrap();
///
/// assert_eq!(max_abs(&image), 2.0);
/// ```
pub fn max_abs<const C: usize>(image: &Image<f64, C>) -> f64 {
    image
        .as_slice()
        .iter()
        .fold(0.0f64, |acc, &v| acc.max(v.abs()))
}

/// Compute the sum of all the elements of an image.
pub fn sum<const C: usize>(image: &Image<f64, C>) -> f64 {
    image.as_slice().iter().sum()
}

/// Compute the euclidean distance between two images of the same shape.
///
/// # Errors
///
/// An error is returned if the two images have different sizes.
pub fn l2_distance<const C: usize>(
    a: &Image<f64, C>,
    b: &Image<f64, C>,
) -> Result<f64, ImageError> {
    if a.size() != b.size() {
        return Err(ImageError::InvalidImageSize(
            a.width(),
            a.height(),
            b.width(),
            b.height(),
        ));
    }

    let sq_sum = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>();

    Ok(sq_sum.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prida_image::ImageSize;

    #[test]
    fn test_reductions() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 2,
        };
        let a = Image::<f64, 1>::new(size, vec![1.0, -3.0, 2.0, 0.0])?;
        let b = Image::<f64, 1>::new(size, vec![1.0, 1.0, 2.0, 3.0])?;

        assert_eq!(max_abs(&a), 3.0);
        assert_eq!(sum(&a), 0.0);
        assert_eq!(l2_distance(&a, &b)?, 5.0);

        let c = Image::<f64, 1>::from_size_val([1, 4].into(), 0.0)?;
        assert!(l2_distance(&a, &c).is_err());

        Ok(())
    }
}
