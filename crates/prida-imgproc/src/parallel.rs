use rayon::prelude::*;

use prida_image::{Image, ImageError};

/// Apply a single-channel operation to every channel of an image in parallel.
///
/// Each channel is extracted as an `Image<T, 1>` and handed to `f` together
/// with its index. The results are returned in channel order, so a caller that
/// folds them sequentially gets the same answer on every run regardless of the
/// thread scheduling.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `f` - The per-channel operation.
///
/// # Errors
///
/// If `f` fails on any channel, one of its errors is propagated.
///
/// # Example
///
/// ```
/// use prida_image::{Image, ImageError, ImageSize};
/// use prida_imgproc::parallel::par_map_channels;
///
/// let image = Image::<f64, 2>::new(
///     ImageSize { width: 2, height: 1 },
///     vec![1.0, 10.0, 2.0, 20.0],
/// )
/// .unwrap();
///
/// let sums = par_map_channels(&image, |_, plane| {
///     Ok::<_, ImageError>(plane.as_slice().iter().sum::<f64>())
/// })
/// .unwrap();
///
/// assert_eq!(sums, vec![3.0, 30.0]);
/// ```
pub fn par_map_channels<T, R, E, const C: usize>(
    src: &Image<T, C>,
    f: impl Fn(usize, Image<T, 1>) -> Result<R, E> + Send + Sync,
) -> Result<Vec<R>, E>
where
    T: Copy + Send + Sync,
    R: Send,
    E: From<ImageError> + Send,
{
    let channels = src.split_channels()?;

    channels
        .into_par_iter()
        .enumerate()
        .map(|(i, plane)| f(i, plane))
        .collect()
}
