use prida_image::{Image, ImageError, ImageSize};
use rayon::prelude::*;

/// A border type for the spatial padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingMode {
    /// This border type fills the border with a single, constant color value.
    ///
    /// Example: ...d c b a | 0 0 0 0...
    Constant,

    /// This border type takes the outermost row or column of pixels and repeats it into the padded region.
    ///
    /// Example: ...d c b a | a a a a...
    Replicate,
}

impl PaddingMode {
    /// Maps index `i` to a valid index i.e. within `[0, len)` according to the padding mode.
    ///
    /// - `Replicate`: clamp to edge
    /// - `Constant`: returns 0 (not used directly)
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> usize {
        match self {
            PaddingMode::Replicate => i.clamp(0, len as isize - 1) as usize,
            PaddingMode::Constant => 0,
        }
    }

    /// Applies the selected padding mode to fill image borders in `new_data`.
    ///
    /// `new_data` already holds the original image in its center.
    /// [`PaddingMode::Constant`] is assumed to be already applied when initializing `new_data`.
    fn apply_padding<T: Copy + Send + Sync, const C: usize>(
        &self,
        new_data: &mut [T],
        old_size: ImageSize,
        new_size: ImageSize,
        padding: &Padding2D,
    ) {
        if let PaddingMode::Constant = self {
            return; // already filled
        }

        let Padding2D {
            top,
            bottom,
            left,
            right,
        } = *padding;
        let row_stride = new_size.width * C;

        // top
        {
            let (top_section, rest) = new_data.split_at_mut(top * row_stride);

            top_section
                .par_chunks_exact_mut(row_stride)
                .enumerate()
                .for_each(|(y, dst_row)| {
                    let src_y = self.map_index(y as isize - top as isize, old_size.height);
                    let src_row = &rest[src_y * row_stride..(src_y + 1) * row_stride];
                    dst_row.copy_from_slice(src_row);
                });
        }

        // bottom
        {
            let split_point = (new_size.height - bottom) * row_stride;
            let (rest, bottom_section) = new_data.split_at_mut(split_point);

            bottom_section
                .par_chunks_exact_mut(row_stride)
                .enumerate()
                .for_each(|(idx, dst_row)| {
                    let y = new_size.height - bottom + idx;
                    let src_y = self.map_index(y as isize - top as isize, old_size.height);
                    let src_start = (src_y + top) * row_stride;
                    let src_row = &rest[src_start..src_start + row_stride];
                    dst_row.copy_from_slice(src_row);
                });
        }

        new_data.par_chunks_exact_mut(row_stride).for_each(|row| {
            // left
            for x in 0..left {
                let src_x = self.map_index(x as isize - left as isize, old_size.width);
                let src_idx = (left + src_x) * C;
                row.copy_within(src_idx..src_idx + C, x * C);
            }

            // right
            for x in (new_size.width - right)..new_size.width {
                let src_x = self.map_index(x as isize - left as isize, old_size.width);
                let src_idx = (left + src_x) * C;
                row.copy_within(src_idx..src_idx + C, x * C);
            }
        });
    }
}

/// Represents 2D padding with top, bottom, left, and right values (in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding2D {
    /// Amount of padding to add on the top side.
    pub top: usize,
    /// Amount of padding to add on the bottom side.
    pub bottom: usize,
    /// Amount of padding to add on the left side.
    pub left: usize,
    /// Amount of padding to add on the right side.
    pub right: usize,
}

impl Padding2D {
    /// Symmetric padding of `vertical` rows on top and bottom and `horizontal` columns on each side.
    pub fn symmetric(vertical: usize, horizontal: usize) -> Self {
        Self {
            top: vertical,
            bottom: vertical,
            left: horizontal,
            right: horizontal,
        }
    }

    /// Size of an image of `size` once this padding is applied.
    pub fn padded_size(&self, size: ImageSize) -> ImageSize {
        ImageSize {
            width: size.width + self.left + self.right,
            height: size.height + self.top + self.bottom,
        }
    }
}

/// Creates a new image with spatial padding applied to reach target size,
/// centering the original image and using the specified fill value and type.
///
/// # Arguments
///
/// * `src` - The source image to pad.
/// * `dst` - The destination image where the padded output will be stored.
/// * `padding` - The amount of padding (in pixels) for all four sides defined in [`Padding2D`].
/// * `padding_mode` - The type of border handling to use defined in [`PaddingMode`].
/// * `constant_value` - The pixel value used for constant padding, one value per channel.
///
/// # Errors
///
/// Returns an error if the size of `dst` does not match the padded size of `src`,
/// or if `src` has no pixels and the mode needs to replicate them.
///
/// # Example
///
/// ```rust
/// use prida_image::{ImageSize, Image};
/// use prida_imgproc::padding::{PaddingMode, Padding2D, spatial_padding};
///
/// let src = Image::<f64, 1>::new(
///     ImageSize { width: 2, height: 1 },
///     vec![1.0, 2.0],
/// ).unwrap();
///
/// let mut dst = Image::<f64, 1>::from_size_val(ImageSize { width: 4, height: 3 }, 0.0).unwrap();
///
/// spatial_padding(
///     &src,
///     &mut dst,
///     Padding2D::symmetric(1, 1),
///     PaddingMode::Replicate,
///     [0.0],
/// ).unwrap();
///
/// assert_eq!(&dst.as_slice()[4..8], &[1.0, 1.0, 2.0, 2.0]);
/// ```
pub fn spatial_padding<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    padding: Padding2D,
    padding_mode: PaddingMode,
    constant_value: [T; C],
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    let expected = padding.padded_size(src.size());
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            expected.width,
            expected.height,
        ));
    }

    if padding_mode == PaddingMode::Replicate && src.size().area() == 0 {
        return Err(ImageError::EmptyImage);
    }

    if expected.area() == 0 {
        return Ok(());
    }

    let old_size = src.size();
    let new_size = dst.size();

    let old_data = src.as_slice();
    let new_data = dst.as_slice_mut();

    // fill with the constant value, the replicated borders are overwritten below
    new_data
        .chunks_exact_mut(C)
        .for_each(|chunk| chunk.copy_from_slice(&constant_value));

    // copy old image data as center of new image data
    let new_stride = new_size.width * C;
    let old_stride = old_size.width * C;

    if old_stride > 0 {
        let col_offset = padding.left * C;

        for (src_row, dst_row) in old_data
            .chunks_exact(old_stride)
            .zip(new_data.chunks_exact_mut(new_stride).skip(padding.top))
        {
            dst_row[col_offset..col_offset + old_stride].copy_from_slice(src_row);
        }
    }

    padding_mode.apply_padding::<T, C>(new_data, old_size, new_size, &padding);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prida_image::{Image, ImageError, ImageSize};

    // helper functions
    fn make_src_2x2_rgb() -> Result<Image<u8, 3>, ImageError> {
        Image::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4],
        )
    }

    fn make_dst_4x4_rgb() -> Result<Image<u8, 3>, ImageError> {
        Image::new(
            ImageSize {
                width: 4,
                height: 4,
            },
            vec![0u8; 48],
        )
    }

    const PAD_1: Padding2D = Padding2D {
        top: 1,
        bottom: 1,
        left: 1,
        right: 1,
    };

    #[test]
    fn test_spatial_padding_constant() -> Result<(), ImageError> {
        let src = make_src_2x2_rgb()?;
        let mut dst = make_dst_4x4_rgb()?;

        spatial_padding(&src, &mut dst, PAD_1, PaddingMode::Constant, [9, 9, 9])?;

        let d = dst.as_slice();

        // corners
        assert_eq!(&d[0..3], &[9, 9, 9]);
        assert_eq!(&d[45..48], &[9, 9, 9]);

        // top edge
        assert_eq!(&d[3..6], &[9, 9, 9]);

        // actual image
        assert_eq!(&d[15..18], &[1, 1, 1]);
        assert_eq!(&d[30..33], &[4, 4, 4]);

        Ok(())
    }

    #[test]
    fn test_spatial_padding_replicate() -> Result<(), ImageError> {
        let src = make_src_2x2_rgb()?;
        let mut dst = make_dst_4x4_rgb()?;

        spatial_padding(&src, &mut dst, PAD_1, PaddingMode::Replicate, [0, 0, 0])?;

        let d = dst.as_slice();

        // corners
        assert_eq!(&d[0..3], &[1, 1, 1]);
        assert_eq!(&d[45..48], &[4, 4, 4]);

        // edges
        assert_eq!(&d[3..6], &[1, 1, 1]);
        assert_eq!(&d[21..24], &[2, 2, 2]);

        Ok(())
    }

    #[test]
    fn test_spatial_padding_asymmetric_replicate() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = Image::<f64, 1>::new(
            ImageSize { width: 2, height: 2 },
            vec![
                1.0, 2.0,
                3.0, 4.0,
            ],
        )?;
        let padding = Padding2D {
            top: 0,
            bottom: 2,
            left: 1,
            right: 0,
        };
        let mut dst = Image::<f64, 1>::from_size_val(padding.padded_size(src.size()), 0.0)?;

        spatial_padding(&src, &mut dst, padding, PaddingMode::Replicate, [0.0])?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                1.0, 1.0, 2.0,
                3.0, 3.0, 4.0,
                3.0, 3.0, 4.0,
                3.0, 3.0, 4.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_spatial_padding_horizontal_only() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = Image::<f64, 1>::new(
            ImageSize { width: 2, height: 2 },
            vec![
                1.0, 2.0,
                3.0, 4.0,
            ],
        )?;
        let padding = Padding2D::symmetric(0, 1);

        let mut constant = Image::<f64, 1>::from_size_val(padding.padded_size(src.size()), 0.0)?;
        spatial_padding(&src, &mut constant, padding, PaddingMode::Constant, [9.0])?;

        #[rustfmt::skip]
        assert_eq!(
            constant.as_slice(),
            &[
                9.0, 1.0, 2.0, 9.0,
                9.0, 3.0, 4.0, 9.0,
            ]
        );

        let mut replicate = Image::<f64, 1>::from_size_val(padding.padded_size(src.size()), 0.0)?;
        spatial_padding(&src, &mut replicate, padding, PaddingMode::Replicate, [0.0])?;

        #[rustfmt::skip]
        assert_eq!(
            replicate.as_slice(),
            &[
                1.0, 1.0, 2.0, 2.0,
                3.0, 3.0, 4.0, 4.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_spatial_padding_top_and_left_only() -> Result<(), ImageError> {
        let src = Image::<u8, 2>::new([1, 2].into(), vec![1, 2, 3, 4])?;
        let padding = Padding2D {
            top: 1,
            bottom: 0,
            left: 1,
            right: 0,
        };
        let mut dst = Image::<u8, 2>::from_size_val(padding.padded_size(src.size()), 0)?;

        spatial_padding(&src, &mut dst, padding, PaddingMode::Constant, [7, 8])?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                7, 8, 7, 8,
                7, 8, 1, 2,
                7, 8, 3, 4,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_spatial_padding_size_mismatch() -> Result<(), ImageError> {
        let src = make_src_2x2_rgb()?;
        let mut dst = Image::<u8, 3>::from_size_val([3, 3].into(), 0)?;

        let res = spatial_padding(&src, &mut dst, PAD_1, PaddingMode::Constant, [0, 0, 0]);
        assert_eq!(res, Err(ImageError::InvalidImageSize(3, 3, 4, 4)));

        Ok(())
    }
}
