/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image size is not valid.
    #[error("Invalid image size ({0}x{1}), expected ({2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index ({0}) is out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when the pixel data cannot be cast.
    #[error("Failed to cast image data")]
    CastError,

    /// Error when an operand does not fit the operation, e.g. a kernel larger than its input.
    #[error("Invalid dimensions: kernel ({0}x{1}) does not fit the image ({2}x{3})")]
    InvalidDimensions(usize, usize, usize, usize),

    /// Error when an operation receives an image without pixels.
    #[error("Image has no pixels")]
    EmptyImage,
}
