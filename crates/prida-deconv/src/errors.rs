use prida_image::ImageSize;

/// Errors that can occur during blind deconvolution.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DeconvError {
    /// Error related to image.
    #[error(transparent)]
    ImageError(#[from] prida_image::ImageError),

    /// The configuration cannot produce a valid run.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The kernel violates the point-spread function constraints.
    #[error("Invalid kernel: {0}")]
    InvalidKernel(String),

    /// The latent image does not have the working size of the observation.
    #[error("Latent image size mismatch: got {0}, expected {1}")]
    LatentSizeMismatch(ImageSize, ImageSize),
}
