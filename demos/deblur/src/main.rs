use argh::FromArgs;
use std::path::{Path, PathBuf};

use prida_deconv::{blind_deconvolve, kernel::Kernel, BlindDeconvConfig};
use prida_image::{
    ops::{broadcast_channels, cast_and_scale, is_gray},
    Image, ImageSize,
};

#[derive(FromArgs)]
/// Recover the sharp image and the blur kernel of a blurred image
struct Args {
    /// path to the blurred image
    #[argh(positional)]
    image_path: PathBuf,

    /// total-variation weight at the finest scale
    #[argh(positional)]
    lambda: f64,

    /// side of the square blur kernel, must be odd
    #[argh(positional)]
    kernel_size: usize,

    /// number of iterations per scale
    #[argh(option, default = "1000")]
    iterations: usize,
}

fn to_unit_range<const C: usize>(
    image: &Image<u8, C>,
) -> Result<Image<f64, C>, Box<dyn std::error::Error>> {
    let mut normalized = Image::from_size_val(image.size(), 0.0)?;
    cast_and_scale(image, &mut normalized, 1.0 / 255.0)?;
    Ok(normalized)
}

fn quantize<const C: usize>(image: &Image<f64, C>) -> Image<u8, C> {
    image.map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
}

fn save_rgb(image: Image<u8, 3>, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (width, height) = (image.width() as u32, image.height() as u32);
    let buffer = image::RgbImage::from_raw(width, height, image.into_vec())
        .ok_or("image buffer does not match its size")?;
    buffer.save(path)?;
    Ok(())
}

fn save_kernel(kernel: &Kernel, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let weights = kernel.as_image();
    let peak = weights
        .as_slice()
        .iter()
        .copied()
        .fold(0.0f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let scaled = quantize(&weights.map(|w| w / peak));

    let buffer =
        image::GrayImage::from_raw(kernel.cols() as u32, kernel.rows() as u32, scaled.into_vec())
            .ok_or("kernel buffer does not match its size")?;
    buffer.save(path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    let config = BlindDeconvConfig::new(ImageSize::square(args.kernel_size), args.lambda)
        .with_iterations(args.iterations);
    config.validate()?;

    let decoded = image::open(&args.image_path)?.to_rgb8();
    let size = ImageSize {
        width: decoded.width() as usize,
        height: decoded.height() as usize,
    };
    let rgb = Image::<u8, 3>::new(size, decoded.into_raw())?;

    log::info!(
        "deblurring {} ({}x{}) with lambda = {} and kernel size {}",
        args.image_path.display(),
        size.width,
        size.height,
        args.lambda,
        args.kernel_size
    );

    let (recovered, kernel) = if is_gray(&rgb) {
        log::info!("processing a single channel image");
        let gray = to_unit_range(&rgb.channel(0)?)?;
        let result = blind_deconvolve(&gray, &config)?;
        (broadcast_channels::<u8, 3>(&quantize(&result.image))?, result.kernel)
    } else {
        let color = to_unit_range(&rgb)?;
        let result = blind_deconvolve(&color, &config)?;
        (quantize(&result.image), result.kernel)
    };

    let stem = args.image_path.with_extension("");
    let image_path = PathBuf::from(format!("{}recov.png", stem.display()));
    let kernel_path = PathBuf::from(format!("{}recovkernel.png", stem.display()));

    save_rgb(recovered, &image_path)?;
    save_kernel(&kernel, &kernel_path)?;

    log::info!(
        "saved {} and {}",
        image_path.display(),
        kernel_path.display()
    );

    Ok(())
}
