use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};

use crate::config::PreprocessConfig;
use crate::error::ProcessError;

/// A decoded, normalized grayscale image held entirely in memory.
#[derive(Debug, Clone)]
pub struct ImageData {
    image: GrayImage,
}

impl ImageData {
    pub fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    /// Encodes the image as PNG, the format the OCR engine reads from memory.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ProcessError> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(self.image.clone())
            .write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| ProcessError::OcrProcessing(format!("Failed to encode image: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn preprocess(&self, path: &Path) -> Result<ImageData, ProcessError> {
        let bytes = std::fs::read(path).map_err(|e| ProcessError::ImageRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let decoded = image::load_from_memory(&bytes).map_err(|e| ProcessError::ImageRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(self.preprocess_image(decoded))
    }

    pub fn preprocess_image(&self, decoded: DynamicImage) -> ImageData {
        let decoded = downscale(decoded, self.config.max_dimension);
        let mut gray = decoded.to_luma8();

        if self.config.denoise {
            gray = median_filter_3x3(&gray);
        }

        if self.config.binarize {
            let threshold = otsu_threshold(&gray);
            binarize(&mut gray, threshold);
        }

        tracing::debug!(
            width = gray.width(),
            height = gray.height(),
            denoise = self.config.denoise,
            binarize = self.config.binarize,
            "Image preprocessed"
        );

        ImageData::from_gray(gray)
    }
}

fn downscale(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let largest = w.max(h);

    if max_dim == 0 || largest <= max_dim {
        return img;
    }

    let scale = max_dim as f32 / largest as f32;
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, max_dim);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, max_dim);

    img.resize_exact(new_w, new_h, FilterType::CatmullRom)
}

/// 3x3 median filter with edge pixels clamped to the border.
fn median_filter_3x3(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }

    GrayImage::from_fn(w, h, |x, y| {
        let mut window = [0u8; 9];
        let mut i = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                let ny = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                window[i] = img.get_pixel(nx, ny)[0];
                i += 1;
            }
        }
        window.sort_unstable();
        Luma([window[4]])
    })
}

/// Global threshold maximizing between-class variance of the histogram.
fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }

    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_variance = 0f64;
    let mut best_threshold = 0u8;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_sum - background_sum) / foreground_weight as f64;
        let diff = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = level as u8;
        }
    }

    best_threshold
}

/// Pixels above `threshold` become white, the rest black.
fn binarize(img: &mut GrayImage, threshold: u8) {
    for pixel in img.pixels_mut() {
        pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
    }
}
