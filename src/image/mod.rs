//! Camera frames and the cat-detection contract.
//!
//! Classification itself lives behind [`ImageService`]. The bundled
//! [`FakeImageService`] is a stand-in for development and the CLI.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Confidence (0-100) a frame must reach before it counts as showing a cat.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 50.0;

/// A grayscale camera frame.
#[derive(Debug, Clone)]
pub struct CameraImage {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    /// Row-major luminance values
    pub pixels: Vec<u8>,
}

impl CameraImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            width,
            height,
            pixels,
        }
    }

    /// Create a frame where every pixel has the same value.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        let len = width as usize * height as usize;
        Self::new(width, height, vec![value; len])
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Image classifier consumed by the security service.
pub trait ImageService {
    /// Whether `image` shows a cat with at least `confidence_threshold`
    /// percent confidence.
    fn contains_cat(
        &self,
        image: &CameraImage,
        confidence_threshold: f32,
    ) -> Result<bool, ImageError>;
}

/// Image classification errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageError {
    /// The frame has no pixel data
    Empty,
    /// The classifier backend failed
    Classifier(String),
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::Empty => write!(f, "Image contains no pixel data"),
            ImageError::Classifier(e) => write!(f, "Classifier error: {e}"),
        }
    }
}

impl std::error::Error for ImageError {}

/// Brightness-based stand-in classifier.
///
/// Mean luminance scaled to 0..=100 is reported as the cat confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeImageService;

impl FakeImageService {
    pub fn new() -> Self {
        Self
    }

    /// Confidence score for a frame.
    pub fn confidence(image: &CameraImage) -> Result<f32, ImageError> {
        if image.is_empty() {
            return Err(ImageError::Empty);
        }
        let sum: u64 = image.pixels.iter().map(|&p| p as u64).sum();
        let mean = sum as f64 / image.pixels.len() as f64;
        Ok((mean / 255.0 * 100.0) as f32)
    }
}

impl ImageService for FakeImageService {
    fn contains_cat(
        &self,
        image: &CameraImage,
        confidence_threshold: f32,
    ) -> Result<bool, ImageError> {
        let confidence = Self::confidence(image)?;
        tracing::trace!(image = %image.id, confidence, confidence_threshold, "image_classified");
        Ok(confidence >= confidence_threshold)
    }
}
