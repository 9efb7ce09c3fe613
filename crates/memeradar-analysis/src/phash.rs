//! 64-bit DCT perceptual hash for meme template matching.
//!
//! The image is reduced to a 32x32 grayscale grid, transformed with a 2D
//! DCT-II, and the top-left 8x8 block of coefficients is thresholded at its
//! median. Bits are packed row-major, most significant first, and rendered
//! as 16 lowercase hex digits.

use std::f64::consts::PI;
use std::time::Duration;

use image::imageops::FilterType;
use image::ImageError;
use reqwest::{Client, Url};

use crate::error::{AnalysisError, ImageHashError};

const SAMPLE_SIZE: usize = 32;
const HASH_SIZE: usize = 8;

#[derive(Debug, Clone)]
pub struct ImageHasher {
    client: Client,
}

impl ImageHasher {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(concat!("memeradar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` and hash the image it serves.
    ///
    /// # Errors
    ///
    /// [`ImageHashError::Unhashable`] for URLs that can never be fetched and
    /// content no decoder supports. [`ImageHashError::Unavailable`] for
    /// network failures, non-success statuses, and corrupt payloads.
    pub async fn hash_url(&self, url: &str) -> Result<String, ImageHashError> {
        let parsed =
            Url::parse(url).map_err(|e| ImageHashError::Unhashable(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ImageHashError::Unhashable(format!(
                "{url}: unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ImageHashError::Unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageHashError::Unavailable(format!("{url}: HTTP {status}")));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| ImageHashError::Unavailable(e.to_string()))?;

        hash_bytes(&body)
    }
}

/// Hash an encoded image held in memory.
///
/// # Errors
///
/// [`ImageHashError::Unhashable`] when the format is not recognized,
/// [`ImageHashError::Unavailable`] when the payload is corrupt.
pub fn hash_bytes(bytes: &[u8]) -> Result<String, ImageHashError> {
    let image = image::load_from_memory(bytes).map_err(|e| match e {
        ImageError::Unsupported(_) => ImageHashError::Unhashable(e.to_string()),
        other => ImageHashError::Unavailable(other.to_string()),
    })?;

    #[allow(clippy::cast_possible_truncation)]
    let side = SAMPLE_SIZE as u32;
    let gray = image
        .grayscale()
        .resize_exact(side, side, FilterType::Lanczos3)
        .to_luma8();

    let mut pixels = [[0.0_f64; SAMPLE_SIZE]; SAMPLE_SIZE];
    for (x, y, pixel) in gray.enumerate_pixels() {
        pixels[y as usize][x as usize] = f64::from(pixel.0[0]);
    }

    Ok(format!("{:016x}", hash_grid(&pixels)))
}

/// Low-frequency DCT coefficients thresholded at their median.
fn hash_grid(pixels: &[[f64; SAMPLE_SIZE]; SAMPLE_SIZE]) -> u64 {
    let mut cosines = [[0.0_f64; SAMPLE_SIZE]; HASH_SIZE];
    for (k, row) in cosines.iter_mut().enumerate() {
        for (n, value) in row.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let angle = PI * k as f64 * (2 * n + 1) as f64 / (2 * SAMPLE_SIZE) as f64;
            *value = angle.cos();
        }
    }

    // Transform along rows first, keeping only the low frequencies.
    let mut rows = [[0.0_f64; HASH_SIZE]; SAMPLE_SIZE];
    for (y, line) in pixels.iter().enumerate() {
        for u in 0..HASH_SIZE {
            rows[y][u] = line.iter().zip(&cosines[u]).map(|(p, c)| p * c).sum();
        }
    }

    let mut coefficients = [0.0_f64; HASH_SIZE * HASH_SIZE];
    for v in 0..HASH_SIZE {
        for u in 0..HASH_SIZE {
            coefficients[v * HASH_SIZE + u] = rows
                .iter()
                .zip(&cosines[v])
                .map(|(row, c)| row[u] * c)
                .sum();
        }
    }

    let mut sorted = coefficients;
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = (sorted[mid - 1] + sorted[mid]) / 2.0;

    coefficients
        .iter()
        .fold(0_u64, |hash, c| (hash << 1) | u64::from(*c > median))
}

/// Number of differing bits, or `None` if either hash is not 16 hex digits.
#[must_use]
pub fn hamming_distance(a: &str, b: &str) -> Option<u32> {
    let parse = |h: &str| {
        if h.len() == 16 {
            u64::from_str_radix(h, 16).ok()
        } else {
            None
        }
    };
    Some((parse(a)? ^ parse(b)?).count_ones())
}

/// Whether two hashes belong to the same template. Malformed hashes never match.
#[must_use]
pub fn are_similar(a: &str, b: &str, threshold: u32) -> bool {
    hamming_distance(a, b).is_some_and(|d| d <= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn pattern(x: u32, y: u32, size: u32) -> u8 {
        let fx = f64::from(x) / f64::from(size);
        let fy = f64::from(y) / f64::from(size);
        let value = 128.0 + 50.0 * (fx * 2.0 * PI).sin() + 30.0 * (fy * 3.0 * PI).cos();
        value.round() as u8
    }

    fn png(size: u32, invert: bool) -> Vec<u8> {
        let img = GrayImage::from_fn(size, size, |x, y| {
            let v = pattern(x, y, size);
            Luma([if invert { 255 - v } else { v }])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn hash_is_sixteen_hex_digits_and_stable() {
        let bytes = png(64, false);
        let first = hash_bytes(&bytes).unwrap();
        assert_eq!(first.len(), 16);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash_bytes(&bytes).unwrap(), first);
    }

    #[test]
    fn inverted_image_is_a_different_template() {
        let original = hash_bytes(&png(64, false)).unwrap();
        let inverted = hash_bytes(&png(64, true)).unwrap();
        assert!(hamming_distance(&original, &inverted).unwrap() > 32);
        assert!(!are_similar(&original, &inverted, 10));
    }

    #[test]
    fn unknown_format_is_unhashable() {
        let err = hash_bytes(b"definitely not an image").unwrap_err();
        assert!(err.is_permanent(), "got {err:?}");
    }

    #[test]
    fn hamming_distance_counts_bits() {
        assert_eq!(hamming_distance("ffffffffffffffff", "0000000000000000"), Some(64));
        assert_eq!(hamming_distance("00000000000000ff", "000000000000000f"), Some(4));
        assert_eq!(hamming_distance("abc", "0000000000000000"), None);
        assert!(are_similar("00000000000000ff", "000000000000000f", 10));
        assert!(!are_similar("zzzzzzzzzzzzzzzz", "zzzzzzzzzzzzzzzz", 10));
    }

    #[tokio::test]
    async fn hash_url_matches_in_memory_hash() {
        let server = MockServer::start().await;
        let bytes = png(48, false);
        Mock::given(method("GET"))
            .and(path("/meme.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(bytes.clone()),
            )
            .mount(&server)
            .await;

        let hasher = ImageHasher::new(5).unwrap();
        let hash = hasher
            .hash_url(&format!("{}/meme.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(hash, hash_bytes(&bytes).unwrap());
    }

    #[tokio::test]
    async fn missing_image_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let hasher = ImageHasher::new(5).unwrap();
        let err = hasher
            .hash_url(&format!("{}/gone.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageHashError::Unavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_url_is_permanent() {
        let hasher = ImageHasher::new(5).unwrap();
        let err = hasher.hash_url("not a url").await.unwrap_err();
        assert!(err.is_permanent());
        let err = hasher.hash_url("ftp://example.test/a.png").await.unwrap_err();
        assert!(err.is_permanent());
    }
}
