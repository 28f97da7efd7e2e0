//! Perceptual image fingerprinting for duplicate detection.
//!
//! The fingerprint is a 64-bit difference hash (dHash): the image is reduced
//! to a 9x8 grayscale grid and each bit records whether a pixel is brighter
//! than its right neighbor. The hash is deterministic for a given image and
//! stable across re-encodes and other lossless transformations, while
//! visually distinct images produce very different bit patterns.
//!
//! Decoding can fail on corrupt or exotic inputs. Instead of erroring, the
//! fingerprint falls back to a SHA-256 digest of the raw bytes: a result is
//! always produced, and the [`FingerprintMethod`] tag tells the caller that
//! perceptual similarity detection was lost for that input.

use image::imageops::FilterType;
use sha2::{Digest, Sha256};
use tracing::warn;

/// How a fingerprint was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintMethod {
    /// 64-bit dHash; near-duplicates share most bits.
    Perceptual,
    /// SHA-256 of the raw bytes; only exact byte-level duplicates match.
    ContentDigest,
}

/// Similarity fingerprint of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFingerprint {
    /// Hex encoding: 16 chars for perceptual hashes, 64 for digests.
    pub hex: String,
    pub method: FingerprintMethod,
}

impl ImageFingerprint {
    /// True when decoding failed and only exact-byte duplicate detection
    /// remains for this image.
    pub fn is_degraded(&self) -> bool {
        self.method == FingerprintMethod::ContentDigest
    }
}

/// Computes the fingerprint of an image. Never fails: undecodable input
/// degrades to a content digest.
pub fn fingerprint_image(data: &[u8]) -> ImageFingerprint {
    match image::load_from_memory(data) {
        Ok(img) => ImageFingerprint {
            hex: format!("{:016x}", dhash64(&img)),
            method: FingerprintMethod::Perceptual,
        },
        Err(e) => {
            warn!("image decode failed, falling back to content digest: {e}");
            let mut hasher = Sha256::new();
            hasher.update(data);
            ImageFingerprint {
                hex: format!("{:x}", hasher.finalize()),
                method: FingerprintMethod::ContentDigest,
            }
        }
    }
}

fn dhash64(img: &image::DynamicImage) -> u64 {
    let small = img.resize_exact(9, 8, FilterType::Triangle).to_luma8();
    let mut bits: u64 = 0;
    for y in 0..8 {
        for x in 0..8 {
            bits <<= 1;
            if small.get_pixel(x, y)[0] > small.get_pixel(x + 1, y)[0] {
                bits |= 1;
            }
        }
    }
    bits
}

/// Bit distance between two perceptual fingerprints. `None` when either side
/// is not a 64-bit perceptual hash (degraded digests are not comparable).
pub fn hamming_distance(a: &str, b: &str) -> Option<u32> {
    if a.len() != 16 || b.len() != 16 {
        return None;
    }
    let a = u64::from_str_radix(a, 16).ok()?;
    let b = u64::from_str_radix(b, 16).ok()?;
    Some((a ^ b).count_ones())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn gradient_image() -> DynamicImage {
        let img = RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn checker_image() -> DynamicImage {
        let img = RgbImage::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let bytes = encode(&gradient_image(), ImageFormat::Png);
        let a = fingerprint_image(&bytes);
        let b = fingerprint_image(&bytes);
        assert_eq!(a, b);
        assert_eq!(a.method, FingerprintMethod::Perceptual);
        assert_eq!(a.hex.len(), 16);
    }

    #[test]
    fn lossless_reencode_keeps_fingerprint_close() {
        let img = gradient_image();
        let png = fingerprint_image(&encode(&img, ImageFormat::Png));
        let bmp = fingerprint_image(&encode(&img, ImageFormat::Bmp));
        let distance = hamming_distance(&png.hex, &bmp.hex).unwrap();
        assert!(distance <= 2, "re-encode drifted {distance} bits");
    }

    #[test]
    fn distinct_images_differ_widely() {
        let a = fingerprint_image(&encode(&gradient_image(), ImageFormat::Png));
        let b = fingerprint_image(&encode(&checker_image(), ImageFormat::Png));
        let distance = hamming_distance(&a.hex, &b.hex).unwrap();
        assert!(distance > 10, "distinct images only {distance} bits apart");
    }

    #[test]
    fn undecodable_input_degrades_to_digest() {
        let garbage = b"definitely not an image";
        let a = fingerprint_image(garbage);
        let b = fingerprint_image(garbage);
        assert_eq!(a, b);
        assert!(a.is_degraded());
        assert_eq!(a.hex.len(), 64);
        assert_eq!(hamming_distance(&a.hex, &b.hex), None);
    }
}
