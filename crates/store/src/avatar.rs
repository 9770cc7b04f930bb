// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Team avatar payload checks and file naming.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use rand::{Rng, distributions::Alphanumeric};

use crate::error::{Entity, ValidationError};

pub const MAX_AVATAR_BYTES: usize = 200_000;
pub const MIN_AVATAR_SIDE: u32 = 30;
pub const MAX_AVATAR_SIDE: u32 = 256;
pub const MIN_ASPECT_RATIO: f64 = 0.70;
pub const MAX_ASPECT_RATIO: f64 = 1.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::new(Entity::TeamAvatar, "avatar", reason)
}

fn png_reader(payload: &[u8]) -> ImageReader<Cursor<&[u8]>> {
    ImageReader::with_format(Cursor::new(payload), ImageFormat::Png)
}

/// Reads the image size from the PNG header chunks, checksums included.
pub fn png_dimensions(payload: &[u8]) -> Result<Dimensions, ValidationError> {
    let (width, height) = png_reader(payload)
        .into_dimensions()
        .map_err(|e| invalid(format!("must be a PNG image: {e}")))?;
    Ok(Dimensions { width, height })
}

pub fn check_avatar(payload: &[u8]) -> Result<Dimensions, ValidationError> {
    if payload.len() > MAX_AVATAR_BYTES {
        return Err(invalid(format!(
            "must be at most {MAX_AVATAR_BYTES} bytes"
        )));
    }

    let dimensions = png_dimensions(payload)?;
    let side = MIN_AVATAR_SIDE..=MAX_AVATAR_SIDE;
    if !side.contains(&dimensions.width) || !side.contains(&dimensions.height) {
        return Err(invalid(format!(
            "width and height must be between {MIN_AVATAR_SIDE} and {MAX_AVATAR_SIDE} pixels"
        )));
    }

    let ratio = f64::from(dimensions.width) / f64::from(dimensions.height);
    if !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio) {
        return Err(invalid(format!(
            "aspect ratio {ratio:.2} is out of range (w={}, h={})",
            dimensions.width, dimensions.height
        )));
    }

    // Decoding the pixel data catches truncated or corrupt image streams.
    png_reader(payload)
        .decode()
        .map_err(|e| invalid(format!("is not a readable PNG image: {e}")))?;

    Ok(dimensions)
}

/// A fresh, unguessable file name under which an avatar is served.
pub fn generate_avatar_path() -> String {
    let name: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("{name}.png")
}

#[cfg(test)]
pub(crate) fn encoded_png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 3) as u8, (y * 5) as u8, (x ^ y) as u8, 255])
    });
    let mut payload = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut payload), ImageFormat::Png)
        .expect("Failed to encode PNG");
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_square_png() {
        let dimensions = check_avatar(&encoded_png(64, 64)).expect("avatar should be valid");
        assert_eq!(
            dimensions,
            Dimensions {
                width: 64,
                height: 64
            }
        );
    }

    #[test]
    fn test_rejects_non_png() {
        assert!(check_avatar(b"GIF89a..........................").is_err());
        assert!(check_avatar(&[]).is_err());
    }

    #[test]
    fn test_rejects_truncated_png() {
        let payload = encoded_png(64, 64);
        // Signature and IHDR chunk only, no image data.
        assert!(check_avatar(&payload[..33]).is_err());
        assert!(check_avatar(&payload[..24]).is_err());
        assert!(check_avatar(&payload[..payload.len() / 2]).is_err());
    }

    #[test]
    fn test_rejects_corrupt_header() {
        let mut bad_crc = encoded_png(64, 64);
        bad_crc[29] ^= 0xff;
        assert!(check_avatar(&bad_crc).is_err());

        let mut bad_length = encoded_png(64, 64);
        bad_length[8..12].copy_from_slice(&999u32.to_be_bytes());
        assert!(check_avatar(&bad_length).is_err());
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(check_avatar(&encoded_png(20, 20)).is_err());
        assert!(check_avatar(&encoded_png(300, 300)).is_err());
        // 256 / 100 is far outside the allowed ratio
        assert!(check_avatar(&encoded_png(256, 100)).is_err());
        assert!(check_avatar(&encoded_png(100, 135)).is_ok());
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let mut payload = encoded_png(64, 64);
        payload.resize(MAX_AVATAR_BYTES + 1, 0);
        let err = check_avatar(&payload).unwrap_err();
        assert!(err.reason.contains("bytes"));
    }

    #[test]
    fn test_generated_paths_are_unique_pngs() {
        let a = generate_avatar_path();
        let b = generate_avatar_path();
        assert_eq!(a.len(), 36);
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }
}
