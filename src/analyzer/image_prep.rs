//! 送信前の画像縮小
//!
//! 長辺が `max_size` を超える画像だけ縦横比を保って縮小し、PNGに再エンコードする。

use super::types::PreparedImage;
use crate::error::{Result, ScoreSheetError};
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

pub fn prepare_image(path: &Path, max_size: u32) -> Result<PreparedImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| ScoreSheetError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    prepare_image_bytes(&bytes, max_size)
}

pub fn prepare_image_bytes(bytes: &[u8], max_size: u32) -> Result<PreparedImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ScoreSheetError::ImageLoad(e.to_string()))?;
    let img = downscale(img, max_size);

    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ScoreSheetError::ImageLoad(format!("PNGエンコード失敗: {}", e)))?;

    Ok(PreparedImage {
        mime_type: "image/png".into(),
        data: base64::engine::general_purpose::STANDARD.encode(&buffer),
        width: img.width(),
        height: img.height(),
    })
}

/// 縦横どちらも `max_size` 以下になるよう縮小（拡大はしない）
fn downscale(img: DynamicImage, max_size: u32) -> DynamicImage {
    if img.width() <= max_size && img.height() <= max_size {
        return img;
    }
    img.thumbnail(max_size, max_size)
}
