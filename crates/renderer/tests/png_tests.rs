//! Tests for PNG encoding: format selection, chunk layout and metadata.

use renderer::png::{encode_indexed, encode_png, encode_rgba, read_text_chunks};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Chunk types in file order
fn chunk_types(png: &[u8]) -> Vec<String> {
    let mut types = Vec::new();
    let mut pos = SIGNATURE.len();
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
        types.push(String::from_utf8_lossy(&png[pos + 4..pos + 8]).to_string());
        pos += 12 + len;
    }
    types
}

fn color_type(png: &[u8]) -> u8 {
    // signature, length, "IHDR", width, height, bit depth
    png[8 + 4 + 4 + 8 + 1]
}

fn banded_pixels(width: usize, height: usize, colors: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for _ in 0..width {
            let level = (y * colors / height) as u8;
            pixels.extend_from_slice(&[level, 255 - level, 128, 255]);
        }
    }
    pixels
}

#[test]
fn test_few_colors_are_indexed() {
    let pixels = banded_pixels(40, 30, 10);
    let png = encode_png(&pixels, 40, 30, &[]).unwrap();
    assert_eq!(&png[..8], &SIGNATURE);
    assert_eq!(color_type(&png), 3);
    assert_eq!(chunk_types(&png), vec!["IHDR", "PLTE", "IDAT", "IEND"]);
}

#[test]
fn test_many_colors_fall_back_to_rgba() {
    let (width, height) = (100, 100);
    let pixels: Vec<u8> = (0..width * height)
        .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 7, 255])
        .collect();
    let png = encode_png(&pixels, width, height, &[]).unwrap();
    assert_eq!(color_type(&png), 6);
}

#[test]
fn test_large_image_uses_parallel_palette() {
    // above the parallel threshold but still under 256 colors
    let pixels = banded_pixels(128, 128, 200);
    let png = encode_png(&pixels, 128, 128, &[]).unwrap();
    assert_eq!(color_type(&png), 3);
}

#[test]
fn test_transparency_chunk() {
    let mut pixels = banded_pixels(8, 8, 2);
    pixels[3] = 0;
    let png = encode_png(&pixels, 8, 8, &[]).unwrap();
    assert!(chunk_types(&png).contains(&"tRNS".to_string()));
}

#[test]
fn test_text_chunks_round_trip() {
    let pixels = banded_pixels(4, 4, 2);
    let text = [("Title", "Geoid"), ("Units", "m")];
    let png = encode_rgba(&pixels, 4, 4, &text).unwrap();
    assert_eq!(
        read_text_chunks(&png),
        vec![("Title".to_string(), "Geoid".to_string()), ("Units".to_string(), "m".to_string())]
    );
    let types = chunk_types(&png);
    let text_pos = types.iter().position(|t| t == "tEXt").unwrap();
    let idat_pos = types.iter().position(|t| t == "IDAT").unwrap();
    assert!(text_pos < idat_pos);
}

#[test]
fn test_invalid_inputs() {
    assert!(encode_png(&[0u8; 12], 2, 2, &[]).is_err());
    assert!(encode_rgba(&[], 0, 0, &[]).is_err());
    assert!(encode_indexed(2, 2, &[], &[0; 4], &[]).is_err());
    assert!(encode_indexed(2, 2, &[[0, 0, 0, 255]], &[0; 3], &[]).is_err());
    let bad_key = "k".repeat(100);
    assert!(encode_rgba(&[0u8; 4], 1, 1, &[(bad_key.as_str(), "v")]).is_err());
}

#[test]
fn test_indexed_smaller_than_rgba() {
    let pixels = banded_pixels(256, 128, 16);
    let indexed = encode_png(&pixels, 256, 128, &[]).unwrap();
    let rgba = encode_rgba(&pixels, 256, 128, &[]).unwrap();
    assert!(indexed.len() <= rgba.len());
}
