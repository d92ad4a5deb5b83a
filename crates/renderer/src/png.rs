//! PNG encoding for RGBA map images.
//!
//! Maps drawn with a colormap look-up table rarely exceed 256 distinct
//! colors, so [`encode_png`] first tries an indexed image (color type 3) and
//! falls back to RGBA (color type 6). Metadata such as the title and units
//! is written as `tEXt` chunks before the image data.

use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;

use crate::error::{RenderError, RenderResult};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

/// Longest keyword allowed in a `tEXt` chunk.
const MAX_KEYWORD_LEN: usize = 79;

type Palette = Vec<[u8; 4]>;

/// Encode RGBA pixels, choosing indexed or truecolor, with `tEXt` metadata.
pub fn encode_png(pixels: &[u8], width: usize, height: usize, text: &[(&str, &str)]) -> RenderResult<Vec<u8>> {
    check_dimensions(pixels, width, height)?;
    let palette = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };
    match palette {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices, text),
        None => encode_rgba(pixels, width, height, text),
    }
}

/// Encode RGBA pixels as a truecolor-with-alpha image.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize, text: &[(&str, &str)]) -> RenderResult<Vec<u8>> {
    check_dimensions(pixels, width, height)?;
    let mut png = Vec::with_capacity(pixels.len() / 2);
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    write_text_chunks(&mut png, text)?;
    let idat = deflate_scanlines(pixels, width * 4, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode palette indices (one byte per pixel) as an indexed image.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
    text: &[(&str, &str)],
) -> RenderResult<Vec<u8>> {
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(RenderError::Encode(format!("palette size {} out of range", palette.len())));
    }
    if indices.len() != width * height {
        return Err(RenderError::Encode(format!(
            "expected {} indices, got {}",
            width * height,
            indices.len()
        )));
    }

    let mut png = Vec::with_capacity(indices.len() / 2);
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);
    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_text_chunks(&mut png, text)?;
    let idat = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Read back the `tEXt` chunks of an encoded PNG.
pub fn read_text_chunks(png: &[u8]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut pos = SIGNATURE.len();
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
        let kind = &png[pos + 4..pos + 8];
        let data_end = pos + 8 + len;
        if data_end + 4 > png.len() {
            break;
        }
        if kind == b"tEXt" {
            let data = &png[pos + 8..data_end];
            if let Some(sep) = data.iter().position(|&b| b == 0) {
                let key: String = data[..sep].iter().map(|&b| b as char).collect();
                let value: String = data[sep + 1..].iter().map(|&b| b as char).collect();
                out.push((key, value));
            }
        }
        pos = data_end + 4;
    }
    out
}

fn check_dimensions(pixels: &[u8], width: usize, height: usize) -> RenderResult<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::Encode(format!("empty image {}x{}", width, height)));
    }
    if pixels.len() != width * height * 4 {
        return Err(RenderError::Encode(format!(
            "expected {} RGBA bytes, got {}",
            width * height * 4,
            pixels.len()
        )));
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.extend_from_slice(&[0, 0, 0]); // compression, filter, interlace
    data
}

/// `tEXt` payload: Latin-1 keyword, NUL, Latin-1 text.
fn write_text_chunks(png: &mut Vec<u8>, text: &[(&str, &str)]) -> RenderResult<()> {
    for (key, value) in text {
        if key.is_empty() || key.len() > MAX_KEYWORD_LEN {
            return Err(RenderError::Encode(format!("invalid tEXt keyword '{}'", key)));
        }
        let mut data = Vec::with_capacity(key.len() + value.len() + 1);
        data.extend(key.chars().map(latin1));
        data.push(0);
        data.extend(value.chars().map(latin1));
        write_chunk(png, b"tEXt", &data);
    }
    Ok(())
}

fn latin1(c: char) -> u8 {
    if (c as u32) < 256 && c != '\0' {
        c as u8
    } else {
        b'?'
    }
}

/// Write a PNG chunk: length, type, data, CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each row with filter byte 0 and zlib-compress.
fn deflate_scanlines(bytes: &[u8], row_len: usize, height: usize) -> RenderResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (row_len + 1));
    for row in bytes.chunks_exact(row_len).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))
}

#[inline(always)]
fn pack_color(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

fn extract_palette_sequential(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);
    for px in pixels.chunks_exact(4) {
        let packed = pack_color(px);
        let index = match lookup.get(&packed) {
            Some(&i) => i,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push([px[0], px[1], px[2], px[3]]);
                lookup.insert(packed, i);
                i
            }
        };
        indices.push(index);
    }
    Some((palette, indices))
}

/// Collect unique colors per chunk in parallel, merge, then map pixels in parallel.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);
    let chunk_bytes = chunk_pixels * 4;

    let unique: Vec<u32> = pixels
        .par_chunks(chunk_bytes)
        .flat_map_iter(|chunk| {
            let mut local: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                local.insert(pack_color(px), ());
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_keys()
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in unique {
        if lookup.contains_key(&packed) {
            continue;
        }
        if palette.len() >= MAX_PALETTE_SIZE {
            return None;
        }
        lookup.insert(packed, palette.len() as u8);
        palette.push(packed.to_le_bytes());
    }

    let mut indices = vec![0u8; pixels.len() / 4];
    indices
        .par_chunks_mut(chunk_pixels)
        .zip(pixels.par_chunks(chunk_bytes))
        .for_each(|(out, chunk)| {
            for (idx, px) in out.iter_mut().zip(chunk.chunks_exact(4)) {
                *idx = lookup.get(&pack_color(px)).copied().unwrap_or(0);
            }
        });
    Some((palette, indices))
}
