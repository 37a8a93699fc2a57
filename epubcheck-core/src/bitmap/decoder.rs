//! Metadata-only image decoders.
//!
//! Each decoder reads just enough of a file to learn its pixel dimensions
//! and stops. Decoders are stateless statics looked up by file suffix.

use std::io::{self, Read};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed {format} data: {reason}")]
    Malformed {
        format: &'static str,
        reason: &'static str,
    },
}

/// Stream-level metadata some formats carry besides the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMetadata {
    /// GIF logical screen; the canvas every frame is drawn on.
    LogicalScreen { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Dimensions of the first image.
    pub width: u32,
    pub height: u32,
    pub stream: Option<StreamMetadata>,
}

impl ImageMetadata {
    /// Dimensions used for heuristics: the stream's canvas when the format
    /// has one, the first image otherwise.
    pub fn effective_dimensions(&self) -> (u32, u32) {
        match self.stream {
            Some(StreamMetadata::LogicalScreen { width, height }) => (width, height),
            None => (self.width, self.height),
        }
    }
}

pub trait ImageDecoder: Send + Sync {
    fn format_name(&self) -> &'static str;

    /// Lower-case file suffixes this decoder handles.
    fn suffixes(&self) -> &'static [&'static str];

    fn read_metadata(&self, source: &mut dyn Read) -> Result<ImageMetadata, DecodeError>;
}

static DECODERS: [&dyn ImageDecoder; 4] = [&PngDecoder, &JpegDecoder, &GifDecoder, &BmpDecoder];

/// Finds the decoder for a suffix, ignoring case.
pub fn decoder_for_suffix(suffix: &str) -> Option<&'static dyn ImageDecoder> {
    let suffix = suffix.to_ascii_lowercase();
    DECODERS
        .iter()
        .copied()
        .find(|d| d.suffixes().iter().any(|s| *s == suffix))
}

fn read_array<const N: usize>(source: &mut dyn Read) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    source.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u8(source: &mut dyn Read) -> io::Result<u8> {
    Ok(read_array::<1>(source)?[0])
}

fn skip(source: &mut dyn Read, len: u64) -> io::Result<()> {
    let copied = io::copy(&mut source.take(len), &mut io::sink())?;
    if copied < len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

struct PngDecoder;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

impl ImageDecoder for PngDecoder {
    fn format_name(&self) -> &'static str {
        "png"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &["png"]
    }

    fn read_metadata(&self, source: &mut dyn Read) -> Result<ImageMetadata, DecodeError> {
        let malformed = |reason| DecodeError::Malformed {
            format: "png",
            reason,
        };
        if read_array::<8>(source)? != PNG_SIGNATURE {
            return Err(malformed("bad signature"));
        }
        // IHDR must be the first chunk: length, type, width, height.
        let chunk = read_array::<16>(source)?;
        if &chunk[4..8] != b"IHDR" {
            return Err(malformed("first chunk is not IHDR"));
        }
        let width = u32::from_be_bytes([chunk[8], chunk[9], chunk[10], chunk[11]]);
        let height = u32::from_be_bytes([chunk[12], chunk[13], chunk[14], chunk[15]]);
        if width == 0 || height == 0 {
            return Err(malformed("zero dimension"));
        }
        Ok(ImageMetadata {
            width,
            height,
            stream: None,
        })
    }
}

struct GifDecoder;

impl ImageDecoder for GifDecoder {
    fn format_name(&self) -> &'static str {
        "gif"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &["gif"]
    }

    fn read_metadata(&self, source: &mut dyn Read) -> Result<ImageMetadata, DecodeError> {
        let malformed = |reason| DecodeError::Malformed {
            format: "gif",
            reason,
        };
        let signature = read_array::<6>(source)?;
        if &signature != b"GIF87a" && &signature != b"GIF89a" {
            return Err(malformed("bad signature"));
        }
        let screen = read_array::<7>(source)?;
        let screen_width = u16::from_le_bytes([screen[0], screen[1]]) as u32;
        let screen_height = u16::from_le_bytes([screen[2], screen[3]]) as u32;
        let packed = screen[4];
        if packed & 0x80 != 0 {
            skip(source, 3 * (1u64 << ((packed & 0x07) + 1)))?;
        }

        let (width, height) = loop {
            match read_u8(source)? {
                // Extension: label, then data sub-blocks up to a zero length.
                0x21 => {
                    read_u8(source)?;
                    loop {
                        let len = read_u8(source)?;
                        if len == 0 {
                            break;
                        }
                        skip(source, u64::from(len))?;
                    }
                }
                0x2C => {
                    let descriptor = read_array::<9>(source)?;
                    break (
                        u16::from_le_bytes([descriptor[4], descriptor[5]]) as u32,
                        u16::from_le_bytes([descriptor[6], descriptor[7]]) as u32,
                    );
                }
                0x3B => return Err(malformed("no image in stream")),
                _ => return Err(malformed("unknown block")),
            }
        };

        Ok(ImageMetadata {
            width,
            height,
            stream: Some(StreamMetadata::LogicalScreen {
                width: screen_width,
                height: screen_height,
            }),
        })
    }
}

struct JpegDecoder;

impl ImageDecoder for JpegDecoder {
    fn format_name(&self) -> &'static str {
        "jpeg"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &["jpg", "jpeg", "jpe", "jfif"]
    }

    fn read_metadata(&self, source: &mut dyn Read) -> Result<ImageMetadata, DecodeError> {
        let malformed = |reason| DecodeError::Malformed {
            format: "jpeg",
            reason,
        };
        if read_array::<2>(source)? != [0xFF, 0xD8] {
            return Err(malformed("missing SOI marker"));
        }
        loop {
            if read_u8(source)? != 0xFF {
                return Err(malformed("expected marker"));
            }
            let mut marker = read_u8(source)?;
            while marker == 0xFF {
                marker = read_u8(source)?;
            }
            match marker {
                // Standalone markers carry no length.
                0x01 | 0xD0..=0xD7 => continue,
                0xD9 | 0xDA => return Err(malformed("no frame header before scan")),
                _ => {}
            }
            let len = u16::from_be_bytes(read_array::<2>(source)?);
            if len < 2 {
                return Err(malformed("segment length"));
            }
            let is_frame_header =
                matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
            if is_frame_header {
                let frame = read_array::<5>(source)?;
                let height = u16::from_be_bytes([frame[1], frame[2]]) as u32;
                let width = u16::from_be_bytes([frame[3], frame[4]]) as u32;
                return Ok(ImageMetadata {
                    width,
                    height,
                    stream: None,
                });
            }
            skip(source, u64::from(len - 2))?;
        }
    }
}

struct BmpDecoder;

impl ImageDecoder for BmpDecoder {
    fn format_name(&self) -> &'static str {
        "bmp"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &["bmp", "dib"]
    }

    fn read_metadata(&self, source: &mut dyn Read) -> Result<ImageMetadata, DecodeError> {
        let malformed = |reason| DecodeError::Malformed {
            format: "bmp",
            reason,
        };
        let head = read_array::<18>(source)?;
        if &head[..2] != b"BM" {
            return Err(malformed("bad signature"));
        }
        let dib_len = u32::from_le_bytes([head[14], head[15], head[16], head[17]]);
        let (width, height) = if dib_len == 12 {
            let core = read_array::<4>(source)?;
            (
                u16::from_le_bytes([core[0], core[1]]) as u32,
                u16::from_le_bytes([core[2], core[3]]) as u32,
            )
        } else if dib_len >= 40 {
            let info = read_array::<8>(source)?;
            let width = i32::from_le_bytes([info[0], info[1], info[2], info[3]]);
            // Negative height means a top-down bitmap.
            let height = i32::from_le_bytes([info[4], info[5], info[6], info[7]]);
            (width.unsigned_abs(), height.unsigned_abs())
        } else {
            return Err(malformed("unsupported header"));
        };
        Ok(ImageMetadata {
            width,
            height,
            stream: None,
        })
    }
}
