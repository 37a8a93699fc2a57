//! Magic-number check against the declared media type.

use std::io::{self, Read};

pub const HEADER_LEN: usize = 4;

/// Reads up to [`HEADER_LEN`] bytes, retrying short reads. Returns the
/// buffer and how many bytes were actually read.
pub fn read_header(source: &mut dyn Read) -> io::Result<([u8; HEADER_LEN], usize)> {
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        match source.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok((header, filled))
}

/// True when `header` is plausible for `media_type`. Only JPEG, GIF and
/// PNG are checked; any other media type passes.
pub fn header_matches(media_type: &str, header: &[u8; HEADER_LEN]) -> bool {
    match media_type {
        "image/jpeg" => header[..2] == [0xFF, 0xD8],
        "image/gif" => header == b"GIF8",
        "image/png" => header == b"\x89PNG",
        _ => true,
    }
}
