use crate::error::{PatchError, Result};
use flate2::Compression as GzCompression;
use flate2::GzBuilder;
use flate2::read::MultiGzDecoder;
use std::io::{Read, Write};

const GZIP_MAGIC: &[u8] = b"\x1f\x8b";

// gzip header OS byte for "unknown", written instead of the host OS so the
// output does not depend on where it was produced.
const GZIP_OS_UNKNOWN: u8 = 255;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CompressFormat {
    Unknown,
    Gzip,
}

pub fn detect_format(data: &[u8]) -> CompressFormat {
    if data.starts_with(GZIP_MAGIC) {
        CompressFormat::Gzip
    } else {
        CompressFormat::Unknown
    }
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if detect_format(data) != CompressFormat::Gzip {
        return Err(PatchError::DecompressionFailure(format!(
            "unsupported ramdisk format, magic {:02x?}",
            &data[..data.len().min(4)]
        )));
    }
    let mut out = Vec::new();
    MultiGzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| PatchError::DecompressionFailure(e.to_string()))?;
    Ok(out)
}

/// gzip at the best level with a zero mtime, identical input always gives
/// identical output.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(GZIP_OS_UNKNOWN)
        .write(Vec::new(), GzCompression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
