//! NumPy `.npy` files for per-split metric arrays.
//!
//! Only the layout the pipeline writes is supported:
//! ```text
//! [6-byte magic "\x93NUMPY"][major=1][minor=0]
//! [u16 header length (little-endian)]
//! [ASCII dict header, space padded, '\n' terminated]
//! [f64 values in little-endian]
//! ```
//! The preamble plus header is padded to a multiple of 64 bytes.

use crate::error::{Node2VecError, Result};
use std::fs;
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;
/// Magic, version and header-length field
const PREAMBLE_LEN: usize = MAGIC.len() + 2 + 2;

/// Encodes a 1-D `<f8` array.
#[must_use]
pub fn encode_f64(values: &[f64]) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );
    // dict + padding + '\n' fills the preamble up to the alignment
    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    let header_len = dict.len() + padding + 1;

    let mut bytes = Vec::with_capacity(PREAMBLE_LEN + header_len + values.len() * 8);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    // header_len < 128 for any realistic length, so the u16 field suffices
    bytes.extend_from_slice(&(header_len as u16).to_le_bytes());
    bytes.extend_from_slice(dict.as_bytes());
    bytes.extend(std::iter::repeat(b' ').take(padding));
    bytes.push(b'\n');
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decodes a 1-D `<f8` array written by [`encode_f64`] or NumPy.
///
/// # Errors
///
/// Returns an error for a bad magic string, an unsupported dtype or shape,
/// or a truncated payload.
pub fn decode_f64(bytes: &[u8]) -> Result<Vec<f64>> {
    let invalid = |msg: &str| Node2VecError::InvalidData(format!("npy: {msg}"));

    if bytes.len() < PREAMBLE_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(invalid("missing magic string"));
    }
    let (major, minor) = (bytes[6], bytes[7]);
    if major != 1 {
        return Err(invalid(&format!("unsupported format version {major}.{minor}")));
    }
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let data_start = PREAMBLE_LEN + header_len;
    let header = bytes
        .get(PREAMBLE_LEN..data_start)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or_else(|| invalid("truncated header"))?;

    if !header.contains("'descr': '<f8'") {
        return Err(invalid("dtype must be '<f8'"));
    }
    if !header.contains("'fortran_order': False") {
        return Err(invalid("fortran order is not supported"));
    }
    let len = parse_1d_shape(header).ok_or_else(|| invalid("shape must be 1-D"))?;

    let payload = &bytes[data_start..];
    if payload.len() != len * 8 {
        return Err(invalid(&format!(
            "expected {} data bytes, found {}",
            len * 8,
            payload.len()
        )));
    }
    Ok(payload
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect())
}

/// Extracts `N` from `'shape': (N,)`.
fn parse_1d_shape(header: &str) -> Option<usize> {
    let start = header.find("'shape': (")? + "'shape': (".len();
    let rest = &header[start..];
    let end = rest.find(')')?;
    let dims: Vec<&str> = rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    match dims.as_slice() {
        [n] => n.parse().ok(),
        _ => None,
    }
}

/// Writes `values` to `path` as a 1-D `<f8` array.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_npy<P: AsRef<Path>>(path: P, values: &[f64]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, encode_f64(values)).map_err(|e| Node2VecError::path_io(path, e))
}

/// Reads a 1-D `<f8` array from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a 1-D `<f8`
/// array.
pub fn read_npy<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Node2VecError::path_io(path, e))?;
    decode_f64(&bytes)
}
