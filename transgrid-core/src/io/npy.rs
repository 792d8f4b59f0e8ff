//! Distance matrix storage in the NumPy `.npy` format.
//!
//! Layout (version 1.0):
//! - 6 bytes magic `\x93NUMPY`, 2 bytes version `1 0`
//! - little-endian `u16` header length
//! - ASCII header dict `{'descr': '<f8', 'fortran_order': False, 'shape': (n, n), }`
//!   padded with spaces and a final newline so the data starts on a 64-byte
//!   boundary
//! - `n * n` little-endian `f64` values, row-major
//!
//! Unreachable targets are stored as IEEE positive infinity. Version 2.0
//! files (`u32` header length) are accepted on read.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use log::info;

use super::atomic::atomic_write;
use crate::{DistanceMatrix, Error, Minutes};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const DESCR: &str = "<f8";
const ALIGNMENT: usize = 64;
const VALUE_SIZE: usize = std::mem::size_of::<Minutes>();

fn header_bytes(size: usize) -> Vec<u8> {
    let dict = format!("{{'descr': '{DESCR}', 'fortran_order': False, 'shape': ({size}, {size}), }}");
    // magic + version + length field + dict + newline
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let header_len = dict.len() + padding + 1;

    let mut bytes = Vec::with_capacity(unpadded + padding);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    #[allow(clippy::cast_possible_truncation)] // a few dozen bytes
    bytes.extend_from_slice(&(header_len as u16).to_le_bytes());
    bytes.extend_from_slice(dict.as_bytes());
    bytes.resize(bytes.len() + padding, b' ');
    bytes.push(b'\n');
    bytes
}

/// Writes the matrix to `path`, replacing any existing file atomically
///
/// # Errors
///
/// Returns [`Error::IoError`] if the file cannot be written; the previous
/// content of `path`, if any, is kept in that case
pub fn write_matrix(path: &Path, matrix: &DistanceMatrix) -> Result<(), Error> {
    info!(
        "Writing {0}x{0} matrix to {1}",
        matrix.size(),
        path.display()
    );
    atomic_write(path, |writer| {
        writer.write_all(&header_bytes(matrix.size()))?;
        for value in matrix.as_slice() {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    })?;
    Ok(())
}

/// Reads only the header and returns the matrix dimension
///
/// # Errors
///
/// Returns [`Error::MatrixFormat`] if the file is not a square `f64` matrix
pub fn read_matrix_size(path: &Path) -> Result<usize, Error> {
    let mut reader = BufReader::new(File::open(path)?);
    Ok(read_header(&mut reader)?.size)
}

/// Loads a matrix written by [`write_matrix`] or by NumPy
///
/// # Errors
///
/// Returns [`Error::MatrixFormat`] if the header does not describe a square
/// little-endian `f64` matrix in C order, or the data length is wrong
pub fn read_matrix(path: &Path) -> Result<DistanceMatrix, Error> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader)?;
    let size = header.size;

    let byte_len = size
        .checked_mul(size)
        .and_then(|len| len.checked_mul(VALUE_SIZE))
        .ok_or_else(|| Error::MatrixFormat(format!("shape ({size}, {size}) is too large")))?;

    // the header must agree with the file before the data buffer is allocated
    let data_len = file_len.saturating_sub(header.data_offset as u64);
    match data_len.cmp(&(byte_len as u64)) {
        Ordering::Less => {
            return Err(Error::MatrixFormat(format!(
                "shape ({size}, {size}) needs {byte_len} data bytes, file has {data_len}"
            )));
        }
        Ordering::Greater => {
            return Err(Error::MatrixFormat(
                "trailing bytes after matrix data".to_string(),
            ));
        }
        Ordering::Equal => {}
    }

    let mut bytes = vec![0u8; byte_len];
    reader.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::MatrixFormat("file is shorter than its header claims".to_string())
        } else {
            Error::IoError(e)
        }
    })?;

    let data = bytes
        .chunks_exact(VALUE_SIZE)
        .map(|chunk| {
            let mut raw = [0u8; VALUE_SIZE];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();

    DistanceMatrix::from_vec(size, data)
}

/// Matrix dimension and the byte offset where the data starts
struct Header {
    size: usize,
    data_offset: usize,
}

fn read_header(reader: &mut impl Read) -> Result<Header, Error> {
    let mut preamble = [0u8; 8];
    reader.read_exact(&mut preamble)?;
    if &preamble[..6] != MAGIC {
        return Err(Error::MatrixFormat("missing .npy magic".to_string()));
    }

    let (header_len, len_field) = match preamble[6] {
        1 => {
            let mut raw = [0u8; 2];
            reader.read_exact(&mut raw)?;
            (usize::from(u16::from_le_bytes(raw)), raw.len())
        }
        2 | 3 => {
            let mut raw = [0u8; 4];
            reader.read_exact(&mut raw)?;
            let len = usize::try_from(u32::from_le_bytes(raw))
                .map_err(|_| Error::MatrixFormat("header too long".to_string()))?;
            (len, raw.len())
        }
        version => {
            return Err(Error::MatrixFormat(format!(
                "unsupported .npy version {version}"
            )));
        }
    };

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8(header)
        .map_err(|_| Error::MatrixFormat("header is not text".to_string()))?;

    Ok(Header {
        size: parse_header(&header)?,
        data_offset: preamble.len() + len_field + header_len,
    })
}

fn parse_header(header: &str) -> Result<usize, Error> {
    let compact: String = header.chars().filter(|c| !c.is_whitespace()).collect();

    if !compact.contains(&format!("'descr':'{DESCR}'")) {
        return Err(Error::MatrixFormat(format!(
            "expected little-endian f64 data, header is {header:?}"
        )));
    }
    if !compact.contains("'fortran_order':False") {
        return Err(Error::MatrixFormat(
            "Fortran-ordered data is not supported".to_string(),
        ));
    }

    let shape = compact
        .split_once("'shape':(")
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(shape, _)| shape)
        .ok_or_else(|| Error::MatrixFormat(format!("no shape in header {header:?}")))?;

    let dims = shape
        .split(',')
        .filter(|dim| !dim.is_empty())
        .map(str::parse::<usize>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Error::MatrixFormat(format!("bad shape ({shape})")))?;

    match dims.as_slice() {
        [rows, cols] if rows == cols => Ok(*rows),
        _ => Err(Error::MatrixFormat(format!(
            "expected a square matrix, got shape ({shape})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNREACHABLE;

    #[test]
    fn header_is_aligned_and_readable() {
        for size in [1, 4, 10_000, 123_456_789] {
            let header = header_bytes(size);
            assert_eq!(header.len() % ALIGNMENT, 0);
            assert_eq!(&header[..6], MAGIC);
            assert_eq!(header[6..8], [1, 0]);
            assert_eq!(*header.last().unwrap(), b'\n');

            let declared = usize::from(u16::from_le_bytes([header[8], header[9]]));
            assert_eq!(declared, header.len() - 10);
            let parsed = read_header(&mut header.as_slice()).unwrap();
            assert_eq!(parsed.size, size);
            assert_eq!(parsed.data_offset, header.len());
        }
    }

    #[test]
    fn header_text_matches_numpy() {
        let header = header_bytes(4);
        let text = std::str::from_utf8(&header[10..]).unwrap();
        assert!(text.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (4, 4), }"));
    }

    #[test]
    fn writes_values_row_major() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npy");
        let matrix = DistanceMatrix::from_vec(2, vec![0.0, 1.5, UNREACHABLE, 0.0]).unwrap();

        write_matrix(&path, &matrix).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // the header pads out to 128 bytes for any realistic size
        assert_eq!(bytes.len(), 128 + 4 * 8);
        assert_eq!(bytes[136..144], 1.5f64.to_le_bytes());
        assert_eq!(bytes[144..152], f64::INFINITY.to_le_bytes());

        let loaded = read_matrix(&path).unwrap();
        assert_eq!(loaded, matrix);
        assert_eq!(read_matrix_size(&path).unwrap(), 2);
    }

    #[test]
    fn rejects_other_shapes_and_types() {
        assert!(parse_header("{'descr': '<f8', 'fortran_order': False, 'shape': (3, 3), }").is_ok());
        assert!(matches!(
            parse_header("{'descr': '<f8', 'fortran_order': False, 'shape': (3, 4), }"),
            Err(Error::MatrixFormat(_))
        ));
        assert!(matches!(
            parse_header("{'descr': '<f8', 'fortran_order': False, 'shape': (9,), }"),
            Err(Error::MatrixFormat(_))
        ));
        assert!(matches!(
            parse_header("{'descr': '<f4', 'fortran_order': False, 'shape': (3, 3), }"),
            Err(Error::MatrixFormat(_))
        ));
        assert!(matches!(
            parse_header("{'descr': '<f8', 'fortran_order': True, 'shape': (3, 3), }"),
            Err(Error::MatrixFormat(_))
        ));
    }

    #[test]
    fn truncated_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npy");
        let mut bytes = header_bytes(3);
        bytes.extend_from_slice(&[0u8; 8 * 5]);
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(read_matrix(&path), Err(Error::MatrixFormat(_))));
    }

    #[test]
    fn oversized_shape_is_rejected_before_allocating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npy");
        std::fs::write(&path, header_bytes(1_000_000_000)).unwrap();

        match read_matrix(&path) {
            Err(Error::MatrixFormat(message)) => assert!(message.contains("1000000000")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn trailing_data_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npy");
        let mut bytes = header_bytes(1);
        bytes.extend_from_slice(&[0u8; 8 * 2]);
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(read_matrix(&path), Err(Error::MatrixFormat(_))));
    }

    #[test]
    fn garbage_is_not_a_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npy");
        std::fs::write(&path, b"definitely not numpy").unwrap();

        assert!(matches!(read_matrix(&path), Err(Error::MatrixFormat(_))));
    }
}
