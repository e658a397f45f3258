//! Minimal NumPy `.npy` (format 1.0) framing for 1-D little-endian `float32` arrays.

use crate::error::{DistError, Result};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const PREAMBLE_V1: usize = MAGIC.len() + 2 + size_of::<u16>();
const HEADER_ALIGN: usize = 64;
const DESCR: &str = "'<f4'";

/// Encodes `values` as a 1-D `<f4` array.
pub fn encode(values: &[f32]) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': {DESCR}, 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );

    // Preamble + header + trailing newline must be a multiple of 64 bytes.
    let unpadded = PREAMBLE_V1 + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let mut buf = Vec::with_capacity(PREAMBLE_V1 + header.len() + size_of_val(values));
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&[1, 0]);
    buf.extend_from_slice(&(header.len() as u16).to_le_bytes());
    buf.extend_from_slice(header.as_bytes());

    let bits: Vec<u32> = values.iter().map(|v| v.to_bits().to_le()).collect();
    buf.extend_from_slice(bytemuck::cast_slice(&bits));
    buf
}

/// Decodes a 1-D `<f4` array.
///
/// # Errors
/// `DistError::Io` (invalid data) on a bad magic string, unsupported version,
/// dtype other than `<f4`, non 1-D shape or a payload of the wrong length.
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() < PREAMBLE_V1 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(DistError::invalid_data("not an npy array"));
    }

    let (header_len, offset) = match bytes[MAGIC.len()] {
        1 => {
            let len = u16::from_le_bytes([bytes[8], bytes[9]]);
            (len as usize, PREAMBLE_V1)
        }
        2 | 3 if bytes.len() >= PREAMBLE_V1 + 2 => {
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, PREAMBLE_V1 + 2)
        }
        major => {
            return Err(DistError::invalid_data(format!(
                "unsupported npy version {major}"
            )));
        }
    };

    let data_start = offset + header_len;
    let header = bytes
        .get(offset..data_start)
        .ok_or_else(|| DistError::invalid_data("truncated npy header"))?;
    let header = std::str::from_utf8(header)
        .map_err(|_| DistError::invalid_data("npy header is not text"))?;

    let descr = field(header, "descr").unwrap_or_default();
    if !descr.starts_with(DESCR) {
        return Err(DistError::invalid_data(format!(
            "expected a little-endian float32 array, header is {}",
            header.trim_end()
        )));
    }

    let len = parse_1d_shape(header)?;
    let needed = len
        .checked_mul(size_of::<f32>())
        .ok_or_else(|| DistError::invalid_data(format!("npy shape ({len},) is too large")))?;

    let data = &bytes[data_start..];
    if data.len() != needed {
        return Err(DistError::invalid_data(format!(
            "npy payload holds {} bytes, shape needs {needed}",
            data.len()
        )));
    }

    let bits: Vec<u32> = bytemuck::pod_collect_to_vec(data);
    Ok(bits
        .into_iter()
        .map(|b| f32::from_bits(u32::from_le(b)))
        .collect())
}

/// Returns the text following `'key':` in a header dict.
fn field<'h>(header: &'h str, key: &str) -> Option<&'h str> {
    let tag = format!("'{key}':");
    let at = header.find(&tag)?;
    Some(header[at + tag.len()..].trim_start())
}

fn parse_1d_shape(header: &str) -> Result<usize> {
    let shape = field(header, "shape")
        .and_then(|s| s.strip_prefix('('))
        .and_then(|s| s.split_once(')'))
        .map(|(dims, _)| dims)
        .ok_or_else(|| DistError::invalid_data("npy header has no shape"))?;

    let dims = shape
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse::<usize>()
                .map_err(|_| DistError::invalid_data(format!("bad npy dimension '{d}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    match dims.as_slice() {
        [len] => Ok(*len),
        _ => Err(DistError::invalid_data(format!(
            "expected a 1-D array, got shape ({shape})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_aligned_and_readable_by_numpy() {
        let bytes = encode(&[1.0, -2.5, 3.25]);
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;

        assert_eq!((PREAMBLE_V1 + header_len) % HEADER_ALIGN, 0);
        assert_eq!(bytes[PREAMBLE_V1 + header_len - 1], b'\n');

        let header = std::str::from_utf8(&bytes[PREAMBLE_V1..PREAMBLE_V1 + header_len]).unwrap();
        assert!(header.starts_with("{'descr': '<f4', 'fortran_order': False, 'shape': (3,), }"));
        assert_eq!(bytes.len(), PREAMBLE_V1 + header_len + 12);
    }

    #[test]
    fn decodes_what_it_encodes() {
        let values = [0.0, f32::MIN_POSITIVE, 1e30, -7.5];
        assert_eq!(decode(&encode(&values)).unwrap(), values);
        assert!(decode(&encode(&[])).unwrap().is_empty());
    }

    #[test]
    fn rejects_float64_arrays() {
        let mut bytes = encode(&[1.0]);
        let at = bytes.windows(4).position(|w| w == b"<f4'").unwrap();
        bytes[at + 2] = b'8';

        assert!(matches!(decode(&bytes), Err(DistError::Io(_))));
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = encode(&[1.0, 2.0]);
        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(err.to_string().contains("payload"));
    }

    #[test]
    fn rejects_matrices() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (2, 2), }";
        assert!(parse_1d_shape(header).is_err());
        assert_eq!(
            parse_1d_shape("{'descr': '<f4', 'shape': (7,), }").unwrap(),
            7
        );
    }

    fn with_header(header: &str, payload: &[u8]) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn oversized_shape_is_invalid_data() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (4611686018427387905,), }\n";
        let err = decode(&with_header(header, &[0; 8])).unwrap_err();

        assert!(matches!(err, DistError::Io(ref e) if e.kind() == std::io::ErrorKind::InvalidData));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode(b"PK\x03\x04 not npy at all").is_err());
        assert!(decode(b"").is_err());
    }
}
