//! Landmark persistence in NumPy's `.npy` format.
//!
//! Files are written as format version 1.0 holding a C-ordered
//! little-endian int64 array of shape `(68, 2)`, which `numpy.load`
//! reads directly.

use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::detection::domain::face_landmarks::{LandmarkSet, LANDMARK_COUNT};
use crate::video::domain::landmark_reader::LandmarkReader;
use crate::video::domain::landmark_writer::LandmarkWriter;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const DESCR: &str = "<i8";
const HEADER_ALIGN: usize = 64;

#[derive(Error, Debug)]
pub enum NpyError {
    #[error("not an npy file (bad magic)")]
    BadMagic,
    #[error("unsupported npy format version {0}.{1}")]
    Version(u8, u8),
    #[error("malformed npy header: {0}")]
    Header(String),
    #[error("unsupported dtype {0:?}, expected {DESCR:?}")]
    Dtype(String),
    #[error("unsupported shape {0:?}, expected ({LANDMARK_COUNT}, 2)")]
    Shape(Vec<usize>),
    #[error("fortran-ordered arrays are not supported")]
    FortranOrder,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads and writes landmark sets as `.npy` files.
pub struct NpyLandmarkStore;

impl NpyLandmarkStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NpyLandmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkWriter for NpyLandmarkStore {
    fn write(
        &self,
        path: &Path,
        landmarks: &LandmarkSet,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        encode(&mut file, landmarks)?;
        file.flush()?;
        Ok(())
    }
}

impl LandmarkReader for NpyLandmarkStore {
    fn read(&self, path: &Path) -> Result<LandmarkSet, Box<dyn std::error::Error>> {
        let mut file = std::io::BufReader::new(std::fs::File::open(path)?);
        Ok(decode(&mut file)?)
    }
}

fn header_text() -> String {
    let dict = format!(
        "{{'descr': '{DESCR}', 'fortran_order': False, 'shape': ({LANDMARK_COUNT}, 2), }}"
    );
    // Preamble is magic (6) + version (2) + header length (2); the whole
    // header block including the trailing newline is padded to 64 bytes.
    let preamble = MAGIC.len() + 2 + 2;
    let unpadded = preamble + dict.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    format!("{dict}{}\n", " ".repeat(padding))
}

pub(crate) fn encode<W: Write>(out: &mut W, landmarks: &LandmarkSet) -> Result<(), NpyError> {
    let header = header_text();
    out.write_all(MAGIC)?;
    out.write_all(&[1, 0])?;
    out.write_all(&(header.len() as u16).to_le_bytes())?;
    out.write_all(header.as_bytes())?;
    for &(x, y) in landmarks.points() {
        out.write_all(&(x as i64).to_le_bytes())?;
        out.write_all(&(y as i64).to_le_bytes())?;
    }
    Ok(())
}

pub(crate) fn decode<R: Read>(input: &mut R) -> Result<LandmarkSet, NpyError> {
    let mut magic = [0u8; 6];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(NpyError::BadMagic);
    }

    let mut version = [0u8; 2];
    input.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut len = [0u8; 2];
            input.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            input.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        _ => return Err(NpyError::Version(version[0], version[1])),
    };

    let mut header = vec![0u8; header_len];
    input.read_exact(&mut header)?;
    let header = String::from_utf8(header).map_err(|e| NpyError::Header(e.to_string()))?;

    let descr = dict_value(&header, "descr")?;
    let descr = descr.trim_matches(|c| c == '\'' || c == '"');
    if descr != DESCR {
        return Err(NpyError::Dtype(descr.to_string()));
    }
    if dict_value(&header, "fortran_order")? != "False" {
        return Err(NpyError::FortranOrder);
    }
    let shape = parse_shape(dict_value(&header, "shape")?)?;
    if shape != [LANDMARK_COUNT, 2] {
        return Err(NpyError::Shape(shape));
    }

    let mut points = Vec::with_capacity(LANDMARK_COUNT);
    let mut word = [0u8; 8];
    for _ in 0..LANDMARK_COUNT {
        input.read_exact(&mut word)?;
        let x = i64::from_le_bytes(word);
        input.read_exact(&mut word)?;
        let y = i64::from_le_bytes(word);
        points.push((to_i32(x)?, to_i32(y)?));
    }

    LandmarkSet::try_from(points).map_err(|e| NpyError::Header(e.to_string()))
}

fn to_i32(value: i64) -> Result<i32, NpyError> {
    i32::try_from(value).map_err(|_| NpyError::Header(format!("coordinate {value} out of range")))
}

/// Raw text of `key`'s value in the header dict literal, up to the next
/// top-level comma or closing brace.
fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let needle = format!("'{key}':");
    let start = header
        .find(&needle)
        .ok_or_else(|| NpyError::Header(format!("missing key {key:?}")))?
        + needle.len();
    let rest = header[start..].trim_start();

    let mut depth = 0;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&rest[..=i]);
                }
            }
            ',' | '}' if depth == 0 => return Ok(rest[..i].trim_end()),
            _ => {}
        }
    }
    Err(NpyError::Header(format!("unterminated value for {key:?}")))
}

fn parse_shape(text: &str) -> Result<Vec<usize>, NpyError> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| NpyError::Header(format!("bad shape {text:?}")))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| NpyError::Header(format!("bad shape {text:?}")))
        })
        .collect()
}
