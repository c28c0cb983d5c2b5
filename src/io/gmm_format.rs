//! Native .dgmm binary format for mixture persistence.
//!
//! Format:
//! - Header (16 bytes):
//!   - Magic: "DGMM" (4 bytes)
//!   - Version: u16 (2 bytes, little-endian)
//!   - Reserved: 2 bytes
//!   - Components: u32 (4 bytes, little-endian)
//!   - Dimension: u32 (4 bytes, little-endian)
//! - Weights: components f32 values (little-endian)
//! - Means: components * dimension f32 values (little-endian)
//! - Variances: components * dimension f32 values (little-endian)

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::{DiagonalGmm, GmmError};

/// Magic bytes for .dgmm format
const MAGIC: &[u8; 4] = b"DGMM";

/// Current format version
const VERSION: u16 = 1;

/// Header size in bytes
const HEADER_SIZE: usize = 16;

/// Errors from reading or writing .dgmm files.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a .dgmm file.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The file uses an unsupported format version.
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build writes and reads.
        expected: u16,
        /// Version found in the file.
        found: u16,
    },

    /// The decoded parameters do not form a valid mixture.
    #[error(transparent)]
    Model(#[from] GmmError),
}

/// Result alias for format operations.
pub type Result<T> = std::result::Result<T, FormatError>;

/// Save a mixture to a .dgmm file.
pub fn save_gmm(gmm: &DiagonalGmm, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_gmm(gmm, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mixture to a writer in .dgmm format.
pub fn write_gmm<W: Write>(gmm: &DiagonalGmm, writer: &mut W) -> Result<()> {
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(MAGIC);
    header[4..6].copy_from_slice(&VERSION.to_le_bytes());
    // Reserved bytes stay zero.
    header[8..12].copy_from_slice(&(gmm.num_components() as u32).to_le_bytes());
    header[12..16].copy_from_slice(&(gmm.dim() as u32).to_le_bytes());
    writer.write_all(&header)?;

    write_f32_block(writer, gmm.weights())?;
    write_f32_block(writer, gmm.means())?;
    write_f32_block(writer, gmm.variances())?;
    Ok(())
}

/// Load a mixture from a .dgmm file.
pub fn load_gmm(path: &Path) -> Result<DiagonalGmm> {
    let mut reader = BufReader::new(File::open(path)?);
    read_gmm(&mut reader)
}

/// Read a mixture from a reader in .dgmm format.
pub fn read_gmm<R: Read>(reader: &mut R) -> Result<DiagonalGmm> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    if &header[0..4] != MAGIC {
        return Err(FormatError::InvalidFormat("invalid magic bytes".to_string()));
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != VERSION {
        return Err(FormatError::VersionMismatch {
            expected: VERSION,
            found: version,
        });
    }

    let k = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
    let dim = u32::from_le_bytes([header[12], header[13], header[14], header[15]]) as usize;
    let block = match k.checked_mul(dim) {
        Some(block) if block.checked_mul(8).is_some() => block,
        _ => {
            return Err(FormatError::InvalidFormat(
                "parameter block too large".to_string(),
            ))
        }
    };

    let weights = read_f32_block(reader, k)?;
    let means = read_f32_block(reader, block)?;
    let variances = read_f32_block(reader, block)?;

    Ok(DiagonalGmm::new(weights, means, variances, dim)?)
}

fn write_f32_block<W: Write>(writer: &mut W, values: &[f32]) -> Result<()> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    writer.write_all(&bytes)?;
    Ok(())
}

fn read_f32_block<R: Read>(reader: &mut R, count: usize) -> Result<Vec<f32>> {
    let mut bytes = vec![0u8; count * 4];
    reader.read_exact(&mut bytes)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
