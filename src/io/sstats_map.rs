//! On-disk store for per-sample sufficient statistics.
//!
//! Each sample is a pair of files under one directory:
//!
//! - `<name>.dat`: raw little-endian f32 values, one or more slices of
//!   statistics back to back, no header.
//! - `<name>.info`: postcard-encoded [`SampleInfo`] sidecar.
//!
//! Names are opaque keys chosen by the caller. The store never interprets
//! the statistics; slice structure is recovered from the unit length the
//! caller passes to [`SstatsMap::check`] and [`SstatsMap::merge`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extension of the raw statistics file.
const DATA_EXT: &str = "dat";

/// Extension of the sidecar file.
const INFO_EXT: &str = "info";

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named sample has no data file.
    #[error("sample '{name}' is missing")]
    Missing {
        /// Sample name.
        name: String,
    },

    /// A file exists but cannot be decoded.
    #[error("sample '{name}' is corrupt: {reason}")]
    Corrupt {
        /// Sample name.
        name: String,
        /// What was wrong with the bytes.
        reason: String,
    },

    /// A sample's value count is not a whole number of slices.
    #[error("sample '{name}' has {len} values, not a multiple of the unit length {unit}")]
    BadUnitLength {
        /// Sample name.
        name: String,
        /// Number of f32 values in the sample.
        len: usize,
        /// Unit length for one slice.
        unit: usize,
    },

    /// Sidecar serialization failed.
    #[error("sidecar serialization failed: {0}")]
    Serialize(#[from] postcard::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Per-sample bookkeeping stored next to the statistics.
///
/// `begin_frames`, `end_frames` and `descs_per_slice` hold one entry per
/// slice; `slices` is kept explicit so a sidecar remains meaningful even
/// when the per-slice vectors are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInfo {
    /// Class label of the sample.
    pub label: i32,
    /// Number of slices stored in the data file.
    pub slices: u32,
    /// First frame of each slice.
    pub begin_frames: Vec<u32>,
    /// Last frame of each slice.
    pub end_frames: Vec<u32>,
    /// Descriptor count that produced each slice.
    pub descs_per_slice: Vec<u32>,
}

impl SampleInfo {
    /// Sidecar for a sample stored as a single slice.
    pub fn single_slice(label: i32, begin_frame: u32, end_frame: u32, descs: u32) -> Self {
        Self {
            label,
            slices: 1,
            begin_frames: vec![begin_frame],
            end_frames: vec![end_frame],
            descs_per_slice: vec![descs],
        }
    }
}

/// Why a sample failed an integrity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityFault {
    /// Data file absent.
    Missing,
    /// Data file has zero bytes, e.g. only touched.
    Empty,
    /// Byte length is not a whole number of f32 values.
    Truncated {
        /// Size of the data file in bytes.
        bytes: u64,
    },
    /// Value count is not a multiple of the unit length.
    BadLength {
        /// Number of f32 values in the file.
        values: usize,
    },
    /// The data contains NaN or infinite values.
    NonFinite,
}

/// Outcome of [`SstatsMap::check`] over a batch of samples.
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    checked: usize,
    faults: Vec<(String, IntegrityFault)>,
}

impl IntegrityReport {
    /// True when every checked sample was sound.
    #[inline]
    pub fn passed(&self) -> bool {
        self.faults.is_empty()
    }

    /// Number of samples inspected.
    #[inline]
    pub fn checked(&self) -> usize {
        self.checked
    }

    /// The offending samples with their first detected fault.
    #[inline]
    pub fn faults(&self) -> &[(String, IntegrityFault)] {
        &self.faults
    }
}

/// Directory-backed map from sample names to statistics.
#[derive(Debug, Clone)]
pub struct SstatsMap {
    root: PathBuf,
}

impl SstatsMap {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory backing this store.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{DATA_EXT}"))
    }

    fn info_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{INFO_EXT}"))
    }

    fn labels_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("labels_{name}.{DATA_EXT}"))
    }

    /// Write a sample's statistics and sidecar, replacing any previous
    /// content under the same name.
    pub fn write(&self, name: &str, sstats: &[f32], info: &SampleInfo) -> Result<()> {
        fs::write(self.data_path(name), encode_f32(sstats))?;
        fs::write(self.info_path(name), postcard::to_allocvec(info)?)?;
        log::debug!("wrote sample '{}' ({} values)", name, sstats.len());
        Ok(())
    }

    /// Create an empty data file for `name`.
    ///
    /// Workers claim a sample this way before computing its statistics, so
    /// concurrent runs over the same directory skip work already taken.
    pub fn touch(&self, name: &str) -> Result<()> {
        fs::write(self.data_path(name), [])?;
        Ok(())
    }

    /// Whether a data file exists for `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.data_path(name).exists()
    }

    /// Read a sample's statistics.
    pub fn read(&self, name: &str) -> Result<Vec<f32>> {
        let bytes = match fs::read(self.data_path(name)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Missing {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        decode_f32(&bytes).ok_or_else(|| StoreError::Corrupt {
            name: name.to_string(),
            reason: format!("{} bytes is not a whole number of f32 values", bytes.len()),
        })
    }

    /// Read a sample's sidecar.
    pub fn read_info(&self, name: &str) -> Result<SampleInfo> {
        let bytes = match fs::read(self.info_path(name)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Missing {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        postcard::from_bytes(&bytes).map_err(|e| StoreError::Corrupt {
            name: name.to_string(),
            reason: format!("sidecar does not decode: {e}"),
        })
    }

    /// Read the label list written by [`SstatsMap::merge`].
    pub fn read_labels(&self, name: &str) -> Result<Vec<i32>> {
        let bytes = match fs::read(self.labels_path(name)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Missing {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        postcard::from_bytes(&bytes).map_err(|e| StoreError::Corrupt {
            name: name.to_string(),
            reason: format!("label list does not decode: {e}"),
        })
    }

    /// Inspect a batch of samples without failing on the first bad one.
    ///
    /// `unit` is the per-slice statistics length. Every offender is
    /// reported with its first detected fault and logged at warn level;
    /// only filesystem trouble other than a missing file is an error.
    pub fn check(&self, names: &[String], unit: usize) -> Result<IntegrityReport> {
        debug_assert!(unit > 0, "unit length must be positive");
        let mut report = IntegrityReport::default();

        for name in names {
            report.checked += 1;
            let bytes = match fs::read(self.data_path(name)) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::warn!("integrity: sample '{}' is missing", name);
                    report.faults.push((name.clone(), IntegrityFault::Missing));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let fault = if bytes.is_empty() {
                Some(IntegrityFault::Empty)
            } else {
                match decode_f32(&bytes) {
                    None => Some(IntegrityFault::Truncated {
                        bytes: bytes.len() as u64,
                    }),
                    Some(values) if values.len() % unit != 0 => Some(IntegrityFault::BadLength {
                        values: values.len(),
                    }),
                    Some(values) if values.iter().any(|v| !v.is_finite()) => {
                        Some(IntegrityFault::NonFinite)
                    }
                    Some(_) => None,
                }
            };

            if let Some(fault) = fault {
                log::warn!("integrity: sample '{}' failed: {:?}", name, fault);
                report.faults.push((name.clone(), fault));
            }
        }
        Ok(report)
    }

    /// Concatenate many samples into one, with a per-slice label list.
    ///
    /// Writes `<out_name>.dat` holding every input's slices back to back,
    /// and `labels_<out_name>.dat` holding one label per slice (each
    /// sample's sidecar label repeated once per slice), readable through
    /// [`SstatsMap::read_labels`]. The output is replaced if it already
    /// exists. No sidecar is written for the merged sample.
    pub fn merge(&self, names: &[String], out_name: &str, unit: usize) -> Result<()> {
        debug_assert!(unit > 0, "unit length must be positive");
        let mut merged: Vec<f32> = Vec::new();
        let mut labels: Vec<i32> = Vec::new();

        for name in names {
            let sstats = self.read(name)?;
            let info = self.read_info(name)?;
            if sstats.is_empty() || sstats.len() % unit != 0 {
                return Err(StoreError::BadUnitLength {
                    name: name.clone(),
                    len: sstats.len(),
                    unit,
                });
            }
            let slices = sstats.len() / unit;
            labels.extend(std::iter::repeat(info.label).take(slices));
            merged.extend_from_slice(&sstats);
        }

        fs::write(self.data_path(out_name), encode_f32(&merged))?;
        fs::write(self.labels_path(out_name), postcard::to_allocvec(&labels)?)?;
        log::info!(
            "merged {} samples ({} slices) into '{}'",
            names.len(),
            labels.len(),
            out_name
        );
        Ok(())
    }
}

fn encode_f32(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn decode_f32(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();
        let info = SampleInfo::single_slice(3, 0, 120, 250);

        store.write("clip_a", &[1.0, -2.5, 0.0, 0.5], &info).unwrap();

        assert!(store.exists("clip_a"));
        assert_eq!(store.read("clip_a").unwrap(), vec![1.0, -2.5, 0.0, 0.5]);
        assert_eq!(store.read_info("clip_a").unwrap(), info);
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("cache").join("sstats");
        let store = SstatsMap::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.root(), nested);
    }

    #[test]
    fn test_missing_sample() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();

        assert!(!store.exists("nope"));
        assert!(matches!(
            store.read("nope").unwrap_err(),
            StoreError::Missing { .. }
        ));
        assert!(matches!(
            store.read_info("nope").unwrap_err(),
            StoreError::Missing { .. }
        ));
    }

    #[test]
    fn test_touch_claims_sample() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();

        store.touch("pending").unwrap();
        assert!(store.exists("pending"));
        assert_eq!(store.read("pending").unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_write_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();
        let info = SampleInfo::single_slice(0, 0, 10, 5);

        store.write("clip", &[1.0, 2.0, 3.0], &info).unwrap();
        store.write("clip", &[9.0], &info).unwrap();
        assert_eq!(store.read("clip").unwrap(), vec![9.0]);
    }

    #[test]
    fn test_read_rejects_truncated_file() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("bad.dat"), [0u8, 1, 2]).unwrap();

        assert!(matches!(
            store.read("bad").unwrap_err(),
            StoreError::Corrupt { .. }
        ));
    }

    #[test]
    fn test_check_reports_each_fault() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();
        let info = SampleInfo::default();

        store.write("good", &[1.0; 14], &info).unwrap();
        store.write("ragged", &[1.0; 10], &info).unwrap();
        store.write("nan", &[1.0, f32::NAN, 0.0, 0.0, 0.0, 0.0, 0.0], &info).unwrap();
        store.touch("empty").unwrap();
        std::fs::write(dir.path().join("torn.dat"), [0u8; 6]).unwrap();

        let list = names(&["good", "ragged", "nan", "empty", "torn", "absent"]);
        let report = store.check(&list, 7).unwrap();

        assert!(!report.passed());
        assert_eq!(report.checked(), 6);
        let faults: Vec<_> = report
            .faults()
            .iter()
            .map(|(n, f)| (n.as_str(), f.clone()))
            .collect();
        assert_eq!(
            faults,
            vec![
                ("ragged", IntegrityFault::BadLength { values: 10 }),
                ("nan", IntegrityFault::NonFinite),
                ("empty", IntegrityFault::Empty),
                ("torn", IntegrityFault::Truncated { bytes: 6 }),
                ("absent", IntegrityFault::Missing),
            ]
        );
    }

    #[test]
    fn test_check_passes_clean_store() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();
        store
            .write("a", &[0.5; 21], &SampleInfo::default())
            .unwrap();

        let report = store.check(&names(&["a"]), 7).unwrap();
        assert!(report.passed());
        assert_eq!(report.checked(), 1);
    }

    #[test]
    fn test_merge_concatenates_slices_and_labels() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();

        // Two slices for label 1, one slice for label 2, unit length 2.
        let info_a = SampleInfo {
            label: 1,
            slices: 2,
            ..Default::default()
        };
        let info_b = SampleInfo {
            label: 2,
            slices: 1,
            ..Default::default()
        };

        store.write("a", &[1.0, 2.0, 3.0, 4.0], &info_a).unwrap();
        store.write("b", &[5.0, 6.0], &info_b).unwrap();

        store.merge(&names(&["a", "b"]), "train", 2).unwrap();

        assert_eq!(
            store.read("train").unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
        assert_eq!(store.read_labels("train").unwrap(), vec![1, 1, 2]);
    }

    #[test]
    fn test_merge_replaces_previous_output() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();
        let info = SampleInfo {
            label: 7,
            slices: 1,
            ..Default::default()
        };
        store.write("a", &[1.0, 2.0], &info).unwrap();

        store.merge(&names(&["a"]), "out", 2).unwrap();
        store.merge(&names(&["a"]), "out", 2).unwrap();

        // A second merge must not append to the first.
        assert_eq!(store.read("out").unwrap(), vec![1.0, 2.0]);
        assert_eq!(store.read_labels("out").unwrap(), vec![7]);
    }

    #[test]
    fn test_merge_rejects_ragged_sample() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();
        store.write("a", &[1.0, 2.0, 3.0], &SampleInfo::default()).unwrap();

        assert!(matches!(
            store.merge(&names(&["a"]), "out", 2).unwrap_err(),
            StoreError::BadUnitLength { len: 3, unit: 2, .. }
        ));
    }

    #[test]
    fn test_info_round_trips_all_fields() {
        let dir = TempDir::new().unwrap();
        let store = SstatsMap::open(dir.path()).unwrap();
        let info = SampleInfo {
            label: -4,
            slices: 3,
            begin_frames: vec![0, 30, 60],
            end_frames: vec![29, 59, 89],
            descs_per_slice: vec![100, 85, 92],
        };

        store.write("clip", &[0.0; 21], &info).unwrap();
        assert_eq!(store.read_info("clip").unwrap(), info);
    }
}
