//! I/O layer: the statistics store and mixture persistence.
//!
//! Two independent pieces: [`SstatsMap`] is the directory-backed store the
//! pipeline reads and writes per-sample statistics through, and
//! [`gmm_format`] persists trained mixtures in the native .dgmm format.

pub mod gmm_format;
pub mod sstats_map;

pub use gmm_format::{FormatError, load_gmm, read_gmm, save_gmm, write_gmm};
pub use sstats_map::{IntegrityFault, IntegrityReport, SampleInfo, SstatsMap, StoreError};
