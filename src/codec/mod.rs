//! On-disk form of fitted statistics: an `.npz` zip archive of 1-D float32
//! `.npy` entries, loadable with `numpy.load`.

mod archive;
pub mod npy;

pub use archive::{archive_path, ArchiveReader, ArchiveWriter};
