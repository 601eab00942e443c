//! Reading Implementation Guide packs (`.tgz` archives).
//!
//! The whole pack is read before anything is uploaded, so a corrupt archive
//! aborts the run without a single request reaching the server.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info};

use crate::error::{Result, UploadError};

/// One regular file from the pack, with its bytes exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackEntry {
    pub path: String,
    pub data: Vec<u8>,
}

/// An IG pack loaded into memory, entries kept in archive order.
#[derive(Debug, Clone)]
pub struct IgPack {
    source: PathBuf,
    entries: Vec<PackEntry>,
}

impl IgPack {
    /// Open and fully read a gzip-compressed tar archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading IG pack from path: {:?}", path);

        let file = File::open(path).map_err(|e| UploadError::archive_open(path, e))?;
        let entries = read_entries(file).map_err(|e| UploadError::archive_read(path, e))?;

        info!(
            pack = %path.display(),
            entries = entries.len(),
            "IG pack loaded"
        );

        Ok(Self {
            source: path.to_path_buf(),
            entries,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn entries(&self) -> &[PackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for IgPack {
    type Item = PackEntry;
    type IntoIter = std::vec::IntoIter<PackEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// Upper bound on the buffer reserved up front from a header's size field.
const MAX_PREALLOC: u64 = 1 << 20;

/// Decompress and walk the tar stream, keeping regular files only.
fn read_entries<R: Read>(reader: R) -> io::Result<Vec<PackEntry>> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut entries = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let path = entry.path()?.to_string_lossy().into_owned();

        if !entry.header().entry_type().is_file() {
            debug!(entry = %path, "skipping non-file archive entry");
            continue;
        }

        let declared = entry.size();
        let mut data = Vec::with_capacity(declared.min(MAX_PREALLOC) as usize);
        entry.read_to_end(&mut data)?;
        if data.len() as u64 != declared {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "entry {path} is truncated: {} of {declared} bytes",
                    data.len()
                ),
            ));
        }
        entries.push(PackEntry { path, data });
    }

    Ok(entries)
}
