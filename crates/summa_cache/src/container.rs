//! On-disk container holding every persisted summary of one analysis run.
//!
//! Layout: a 4-byte little-endian header length, a bincode-encoded
//! [`ContainerHeader`], then the bincode-encoded list of
//! `(UnitId, SerializedSummary)` pairs. The header carries magic bytes, the
//! format version, and a checksum of the payload. The file is replaced
//! atomically: it is written to a sibling temp file and renamed into place.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use summa_common::Fingerprint;

use crate::codec::SerializedSummary;
use crate::error::CacheError;
use crate::id::UnitId;

/// Magic bytes identifying a summary container.
const CONTAINER_MAGIC: [u8; 4] = *b"SUMC";

/// Current container format version. Increment on breaking changes to
/// the header or payload format.
const CONTAINER_FORMAT_VERSION: u32 = 1;

/// One persisted entry.
pub type ContainerEntry = (UnitId, SerializedSummary);

/// Header prepended to every container for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHeader {
    /// Magic bytes: must be `b"SUMC"`.
    pub magic: [u8; 4],

    /// Container format version.
    pub format_version: u32,

    /// Number of entries in the payload.
    pub entry_count: u64,

    /// Checksum of the payload bytes.
    pub checksum: Fingerprint,
}

/// Encodes `entries` into container bytes.
///
/// Entries are written in the order given; callers sort them when they need
/// byte-identical output for identical content.
pub fn encode_container(entries: &[ContainerEntry]) -> Result<Vec<u8>, CacheError> {
    let payload = bincode::serde::encode_to_vec(entries, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let header = ContainerHeader {
        magic: CONTAINER_MAGIC,
        format_version: CONTAINER_FORMAT_VERSION,
        entry_count: entries.len() as u64,
        checksum: Fingerprint::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes container bytes read from `path`, validating the header.
pub fn decode_container(path: &Path, raw: &[u8]) -> Result<Vec<ContainerEntry>, CacheError> {
    let invalid = |reason: &str| CacheError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if raw.len() < 4 {
        return Err(invalid("file too short for header length"));
    }
    let header_len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    if raw.len() < 4 + header_len {
        return Err(invalid("truncated header"));
    }

    let (header, _): (ContainerHeader, usize) =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != CONTAINER_MAGIC {
        return Err(invalid("missing magic bytes"));
    }
    if header.format_version != CONTAINER_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            expected: CONTAINER_FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &raw[4 + header_len..];
    let actual = Fingerprint::from_bytes(payload);
    if actual != header.checksum {
        return Err(CacheError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let (entries, _): (Vec<ContainerEntry>, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })?;
    if entries.len() as u64 != header.entry_count {
        return Err(invalid("entry count does not match payload"));
    }
    Ok(entries)
}

/// Reads the container at `path`.
///
/// Returns `Ok(None)` if the file does not exist: a missing cache is an
/// empty cache, not an error.
pub fn read_container(path: &Path) -> Result<Option<Vec<ContainerEntry>>, CacheError> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    decode_container(path, &raw).map(Some)
}

/// Writes `entries` to `path`, replacing any previous container atomically.
///
/// Creates the parent directory if it doesn't exist.
pub fn write_container(path: &Path, entries: &[ContainerEntry]) -> Result<(), CacheError> {
    let bytes = encode_container(entries)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let temp_path = temp_path_for(path);
    let result = write_temp(&temp_path, &bytes).and_then(|()| {
        std::fs::rename(&temp_path, path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    });
    if result.is_err() {
        // Best effort.
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

fn write_temp(temp_path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: temp_path.to_path_buf(),
        source,
    };
    let mut file = File::create(temp_path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
