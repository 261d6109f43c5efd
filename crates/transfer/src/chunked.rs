use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::TransferError;
use crate::source::UploadSource;
use crate::types::Chunk;

/// Bytes of file content folded into an upload fingerprint.
pub const FINGERPRINT_SAMPLE_LEN: usize = 64 * 1024;

/// Computes the resume fingerprint of `source` for uploads to `endpoint`.
///
/// SHA-256 over the endpoint, filename, MIME type, size, modification time
/// and the first [`FINGERPRINT_SAMPLE_LEN`] bytes of content. Two selections
/// of the same unchanged file produce the same fingerprint.
pub fn fingerprint(endpoint: &str, source: &UploadSource) -> Result<String, TransferError> {
    let mut hasher = Sha256::new();
    for part in [endpoint, source.filename(), source.mime_type()] {
        hasher.update(part.as_bytes());
        hasher.update([0]);
    }
    hasher.update(source.size().to_be_bytes());
    hasher.update(source.modified_ms().unwrap_or_default().to_be_bytes());

    let mut sample = Vec::with_capacity(FINGERPRINT_SAMPLE_LEN);
    std::fs::File::open(source.path())?
        .take(FINGERPRINT_SAMPLE_LEN as u64)
        .read_to_end(&mut sample)?;
    hasher.update(&sample);

    Ok(hex::encode(hasher.finalize()))
}

/// Reads up to `max_len` bytes of `path` starting at `offset`.
///
/// The chunk is filled completely unless the file ends first, so a short
/// chunk means end of file.
pub fn read_chunk_at(path: &Path, offset: u64, max_len: usize) -> Result<Chunk, TransferError> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut data = Vec::with_capacity(max_len);
    file.take(max_len as u64).read_to_end(&mut data)?;
    Ok(Chunk { offset, data })
}
