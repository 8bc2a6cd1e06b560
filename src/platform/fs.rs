// LogStream - platform/fs.rs
//
// Filesystem helpers shared by the snapshot reader and the growth watchers.
// All text is decoded as lossy UTF-8: invalid sequences become U+FFFD rather
// than failing the whole read.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Current size of the file at `path`, or `None` if it does not exist.
///
/// Any other stat failure (permissions, a non-directory path component) is
/// returned as an error so the caller can log it and retry later.
pub fn file_size(path: &Path) -> io::Result<Option<u64>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read the full content of a file as a string.
pub fn read_file_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read at most the first `limit` bytes of a file as a string.
pub fn read_prefix_lossy(path: &Path, limit: u64) -> io::Result<String> {
    let bytes = read_range(path, 0, limit)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read up to `len` bytes from `path` starting at byte position `offset`.
///
/// Returns fewer bytes than `len` if the file ends first.
pub fn read_range(path: &Path, offset: u64, len: u64) -> io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
    file.take(len).read_to_end(&mut buf)?;
    Ok(buf)
}
