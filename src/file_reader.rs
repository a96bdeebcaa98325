//! Bounded content reads and database file access
//!
//! Two jobs live here:
//!
//! - Reading a bounded prefix from a stream or path for sniffing. Seekable
//!   streams are put back where they were; plain readers are left advanced
//!   by however many bytes were taken.
//! - Opening database files. Files ending in `.gz` (case-insensitive) are
//!   decompressed transparently; everything else is memory-mapped.
//!
//! # Example
//!
//! ```rust,no_run
//! use mimetype::file_reader;
//! use std::fs::File;
//!
//! let mut file = File::open("photo.jpg")?;
//! let prefix = file_reader::peek_prefix(&mut file, 4096)?;
//! // `file` is positioned at its original offset again
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Buffer size for reading database files line by line
const BUFFER_SIZE: usize = 64 * 1024;

/// Read up to `limit` bytes from `reader`.
///
/// Short reads are retried until `limit` bytes arrive or the reader reports
/// end of stream, so the result only falls short of `limit` at EOF.
pub fn read_prefix<R: Read + ?Sized>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(limit.min(BUFFER_SIZE));
    reader.take(limit as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}

/// Read up to `limit` bytes and seek back to where the stream started.
pub fn peek_prefix<R: Read + Seek + ?Sized>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>> {
    let start = reader.stream_position()?;
    let prefix = read_prefix(reader, limit);
    // Restore even when the read failed part way
    reader.seek(SeekFrom::Start(start))?;
    prefix
}

/// Read up to `limit` bytes from the start of the file at `path`.
pub fn read_file_prefix<P: AsRef<Path>>(path: P, limit: usize) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    read_prefix(&mut file, limit)
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Open a text database with automatic gzip detection based on extension.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if is_gzip(path) {
        let decoder = GzDecoder::new(file);
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Storage for a binary database - either owned or memory-mapped
pub enum DatabaseBytes {
    /// Decompressed or empty content
    Owned(Vec<u8>),
    /// Memory-mapped file
    Mmap(Mmap),
}

impl DatabaseBytes {
    /// View the content
    pub fn as_slice(&self) -> &[u8] {
        match self {
            DatabaseBytes::Owned(v) => v.as_slice(),
            DatabaseBytes::Mmap(m) => &m[..],
        }
    }
}

/// Load a binary database, memory-mapping plain files and inflating `.gz`.
pub fn load_bytes<P: AsRef<Path>>(path: P) -> io::Result<DatabaseBytes> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if is_gzip(path) {
        let mut data = Vec::new();
        GzDecoder::new(file).read_to_end(&mut data)?;
        return Ok(DatabaseBytes::Owned(data));
    }

    // Zero-length mappings are rejected on some platforms
    if file.metadata()?.len() == 0 {
        return Ok(DatabaseBytes::Owned(Vec::new()));
    }

    // SAFETY: the mapping is read-only and only lives for the duration of
    // a parse; database files are not expected to change underneath us.
    let mmap = unsafe { Mmap::map(&file) }?;
    Ok(DatabaseBytes::Mmap(mmap))
}
