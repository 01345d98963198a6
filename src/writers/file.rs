//! Size-based rotating file writer
//!
//! When a write would push the file past its size limit, the file is rotated:
//! `app.log.1` becomes `app.log.2` and so on up to the backup count, the
//! current file becomes `app.log.1` (gzip-compressed to `app.log.1.gz` if
//! enabled), and writing continues in a fresh `app.log`.

use super::{SafeWriter, StreamWriter};
use crate::core::config::parse_size;
use crate::core::{Level, LoggerError, Result, Writer};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Size used by [`file_writer`] when none is given
pub const DEFAULT_FILE_SIZE: &str = "100M";

/// Backup count used by [`file_writer`] when the given one is below 1
pub const DEFAULT_FILE_COUNT: usize = 100;

struct FileState {
    file: Option<File>,
    written: u64,
}

/// A log file rotated by size, safe for concurrent writes
pub struct SizedRotatingFile {
    path: PathBuf,
    max_size: u64,
    backup_count: usize,
    compress: bool,
    state: Mutex<FileState>,
}

impl SizedRotatingFile {
    /// Open (or create) the file for appending, creating missing parent directories
    ///
    /// With a `backup_count` of 0 the file is never rotated.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or the file cannot be created or opened
    pub fn open<P: AsRef<Path>>(path: P, max_size: u64, backup_count: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, written) = open_append(&path)?;
        Ok(Self {
            path,
            max_size,
            backup_count,
            compress: false,
            state: Mutex::new(FileState {
                file: Some(file),
                written,
            }),
        })
    }

    /// Open with a size string such as `"100M"`
    ///
    /// An empty `size` means [`DEFAULT_FILE_SIZE`], a `count` below 1 means
    /// [`DEFAULT_FILE_COUNT`].
    pub fn from_options<P: AsRef<Path>>(path: P, size: &str, count: i64) -> Result<Self> {
        let size = parse_size(if size.is_empty() { DEFAULT_FILE_SIZE } else { size })?;
        let count = usize::try_from(count)
            .ok()
            .filter(|&c| c >= 1)
            .unwrap_or(DEFAULT_FILE_COUNT);
        Self::open(path, size, count)
    }

    /// Gzip rotated backups
    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    /// Bytes in the current file
    pub fn current_size(&self) -> u64 {
        self.state.lock().written
    }

    /// Path of the `index`-th backup (1 is the newest)
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        if self.compress {
            name.push(".gz");
        }
        PathBuf::from(name)
    }

    fn rotate(&self, state: &mut FileState) -> Result<()> {
        if self.backup_count == 0 {
            return Ok(());
        }
        state.file = None;

        for i in (1..self.backup_count).rev() {
            let src = self.backup_path(i);
            let dst = self.backup_path(i + 1);
            if src.exists() {
                if dst.exists() {
                    let _ = fs::remove_file(&dst);
                }
                fs::rename(&src, &dst).map_err(|e| {
                    self.rotation_error(format!(
                        "failed to rename {} -> {}: {}",
                        src.display(),
                        dst.display(),
                        e
                    ))
                })?;
            }
        }

        let newest = self.backup_path(1);
        if newest.exists() {
            fs::remove_file(&newest).map_err(|e| {
                self.rotation_error(format!("failed to remove {}: {}", newest.display(), e))
            })?;
        }

        if self.compress {
            compress_into(&self.path, &newest)?;
            fs::remove_file(&self.path).map_err(|e| {
                self.rotation_error(format!("failed to remove compressed source: {}", e))
            })?;
        } else {
            fs::rename(&self.path, &newest).map_err(|e| {
                self.rotation_error(format!(
                    "failed to rename {} -> {}: {}",
                    self.path.display(),
                    newest.display(),
                    e
                ))
            })?;
        }

        let (file, written) = open_append(&self.path)?;
        state.file = Some(file);
        state.written = written;
        Ok(())
    }

    fn rotation_error(&self, message: String) -> LoggerError {
        LoggerError::file_rotation(self.path.display().to_string(), message)
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::io_operation(
                "open log file",
                format!("Failed to open '{}'", path.display()),
                e,
            )
        })?;
    let written = file.metadata()?.len();
    Ok((file, written))
}

/// Stream-compress `src` into `dst` through a temporary file, so a failed
/// compression never leaves a truncated `dst` behind
fn compress_into(src: &Path, dst: &Path) -> Result<()> {
    let mut tmp = dst.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = (|| -> io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(src)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&tmp)?);
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&tmp, dst)
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(&tmp);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", src.display()),
            e,
        )
    })
}

impl Writer for SizedRotatingFile {
    fn write(&self, _level: Level, data: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();
        if state.file.is_none() {
            return Err(LoggerError::writer(
                "SizedRotatingFile",
                "the file has been closed",
            ));
        }

        if state.written > 0 && state.written + data.len() as u64 > self.max_size {
            if let Err(e) = self.rotate(&mut state) {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if state.file.is_none() {
                    let (file, written) = open_append(&self.path)?;
                    state.file = Some(file);
                    state.written = written;
                }
            }
        }

        match state.file.as_mut() {
            Some(file) => file.write_all(data)?,
            None => {
                return Err(LoggerError::writer(
                    "SizedRotatingFile",
                    "the file could not be reopened after rotation",
                ))
            }
        }
        state.written += data.len() as u64;
        Ok(data.len())
    }

    fn flush(&self) -> Result<()> {
        if let Some(file) = self.state.lock().file.as_mut() {
            file.flush()?;
            file.sync_data()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if let Some(file) = self.state.lock().file.take() {
            file.sync_data()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "SizedRotatingFile"
    }
}

impl std::fmt::Debug for SizedRotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizedRotatingFile")
            .field("path", &self.path)
            .field("max_size", &self.max_size)
            .field("backup_count", &self.backup_count)
            .field("compress", &self.compress)
            .finish()
    }
}

/// A rotating file writer configured from strings
///
/// An empty `path` gives a locked stdout writer instead. An empty `size`
/// means [`DEFAULT_FILE_SIZE`], a `count` below 1 means [`DEFAULT_FILE_COUNT`].
///
/// # Errors
///
/// Returns error if `size` is malformed or the file cannot be opened
pub fn file_writer(path: &str, size: &str, count: i64) -> Result<Arc<dyn Writer>> {
    if path.is_empty() {
        return Ok(Arc::new(SafeWriter::new(StreamWriter::stdout())));
    }

    Ok(Arc::new(SizedRotatingFile::from_options(path, size, count)?))
}
