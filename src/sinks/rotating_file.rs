//! Rotating file sink
//!
//! Appends encoded records to a file and rotates it once it would grow past
//! the size limit. Rotated files are named `<file>.1`, `<file>.2`, … with
//! `.1` the most recent, optionally gzip-compressed to `<file>.N.gz`.

use crate::core::{LoggerError, Result, Sink};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const MEGABYTE: u64 = 1024 * 1024;

/// Retention and rotation limits
///
/// # Examples
///
/// ```
/// use logtee::sinks::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_max_size_mb(50)
///     .with_max_backups(7)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(true);
/// assert_eq!(policy.max_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size at which the file is rotated
    pub max_bytes: u64,
    /// Rotated files older than this are removed; `None` keeps them
    pub max_age: Option<Duration>,
    /// Maximum number of rotated files to keep; 0 keeps all
    pub max_backups: usize,
    /// Whether to compress rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 100 * MEGABYTE,
            max_age: None,
            max_backups: 0,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration units; zero values keep the defaults
    #[must_use]
    pub fn from_limits(max_size_mb: u64, max_age_days: u64, max_backups: usize, compress: bool) -> Self {
        let mut policy = Self::new()
            .with_max_backups(max_backups)
            .with_compression(compress);
        if max_size_mb > 0 {
            policy = policy.with_max_size_mb(max_size_mb);
        }
        if max_age_days > 0 {
            policy = policy.with_max_age(Duration::from_secs(max_age_days * 24 * 3600));
        }
        policy
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(self, megabytes: u64) -> Self {
        self.with_max_bytes(megabytes.saturating_mul(MEGABYTE))
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

struct FileState {
    file: Option<File>,
    current_size: u64,
}

/// File sink with size-based rotation
///
/// # Examples
///
/// ```no_run
/// use logtee::sinks::{RotatingFileSink, RotationPolicy};
///
/// let sink = RotatingFileSink::with_policy(
///     "/var/log/app.log",
///     RotationPolicy::new().with_max_size_mb(100).with_max_backups(5),
/// )
/// .unwrap();
/// ```
pub struct RotatingFileSink {
    base_path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<FileState>,
}

impl RotatingFileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Open (or create) the file, creating parent directories as needed
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open(&base_path)?;

        Ok(Self {
            base_path,
            policy,
            state: Mutex::new(FileState {
                file: Some(file),
                current_size,
            }),
        })
    }

    fn open(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;
        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();
        Ok((file, size))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.state.lock().current_size
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.base_path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn gz_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }

    /// Existing backup slot, compressed or not
    fn existing_backup(&self, index: usize) -> Option<PathBuf> {
        let plain = self.backup_path(index);
        let compressed = Self::gz_path(&plain);
        if compressed.exists() {
            Some(compressed)
        } else if plain.exists() {
            Some(plain)
        } else {
            None
        }
    }

    fn rotate(&self, state: &mut FileState) -> Result<()> {
        if let Some(mut file) = state.file.take() {
            file.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let mut highest = 0;
        while self.existing_backup(highest + 1).is_some() {
            highest += 1;
        }

        // Slots at or past the limit would be pushed out by the shift below.
        if self.policy.max_backups > 0 {
            while highest >= self.policy.max_backups {
                if let Some(path) = self.existing_backup(highest) {
                    if let Err(e) = fs::remove_file(&path) {
                        tracing::warn!(path = %path.display(), error = %e, "failed to remove old backup");
                    }
                }
                highest -= 1;
            }
        }

        for i in (1..=highest).rev() {
            if let Some(old_path) = self.existing_backup(i) {
                let compressed = old_path.extension().is_some_and(|ext| ext == "gz");
                let new_path = if compressed {
                    Self::gz_path(&self.backup_path(i + 1))
                } else {
                    self.backup_path(i + 1)
                };
                fs::rename(&old_path, &new_path).map_err(|e| {
                    LoggerError::file_rotation(
                        old_path.display().to_string(),
                        format!("Failed to rotate backup files: {}", e),
                    )
                })?;
            }
        }

        let first_backup = self.backup_path(1);
        if self.base_path.exists() {
            fs::rename(&self.base_path, &first_backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;

            if self.policy.compress {
                self.compress_file(&first_backup)?;
            }
        }

        let (file, size) = Self::open(&self.base_path)?;
        state.file = Some(file);
        state.current_size = size;

        self.remove_expired();
        Ok(())
    }

    fn remove_expired(&self) {
        let Some(max_age) = self.policy.max_age else {
            return;
        };
        let now = SystemTime::now();
        let mut index = 1;
        while let Some(path) = self.existing_backup(index) {
            let expired = fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > max_age);
            if expired {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove expired backup");
                }
            }
            index += 1;
        }
    }

    /// Gzip `path` into `path.gz`; the original is removed only once the
    /// compressed copy is complete.
    fn compress_file(&self, path: &Path) -> Result<()> {
        use std::io::{BufReader, BufWriter};

        let gz_path = Self::gz_path(path);
        let mut temp_name = gz_path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let compress = || -> std::io::Result<()> {
            let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
            let output = BufWriter::with_capacity(64 * 1024, File::create(&temp_path)?);
            let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
            std::io::copy(&mut reader, &mut encoder)?;
            encoder.finish()?.flush()?;
            fs::rename(&temp_path, &gz_path)
        };

        if let Err(e) = compress() {
            let _ = fs::remove_file(&temp_path);
            return Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress {}", path.display()),
                e,
            ));
        }

        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "compressed backup written but original could not be removed"
            );
        }
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();
        let len = buf.len() as u64;

        if state.current_size > 0 && state.current_size + len > self.policy.max_bytes {
            if let Err(e) = self.rotate(&mut state) {
                tracing::warn!(error = %e, "log rotation failed, continuing with current file");
                if state.file.is_none() {
                    let (file, size) = Self::open(&self.base_path)?;
                    state.file = Some(file);
                    state.current_size = size;
                }
                // Let the file outgrow the limit rather than retry on every write.
                state.current_size = 0;
            }
        }

        let file = state
            .file
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File not open"))?;
        file.write_all(buf).map_err(|e| {
            LoggerError::file_sink(
                self.base_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        state.current_size += len;
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(ref mut file) = state.file {
            file.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn line(i: usize) -> Vec<u8> {
        format!("entry number {:04}\n", i).into_bytes()
    }

    #[test]
    fn test_from_limits() {
        let policy = RotationPolicy::from_limits(0, 0, 0, false);
        assert_eq!(policy, RotationPolicy::default());

        let policy = RotationPolicy::from_limits(10, 2, 3, true);
        assert_eq!(policy.max_bytes, 10 * MEGABYTE);
        assert_eq!(policy.max_age, Some(Duration::from_secs(2 * 24 * 3600)));
        assert_eq!(policy.max_backups, 3);
        assert!(policy.compress);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nested/deeper/app.log");

        let sink = RotatingFileSink::new(&log_path).unwrap();
        sink.write(b"hello\n").unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "hello\n");
        assert_eq!(sink.current_size(), 6);
    }

    #[test]
    fn test_size_rotation_keeps_newest_first() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("rotation.log");
        let policy = RotationPolicy::new().with_max_bytes(40).with_max_backups(3);
        let sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();

        // 18 bytes per line: two lines per file
        for i in 0..6 {
            sink.write(&line(i)).unwrap();
        }
        sink.flush().unwrap();

        let current = fs::read_to_string(&log_path).unwrap();
        let newest = fs::read_to_string(dir.path().join("rotation.log.1")).unwrap();
        let oldest = fs::read_to_string(dir.path().join("rotation.log.2")).unwrap();
        assert!(current.contains("0004") && current.contains("0005"));
        assert!(newest.contains("0002") && newest.contains("0003"));
        assert!(oldest.contains("0000") && oldest.contains("0001"));
    }

    #[test]
    fn test_max_backups_limit() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("multi.log");
        let policy = RotationPolicy::new().with_max_bytes(20).with_max_backups(2);
        let sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();

        for i in 0..20 {
            sink.write(&line(i)).unwrap();
        }
        sink.flush().unwrap();

        let log_files = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("multi.log"))
            .count();
        assert_eq!(log_files, 3);
        assert!(!dir.path().join("multi.log.3").exists());
    }

    #[test]
    fn test_compressed_backups() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("zipped.log");
        let policy = RotationPolicy::new()
            .with_max_bytes(20)
            .with_max_backups(2)
            .with_compression(true);
        let sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();

        for i in 0..3 {
            sink.write(&line(i)).unwrap();
        }
        sink.flush().unwrap();

        let first = dir.path().join("zipped.log.1.gz");
        assert!(first.exists());
        assert!(!dir.path().join("zipped.log.1").exists());
        assert!(dir.path().join("zipped.log.2.gz").exists());

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(&first).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "entry number 0001\n");
    }

    #[test]
    fn test_max_age_removes_expired_backups() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("aged.log");
        let stale = dir.path().join("aged.log.1");
        fs::write(&stale, "from last month\n").unwrap();
        let ten_days = Duration::from_secs(10 * 24 * 3600);
        File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - ten_days)
            .unwrap();

        let policy = RotationPolicy::new()
            .with_max_bytes(20)
            .with_max_age(Duration::from_secs(24 * 3600));
        let sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();
        for i in 0..2 {
            sink.write(&line(i)).unwrap();
        }
        sink.flush().unwrap();

        // the stale backup was shifted to slot 2 and then pruned
        assert!(!dir.path().join("aged.log.2").exists());
        let fresh = fs::read_to_string(dir.path().join("aged.log.1")).unwrap();
        assert_eq!(fresh, "entry number 0000\n");
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "entry number 0001\n");
    }

    #[test]
    fn test_record_larger_than_limit_is_written() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("big.log");
        let sink =
            RotatingFileSink::with_policy(&log_path, RotationPolicy::new().with_max_bytes(4)).unwrap();

        sink.write(b"much longer than four bytes\n").unwrap();
        sink.flush().unwrap();
        assert!(fs::read_to_string(&log_path).unwrap().contains("four bytes"));
        assert!(!dir.path().join("big.log.1").exists());
    }
}
