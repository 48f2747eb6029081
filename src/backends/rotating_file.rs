//! Rotating file backend
//!
//! Rotation is checked before each batch is written, so a file may exceed
//! its size limit by at most one batch. Rotated files are shifted to
//! `name.1`, `name.2`, ... up to the configured number of backups, and may be
//! gzip-compressed to `name.N.gz`.

use crate::core::{Backend, LoggerError, Result};
use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// When to rotate the current file
///
/// # Examples
///
/// ```
/// use rust_group_logger::backends::RotationStrategy;
/// use std::time::Duration;
///
/// let by_size = RotationStrategy::Size { max_bytes: 100 * 1024 * 1024 };
/// let by_time = RotationStrategy::Time { interval: Duration::from_secs(3600) };
/// let nightly = RotationStrategy::Daily { hour: 0 };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Rotate once the file reaches this many bytes
    Size { max_bytes: u64 },

    /// Rotate when this much time has passed since the last rotation
    Time { interval: Duration },

    /// Rotate on the first write of a new day at or after `hour` (0-23)
    Daily { hour: u8 },

    /// Never rotate
    Never,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Size {
            max_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

/// Configuration for [`RotatingFileBackend`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    pub strategy: RotationStrategy,
    /// Maximum number of rotated files to keep
    pub max_backups: usize,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::default(),
            max_backups: 5,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Shorthand for a size strategy
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.strategy = RotationStrategy::Size { max_bytes };
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

    fn validate(&self) -> Result<()> {
        if let RotationStrategy::Daily { hour } = self.strategy {
            if hour > 23 {
                return Err(LoggerError::config(
                    "RotationPolicy",
                    format!("daily rotation hour must be 0-23, got {}", hour),
                ));
            }
        }
        if self.max_backups == 0 {
            return Err(LoggerError::config(
                "RotationPolicy",
                "at least one backup file must be kept",
            ));
        }
        Ok(())
    }
}

/// File backend that rotates according to a [`RotationPolicy`]
pub struct RotatingFileBackend {
    base_path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    last_rotation: SystemTime,
    rotations: u64,
}

impl RotatingFileBackend {
    pub fn new(path: impl AsRef<Path>, policy: RotationPolicy) -> Result<Self> {
        policy.validate()?;
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

        let (file, current_size, last_rotation) = Self::open(&base_path)?;
        Ok(Self {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
            last_rotation,
            rotations: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Rotations performed since this backend was opened
    pub fn rotation_count(&self) -> u64 {
        self.rotations
    }

    fn open(path: &Path) -> Result<(File, u64, SystemTime)> {
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
        let metadata = file.metadata()?;
        // File modification time stands in for the last rotation
        let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
        Ok((file, metadata.len(), modified))
    }

    fn should_rotate(&self) -> bool {
        let elapsed = || {
            SystemTime::now()
                .duration_since(self.last_rotation)
                .unwrap_or(Duration::ZERO)
        };
        match &self.policy.strategy {
            RotationStrategy::Never => false,
            RotationStrategy::Size { max_bytes } => self.current_size >= *max_bytes,
            RotationStrategy::Time { interval } => elapsed() >= *interval,
            RotationStrategy::Daily { hour } => {
                let now: DateTime<Local> = SystemTime::now().into();
                let last: DateTime<Local> = self.last_rotation.into();
                now.date_naive() != last.date_naive() && now.hour() >= u32::from(*hour)
            }
        }
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let filename = self
            .base_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        self.base_path.with_file_name(format!("{}.{}", filename, index))
    }

    fn compressed(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> Result<()> {
        let display = self.base_path.display().to_string();

        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| LoggerError::file_rotation(&display, format!("flush failed: {}", e)))?;
        }

        // Oldest backup falls off the end
        let oldest = self.backup_path(self.policy.max_backups);
        for path in [Self::compressed(&oldest), oldest] {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    LoggerError::file_rotation(&display, format!("cannot remove '{}': {}", path.display(), e))
                })?;
            }
        }

        for index in (1..self.policy.max_backups).rev() {
            let from = self.backup_path(index);
            let to = self.backup_path(index + 1);
            for (from, to) in [(Self::compressed(&from), Self::compressed(&to)), (from, to)] {
                if from.exists() {
                    fs::rename(&from, &to).map_err(|e| {
                        LoggerError::file_rotation(&display, format!("cannot shift '{}': {}", from.display(), e))
                    })?;
                }
            }
        }

        let first = self.backup_path(1);
        if self.base_path.exists() {
            fs::rename(&self.base_path, &first)
                .map_err(|e| LoggerError::file_rotation(&display, format!("cannot move current file: {}", e)))?;
            if self.policy.compress {
                Self::compress_file(&first)?;
            }
        }

        let (file, _, _) = Self::open(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = 0;
        self.last_rotation = SystemTime::now();
        self.rotations += 1;
        Ok(())
    }

    /// Gzip `path` into `path.gz` through a temporary file, then remove `path`
    fn compress_file(path: &Path) -> Result<()> {
        let gz_path = Self::compressed(path);
        let mut tmp_name = gz_path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let result = (|| -> std::io::Result<()> {
            let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
            let output = BufWriter::with_capacity(64 * 1024, File::create(&tmp_path)?);
            let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());

            let mut buffer = vec![0u8; 64 * 1024];
            loop {
                let read = reader.read(&mut buffer)?;
                if read == 0 {
                    break;
                }
                encoder.write_all(&buffer[..read])?;
            }
            encoder.finish()?.flush()?;
            fs::rename(&tmp_path, &gz_path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress '{}'", path.display()),
                e,
            ));
        }

        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[LOGGER WARNING] Compressed '{}' but could not remove the original: {}",
                path.display(),
                e
            );
        }
        Ok(())
    }
}

impl Backend for RotatingFileBackend {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.should_rotate() {
            if let Err(e) = self.rotate() {
                eprintln!("[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.", e);
                if self.writer.is_none() {
                    let (file, size, last_rotation) = Self::open(&self.base_path)?;
                    self.writer = Some(BufWriter::new(file));
                    self.current_size = size;
                    self.last_rotation = last_rotation;
                }
                // Avoid retrying the failed rotation on every batch
                self.current_size = 0;
                self.last_rotation = SystemTime::now();
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::other("Rotating file writer not initialized"))?;
        writer.write_all(bytes)?;
        self.current_size += bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

impl Drop for RotatingFileBackend {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    fn batch(i: usize) -> Vec<u8> {
        format!("Test message number {}\n", i).into_bytes()
    }

    #[test]
    fn test_policy_validation() {
        let bad_hour = RotationPolicy::new().with_strategy(RotationStrategy::Daily { hour: 24 });
        assert!(bad_hour.validate().is_err());

        let no_backups = RotationPolicy::new().with_max_backups(0);
        assert!(no_backups.validate().is_err());

        assert!(RotationPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_size_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rotation.log");
        let policy = RotationPolicy::new().with_max_size(100).with_max_backups(3);

        let mut backend = RotatingFileBackend::new(&path, policy).unwrap();
        for i in 0..20 {
            backend.write(&batch(i)).unwrap();
        }
        backend.flush().unwrap();

        assert!(backend.rotation_count() > 0);
        assert!(path.with_file_name("rotation.log.1").exists());
        assert!(!path.with_file_name("rotation.log.4").exists());
    }

    #[test]
    fn test_time_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("time.log");
        let policy = RotationPolicy::new().with_strategy(RotationStrategy::Time {
            interval: Duration::from_millis(50),
        });

        let mut backend = RotatingFileBackend::new(&path, policy).unwrap();
        backend.write(b"before\n").unwrap();
        thread::sleep(Duration::from_millis(80));
        backend.write(b"after\n").unwrap();
        backend.flush().unwrap();

        assert_eq!(fs::read_to_string(path.with_file_name("time.log.1")).unwrap(), "before\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
    }

    #[test]
    fn test_never_rotates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.log");
        let policy = RotationPolicy::new().with_strategy(RotationStrategy::Never);

        let mut backend = RotatingFileBackend::new(&path, policy).unwrap();
        for i in 0..100 {
            backend.write(&batch(i)).unwrap();
        }
        backend.flush().unwrap();

        assert_eq!(backend.rotation_count(), 0);
        assert!(!path.with_file_name("never.log.1").exists());
    }

    #[test]
    fn test_compressed_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gz.log");
        let policy = RotationPolicy::new()
            .with_max_size(10)
            .with_max_backups(2)
            .with_compression(true);

        let mut backend = RotatingFileBackend::new(&path, policy).unwrap();
        for i in 0..5 {
            backend.write(&batch(i)).unwrap();
        }
        backend.flush().unwrap();

        assert!(path.with_file_name("gz.log.1.gz").exists());
        assert!(path.with_file_name("gz.log.2.gz").exists());
        assert!(!path.with_file_name("gz.log.3.gz").exists());
        assert!(!path.with_file_name("gz.log.1").exists());

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(path.with_file_name("gz.log.1.gz")).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "Test message number 3\n");
    }
}
