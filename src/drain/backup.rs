//! Append-only drain backups
//!
//! Every drain cycle writes its batch to a uniquely named file before any
//! destructive step runs. One serialized record per line, so a partial write
//! still leaves every completed line recoverable.

use crate::records::MetadataRecord;
use chrono::Utc;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes one backup file per drained batch
pub struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Persists the batch to a new backup file and returns its path
    pub fn write_batch(&self, records: &[MetadataRecord]) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;

        let filename = format!(
            "metadata_backup_{}_{}.json",
            Uuid::new_v4().simple(),
            Utc::now().format("%Y%m%d_%H%M")
        );
        let path = self.dir.join(filename);

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        tracing::info!("Backed up {} records to {}", records.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn records(n: usize) -> Vec<MetadataRecord> {
        (0..n)
            .map(|i| {
                MetadataRecord::new(
                    &format!("https://shop.example.com/p/{i}"),
                    "shop.example.com",
                    &format!("/data/shop.example.com/{i}.html"),
                    Some(200),
                    "success",
                )
            })
            .collect()
    }

    #[test]
    fn batch_lands_one_record_per_line() {
        let dir = TempDir::new().unwrap();
        let writer = BackupWriter::new(dir.path());

        let batch = records(5);
        let path = writer.write_batch(&batch).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 5);
        for (line, record) in lines.iter().zip(&batch) {
            let parsed: MetadataRecord = serde_json::from_str(line).unwrap();
            assert_eq!(&parsed, record);
        }
    }

    #[test]
    fn consecutive_batches_get_distinct_files() {
        let dir = TempDir::new().unwrap();
        let writer = BackupWriter::new(dir.path());

        let first = writer.write_batch(&records(2)).unwrap();
        let second = writer.write_batch(&records(2)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/backups");
        let writer = BackupWriter::new(&nested);

        let path = writer.write_batch(&records(1)).unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }
}
