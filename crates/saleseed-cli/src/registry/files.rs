use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{RegistryError, RegistryResult};

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let data = serde_json::to_vec_pretty(value)?;
    let mut staged = StagedFile::create(path)?;
    staged.writer().write_all(&data)?;
    staged.commit()
}

/// File written under a temporary name and renamed into place on commit,
/// so readers never see a partial artifact.
pub struct StagedFile {
    path: PathBuf,
    tmp_path: PathBuf,
    file: BufWriter<File>,
}

impl StagedFile {
    pub fn create(path: &Path) -> RegistryResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }

        let tmp_path = temp_path(path)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp_path)?;
        Ok(Self {
            path: path.to_path_buf(),
            tmp_path,
            file: BufWriter::new(file),
        })
    }

    pub fn writer(&mut self) -> &mut BufWriter<File> {
        &mut self.file
    }

    pub fn commit(self) -> RegistryResult<()> {
        let file = self.file.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;
        std::fs::rename(&self.tmp_path, &self.path)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            sync_dir(parent)?;
        }
        Ok(())
    }

    /// Drops the temporary file without touching the target.
    pub fn discard(self) {
        let Self { tmp_path, file, .. } = self;
        drop(file);
        let _ = std::fs::remove_file(tmp_path);
    }
}

fn temp_path(path: &Path) -> RegistryResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| RegistryError::InvalidPath(path.display().to_string()))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("saleseed_cli_{label}_{}", uuid::Uuid::new_v4()));
        path
    }

    #[test]
    fn commit_moves_content_into_place() {
        let dir = temp_dir("commit");
        let path = dir.join("report.json");
        write_json_atomic(&path, &serde_json::json!({ "sales": 3 })).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"sales\": 3"));
        assert!(!dir.join("report.json.tmp").exists());
    }

    #[test]
    fn discard_leaves_target_untouched() {
        let dir = temp_dir("discard");
        let path = dir.join("out.csv");
        let mut staged = StagedFile::create(&path).unwrap();
        staged.writer().write_all(b"partial").unwrap();
        staged.discard();

        assert!(!path.exists());
        assert!(!dir.join("out.csv.tmp").exists());
    }
}
