// Staging area for multipart dataset uploads
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

/// One uploaded part: the client-supplied (possibly folder-relative) file
/// name plus its bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("no dataset files provided")]
    NoFiles,
    #[error("failed to download mock dataset: {0}")]
    MockFetch(#[source] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Uploaded files laid out on disk, ready for registry import.
///
/// The backing temp directory holds `real/`, `mock/` and a description file;
/// it is removed when this value drops, whether the import succeeded or not.
#[derive(Debug)]
pub struct StagedUpload {
    temp: TempDir,
}

impl StagedUpload {
    /// Write the uploaded parts into a fresh temp layout.
    ///
    /// Fails before any I/O when `files` is empty. Folder uploads arrive with
    /// the folder name prefixed to every part, so the top-level component is
    /// stripped when more than one remains; deeper structure is preserved.
    pub async fn materialize(
        files: &[UploadedFile],
        mock_files: &[UploadedFile],
        description: &str,
    ) -> Result<Self, StagingError> {
        if files.is_empty() {
            return Err(StagingError::NoFiles);
        }

        let temp = TempDir::new()?;
        let staged = Self { temp };

        tokio::fs::create_dir_all(staged.real_dir()).await?;
        for file in files {
            write_part(&staged.real_dir(), file).await?;
        }

        tokio::fs::create_dir_all(staged.mock_dir()).await?;
        for file in mock_files {
            write_part(&staged.mock_dir(), file).await?;
        }

        tokio::fs::write(staged.description_file(), description).await?;
        debug!("staged {} dataset file(s) under {}", files.len(), staged.temp.path().display());
        Ok(staged)
    }

    /// Private data tree as uploaded
    pub fn real_dir(&self) -> PathBuf {
        self.temp.path().join("real")
    }

    /// Mock data tree, either uploaded or filled by the fallback fetch
    pub fn mock_dir(&self) -> PathBuf {
        self.temp.path().join("mock")
    }

    /// Dataset description, written even when empty
    pub fn description_file(&self) -> PathBuf {
        self.temp.path().join("README.md")
    }
}

async fn write_part(base: &Path, file: &UploadedFile) -> Result<(), StagingError> {
    let rel = safe_relative(&strip_top_level(Path::new(&file.name)));
    let dest = base.join(rel);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&dest, &file.bytes).await?;
    debug!("staged upload part: {}", dest.display());
    Ok(())
}

/// Drop the shared folder prefix from a multi-component upload name.
/// Single-component names are kept as-is.
fn strip_top_level(path: &Path) -> PathBuf {
    let mut components = path.components();
    if path.components().count() > 1 {
        components.next();
    }
    components.as_path().to_path_buf()
}

/// Keep only normal components of a client-supplied name so `..` and rooted
/// names cannot write outside the staging directory.
fn safe_relative(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// Download the configured fallback mock dataset to `dest`.
///
/// Unlike preview sanitization this failure is fatal to the caller: a
/// dataset must not be registered with an empty mock side.
pub async fn fetch_mock_data(
    http: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), StagingError> {
    let response = http
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(StagingError::MockFetch)?;
    let bytes = response.bytes().await.map_err(StagingError::MockFetch)?;
    tokio::fs::write(dest, &bytes).await?;
    debug!("mock dataset downloaded to {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn strip_top_level_keeps_bare_names() {
        assert_eq!(strip_top_level(Path::new("a.csv")), PathBuf::from("a.csv"));
        assert_eq!(strip_top_level(Path::new("ds/a.csv")), PathBuf::from("a.csv"));
        assert_eq!(
            strip_top_level(Path::new("ds/sub/b.csv")),
            PathBuf::from("sub/b.csv")
        );
    }

    #[test]
    fn safe_relative_drops_parent_components() {
        assert_eq!(
            safe_relative(Path::new("../../etc/passwd")),
            PathBuf::from("etc/passwd")
        );
        assert_eq!(safe_relative(Path::new("/abs/x.csv")), PathBuf::from("abs/x.csv"));
    }

    #[tokio::test]
    async fn materialize_lays_out_real_mock_and_description() {
        let staged = StagedUpload::materialize(
            &[
                part("sales/train.csv", b"a,b\n1,2\n"),
                part("sales/sub/extra.csv", b"c\n"),
            ],
            &[part("sales_mock.csv", b"a,b\n9,9\n")],
            "Quarterly sales",
        )
        .await
        .unwrap();

        assert_eq!(
            std::fs::read(staged.real_dir().join("train.csv")).unwrap(),
            b"a,b\n1,2\n"
        );
        assert_eq!(
            std::fs::read(staged.real_dir().join("sub/extra.csv")).unwrap(),
            b"c\n"
        );
        assert_eq!(
            std::fs::read(staged.mock_dir().join("sales_mock.csv")).unwrap(),
            b"a,b\n9,9\n"
        );
        assert_eq!(
            std::fs::read_to_string(staged.description_file()).unwrap(),
            "Quarterly sales"
        );
    }

    #[tokio::test]
    async fn materialize_rejects_empty_upload() {
        let result = StagedUpload::materialize(&[], &[], "desc").await;
        assert!(matches!(result, Err(StagingError::NoFiles)));
    }

    #[tokio::test]
    async fn staging_dir_is_removed_on_drop() {
        let staged = StagedUpload::materialize(&[part("one.csv", b"1\n")], &[], "")
            .await
            .unwrap();
        let root = staged.temp.path().to_path_buf();
        assert!(root.exists());
        drop(staged);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn empty_description_still_writes_file() {
        let staged = StagedUpload::materialize(&[part("one.csv", b"1\n")], &[], "")
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(staged.description_file()).unwrap(), "");
    }
}
