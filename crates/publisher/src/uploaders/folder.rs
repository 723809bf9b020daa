//! FolderUploader - copies images into `<root>/<destination id>/`

use contracts::{CapturedImage, CatmonError, Destination, UploadService};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FolderUploader
#[derive(Debug, Clone)]
pub struct FolderUploaderConfig {
    /// Directory holding one sub-folder per destination id
    pub root: PathBuf,
}

impl FolderUploaderConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let root = params
            .get("root")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./uploads"));

        Self { root }
    }
}

/// Upload service backed by a local (or mounted) directory tree
pub struct FolderUploader {
    name: String,
    config: FolderUploaderConfig,
    created_dirs: HashSet<PathBuf>,
}

impl FolderUploader {
    /// Create a new FolderUploader
    pub fn new(name: impl Into<String>, config: FolderUploaderConfig) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.root)?;

        Ok(Self {
            name: name.into(),
            config,
            created_dirs: HashSet::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FolderUploaderConfig::from_params(params))
    }

    /// Final location of an image uploaded to `destination`
    pub fn target_path(&self, image: &CapturedImage, destination: &Destination) -> PathBuf {
        self.config
            .root
            .join(&destination.id)
            .join(image.id.as_str())
    }

    async fn copy_into(
        &mut self,
        image: &CapturedImage,
        destination: &Destination,
    ) -> std::io::Result<PathBuf> {
        let dir = self.config.root.join(&destination.id);
        if !self.created_dirs.contains(&dir) {
            tokio::fs::create_dir_all(&dir).await?;
            self.created_dirs.insert(dir);
        }
        let target = self.target_path(image, destination);
        tokio::fs::copy(&image.path, &target).await?;
        Ok(target)
    }
}

impl UploadService for FolderUploader {
    fn name(&self) -> &str {
        &self.name
    }

    fn credentials_expired(&self) -> bool {
        false
    }

    async fn refresh_credentials(&mut self) -> Result<(), CatmonError> {
        Ok(())
    }

    #[instrument(
        name = "folder_upload",
        skip(self, image, destination),
        fields(uploader = %self.name, image = %image.id, folder = %destination.name)
    )]
    async fn upload(
        &mut self,
        image: &CapturedImage,
        destination: &Destination,
    ) -> Result<(), CatmonError> {
        match self.copy_into(image, destination).await {
            Ok(target) => {
                debug!(target = %target.display(), "image copied");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "copy failed");
                Err(CatmonError::upload(
                    image.id.as_str(),
                    &destination.name,
                    e.to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AcquisitionMetadata;
    use tempfile::TempDir;

    fn image_in(dir: &TempDir, name: &str) -> CapturedImage {
        let path = dir.path().join(name);
        std::fs::write(&path, b"jpeg").unwrap();
        CapturedImage {
            id: name.into(),
            path,
            metadata: AcquisitionMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_upload_copies_into_destination_folder() {
        let src = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let params = HashMap::from([("root".to_string(), root.path().display().to_string())]);
        let mut uploader = FolderUploader::from_params("folder", &params).unwrap();

        let image = image_in(&src, "2023-10-14_181503.jpg");
        let dest = Destination::new("catmon_boo", "folder-boo");
        uploader.upload(&image, &dest).await.unwrap();

        let target = root.path().join("folder-boo/2023-10-14_181503.jpg");
        assert_eq!(std::fs::read(target).unwrap(), b"jpeg");
        assert!(!uploader.credentials_expired());
    }

    #[tokio::test]
    async fn test_missing_source_is_upload_error() {
        let root = TempDir::new().unwrap();
        let mut uploader = FolderUploader::new(
            "folder",
            FolderUploaderConfig {
                root: root.path().to_path_buf(),
            },
        )
        .unwrap();
        let image = CapturedImage {
            id: "gone.jpg".into(),
            path: root.path().join("gone.jpg"),
            metadata: AcquisitionMetadata::default(),
        };
        let err = uploader
            .upload(&image, &Destination::new("catmon", "folder-default"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatmonError::Upload { .. }));
        assert!(err.to_string().contains("catmon"));
    }

    #[test]
    fn test_default_root() {
        let config = FolderUploaderConfig::from_params(&HashMap::new());
        assert_eq!(config.root, PathBuf::from("./uploads"));
    }
}
