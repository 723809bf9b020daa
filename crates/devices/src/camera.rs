//! Capture devices
//!
//! - `CommandCamera`: runs a still-capture command (`rpicam-still` by default)
//!   and parses the JSON metadata it prints on stdout
//! - `MockCamera`: writes a uniform grey JPEG, optionally failing on demand

use std::path::Path;

use contracts::{AcquisitionMetadata, CaptureDevice, CaptureSettings, CatmonError};
use tracing::{debug, info, instrument, warn};

use crate::command;

/// Placeholder in the capture argv replaced by the image path
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

fn image_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Camera driven by an external still-capture command
pub struct CommandCamera {
    name: String,
    argv: Vec<String>,
    stopped: bool,
}

impl CommandCamera {
    pub fn new(name: impl Into<String>, argv: Vec<String>) -> Self {
        Self {
            name: name.into(),
            argv,
            stopped: false,
        }
    }

    pub fn from_settings(settings: &CaptureSettings) -> Self {
        let name = settings
            .command
            .first()
            .cloned()
            .unwrap_or_else(|| "camera".to_string());
        Self::new(name, settings.command.clone())
    }
}

impl CaptureDevice for CommandCamera {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "camera_capture", skip(self), fields(camera = %self.name))]
    async fn capture_to(&mut self, path: &Path) -> Result<AcquisitionMetadata, CatmonError> {
        let image = image_name(path);
        if self.stopped {
            return Err(CatmonError::capture(image, "camera stopped"));
        }

        let argv = command::render_argv(&self.argv, OUTPUT_PLACEHOLDER, path);
        let output = command::run(&argv)
            .await
            .map_err(|message| CatmonError::capture(&image, message))?;

        if !path.is_file() {
            return Err(CatmonError::capture(
                image,
                "command succeeded but wrote no image",
            ));
        }
        if !output.stderr.trim().is_empty() {
            debug!(stderr = %output.stderr.trim(), "capture command diagnostics");
        }

        let metadata = match command::extract_json(&output.stdout) {
            Some(value) => AcquisitionMetadata::from_json(value),
            None => {
                warn!(image = %image, "capture command printed no metadata");
                AcquisitionMetadata::default()
            }
        };
        Ok(metadata)
    }

    async fn stop(&mut self) -> Result<(), CatmonError> {
        if !self.stopped {
            self.stopped = true;
            info!(camera = %self.name, "camera stopped");
        }
        Ok(())
    }
}

/// Synthetic camera for hardware-free runs and tests
pub struct MockCamera {
    width: u32,
    height: u32,
    luma: u8,
    lux: Option<f64>,
    fail_with: Option<String>,
    captures: u32,
    stopped: bool,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            luma: 128,
            lux: Some(250.0),
            fail_with: None,
            captures: 0,
            stopped: false,
        }
    }
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grey level of every pixel
    pub fn with_luma(mut self, luma: u8) -> Self {
        self.luma = luma;
        self
    }

    /// Make every capture fail with `message`
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Number of successful captures so far
    pub fn captures(&self) -> u32 {
        self.captures
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl CaptureDevice for MockCamera {
    fn name(&self) -> &str {
        "mock"
    }

    async fn capture_to(&mut self, path: &Path) -> Result<AcquisitionMetadata, CatmonError> {
        let image = image_name(path);
        if let Some(message) = &self.fail_with {
            return Err(CatmonError::capture(image, message.clone()));
        }

        let frame =
            image::RgbImage::from_pixel(self.width, self.height, image::Rgb([self.luma; 3]));
        frame
            .save_with_format(path, image::ImageFormat::Jpeg)
            .map_err(|e| CatmonError::capture(&image, e.to_string()))?;

        self.captures += 1;
        Ok(AcquisitionMetadata {
            lux: self.lux,
            exposure_time_us: Some(10_000),
            mean_luma: Some(f64::from(self.luma)),
            ..AcquisitionMetadata::default()
        })
    }

    async fn stop(&mut self) -> Result<(), CatmonError> {
        self.stopped = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn shell(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into(), "capture".into(), "{output}".into()]
    }

    #[tokio::test]
    async fn test_command_camera_parses_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2023-10-14_181503.jpg");
        // $1 is the rendered {output}
        let mut camera = CommandCamera::new(
            "sh",
            shell(r#"printf 'jpeg' > "$1"; echo '{"Lux": 212.5, "ExposureTime": 33302}'"#),
        );

        let meta = camera.capture_to(&path).await.unwrap();
        assert!(path.is_file());
        assert_eq!(meta.lux, Some(212.5));
        assert_eq!(meta.exposure_time_us, Some(33302));
    }

    #[tokio::test]
    async fn test_command_camera_no_file_is_capture_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.jpg");
        let mut camera = CommandCamera::new("sh", shell("true"));
        let err = camera.capture_to(&path).await.unwrap_err();
        assert!(matches!(err, CatmonError::Capture { .. }));
        assert!(err.to_string().contains("missing.jpg"));
    }

    #[tokio::test]
    async fn test_command_camera_refuses_after_stop() {
        let dir = TempDir::new().unwrap();
        let mut camera = CommandCamera::new("sh", shell(r#"printf x > "$1""#));
        camera.stop().await.unwrap();
        camera.stop().await.unwrap();
        assert!(camera.capture_to(&dir.path().join("a.jpg")).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_camera_writes_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mock.jpg");
        let mut camera = MockCamera::new().with_luma(40);

        let meta = camera.capture_to(&path).await.unwrap();
        assert_eq!(meta.mean_luma, Some(40.0));
        assert_eq!(camera.captures(), 1);
        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 64);
    }

    #[tokio::test]
    async fn test_mock_camera_failure_injection() {
        let dir = TempDir::new().unwrap();
        let mut camera = MockCamera::new().failing("sensor busy");
        let err = camera.capture_to(&dir.path().join("x.jpg")).await.unwrap_err();
        assert!(err.to_string().contains("sensor busy"));
        assert_eq!(camera.captures(), 0);
    }
}
