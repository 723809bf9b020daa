//! Sysfs GPIO reed switch input
//!
//! Uses the legacy `/sys/class/gpio` interface: the pin is exported and set
//! as input on open, its `value` file is polled while waiting for a rising
//! edge, and it is unexported on release. The sysfs root is configurable so
//! the sensor can be exercised against a plain directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use contracts::{CatmonError, Level, SensorSettings, SensorSource, SensorTransition};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Reed switch on a sysfs GPIO pin
pub struct SysfsGpioSensor {
    pin: u32,
    root: PathBuf,
    poll_interval: Duration,
    /// Whether `open` exported the pin (and so `release` must unexport it)
    exported: bool,
    released: bool,
    last_level: Level,
    last_edge: Option<Instant>,
}

impl SysfsGpioSensor {
    /// Export the pin (if needed), configure it as input and sample it once
    ///
    /// # Errors
    /// `SensorRead` if the pin cannot be exported, configured or read
    pub async fn open(settings: &SensorSettings) -> Result<Self, CatmonError> {
        let pin = settings.pin;
        let root = settings.gpio_root.clone();
        let pin_dir = root.join(format!("gpio{pin}"));

        let mut exported = false;
        if !pin_dir.exists() {
            write_sysfs(pin, &root.join("export"), &pin.to_string()).await?;
            exported = true;
        }

        let mut sensor = Self {
            pin,
            root,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            exported,
            released: false,
            last_level: Level::Low,
            last_edge: None,
        };
        let ready = async {
            write_sysfs(pin, &pin_dir.join("direction"), "in").await?;
            sensor.sample().await
        }
        .await;
        match ready {
            Ok(level) => sensor.last_level = level,
            Err(e) => {
                // A pin exported here must not outlive the failed open
                if exported {
                    sensor.unexport().await;
                }
                return Err(e);
            }
        }

        info!(
            pin,
            level = %sensor.last_level,
            exported,
            "reed switch input ready"
        );
        Ok(sensor)
    }

    fn value_path(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin)).join("value")
    }

    async fn unexport(&self) {
        let unexport = self.root.join("unexport");
        if let Err(e) = write_sysfs(self.pin, &unexport, &self.pin.to_string()).await {
            warn!(pin = self.pin, error = %e, "failed to unexport pin");
        }
    }

    async fn sample(&self) -> Result<Level, CatmonError> {
        if self.released {
            return Err(CatmonError::sensor_read(self.pin, "pin already released"));
        }
        let raw = tokio::fs::read_to_string(self.value_path())
            .await
            .map_err(|e| CatmonError::sensor_read(self.pin, e.to_string()))?;
        parse_level(self.pin, &raw)
    }
}

fn parse_level(pin: u32, raw: &str) -> Result<Level, CatmonError> {
    match raw.trim() {
        "0" => Ok(Level::Low),
        "1" => Ok(Level::High),
        other => Err(CatmonError::sensor_read(
            pin,
            format!("unexpected value '{other}'"),
        )),
    }
}

async fn write_sysfs(pin: u32, path: &Path, value: &str) -> Result<(), CatmonError> {
    tokio::fs::write(path, value)
        .await
        .map_err(|e| CatmonError::sensor_read(pin, format!("write {}: {e}", path.display())))
}

impl SensorSource for SysfsGpioSensor {
    fn pin(&self) -> u32 {
        self.pin
    }

    #[instrument(name = "gpio_wait_for_edge", skip(self), fields(pin = self.pin))]
    async fn wait_for_edge(
        &mut self,
        bounce: Duration,
    ) -> Result<Option<SensorTransition>, CatmonError> {
        loop {
            tokio::time::sleep(self.poll_interval).await;
            let level = self.sample().await?;
            let previous = std::mem::replace(&mut self.last_level, level);

            if previous == Level::Low && level == Level::High {
                let now = Instant::now();
                if let Some(last) = self.last_edge {
                    if now.duration_since(last) < bounce {
                        debug!("edge inside bounce window ignored");
                        continue;
                    }
                }
                self.last_edge = Some(now);
                return Ok(Some(SensorTransition::rising(Local::now())));
            }
        }
    }

    async fn read(&self) -> Result<Level, CatmonError> {
        self.sample().await
    }

    async fn release(&mut self) -> Result<(), CatmonError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        if self.exported {
            let unexport = self.root.join("unexport");
            if let Err(e) = write_sysfs(self.pin, &unexport, &self.pin.to_string()).await {
                warn!(pin = self.pin, error = %e, "failed to unexport pin");
                return Err(e);
            }
        }
        info!(pin = self.pin, "reed switch input released");
        Ok(())
    }
}
