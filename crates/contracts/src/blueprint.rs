//! MonitorBlueprint - Config Loader output
//!
//! Describes the whole process configuration: sensor, capture device,
//! classifier, routing table, publishers and simulation switches.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::{Destination, SimulationConfig};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete process configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitorBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    #[validate(nested)]
    pub sensor: SensorSettings,

    #[serde(default)]
    #[validate(nested)]
    pub capture: CaptureSettings,

    #[serde(default)]
    #[validate(nested)]
    pub classify: ClassifySettings,

    /// Label -> destination / notification text table
    #[validate(nested)]
    pub routing: RoutingTable,

    #[serde(default)]
    pub upload: UploadSettings,

    #[serde(default)]
    pub notify: NotifySettings,

    #[serde(default)]
    #[validate(nested)]
    pub simulation: SimulationSettings,
}

impl MonitorBlueprint {
    /// Derive the EventGate configuration
    pub fn to_gate_config(&self) -> GateConfig {
        GateConfig {
            bounce: Duration::from_millis(self.sensor.bounce_ms),
            event_gap: Duration::from_secs(self.sensor.event_gap_secs),
        }
    }

    /// Derive the immutable simulation switches
    pub fn to_simulation_config(&self) -> SimulationConfig {
        SimulationConfig::new(self.simulation.no_sensor, self.simulation.simulate_capture)
    }
}

// ============================================================================
// Sensor
// ============================================================================

/// Sensor backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorBackend {
    /// Linux sysfs GPIO (`/sys/class/gpio`)
    #[default]
    Gpio,
    /// No sensor attached; any wait fails with `SensorRead`
    Disconnected,
}

/// Reed switch input settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensorSettings {
    #[serde(default)]
    pub backend: SensorBackend,

    /// BCM pin number of the reed switch input
    #[serde(default = "default_pin")]
    pub pin: u32,

    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,

    /// Level polling interval while waiting for an edge (ms)
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 1, max = 1000))]
    pub poll_interval_ms: u64,

    /// Ignore switch activity for this long after an edge (ms)
    #[serde(default = "default_bounce_ms")]
    #[validate(range(max = 10_000))]
    pub bounce_ms: u64,

    /// Minimum gap between two admitted events (s)
    #[serde(default = "default_event_gap_secs")]
    #[validate(range(min = 1))]
    pub event_gap_secs: u64,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            backend: SensorBackend::default(),
            pin: default_pin(),
            gpio_root: default_gpio_root(),
            poll_interval_ms: default_poll_interval_ms(),
            bounce_ms: default_bounce_ms(),
            event_gap_secs: default_event_gap_secs(),
        }
    }
}

fn default_pin() -> u32 {
    23
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_bounce_ms() -> u64 {
    400
}

fn default_event_gap_secs() -> u64 {
    5
}

/// EventGate timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    /// Delay before re-sampling the level after an edge
    pub bounce: Duration,
    /// Minimum time between admitted events
    pub event_gap: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            bounce: Duration::from_millis(default_bounce_ms()),
            event_gap: Duration::from_secs(default_event_gap_secs()),
        }
    }
}

// ============================================================================
// Capture / Classify
// ============================================================================

/// Capture backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBackend {
    /// External still-capture command
    #[default]
    Command,
    /// Synthetic grey frame, no camera required
    Mock,
}

/// Capture settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CaptureSettings {
    #[serde(default)]
    pub backend: CaptureBackend,

    /// Directory images are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Wait this long after the event before taking the picture (ms)
    #[serde(default = "default_pre_delay_ms")]
    #[validate(range(max = 60_000))]
    pub pre_delay_ms: u64,

    /// argv of the capture command; `{output}` is replaced by the image path
    #[serde(default = "default_capture_command")]
    pub command: Vec<String>,
}

impl CaptureSettings {
    pub fn pre_delay(&self) -> Duration {
        Duration::from_millis(self.pre_delay_ms)
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            backend: CaptureBackend::default(),
            output_dir: default_output_dir(),
            pre_delay_ms: default_pre_delay_ms(),
            command: default_capture_command(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_pre_delay_ms() -> u64 {
    990
}

fn default_capture_command() -> Vec<String> {
    [
        "rpicam-still",
        "--nopreview",
        "--immediate",
        "--width",
        "640",
        "--height",
        "480",
        "--hflip",
        "--quality",
        "95",
        "--exposure",
        "sport",
        "--metadata",
        "-",
        "--metadata-format",
        "json",
        "-o",
        "{output}",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Classifier backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierBackend {
    /// External command printing `{label, confidence, model}` JSON
    #[default]
    Command,
    /// Fixed answer from `params` (label / confidence / model)
    Mock,
}

/// Classification settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClassifySettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: ClassifierBackend,

    /// argv of the classifier command; `{image}` is replaced by the image path
    #[serde(default)]
    pub command: Vec<String>,

    /// Backend specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: ClassifierBackend::default(),
            command: Vec::new(),
            params: HashMap::new(),
        }
    }
}

// ============================================================================
// Routing
// ============================================================================

/// A known subject the classifier can recognise
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubjectProfile {
    /// Label emitted by the classifier
    #[validate(length(min = 1))]
    pub label: String,

    /// Name used in the likelihood sentence
    #[validate(length(min = 1))]
    pub display_name: String,

    /// Text following the greeting, e.g. "Boo, aka Fluff Bag!"
    #[validate(length(min = 1))]
    pub salutation: String,

    #[validate(nested)]
    pub destination: Destination,
}

/// Routing table: one destination per route key plus notification wording
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoutingTable {
    /// Fixed tag closing every notification
    #[serde(default = "default_notification_tag")]
    pub notification_tag: String,

    /// Classifier name used in the likelihood sentence
    #[serde(default = "default_classifier_name")]
    pub classifier_name: String,

    /// Text following the greeting for unrecognised subjects
    #[serde(default = "default_unknown_salutation")]
    pub unknown_salutation: String,

    /// Destination when classification is disabled
    #[validate(nested)]
    pub default: Destination,

    /// Destination for the `unknown` label
    #[validate(nested)]
    pub unknown: Destination,

    #[validate(nested)]
    pub subject_a: SubjectProfile,

    #[validate(nested)]
    pub subject_b: SubjectProfile,
}

fn default_notification_tag() -> String {
    "Auto-tweet from catmon2:".to_string()
}

fn default_classifier_name() -> String {
    "Catmonic".to_string()
}

fn default_unknown_salutation() -> String {
    "cat of mystery!".to_string()
}

// ============================================================================
// Publishers
// ============================================================================

/// Upload backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadBackend {
    /// Copy into `<root>/<destination id>/`
    #[default]
    Folder,
    /// HTTP storage API with OAuth client-credentials token
    Http,
}

/// Upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: UploadBackend,

    /// Backend specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: UploadBackend::default(),
            params: HashMap::new(),
        }
    }
}

/// Notification backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyBackend {
    /// Write the notification to the log stream
    #[default]
    Log,
    /// POST JSON to a webhook
    Webhook,
}

/// Notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: NotifyBackend,

    /// Account the notifications are posted as
    #[serde(default = "default_account_name")]
    pub account_name: String,

    /// Backend specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: NotifyBackend::default(),
            account_name: default_account_name(),
            params: HashMap::new(),
        }
    }
}

fn default_account_name() -> String {
    "catmon".to_string()
}

// ============================================================================
// Simulation
// ============================================================================

/// Simulation switches and substitute image selection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulationSettings {
    #[serde(default)]
    pub no_sensor: bool,

    #[serde(default)]
    pub simulate_capture: bool,

    /// Glob selecting candidate substitute images
    #[serde(default = "default_substitute_pattern")]
    #[validate(length(min = 1))]
    pub substitute_pattern: String,

    /// Copy the chosen substitute next to the captures, with the test prefix
    #[serde(default = "default_true")]
    pub copy_to_local: bool,

    /// Prefix of every file generated while testing
    #[serde(default = "default_test_file_prefix")]
    #[validate(length(min = 1))]
    pub test_file_prefix: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            no_sensor: false,
            simulate_capture: false,
            substitute_pattern: default_substitute_pattern(),
            copy_to_local: true,
            test_file_prefix: default_test_file_prefix(),
        }
    }
}

fn default_substitute_pattern() -> String {
    "./images/unseen*".to_string()
}

fn default_test_file_prefix() -> String {
    "test_".to_string()
}

fn default_true() -> bool {
    true
}
