//! Runtime settings read from the environment.

use std::path::PathBuf;

/// Minimum confidence for a detection to be reported.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

const DEFAULT_MODEL_DIR: &str = "models/yolo";
const DEFAULT_WEIGHTS: &str = "models/weights/best.onnx";
const DEFAULT_LOG_FILE: &str = "neuroscan.log";
const DEFAULT_INTRA_THREADS: usize = 4;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "file" => Some(Self::File),
            "stdout" => Some(Self::Stdout),
            _ => None,
        }
    }

    /// Whether to log to a file given terminal interactivity.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Format of exported reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Html,
}

impl ReportFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Application settings.
///
/// Supported variables:
/// - NEUROSCAN_MODEL_DIR (model definition directory)
/// - NEUROSCAN_WEIGHTS (ONNX weights file)
/// - NEUROSCAN_SAMPLE_IMAGE (image opened by "Load Sample")
/// - NEUROSCAN_EXPORT_DIR (default export location)
/// - NEUROSCAN_REPORT_FORMAT="pdf|html"
/// - NEUROSCAN_INTRA_THREADS
/// - NEUROSCAN_LOG_MODE="auto|file|stdout", NEUROSCAN_LOG_FILE
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model_dir: PathBuf,
    pub weights: PathBuf,
    pub sample_image: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub report_format: ReportFormat,
    pub intra_threads: usize,
    pub confidence_threshold: f32,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            weights: PathBuf::from(DEFAULT_WEIGHTS),
            sample_image: None,
            export_dir: PathBuf::from("."),
            report_format: ReportFormat::Pdf,
            intra_threads: DEFAULT_INTRA_THREADS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    /// Read settings from process environment variables.
    ///
    /// Returns the settings and one message per ignored value. Settings are
    /// read before logging is configured, so the caller logs the messages.
    #[must_use]
    pub fn from_env() -> (Self, Vec<String>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (best-effort; invalid
    /// values fall back to defaults and are reported).
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let mut ignored = Vec::new();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = non_empty("NEUROSCAN_MODEL_DIR") {
            cfg.model_dir = PathBuf::from(v);
        }

        if let Some(v) = non_empty("NEUROSCAN_WEIGHTS") {
            cfg.weights = PathBuf::from(v);
        }

        cfg.sample_image = non_empty("NEUROSCAN_SAMPLE_IMAGE").map(PathBuf::from);

        if let Some(v) = non_empty("NEUROSCAN_EXPORT_DIR") {
            cfg.export_dir = PathBuf::from(v);
        }

        if let Some(v) = non_empty("NEUROSCAN_INTRA_THREADS") {
            match v.parse::<usize>() {
                Ok(n) if n > 0 => cfg.intra_threads = n,
                _ => ignored.push(format!("Ignoring invalid NEUROSCAN_INTRA_THREADS={v:?}")),
            }
        }

        if let Some(v) = non_empty("NEUROSCAN_REPORT_FORMAT") {
            match ReportFormat::parse(&v) {
                Some(format) => cfg.report_format = format,
                None => ignored.push(format!("Ignoring invalid NEUROSCAN_REPORT_FORMAT={v:?}")),
            }
        }

        if let Some(v) = non_empty("NEUROSCAN_LOG_MODE") {
            match LogMode::parse(&v) {
                Some(mode) => cfg.log_mode = mode,
                None => ignored.push(format!("Ignoring invalid NEUROSCAN_LOG_MODE={v:?}")),
            }
        }

        if let Some(v) = non_empty("NEUROSCAN_LOG_FILE") {
            cfg.log_file = PathBuf::from(v);
        }

        (cfg, ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with_warnings(pairs: &[(&str, &str)]) -> (Settings, Vec<String>) {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        settings_with_warnings(pairs).0
    }

    #[test]
    fn test_defaults() {
        let cfg = settings(&[]);
        assert_eq!(cfg, Settings::default());
        assert_eq!(cfg.model_dir, PathBuf::from("models/yolo"));
        assert_eq!(cfg.weights, PathBuf::from("models/weights/best.onnx"));
        assert!(cfg.sample_image.is_none());
        assert_eq!(cfg.report_format, ReportFormat::Pdf);
        assert!((cfg.confidence_threshold - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overrides() {
        let cfg = settings(&[
            ("NEUROSCAN_MODEL_DIR", "/opt/model"),
            ("NEUROSCAN_WEIGHTS", "/opt/model/w.onnx"),
            ("NEUROSCAN_SAMPLE_IMAGE", "samples/axial.png"),
            ("NEUROSCAN_INTRA_THREADS", "2"),
            ("NEUROSCAN_LOG_MODE", "STDOUT"),
            ("NEUROSCAN_REPORT_FORMAT", "html"),
        ]);
        assert_eq!(cfg.report_format, ReportFormat::Html);
        assert_eq!(cfg.model_dir, PathBuf::from("/opt/model"));
        assert_eq!(cfg.weights, PathBuf::from("/opt/model/w.onnx"));
        assert_eq!(cfg.sample_image, Some(PathBuf::from("samples/axial.png")));
        assert_eq!(cfg.intra_threads, 2);
        assert_eq!(cfg.log_mode, LogMode::Stdout);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let (cfg, ignored) = settings_with_warnings(&[
            ("NEUROSCAN_INTRA_THREADS", "0"),
            ("NEUROSCAN_SAMPLE_IMAGE", "  "),
            ("NEUROSCAN_REPORT_FORMAT", "docx"),
            ("NEUROSCAN_LOG_MODE", "syslog"),
        ]);
        assert_eq!(cfg.intra_threads, 4);
        assert!(cfg.sample_image.is_none());
        assert_eq!(cfg.report_format, ReportFormat::Pdf);
        assert_eq!(cfg.log_mode, LogMode::Auto);

        assert_eq!(ignored.len(), 3);
        assert!(ignored[0].contains("NEUROSCAN_INTRA_THREADS=\"0\""));
        assert!(ignored[1].contains("NEUROSCAN_REPORT_FORMAT"));
        assert!(ignored[2].contains("NEUROSCAN_LOG_MODE"));
    }

    #[test]
    fn test_valid_values_report_nothing() {
        let (_, ignored) = settings_with_warnings(&[("NEUROSCAN_INTRA_THREADS", "8"), ("NEUROSCAN_LOG_MODE", "auto")]);
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_log_mode_selection() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }
}
