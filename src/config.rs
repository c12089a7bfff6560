//! Application configuration, loaded from an optional TOML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::model::{InferenceConfig, ModelId, YoloParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind: String,
    /// Directory served as fallback for static assets
    pub static_dir: PathBuf,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8501".to_string(),
            static_dir: PathBuf::from("static"),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub onnx_path: PathBuf,
    /// Allow-list, one class name per line
    pub classes_file: PathBuf,
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
    pub use_cuda: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let yolo = YoloParams::default();
        Self {
            onnx_path: PathBuf::from("models/best.onnx"),
            classes_file: PathBuf::from("items.txt"),
            input_size: yolo.input_size,
            conf_threshold: yolo.conf_threshold,
            iou_threshold: yolo.iou_threshold,
            max_detections: yolo.max_detections,
            intra_threads: 4,
            use_cuda: false,
        }
    }
}

impl ModelConfig {
    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.input_size,
            conf_threshold: self.conf_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        }
    }

    pub fn inference_config(&self) -> InferenceConfig {
        let name = self
            .onnx_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yolo".to_string());
        InferenceConfig {
            model: ModelId { name, onnx_path: self.onnx_path.to_string_lossy().into_owned() },
            params: self.yolo_params(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Keep at most this many files in `dir`; 0 keeps everything
    pub max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("uploads"), max_files: 0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// TTF/OTF used for box captions. Empty: look for a system font.
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub uploads: UploadConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(path.to_path_buf(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.model;
        if !(0.0..=1.0).contains(&m.conf_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "conf_threshold must be between 0.0 and 1.0, got {}",
                m.conf_threshold
            )));
        }
        if !(0.0..=1.0).contains(&m.iou_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "iou_threshold must be between 0.0 and 1.0, got {}",
                m.iou_threshold
            )));
        }
        if m.input_size == 0 || m.input_size % 32 != 0 {
            return Err(ConfigError::InvalidValue(format!(
                "input_size must be a positive multiple of 32 (the model stride), got {}",
                m.input_size
            )));
        }
        if m.max_detections == 0 {
            return Err(ConfigError::InvalidValue("max_detections must be greater than 0".into()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue("max_upload_bytes must be greater than 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileReadError(PathBuf, std::io::Error),

    #[error("Config parse error: {0}")]
    ParseError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
