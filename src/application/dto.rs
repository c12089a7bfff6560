use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::domain::{detection::DetectionRecord, model::YoloParams};

pub const NO_DETECTIONS_MESSAGE: &str = "No accidents detected.";

/// Everything the Home view needs after one upload.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub filename: String,
    pub original: RgbImage,
    pub annotated: RgbImage,
    pub records: Vec<DetectionRecord>,
    pub raw_count: usize,
    pub infer_ms: f32,
}

impl DetectionReport {
    pub fn message(&self) -> Option<&'static str> {
        self.records.is_empty().then_some(NO_DETECTIONS_MESSAGE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub infer_ms: f32,
    pub detections: Vec<DetectionRecord>,
    pub message: Option<String>,
}

impl From<&DetectionReport> for DetectResponse {
    fn from(r: &DetectionReport) -> Self {
        Self {
            filename: r.filename.clone(),
            width: r.original.width(),
            height: r.original.height(),
            infer_ms: r.infer_ms,
            detections: r.records.clone(),
            message: r.message().map(String::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassesResponse {
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub model_path: String,
    pub label_count: usize,
    pub params: YoloParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}
