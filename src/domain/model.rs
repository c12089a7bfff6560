use serde::{Deserialize, Serialize};

/// Which model file is loaded. There is exactly one per process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelId {
    /// File stem, shown on the config endpoint (e.g. "best").
    pub name: String,
    pub onnx_path: String,
}

/// The model's own post-processing. Defaults mirror the stock YOLO predictor,
/// so the service itself adds no extra filtering on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    /// Square network input side, in pixels.
    pub input_size: u32,
    /// Candidates scoring at or below this are discarded before NMS.
    pub conf_threshold: f32,
    /// Same-class boxes overlapping more than this are suppressed.
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub model: ModelId,
    pub params: YoloParams,
}
