use serde::{Deserialize, Serialize};

/// Raw model output, in original image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
    pub label: String,
}

impl Detection {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &Detection) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// One filtered, rounded row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(rename = "Class")]
    pub class: String,
    #[serde(rename = "Confidence")]
    pub confidence: f64,
    #[serde(rename = "X_min")]
    pub x_min: f64,
    #[serde(rename = "Y_min")]
    pub y_min: f64,
    #[serde(rename = "X_max")]
    pub x_max: f64,
    #[serde(rename = "Y_max")]
    pub y_max: f64,
}

impl From<&Detection> for DetectionRecord {
    fn from(d: &Detection) -> Self {
        Self {
            class: d.label.clone(),
            confidence: round2(d.score),
            x_min: round2(d.x1),
            y_min: round2(d.y1),
            x_max: round2(d.x2),
            y_max: round2(d.y2),
        }
    }
}

/// Rounds to two decimal places, exact ties to even (same result as Python's
/// `round(x, 2)`). Scaling an `f32` by 100 in `f64` is exact, so a tie here is
/// a real tie of the stored value.
pub fn round2(v: f32) -> f64 {
    (v as f64 * 100.0).round_ties_even() / 100.0
}

/// Class-aware non-maximum suppression. Output is sorted by score, highest first,
/// and truncated to `max_detections`.
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len().min(max_detections));
    for det in detections {
        if keep.len() >= max_detections {
            break;
        }
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == det.class_id && k.iou(&det) > iou_threshold);
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}
