use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use accident_detect::adapters::fs::upload_store::LocalUploadStore;
use accident_detect::adapters::http::state::HttpState;
use accident_detect::adapters::onnx::detector::open_image;
use accident_detect::application::ports::{DetectorOutput, DetectorPort, ModelCatalogPort};
use accident_detect::application::services::{CatalogService, DetectionService};
use accident_detect::domain::allow_list::AllowList;
use accident_detect::domain::detection::Detection;
use accident_detect::domain::errors::{DomainError, DomainResult};
use accident_detect::domain::model::{InferenceConfig, ModelId, YoloParams};

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Stand-in for the ONNX model. It decodes the stored file and answers
/// according to the colour of the first pixel, so results depend on the
/// bytes actually on disk:
/// red: car 0.8734 + person 0.91, blue: truck 0.5, anything else: nothing.
pub struct ColorDetector;

fn det(label: &str, class_id: usize, score: f32) -> Detection {
    Detection { x1: 12.345, y1: 6.789, x2: 100.004, y2: 80.5, score, class_id, label: label.into() }
}

#[async_trait]
impl DetectorPort for ColorDetector {
    async fn detect(&self, image_path: &Path) -> DomainResult<DetectorOutput> {
        let original = open_image(image_path)?;

        let first = *original.get_pixel(0, 0);
        let detections = if first == RED {
            vec![det("car", 0, 0.8734), det("person", 2, 0.91)]
        } else if first == BLUE {
            vec![det("truck", 1, 0.5)]
        } else {
            vec![]
        };

        Ok(DetectorOutput { annotated: original.clone(), original, detections, infer_ms: 1.5 })
    }
}

/// Waits before touching the file, so concurrent uploads overlap.
pub struct SlowDetector(pub Duration);

#[async_trait]
impl DetectorPort for SlowDetector {
    async fn detect(&self, image_path: &Path) -> DomainResult<DetectorOutput> {
        tokio::time::sleep(self.0).await;
        ColorDetector.detect(image_path).await
    }
}

pub struct StubCatalog(pub DomainResult<()>);

#[async_trait]
impl ModelCatalogPort for StubCatalog {
    async fn validate_model(&self, _model: &ModelId) -> DomainResult<()> {
        match &self.0 {
            Ok(()) => Ok(()),
            Err(e) => Err(DomainError::NotFound(e.to_string())),
        }
    }
}

pub fn png_bytes(color: Rgb<u8>) -> Vec<u8> {
    let img = RgbImage::from_pixel(32, 24, color);
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

pub struct Harness {
    pub tmp: TempDir,
    pub service: Arc<DetectionService>,
    pub state: HttpState,
}

impl Harness {
    pub fn new(classes: &str) -> Self {
        Self::with_catalog(classes, Ok(()))
    }

    pub fn with_catalog(classes: &str, model_check: DomainResult<()>) -> Self {
        Self::build(classes, model_check, Arc::new(ColorDetector), 0)
    }

    /// Harness whose upload store keeps at most `max_files` files.
    pub fn with_retention(classes: &str, detector: Arc<dyn DetectorPort>, max_files: usize) -> Self {
        Self::build(classes, Ok(()), detector, max_files)
    }

    fn build(
        classes: &str,
        model_check: DomainResult<()>,
        detector: Arc<dyn DetectorPort>,
        max_files: usize,
    ) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let allow_list = Arc::new(AllowList::parse(classes));
        let uploads = Arc::new(LocalUploadStore::new(tmp.path().join("uploads"), max_files));
        let service = Arc::new(DetectionService::new(uploads, detector, allow_list.clone()));

        let inference = InferenceConfig {
            model: ModelId { name: "best".into(), onnx_path: "models/best.onnx".into() },
            params: YoloParams::default(),
        };
        let catalog = Arc::new(CatalogService::new(
            allow_list,
            inference,
            3,
            Arc::new(StubCatalog(model_check)),
        ));

        let state = HttpState { detection: service.clone(), catalog };
        Self { tmp, service, state }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.tmp.path().join("uploads")
    }
}
