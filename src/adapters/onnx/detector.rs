use async_trait::async_trait;
use image::{ImageError, RgbImage};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::adapters::render::annotate::Annotator;
use crate::application::ports::{DetectorOutput, DetectorPort};
use crate::domain::{
    errors::{DomainError, DomainResult},
    model::YoloParams,
};

/// Adaptador que expone el motor YOLO como `DetectorPort`.
///
/// El modelo se carga una sola vez y se comparte entre peticiones; `Session::run`
/// necesita `&mut`, así que cada inferencia toma el mutex.
pub struct OnnxDetector {
    engine: Arc<Mutex<OnnxYoloEngine>>,
    params: YoloParams,
    annotator: Arc<Annotator>,
}

impl OnnxDetector {
    pub fn new(engine: OnnxYoloEngine, params: YoloParams, annotator: Annotator) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            params,
            annotator: Arc::new(annotator),
        }
    }

    pub fn label_count(&self) -> usize {
        self.engine.lock().map(|e| e.labels().len()).unwrap_or(0)
    }
}

#[async_trait]
impl DetectorPort for OnnxDetector {
    async fn detect(&self, image_path: &Path) -> DomainResult<DetectorOutput> {
        let path: PathBuf = image_path.to_path_buf();
        let engine = self.engine.clone();
        let annotator = self.annotator.clone();
        let params = self.params.clone();

        // Inferencia bloqueante fuera del runtime async.
        tokio::task::spawn_blocking(move || -> DomainResult<DetectorOutput> {
            let original = open_image(&path)?;

            let t_infer_start = Instant::now();
            let detections = {
                let mut eng = engine
                    .lock()
                    .map_err(|_| DomainError::OperationFailed("model lock poisoned".into()))?;
                eng.infer(&original, &params).map_err(|e| {
                    error!("Inference error on {}: {:?}", path.display(), e);
                    DomainError::Inference(e.to_string())
                })?
            };
            let infer_ms = t_infer_start.elapsed().as_secs_f32() * 1000.0;
            debug!(detections = detections.len(), infer_ms, "Model returned");

            let annotated = annotator.annotate(&original, &detections);
            Ok(DetectorOutput { original, annotated, detections, infer_ms })
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("inference task: {e}")))?
    }
}

/// Abre la imagen guardada. Si el fichero ya no existe es un fallo de
/// almacenamiento, no de decodificación.
pub fn open_image(path: &Path) -> DomainResult<RgbImage> {
    match image::open(path) {
        Ok(img) => Ok(img.to_rgb8()),
        Err(ImageError::IoError(e)) if e.kind() == ErrorKind::NotFound => Err(DomainError::Storage(
            format!("stored upload disappeared: {}", path.display()),
        )),
        Err(e) => Err(DomainError::ImageDecode(format!("{}: {e}", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_image(&dir.path().join("gone.png")).unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)), "{err:?}");
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = open_image(&path).unwrap_err();
        assert!(matches!(err, DomainError::ImageDecode(_)), "{err:?}");
    }

    #[test]
    fn decodes_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        RgbImage::from_pixel(4, 3, image::Rgb([1, 2, 3])).save(&path).unwrap();
        assert_eq!(open_image(&path).unwrap().dimensions(), (4, 3));
    }
}
