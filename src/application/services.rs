use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::{
        dto::DetectionReport,
        ports::{DetectorPort, ModelCatalogPort, UploadStorePort},
    },
    domain::{
        allow_list::AllowList,
        detection::{Detection, DetectionRecord},
        errors::{DomainError, DomainResult},
        model::InferenceConfig,
    },
};

/// Conserva las detecciones de la lista permitida, redondeadas para mostrarlas.
pub fn filter_detections(detections: &[Detection], allow_list: &AllowList) -> Vec<DetectionRecord> {
    detections
        .iter()
        .filter(|d| allow_list.contains(&d.label))
        .map(DetectionRecord::from)
        .collect()
}

/// Caso de uso principal: guardar la imagen subida, detectar y filtrar.
#[derive(Clone)]
pub struct DetectionService {
    uploads: Arc<dyn UploadStorePort>,
    detector: Arc<dyn DetectorPort>,
    allow_list: Arc<AllowList>,
}

impl DetectionService {
    pub fn new(
        uploads: Arc<dyn UploadStorePort>,
        detector: Arc<dyn DetectorPort>,
        allow_list: Arc<AllowList>,
    ) -> Self {
        Self { uploads, detector, allow_list }
    }

    pub async fn detect_upload(&self, filename: &str, bytes: &[u8]) -> DomainResult<DetectionReport> {
        if bytes.is_empty() {
            return Err(DomainError::InvalidInput("empty upload".into()));
        }

        let path = self.uploads.save(filename, bytes).await?;
        let detected = self.detector.detect(&path).await;
        // Se libera siempre, también si la detección falla.
        if let Err(e) = self.uploads.release(&path).await {
            warn!(file = %path.display(), error = %e, "Upload retention failed");
        }
        let output = detected?;
        let records = filter_detections(&output.detections, &self.allow_list);

        if records.len() < output.detections.len() {
            warn!(
                dropped = output.detections.len() - records.len(),
                "Detections outside the allow-list were dropped"
            );
        }
        info!(
            file = %path.display(),
            raw = output.detections.len(),
            kept = records.len(),
            infer_ms = output.infer_ms,
            "Detection finished"
        );

        let stored_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());

        Ok(DetectionReport {
            filename: stored_name,
            original: output.original,
            annotated: output.annotated,
            raw_count: output.detections.len(),
            records,
            infer_ms: output.infer_ms,
        })
    }
}

/// Datos de solo lectura para las páginas estáticas y la API de configuración.
#[derive(Clone)]
pub struct CatalogService {
    allow_list: Arc<AllowList>,
    inference: InferenceConfig,
    label_count: usize,
    model_catalog: Arc<dyn ModelCatalogPort>,
}

impl CatalogService {
    pub fn new(
        allow_list: Arc<AllowList>,
        inference: InferenceConfig,
        label_count: usize,
        model_catalog: Arc<dyn ModelCatalogPort>,
    ) -> Self {
        Self { allow_list, inference, label_count, model_catalog }
    }

    pub fn classes(&self) -> &[String] {
        self.allow_list.names()
    }

    pub fn inference(&self) -> &InferenceConfig {
        &self.inference
    }

    pub fn label_count(&self) -> usize {
        self.label_count
    }

    /// Comprueba que el fichero del modelo sigue en su sitio.
    pub async fn check_model(&self) -> DomainResult<()> {
        self.model_catalog.validate_model(&self.inference.model).await
    }
}
