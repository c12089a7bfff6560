use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{detection::Detection, errors::DomainResult, model::ModelId};

/// Result of running the model over one image.
#[derive(Debug, Clone)]
pub struct DetectorOutput {
    /// Decoded input image.
    pub original: RgbImage,
    /// Input image with every raw detection drawn on it.
    pub annotated: RgbImage,
    /// Raw detections, labels already resolved through the model's label table.
    pub detections: Vec<Detection>,
    pub infer_ms: f32,
}

#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, image_path: &Path) -> DomainResult<DetectorOutput>;
}

#[async_trait]
pub trait UploadStorePort: Send + Sync {
    /// Persists the upload and returns the stored path. An existing file with the
    /// same name is overwritten.
    ///
    /// The stored file is held until `release` is called for it.
    async fn save(&self, filename: &str, bytes: &[u8]) -> DomainResult<PathBuf>;

    /// Marks a stored file as no longer needed by its request.
    async fn release(&self, path: &Path) -> DomainResult<()>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}
