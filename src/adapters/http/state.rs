use std::sync::Arc;
use crate::application::services::{CatalogService, DetectionService};

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Servicio que guarda la imagen, ejecuta el modelo y filtra las detecciones.
    pub detection: Arc<DetectionService>,
    /// Lista de clases y datos del modelo para las páginas informativas.
    pub catalog: Arc<CatalogService>,
}
