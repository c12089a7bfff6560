use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use accident_detect::adapters::{
    fs::upload_store::LocalUploadStore,
    http::{router, state::HttpState},
    onnx::{
        detector::OnnxDetector,
        labels::LabelTable,
        model_catalog::OnnxModelCatalog,
        yolo_engine::{EngineOptions, OnnxYoloEngine},
    },
    render::annotate::Annotator,
};
use accident_detect::application::ports::ModelCatalogPort;
use accident_detect::application::services::{CatalogService, DetectionService};
use accident_detect::config::AppConfig;
use accident_detect::domain::allow_list::AllowList;

#[derive(Parser, Debug)]
#[command(name = "accident-detect", about = "Road accident detection web demo")]
struct Cli {
    /// Fichero de configuración TOML
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Dirección de escucha, p. ej. 127.0.0.1:8501
    #[arg(long)]
    bind: Option<String>,
    /// Ruta del modelo ONNX
    #[arg(long)]
    model: Option<PathBuf>,
    /// Fichero con la lista de clases permitidas
    #[arg(long)]
    classes: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. Configuración: fichero opcional + flags
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_toml_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(model) = cli.model {
        config.model.onnx_path = model;
    }
    if let Some(classes) = cli.classes {
        config.model.classes_file = classes;
    }
    config.validate()?;

    // 3. Recursos de solo lectura, cargados una vez
    let allow_list = Arc::new(
        AllowList::load(&config.model.classes_file)
            .with_context(|| format!("loading class list {}", config.model.classes_file.display()))?,
    );
    tracing::info!(classes = allow_list.len(), "Class allow-list loaded");

    let inference = config.model.inference_config();
    let model_cat = Arc::new(OnnxModelCatalog::new());
    model_cat
        .validate_model(&inference.model)
        .await
        .context("checking model file")?;

    let engine = OnnxYoloEngine::load(
        &config.model.onnx_path,
        &EngineOptions { intra_threads: config.model.intra_threads, use_cuda: config.model.use_cuda },
        LabelTable::new(allow_list.names().to_vec()),
    )
    .with_context(|| format!("loading model {}", config.model.onnx_path.display()))?;

    let annotator = Annotator::new(config.render.font_path.as_deref());
    let detector = Arc::new(OnnxDetector::new(engine, inference.params.clone(), annotator));
    let label_count = detector.label_count();
    let uploads = Arc::new(LocalUploadStore::new(&config.uploads.dir, config.uploads.max_files));

    // 4. Servicios (casos de uso) y estado de la API
    let state = HttpState {
        detection: Arc::new(DetectionService::new(uploads, detector, allow_list.clone())),
        catalog: Arc::new(CatalogService::new(allow_list, inference, label_count, model_cat)),
    };

    let app = router(state, config.server.max_upload_bytes)
        .fallback_service(ServeDir::new(&config.server.static_dir));

    // 5. Lanzar el servidor
    tracing::info!("🚀 Accident detection server on http://{}", config.server.bind);
    tracing::info!("📂 Uploads stored in {}", config.uploads.dir.display());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
