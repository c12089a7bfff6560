use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{Array4, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::adapters::onnx::labels::LabelTable;
use crate::domain::detection::{non_max_suppression, Detection};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::YoloParams;

pub struct EngineOptions {
    pub intra_threads: usize,
    pub use_cuda: bool,
}

pub struct OnnxYoloEngine {
    session: Session,
    labels: LabelTable,
}

impl OnnxYoloEngine {
    /// Carga el modelo. `fallback_labels` se usa si el ONNX no trae la tabla `names`.
    ///
    /// Fichero ausente: `NotFound`. Fichero ilegible o sesión inválida: `ModelLoad`.
    pub fn load(path: &Path, opts: &EngineOptions, fallback_labels: LabelTable) -> DomainResult<Self> {
        let model_bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DomainError::NotFound(format!("model not found: {}", path.display())),
            _ => DomainError::ModelLoad(format!("reading {}: {e}", path.display())),
        })?;

        let mut builder = Session::builder()
            .map_err(|e| model_load_err(path, e))?
            .with_intra_threads(opts.intra_threads)
            .map_err(|e| model_load_err(path, e))?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        if opts.use_cuda {
            let cuda = CUDAExecutionProvider::default().build();
            match builder.clone().with_execution_providers([cuda]) {
                Ok(builder_with_cuda) => builder = builder_with_cuda,
                Err(e) => warn!("CUDA unavailable, running on CPU: {e}"),
            }
        }

        let session = builder
            .commit_from_memory(&model_bytes)
            .map_err(|e| model_load_err(path, e))?;

        let labels = session
            .metadata()
            .ok()
            .and_then(|m| m.custom("names").ok().flatten())
            .and_then(|raw| LabelTable::from_metadata(&raw))
            .unwrap_or_else(|| {
                warn!("Model has no `names` metadata, using the class file order");
                fallback_labels
            });

        info!(model = %path.display(), labels = labels.len(), "YOLO model loaded");
        Ok(Self { session, labels })
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (raw, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, raw))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let batch = array_view.index_axis(Axis(0), 0);
        let mut view = batch
            .into_dimensionality::<Ix2>()
            .map_err(|_| anyhow!("unexpected output shape {:?}", dims))?;

        if candidates_first(view.dim(), 4 + self.labels.len()) {
            view = view.reversed_axes();
        }
        if view.shape()[0] <= 4 {
            return Err(anyhow!("output has no class scores: {:?}", dims));
        }

        let scale = (
            rgb.width() as f32 / imgsz as f32,
            rgb.height() as f32 / imgsz as f32,
        );
        let candidates = decode_candidates(view, scale, (rgb.width() as f32, rgb.height() as f32), params.conf_threshold);
        debug!(candidates = candidates.len(), "Candidates above confidence threshold");

        let mut detections = non_max_suppression(candidates, params.iou_threshold, params.max_detections);
        for det in &mut detections {
            det.label = self.labels.resolve(det.class_id);
        }
        Ok(detections)
    }
}

fn model_load_err(path: &Path, e: impl std::fmt::Display) -> DomainError {
    DomainError::ModelLoad(format!("{}: {e}", path.display()))
}

/// Exportaciones antiguas devuelven `[candidatos, 4 + clases]`. Si alguna de las
/// dimensiones coincide con `4 + clases` decide ella; si no, las filas de
/// atributos son siempre menos que los candidatos.
fn candidates_first((rows, cols): (usize, usize), attrs: usize) -> bool {
    match (rows == attrs, cols == attrs) {
        (true, false) => false,
        (false, true) => true,
        _ => rows > cols,
    }
}

/// Decodifica una vista `[4 + clases, candidatos]` de `cx, cy, w, h, scores...` en
/// cajas en píxeles de la imagen original.
fn decode_candidates(
    view: ndarray::ArrayView2<'_, f32>,
    (sx, sy): (f32, f32),
    (max_w, max_h): (f32, f32),
    conf_threshold: f32,
) -> Vec<Detection> {
    let mut out = Vec::new();

    for i in 0..view.shape()[1] {
        let column = view.column(i);
        let Some((class_id, &max_score)) = column
            .slice(ndarray::s![4..])
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if max_score > conf_threshold {
            let (cx, cy, w, h) = (column[0], column[1], column[2], column[3]);
            out.push(Detection {
                x1: ((cx - w / 2.0) * sx).clamp(0.0, max_w),
                y1: ((cy - h / 2.0) * sy).clamp(0.0, max_h),
                x2: ((cx + w / 2.0) * sx).clamp(0.0, max_w),
                y2: ((cy + h / 2.0) * sy).clamp(0.0, max_h),
                score: max_score,
                class_id,
                label: String::new(),
            });
        }
    }
    out
}
