use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::application::ports::UploadStorePort;
use crate::domain::errors::{DomainError, DomainResult};

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Guarda las imágenes subidas en `uploads/<nombre original>`.
///
/// Un fichero queda protegido desde `save` hasta su `release`: la limpieza por
/// antigüedad nunca borra un fichero que otra petición todavía va a leer.
pub struct LocalUploadStore {
    dir: PathBuf,
    /// 0 = sin límite
    max_files: usize,
    /// Ruta -> peticiones en curso que la usan
    in_flight: Mutex<HashMap<PathBuf, usize>>,
}

impl LocalUploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_files: usize) -> Self {
        Self { dir: dir.into(), max_files, in_flight: Mutex::new(HashMap::new()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn acquire(&self, path: &Path) -> DomainResult<()> {
        let mut map = self.in_flight.lock().map_err(|_| lock_err())?;
        *map.entry(path.to_path_buf()).or_insert(0) += 1;
        Ok(())
    }

    fn unmark(&self, path: &Path) -> DomainResult<()> {
        let mut map = self.in_flight.lock().map_err(|_| lock_err())?;
        if let Some(count) = map.get_mut(path) {
            *count -= 1;
            if *count == 0 {
                map.remove(path);
            }
        }
        Ok(())
    }

    fn protected(&self) -> DomainResult<HashSet<PathBuf>> {
        let map = self.in_flight.lock().map_err(|_| lock_err())?;
        Ok(map.keys().cloned().collect())
    }

    async fn enforce_retention(&self, keep: &Path) -> DomainResult<()> {
        if self.max_files == 0 {
            return Ok(());
        }

        let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut rd = tokio::fs::read_dir(&self.dir).await.map_err(storage_err)?;
        while let Some(entry) = rd.next_entry().await.map_err(storage_err)? {
            let meta = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, entry.path()));
        }

        if entries.len() <= self.max_files {
            return Ok(());
        }

        // Se toma después del listado: todo fichero listado ya estaba marcado.
        let protected = self.protected()?;
        entries.sort();
        let mut excess = entries.len() - self.max_files;
        for (_, path) in entries {
            if excess == 0 {
                break;
            }
            if path == keep || protected.contains(&path) {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Evicted old upload {}", path.display());
                    excess -= 1;
                }
                Err(e) => warn!("Could not evict {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UploadStorePort for LocalUploadStore {
    async fn save(&self, filename: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
        let name = sanitize_filename(filename)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(storage_err)?;

        let path = self.dir.join(&name);
        self.acquire(&path)?;
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            self.unmark(&path)?;
            return Err(storage_err(e));
        }
        info!(file = %path.display(), bytes = bytes.len(), "Upload stored");
        Ok(path)
    }

    async fn release(&self, path: &Path) -> DomainResult<()> {
        self.unmark(path)?;
        self.enforce_retention(path).await
    }
}

/// Reduce el nombre enviado por el cliente a un nombre de fichero con extensión de imagen.
pub fn sanitize_filename(raw: &str) -> DomainResult<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(DomainError::InvalidInput(format!("invalid file name: {raw:?}")));
    }
    if name.chars().any(char::is_control) {
        return Err(DomainError::InvalidInput("file name contains control characters".into()));
    }

    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(DomainError::InvalidInput(format!(
            "unsupported file type {:?}, expected png, jpg or jpeg",
            ext
        )));
    }
    Ok(name.to_string())
}

fn storage_err(e: std::io::Error) -> DomainError {
    DomainError::Storage(e.to_string())
}

fn lock_err() -> DomainError {
    DomainError::OperationFailed("upload registry lock poisoned".into())
}
