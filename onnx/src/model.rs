//! Model file metadata, validation, and discovery.

use std::path::{Path, PathBuf};

use crate::error::OnnxError;

/// Metadata for an ONNX model file on disk.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model file path.
    pub path: PathBuf,
    /// Model name, taken from the file stem.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
}

impl ModelMetadata {
    /// Reads metadata from a model file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, OnnxError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OnnxError::ModelNotFound(path.to_path_buf()));
        }
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: meta.len(),
        })
    }

    /// Human-readable file size, e.g. "12.40 MB".
    pub fn size_human_readable(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        format!("{:.2} {}", size, UNITS[unit])
    }

    /// Checks the file for obvious problems before handing it to the
    /// engine. The engine itself is the final authority on validity.
    pub fn validate(&self) -> ModelValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !self.path.exists() {
            errors.push("model file does not exist".to_string());
        } else if self.size == 0 {
            errors.push("model file is empty".to_string());
        } else if self.size < 1024 {
            warnings.push("model file is suspiciously small".to_string());
        } else if self.size > 1024 * 1024 * 1024 {
            warnings.push("model file exceeds 1 GB, loading may be slow".to_string());
        }

        match self.path.extension() {
            Some(ext) if ext == "onnx" => {}
            Some(_) => warnings.push("file extension is not .onnx".to_string()),
            None => warnings.push("file has no extension".to_string()),
        }

        ModelValidation { errors, warnings }
    }
}

/// Outcome of [`ModelMetadata::validate`].
#[derive(Debug, Clone)]
pub struct ModelValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ModelValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lists the `.onnx` files directly inside a directory.
pub fn find_models<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, OnnxError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(OnnxError::Runtime(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut models = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "onnx") {
            models.push(path);
        }
    }
    models.sort();
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn metadata_from_missing_path() {
        let err = ModelMetadata::from_path("no/such/model.onnx").unwrap_err();
        assert!(matches!(err, OnnxError::ModelNotFound(_)));
    }

    #[test]
    fn metadata_reads_name_and_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("denoiser.onnx");
        fs::write(&path, vec![0u8; 2048]).unwrap();

        let meta = ModelMetadata::from_path(&path).unwrap();
        assert_eq!(meta.name, "denoiser");
        assert_eq!(meta.size, 2048);
        assert_eq!(meta.size_human_readable(), "2.00 KB");
    }

    #[test]
    fn validate_flags_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.onnx");
        fs::write(&path, b"").unwrap();

        let v = ModelMetadata::from_path(&path).unwrap().validate();
        assert!(!v.is_valid());
        assert!(!v.errors.is_empty());
    }

    #[test]
    fn validate_warns_on_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, vec![0u8; 4096]).unwrap();

        let v = ModelMetadata::from_path(&path).unwrap().validate();
        assert!(v.is_valid());
        assert!(v.warnings.iter().any(|w| w.contains("extension")));
    }

    #[test]
    fn find_models_filters_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.onnx"), b"x").unwrap();
        fs::write(dir.path().join("b.onnx"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let models = find_models(dir.path()).unwrap();
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|p| p.extension().unwrap() == "onnx"));
    }

    #[test]
    fn find_models_rejects_file_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.onnx");
        fs::write(&file, b"x").unwrap();
        assert!(find_models(&file).is_err());
    }
}
