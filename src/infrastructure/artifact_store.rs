use crate::domain::error::{AppError, Result};
use crate::domain::question::QuestionDraft;
use std::fs;
use std::io::Write;
use std::path::Path;

fn io_err(msg: impl Into<String>) -> AppError {
    AppError::IoError(msg.into())
}

/// Serialization format of a draft artifact, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Yaml,
    Json,
}

impl ArtifactFormat {
    /// `.json` is JSON, everything else YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ArtifactFormat::Json,
            _ => ArtifactFormat::Yaml,
        }
    }
}

/// Save drafts for inspection or hand-editing before import
pub fn save_drafts(path: &Path, drafts: &[QuestionDraft]) -> Result<()> {
    let text = match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => serde_json::to_string_pretty(drafts)?,
        ArtifactFormat::Yaml => serde_yaml::to_string(drafts)?,
    };

    atomic_write_bytes(path, text.as_bytes())?;
    tracing::info!(path = %path.display(), drafts = drafts.len(), "Draft artifact saved");
    Ok(())
}

/// Load drafts from an artifact, rejecting any that break draft invariants
pub fn load_drafts(path: &Path) -> Result<Vec<QuestionDraft>> {
    let text = fs::read_to_string(path)
        .map_err(|e| io_err(format!("Failed to read artifact {}: {e}", path.display())))?;

    let drafts: Vec<QuestionDraft> = match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => serde_json::from_str(&text)?,
        ArtifactFormat::Yaml => serde_yaml::from_str(&text)?,
    };

    for draft in &drafts {
        draft.validate()?;
    }

    Ok(drafts)
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| io_err(format!("Failed to create dir {}: {e}", path.display())))?;
    Ok(())
}

pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp_path).map_err(|e| {
            io_err(format!(
                "Failed to create temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        file.write_all(bytes).map_err(|e| {
            io_err(format!(
                "Failed to write temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        file.sync_all().ok();
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        io_err(format!(
            "Failed to rename temp file {} to {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;

    Ok(())
}
