//! Generated artifacts: one kernel plus its host dispatch wrapper, as a
//! source fragment the build later includes.

use std::path::{Path, PathBuf};

use crate::config::Backend;
use crate::error::GenError;
use crate::model::{Skeleton, SkeletonShape};
use crate::runtime::KernelSignature;

#[derive(Clone, Debug)]
pub struct GeneratedArtifact {
    pub backend: Backend,
    pub skeleton: Skeleton,
    pub function: String,
    pub shape: SkeletonShape,
    pub kernel_name: String,
    pub wrapper_name: String,
    /// The device kernel alone, as handed to the device compiler.
    pub kernel_source: String,
    /// The full fragment: wrapper with the kernel source embedded.
    pub source_text: String,
    pub output_path: PathBuf,
    pub signature: KernelSignature,
}

/// What happened when an artifact was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file on disk already had identical content and was left alone.
    Unchanged,
}

impl GeneratedArtifact {
    /// Content hash of the fragment (BLAKE3, hex).
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.source_text.as_bytes()).to_hex().to_string()
    }

    /// Path of the fragment relative to the output directory.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Write the fragment unless an identical one is already there, so
    /// timestamps of unchanged kernels survive for incremental builds.
    pub fn write(&self) -> Result<WriteOutcome, GenError> {
        write_if_changed(&self.output_path, &self.source_text)
    }
}

/// Write `contents` to `path` unless the file already holds the same bytes.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<WriteOutcome, GenError> {
    if let Ok(existing) = std::fs::read(path) {
        if blake3::hash(&existing) == blake3::hash(contents.as_bytes()) {
            log::debug!("unchanged: {}", path.display());
            return Ok(WriteOutcome::Unchanged);
        }
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;
        }
    }
    std::fs::write(path, contents).map_err(|e| GenError::io(path, e))?;
    log::info!("wrote {}", path.display());
    Ok(WriteOutcome::Written)
}
