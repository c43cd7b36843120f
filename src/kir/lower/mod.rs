//! KernelLowering: turns one bound skeleton instantiation into a backend
//! artifact (device kernel + host dispatch wrapper).
//!
//! Each device backend implements `KernelLowering`. A backend handles the
//! skeletons it has templates for and reports the rest as unsupported.

pub mod opencl;

use std::path::Path;

use crate::artifact::GeneratedArtifact;
use crate::config::Backend;
use crate::error::GenError;
use crate::model::{MetadataGraph, Skeleton, SkeletonShape, UserFunction};
use crate::naming::KernelNames;

pub use opencl::OpenClLowering;

/// Inputs for lowering one instantiation.
#[derive(Clone, Copy, Debug)]
pub struct LoweringRequest<'a> {
    pub skeleton: Skeleton,
    /// The function with elementwise sides already assigned.
    pub function: &'a UserFunction,
    pub shape: SkeletonShape,
    pub graph: &'a MetadataGraph,
    pub names: &'a KernelNames,
    pub output_dir: &'a Path,
    pub preserve_lines: bool,
}

/// Lowers a skeleton instantiation into kernel and wrapper source text.
pub trait KernelLowering: Send + Sync {
    fn backend(&self) -> Backend;

    /// Produce a complete artifact. The returned source contains no
    /// unfilled template slot.
    fn lower(&self, request: &LoweringRequest<'_>) -> Result<GeneratedArtifact, GenError>;
}

/// Create the kernel-lowering backend for `backend`, if one exists.
pub fn create_kernel_lowering(backend: Backend) -> Option<Box<dyn KernelLowering>> {
    match backend {
        Backend::OpenCl => Some(Box::new(OpenClLowering::new())),
        _ => None,
    }
}
