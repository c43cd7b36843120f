//! OpenCL lowering: OpenCL C kernels plus C++ host wrappers built on the
//! `skel::backend` runtime.

mod mappairs;
pub mod params;


use super::{KernelLowering, LoweringRequest};
use crate::artifact::GeneratedArtifact;
use crate::config::Backend;
use crate::error::GenError;
use crate::model::{Callee, IndexingMode, MetadataGraph, Skeleton, UserFunction};
use crate::kir::proxy::proxy_type_name;

/// Host runtime handle type for device buffers.
pub(crate) const HOST_BUFFER: &str = "skel::backend::DeviceMemPointer_CL";

pub(crate) const FP64_PRAGMA: &str = "#pragma OPENCL EXTENSION cl_khr_fp64: enable\n";

/// Suffix of artifact file names.
pub const FRAGMENT_SUFFIX: &str = "_cl_source.inl";

const INDEX_TYPES: &str = "typedef struct {\n\tsize_t i;\n} index1_t;\n\n\
                           typedef struct {\n\tsize_t row;\n\tsize_t col;\n} index2_t;\n\n";

pub struct OpenClLowering;

impl OpenClLowering {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenClLowering {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelLowering for OpenClLowering {
    fn backend(&self) -> Backend {
        Backend::OpenCl
    }

    fn lower(&self, request: &LoweringRequest<'_>) -> Result<GeneratedArtifact, GenError> {
        match request.skeleton {
            Skeleton::MapPairs => mappairs::generate(request),
            other => Err(GenError::UnsupportedSkeleton {
                skeleton: other,
                backend: Backend::OpenCl.display_name(),
            }),
        }
    }
}

/// Everything that precedes the proxies: precision pragma, constants, user
/// types (dependencies first) and the predefined index types.
pub(crate) fn prelude(
    function: &UserFunction,
    callees: &[Callee<'_>],
    graph: &MetadataGraph,
) -> Result<String, GenError> {
    let mut out = String::new();

    let needs_fp64 = function.requires_double_precision
        || callees.iter().any(|c| c.function.requires_double_precision);
    if needs_fp64 {
        out.push_str(FP64_PRAGMA);
        out.push('\n');
    }

    if !graph.constants().is_empty() {
        for constant in graph.constants() {
            out.push_str(&format!(
                "#define {} ({}) // {}\n",
                constant.name, constant.definition, constant.type_name
            ));
        }
        out.push('\n');
    }

    for ty in graph.types_for(function)? {
        out.push_str(ty.definition.trim_end());
        out.push_str("\n\n");
    }

    out.push_str(INDEX_TYPES);
    Ok(out)
}

/// A user function as a kernel-side helper called `name`.
pub(crate) fn user_function(function: &UserFunction, name: &str, preserve_lines: bool) -> String {
    let mut params = Vec::new();
    match function.indexing {
        IndexingMode::None => {}
        IndexingMode::Linear => params.push(format!("index1_t {}", function.index_param)),
        IndexingMode::RowCol => params.push(format!("index2_t {}", function.index_param)),
    }
    params.extend(
        function
            .elementwise
            .iter()
            .map(|p| format!("{} {}", p.resolved_type, p.name)),
    );
    params.extend(function.containers.iter().map(|p| {
        format!("{} {}", proxy_type_name(p.kind, &p.resolved_type), p.name)
    }));
    params.extend(
        function
            .scalars
            .iter()
            .map(|p| format!("{} {}", p.resolved_type, p.name)),
    );

    let mut out = String::new();
    if preserve_lines {
        if let Some(loc) = &function.location {
            out.push_str(&format!("#line {} \"{}\"\n", loc.line, loc.file));
        }
    }
    out.push_str(&format!(
        "static {} {}({})\n{{\n{}\n}}\n\n",
        function.return_type,
        name,
        params.join(", "),
        function.body.trim_end()
    ));
    out
}

/// C++ caps raw-string delimiters at 16 characters.
pub(crate) const MAX_RAW_DELIMITER: usize = 16;

/// A raw-string delimiter that does not occur in `source`: a run of `#`,
/// then numbered `skelN` names once every run up to the cap collides.
pub(crate) fn raw_delimiter(source: &str) -> Result<String, GenError> {
    let collides = |delim: &str| source.contains(&format!("){}\"", delim));
    let hashes = (3..=MAX_RAW_DELIMITER).map(|len| "#".repeat(len));
    let numbered = (0u64..)
        .map(|k| format!("skel{}", k))
        .take_while(|delim| delim.len() <= MAX_RAW_DELIMITER);
    hashes
        .chain(numbered)
        .find(|delim| !collides(delim))
        .ok_or(GenError::RawDelimiter(MAX_RAW_DELIMITER))
}
