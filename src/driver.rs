//! Generation driver: validates a metadata graph, assigns kernel names,
//! lowers every instantiation for every enabled device backend, and writes
//! the artifacts plus the main include fragment.

use std::path::PathBuf;

use rayon::prelude::*;

use crate::artifact::{write_if_changed, GeneratedArtifact, WriteOutcome};
use crate::config::{Backend, GeneratorOptions};
use crate::error::GenError;
use crate::kir::lower::{create_kernel_lowering, KernelLowering, LoweringRequest};
use crate::model::{Instantiation, MetadataGraph};
use crate::naming::{KernelNames, NameRegistry, Registration};

/// Outcome of a full generation run.
#[derive(Debug)]
pub struct GenerationReport {
    pub artifacts: Vec<GeneratedArtifact>,
    pub main_output: PathBuf,
    pub written: usize,
    pub unchanged: usize,
}

/// Every problem in the graph, without generating anything.
pub fn check(graph: &MetadataGraph, options: &GeneratorOptions) -> Vec<GenError> {
    let mut errors = graph.validate(&options.allowed_calls);
    if let Err(e) = kernel_backends(graph, options) {
        errors.push(e);
    }
    if let Err(e) = plan(graph, options) {
        errors.push(e);
    }
    errors
}

/// Distinct instantiations with the names `generate_all` gives them, in
/// discovery order.
pub fn plan(
    graph: &MetadataGraph,
    options: &GeneratorOptions,
) -> Result<Vec<(Instantiation, KernelNames)>, GenError> {
    let mut registry = NameRegistry::new(&options.output_name);
    let mut jobs = Vec::new();
    for inst in graph.instantiations() {
        match registry.register(inst)? {
            Registration::New(names) => jobs.push((inst.clone(), names)),
            Registration::Existing(names) => {
                log::debug!("{}: already generated", names.kernel);
            }
        }
    }
    Ok(jobs)
}

/// Lower every instantiation for every enabled device backend.
///
/// Instantiations are lowered in parallel; the result keeps discovery
/// order, backend by backend.
pub fn generate_all(
    graph: &MetadataGraph,
    options: &GeneratorOptions,
) -> Result<Vec<GeneratedArtifact>, GenError> {
    if let Some(e) = graph.validate(&options.allowed_calls).into_iter().next() {
        return Err(e);
    }
    let lowerings = kernel_backends(graph, options)?;
    let jobs = plan(graph, options)?;

    let mut artifacts = Vec::with_capacity(jobs.len() * lowerings.len());
    for lowering in &lowerings {
        let lowered = jobs
            .par_iter()
            .map(|(inst, names)| lower_one(lowering.as_ref(), graph, options, inst, names))
            .collect::<Result<Vec<_>, _>>()?;
        artifacts.extend(lowered);
    }
    Ok(artifacts)
}

/// Generate and write everything. Stops at the first failure; files already
/// written are left as they are.
pub fn run(graph: &MetadataGraph, options: &GeneratorOptions) -> Result<GenerationReport, GenError> {
    let artifacts = generate_all(graph, options)?;
    let mut report = GenerationReport {
        artifacts: Vec::new(),
        main_output: options.main_output_path(),
        written: 0,
        unchanged: 0,
    };

    for artifact in &artifacts {
        report.count(artifact.write()?);
    }
    let main = main_fragment(options, &artifacts);
    report.count(write_if_changed(&report.main_output, &main)?);

    report.artifacts = artifacts;
    Ok(report)
}

/// The main output: backend switches followed by one include per artifact.
pub fn main_fragment(options: &GeneratorOptions, artifacts: &[GeneratedArtifact]) -> String {
    let mut out = String::from("// Generated by skelc. Do not edit.\n");
    out.push_str("#define SKEL_PRECOMPILED 1\n");
    for backend in &options.backends {
        out.push_str(&format!("#define {} 1\n", backend.define()));
    }
    if !artifacts.is_empty() {
        out.push('\n');
    }
    for artifact in artifacts {
        out.push_str(&format!("#include \"{}\"\n", artifact.file_name()));
    }
    out
}

impl GenerationReport {
    fn count(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.written += 1,
            WriteOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Lowerings for the enabled device backends. Host backends need none.
fn kernel_backends(
    graph: &MetadataGraph,
    options: &GeneratorOptions,
) -> Result<Vec<Box<dyn KernelLowering>>, GenError> {
    let mut lowerings = Vec::new();
    for backend in options.backends.iter().copied().filter(|b| b.needs_kernels()) {
        match create_kernel_lowering(backend) {
            Some(lowering) => lowerings.push(lowering),
            None if graph.instantiations().is_empty() => {
                log::warn!("{} generation requested, but there is nothing to generate", backend);
            }
            None => return Err(GenError::UnsupportedBackend(backend.display_name())),
        }
    }
    Ok(lowerings)
}

fn lower_one(
    lowering: &dyn KernelLowering,
    graph: &MetadataGraph,
    options: &GeneratorOptions,
    inst: &Instantiation,
    names: &KernelNames,
) -> Result<GeneratedArtifact, GenError> {
    let backend: Backend = lowering.backend();
    let wrap = |source: GenError| GenError::Instantiation {
        backend: backend.display_name(),
        skeleton: inst.skeleton,
        function: inst.function.clone(),
        varity: inst.varity,
        harity: inst.harity,
        source: Box::new(source),
    };

    let function = graph.bind(inst).map_err(wrap)?;
    log::debug!("lowering {} for {}", names.kernel, backend);
    let request = LoweringRequest {
        skeleton: inst.skeleton,
        function: &function,
        shape: inst.shape(),
        graph,
        names,
        output_dir: &options.output_dir,
        preserve_lines: options.preserve_lines,
    };
    lowering.lower(&request).map_err(wrap)
}
