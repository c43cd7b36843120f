pub mod artifact;
pub mod config;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod kir;
pub mod model;
pub mod naming;
pub mod runtime;
pub mod span;

// Re-exports — preserves `skelc::X` paths used by the CLI and tests
pub use artifact::{GeneratedArtifact, WriteOutcome};
pub use config::project;
pub use config::{Backend, GeneratorOptions};
pub use driver::GenerationReport;
pub use error::GenError;
pub use model::manifest;
pub use model::{Instantiation, MetadataGraph, Skeleton, SkeletonShape, UserFunction};

use diagnostic::Diagnostic;

/// Parse manifest text and generate every artifact in memory.
pub fn generate(manifest_source: &str, options: &GeneratorOptions) -> Result<Vec<GeneratedArtifact>, Diagnostic> {
    let graph = manifest::parse_manifest(manifest_source)?;
    driver::generate_all(&graph, options)
        .map_err(|e| Diagnostic::from_gen_error(&e, manifest_source))
}

/// Parse manifest text, generate, and write everything under the options'
/// output directory.
pub fn generate_and_write(
    manifest_source: &str,
    options: &GeneratorOptions,
) -> Result<GenerationReport, Diagnostic> {
    let graph = manifest::parse_manifest(manifest_source)?;
    driver::run(&graph, options).map_err(|e| Diagnostic::from_gen_error(&e, manifest_source))
}
