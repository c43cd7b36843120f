pub mod check;
pub mod gen;
pub mod logger;
pub mod names;

use std::path::{Path, PathBuf};
use std::process;

use clap::Args;
use skelc::config::project::ProjectConfig;
use skelc::config::{Backend, GeneratorOptions};
use skelc::diagnostic::Diagnostic;
use skelc::error::GenError;
use skelc::model::MetadataGraph;

/// Manifest and generator options shared by every subcommand.
#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// Metadata manifest (JSON) written by the front-end
    pub manifest: PathBuf,
    /// Output directory (default: skelc.toml value, else current directory)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
    /// Main output file name, without extension
    #[arg(long)]
    pub name: Option<String>,
    /// Generate OpenCL kernels
    #[arg(long)]
    pub opencl: bool,
    /// Generate CUDA kernels
    #[arg(long)]
    pub cuda: bool,
    /// Enable the OpenMP backend
    #[arg(long)]
    pub openmp: bool,
    /// Enable the MPI backend
    #[arg(long)]
    pub mpi: bool,
    /// Enable the StarPU-MPI backend
    #[arg(long = "starpu-mpi")]
    pub starpu_mpi: bool,
    /// Use --name as the full main output file name
    #[arg(long)]
    pub override_extension: bool,
    /// Do not emit #line directives into kernels
    #[arg(long)]
    pub no_preserve_lines: bool,
    /// Extra functions user functions may call (space separated)
    #[arg(long, value_name = "NAMES")]
    pub fnames: Option<String>,
}

/// A loaded manifest with the options that apply to it.
pub struct Resolved {
    pub manifest: PathBuf,
    pub source: String,
    pub graph: MetadataGraph,
    pub options: GeneratorOptions,
}

impl Resolved {
    /// Render generation errors against the manifest.
    pub fn report(&self, errors: &[GenError]) {
        let filename = self.manifest.display().to_string();
        for err in errors {
            Diagnostic::from_gen_error(err, &self.source).render(&filename, &self.source);
        }
    }
}

/// Load the manifest and fold skelc.toml and flags into generator options.
/// Exits on failure.
pub fn resolve_input(args: &InputArgs) -> Resolved {
    let (graph, source) = match skelc::model::manifest::load_manifest(&args.manifest) {
        Ok(loaded) => loaded,
        Err(diag) => exit_with(&diag, &args.manifest),
    };

    let mut options = GeneratorOptions::default();
    let search_dir = args.manifest.parent().unwrap_or(Path::new("."));
    if let Some(toml_path) = ProjectConfig::find(search_dir) {
        log::debug!("using {}", toml_path.display());
        match ProjectConfig::load(&toml_path) {
            Ok(project) => project.apply(&mut options),
            Err(diag) => exit_with(&diag, &toml_path),
        }
    }
    apply_flags(args, &mut options);

    Resolved {
        manifest: args.manifest.clone(),
        source,
        graph,
        options,
    }
}

/// Command line flags win over project file values.
fn apply_flags(args: &InputArgs, options: &mut GeneratorOptions) {
    if let Some(dir) = &args.dir {
        options.output_dir = dir.clone();
    }
    if let Some(name) = &args.name {
        options.output_name = name.clone();
    }
    let flags = [
        (args.opencl, Backend::OpenCl),
        (args.cuda, Backend::Cuda),
        (args.openmp, Backend::OpenMp),
        (args.mpi, Backend::Mpi),
        (args.starpu_mpi, Backend::StarPuMpi),
    ];
    options
        .backends
        .extend(flags.iter().filter(|(on, _)| *on).map(|(_, b)| *b));
    options.override_extension |= args.override_extension;
    if args.no_preserve_lines {
        options.preserve_lines = false;
    }
    if let Some(names) = &args.fnames {
        options.allow_calls(names);
    }
}

fn exit_with(diag: &Diagnostic, path: &Path) -> ! {
    let source = std::fs::read_to_string(path).unwrap_or_default();
    diag.render(&path.display().to_string(), &source);
    process::exit(1);
}
