//! Generator configuration: which backends to emit, where output goes, and
//! what user functions may call.

pub mod project;

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// An execution backend the driver can enable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    OpenMp,
    OpenCl,
    Cuda,
    StarPuMpi,
    Mpi,
}

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::OpenMp,
        Backend::OpenCl,
        Backend::Cuda,
        Backend::StarPuMpi,
        Backend::Mpi,
    ];

    /// Name used in flags and project files.
    pub fn flag(self) -> &'static str {
        match self {
            Backend::OpenMp => "openmp",
            Backend::OpenCl => "opencl",
            Backend::Cuda => "cuda",
            Backend::StarPuMpi => "starpu-mpi",
            Backend::Mpi => "mpi",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Backend::OpenMp => "OpenMP",
            Backend::OpenCl => "OpenCL",
            Backend::Cuda => "CUDA",
            Backend::StarPuMpi => "StarPU-MPI",
            Backend::Mpi => "MPI",
        }
    }

    /// Preprocessor switch the main output defines when enabled.
    pub fn define(self) -> &'static str {
        match self {
            Backend::OpenMp => "SKEL_OPENMP",
            Backend::OpenCl => "SKEL_OPENCL",
            Backend::Cuda => "SKEL_CUDA",
            Backend::StarPuMpi => "SKEL_STARPU_MPI",
            Backend::Mpi => "SKEL_MPI",
        }
    }

    /// Device backends need per-instantiation kernel source; host backends
    /// run the skeleton from the library directly.
    pub fn needs_kernels(self) -> bool {
        matches!(self, Backend::OpenCl | Backend::Cuda)
    }

    pub fn from_flag(flag: &str) -> Option<Backend> {
        Self::ALL.into_iter().find(|b| b.flag() == flag)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// External functions user functions may call without being listed.
pub const DEFAULT_ALLOWED_CALLS: &[&str] = &[
    "exp", "exp2", "exp2f", "sqrt", "abs", "fabs", "max", "fmax", "pow", "log", "log2", "log10",
    "sin", "sinh", "asin", "asinh", "cos", "cosh", "acos", "acosh", "tan", "tanh", "atan",
    "atanh", "round", "ceil", "floor", "erf", "printf",
];

/// Everything the driver needs to know about one run.
#[derive(Clone, Debug)]
pub struct GeneratorOptions {
    pub output_dir: PathBuf,
    /// Main output file name, without extension.
    pub output_name: String,
    pub backends: BTreeSet<Backend>,
    /// Keep the name exactly as given (useful for headers).
    pub override_extension: bool,
    /// Emit `#line` directives pointing back at user source.
    pub preserve_lines: bool,
    pub allowed_calls: BTreeSet<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            output_name: "skel_out".to_string(),
            backends: BTreeSet::new(),
            override_extension: false,
            preserve_lines: true,
            allowed_calls: DEFAULT_ALLOWED_CALLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GeneratorOptions {
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backends.insert(backend);
        self
    }

    pub fn is_enabled(&self, backend: Backend) -> bool {
        self.backends.contains(&backend)
    }

    /// Add space-separated function names to the allow-list.
    pub fn allow_calls(&mut self, names: &str) {
        self.allowed_calls
            .extend(names.split_whitespace().map(str::to_string));
    }

    /// `dir/name` plus `.cu` when CUDA is on, `.cpp` otherwise.
    pub fn main_output_path(&self) -> PathBuf {
        let file = if self.override_extension {
            self.output_name.clone()
        } else if self.is_enabled(Backend::Cuda) {
            format!("{}.cu", self.output_name)
        } else {
            format!("{}.cpp", self.output_name)
        };
        self.output_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_output_extension() {
        let mut opts = GeneratorOptions {
            output_dir: PathBuf::from("out"),
            output_name: "prog".to_string(),
            ..Default::default()
        };
        assert_eq!(opts.main_output_path(), PathBuf::from("out/prog.cpp"));
        opts.backends.insert(Backend::Cuda);
        assert_eq!(opts.main_output_path(), PathBuf::from("out/prog.cu"));
        opts.override_extension = true;
        assert_eq!(opts.main_output_path(), PathBuf::from("out/prog"));
    }

    #[test]
    fn test_allow_calls_extends_defaults() {
        let mut opts = GeneratorOptions::default();
        assert!(opts.allowed_calls.contains("sqrt"));
        assert!(!opts.allowed_calls.contains("conj"));
        opts.allow_calls("conj  csqrt");
        assert!(opts.allowed_calls.contains("conj"));
        assert!(opts.allowed_calls.contains("csqrt"));
    }

    #[test]
    fn test_backend_from_flag() {
        assert_eq!(Backend::from_flag("starpu-mpi"), Some(Backend::StarPuMpi));
        assert_eq!(Backend::from_flag("vulkan"), None);
    }

    #[test]
    fn test_kernel_backends() {
        assert!(Backend::OpenCl.needs_kernels());
        assert!(Backend::Cuda.needs_kernels());
        assert!(!Backend::OpenMp.needs_kernels());
        assert!(!Backend::Mpi.needs_kernels());
    }
}
