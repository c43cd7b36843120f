//! Generation errors.
//!
//! Every variant is fatal for the artifact being generated. Nothing here is
//! retried: a failed instantiation means the metadata or a template is wrong.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Skeleton;

#[derive(Debug, Error)]
pub enum GenError {
    /// A template slot was left without a value.
    #[error("template '{template}' slot '{slot}' has no value")]
    UnresolvedSlot { template: &'static str, slot: String },

    /// A value was bound to a slot the template does not have.
    #[error("template '{template}' has no slot named '{binding}'")]
    UnusedBinding {
        template: &'static str,
        binding: String,
    },

    #[error("unknown user function '{0}'")]
    UnknownFunction(String),

    #[error(
        "{skeleton} over '{function}' needs {expected} elementwise parameters \
         (Varity {varity} + Harity {harity}), found {found}"
    )]
    ShapeMismatch {
        skeleton: Skeleton,
        function: String,
        varity: usize,
        harity: usize,
        expected: usize,
        found: usize,
    },

    #[error("'{owner}' references unknown user type '{name}'")]
    UnknownUserType { owner: String, name: String },

    #[error("user types form a dependency cycle through '{0}'")]
    TypeCycle(String),

    #[error("user function '{function}' calls '{callee}', which is not allowed in user functions")]
    DisallowedCall { function: String, callee: String },

    #[error("{what} '{name}' is not a valid kernel identifier")]
    InvalidIdentifier { what: &'static str, name: String },

    #[error("parameter '{param}' of '{function}' uses a reserved name")]
    ReservedName { function: String, param: String },

    #[error("parameter '{param}' of '{function}' is declared more than once")]
    DuplicateParam { function: String, param: String },

    /// Kernel code cannot recurse.
    #[error("user function '{0}' calls itself through other user functions")]
    RecursiveCall(String),

    #[error("no {backend} generator for skeleton {skeleton}")]
    UnsupportedSkeleton {
        skeleton: Skeleton,
        backend: &'static str,
    },

    #[error("no raw string delimiter of at most {0} characters avoids the kernel source")]
    RawDelimiter(usize),

    #[error("backend '{0}' has no kernel generator")]
    UnsupportedBackend(&'static str),

    #[error("kernel name '{name}' is produced by both '{first}' and '{second}'")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("cannot write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Wraps a failure with the identity of the instantiation that caused it.
    #[error(
        "{backend} {skeleton} for '{function}' (Varity {varity}, Harity {harity}): {source}"
    )]
    Instantiation {
        backend: &'static str,
        skeleton: Skeleton,
        function: String,
        varity: usize,
        harity: usize,
        #[source]
        source: Box<GenError>,
    },
}

impl GenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }

    /// The innermost error, skipping instantiation context.
    pub fn root(&self) -> &GenError {
        match self {
            GenError::Instantiation { source, .. } => source.root(),
            other => other,
        }
    }
}
