//! Skeleton metadata: plain values describing one user function and the
//! parallel shape it is instantiated with.
//!
//! The front-end produces these once per compilation run; generators only
//! read them. No generator ever sees front-end node types.

pub mod graph;
pub mod manifest;
mod skeleton;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use graph::{Callee, MetadataGraph};
pub use skeleton::Skeleton;

/// How the user function receives its position in the index space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingMode {
    #[default]
    None,
    /// `index1_t { i }`
    Linear,
    /// `index2_t { row, col }`
    RowCol,
}

/// Which side of the cross product an elementwise parameter iterates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Vertical,
    Horizontal,
}

/// Container kinds a user function can take as random-access parameters.
///
/// The declaration order is the proxy emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Vector,
    Matrix,
    SparseMatrix,
    MatrixRow,
    Tensor3,
    Tensor4,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Vector => "vector",
            ContainerKind::Matrix => "matrix",
            ContainerKind::SparseMatrix => "sparse_matrix",
            ContainerKind::MatrixRow => "matrix_row",
            ContainerKind::Tensor3 => "tensor3",
            ContainerKind::Tensor4 => "tensor4",
        }
    }

    /// A matrix row proxy points at `data + i * cols`, so it must be rebuilt
    /// for every index the worker visits.
    pub fn is_per_iteration(self) -> bool {
        self == ContainerKind::MatrixRow
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementwiseParam {
    pub name: String,
    #[serde(rename = "type")]
    pub resolved_type: String,
    /// Assigned when the function is bound to a shape.
    #[serde(skip)]
    pub side: Side,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerParam {
    pub name: String,
    #[serde(rename = "type")]
    pub resolved_type: String,
    pub kind: ContainerKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarParam {
    pub name: String,
    #[serde(rename = "type")]
    pub resolved_type: String,
}

/// Where the user function was written, for `#line` directives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

/// A user-defined type the kernel needs a definition for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserType {
    pub name: String,
    /// Kernel-language definition, emitted verbatim.
    pub definition: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A user constant, injected as a preprocessor definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConstant {
    pub name: String,
    pub type_name: String,
    pub definition: String,
}

fn default_index_param() -> String {
    "index".to_string()
}

/// One user-supplied elementwise function and its signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFunction {
    pub name: String,
    /// Globally distinct across the compilation run.
    pub unique_name: String,
    pub return_type: String,
    #[serde(default)]
    pub indexing: IndexingMode,
    /// Name the body uses for the index parameter.
    #[serde(default = "default_index_param")]
    pub index_param: String,
    #[serde(default)]
    pub requires_double_precision: bool,
    #[serde(default)]
    pub elementwise: Vec<ElementwiseParam>,
    #[serde(default)]
    pub containers: Vec<ContainerParam>,
    #[serde(default)]
    pub scalars: Vec<ScalarParam>,
    /// User types in discovery order.
    #[serde(default)]
    pub referenced_types: Vec<String>,
    /// Functions the body calls: other user functions or allowed externals.
    #[serde(default)]
    pub calls: Vec<String>,
    pub body: String,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl UserFunction {
    pub fn is_indexed(&self) -> bool {
        self.indexing != IndexingMode::None
    }

    /// Number of elementwise parameters on the vertical side.
    pub fn varity(&self) -> usize {
        self.elementwise
            .iter()
            .filter(|p| p.side == Side::Vertical)
            .count()
    }

    /// Every declared parameter name, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        let index = self.is_indexed().then_some(self.index_param.as_str());
        index
            .into_iter()
            .chain(self.elementwise.iter().map(|p| p.name.as_str()))
            .chain(self.containers.iter().map(|p| p.name.as_str()))
            .chain(self.scalars.iter().map(|p| p.name.as_str()))
    }
}

/// Counts of vertical and horizontal container dimensions being paired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkeletonShape {
    pub varity: usize,
    pub harity: usize,
}

impl SkeletonShape {
    pub fn new(varity: usize, harity: usize) -> Self {
        Self { varity, harity }
    }

    pub fn arity(&self) -> usize {
        self.varity + self.harity
    }
}

/// One skeleton call discovered in user source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instantiation {
    pub skeleton: Skeleton,
    pub function: String,
    #[serde(default = "one")]
    pub varity: usize,
    #[serde(default = "one")]
    pub harity: usize,
}

fn one() -> usize {
    1
}

impl Instantiation {
    pub fn shape(&self) -> SkeletonShape {
        SkeletonShape::new(self.varity, self.harity)
    }
}
