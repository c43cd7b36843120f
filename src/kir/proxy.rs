//! Container proxies: in-kernel accessor structs over device buffers.
//!
//! One definition is emitted per distinct `(kind, element type)` pair,
//! ordered kind-then-type so output is byte-stable across runs.

use std::collections::BTreeSet;

use crate::model::{ContainerKind, ContainerParam};
use crate::naming::{sanitize, RESERVED_PREFIX};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyKey {
    pub kind: ContainerKind,
    pub resolved_type: String,
}

impl ProxyKey {
    pub fn of(param: &ContainerParam) -> Self {
        Self {
            kind: param.kind,
            resolved_type: param.resolved_type.clone(),
        }
    }

    /// In-kernel struct name, e.g. `skel_matrix_float`.
    pub fn type_name(&self) -> String {
        proxy_type_name(self.kind, &self.resolved_type)
    }
}

pub fn proxy_type_name(kind: ContainerKind, resolved_type: &str) -> String {
    format!("{}{}_{}", RESERVED_PREFIX, kind.name(), sanitize(resolved_type))
}

/// Deduplicated proxy keys of one user function.
#[derive(Clone, Debug, Default)]
pub struct ProxySet {
    keys: BTreeSet<ProxyKey>,
}

impl ProxySet {
    pub fn collect<'a>(params: impl IntoIterator<Item = &'a ContainerParam>) -> Self {
        Self {
            keys: params.into_iter().map(ProxyKey::of).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ProxyKey> {
        self.keys.iter()
    }

    /// One definition block per key, in emission order.
    pub fn definitions(&self) -> Vec<String> {
        self.keys.iter().map(definition).collect()
    }

    pub fn render(&self) -> String {
        self.definitions().concat()
    }
}

/// Struct definition plus accessor functions for one proxy key.
pub fn definition(key: &ProxyKey) -> String {
    let t = &key.resolved_type;
    let p = key.type_name();
    match key.kind {
        ContainerKind::Vector => format!(
            "typedef struct {{\n\t__global {t} *data;\n\tsize_t size;\n}} {p};\n\n\
             static inline {t} {p}_at({p} v, size_t index) {{ return v.data[index]; }}\n\n"
        ),
        ContainerKind::Matrix => format!(
            "typedef struct {{\n\t__global {t} *data;\n\tsize_t rows;\n\tsize_t cols;\n}} {p};\n\n\
             static inline {t} {p}_at({p} m, size_t row, size_t col) {{ return m.data[row * m.cols + col]; }}\n\n"
        ),
        ContainerKind::SparseMatrix => format!(
            "typedef struct {{\n\t__global {t} *data;\n\t__global size_t *row_offsets;\n\
             \t__global size_t *col_indices;\n\tsize_t count;\n}} {p};\n\n\
             static inline size_t {p}_row_begin({p} m, size_t row) {{ return m.row_offsets[row]; }}\n\
             static inline size_t {p}_row_end({p} m, size_t row) {{ return m.row_offsets[row + 1]; }}\n\
             static inline size_t {p}_col({p} m, size_t k) {{ return m.col_indices[k]; }}\n\
             static inline {t} {p}_value({p} m, size_t k) {{ return m.data[k]; }}\n\n"
        ),
        ContainerKind::MatrixRow => format!(
            "typedef struct {{\n\t__global {t} *data;\n\tsize_t cols;\n}} {p};\n\n\
             static inline {t} {p}_at({p} r, size_t col) {{ return r.data[col]; }}\n\n"
        ),
        ContainerKind::Tensor3 => format!(
            "typedef struct {{\n\t__global {t} *data;\n\tsize_t size_i;\n\tsize_t size_j;\n\tsize_t size_k;\n}} {p};\n\n\
             static inline {t} {p}_at({p} t, size_t i, size_t j, size_t k) \
             {{ return t.data[(i * t.size_j + j) * t.size_k + k]; }}\n\n"
        ),
        ContainerKind::Tensor4 => format!(
            "typedef struct {{\n\t__global {t} *data;\n\tsize_t size_i;\n\tsize_t size_j;\n\tsize_t size_k;\n\tsize_t size_l;\n}} {p};\n\n\
             static inline {t} {p}_at({p} t, size_t i, size_t j, size_t k, size_t l) \
             {{ return t.data[((i * t.size_j + j) * t.size_k + k) * t.size_l + l]; }}\n\n"
        ),
    }
}

/// Where a proxy initializer goes relative to the grid-stride loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Once per worker, before the loop.
    BeforeLoop,
    /// Every iteration, because the proxy depends on `i`.
    PerIteration,
}

/// Kernel-side names of the buffers and shape fields backing one container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerFields {
    pub data: String,
    /// `(field, kernel parameter)` pairs for the plain size fields.
    pub sizes: Vec<(&'static str, String)>,
    /// Extra index buffers (CSR row offsets and column indices).
    pub index_buffers: Vec<(&'static str, String)>,
}

impl ContainerFields {
    pub fn of(param: &ContainerParam) -> Self {
        let name = &param.name;
        let field = |f: &str| format!("{}{}_{}", RESERVED_PREFIX, f, name);
        let sizes = |fs: &[&'static str]| fs.iter().map(|f| (*f, field(f))).collect();
        let data = field("data");
        match param.kind {
            ContainerKind::Vector => Self {
                data,
                sizes: sizes(&["size"]),
                index_buffers: Vec::new(),
            },
            ContainerKind::Matrix => Self {
                data,
                sizes: sizes(&["rows", "cols"]),
                index_buffers: Vec::new(),
            },
            ContainerKind::SparseMatrix => Self {
                data,
                sizes: vec![("count", field("count"))],
                index_buffers: vec![
                    ("row_offsets", field("row_offsets")),
                    ("col_indices", field("col_indices")),
                ],
            },
            ContainerKind::MatrixRow => Self {
                data,
                sizes: sizes(&["cols"]),
                index_buffers: Vec::new(),
            },
            ContainerKind::Tensor3 => Self {
                data,
                sizes: sizes(&["size_i", "size_j", "size_k"]),
                index_buffers: Vec::new(),
            },
            ContainerKind::Tensor4 => Self {
                data,
                sizes: sizes(&["size_i", "size_j", "size_k", "size_l"]),
                index_buffers: Vec::new(),
            },
        }
    }
}

/// The statement that builds the proxy value the user function receives.
pub fn initializer(param: &ContainerParam) -> (Placement, String) {
    let fields = ContainerFields::of(param);
    let type_name = proxy_type_name(param.kind, &param.resolved_type);

    let data = if param.kind.is_per_iteration() {
        let cols = &fields.sizes[0].1;
        format!("({} + i * {})", fields.data, cols)
    } else {
        fields.data.clone()
    };

    let mut members = vec![format!(".data = {}", data)];
    members.extend(
        fields
            .index_buffers
            .iter()
            .map(|(f, kernel)| format!(".{} = {}", f, kernel)),
    );
    members.extend(fields.sizes.iter().map(|(f, kernel)| format!(".{} = {}", f, kernel)));

    let text = format!("{} {} = {{ {} }};", type_name, param.name, members.join(", "));
    let placement = if param.kind.is_per_iteration() {
        Placement::PerIteration
    } else {
        Placement::BeforeLoop
    };
    (placement, text)
}
