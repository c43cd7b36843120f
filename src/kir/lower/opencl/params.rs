//! Parameter lists for one OpenCL kernel and its host wrapper.
//!
//! Kernel parameters, host parameters, marshaled host arguments and the
//! signature are built in one pass, so they cannot drift apart. Call
//! arguments follow the user function's declaration order: index, then
//! elementwise, containers, scalars.

use super::HOST_BUFFER;
use crate::kir::proxy::{self, ContainerFields, Placement};
use crate::model::{IndexingMode, Side, UserFunction};
use crate::naming::RESERVED_PREFIX;
use crate::runtime::ArgSlot;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamLists {
    pub kernel_params: Vec<String>,
    pub host_params: Vec<String>,
    pub kernel_args: Vec<String>,
    pub call_args: Vec<String>,
    pub proxies_outer: Vec<String>,
    pub proxies_inner: Vec<String>,
    pub index_initializer: Option<String>,
    pub slots: Vec<ArgSlot>,
}

/// Name of the index local passed to indexed user functions.
pub fn index_local() -> String {
    format!("{}index", RESERVED_PREFIX)
}

impl ParamLists {
    pub fn assemble(function: &UserFunction) -> Self {
        let mut lists = ParamLists::default();

        match function.indexing {
            IndexingMode::None => {}
            IndexingMode::Linear => {
                lists.index_initializer =
                    Some(format!("index1_t {} = {{ .i = base + i }};", index_local()));
                lists.call_args.push(index_local());
            }
            IndexingMode::RowCol => {
                lists.index_initializer = Some(format!(
                    "index2_t {} = {{ .row = (base + i) / w, .col = (base + i) % w }};",
                    index_local()
                ));
                lists.call_args.push(index_local());
            }
        }

        for param in &function.elementwise {
            let (name, ty) = (&param.name, &param.resolved_type);
            lists.kernel_params.push(format!("__global {} *{}", ty, name));
            lists.push_buffer(name, ty);
            lists.call_args.push(match param.side {
                Side::Vertical => format!("{}[i / Hsize]", name),
                Side::Horizontal => format!("{}[i % Hsize]", name),
            });
        }

        for param in &function.containers {
            let fields = ContainerFields::of(param);
            let ty = &param.resolved_type;

            lists.kernel_params.push(format!("__global {} *{}", ty, fields.data));
            lists.push_buffer(&fields.data, ty);
            for (_, buffer) in &fields.index_buffers {
                lists
                    .kernel_params
                    .push(format!("__global size_t *{}", buffer));
                lists.push_buffer(buffer, "size_t");
            }
            for (_, size) in &fields.sizes {
                lists.kernel_params.push(format!("size_t {}", size));
                lists.host_params.push(format!("size_t {}", size));
                lists.kernel_args.push(size.clone());
                lists.slots.push(ArgSlot::Size { name: size.clone() });
            }

            match proxy::initializer(param) {
                (Placement::BeforeLoop, text) => lists.proxies_outer.push(text),
                (Placement::PerIteration, text) => lists.proxies_inner.push(text),
            }
            lists.call_args.push(param.name.clone());
        }

        for param in &function.scalars {
            let (name, ty) = (&param.name, &param.resolved_type);
            lists.kernel_params.push(format!("{} {}", ty, name));
            lists.host_params.push(format!("{} {}", ty, name));
            lists.kernel_args.push(name.clone());
            lists.call_args.push(name.clone());
            lists.slots.push(ArgSlot::Scalar {
                name: name.clone(),
                ty: ty.clone(),
            });
        }

        lists
    }

    fn push_buffer(&mut self, name: &str, elem_type: &str) {
        self.host_params
            .push(format!("{}<{}> *{}", HOST_BUFFER, elem_type, name));
        self.kernel_args
            .push(format!("{}->getDeviceDataPointer()", name));
        self.slots.push(ArgSlot::Buffer {
            name: name.to_string(),
            elem_type: elem_type.to_string(),
        });
    }
}

/// Render a list that is spliced in front of fixed trailing parameters:
/// every item is followed by `", "`.
pub fn leading_list(items: &[String]) -> String {
    items.iter().map(|item| format!("{}, ", item)).collect()
}

/// Render statements one per line at the given tab depth.
pub fn statement_block(lines: &[String], depth: usize) -> String {
    let indent = "\t".repeat(depth);
    lines
        .iter()
        .map(|line| format!("{}{}\n", indent, line))
        .collect()
}
