//! MapPairs for OpenCL.
//!
//! Output element `i` of an `Vsize x Hsize` cross product applies the user
//! function to vertical elements at `i / Hsize` and horizontal elements at
//! `i % Hsize`. Workers walk `[0, n)` with a grid-stride loop.

use super::params::{leading_list, statement_block, ParamLists};
use super::{prelude, raw_delimiter, user_function, FRAGMENT_SUFFIX};
use crate::artifact::GeneratedArtifact;
use crate::config::Backend;
use crate::error::GenError;
use crate::kir::lower::LoweringRequest;
use crate::kir::proxy::ProxySet;
use crate::kir::template::{Bindings, Template};
use crate::runtime::KernelSignature;

const KERNEL_TEMPLATE: &str = "\
__kernel void {{KERNEL_NAME}}({{KERNEL_PARAMS}}__global {{RESULT_TYPE}} *output, \
size_t w, size_t n, size_t Vsize, size_t Hsize, size_t base)
{
\tsize_t i = get_global_id(0);
\tsize_t gridSize = get_local_size(0) * get_num_groups(0);
{{CONTAINER_PROXIES}}
\twhile (i < n)
\t{
{{INDEX_INITIALIZER}}{{CONTAINER_PROXIES_INNER}}\t\toutput[i] = {{FUNCTION_NAME}}({{CALL_ARGS}});
\t\ti += gridSize;
\t}
}
";

const WRAPPER_TEMPLATE: &str = "\
#include <mutex>
#include <string>
#include <vector>

class {{WRAPPER_NAME}}
{
public:
\tstatic std::vector<cl_kernel> &kernels()
\t{
\t\tstatic std::vector<cl_kernel> table;
\t\treturn table;
\t}

\tstatic void initialize()
\t{
\t\tstatic std::once_flag built;
\t\tstd::call_once(built, []
\t\t{
\t\t\tstd::string source = skel::backend::cl_helpers::replaceSizeT(R\"{{DELIM}}({{KERNEL_SOURCE}}){{DELIM}}\");
\t\t\tauto &devices = skel::backend::Environment<int>::getInstance()->m_devices_CL;
\t\t\tkernels().reserve(devices.size());
\t\t\tfor (skel::backend::Device_CL *device : devices)
\t\t\t{
\t\t\t\tcl_int err;
\t\t\t\tcl_program program = skel::backend::cl_helpers::buildProgram(device, source);
\t\t\t\tcl_kernel kernel = clCreateKernel(program, \"{{KERNEL_NAME}}\", &err);
\t\t\t\tCL_CHECK_ERROR(err, \"Error creating MapPairs kernel '{{KERNEL_NAME}}'\");
\t\t\t\tkernels().push_back(kernel);
\t\t\t}
\t\t});
\t}

\tstatic void map
\t(
\t\tsize_t deviceID, size_t localSize, size_t globalSize,
\t\t{{HOST_PARAMS}}{{HOST_BUFFER}}<{{RESULT_TYPE}}> *output,
\t\tsize_t w, size_t n, size_t Vsize, size_t Hsize, size_t base
\t)
\t{
\t\tinitialize();
\t\tcl_kernel kernel = kernels().at(deviceID);
\t\tskel::backend::cl_helpers::setKernelArgs(kernel, {{KERNEL_ARGS}}output->getDeviceDataPointer(), w, n, Vsize, Hsize, base);
\t\tcl_int err = clEnqueueNDRangeKernel(
\t\t\tskel::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(),
\t\t\tkernel, 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
\t\tCL_CHECK_ERROR(err, \"Error launching MapPairs kernel '{{KERNEL_NAME}}'\");
\t}
};
";

pub(super) fn generate(request: &LoweringRequest<'_>) -> Result<GeneratedArtifact, GenError> {
    let function = request.function;
    let names = request.names;
    let lists = ParamLists::assemble(function);
    let callees = request.graph.callees(function)?;
    let proxies = ProxySet::collect(
        function
            .containers
            .iter()
            .chain(callees.iter().flat_map(|c| &c.function.containers)),
    );
    log::debug!(
        "{}: {} kernel params, {} proxies",
        names.kernel,
        lists.kernel_params.len(),
        proxies.len()
    );

    let mut bindings = Bindings::new();
    bindings.insert("KERNEL_NAME", names.kernel.clone());
    bindings.insert("KERNEL_PARAMS", leading_list(&lists.kernel_params));
    bindings.insert("RESULT_TYPE", function.return_type.clone());
    bindings.insert("CONTAINER_PROXIES", statement_block(&lists.proxies_outer, 1));
    bindings.insert(
        "INDEX_INITIALIZER",
        statement_block(lists.index_initializer.as_slice(), 2),
    );
    bindings.insert("CONTAINER_PROXIES_INNER", statement_block(&lists.proxies_inner, 2));
    bindings.insert("FUNCTION_NAME", function.unique_name.clone());
    bindings.insert("CALL_ARGS", lists.call_args.join(", "));
    let kernel = Template::parse("mappairs_kernel", KERNEL_TEMPLATE).render(&bindings)?;

    let mut kernel_source = prelude(function, &callees, request.graph)?;
    kernel_source.push_str(&proxies.render());
    for callee in &callees {
        kernel_source.push_str(&user_function(
            callee.function,
            &callee.name,
            request.preserve_lines,
        ));
    }
    kernel_source.push_str(&user_function(
        function,
        &function.unique_name,
        request.preserve_lines,
    ));
    kernel_source.push_str(&kernel);

    let mut bindings = Bindings::new();
    bindings.insert("WRAPPER_NAME", names.wrapper.clone());
    bindings.insert("KERNEL_NAME", names.kernel.clone());
    bindings.insert("DELIM", raw_delimiter(&kernel_source)?);
    bindings.insert("KERNEL_SOURCE", kernel_source.clone());
    bindings.insert("HOST_PARAMS", leading_list(&lists.host_params));
    bindings.insert("HOST_BUFFER", super::HOST_BUFFER.to_string());
    bindings.insert("RESULT_TYPE", function.return_type.clone());
    bindings.insert("KERNEL_ARGS", leading_list(&lists.kernel_args));
    let source_text = Template::parse("mappairs_wrapper", WRAPPER_TEMPLATE).render(&bindings)?;

    Ok(GeneratedArtifact {
        backend: Backend::OpenCl,
        skeleton: request.skeleton,
        function: function.unique_name.clone(),
        shape: request.shape,
        kernel_name: names.kernel.clone(),
        wrapper_name: names.wrapper.clone(),
        kernel_source,
        source_text,
        output_path: request
            .output_dir
            .join(format!("{}{}", names.kernel, FRAGMENT_SUFFIX)),
        signature: KernelSignature::new(lists.slots, &function.return_type),
    })
}
