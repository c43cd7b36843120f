use std::process;

use clap::Args;

use super::{resolve_input, InputArgs};

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

pub fn cmd_check(args: CheckArgs) {
    let resolved = resolve_input(&args.input);
    let errors = skelc::driver::check(&resolved.graph, &resolved.options);
    if !errors.is_empty() {
        resolved.report(&errors);
        eprintln!("error: {} problem(s) in {}", errors.len(), resolved.manifest.display());
        process::exit(1);
    }
    eprintln!(
        "OK: {} ({} function(s), {} instantiation(s))",
        resolved.manifest.display(),
        resolved.graph.functions().len(),
        resolved.graph.instantiations().len()
    );
}
