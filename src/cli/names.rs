use std::process;

use clap::Args;

use super::{resolve_input, InputArgs};

#[derive(Args)]
pub struct NamesArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Also print wrapper class names
    #[arg(long)]
    pub wrappers: bool,
}

/// Print one kernel name per distinct instantiation, in generation order.
pub fn cmd_names(args: NamesArgs) {
    let resolved = resolve_input(&args.input);
    let plan = match skelc::driver::plan(&resolved.graph, &resolved.options) {
        Ok(plan) => plan,
        Err(e) => {
            resolved.report(&[e]);
            process::exit(1);
        }
    };
    for (inst, names) in plan {
        if args.wrappers {
            println!("{}\t{}\t{}", names.kernel, names.wrapper, inst.function);
        } else {
            println!("{}", names.kernel);
        }
    }
}
