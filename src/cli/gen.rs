use std::process;

use clap::Args;
use skelc::config::{Backend, GeneratorOptions};

use super::{resolve_input, InputArgs};

#[derive(Args)]
pub struct GenArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

pub fn cmd_gen(args: GenArgs) {
    let resolved = resolve_input(&args.input);
    banner(&resolved.options);

    let errors = skelc::driver::check(&resolved.graph, &resolved.options);
    if !errors.is_empty() {
        resolved.report(&errors);
        process::exit(1);
    }

    match skelc::driver::run(&resolved.graph, &resolved.options) {
        Ok(report) => log::info!(
            "{} artifact(s): {} written, {} unchanged",
            report.artifacts.len(),
            report.written,
            report.unchanged
        ),
        Err(e) => {
            resolved.report(&[e]);
            process::exit(1);
        }
    }
}

fn banner(options: &GeneratorOptions) {
    let on_off = |b: Backend| if options.is_enabled(b) { "ON" } else { "OFF" };
    log::info!("# ==================================== #");
    log::info!("~   skelc skeleton kernel generator    ~");
    log::info!("# ------------------------------------ #");
    for backend in Backend::ALL {
        log::info!("   {:<17} {}", format!("{} gen:", backend), on_off(backend));
    }
    log::info!("   Main output file:  {}", options.main_output_path().display());
    log::info!("# ==================================== #");
}
