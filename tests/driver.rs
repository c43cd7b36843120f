use std::fs;
use std::path::Path;

use skelc::manifest::load_manifest;
use skelc::project::{ProjectConfig, PROJECT_FILE};
use skelc::{Backend, GeneratorOptions};

const NBODY: &str = include_str!("fixtures/nbody.json");

fn options(dir: &Path) -> GeneratorOptions {
    GeneratorOptions {
        output_dir: dir.join("gen"),
        output_name: "nbody".to_string(),
        ..Default::default()
    }
    .with_backend(Backend::OpenCl)
    .with_backend(Backend::OpenMp)
}

#[test]
fn test_run_writes_artifacts_and_main_fragment() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(dir.path());
    let report = skelc::generate_and_write(NBODY, &opts).unwrap();

    assert_eq!(report.artifacts.len(), 2);
    assert_eq!(report.written, 3);
    assert_eq!(report.unchanged, 0);
    assert_eq!(report.main_output, dir.path().join("gen").join("nbody.cpp"));

    for art in &report.artifacts {
        let on_disk = fs::read_to_string(&art.output_path).unwrap();
        assert_eq!(on_disk, art.source_text);
        assert!(art.file_name().ends_with("_cl_source.inl"));
    }

    let main = fs::read_to_string(&report.main_output).unwrap();
    assert!(main.contains("#define SKEL_PRECOMPILED 1\n"));
    assert!(main.contains("#define SKEL_OPENCL 1\n"));
    assert!(main.contains("#define SKEL_OPENMP 1\n"));
    assert!(!main.contains("SKEL_CUDA"));
    assert!(main.contains(
        "#include \"nbody_MapPairsKernel_weighted_1_Varity_2_Harity_1_cl_source.inl\""
    ));
}

#[test]
fn test_second_run_leaves_files_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(dir.path());
    skelc::generate_and_write(NBODY, &opts).unwrap();
    let again = skelc::generate_and_write(NBODY, &opts).unwrap();
    assert_eq!(again.written, 0);
    assert_eq!(again.unchanged, 3);
}

#[test]
fn test_changed_function_rewrites_only_its_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(dir.path());
    skelc::generate_and_write(NBODY, &opts).unwrap();

    let edited = NBODY.replace("return scale * (a + b)", "return scale * (a - b)");
    let report = skelc::generate_and_write(&edited, &opts).unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(report.unchanged, 2);
}

#[test]
fn test_override_extension_and_host_only_run() {
    let dir = tempfile::tempdir().unwrap();
    let opts = GeneratorOptions {
        output_dir: dir.path().to_path_buf(),
        output_name: "nbody.hpp".to_string(),
        override_extension: true,
        ..Default::default()
    }
    .with_backend(Backend::Mpi);

    let report = skelc::generate_and_write(NBODY, &opts).unwrap();
    assert!(report.artifacts.is_empty());
    assert_eq!(report.main_output, dir.path().join("nbody.hpp"));
    let main = fs::read_to_string(&report.main_output).unwrap();
    assert!(main.contains("#define SKEL_MPI 1"));
    assert!(!main.contains("#include"));
}

#[test]
fn test_cuda_request_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(dir.path()).with_backend(Backend::Cuda);
    assert_eq!(opts.main_output_path(), dir.path().join("gen").join("nbody.cu"));

    let diag = skelc::generate_and_write(NBODY, &opts).unwrap_err();
    assert!(diag.message.contains("CUDA"));
    assert!(!dir.path().join("gen").exists());
}

#[test]
fn test_project_file_feeds_options() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("src");
    fs::create_dir_all(&sub).unwrap();
    fs::write(
        dir.path().join(PROJECT_FILE),
        "[generator]\ndir = \"out\"\nname = \"sim\"\nbackends = [\"opencl\"]\npreserve_lines = false\n",
    )
    .unwrap();
    let manifest = sub.join("nbody.json");
    fs::write(&manifest, NBODY).unwrap();

    let toml_path = ProjectConfig::find(&sub).unwrap();
    let mut opts = GeneratorOptions::default();
    ProjectConfig::load(&toml_path).unwrap().apply(&mut opts);
    let (graph, _) = load_manifest(&manifest).unwrap();

    let report = skelc::driver::run(&graph, &opts).unwrap();
    assert_eq!(report.main_output, dir.path().join("out").join("sim.cpp"));
    assert!(report
        .artifacts
        .iter()
        .all(|a| a.kernel_name.starts_with("sim_MapPairsKernel_") && !a.kernel_source.contains("#line")));
}
