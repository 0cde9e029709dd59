use std::{fs, path::PathBuf};

use tempfile::tempdir;

use weft_cli::{Args, run};

/// Collects all .weft files from a directory
fn collect_weft_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("weft")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

/// Samples live at the workspace root, not in the crate
fn samples_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("samples")
}

fn args(input: &PathBuf, out_dir: &std::path::Path) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        out_dir: out_dir.to_string_lossy().to_string(),
        config: None,
        package: None,
        log_level: "off".to_string(),
        allow_errors: false,
        dump_ast: false,
    }
}

#[test]
fn e2e_smoke_test_valid_samples() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let samples = collect_weft_files(samples_dir());

    assert!(!samples.is_empty(), "No samples found in samples/");

    let mut failed = Vec::new();
    for sample in &samples {
        match run(&args(sample, temp_dir.path())) {
            Ok(written) => {
                let go = fs::read_to_string(&written.go).expect("Go output written");
                assert!(go.starts_with("// Code generated by weft. DO NOT EDIT.\n"));
                if let Some(wgsl) = &written.wgsl {
                    assert!(wgsl.exists());
                }
            }
            Err(e) => failed.push((sample.clone(), e)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nValid samples that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid sample(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_samples() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let samples = collect_weft_files(samples_dir().join("errors"));

    assert!(!samples.is_empty(), "No error samples found in samples/errors/");

    let unexpectedly_succeeded: Vec<_> = samples
        .iter()
        .filter(|sample| run(&args(sample, temp_dir.path())).is_ok())
        .collect();

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError samples that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error sample(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_particles_writes_three_files() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let sample = samples_dir().join("particles.weft");

    let written = run(&args(&sample, temp_dir.path())).expect("particles compiles");

    assert_eq!(written.go, temp_dir.path().join("particles.gen.go"));
    assert_eq!(
        written.wgsl.as_deref(),
        Some(temp_dir.path().join("particles.wgsl").as_path())
    );
    assert_eq!(
        written.host.as_deref(),
        Some(temp_dir.path().join("particles_gpu.gen.go").as_path())
    );
    let wgsl = fs::read_to_string(temp_dir.path().join("particles.wgsl")).expect("wgsl");
    assert!(wgsl.contains("@compute @workgroup_size(64)"));
}

#[test]
fn e2e_allow_errors_writes_output() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let sample = samples_dir().join("errors").join("undefined_variable.weft");

    let mut strict = args(&sample, temp_dir.path());
    assert!(run(&strict).is_err());
    assert!(!temp_dir.path().join("undefined_variable.gen.go").exists());

    strict.allow_errors = true;
    let written = run(&strict).expect("--allow-errors writes anyway");
    assert!(written.go.exists());
}

#[test]
fn e2e_package_override() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let sample = samples_dir().join("counter.weft");

    let mut custom = args(&sample, temp_dir.path());
    custom.package = Some("widgets".to_string());
    let written = run(&custom).expect("counter compiles");

    let go = fs::read_to_string(written.go).expect("Go output written");
    assert!(go.contains("package widgets\n"));
}
