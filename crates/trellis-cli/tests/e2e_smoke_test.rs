use std::{fs, path::PathBuf};

use tempfile::tempdir;

use trellis_cli::{Args, CliError, Nudge, run};

/// Collects all .toml snapshots from a directory
fn collect_snapshots(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

/// Demos live at the workspace root, not in the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args_for(input: &PathBuf, output: PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        config: None,
        queries: Vec::new(),
        nudges: Vec::new(),
        write_snapshot: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_snapshots(demos_path());
    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let output_filename = format!("{}.txt", demo_path.file_stem().unwrap().to_string_lossy());
        let output_path = temp_dir.path().join(output_filename);

        if let Err(e) = run(&args_for(demo_path, output_path)) {
            failed_demos.push((demo_path.clone(), e));
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed_demos.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let error_demos = collect_snapshots(demos_path().join("errors"));
    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.txt",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        if run(&args_for(demo_path, output_path)).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_checkout_report_and_queries() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("checkout.txt");

    let mut args = args_for(&demos_path().join("checkout.toml"), output_path.clone());
    args.queries = vec![
        "lifelineClusters[2]".to_string(),
        "fragmentClusters[1]/outerGates[1]".to_string(),
    ];
    run(&args).expect("checkout demo runs");

    let report = fs::read_to_string(output_path).unwrap();
    assert!(report.starts_with("interaction checkout\n"));
    assert!(report.contains("lifelineClusters[2] = Shop [lifeline] column 2 row 1"));
    assert!(report.contains("fragmentClusters[1]/outerGates[1] = auth_out [actual gate] column 4"));
    assert!(report.contains("settle AsynchSignal"));
}

#[test]
fn e2e_nudge_writes_snapshot() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("checkout.txt");
    let snapshot_path = temp_dir.path().join("nudged.toml");

    let mut args = args_for(&demos_path().join("checkout.toml"), output_path);
    args.nudges = vec![Nudge {
        row: 3,
        delta: 20.0,
    }];
    args.write_snapshot = Some(snapshot_path.to_string_lossy().to_string());
    run(&args).expect("nudged checkout demo runs");

    let nudged = fs::read_to_string(&snapshot_path).unwrap();
    assert!(nudged.contains("v_authorize"));

    // The written snapshot is a valid input again
    let rerun = args_for(&snapshot_path, temp_dir.path().join("rerun.txt"));
    run(&rerun).expect("nudged snapshot builds");
}

#[test]
fn e2e_rejected_nudge_is_reported() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let mut args = args_for(
        &demos_path().join("checkout.toml"),
        temp_dir.path().join("checkout.txt"),
    );
    args.nudges = vec![Nudge {
        row: 3,
        delta: -100.0,
    }];

    assert!(matches!(
        run(&args),
        Err(CliError::Graph(trellis::GraphError::MutationRejected(_)))
    ));
}

#[test]
fn e2e_invalid_snapshot_carries_source() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("broken.toml");
    fs::write(&input, "[interaction]\nlifelines = 3\n").unwrap();

    let result = run(&args_for(&input, temp_dir.path().join("broken.txt")));
    match result {
        Err(CliError::Snapshot { src, .. }) => assert!(src.contains("lifelines = 3")),
        other => panic!("Expected snapshot error, got {other:?}"),
    }
}
