//! Fixtures shared by the scenario tests
//!
//! Stand-ins for the search wrapper and the workflow tool are small shell
//! scripts written into a scratch directory.

#![allow(dead_code)]

use hpsearch_core::MaxWait;
use hpsearch_runner::HarnessConfig;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Harness configuration with millisecond timings
pub fn fast_config(workdir: &Path, max_wait: MaxWait) -> HarnessConfig {
    let mut config = HarnessConfig::new(workdir.to_path_buf()).with_max_wait(max_wait);
    config.poll_interval = Duration::from_millis(20);
    config.status_wait_interval = Duration::from_millis(10);
    config.settle_period = Duration::ZERO;
    config
}

/// Writes a search wrapper that runs `body` under `sh`
///
/// Returns the directory to use as `script_dir`.
pub fn write_wrapper(workdir: &Path, body: &str) -> PathBuf {
    let script_dir = workdir.join("pipeline");
    fs::create_dir_all(script_dir.join("utils")).unwrap();
    fs::write(
        script_dir.join("utils/hyperparam_search_wrapper.py"),
        body,
    )
    .unwrap();
    script_dir
}

/// Writes a search configuration launching the wrapper with `sh`
pub fn write_params(workdir: &Path, name: &str, script_dir: &Path) -> PathBuf {
    let path = workdir.join(name);
    let json = serde_json::json!({
        "script_dir": script_dir,
        "python_path": "sh",
        "result_dir": "results",
        "prediction_type": "regression",
        "model_type": "NN",
    });
    fs::write(&path, json.to_string()).unwrap();
    PathBuf::from(name)
}

/// Writes an executable script and returns its path
pub fn write_executable(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Shell snippet writing one results file atomically after `delay` seconds
pub fn delayed_result(delay: &str, model: &str, score: &str) -> String {
    format!(
        "(sleep {delay}; mkdir -p results/{model}; \
         printf 'model_uuid,best_test_r2_score\\n{model},{score}\\n' > results/{model}/part.tmp; \
         mv results/{model}/part.tmp results/{model}/perf_results.csv) >/dev/null 2>&1 &\n"
    )
}
