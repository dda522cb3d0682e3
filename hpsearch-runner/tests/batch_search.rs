#![cfg(unix)]

mod common;

use hpsearch_core::MaxWait;
use hpsearch_runner::scenario::{SearchTarget, fixed_source};
use hpsearch_runner::service::{CsvDirectorySource, FixedDetector};
use hpsearch_runner::{BatchSearchScenario, HarnessError, MetricColumns, ScenarioOutcome};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use common::{delayed_result, fast_config, write_params, write_wrapper};

fn scenario(tmp: &TempDir, config_files: Vec<PathBuf>, max_wait: MaxWait) -> BatchSearchScenario {
    BatchSearchScenario::new(
        fast_config(tmp.path(), max_wait),
        Arc::new(FixedDetector(true)),
    )
    .with_config_files(config_files)
    .with_sources(fixed_source(Arc::new(CsvDirectorySource::default())))
}

#[tokio::test]
async fn batch_search_waits_for_every_submitted_job() {
    let tmp = TempDir::new().unwrap();
    let body = format!(
        "echo Submitted batch job 11\necho Submitted batch job 12\nmkdir -p logs\n{}{}",
        delayed_result("0.05", "m1", "0.55"),
        delayed_result("0.15", "m2", "0.687"),
    );
    let script_dir = write_wrapper(tmp.path(), &body);
    let config = write_params(tmp.path(), "nn_ecfp.json", &script_dir);

    let outcome = scenario(&tmp, vec![config], MaxWait::Limited(Duration::from_secs(10)))
        .run()
        .await
        .unwrap();

    let reports = match outcome {
        ScenarioOutcome::Passed(reports) => reports,
        ScenarioOutcome::Skipped => panic!("scenario should not skip"),
    };
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].submitted_jobs, 2);
    assert!(reports[0].result_rows >= 2);
    assert_eq!(reports[0].checks[0].column, "best_test_r2_score");
    assert_eq!(reports[0].checks[0].best, 0.687);

    // cleaned after the search
    assert!(!tmp.path().join("logs").exists());
}

#[tokio::test]
async fn batch_search_runs_config_files_in_order() {
    let tmp = TempDir::new().unwrap();
    let body = format!(
        "echo Submitted batch job 1\n{}",
        delayed_result("0.02", "model", "0.9")
    );
    let script_dir = write_wrapper(tmp.path(), &body);
    let first = write_params(tmp.path(), "nn_ecfp.json", &script_dir);
    let second = write_params(tmp.path(), "nn_graphconv.json", &script_dir);

    let reports = scenario(
        &tmp,
        vec![first.clone(), second.clone()],
        MaxWait::Limited(Duration::from_secs(10)),
    )
    .run()
    .await
    .unwrap()
    .passed()
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].config_file, first);
    assert_eq!(reports[1].config_file, second);
}

#[tokio::test]
async fn batch_search_rejects_weak_models() {
    let tmp = TempDir::new().unwrap();
    let body = format!(
        "echo Submitted batch job 5\n{}",
        delayed_result("0.02", "weak", "0.6")
    );
    let script_dir = write_wrapper(tmp.path(), &body);
    let config = write_params(tmp.path(), "nn_ecfp.json", &script_dir);

    let err = scenario(&tmp, vec![config], MaxWait::Limited(Duration::from_secs(10)))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::BelowThreshold { .. }));
}

#[tokio::test]
async fn batch_search_without_submissions_has_no_results() {
    let tmp = TempDir::new().unwrap();
    let script_dir = write_wrapper(tmp.path(), "echo sbatch: error: invalid account\nexit 1\n");
    let config = write_params(tmp.path(), "nn_ecfp.json", &script_dir);

    let err = scenario(&tmp, vec![config], MaxWait::Unlimited)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::NoResults));
}

#[tokio::test]
async fn batch_search_times_out_with_missing_results() {
    let tmp = TempDir::new().unwrap();
    let script_dir = write_wrapper(
        tmp.path(),
        "echo Submitted batch job 1\necho Submitted batch job 2\n",
    );
    let config = write_params(tmp.path(), "nn_ecfp.json", &script_dir);
    fs::create_dir_all(tmp.path().join("results")).unwrap();

    let err = scenario(&tmp, vec![config], MaxWait::Limited(Duration::from_millis(60)))
        .run()
        .await
        .unwrap_err();

    // the directory is readable but empty, so the last table has no metric rows
    assert!(matches!(err, HarnessError::NoMetricColumns(_)));
}

#[tokio::test]
async fn batch_search_checks_each_target_on_its_own_columns() {
    let tmp = TempDir::new().unwrap();
    let body = "echo Submitted batch job 3\n\
        (sleep 0.02; mkdir -p results/gc; \
         printf 'model_uuid,test_r2_score,best_test_r2_score\\ngc,0.66,0.41\\n' > results/gc/part.tmp; \
         mv results/gc/part.tmp results/gc/perf_results.csv) >/dev/null 2>&1 &\n";
    let script_dir = write_wrapper(tmp.path(), body);
    let graphconv = write_params(tmp.path(), "nn_graphconv.json", &script_dir);

    let reports = BatchSearchScenario::new(
        fast_config(tmp.path(), MaxWait::Limited(Duration::from_secs(10))),
        Arc::new(FixedDetector(true)),
    )
    .with_targets(vec![
        SearchTarget::new(graphconv.clone()).with_columns(MetricColumns::test_r2()),
    ])
    .with_sources(fixed_source(Arc::new(CsvDirectorySource::default())))
    .run()
    .await
    .unwrap()
    .passed()
    .unwrap();

    assert_eq!(reports[0].checks.len(), 1);
    assert_eq!(reports[0].checks[0].column, "test_r2_score");

    // the same table fails when best_test_r2_score is also checked
    let err = scenario(&tmp, vec![graphconv], MaxWait::Limited(Duration::from_secs(10)))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::BelowThreshold { ref column, .. } if column == "best_test_r2_score"
    ));
}
