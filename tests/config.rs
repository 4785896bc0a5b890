//! Tests for reduction settings.

use anyhow::Result;
use ironselect::{ExecMode, MergeConfig, NullOrdering};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_empty_document_is_default() -> Result<()> {
    let config = MergeConfig::from_json("{}")?;
    assert_eq!(config, MergeConfig::default());
    assert_eq!(config.null_ordering, NullOrdering::NullsLast);
    assert_eq!(config.exec_mode, ExecMode::Parallel { threads: None });
    assert_eq!(config.timeout(), None);
    assert!(config.collect_metrics);
    Ok(())
}

#[test]
fn test_full_document() -> Result<()> {
    let config = MergeConfig::from_json(
        r#"{
            "null_ordering": "nulls_first",
            "exec_mode": { "mode": "parallel", "threads": 3 },
            "timeout_ms": 250,
            "collect_metrics": false
        }"#,
    )?;
    assert_eq!(config.null_ordering, NullOrdering::NullsFirst);
    assert_eq!(config.exec_mode.threads(), 3);
    assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    assert!(!config.collect_metrics);
    Ok(())
}

#[test]
fn test_sequential_mode() -> Result<()> {
    let config = MergeConfig::from_json(r#"{ "exec_mode": { "mode": "sequential" } }"#)?;
    assert_eq!(config.exec_mode, ExecMode::Sequential);
    assert_eq!(config.exec_mode.threads(), 1);
    assert_eq!(config, MergeConfig::sequential());
    Ok(())
}

#[test]
fn test_parallel_threads_default_to_cpus() {
    let threads = ExecMode::Parallel { threads: None }.threads();
    assert_eq!(threads, num_cpus::get().max(1));
}

#[test]
fn test_rejects_zero_threads() {
    let err = MergeConfig::from_json(r#"{ "exec_mode": { "mode": "parallel", "threads": 0 } }"#)
        .unwrap_err();
    assert!(err.to_string().contains("threads"));
}

#[test]
fn test_rejects_unknown_fields() {
    assert!(MergeConfig::from_json(r#"{ "timeout": 5 }"#).is_err());
    assert!(MergeConfig::from_json(r#"{ "exec_mode": { "mode": "distributed" } }"#).is_err());
    assert!(MergeConfig::from_json("not json").is_err());
}

#[test]
fn test_builders() {
    let config = MergeConfig::default()
        .with_null_ordering(NullOrdering::NullsFirst)
        .with_exec_mode(ExecMode::Sequential)
        .with_timeout(Duration::from_millis(1500))
        .with_metrics(false);
    assert_eq!(config.timeout_ms, Some(1500));
    assert_eq!(config.null_ordering, NullOrdering::NullsFirst);
    assert!(config.validate().is_ok());
}

#[test]
fn test_round_trips_through_serde() -> Result<()> {
    let config = MergeConfig::sequential().with_timeout(Duration::from_secs(2));
    let text = serde_json::to_string(&config)?;
    assert_eq!(MergeConfig::from_json(&text)?, config);
    Ok(())
}

#[test]
fn test_from_path() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{ "timeout_ms": 0 }}"#)?;
    let config = MergeConfig::from_path(file.path())?;
    assert_eq!(config.timeout(), Some(Duration::ZERO));

    let missing = file.path().with_extension("missing");
    let err = MergeConfig::from_path(&missing).unwrap_err();
    assert!(err.to_string().contains("reading merge config"));
    Ok(())
}
