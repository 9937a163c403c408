//! Integration tests for logging system

use bridge_traits::time::{ConsoleLogger, LogLevel};
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use std::sync::Arc;

#[test]
fn test_logging_initializes_once() {
    // Only one global subscriber can be installed per process
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(Arc::new(ConsoleLogger::default()));

    init_logging(config.clone()).unwrap();
    tracing::info!(target: "core_collect", "logging ready");

    let second = init_logging(config);
    assert!(second.is_err());
}

#[test]
fn test_invalid_filter_is_rejected_before_install() {
    let config = LoggingConfig::default().with_filter("core_collect=notalevel");
    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Invalid log filter"));
}

#[test]
fn test_token_redaction() {
    assert_eq!(redact_if_sensitive("linkding_token", "abc123"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Token abc123"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("target", "linkding"), "linkding");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
