// Config loading and validation tests

use homelab_monitor::config::AppConfig;

const MINIMAL_CONFIG: &str = r#"
[server]
port = 8080
host = "0.0.0.0"

[database]
path = "data/monitor.db"
max_pool_size = 5
"#;

const FULL_CONFIG: &str = r#"
[server]
port = 8080
host = "127.0.0.1"

[database]
path = "data/monitor.db"
max_pool_size = 5

[monitoring]
poll_interval_ms = 30000
daily_report_schedule = "0 30 1 * * *"
monthly_report_schedule = "0 0 4 1 * *"

[docker]
host = "tcp://192.168.1.10:2375"

[events]
topic = "homelab-events"
broadcast_capacity = 64
webhook_url = "http://localhost:9000/hooks/containers"
webhook_timeout_ms = 2000
"#;

#[test]
fn test_config_defaults_when_sections_omitted() {
    let config = AppConfig::load_from_str(MINIMAL_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.database.path, "data/monitor.db");
    assert_eq!(config.database.max_pool_size, 5);
    assert_eq!(config.monitoring.poll_interval_ms, 60_000);
    assert_eq!(config.monitoring.daily_report_schedule, "0 0 2 * * *");
    assert_eq!(config.monitoring.monthly_report_schedule, "0 0 3 1 * *");
    assert!(config.docker.host.is_none());
    assert_eq!(config.events.topic, "container-events");
    assert_eq!(config.events.broadcast_capacity, 256);
    assert!(config.events.webhook_url.is_none());
    assert_eq!(config.events.webhook_timeout_ms, 5_000);
}

#[test]
fn test_config_loads_all_sections() {
    let config = AppConfig::load_from_str(FULL_CONFIG).expect("load_from_str");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.monitoring.poll_interval_ms, 30_000);
    assert_eq!(config.monitoring.daily_report_schedule, "0 30 1 * * *");
    assert_eq!(
        config.docker.host.as_deref(),
        Some("tcp://192.168.1.10:2375")
    );
    assert_eq!(config.events.topic, "homelab-events");
    assert_eq!(config.events.broadcast_capacity, 64);
    assert_eq!(
        config.events.webhook_url.as_deref(),
        Some("http://localhost:9000/hooks/containers")
    );
    assert_eq!(config.events.webhook_timeout_ms, 2_000);
}

#[test]
fn test_config_partial_section_keeps_other_defaults() {
    let s = format!("{}\n[monitoring]\npoll_interval_ms = 5000\n", MINIMAL_CONFIG);
    let config = AppConfig::load_from_str(&s).expect("valid");
    assert_eq!(config.monitoring.poll_interval_ms, 5_000);
    assert_eq!(config.monitoring.daily_report_schedule, "0 0 2 * * *");
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = MINIMAL_CONFIG.replace("port = 8080", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = MINIMAL_CONFIG.replace("path = \"data/monitor.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = MINIMAL_CONFIG.replace("max_pool_size = 5", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn test_config_validation_rejects_poll_interval_zero() {
    let bad = FULL_CONFIG.replace("poll_interval_ms = 30000", "poll_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("poll_interval_ms"));
}

#[test]
fn test_config_validation_rejects_bad_cron() {
    let bad = FULL_CONFIG.replace("\"0 30 1 * * *\"", "\"every night\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("daily_report_schedule"));

    let bad = FULL_CONFIG.replace("\"0 0 4 1 * *\"", "\"0 0 25 1 * *\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("monthly_report_schedule"));
}

#[test]
fn test_config_validation_rejects_broadcast_capacity_zero() {
    let bad = FULL_CONFIG.replace("broadcast_capacity = 64", "broadcast_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("broadcast_capacity"));
}

#[test]
fn test_config_validation_rejects_empty_topic() {
    let bad = FULL_CONFIG.replace("topic = \"homelab-events\"", "topic = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("events.topic"));
}

#[test]
fn test_config_validation_rejects_non_http_webhook() {
    let bad = FULL_CONFIG.replace(
        "http://localhost:9000/hooks/containers",
        "kafka://broker:9092",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("webhook_url"));
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, FULL_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.events.topic, "homelab-events");
}
