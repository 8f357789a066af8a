use court_manager::{BackendKind, Config, ConfigError};
use std::collections::HashMap;
use std::path::PathBuf;

fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_apply_when_unset_or_empty() {
    let config = config_from(&[("PORT", ""), ("BACKEND", "  ")]).unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.backend, BackendKind::Storage);
    assert_eq!(config.storage_dir, PathBuf::from("data"));
    assert!(config.access_token.is_none());
}

#[test]
fn values_are_read_from_the_lookup() {
    let config = config_from(&[
        ("HOST", "127.0.0.1"),
        ("PORT", "9000"),
        ("API_URL", "https://api.courts.example"),
        ("BACKEND", "HTTP"),
        ("STORAGE_DIR", "/var/lib/courts"),
        ("ACCESS_TOKEN", "t0ken"),
    ])
    .unwrap();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 9000);
    assert_eq!(config.api_url, "https://api.courts.example");
    assert_eq!(config.backend, BackendKind::Http);
    assert_eq!(config.storage_dir, PathBuf::from("/var/lib/courts"));
    assert_eq!(config.access_token.as_deref(), Some("t0ken"));
}

#[test]
fn bad_values_are_rejected() {
    assert!(matches!(
        config_from(&[("PORT", "eighty")]),
        Err(ConfigError::InvalidPort(p)) if p == "eighty"
    ));
    assert!(matches!(
        config_from(&[("BACKEND", "sqlite")]),
        Err(ConfigError::UnknownBackend(b)) if b == "sqlite"
    ));
    assert_eq!("mock".parse::<BackendKind>().ok(), Some(BackendKind::Storage));
}
