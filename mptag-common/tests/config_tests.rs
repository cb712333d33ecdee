//! Integration tests for TOML config loading

use mptag_common::config::{load_toml_config, BotConfig};
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_no_config_path_yields_defaults() {
    let config = load_toml_config(None).unwrap();
    assert!(config.bot_token.is_none());
    assert!(config.keep_alive_url.is_none());
    assert!(config.port.is_none());
    assert!(config.work_dir.is_none());
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(Some(&dir.path().join("absent.toml"))).unwrap();
    assert!(config.bot_token.is_none());
}

#[test]
fn test_full_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mptag.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "bot_token = \"123:abc\"\n\
         keep_alive_url = \"https://bot.example.com\"\n\
         port = 3000\n\
         work_dir = \"/var/tmp/mptag\""
    )
    .unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.bot_token.as_deref(), Some("123:abc"));
    assert_eq!(
        config.keep_alive_url.as_deref(),
        Some("https://bot.example.com")
    );
    assert_eq!(config.port, Some(3000));
    assert_eq!(config.work_dir, Some(PathBuf::from("/var/tmp/mptag")));
}

#[test]
fn test_broken_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "bot_token = [not toml").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
fn test_resolve_from_file_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mptag.toml");
    std::fs::write(&path, "bot_token = \"123:abc\"").unwrap();

    let toml = load_toml_config(Some(&path)).unwrap();
    let config = BotConfig::resolve(None, None, None, None, toml).unwrap();
    assert_eq!(config.bot_token, "123:abc");
    assert_eq!(config.work_dir, PathBuf::from("."));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mptag.toml");
    std::fs::write(&path, "port = 9090").unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.port, Some(9090));
    assert!(config.bot_token.is_none());
}
