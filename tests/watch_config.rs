// tests/watch_config.rs
use ai_update_watch::config::watch::ENV_WATCH_CONFIG_PATH;
use ai_update_watch::config::{load_config_default, load_config_from, WatchConfig};
use std::{env, fs};

#[test]
fn repo_config_matches_builtin_defaults() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/watch.toml");
    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg, WatchConfig::default());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_WATCH_CONFIG_PATH);

    // 1) nothing on disk → built-in defaults
    assert_eq!(load_config_default().unwrap(), WatchConfig::default());

    // 2) config/watch.json fallback
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/watch.json"),
        r#"{"npm_packages": ["left-pad"], "feed": {"url": ""}}"#,
    )
    .unwrap();
    let cfg = load_config_default().unwrap();
    assert_eq!(cfg.npm_packages, vec!["left-pad"]);
    assert!(cfg.github_releases.is_empty());
    assert!(cfg.feed.url.is_empty());

    // 3) env wins
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, r#"npm_packages = ["x"]"#).unwrap();
    env::set_var(ENV_WATCH_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().npm_packages, vec!["x"]);

    // 4) env pointing nowhere is an error, not a silent fallback
    env::set_var(ENV_WATCH_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(load_config_default().is_err());
    env::remove_var(ENV_WATCH_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}
