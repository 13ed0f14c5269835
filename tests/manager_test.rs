//! Integration tests for ConfigManager: cascade loading, pushes, diagnostics.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use cascade_config::util::testing::{init_test_setup, RecordingSink};
use cascade_config::{
    ConfigManager, EmptyContainerPolicy, ManagerOptions, MergePolicy, RawValue, PATHS_KEY,
};

const HOST: &str = "test-server.com";

/// Two sites, each with `default.toml`; site2 adds a host-specific file.
struct Sites {
    _dir: TempDir,
    site1: PathBuf,
    site2: PathBuf,
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[fixture]
fn sites() -> Sites {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let site1 = dir.path().join("site1");
    let site2 = dir.path().join("site2");
    fs::create_dir_all(&site1).unwrap();
    fs::create_dir_all(&site2).unwrap();

    write(
        &site1,
        "default.toml",
        r#"
one = 1
sausage = ["chorizo", "andouille"]
"#,
    );
    write(
        &site2,
        "default.toml",
        r#"
one = 2
sausage = ["italian"]
site = "my-site"
"#,
    );
    write(
        &site2,
        &format!("{HOST}.toml"),
        r#"
debug = "blargh"

[helmet.value]
option = "geezer"
"#,
    );

    Sites {
        _dir: dir,
        site1,
        site2,
    }
}

fn options(sites: &Sites) -> ManagerOptions {
    ManagerOptions::new()
        .with_search_dirs([sites.site1.clone(), sites.site2.clone()])
        .with_hostname(HOST)
}

#[rstest]
fn given_two_sites_when_loading_then_later_sources_win(sites: Sites) {
    // Arrange
    let sink = Arc::new(RecordingSink::default());

    // Act
    let manager = ConfigManager::load(options(&sites).with_logger(sink.clone()));

    // Assert
    assert_eq!(manager.get_i64("one"), Some(2));
    assert_eq!(manager.get_str("site"), Some("my-site"));
    assert_eq!(manager.get_str("debug"), Some("blargh"));
    assert_eq!(manager.get_str("helmet.value.option"), Some("geezer"));
    assert_eq!(
        manager.get_list("sausage"),
        Some(
            &[
                RawValue::from("chorizo"),
                RawValue::from("andouille"),
                RawValue::from("italian"),
            ][..]
        )
    );
    assert!(sink.messages().is_empty());

    assert!(manager.get("cleborgh").is_none());
    assert_eq!(
        sink.messages(),
        vec!["A request for a configuration option 'Configuration->cleborgh' was attempted but it has not been set."]
    );
}

#[rstest]
fn given_two_sites_when_loading_then_files_in_cascade_order(sites: Sites) {
    let manager = ConfigManager::load(options(&sites));

    assert_eq!(
        manager.files(),
        &[
            sites.site1.join("default.toml"),
            sites.site2.join("default.toml"),
            sites.site2.join(format!("{HOST}.toml")),
        ]
    );
}

#[rstest]
fn given_loaded_cascade_when_reading_paths_key_then_lists_search_dirs(sites: Sites) {
    let manager = ConfigManager::load(options(&sites));

    let paths = manager.get_list(PATHS_KEY).expect("paths recorded");
    assert_eq!(
        paths,
        &[
            RawValue::from(sites.site1.display().to_string()),
            RawValue::from(sites.site2.display().to_string()),
        ]
    );
}

#[test]
fn given_no_search_dirs_when_loading_then_paths_key_exists_but_empty() {
    let manager = ConfigManager::load(
        ManagerOptions::new().with_search_dirs(Vec::<PathBuf>::new()),
    );

    assert!(manager.has(PATHS_KEY));
    assert!(manager.get(PATHS_KEY).is_none());
    assert!(manager.files().is_empty());
}

#[rstest]
fn given_missing_segment_when_getting_then_reports_path_to_failing_segment(sites: Sites) {
    let sink = Arc::new(RecordingSink::default());
    let manager = ConfigManager::load(options(&sites).with_logger(sink.clone()));

    assert!(manager.get("helmet.visor.option").is_none());

    assert_eq!(
        sink.messages(),
        vec!["A request for a configuration option 'Configuration->helmet->visor' was attempted but it has not been set."]
    );
}

#[rstest]
fn given_custom_root_name_when_missing_then_path_uses_root_name(sites: Sites) {
    let sink = Arc::new(RecordingSink::default());
    let manager = ConfigManager::load(
        options(&sites)
            .with_root_name("Site")
            .with_logger(sink.clone()),
    );

    assert!(manager.get("nope").is_none());

    assert_eq!(
        sink.messages(),
        vec!["A request for a configuration option 'Site->nope' was attempted but it has not been set."]
    );
}

#[rstest]
fn given_loaded_cascade_when_pushing_file_then_merges_on_top(sites: Sites) {
    // Arrange
    let mut manager = ConfigManager::load(options(&sites));
    let extra = write(
        sites.site2.parent().unwrap(),
        "local.toml",
        r#"
one = 3
sausage = ["merguez"]

[helmet.value]
color = "red"
"#,
    );

    // Act
    let pushed = manager.push_file(&extra);

    // Assert
    assert!(pushed);
    assert_eq!(manager.get_i64("one"), Some(3));
    assert_eq!(manager.get_list("sausage").map(|l| l.len()), Some(4));
    assert_eq!(manager.get_str("helmet.value.option"), Some("geezer"));
    assert_eq!(manager.get_str("helmet.value.color"), Some("red"));
    assert_eq!(manager.files().last(), Some(&extra));
}

#[rstest]
fn given_json_source_when_pushing_then_merged_like_toml(sites: Sites) {
    let mut manager = ConfigManager::load(options(&sites));
    let extra = write(
        sites.site2.parent().unwrap(),
        "override.json",
        r#"{"site": "json-site", "helmet": {"value": {"option": "visor"}}, "sausage": ["bratwurst"]}"#,
    );

    assert!(manager.push_file(&extra));

    assert_eq!(manager.get_str("site"), Some("json-site"));
    assert_eq!(manager.get_str("helmet.value.option"), Some("visor"));
    assert_eq!(
        manager.get_list("sausage").and_then(|l| l.last()),
        Some(&RawValue::from("bratwurst"))
    );
}

#[rstest]
fn given_missing_push_file_when_pushing_then_reports_and_keeps_tree(sites: Sites) {
    let sink = Arc::new(RecordingSink::default());
    let mut manager = ConfigManager::load(options(&sites).with_logger(sink.clone()));
    let missing = sites.site1.join("missing.toml");

    assert!(!manager.push_file(&missing));

    assert_eq!(manager.get_i64("one"), Some(2));
    assert_eq!(
        sink.messages(),
        vec![format!("Failed to load configuration file {}", missing.display())]
    );
}

#[rstest]
fn given_malformed_file_in_cascade_when_loading_then_skipped_with_diagnostic(sites: Sites) {
    // Arrange: site1 gets a broken host file between the two good defaults
    let broken = write(&sites.site1, &format!("{HOST}.toml"), "one = = 7\n");
    let sink = Arc::new(RecordingSink::default());

    // Act
    let manager = ConfigManager::load(options(&sites).with_logger(sink.clone()));

    // Assert
    assert_eq!(manager.get_i64("one"), Some(2));
    assert!(!manager.files().contains(&broken));
    assert_eq!(
        sink.messages(),
        vec![format!("Failed to load configuration file {}", broken.display())]
    );
}

#[rstest]
#[case(EmptyContainerPolicy::Skip, Some(3))]
#[case(EmptyContainerPolicy::Clear, None)]
fn given_empty_list_in_later_source_when_merging_then_policy_decides(
    sites: Sites,
    #[case] policy: EmptyContainerPolicy,
    #[case] expected_len: Option<usize>,
) {
    let mut manager = ConfigManager::load(options(&sites).with_policy(MergePolicy {
        empty_containers: policy,
    }));
    let extra = write(
        sites.site2.parent().unwrap(),
        "empty.toml",
        "sausage = []\n",
    );

    assert!(manager.push_file(&extra));

    assert_eq!(manager.get_list("sausage").map(|l| l.len()), expected_len);
}

#[rstest]
fn given_false_value_when_reading_then_get_misses_but_has_finds(sites: Sites) {
    let mut manager = ConfigManager::load(options(&sites));

    manager.set("feature.enabled", false).unwrap();

    assert!(manager.get("feature.enabled").is_none());
    assert!(manager.has("feature.enabled"));
    assert!(!manager.has("feature.missing"));
}

#[rstest]
fn given_loaded_cascade_when_extracting_then_deserializes_subtree(sites: Sites) {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Value {
        option: String,
    }

    let manager = ConfigManager::load(options(&sites));

    let value: Value = manager.extract("helmet.value").unwrap();

    assert_eq!(
        value,
        Value {
            option: "geezer".into()
        }
    );
}

#[rstest]
fn given_quoted_keys_with_dots_when_reading_segments_then_found(sites: Sites) {
    // Arrange
    let mut manager = ConfigManager::load(options(&sites));
    let extra = write(
        sites.site2.parent().unwrap(),
        "dotted.toml",
        r#"
"db.host" = "x"

[hosts]
"a.example.com" = 1
"#,
    );

    // Act
    assert!(manager.push_file(&extra));

    // Assert
    assert!(manager.has_path(&["db.host"]));
    assert_eq!(
        manager.get_path(&["db.host"]).and_then(|e| e.as_str()),
        Some("x")
    );
    assert_eq!(
        manager
            .get_path(&["hosts", "a.example.com"])
            .and_then(|e| e.as_i64()),
        Some(1)
    );
    assert!(!manager.has("db.host"));
}

#[rstest]
fn given_empty_list_when_append_policy_then_key_exists(sites: Sites) {
    let mut manager = ConfigManager::load(options(&sites).with_policy(MergePolicy {
        empty_containers: EmptyContainerPolicy::Append,
    }));
    let extra = write(
        sites.site2.parent().unwrap(),
        "empty.toml",
        "site = []\nfresh = []\nsausage = []\n",
    );

    assert!(manager.push_file(&extra));

    assert!(manager.has("fresh"));
    assert!(manager.has("site"));
    assert!(manager.get("site").is_none());
    assert_eq!(manager.get_list("sausage").map(|l| l.len()), Some(3));
}
