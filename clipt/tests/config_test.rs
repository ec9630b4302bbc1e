use clipt::graph::UnknownToolPolicy;
use clipt::AgentConfig;
use std::io::Write;

#[test]
fn test_env_overrides_file_values() {
    // Only this test touches CLIPT_ variables
    std::env::set_var("CLIPT_MAX_STEPS", "7");
    std::env::set_var("CLIPT_STREAM__KEYWORDS", "Answer:,Done:");

    let config = AgentConfig::from_toml_str_with_env(
        r#"
            max_steps = 20
            unknown_tools = "fail"
        "#,
    )
    .unwrap();

    std::env::remove_var("CLIPT_MAX_STEPS");
    std::env::remove_var("CLIPT_STREAM__KEYWORDS");

    assert_eq!(config.max_steps, 7);
    assert_eq!(config.stream.keywords, vec!["Answer:", "Done:"]);
    assert_eq!(config.unknown_tools, UnknownToolPolicy::Fail);
    assert_eq!(config.finish_marker, "[FINISH]");
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("clipt-config-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "system_prompt = \"Be brief.\"").unwrap();
    writeln!(file, "[logging]").unwrap();
    writeln!(file, "format = \"json\"").unwrap();
    drop(file);

    let config = AgentConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.system_prompt(), "Be brief.");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_file_is_optional_for_load() {
    let path = std::env::temp_dir().join("clipt-config-does-not-exist.toml");
    let config = AgentConfig::load(Some(&path)).unwrap();

    assert_eq!(config.stream.sink_capacity, 256);
}
