use merganser::config::{ConfigFlags, load_config_flags, parse_flag_tokens};
use merganser::render::Theme;

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".merganserrc");
    let content = r"
# comment
--watch

--theme forest

--script-src=/js/mermaid.min.js
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.watch);
    assert_eq!(flags.theme, Some(Theme::Forest));
    assert_eq!(flags.script_src, Some("/js/mermaid.min.js".to_string()));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".merganserrc");
    let content = "--watch\n--theme forest\n--script-src /js/a.js\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "merganser".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--no-inject".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.watch, "file flags should remain enabled");
    assert!(effective.no_inject, "cli flags should be applied");
    assert_eq!(effective.theme, Some(Theme::Dark), "cli should override theme");
    assert_eq!(
        effective.script_src,
        Some("/js/a.js".to_string()),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "merganser".to_string(),
        "--theme=neutral".to_string(),
        "--script-src=https://example.com/mermaid.js".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.theme, Some(Theme::Neutral));
    assert_eq!(
        flags.script_src,
        Some("https://example.com/mermaid.js".to_string())
    );
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        watch: true,
        in_place: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        no_inject: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.watch);
    assert!(merged.in_place);
    assert!(merged.no_inject);
}
