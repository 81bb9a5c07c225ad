// tests/logging_levels.rs

use treewatch::logging::parse_level_str;

#[test]
fn level_names_parse_case_insensitively() {
    assert_eq!(parse_level_str("debug"), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level_str(" INFO "), Some(tracing::Level::INFO));
    assert_eq!(parse_level_str("Warning"), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("trace"), Some(tracing::Level::TRACE));
    assert_eq!(parse_level_str("error"), Some(tracing::Level::ERROR));
}

#[test]
fn unknown_level_names_fall_back() {
    assert_eq!(parse_level_str(""), None);
    assert_eq!(parse_level_str("verbose"), None);
}
