use super::*;
use std::collections::HashMap;

fn config(vars: &[(&str, &str)]) -> TracingConfig {
    let vars: HashMap<&str, &str> = vars.iter().copied().collect();
    TracingConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
}

#[test]
fn parse_known_formats() {
    assert_eq!(LogFormat::parse("tree"), LogFormat::Tree);
    assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
    assert_eq!(LogFormat::parse(" text "), LogFormat::Text);
}

#[test]
fn unknown_format_falls_back_to_text() {
    assert_eq!(LogFormat::parse(""), LogFormat::Text);
    assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
}

#[test]
fn patchref_log_wins_over_rust_log() {
    let both = config(&[("PATCHREF_LOG", "patchref_metadata=trace"), ("RUST_LOG", "warn")]);
    assert_eq!(both.directives.as_deref(), Some("patchref_metadata=trace"));
    assert_eq!(config(&[("RUST_LOG", "warn")]).directives.as_deref(), Some("warn"));
}

#[test]
fn no_directives_means_disabled() {
    let quiet = config(&[("PATCHREF_LOG_FORMAT", "tree")]);
    assert_eq!(quiet.directives, None);
    assert_eq!(quiet.format, LogFormat::Tree);
    // Returns without installing a subscriber.
    quiet.init();
    assert_eq!(config(&[]), TracingConfig::default());
}
