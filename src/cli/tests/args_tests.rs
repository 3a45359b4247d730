use clap::Parser;
use std::path::Path;

use super::args::{CliArgs, Command, OutputFormat};

#[test]
fn parses_check_defaults() {
    let args = CliArgs::try_parse_from(["patchref", "check", "manifest.json"])
        .expect("default args should parse");

    let Command::Check(check) = args.command;
    assert_eq!(check.manifest, Path::new("manifest.json"));
    assert_eq!(check.format, OutputFormat::Text);
    assert!(check.probe.is_empty());
    assert!(!check.no_cache);
    assert!(!check.no_color);
    assert_eq!(check.max_base_depth, None);
}

#[test]
fn parses_check_flags() {
    let args = CliArgs::try_parse_from([
        "patchref",
        "check",
        "mods/manifest.json",
        "--format",
        "json",
        "--probe",
        "Managed",
        "--probe",
        "plugins",
        "--no-cache",
        "--max-base-depth",
        "12",
        "--no-color",
    ])
    .expect("flagged args should parse");

    let Command::Check(check) = args.command;
    assert_eq!(check.format, OutputFormat::Json);
    assert_eq!(
        check.probe,
        vec![Path::new("Managed").to_path_buf(), Path::new("plugins").to_path_buf()]
    );
    assert!(check.no_cache);
    assert!(check.no_color);
    assert_eq!(check.max_base_depth, Some(12));
}

#[test]
fn rejects_unknown_format() {
    let result = CliArgs::try_parse_from(["patchref", "check", "m.json", "--format", "xml"]);
    assert!(result.is_err());
}

#[test]
fn requires_subcommand_and_manifest() {
    assert!(CliArgs::try_parse_from(["patchref"]).is_err());
    assert!(CliArgs::try_parse_from(["patchref", "check"]).is_err());
}
