//! Integration tests for run config loading
//!
//! Covers path resolution, validation and running a loaded config.

use jar_rewriter::config::{load_from_path, load_from_str, ConfigError, ValidationIssue};
use jar_rewriter::task::{run, RunOptions};
use std::fs::{self, File};
use std::io::{Read, Write};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Helper to create a workspace with an input jar, mappings and a patch
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();

    let mut zip = ZipWriter::new(File::create(dir.path().join("client.jar")).unwrap());
    zip.start_file("net/minecraft/Timer.java", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(
        b"public class Timer {\n    float field_74281_c;\n\n    void func_74275_a() {\n        this.field_74281_c = 0.0F;\n    }\n}\n",
    )
    .unwrap();
    zip.finish().unwrap();

    let mappings = dir.path().join("conf");
    fs::create_dir(&mappings).unwrap();
    fs::write(
        mappings.join("methods.csv"),
        "searge,name,side,desc\nfunc_74275_a,updateTimer,0,\n",
    )
    .unwrap();
    fs::write(
        mappings.join("fields.csv"),
        "searge,name,side,desc\nfield_74281_c,renderPartialTicks,0,\n",
    )
    .unwrap();
    fs::write(mappings.join("params.csv"), "param,name,side\n").unwrap();

    let patches = dir.path().join("patches/minecraft/net/minecraft");
    fs::create_dir_all(&patches).unwrap();
    fs::write(
        patches.join("Timer.java.patch"),
        "\
--- ../src-base/minecraft/net/minecraft/Timer.java
+++ ../src-work/minecraft/net/minecraft/Timer.java
@@ -4,3 +4,3 @@
     void updateTimer() {
-        this.renderPartialTicks = 0.0F;
+        this.renderPartialTicks = 1.0F;
     }
",
    )
    .unwrap();

    dir
}

const RUN_CONFIG: &str = r#"
[archive]
input = "client.jar"
output = "build/client-patched.jar"

[remap]
methods = "conf/methods.csv"
fields = "conf/fields.csv"
params = "conf/params.csv"

[patch]
patches = "patches"
max_fuzz = 1
"#;

#[test]
fn test_relative_paths_resolve_against_config_dir() {
    let dir = setup_test_workspace();
    let config_path = dir.path().join("rewrite.toml");
    fs::write(&config_path, RUN_CONFIG).unwrap();

    let config = load_from_path(&config_path).unwrap();

    assert_eq!(config.archive.input, dir.path().join("client.jar"));
    assert_eq!(
        config.archive.output,
        dir.path().join("build/client-patched.jar")
    );
    let remap = config.remap.as_ref().unwrap();
    assert_eq!(remap.methods, dir.path().join("conf/methods.csv"));
    assert!(remap.javadocs);
    let patch = config.patch.as_ref().unwrap();
    assert_eq!(patch.patches, dir.path().join("patches"));
    assert_eq!(patch.max_fuzz, 1);
    assert!(patch.make_rejects);
}

#[test]
fn test_load_from_str_keeps_relative_paths() {
    let config = load_from_str(RUN_CONFIG).unwrap();
    assert_eq!(config.archive.input.to_str(), Some("client.jar"));
}

#[test]
fn test_validation_error_carries_path() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("empty.toml");
    fs::write(
        &config_path,
        "[archive]\ninput = \"same.jar\"\noutput = \"same.jar\"\n",
    )
    .unwrap();

    let err = load_from_path(&config_path).unwrap_err();
    match &err {
        ConfigError::Validation { path, source } => {
            assert_eq!(path.as_deref(), Some(config_path.as_path()));
            assert!(source.issues.contains(&ValidationIssue::NoStages));
            assert!(source
                .issues
                .iter()
                .any(|issue| matches!(issue, ValidationIssue::InvalidCombo { .. })));
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert!(err.to_string().contains("empty.toml"));
}

#[test]
fn test_unknown_field_is_a_toml_error() {
    let err = load_from_str(
        r#"
[archive]
input = "in.jar"
output = "out.jar"

[patch]
patches = "patches"
fuzz = 3
"#,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Toml { path: None, .. }));
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let err = load_from_path(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_run_loaded_config_remaps_then_patches() {
    let dir = setup_test_workspace();
    let config_path = dir.path().join("rewrite.toml");
    fs::write(&config_path, RUN_CONFIG).unwrap();

    let config = load_from_path(&config_path).unwrap();
    let outcome = run(&config, RunOptions::default()).unwrap();

    let report = outcome.patch.unwrap();
    assert_eq!(report.hunks.success, 1);
    assert!(report.documents[0].reject_file.is_none());

    let mut archive =
        ZipArchive::new(File::open(dir.path().join("build/client-patched.jar")).unwrap()).unwrap();
    let mut text = String::new();
    archive
        .by_name("net/minecraft/Timer.java")
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(
        text,
        "public class Timer {\n    float renderPartialTicks;\n\n    void updateTimer() {\n        this.renderPartialTicks = 1.0F;\n    }\n}\n"
    );
}
