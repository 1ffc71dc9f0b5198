use crate::support::{build_jar, entry_text, read_jar};
use jar_rewriter::config::{ArchiveSection, PatchSection, RemapSection, RunConfig};
use jar_rewriter::patch::{reject_path, HunkStatus, PatchError};
use jar_rewriter::task::{run, RunOptions, TaskError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BLOCK: &str = "package net.minecraft.block;\n\npublic class Block {\n    int hardness = 1;\n}\n";

const BLOCK_PATCH: &str = "\
--- ../src-base/minecraft/net/minecraft/block/Block.java
+++ ../src-work/minecraft/net/minecraft/block/Block.java
@@ -2,4 +2,4 @@

 public class Block {
-    int hardness = 1;
+    int hardness = 2;
 }
";

fn patch_config(dir: &Path, patches: &Path) -> RunConfig {
    RunConfig {
        archive: ArchiveSection {
            input: dir.join("in.jar"),
            output: dir.join("out/out.jar"),
        },
        remap: None,
        patch: Some(PatchSection::new(patches)),
    }
}

#[test]
fn test_single_exact_patch() {
    let dir = TempDir::new().unwrap();
    let patches = dir.path().join("patches");
    fs::create_dir_all(&patches).unwrap();
    let patch_file = patches.join("Block.java.patch");
    fs::write(&patch_file, BLOCK_PATCH).unwrap();

    build_jar(
        &dir.path().join("in.jar"),
        &[
            ("net/minecraft/block/Block.java", BLOCK.as_bytes()),
            ("assets/logo.png", &[0x89, b'P', b'N', b'G', 0, 1, 2]),
        ],
    );

    let config = patch_config(dir.path(), &patches);
    let outcome = run(&config, RunOptions::default()).unwrap();

    let entries = read_jar(&config.archive.output);
    assert_eq!(
        entries
            .iter()
            .find(|(n, _)| n == "assets/logo.png")
            .map(|(_, d)| d.as_slice()),
        Some(&[0x89, b'P', b'N', b'G', 0, 1, 2][..])
    );
    assert_eq!(
        entry_text(&entries, "net/minecraft/block/Block.java").unwrap(),
        BLOCK.replace("hardness = 1", "hardness = 2")
    );

    let report = outcome.patch.unwrap();
    assert_eq!(report.hunks.success, 1);
    assert_eq!(report.hunks.total(), 1);
    let hunk = &report.documents[0].patches[0].hunks[0];
    assert_eq!(hunk.status, HunkStatus::Success);
    assert!(!reject_path(&patch_file).exists());
}

#[test]
fn test_output_order_and_metadata_filtering() {
    let dir = TempDir::new().unwrap();
    let patches = dir.path().join("patches");
    fs::create_dir_all(&patches).unwrap();

    build_jar(
        &dir.path().join("in.jar"),
        &[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
            ("net/", b""),
            ("net/A.java", b"class A {}\n"),
            ("net/data.json", b"{}"),
            ("net/B.java", b"class B {}\n"),
        ],
    );

    let config = patch_config(dir.path(), &patches);
    let outcome = run(&config, RunOptions::default()).unwrap();

    let names: Vec<String> = read_jar(&config.archive.output)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["net/data.json", "net/A.java", "net/B.java"]);
    assert_eq!(outcome.summary.skipped_metadata, 1);
    assert_eq!(outcome.summary.skipped_directories, 1);
}

#[test]
fn test_fail_on_error_writes_no_archive() {
    let dir = TempDir::new().unwrap();
    let patches = dir.path().join("patches");
    fs::create_dir_all(&patches).unwrap();
    fs::write(
        patches.join("Block.java.patch"),
        BLOCK_PATCH.replace("hardness = 1", "hardness = 7"),
    )
    .unwrap();
    build_jar(
        &dir.path().join("in.jar"),
        &[("net/minecraft/block/Block.java", BLOCK.as_bytes())],
    );

    let mut config = patch_config(dir.path(), &patches);
    if let Some(patch) = config.patch.as_mut() {
        patch.fail_on_error = true;
    }

    let err = run(&config, RunOptions::default()).unwrap_err();
    match err {
        TaskError::HunksFailed { failed, report, .. } => {
            assert_eq!(failed, 1);
            assert!(report.documents[0].reject_file.is_some());
        }
        other => panic!("expected HunksFailed, got {other}"),
    }
    assert!(!config.archive.output.exists());
}

#[test]
fn test_invalid_patch_source_fails_before_archive_io() {
    let dir = TempDir::new().unwrap();
    // Neither the input archive nor the patch source exists.
    let config = patch_config(dir.path(), &dir.path().join("patches.tar.gz"));

    let err = run(&config, RunOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        TaskError::Patch(PatchError::InvalidSource { .. })
    ));
}

#[test]
fn test_remap_then_patch_against_remapped_names() {
    let dir = TempDir::new().unwrap();
    let mappings = dir.path().join("mappings");
    let patches = dir.path().join("patches");
    fs::create_dir_all(&mappings).unwrap();
    fs::create_dir_all(&patches).unwrap();

    fs::write(
        mappings.join("methods.csv"),
        "searge,name,side,desc\nfunc_1_a,getHardness,2,Returns the hardness.\n",
    )
    .unwrap();
    fs::write(
        mappings.join("fields.csv"),
        "searge,name,side,desc\nfield_2_b,hardness,2,\n",
    )
    .unwrap();
    fs::write(mappings.join("params.csv"), "param,name,side\n").unwrap();

    let source = "\
public class Block {
    int field_2_b;

    public int func_1_a() {
        return this.field_2_b;
    }
}
";
    build_jar(
        &dir.path().join("in.jar"),
        &[("net/Block.java", source.as_bytes())],
    );

    // Written against the remapped, documented source.
    fs::write(
        patches.join("Block.java.patch"),
        "\
--- a/b/c/net/Block.java
+++ b/b/c/net/Block.java
@@ -7,3 +7,3 @@
     public int getHardness() {
-        return this.hardness;
+        return this.hardness * 2;
     }
",
    )
    .unwrap();

    let config = RunConfig {
        archive: ArchiveSection {
            input: dir.path().join("in.jar"),
            output: dir.path().join("out.jar"),
        },
        remap: Some(RemapSection {
            methods: mappings.join("methods.csv"),
            fields: mappings.join("fields.csv"),
            params: mappings.join("params.csv"),
            javadocs: true,
        }),
        patch: Some(PatchSection::new(&patches)),
    };

    let outcome = run(
        &config,
        RunOptions {
            capture_changes: true,
        },
    )
    .unwrap();

    let entries = read_jar(&config.archive.output);
    assert_eq!(
        entry_text(&entries, "net/Block.java").unwrap(),
        "\
public class Block {
    int hardness;

    /**
     * Returns the hardness.
     */
    public int getHardness() {
        return this.hardness * 2;
    }
}
"
    );
    assert!(!outcome.patch.unwrap().has_failures());
    assert_eq!(outcome.changes.len(), 1);
    assert_eq!(outcome.changes[0].path, "net/Block.java");
}
