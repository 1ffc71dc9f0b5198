use crate::support::{build_jar, entry_text, read_jar};
use jar_rewriter::config::{ArchiveSection, RemapSection, RunConfig};
use jar_rewriter::remap::RemapError;
use jar_rewriter::task::{run, RunOptions, TaskError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ENTITY: &str = "\
package net.minecraft.entity;

public abstract class Entity {
    public World field_70170_p;
    public double field_70165_t;

    @Override
    public boolean func_70097_a(DamageSource p_70097_1_, float p_70097_2_) {
        return func_99999_z(p_70097_1_) && this.field_70170_p != null;
    }
}
";

fn write_mappings(dir: &Path) -> RemapSection {
    fs::write(
        dir.join("methods.csv"),
        "\
searge,name,side,desc
func_70097_a,attackEntityFrom,2,Called when the entity is attacked.
",
    )
    .unwrap();
    fs::write(
        dir.join("fields.csv"),
        "\
searge,name,side,desc
field_70170_p,worldObj,2,Reference to the World object.
field_70165_t,posX,2,
",
    )
    .unwrap();
    fs::write(
        dir.join("params.csv"),
        "\
param,name,side
p_70097_1_,source,2
p_70097_2_,amount,2
",
    )
    .unwrap();

    RemapSection {
        methods: dir.join("methods.csv"),
        fields: dir.join("fields.csv"),
        params: dir.join("params.csv"),
        javadocs: true,
    }
}

fn remap_config(dir: &Path, remap: RemapSection) -> RunConfig {
    RunConfig {
        archive: ArchiveSection {
            input: dir.join("in.jar"),
            output: dir.join("out.jar"),
        },
        remap: Some(remap),
        patch: None,
    }
}

#[test]
fn test_remap_only_run_rewrites_sources_and_copies_resources() {
    let dir = TempDir::new().unwrap();
    let remap = write_mappings(dir.path());
    let texture: Vec<u8> = (0..=255).collect();

    build_jar(
        &dir.path().join("in.jar"),
        &[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
            ("net/minecraft/entity/", b""),
            ("net/minecraft/entity/Entity.java", ENTITY.as_bytes()),
            ("assets/minecraft/textures/steve.png", &texture),
        ],
    );

    let config = remap_config(dir.path(), remap);
    let outcome = run(&config, RunOptions::default()).unwrap();

    assert!(outcome.patch.is_none());
    assert_eq!(outcome.summary.sources, 1);
    assert_eq!(outcome.summary.resources, 1);
    assert_eq!(outcome.summary.skipped_metadata, 1);
    assert_eq!(outcome.summary.skipped_directories, 1);

    let entries = read_jar(&config.archive.output);
    let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
    // Streaming keeps input order.
    assert_eq!(
        names,
        vec![
            "net/minecraft/entity/Entity.java",
            "assets/minecraft/textures/steve.png"
        ]
    );
    assert_eq!(entries[1].1, texture);

    assert_eq!(
        entry_text(&entries, "net/minecraft/entity/Entity.java").unwrap(),
        "\
package net.minecraft.entity;

public abstract class Entity {
    /** Reference to the World object. */
    public World worldObj;
    public double posX;

    /**
     * Called when the entity is attacked.
     */
    @Override
    public boolean attackEntityFrom(DamageSource source, float amount) {
        return func_99999_z(source) && this.worldObj != null;
    }
}
"
    );
}

#[test]
fn test_remap_without_javadocs_only_renames() {
    let dir = TempDir::new().unwrap();
    let remap = RemapSection {
        javadocs: false,
        ..write_mappings(dir.path())
    };
    build_jar(
        &dir.path().join("in.jar"),
        &[("net/minecraft/entity/Entity.java", ENTITY.as_bytes())],
    );

    let config = remap_config(dir.path(), remap);
    run(&config, RunOptions::default()).unwrap();

    let entries = read_jar(&config.archive.output);
    let text = entry_text(&entries, "net/minecraft/entity/Entity.java").unwrap();
    assert!(!text.contains("/**"));
    assert!(text.contains("    public boolean attackEntityFrom(DamageSource source, float amount) {"));
    assert_eq!(text.lines().count(), ENTITY.lines().count());
}

#[test]
fn test_malformed_mapping_row_fails_before_archive_io() {
    let dir = TempDir::new().unwrap();
    let remap = write_mappings(dir.path());
    fs::write(
        &remap.fields,
        "searge,name,side,desc\nfield_70170_p\n",
    )
    .unwrap();

    let config = remap_config(dir.path(), remap);
    let err = run(&config, RunOptions::default()).unwrap_err();

    match err {
        TaskError::Remap(RemapError::Csv { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected a mapping error, got {other}"),
    }
    assert!(!config.archive.output.exists());
}
