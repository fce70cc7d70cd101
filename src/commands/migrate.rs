use crate::config::AppConfig;
use crate::rewrite::assertions::rewrite_assertions;
use crate::rewrite::imports::{
    add_sibling_import_extensions, deps_path, relocate_deps_import, rewrite_framework_imports,
};
use crate::rewrite::mocks::{comment_out_module_mocks, strip_vi_import};
use crate::utils::{collect_files_with_suffix, copy_tree, display_rel, ensure_dir, write_atomic};
use anyhow::{Context, Result, bail};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct MigrationSummary {
    pub total: usize,
    pub migrated: usize,
    pub failures: Vec<(PathBuf, String)>,
    /// `None` on a dry run.
    pub backup_dir: Option<PathBuf>,
}

/// Rewrites every legacy test file under the configured source root.
pub struct Migrator<'a> {
    cfg: &'a AppConfig,
}

impl<'a> Migrator<'a> {
    pub fn new(cfg: &'a AppConfig) -> Self {
        Self { cfg }
    }

    fn root(&self) -> &Path {
        &self.cfg.src
    }

    /// Copy the whole source tree to `<backup_root>/<prefix><stamp>/<src name>`.
    /// Returns the backup directory.
    pub fn backup(&self, stamp: &str) -> Result<PathBuf> {
        let opts = &self.cfg.migrate;
        let backup_dir = opts
            .backup_root
            .join(format!("{}{}", opts.backup_prefix, stamp));

        let root_abs = self
            .root()
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", self.root().display()))?;
        let backup_root_abs = if opts.backup_root.exists() {
            opts.backup_root.canonicalize()
        } else {
            std::path::absolute(&opts.backup_root)
        }
        .with_context(|| format!("failed to resolve {}", opts.backup_root.display()))?;
        if backup_root_abs.starts_with(&root_abs) {
            bail!(
                "backup location {} is inside the source tree {}",
                opts.backup_root.display(),
                self.root().display()
            );
        }
        if backup_dir.exists() {
            bail!("backup directory already exists: {}", backup_dir.display());
        }

        let name = root_abs
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "src".into());
        let copied = copy_tree(self.root(), &backup_dir.join(name))?;
        tracing::debug!(copied, "backup complete");
        Ok(backup_dir)
    }

    /// Apply the full rewrite pipeline to the text of `file`.
    pub fn transform(&self, file: &Path, content: &str) -> String {
        let deps = deps_path(file, self.root(), &self.cfg.migrate.deps_module);
        let content = rewrite_framework_imports(content);
        let content = relocate_deps_import(&content, &deps);
        let content = rewrite_assertions(&content);
        let content = add_sibling_import_extensions(&content, &self.cfg.import_extension());
        let content = comment_out_module_mocks(&content);
        strip_vi_import(&content)
    }

    /// `widget.test.ts` -> `widget_test.ts`, next to the original.
    pub fn migrated_path(&self, file: &Path) -> PathBuf {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let new_stem = stem.replace(&self.cfg.legacy_marker, &self.cfg.new_marker);
        match file.extension() {
            Some(ext) => file.with_file_name(format!("{}.{}", new_stem, ext.to_string_lossy())),
            None => file.with_file_name(new_stem),
        }
    }

    /// Rewrite and rename one file. The original is removed only after the
    /// new file has been written.
    pub fn migrate_file(&self, file: &Path, dry_run: bool) -> Result<PathBuf> {
        let content = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let migrated = self.transform(file, &content);
        let new_file = self.migrated_path(file);
        if dry_run {
            let changed = migrated != content;
            tracing::debug!(changed, "dry run: {}", file.display());
            return Ok(new_file);
        }

        write_atomic(&new_file, &migrated, file)?;
        if new_file != file {
            fs::remove_file(file)
                .with_context(|| format!("failed to remove {}", file.display()))?;
        }
        Ok(new_file)
    }

    /// Back up, then migrate every candidate. Only a missing root or a failed
    /// backup is an error; per-file failures land in the summary.
    pub fn run(&self, stamp: &str, dry_run: bool) -> Result<MigrationSummary> {
        ensure_dir(self.root())?;

        let backup_dir = if dry_run {
            None
        } else {
            let dir = self.backup(stamp).context("backup failed, nothing was migrated")?;
            println!("Created backup at {}", dir.display());
            Some(dir)
        };

        let files = collect_files_with_suffix(self.root(), &self.cfg.legacy_suffix())?;
        println!("\nFound {} test files to migrate\n", files.len());

        let mut summary = MigrationSummary {
            total: files.len(),
            backup_dir,
            ..MigrationSummary::default()
        };
        for file in &files {
            println!("Processing: {}", display_rel(file, self.root()));
            match self.migrate_file(file, dry_run) {
                Ok(new_file) => {
                    let verb = if dry_run { "Would migrate" } else { "Migrated" };
                    println!("  ✓ {} to: {}", verb, display_rel(&new_file, self.root()));
                    summary.migrated += 1;
                }
                Err(e) => {
                    tracing::error!("error migrating {}: {:#}", file.display(), e);
                    summary.failures.push((file.clone(), format!("{:#}", e)));
                }
            }
        }
        Ok(summary)
    }
}

fn print_summary(summary: &MigrationSummary) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("Migration complete!");
    println!(
        "Successfully migrated {}/{} files",
        summary.migrated, summary.total
    );
    for (file, err) in &summary.failures {
        println!("  ✗ {}: {}", file.display(), err);
    }
    match &summary.backup_dir {
        Some(dir) => println!("Backup saved to: {}", dir.display()),
        None => println!("Dry run: no backup taken, no files written"),
    }
    println!("{rule}");
    println!("\nNext steps:");
    println!("1. Review the migrated files manually");
    println!("2. Address any TODO comments for mocks");
    println!("3. Fix any complex assertions that weren't auto-converted");
    println!("4. Run: deno task test");
    if let Some(dir) = &summary.backup_dir {
        println!("5. If successful, delete backup: rm -rf {}", dir.display());
    }
}

/// Execute the migrate command
pub fn migrate(cfg: &AppConfig, dry_run: bool) -> Result<()> {
    tracing::info!(src=%cfg.src.display(), dry_run, "migrate start");
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let summary = Migrator::new(cfg).run(&stamp, dry_run)?;
    print_summary(&summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    const WIDGET_TEST: &str = r#"import { describe, it, expect, vi } from 'vitest';
import { Widget } from './widget';
vi.mock('./transport');

describe('Widget', () => {
  it('renders', () => {
    const w = new Widget();
    expect(w.size).toBe(42);
    expect(w.visible).toBeTruthy();
  });
});
"#;

    fn setup() -> (TempDir, AppConfig) {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("widget.ts"), "export class Widget {}\n").unwrap();
        fs::write(src.join("widget.test.ts"), WIDGET_TEST).unwrap();
        fs::write(
            src.join("a/b/deep.test.ts"),
            "import { describe, it, expect } from \"vitest\";\nexpect(x).toBeNull();\n",
        )
        .unwrap();
        let mut cfg = AppConfig {
            src,
            ..AppConfig::default()
        };
        cfg.migrate.backup_root = dir.path().join("backups");
        (dir, cfg)
    }

    #[test]
    fn transform_rewrites_imports_assertions_and_mocks() {
        let (_dir, cfg) = setup();
        let m = Migrator::new(&cfg);
        let out = m.transform(&cfg.src.join("widget.test.ts"), WIDGET_TEST);
        assert!(out.starts_with(
            "import { describe, it, assertEquals, assertExists, assertThrows } from \"../deps.ts\";\n"
        ));
        assert!(out.contains("import { Widget } from './widget.ts';"));
        assert!(out.contains("// TODO: Migrate mock to Deno compatible pattern\n"));
        assert!(!out.contains("vi.mock"));
        assert!(out.contains("assertEquals(w.size, 42);"));
        assert!(out.contains("assertEquals(!!w.visible, true);"));
    }

    #[test]
    fn transform_uses_depth_correct_deps_path() {
        let (_dir, cfg) = setup();
        let m = Migrator::new(&cfg);
        let out = m.transform(
            &cfg.src.join("a/b/deep.test.ts"),
            "import { it } from 'vitest';\n",
        );
        assert_eq!(out, "import { it } from \"../../../deps.ts\";\n");
    }

    #[test]
    fn migrated_path_swaps_marker() {
        let (_dir, cfg) = setup();
        let m = Migrator::new(&cfg);
        assert_eq!(
            m.migrated_path(Path::new("src/widget.test.ts")),
            PathBuf::from("src/widget_test.ts")
        );
    }

    #[test]
    fn run_renames_backs_up_and_reports() {
        let (dir, cfg) = setup();
        let summary = Migrator::new(&cfg).run("20250101-000000", false).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.migrated, 2);
        assert!(summary.failures.is_empty());

        assert!(!cfg.src.join("widget.test.ts").exists());
        let migrated = fs::read_to_string(cfg.src.join("widget_test.ts")).unwrap();
        assert!(migrated.contains("assertEquals(w.size, 42)"));
        let deep = fs::read_to_string(cfg.src.join("a/b/deep_test.ts")).unwrap();
        assert!(deep.contains("from \"../../../deps.ts\""));
        assert!(deep.contains("assertEquals(x, null)"));
        // non-candidates are untouched
        assert_eq!(
            fs::read_to_string(cfg.src.join("widget.ts")).unwrap(),
            "export class Widget {}\n"
        );

        let backup = summary.backup_dir.unwrap();
        assert_eq!(
            backup,
            dir.path().join("backups/migration-backup-20250101-000000")
        );
        assert_eq!(
            fs::read_to_string(backup.join("src/widget.test.ts")).unwrap(),
            WIDGET_TEST
        );
        assert!(backup.join("src/widget.ts").is_file());
        assert!(backup.join("src/a/b/deep.test.ts").is_file());
    }

    #[test]
    fn one_bad_file_does_not_stop_the_batch() {
        let (_dir, cfg) = setup();
        let bad = cfg.src.join("broken.test.ts");
        fs::write(&bad, [0xffu8, 0xfe, 0x00]).unwrap();

        let summary = Migrator::new(&cfg).run("20250101-000001", false).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.migrated, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, bad);
        assert_eq!(fs::read(&bad).unwrap(), vec![0xffu8, 0xfe, 0x00]);
        assert!(!cfg.src.join("broken_test.ts").exists());
    }

    #[test]
    fn backup_happens_even_without_candidates() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("mod.ts"), "export {};\n").unwrap();
        let mut cfg = AppConfig {
            src,
            ..AppConfig::default()
        };
        cfg.migrate.backup_root = dir.path().to_path_buf();

        let summary = Migrator::new(&cfg).run("20250101-000002", false).unwrap();
        assert_eq!(summary.total, 0);
        let backup = summary.backup_dir.unwrap();
        assert!(backup.join("src/mod.ts").is_file());
    }

    #[test]
    fn existing_backup_aborts_before_any_change() {
        let (_dir, cfg) = setup();
        fs::create_dir_all(
            cfg.migrate
                .backup_root
                .join("migration-backup-20250101-000003"),
        )
        .unwrap();

        let err = Migrator::new(&cfg)
            .run("20250101-000003", false)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("backup failed"));
        assert!(cfg.src.join("widget.test.ts").exists());
        assert!(!cfg.src.join("widget_test.ts").exists());
    }

    #[test]
    fn backup_inside_source_tree_is_refused() {
        let (_dir, mut cfg) = setup();
        cfg.migrate.backup_root = cfg.src.join("backups");
        assert!(Migrator::new(&cfg).run("20250101-000004", false).is_err());
        assert!(cfg.src.join("widget.test.ts").exists());
    }

    #[test]
    fn same_name_is_overwritten_in_place() {
        let (_dir, mut cfg) = setup();
        cfg.new_marker = cfg.legacy_marker.clone();
        let summary = Migrator::new(&cfg).run("20250101-000005", false).unwrap();
        assert_eq!(summary.migrated, 2);
        let content = fs::read_to_string(cfg.src.join("widget.test.ts")).unwrap();
        assert!(content.contains("assertEquals(w.size, 42)"));
    }

    #[cfg(unix)]
    #[test]
    fn migrated_file_keeps_mode_of_original() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, cfg) = setup();
        let original = cfg.src.join("widget.test.ts");
        fs::set_permissions(&original, fs::Permissions::from_mode(0o644)).unwrap();

        let new_file = Migrator::new(&cfg).migrate_file(&original, false).unwrap();
        assert!(!original.exists());
        let mode = fs::metadata(&new_file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (_dir, cfg) = setup();
        let summary = Migrator::new(&cfg).run("20250101-000006", true).unwrap();
        assert_eq!(summary.migrated, 2);
        assert!(summary.backup_dir.is_none());
        assert!(!cfg.migrate.backup_root.exists());
        assert_eq!(
            fs::read_to_string(cfg.src.join("widget.test.ts")).unwrap(),
            WIDGET_TEST
        );
    }
}
