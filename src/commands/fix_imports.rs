use crate::config::AppConfig;
use crate::rewrite::imports::normalize_import_extensions;
use crate::utils::{collect_files_with_extension, display_rel, ensure_dir, write_atomic};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub scanned: usize,
    pub modified: usize,
    pub failed: usize,
}

/// Rewrite one file in place. Returns whether the content changed; the file
/// is only written when it did.
fn fix_file(path: &Path, extension: &str, dry_run: bool) -> Result<bool> {
    let original =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let updated = normalize_import_extensions(&original, extension);
    if updated == original {
        return Ok(false);
    }
    if !dry_run {
        write_atomic(path, &updated, path)?;
    }
    Ok(true)
}

/// Normalize relative import extensions for every non-test source file under
/// `cfg.src`. A file that fails is logged and counted as not modified.
pub fn fix_imports_in_tree(cfg: &AppConfig, dry_run: bool) -> Result<NormalizeSummary> {
    ensure_dir(&cfg.src)?;
    let extension = cfg.import_extension();
    let (files, walk_errors) = collect_files_with_extension(&cfg.src, &cfg.extension);
    let files: Vec<_> = files
        .into_iter()
        .filter(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            !cfg.is_test_file_name(name)
        })
        .collect();

    let mut summary = NormalizeSummary {
        scanned: files.len(),
        failed: walk_errors.len(),
        ..NormalizeSummary::default()
    };
    for err in &walk_errors {
        let path = err
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| cfg.src.display().to_string());
        tracing::warn!("skipping unreadable entry {}: {}", path, err);
    }
    for file in &files {
        match fix_file(file, &extension, dry_run) {
            Ok(true) => {
                summary.modified += 1;
                let verb = if dry_run { "Would fix" } else { "Fixed" };
                println!("✓ {}: {}", verb, display_rel(file, &cfg.src));
            }
            Ok(false) => tracing::debug!("unchanged: {}", file.display()),
            Err(e) => {
                summary.failed += 1;
                tracing::error!("error processing {}: {:#}", file.display(), e);
            }
        }
    }
    Ok(summary)
}

/// Execute the fix-imports command
pub fn fix_imports(cfg: &AppConfig, dry_run: bool) -> Result<()> {
    tracing::info!(src=%cfg.src.display(), dry_run, "fixing relative import extensions");
    let summary = fix_imports_in_tree(cfg, dry_run)?;
    println!();
    println!(
        "Modified {}/{} files{}",
        summary.modified,
        summary.scanned,
        if dry_run { " (dry run)" } else { "" }
    );
    if summary.failed > 0 {
        tracing::warn!("{} files could not be processed", summary.failed);
    }
    Ok(())
}
