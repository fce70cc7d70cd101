use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Fail unless `root` is an existing directory.
pub fn ensure_dir(root: &Path) -> Result<()> {
    if !root.is_dir() {
        bail!("source directory not found: {}", root.display());
    }
    Ok(())
}

/// Recursively collect files under `root` whose name ends with `suffix`
/// (`<root>/**/*<suffix>`), sorted for deterministic output.
pub fn collect_files_with_suffix(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{}/**/*{}", escaped, glob::Pattern::escape(suffix));
    let mut files = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("invalid glob {}", pattern))? {
        let path = entry.context("failed to read glob entry")?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Recursively collect files under `root` with the given extension (no dot).
/// Entries the walk could not read are returned next to the files so the
/// caller can report them.
pub fn collect_files_with_extension(
    root: &Path,
    extension: &str,
) -> (Vec<PathBuf>, Vec<walkdir::Error>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    for entry in WalkDir::new(root) {
        match entry {
            Ok(e) => {
                if e.file_type().is_file() && e.path().extension() == Some(OsStr::new(extension)) {
                    files.push(e.into_path());
                }
            }
            Err(e) => errors.push(e),
        }
    }
    files.sort();
    (files, errors)
}

/// Replace `path` with `content` in one step: the text goes to a temporary
/// file in the same directory which is then renamed over the target.
/// Permissions are taken from `mode_from` when it exists, so an in-place
/// rewrite or a renamed copy keeps the original file mode.
pub fn write_atomic(path: &Path, content: &str, mode_from: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    if let Ok(meta) = fs::metadata(mode_from) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Copy the whole tree at `src` to `dst`. `dst` must not exist yet.
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    if dst.exists() {
        bail!("backup target already exists: {}", dst.display());
    }
    let mut copied = 0usize;
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} -> {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Path shown to the user: relative to `base` when possible.
pub fn display_rel(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_dir_rejects_missing_root() {
        let dir = tempdir().unwrap();
        let err = ensure_dir(&dir.path().join("src")).unwrap_err();
        assert!(err.to_string().contains("source directory not found"));
        assert!(ensure_dir(dir.path()).is_ok());
    }

    #[test]
    fn suffix_scan_is_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("z.test.ts"), "").unwrap();
        fs::write(root.join("a/b/deep.test.ts"), "").unwrap();
        fs::write(root.join("a/plain.ts"), "").unwrap();
        fs::write(root.join("a/other_test.ts"), "").unwrap();

        let files = collect_files_with_suffix(root, ".test.ts").unwrap();
        assert_eq!(
            files,
            vec![root.join("a/b/deep.test.ts"), root.join("z.test.ts")]
        );
    }

    #[test]
    fn extension_scan_skips_other_extensions() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("a.ts"), "").unwrap();
        fs::write(root.join("nested/b.ts"), "").unwrap();
        fs::write(root.join("c.json"), "").unwrap();

        let (files, errors) = collect_files_with_extension(root, "ts");
        assert_eq!(files, vec![root.join("a.ts"), root.join("nested/b.ts")]);
        assert!(errors.is_empty());
    }

    #[test]
    fn extension_scan_returns_walk_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        let (files, errors) = collect_files_with_extension(&missing, "ts");
        assert!(files.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path(), Some(missing.as_path()));
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.ts");
        fs::write(&path, "old").unwrap();
        write_atomic(&path, "new", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        // no stray temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_keeps_mode_of_source() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let original = dir.path().join("widget.test.ts");
        fs::write(&original, "old").unwrap();
        fs::set_permissions(&original, fs::Permissions::from_mode(0o644)).unwrap();

        write_atomic(&original, "in place", &original).unwrap();
        let mode = fs::metadata(&original).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);

        let renamed = dir.path().join("widget_test.ts");
        write_atomic(&renamed, "renamed", &original).unwrap();
        let mode = fs::metadata(&renamed).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn copy_tree_copies_everything_and_refuses_existing_target() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("x/y")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("one.ts"), "1").unwrap();
        fs::write(src.join("x/y/two.test.ts"), "2").unwrap();

        let dst = dir.path().join("backup/src");
        assert_eq!(copy_tree(&src, &dst).unwrap(), 2);
        assert_eq!(fs::read_to_string(dst.join("one.ts")).unwrap(), "1");
        assert_eq!(fs::read_to_string(dst.join("x/y/two.test.ts")).unwrap(), "2");
        assert!(dst.join("empty").is_dir());

        assert!(copy_tree(&src, &dst).is_err());
    }
}
