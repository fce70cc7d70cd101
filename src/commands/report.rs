use crate::config::AppConfig;
use crate::rewrite::mocks::{MockKind, MockOccurrence, find_mock_patterns, mentions_mocks};
use crate::utils::{collect_files_with_suffix, ensure_dir};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const MIGRATION_STEPS: &str = "\
1. Add createMock import to deps.ts (already done ✓)

2. Update each test file:
   - Replace: import { ..., vi } from '../deps.ts'
   - With:    import { ..., createMock } from '../deps.ts'

3. Replace vi.fn() patterns:
   - Before: const mock = vi.fn().mockReturnValue(42)
   - After:  const mock = createMock<() => number>().mockReturnValue(42)

4. Replace vi.mock() patterns with manual mocks:
   - Before: vi.mock('./module')
   - After:  const mockModule = { method: createMock() }

5. Remove 'vi' from type imports:
   - Before: import { ..., type Mock } from '../deps.ts'
   - After:  import { ..., type MockFunction } from '../deps.ts'
";

const RULE: &str =
    "================================================================================";

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub occurrences: Vec<MockOccurrence>,
}

impl FileReport {
    pub fn counts(&self) -> BTreeMap<MockKind, usize> {
        let mut counts = BTreeMap::new();
        for o in &self.occurrences {
            *counts.entry(o.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Scan every `*<suffix>` file under `root`. Files without any mock usage
/// are left out. Read errors abort the scan.
pub fn scan_tree(root: &Path, suffix: &str) -> Result<Vec<FileReport>> {
    let mut reports = Vec::new();
    for path in collect_files_with_suffix(root, suffix)? {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if !mentions_mocks(&content) {
            continue;
        }
        let occurrences = find_mock_patterns(&content);
        tracing::debug!(file=%path.display(), found = occurrences.len(), "scanned");
        if !occurrences.is_empty() {
            reports.push(FileReport { path, occurrences });
        }
    }
    Ok(reports)
}

fn push_heading(out: &mut String, title: &str) {
    out.push_str(&format!("{RULE}\n{title}\n{RULE}\n\n"));
}

pub fn render_report(reports: &[FileReport]) -> String {
    let mut out = String::new();
    push_heading(&mut out, "MOCK PATTERN ANALYSIS REPORT");

    if reports.is_empty() {
        out.push_str("No mock patterns found! ✓\n");
        return out;
    }

    out.push_str(&format!(
        "Found mock patterns in {} files:\n\n",
        reports.len()
    ));
    for report in reports {
        out.push_str(&format!(
            "{}\n   Found {} mock pattern(s)\n",
            report.path.display(),
            report.occurrences.len()
        ));
        for (kind, count) in report.counts() {
            out.push_str(&format!("   - {}: {}\n", kind.label(), count));
        }
        out.push('\n');
    }

    push_heading(&mut out, "MIGRATION STEPS");
    out.push_str(MIGRATION_STEPS);
    out
}

/// Execute the report command
pub fn report(cfg: &AppConfig, migrated: bool, json: bool) -> Result<()> {
    ensure_dir(&cfg.src)?;
    let suffix = if migrated {
        cfg.new_suffix()
    } else {
        cfg.legacy_suffix()
    };
    tracing::info!(src=%cfg.src.display(), %suffix, "analyzing test files for mock patterns");

    let reports = scan_tree(&cfg.src, &suffix)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("failed to encode report")?
        );
        return Ok(());
    }

    print!("{}", render_report(&reports));
    println!("\nFor detailed migration instructions, see DENO_MIGRATION.md");
    Ok(())
}
