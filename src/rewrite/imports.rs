use super::{Rule, apply_rules, compile};
use regex::{Captures, Regex};
use std::path::{Component, Path};
use std::sync::LazyLock;

/// Placeholder deps import emitted by the table below; rewritten afterwards
/// to the depth-correct path of each file.
pub const DEPS_PLACEHOLDER: &str = r#"from "../deps.ts""#;

/// Vitest import statements and their Deno replacements. The `from 'vitest'`
/// rule goes first; the name-list rules only match exact combinations.
const IMPORT_TABLE: &[(&str, &str)] = &[
    (r#"from\s+['"]vitest['"]"#, r#"from "../deps.ts""#),
    (
        r"import\s+\{\s*describe,\s*it,\s*expect\s*\}",
        "import { describe, it, assertEquals, assertExists }",
    ),
    (
        r"import\s+\{\s*describe,\s*it,\s*expect,\s*beforeEach\s*\}",
        "import { describe, it, beforeEach, assertEquals, assertExists }",
    ),
    (
        r"import\s+\{\s*describe,\s*it,\s*expect,\s*afterEach\s*\}",
        "import { describe, it, afterEach, assertEquals, assertExists }",
    ),
    (
        r"import\s+\{\s*describe,\s*it,\s*expect,\s*beforeEach,\s*afterEach\s*\}",
        "import { describe, it, beforeEach, afterEach, assertEquals, assertExists }",
    ),
    (
        r"import\s+\{\s*describe,\s*it,\s*expect,\s*beforeEach,\s*afterEach,\s*vi\s*\}",
        "import { describe, it, beforeEach, afterEach, assertEquals, assertExists, assertThrows }",
    ),
    (
        r"import\s+\{\s*describe,\s*it,\s*expect,\s*vi\s*\}",
        "import { describe, it, assertEquals, assertExists, assertThrows }",
    ),
];

static IMPORT_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(IMPORT_TABLE));

/// `from '<path>'` or `from "<path>"`, either quote.
static IMPORT_SPECIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(from\s+)(?:'([^'\n]*)'|"([^"\n]*)")"#).unwrap());

static DOT_SLASH_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(from\s+)'(\./[^']+)'").unwrap());
static DOT_SLASH_DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(from\s+)"(\./[^"]+)""#).unwrap());

pub fn rewrite_framework_imports(content: &str) -> String {
    apply_rules(&IMPORT_RULES, content)
}

/// Relative path from `file` to the shared deps module: one `../` for a file
/// directly under `root`, plus one per extra directory level.
pub fn deps_path(file: &Path, root: &Path, deps_module: &str) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    let depth = rel
        .parent()
        .map(|p| {
            p.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0);
    format!("{}{}", "../".repeat(depth + 1), deps_module)
}

/// Point the placeholder deps import at `deps_path`.
pub fn relocate_deps_import(content: &str, deps_path: &str) -> String {
    content.replace(DEPS_PLACEHOLDER, &format!(r#"from "{}""#, deps_path))
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Decide whether a specifier needs `extension` appended. First matching
/// rule wins: already has it, directory import, package import, other
/// extension.
pub fn needs_extension(path: &str, extension: &str) -> bool {
    if path.ends_with(extension) {
        return false;
    }
    if path.ends_with('/') {
        return false;
    }
    if !(path.starts_with("./") || path.starts_with("../")) {
        return false;
    }
    !last_segment(path).contains('.')
}

/// Append `extension` to every relative import specifier lacking one.
/// Running it twice is a no-op.
pub fn normalize_import_extensions(content: &str, extension: &str) -> String {
    IMPORT_SPECIFIER
        .replace_all(content, |caps: &Captures| {
            let (quote, path) = match (caps.get(2), caps.get(3)) {
                (Some(p), _) => ('\'', p.as_str()),
                (None, Some(p)) => ('"', p.as_str()),
                _ => return caps[0].to_string(),
            };
            if needs_extension(path, extension) {
                format!("{}{quote}{path}{extension}{quote}", &caps[1])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Extension pass used while migrating test files. Only `./` specifiers are
/// considered; `../` imports are left for the deps relocation and manual
/// review. Single and double quotes are handled in separate passes, and a
/// rewritten specifier is always emitted as `from '<path><ext>'`.
pub fn add_sibling_import_extensions(content: &str, extension: &str) -> String {
    let single = append_to_sibling_imports(&DOT_SLASH_SINGLE, content, '\'', extension);
    append_to_sibling_imports(&DOT_SLASH_DOUBLE, &single, '"', extension)
}

fn append_to_sibling_imports(re: &Regex, content: &str, quote: char, extension: &str) -> String {
    re.replace_all(content, |caps: &Captures| {
        let path = &caps[2];
        if path.ends_with('/') || last_segment(path).contains('.') {
            caps[0].to_string()
        } else {
            format!("from {quote}{path}{extension}{quote}")
        }
    })
    .into_owned()
}
