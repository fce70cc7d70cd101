use super::{Rule, apply_rules, compile};
use std::sync::LazyLock;

/// Vitest `expect(...)` chains and their Deno `std/assert` counterparts.
///
/// Arguments are bounded by the first `)` (or `}` for block bodies), so
/// calls with nested parentheses are left as they are.
const ASSERTION_TABLE: &[(&str, &str)] = &[
    // Simple assertions
    (r"expect\(([^)]+)\)\.toBe\(([^)]+)\)", "assertEquals(${1}, ${2})"),
    (r"expect\(([^)]+)\)\.toEqual\(([^)]+)\)", "assertEquals(${1}, ${2})"),
    (
        r"expect\(([^)]+)\)\.toStrictEqual\(([^)]+)\)",
        "assertStrictEquals(${1}, ${2})",
    ),
    (r"expect\(([^)]+)\)\.toBeDefined\(\)", "assertExists(${1})"),
    (r"expect\(([^)]+)\)\.toBeUndefined\(\)", "assertEquals(${1}, undefined)"),
    (r"expect\(([^)]+)\)\.toBeNull\(\)", "assertEquals(${1}, null)"),
    (r"expect\(([^)]+)\)\.toBeTruthy\(\)", "assertEquals(!!${1}, true)"),
    (r"expect\(([^)]+)\)\.toBeFalsy\(\)", "assertEquals(!!${1}, false)"),
    (
        r"expect\(([^)]+)\)\.toBeInstanceOf\(([^)]+)\)",
        "assertInstanceOf(${1}, ${2})",
    ),
    (
        r"expect\(([^)]+)\)\.toContain\(([^)]+)\)",
        "assertArrayIncludes(${1}, [${2}])",
    ),
    (r"expect\(([^)]+)\)\.not\.toBe\(([^)]+)\)", "assertNotEquals(${1}, ${2})"),
    (r"expect\(([^)]+)\)\.not\.toEqual\(([^)]+)\)", "assertNotEquals(${1}, ${2})"),
    // Throw assertions
    (r"expect\(\(\) => ([^)]+)\)\.toThrow\(\)", "assertThrows(() => ${1})"),
    (
        r"expect\(\(\) => ([^)]+)\)\.toThrow\(([^)]+)\)",
        "assertThrows(() => ${1}, Error, ${2})",
    ),
    (
        r"expect\(\(\) => \{\s*([^}]+)\s*\}\)\.toThrow\(\)",
        "assertThrows(() => { ${1} })",
    ),
    (
        r"expect\(\(\) => \{\s*([^}]+)\s*\}\)\.toThrow\(([^)]+)\)",
        "assertThrows(() => { ${1} }, Error, ${2})",
    ),
    // Async assertions
    (
        r"expect\(([^)]+)\)\.resolves\.toBe\(([^)]+)\)",
        "assertEquals(await ${1}, ${2})",
    ),
    (
        r"expect\(([^)]+)\)\.rejects\.toThrow\(\)",
        "assertRejects(async () => await ${1})",
    ),
];

static ASSERTION_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(ASSERTION_TABLE));

pub fn rewrite_assertions(content: &str) -> String {
    apply_rules(&ASSERTION_RULES, content)
}
