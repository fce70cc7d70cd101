use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Legacy mock API call shapes reported by `report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MockKind {
    #[serde(rename = "vi.fn()")]
    ViFn,
    #[serde(rename = "vi.mock()")]
    ViMock,
    #[serde(rename = ".mockReturnValue()")]
    MockReturnValue,
    #[serde(rename = ".mockResolvedValue()")]
    MockResolvedValue,
    #[serde(rename = ".mockImplementation()")]
    MockImplementation,
}

impl MockKind {
    pub const ALL: [MockKind; 5] = [
        MockKind::ViFn,
        MockKind::ViMock,
        MockKind::MockReturnValue,
        MockKind::MockResolvedValue,
        MockKind::MockImplementation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MockKind::ViFn => "vi.fn()",
            MockKind::ViMock => "vi.mock()",
            MockKind::MockReturnValue => ".mockReturnValue()",
            MockKind::MockResolvedValue => ".mockResolvedValue()",
            MockKind::MockImplementation => ".mockImplementation()",
        }
    }

    fn regex(self) -> &'static Regex {
        &MOCK_PATTERNS[self as usize]
    }

    /// Suggested replacement for a matched call. The `.mock*` configuration
    /// methods exist on the Deno mock too and are kept as they are.
    fn suggestion(self, original: &str) -> String {
        match self {
            MockKind::ViFn => "createMock<TYPE>()".to_string(),
            MockKind::ViMock => "// Manual mock object needed".to_string(),
            _ => original.to_string(),
        }
    }
}

// Indexed by `MockKind as usize`. Each pattern stays on one line and stops
// at the first `)`.
static MOCK_PATTERNS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        Regex::new(r"vi\.fn\([^)\n]*\)").unwrap(),
        Regex::new(r"vi\.mock\([^)\n]+\)").unwrap(),
        Regex::new(r"\.mockReturnValue\([^)\n]+\)").unwrap(),
        Regex::new(r"\.mockResolvedValue\([^)\n]+\)").unwrap(),
        Regex::new(r"\.mockImplementation\([^)\n]+\)").unwrap(),
    ]
});

/// A `vi.mock(...)` statement up to its terminating newline.
static MODULE_MOCK_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vi\.mock\([^;]+\);?\s*\n").unwrap());

/// `, vi` as the last name of an import list.
static TRAILING_VI_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*vi\s*\}").unwrap());

pub const MOCK_TODO_MARKER: &str = "// TODO: Migrate mock to Deno compatible pattern\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MockOccurrence {
    pub kind: MockKind,
    pub original: String,
    pub suggestion: String,
}

/// Whether a file is worth scanning at all.
pub fn mentions_mocks(content: &str) -> bool {
    content.contains("vi.") || content.contains("Mock")
}

/// Every legacy mock call in `content`, grouped by kind in `MockKind::ALL`
/// order and by position within a kind.
pub fn find_mock_patterns(content: &str) -> Vec<MockOccurrence> {
    let mut found = Vec::new();
    for kind in MockKind::ALL {
        for m in kind.regex().find_iter(content) {
            found.push(MockOccurrence {
                kind,
                original: m.as_str().to_string(),
                suggestion: kind.suggestion(m.as_str()),
            });
        }
    }
    found
}

/// Replace each `vi.mock(...)` statement with a follow-up marker comment.
pub fn comment_out_module_mocks(content: &str) -> String {
    MODULE_MOCK_STATEMENT
        .replace_all(content, MOCK_TODO_MARKER)
        .into_owned()
}

/// Drop a trailing `vi` from import lists: `{ a, b, vi }` becomes `{ a, b}`.
pub fn strip_vi_import(content: &str) -> String {
    TRAILING_VI_IMPORT.replace_all(content, "}").into_owned()
}
