//! Canonicalisation of window titles and suggestion targets into comparable
//! application identifiers.
//!
//! Two title conventions coexist on real desktops: `document - Application`
//! and `Application - document`. The dash rule therefore takes a
//! [`DashSide`] chosen by the call site instead of guessing:
//!
//! * [`extract_app_name`] keeps the leading side. Memory mining, feedback
//!   matching, the learned predictor and the ranker all use it, so the same
//!   title always maps to the same key across those components.
//! * [`extract_app_name_trailing`] keeps the trailing side. Only the LLM
//!   prompt uses it, to name the hosting application.

use once_cell::sync::Lazy;
use regex::Regex;

const STRIPPED_EXTENSIONS: [&str; 7] = [".py", ".json", ".txt", ".html", ".js", ".exe", ".md"];

const CHROME_SUFFIXES: [&str; 6] = [
    " - visual studio code",
    " - google chrome",
    " - firefox",
    " - microsoft edge",
    " - notepad",
    " - word",
];

/// Well-known spellings of the same application, keyed by normalized form.
const APP_ALIASES: [(&str, &str); 8] = [
    ("vscode", "visual studio code"),
    ("vs code", "visual studio code"),
    ("code", "visual studio code"),
    ("msedge", "microsoft edge"),
    ("edge", "microsoft edge"),
    ("chrome", "google chrome"),
    ("winword", "word"),
    ("powerpnt", "powerpoint"),
];

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Lowercase, drop one known extension and one known window-chrome suffix,
/// strip punctuation and collapse whitespace.
///
/// The output contains no punctuation and no repeated or surrounding
/// whitespace, so a second pass is always a no-op.
pub fn normalize(raw: &str) -> String {
    let mut name = raw.to_lowercase();

    if let Some(ext) = STRIPPED_EXTENSIONS.iter().find(|ext| name.ends_with(*ext)) {
        name.truncate(name.len() - ext.len());
    }

    if let Some(suffix) = CHROME_SUFFIXES.iter().find(|suffix| name.ends_with(*suffix)) {
        name.truncate(name.len() - suffix.len());
    }

    let name = PUNCTUATION.replace_all(&name, "");
    WHITESPACE.replace_all(&name, " ").trim().to_string()
}

/// [`normalize`] plus alias expansion, used when two names must be compared
/// for "same application" rather than "same text".
pub fn canonical_app_name(raw: &str) -> String {
    let normalized = normalize(raw);
    APP_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Which side of `X - Y` names the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashSide {
    Leading,
    Trailing,
}

#[derive(Debug, Clone, Copy)]
enum TitleRule {
    Dash(DashSide),
    Bracketed,
    Colon,
}

static DASH_LEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.+?) - .+").expect("valid dash regex"));
static DASH_TRAILING: Lazy<Regex> = Lazy::new(|| Regex::new(r".+ - (.+)").expect("valid dash regex"));
static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.+?)\s*[\[\(].*?[\]\)]").expect("valid bracket regex"));
static COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.+?):\s").expect("valid colon regex"));

impl TitleRule {
    fn pattern(self) -> &'static Regex {
        match self {
            TitleRule::Dash(DashSide::Leading) => &DASH_LEADING,
            TitleRule::Dash(DashSide::Trailing) => &DASH_TRAILING,
            TitleRule::Bracketed => &BRACKETED,
            TitleRule::Colon => &COLON,
        }
    }

    fn apply(self, title: &str) -> Option<String> {
        self.pattern()
            .captures(title)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

fn rules_for(side: DashSide) -> [TitleRule; 3] {
    [TitleRule::Dash(side), TitleRule::Bracketed, TitleRule::Colon]
}

/// Application name from a window title, keeping the left side of `X - Y`.
pub fn extract_app_name(title: &str) -> String {
    extract_app_name_with(title, DashSide::Leading)
}

/// Application name from a window title, keeping the right side of `X - Y`.
pub fn extract_app_name_trailing(title: &str) -> String {
    extract_app_name_with(title, DashSide::Trailing)
}

/// Apply the ordered title rules; the first rule that matches wins. With no
/// match, fall back to the first whitespace-delimited token (or the whole
/// string when it has none).
pub fn extract_app_name_with(title: &str, side: DashSide) -> String {
    for rule in rules_for(side) {
        if let Some(name) = rule.apply(title) {
            return name;
        }
    }

    title
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_strips_extension_suffix_and_punctuation() {
        assert_eq!(normalize("Main.PY"), "main");
        assert_eq!(normalize("Report - Word"), "report");
        assert_eq!(normalize("  Hello,   World!! "), "hello world");
        assert_eq!(normalize("notes.txt - Notepad"), "notes");
    }

    #[test]
    fn normalize_handles_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn canonical_name_expands_aliases() {
        assert_eq!(canonical_app_name("VSCode"), "visual studio code");
        assert_eq!(canonical_app_name("Visual Studio Code"), "visual studio code");
        assert_eq!(canonical_app_name("firefox"), "firefox");
    }

    #[test]
    fn leading_side_keeps_document_part() {
        assert_eq!(extract_app_name("main.py - Visual Studio Code"), "main.py");
        assert_eq!(extract_app_name("Editor - file.py"), "Editor");
    }

    #[test]
    fn trailing_side_keeps_application_part() {
        assert_eq!(
            extract_app_name_trailing("main.py - Visual Studio Code"),
            "Visual Studio Code"
        );
        assert_eq!(extract_app_name_trailing("a - b - Firefox"), "Firefox");
    }

    #[test]
    fn bracket_and_colon_rules_take_prefix() {
        assert_eq!(extract_app_name("Slack [3 unread]"), "Slack");
        assert_eq!(extract_app_name("Spotify (Premium)"), "Spotify");
        assert_eq!(extract_app_name("Terminal: ~/src"), "Terminal");
    }

    #[test]
    fn fallback_uses_first_token_or_whole_title() {
        assert_eq!(extract_app_name("Calculator app"), "Calculator");
        assert_eq!(extract_app_name("Calculator"), "Calculator");
        assert_eq!(extract_app_name(""), "");
    }

    #[test]
    fn dash_rule_wins_over_bracket_rule() {
        assert_eq!(extract_app_name("Inbox (4) - Gmail"), "Inbox (4)");
        assert_eq!(extract_app_name_trailing("Inbox (4) - Gmail"), "Gmail");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in any::<String>()) {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn normalize_is_idempotent_on_titles(raw in "[A-Za-z .\\-_()\\[\\]:]{0,40}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
        }
    }
}
