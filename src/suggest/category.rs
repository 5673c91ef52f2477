//! Coarse context categories, decided by ordered first-match tables.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextCategory {
    Email,
    Document,
    Presentation,
    Spreadsheet,
    Browser,
    Code,
    Video,
    Canva,
    Default,
}

struct TitleRule {
    needles: &'static [&'static str],
    /// Process names (lowercase) that also select this rule.
    processes: &'static [&'static str],
    category: ContextCategory,
}

const TITLE_RULES: &[TitleRule] = &[
    TitleRule { needles: &["gmail", "mail.google"], processes: &[], category: ContextCategory::Email },
    TitleRule { needles: &["docs.google"], processes: &[], category: ContextCategory::Document },
    TitleRule { needles: &["slides.google"], processes: &[], category: ContextCategory::Presentation },
    TitleRule { needles: &["sheets.google"], processes: &[], category: ContextCategory::Spreadsheet },
    TitleRule { needles: &["youtube"], processes: &[], category: ContextCategory::Video },
    TitleRule { needles: &["canva"], processes: &[], category: ContextCategory::Canva },
    TitleRule {
        needles: &["visual studio code", "vs code"],
        processes: &["code.exe"],
        category: ContextCategory::Code,
    },
    TitleRule { needles: &["word", "document", ".doc"], processes: &[], category: ContextCategory::Document },
    TitleRule {
        needles: &["powerpoint", "presentation", ".ppt"],
        processes: &[],
        category: ContextCategory::Presentation,
    },
    TitleRule { needles: &["outlook", "mail"], processes: &[], category: ContextCategory::Email },
    TitleRule {
        needles: &["chrome", "edge", "firefox", "browser"],
        processes: &[],
        category: ContextCategory::Browser,
    },
    TitleRule { needles: &["premiere", "video"], processes: &[], category: ContextCategory::Video },
];

const PROCESS_RULES: &[(&[&str], ContextCategory)] = &[
    (&["canva"], ContextCategory::Canva),
    (&["code", "visual studio"], ContextCategory::Code),
    (&["word"], ContextCategory::Document),
    (&["powerpoint"], ContextCategory::Presentation),
    (&["outlook", "thunderbird"], ContextCategory::Email),
    (&["chrome", "firefox", "edge"], ContextCategory::Browser),
    (&["premiere", "vegas", "video"], ContextCategory::Video),
];

/// Title rules are consulted first, then each process in order against the
/// process rules. First match wins.
pub fn context_category(window: &str, processes: &[String]) -> ContextCategory {
    let title = window.to_lowercase();
    let processes: Vec<String> = processes.iter().map(|p| p.to_lowercase()).collect();

    let by_title = TITLE_RULES.iter().find(|rule| {
        rule.needles.iter().any(|needle| title.contains(needle))
            || rule.processes.iter().any(|name| processes.iter().any(|p| p == name))
    });
    if let Some(rule) = by_title {
        return rule.category;
    }

    processes
        .iter()
        .find_map(|process| {
            PROCESS_RULES
                .iter()
                .find(|(needles, _)| needles.iter().any(|needle| process.contains(needle)))
                .map(|(_, category)| *category)
        })
        .unwrap_or(ContextCategory::Default)
}
