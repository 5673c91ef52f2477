use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    KeyboardShortcut,
    OpenApp,
    OpenWebsite,
    ShowTip,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub target: Option<String>,
}

impl Action {
    pub(crate) fn new(kind: ActionKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: Some(target.into()),
        }
    }

    pub fn none() -> Self {
        Self {
            kind: ActionKind::None,
            target: None,
        }
    }

    /// Target of an `OpenApp` action.
    pub fn app(&self) -> Option<&str> {
        match self.kind {
            ActionKind::OpenApp => self.target.as_deref(),
            _ => None,
        }
    }
}

static SHORTCUT: Lazy<Regex> = Lazy::new(|| {
    let key = r"(?:ctrl|alt|shift|win|tab|esc|space ?bar|enter|delete|backspace|home|end|page up|page down|f\d{1,2})\b";
    let segment = r"(?:(?:shift|alt|ctrl|tab|enter|space|f\d{1,2})\b|[a-z0-9=])";
    Regex::new(&format!(
        r"\b(?:try|use|using|press|pressing|hit|hitting)\s+(?:(?:pressing|using|hitting)\s+)?(?:the\s+)?({key}(?:\s*\+\s*{segment})?(?:\s*\+\s*{segment})?)"
    ))
    .expect("valid shortcut regex")
});

static FILE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([\w-]+\.(?:py|exe|json|sh|bat|ps1|toml|yaml|yml))\b").expect("valid file token regex")
});

static OPEN_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:open|switch to|use)\s+([\w\s.\-]+)").expect("valid open phrase regex"));

static NON_ACTIONABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:shortcuts?|keyboard|tips?|consider|try|tutorials?|faster|speed)\b|(?:ctrl|alt|shift)\+")
        .expect("valid indicator regex")
});

static CONTEXT_USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)sometimes use\s+([\w\s.]+?)\s+in this context").expect("valid context regex")
});

static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([\w-]+(?:\.[\w-]+)*\.(?:com|org|net|io|dev))\b").expect("valid domain regex")
});

/// Words that end the object of "open/switch to/use".
const CONNECTORS: [&str; 18] = [
    "to", "for", "after", "before", "in", "on", "with", "and", "so", "next", "now", "if", "when",
    "because", "from", "again", "then", "while",
];

const PRONOUNS: [&str; 7] = ["it", "this", "that", "them", "they", "these", "those"];

type Rule = fn(&str, &str) -> Option<Action>;

/// Ordered rules; each gets the original text and its lowercase form.
const RULES: [Rule; 6] = [
    keyboard_shortcut,
    file_token,
    open_phrase,
    non_actionable,
    context_use,
    website,
];

/// Classify a suggestion. The first matching rule wins.
pub fn extract(text: &str) -> Action {
    if text.trim().is_empty() {
        return Action::none();
    }
    let lower = text.to_lowercase();
    RULES
        .iter()
        .find_map(|rule| rule(text, &lower))
        .unwrap_or_else(Action::none)
}

fn keyboard_shortcut(_text: &str, lower: &str) -> Option<Action> {
    let combo = SHORTCUT.captures(lower)?.get(1)?.as_str();
    let target: String = combo.chars().filter(|c| !c.is_whitespace()).collect();
    Some(Action::new(ActionKind::KeyboardShortcut, target))
}

fn file_token(text: &str, _lower: &str) -> Option<Action> {
    let token = FILE_TOKEN.captures(text)?.get(1)?.as_str();
    Some(Action::new(ActionKind::OpenApp, token))
}

fn open_phrase(_text: &str, lower: &str) -> Option<Action> {
    OPEN_PHRASE
        .captures_iter(lower)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| clean_phrase(m.as_str()))
        .map(|target| Action::new(ActionKind::OpenApp, target))
}

/// Cut at the first connector word, drop trailing punctuation and a leading
/// article. Bare pronouns are not targets.
fn clean_phrase(phrase: &str) -> Option<String> {
    let mut words: Vec<&str> = Vec::new();
    for word in phrase.split_whitespace() {
        let bare = word.trim_end_matches(['?', '.', ',', '!']);
        if CONNECTORS.contains(&bare) {
            break;
        }
        words.push(word);
        if bare.len() != word.len() {
            // Sentence punctuation ends the phrase.
            break;
        }
    }
    if words.first() == Some(&"the") {
        words.remove(0);
    }

    let target = words.join(" ");
    let target = target.trim_end_matches(['?', '.', ',', '!']).trim();
    if target.is_empty() || PRONOUNS.contains(&target) {
        return None;
    }
    Some(target.to_string())
}

fn non_actionable(text: &str, lower: &str) -> Option<Action> {
    NON_ACTIONABLE
        .is_match(lower)
        .then(|| Action::new(ActionKind::ShowTip, text))
}

fn context_use(text: &str, _lower: &str) -> Option<Action> {
    let app = CONTEXT_USE.captures(text)?.get(1)?.as_str().trim();
    (!app.is_empty()).then(|| Action::new(ActionKind::OpenApp, app))
}

fn website(_text: &str, lower: &str) -> Option<Action> {
    let domain = DOMAIN.captures(lower)?.get(1)?.as_str();
    Some(Action::new(ActionKind::OpenWebsite, domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(kind: ActionKind, target: &str) -> Action {
        Action::new(kind, target)
    }

    #[test]
    fn switch_to_names_the_app() {
        assert_eq!(
            extract("Switch to Visual Studio Code to continue your project."),
            action(ActionKind::OpenApp, "visual studio code")
        );
    }

    #[test]
    fn pressing_a_combo_is_a_shortcut() {
        assert_eq!(
            extract("Try pressing ctrl+shift+p for the command palette."),
            action(ActionKind::KeyboardShortcut, "ctrl+shift+p")
        );
        assert_eq!(
            extract("Press Win + Shift + S to capture part of the screen."),
            action(ActionKind::KeyboardShortcut, "win+shift+s")
        );
        assert_eq!(
            extract("Press F5 to rehearse the presentation."),
            action(ActionKind::KeyboardShortcut, "f5")
        );
    }

    #[test]
    fn bare_domain_is_a_website() {
        assert_eq!(
            extract("You often visit github.com after coding."),
            action(ActionKind::OpenWebsite, "github.com")
        );
    }

    #[test]
    fn file_tokens_open_apps() {
        assert_eq!(
            extract("Would you like to run build_index.py again?"),
            action(ActionKind::OpenApp, "build_index.py")
        );
        assert_eq!(
            extract("Would you like to open notepad.exe?"),
            action(ActionKind::OpenApp, "notepad.exe")
        );
    }

    #[test]
    fn open_phrases_skip_pronouns_and_articles() {
        assert_eq!(extract("Would you like to open it?"), Action::none());
        assert_eq!(
            extract("You might want to open Chrome to check your emails."),
            action(ActionKind::OpenApp, "chrome")
        );
        assert_eq!(
            extract("Open it now, or use the Mail app."),
            action(ActionKind::OpenApp, "mail app")
        );
        assert_eq!(
            extract("You often use Browser after Editor. Would you like to open it?"),
            action(ActionKind::OpenApp, "browser")
        );
    }

    #[test]
    fn learned_phrasing_resolves_the_app() {
        assert_eq!(
            extract("You sometimes use Slack in this context. Would you like to open it?"),
            action(ActionKind::OpenApp, "slack")
        );
    }

    #[test]
    fn indicator_vocabulary_marks_tips() {
        let text = "Consider organising windows side by side.";
        assert_eq!(extract(text), action(ActionKind::ShowTip, text));
        let text = "Learn a new shortcut every day.";
        assert_eq!(extract(text), action(ActionKind::ShowTip, text));
        // Whole words only.
        assert_eq!(extract("Keep retrying tomorrow."), Action::none());
    }

    #[test]
    fn unmatched_or_empty_text_has_no_action() {
        assert_eq!(extract(""), Action::none());
        assert_eq!(extract("Nice work today."), Action::none());
    }

    #[test]
    fn app_accessor_only_exposes_open_app_targets() {
        assert_eq!(extract("Switch to Slack now.").app(), Some("slack"));
        assert_eq!(extract("Visit rust-lang.org for docs.").app(), None);
    }
}
