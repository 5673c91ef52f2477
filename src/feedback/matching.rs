use crate::normalize::canonical_app_name;

/// Minimum share of agreeing character positions for two names to count as
/// the same application.
const POSITIONAL_AGREEMENT: f64 = 0.8;

/// Whether `current` is the application `suggested` pointed at.
///
/// Names are compared in canonical form: equal, contained in one another,
/// or (for names longer than three characters) agreeing position by
/// position on more than 80% of the longer name. This is a coarse typo
/// allowance, not an edit distance. Empty names never match.
pub fn match_apps(current: &str, suggested: &str) -> bool {
    let current = canonical_app_name(current);
    let suggested = canonical_app_name(suggested);
    if current.is_empty() || suggested.is_empty() {
        return false;
    }

    if current == suggested || current.contains(&suggested) || suggested.contains(&current) {
        return true;
    }

    let (a, b): (Vec<char>, Vec<char>) = (current.chars().collect(), suggested.chars().collect());
    if a.len() <= 3 || b.len() <= 3 {
        return false;
    }
    let agreeing = a.iter().zip(&b).filter(|(x, y)| x == y).count();
    let longest = a.len().max(b.len());
    agreeing as f64 / longest as f64 > POSITIONAL_AGREEMENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_match() {
        assert!(match_apps("vscode", "visual studio code"));
        assert!(match_apps("Visual Studio Code", "code"));
        assert!(match_apps("msedge", "Microsoft Edge"));
    }

    #[test]
    fn substrings_match_either_way() {
        assert!(match_apps("Firefox Developer Edition", "firefox"));
        assert!(match_apps("slack", "Slack Workspace"));
    }

    #[test]
    fn near_spellings_match() {
        assert!(match_apps("spotifx", "spotify"));
        assert!(match_apps("terminel app", "terminal app"));
        assert!(!match_apps("chrome", "firefox"));
        assert!(!match_apps("abc", "abd"));
    }

    #[test]
    fn empty_names_never_match() {
        assert!(!match_apps("", ""));
        assert!(!match_apps("", "firefox"));
        assert!(!match_apps("...", "firefox"));
        assert!(!match_apps("firefox", "  "));
    }
}
