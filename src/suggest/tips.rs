//! Fixed suggestion texts used by the heuristic ranker.

use super::category::ContextCategory;
use crate::patterns::DayPart;

pub fn category_tips(category: ContextCategory) -> &'static [&'static str] {
    match category {
        ContextCategory::Email => &[
            "Use Ctrl+R to reply to the current email quickly.",
            "Create a filter to sort incoming mail automatically.",
            "Schedule this email to send later so it lands at a better time.",
            "Save a template for the messages you send most often.",
        ],
        ContextCategory::Document => &[
            "Turn on track changes to keep revisions reviewable.",
            "Use Ctrl+Shift+V to paste without formatting.",
            "Apply heading styles so the navigation pane can outline your document.",
        ],
        ContextCategory::Presentation => &[
            "Press F5 to rehearse the presentation from the beginning.",
            "Use Presenter View to keep your notes visible while presenting.",
            "Try Alt+N to add a new slide quickly.",
        ],
        ContextCategory::Spreadsheet => &[
            "Press Alt+= to insert a quick sum.",
            "Freeze the header row so labels stay visible while scrolling.",
            "Convert this range to a table to filter and sort it faster.",
        ],
        ContextCategory::Browser => &[
            "Press Ctrl+Shift+T to reopen a recently closed tab.",
            "Group related tabs so your research stays organised.",
            "Press Ctrl+D to bookmark this page for later.",
            "Use Ctrl+Tab to cycle through your open tabs.",
        ],
        ContextCategory::Code => &[
            "Press Ctrl+Shift+P to open the command palette.",
            "Use Ctrl+Shift+F to search across the whole project.",
            "Use Alt+Z to toggle word wrap for long lines.",
            "Commit your work in small steps so changes stay easy to review.",
        ],
        ContextCategory::Video => &[
            "Use the J, K and L keys to rewind, pause and fast-forward.",
            "Press the space bar to pause and resume playback.",
            "Raise the playback speed to get through long recordings faster.",
        ],
        ContextCategory::Canva => &[
            "Press Ctrl+G to group elements before moving them.",
            "Use magic resize to adapt this design for other platforms.",
            "Keep colours consistent by saving them in a brand kit.",
        ],
        ContextCategory::Default => &[
            "Use Win+V to open your clipboard history.",
            "Press Win+Shift+S to capture part of the screen.",
            "Snap windows side by side with Win+Arrow keys.",
            "Close the windows you no longer need to keep focus.",
        ],
    }
}

pub fn day_part_tip(part: DayPart) -> &'static str {
    match part {
        DayPart::Morning => "Plan your day: list the three tasks that matter most before diving in.",
        DayPart::Afternoon => "Review your progress on today's tasks and adjust the plan for the rest of the day.",
        DayPart::Evening => "Wrap up: write down where you stopped so tomorrow starts quickly.",
        DayPart::Night => "Switch on night mode and save heavy work for tomorrow.",
    }
}

const EXTENSION_TIPS: &[(&str, &str)] = &[
    (".py", "Run your Python tests before moving on to the next change."),
    (".js", "Run the linter over your JavaScript before committing."),
    (".html", "Preview the page in a browser to check the layout."),
    (".css", "Check your style changes at a narrow window width."),
    (".json", "Validate the JSON file before using it as configuration."),
    (".md", "Preview the Markdown to check headings and links."),
    (".txt", "Move the notes you want to keep into a proper document."),
    (".docx", "Save a versioned copy of the document before large edits."),
    (".xlsx", "Double-check formulas in the spreadsheet before sharing it."),
    (".pptx", "Rehearse the presentation once with Presenter View."),
    (".pdf", "Highlight the key passages of the PDF while reading."),
];

/// Tip for a file's extension, matched case-insensitively.
pub fn extension_tip(path: &str) -> Option<&'static str> {
    let lower = path.to_lowercase();
    EXTENSION_TIPS
        .iter()
        .find(|(ext, _)| lower.ends_with(ext))
        .map(|(_, tip)| *tip)
}

const PROCESS_TIPS: &[(&str, &str)] = &[
    ("notepad", "Move quick notes from Notepad into a document you can search later."),
    ("explorer", "Pin the folders you open most to Quick Access."),
    ("python", "Check the output of your running Python script for errors."),
    ("powershell", "Save the commands you repeat as a script."),
    ("cmd", "Save the commands you repeat as a batch file."),
    ("zoom", "Mute notifications while you are in a meeting."),
    ("slack", "Set a status so colleagues know when you are focused."),
    ("outlook", "Block time in your calendar for focused work."),
];

/// Tip for a running process, matched on the lowercase name without `.exe`.
pub fn process_tip(process: &str) -> Option<&'static str> {
    let lower = process.to_lowercase();
    let name = lower.strip_suffix(".exe").unwrap_or(&lower);
    PROCESS_TIPS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, tip)| *tip)
}

pub fn workflow_templates(current_app: &str, next_app: &str) -> Vec<String> {
    vec![
        format!("You often open {next_app} after using {current_app}. Would you like to open it now?"),
        format!("Based on your patterns, you typically switch to {next_app} next. Ready to make the switch?"),
        format!("You frequently use {next_app} after {current_app}. Open {next_app} to continue your workflow."),
        format!("Your usual workflow: {current_app} → {next_app}. Want to continue this pattern?"),
    ]
}

pub fn project_tip(project: &str) -> String {
    format!("You're working on the {project} project. Review its open tasks before switching context.")
}

pub fn long_dwell_tip(app: &str, minutes: f64) -> String {
    format!("You typically spend {minutes:.1} minutes in {app}. Set a timer for a short break.")
}

pub fn frequent_file_tip(file: &str, app: &str) -> String {
    format!("You often work with {file} in {app}. Pin it for quick access.")
}

pub const TEST_REMINDER: &str = "Remember to test your code before committing changes.";
pub const SAVE_RESEARCH: &str = "Save important research to a document for reference.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_tips() {
        for category in [
            ContextCategory::Email,
            ContextCategory::Document,
            ContextCategory::Presentation,
            ContextCategory::Spreadsheet,
            ContextCategory::Browser,
            ContextCategory::Code,
            ContextCategory::Video,
            ContextCategory::Canva,
            ContextCategory::Default,
        ] {
            assert!(!category_tips(category).is_empty(), "{category:?}");
        }
    }

    #[test]
    fn extension_and_process_lookup_ignore_case() {
        assert!(extension_tip("/src/App.PY").is_some());
        assert!(extension_tip("/src/archive.zip").is_none());
        assert_eq!(process_tip("Slack.EXE"), process_tip("slack"));
        assert!(process_tip("slackbot").is_none());
    }
}
