use crate::models::issue::{IssueStatus, IssueType, Priority};

/// Ordered (keywords, status) rules. First rule with a keyword contained in the
/// lower-cased input wins, so "reopened" must stay below "open".
const STATUS_RULES: &[(&[&str], IssueStatus)] = &[
    (&["open", "new"], IssueStatus::New),
    (&["assigned", "progress"], IssueStatus::InProgress),
    (&["review", "test"], IssueStatus::Review),
    (&["closed", "resolved", "completed"], IssueStatus::Completed),
    (&["reopen"], IssueStatus::InProgress),
    (&["hold", "pending"], IssueStatus::OnHold),
];

const PRIORITY_RULES: &[(&[&str], Priority)] = &[
    (&["critical", "blocker"], Priority::Urgent),
    (&["major", "high"], Priority::High),
    (&["minor", "low"], Priority::Low),
];

const TYPE_RULES: &[(&[&str], IssueType)] = &[
    (&["bug", "defect"], IssueType::Bug),
    (&["feature", "enhancement"], IssueType::Feature),
    (&["support", "inquiry", "question"], IssueType::Inquiry),
];

fn classify<T: Copy>(input: Option<&str>, rules: &[(&[&str], T)], fallback: T) -> T {
    let text = input.unwrap_or_default().to_lowercase();

    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

/// Map external tracker status text to an [`IssueStatus`]. Unknown or empty → `New`.
pub fn map_status(raw: Option<&str>) -> IssueStatus {
    classify(raw, STATUS_RULES, IssueStatus::New)
}

/// Map a severity label to a [`Priority`]. Unknown or empty → `Medium`.
pub fn map_priority(raw: Option<&str>) -> Priority {
    classify(raw, PRIORITY_RULES, Priority::Medium)
}

/// Map a category label to an [`IssueType`]. Unknown or empty → `Task`.
pub fn map_issue_type(raw: Option<&str>) -> IssueType {
    classify(raw, TYPE_RULES, IssueType::Task)
}
