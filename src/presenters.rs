//! Parsing and diffing of the free-text "other presenters" field.
//!
//! The field holds a comma- or whitespace-separated list of collaborator
//! emails. Edits are applied as an explicit previous/new set comparison so
//! that re-submitting the same list is a no-op.

use crate::invites::normalize_email;

/// Split a raw presenter list on commas and whitespace, normalize each token
/// and drop empties and duplicates, preserving first-seen order.
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for token in raw.split(|c: char| c.is_whitespace() || c == ',') {
        let email = normalize_email(token);
        if email.is_empty() || seen.contains(&email) {
            continue;
        }
        seen.push(email);
    }
    seen
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresenterDiff {
    /// Emails in the new list that were not in the previous one.
    pub added: Vec<String>,
    /// Emails in the previous list that left the new one; only collaborator
    /// rows are ever removed for these.
    pub removed: Vec<String>,
}

pub fn diff(previous: Option<&str>, new: &str) -> PresenterDiff {
    let old_list = previous.map(parse_list).unwrap_or_default();
    let new_list = parse_list(new);

    PresenterDiff {
        added: new_list
            .iter()
            .filter(|e| !old_list.contains(e))
            .cloned()
            .collect(),
        removed: old_list
            .iter()
            .filter(|e| !new_list.contains(e))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_commas_and_whitespace() {
        let list = parse_list("a@x.org, b@x.org  c@x.org\nd@x.org");
        assert_eq!(list, vec!["a@x.org", "b@x.org", "c@x.org", "d@x.org"]);
    }

    #[test]
    fn trims_normalizes_and_dedupes() {
        let list = parse_list(" A@x.org ,, a@x.org  B@x.org ");
        assert_eq!(list, vec!["a@x.org", "b@x.org"]);
    }

    #[test]
    fn empty_text_yields_no_presenters() {
        assert!(parse_list("").is_empty());
        assert!(parse_list("  , ,  ").is_empty());
    }

    #[test]
    fn diff_tags_added_and_removed() {
        let d = diff(Some("a@x.org, b@x.org"), "b@x.org c@x.org");
        assert_eq!(d.added, vec!["c@x.org"]);
        assert_eq!(d.removed, vec!["a@x.org"]);
    }

    #[test]
    fn same_list_twice_is_an_empty_diff() {
        let d = diff(Some("a@x.org, b@x.org"), "b@x.org,a@x.org");
        assert_eq!(d, PresenterDiff::default());
    }

    #[test]
    fn first_submission_adds_everything() {
        let d = diff(None, "a@x.org b@x.org");
        assert_eq!(d.added, vec!["a@x.org", "b@x.org"]);
        assert!(d.removed.is_empty());
    }

    #[test]
    fn clearing_the_field_removes_everything() {
        let d = diff(Some("a@x.org b@x.org"), "");
        assert!(d.added.is_empty());
        assert_eq!(d.removed, vec!["a@x.org", "b@x.org"]);
    }
}
