use once_cell::sync::Lazy;
use regex::Regex;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<!--\s*title>\s*(.+?)\s*<title\s*-->").expect("title regex"));

static LABELS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--\s*labels>\s*(.+?)\s*<labels\s*-->").expect("labels regex")
});

/// Title and labels declared inside the post file itself:
///
/// ```text
/// <!-- title>Your Title Here<title -->
/// <!-- labels>Label A, Label B, Label C<labels -->
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub title: Option<String>,
    pub labels: Option<Vec<String>>,
}

/// Pull the first title and labels markers out of `content`.
pub fn extract(content: &str) -> FileMetadata {
    let title = TITLE_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    let labels = LABELS_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|m| split_labels(m.as_str()));

    if let Some(title) = &title {
        tracing::debug!("Extracted title from file: '{}'", title);
    }
    if let Some(labels) = &labels {
        tracing::debug!("Extracted labels from file: {:?}", labels);
    }

    FileMetadata { title, labels }
}

/// Split a comma-separated label list, trimming each label and dropping empty
/// ones. Returns `None` when nothing is left.
pub fn split_labels(raw: &str) -> Option<Vec<String>> {
    let labels: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    (!labels.is_empty()).then_some(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_labels() {
        let content = "<!-- title>Hello<title -->\n<!-- labels>a, b ,c<labels -->\nWorld";
        let meta = extract(content);
        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert_eq!(
            meta.labels,
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn markers_are_case_and_whitespace_tolerant() {
        let content = "<!--   TITLE>   Spaced Out Title  <Title   -->";
        assert_eq!(extract(content).title.as_deref(), Some("Spaced Out Title"));

        let content = "<!--Labels>x,y<LABELS-->";
        assert_eq!(
            extract(content).labels,
            Some(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn title_may_span_lines() {
        let content = "<!-- title>\n  First line\n  second line\n<title -->";
        assert_eq!(
            extract(content).title.as_deref(),
            Some("First line\n  second line")
        );
    }

    #[test]
    fn first_marker_wins() {
        let content = "<!-- title>One<title --> <!-- title>Two<title -->";
        assert_eq!(extract(content).title.as_deref(), Some("One"));
    }

    #[test]
    fn no_markers_yields_nothing() {
        assert_eq!(extract("<p>Just a body</p>"), FileMetadata::default());
    }

    #[test]
    fn labels_of_only_separators_are_absent() {
        assert_eq!(extract("<!-- labels>, , ,<labels -->").labels, None);
    }

    #[test]
    fn split_labels_drops_empties_only() {
        assert_eq!(
            split_labels(" rust,, blogging , rust ,"),
            Some(vec![
                "rust".to_string(),
                "blogging".to_string(),
                "rust".to_string()
            ])
        );
        assert_eq!(split_labels(""), None);
    }

    #[test]
    fn repeated_marker_labels_are_kept() {
        assert_eq!(
            extract("<!-- labels>a, b, a<labels -->").labels,
            Some(vec!["a".to_string(), "b".to_string(), "a".to_string()])
        );
    }
}
