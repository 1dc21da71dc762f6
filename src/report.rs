//! The structured result of a request: sections and the report built from them.
//!
//! A [`Section`] is what the section parser produces from the model reply;
//! a [`Report`] is the renderer's only input. Both are plain values created
//! fresh for each request.

use serde::{Deserialize, Serialize};

/// A labelled group of content lines.
///
/// The label is the text after a leading `N.` marker; an empty label marks
/// the preamble (text that appeared before the first marker).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub label: String,
    pub content: Vec<String>,
}

impl Section {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: Vec::new(),
        }
    }

    /// Builder-style helper used mostly by tests and callers assembling reports by hand.
    pub fn with_content<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content.extend(lines.into_iter().map(Into::into));
        self
    }

    /// `true` for the pseudo-section holding text before the first marker.
    pub fn is_preamble(&self) -> bool {
        self.label.is_empty()
    }

    /// `true` when the section carries neither a label nor content.
    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.content.is_empty()
    }
}

/// Ordered sections plus optional title and footer text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub title: Option<String>,
    pub sections: Vec<Section>,
    pub footer: Option<String>,
}

impl Report {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            title: None,
            sections,
            footer: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_has_empty_label() {
        let s = Section::new("").with_content(["intro"]);
        assert!(s.is_preamble());
        assert!(!s.is_empty());
        assert!(Section::default().is_empty());
    }

    #[test]
    fn report_builder() {
        let report = Report::new(vec![
            Section::new("A").with_content(["1", "2"]),
            Section::new("B"),
        ])
        .with_title("Title")
        .with_footer("Footer");

        assert_eq!(report.title.as_deref(), Some("Title"));
        assert_eq!(report.footer.as_deref(), Some("Footer"));
        assert_eq!(report.sections[0].content.len(), 2);
    }

    #[test]
    fn section_serialises_as_label_and_content() {
        let s = Section::new("Số tín chỉ").with_content(["3"]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"label":"Số tín chỉ","content":["3"]}"#);
    }
}
