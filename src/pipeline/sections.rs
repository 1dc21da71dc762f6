//! Section parser: split a numbered-list model reply into labelled sections.
//!
//! The model is asked to answer as a numbered list (`1. Tên học phần`, …)
//! but nothing guarantees it does. The parser is therefore marker-driven and
//! total: it never fails, never drops a non-empty line, and never merges
//! sections.
//!
//! ## Marker lines
//!
//! A line is a marker when its trimmed form starts with one or two ASCII
//! digits followed by a period. Everything after the marker (trimmed) is the
//! label of a new section; a bare marker such as `4.` becomes its own label.
//! Numbering does not have to be contiguous, and a number in the middle of a
//! line is just content.
//!
//! ## Lossless
//!
//! Every non-empty trimmed line lands in exactly one place: either as a
//! section label (marker lines) or as a content line. Text before the first
//! marker goes into a preamble section with an empty label.

use crate::report::Section;
use once_cell::sync::Lazy;
use regex::Regex;

/// One or two digits and a period at the start of a trimmed line.
///
/// Wider numerals (`100.`) and bullet styles (`-`, `•`, `a)`) are content.
static RE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,2}\.").unwrap());

/// Parse a model reply into ordered sections.
///
/// ```rust
/// use edgequake_doc2report::pipeline::sections::parse_sections;
///
/// let sections = parse_sections("1. Tên học phần\nToán rời rạc\n2. Số tín chỉ\n3\n");
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[0].label, "Tên học phần");
/// assert_eq!(sections[1].content, vec!["3"]);
/// ```
pub fn parse_sections(reply: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section::default();

    for line in reply.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match marker_label(line) {
            Some(label) => {
                close_section(&mut sections, std::mem::take(&mut current));
                current = Section::new(label);
            }
            None => current.content.push(line.to_string()),
        }
    }

    close_section(&mut sections, current);
    sections
}

/// If `line` (already trimmed) is a marker line, return the label it starts.
pub fn marker_label(line: &str) -> Option<&str> {
    let m = RE_MARKER.find(line)?;
    let rest = line[m.end()..].trim();
    if rest.is_empty() {
        Some(m.as_str())
    } else {
        Some(rest)
    }
}

/// `true` when the trimmed line starts a new section.
pub fn is_marker_line(line: &str) -> bool {
    RE_MARKER.is_match(line.trim())
}

fn close_section(sections: &mut Vec<Section>, section: Section) {
    if !section.is_empty() {
        sections.push(section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_empty_lines(s: &str) -> Vec<&str> {
        s.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn empty_input_yields_no_sections() {
        assert!(parse_sections("").is_empty());
        assert!(parse_sections("   \n\n\t\n").is_empty());
    }

    #[test]
    fn numbered_reply() {
        let sections = parse_sections("1. Tên học phần\nToán rời rạc\n2. Số tín chỉ\n3\n");
        assert_eq!(
            sections,
            vec![
                Section::new("Tên học phần").with_content(["Toán rời rạc"]),
                Section::new("Số tín chỉ").with_content(["3"]),
            ]
        );
    }

    #[test]
    fn no_marker_is_one_preamble() {
        let sections = parse_sections("Không có mục nào ở đây.");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_preamble());
        assert_eq!(sections[0].content, vec!["Không có mục nào ở đây."]);
    }

    #[test]
    fn consecutive_markers_keep_empty_section() {
        let sections = parse_sections("1. A\n2. B\nnội dung B");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].label, "A");
        assert!(sections[0].content.is_empty());
        assert_eq!(sections[1].label, "B");
        assert_eq!(sections[1].content, vec!["nội dung B"]);
    }

    #[test]
    fn preamble_before_first_marker() {
        let reply = "Dưới đây là thông tin:\n\n1. Tên học phần\nGiải tích";
        let sections = parse_sections(reply);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].label, "");
        assert_eq!(sections[0].content, vec!["Dưới đây là thông tin:"]);
        assert_eq!(sections[1].label, "Tên học phần");
    }

    #[test]
    fn skipped_numbers_still_split() {
        let sections = parse_sections("3. Số tín chỉ\n3\n5. Mục tiêu\nHiểu đồ thị");
        let labels: Vec<_> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Số tín chỉ", "Mục tiêu"]);
    }

    #[test]
    fn mid_line_marker_is_content() {
        let sections = parse_sections("1. Tài liệu\nXem mục 2. bên dưới");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, vec!["Xem mục 2. bên dưới"]);
    }

    #[test]
    fn bare_marker_uses_marker_text_as_label() {
        let sections = parse_sections("4.\nKhông tìm thấy\n  12.   ");
        assert_eq!(sections[0].label, "4.");
        assert_eq!(sections[0].content, vec!["Không tìm thấy"]);
        assert_eq!(sections[1].label, "12.");
        assert!(sections[1].content.is_empty());
    }

    #[test]
    fn indented_marker_and_label_trim() {
        let sections = parse_sections("   7.\tNội dung học phần tóm tắt  \n  Chương 1  ");
        assert_eq!(sections[0].label, "Nội dung học phần tóm tắt");
        assert_eq!(sections[0].content, vec!["Chương 1"]);
    }

    #[test]
    fn label_punctuation_is_kept() {
        let sections = parse_sections("2. Mã học phần (nếu có):");
        assert_eq!(sections[0].label, "Mã học phần (nếu có):");
    }

    #[test]
    fn three_digit_numbers_are_content() {
        let sections = parse_sections("1. Tài liệu\n100. trang đầu\n- gạch đầu dòng\na) mục a");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content.len(), 3);
    }

    #[test]
    fn duplicate_labels_are_not_merged() {
        let sections = parse_sections("1. Ghi chú\nmột\n1. Ghi chú\nhai");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, vec!["một"]);
        assert_eq!(sections[1].content, vec!["hai"]);
    }

    #[test]
    fn crlf_line_endings() {
        let sections = parse_sections("1. A\r\nx\r\n2. B\r\ny\r\n");
        assert_eq!(sections[0].content, vec!["x"]);
        assert_eq!(sections[1].content, vec!["y"]);
    }

    #[test]
    fn content_line_count_matches_non_marker_lines() {
        let replies = [
            "",
            "chỉ một dòng",
            "1. A\n2. B\nnội dung B",
            "mở đầu\n\n1. A\n  a1\n\n  a2\n9. B\n10. C\nc1\n100. không phải mục\n",
            "1.\n2.\n3.",
            "  \n 42. câu trả lời \n   \n",
        ];
        for reply in replies {
            let sections = parse_sections(reply);
            let lines = non_empty_lines(reply);
            let markers = lines.iter().filter(|l| is_marker_line(l)).count();
            let content: usize = sections.iter().map(|s| s.content.len()).sum();
            assert_eq!(content, lines.len() - markers, "reply: {reply:?}");
        }
    }

    #[test]
    fn content_is_lossless_and_ordered() {
        let reply = "mở đầu\n1. A\n  a1\n\n  a2\n9. B\n10. C\nc1\n100. không phải mục\n";
        let flattened: Vec<String> = parse_sections(reply)
            .into_iter()
            .flat_map(|s| s.content)
            .collect();
        let expected: Vec<&str> = non_empty_lines(reply)
            .into_iter()
            .filter(|l| !is_marker_line(l))
            .collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn marker_label_detection() {
        assert_eq!(marker_label("1. A"), Some("A"));
        assert_eq!(marker_label("99.B"), Some("B"));
        assert_eq!(marker_label("3."), Some("3."));
        assert_eq!(marker_label("3"), None);
        assert_eq!(marker_label("123. x"), None);
        assert_eq!(marker_label("A. x"), None);
        assert!(is_marker_line("   8. Tài liệu tham khảo"));
    }
}
