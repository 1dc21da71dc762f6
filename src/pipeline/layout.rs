//! Layout normalisation: [`Report`] + [`LayoutVariant`] → [`ReportLayout`].
//!
//! Every presentation variant is expressed as the same flat list of
//! [`Block`]s, so the renderer has a single drawing path and the variants
//! differ only in how sections are mapped here.
//!
//! | Variant | One section becomes |
//! |---------|---------------------|
//! | `PlainParagraphs` | `Label` + indented `Paragraph` per line |
//! | `HeadingAndBody` | `Heading` + `Paragraph` per line |
//! | `LabelValueTable` | one `TableRow` |
//! | `LabelValueTableWithFooter` | one `TableRow`, plus a [`PageFooter`] |
//!
//! The preamble gets no label block in the paragraph variants and a row with
//! an empty label cell in the table variants.
//!
//! [`recover_sections`] is the inverse mapping. For reports produced by the
//! section parser (preamble, if any, first) it returns the sections unchanged.

use crate::config::LayoutVariant;
use crate::prompts::generated_at_footer;
use crate::report::{Report, Section};

/// One drawable unit of the report body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Bold section label on its own line.
    Label(String),
    /// Section heading, bold and slightly larger than the body.
    Heading(String),
    /// One content line, wrapped to the page width.
    Paragraph { text: String, indented: bool },
    /// Two-column row: label cell and value cell (one line per entry).
    TableRow { label: String, value: Vec<String> },
}

/// Text drawn at the bottom of every page, next to the page number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFooter {
    pub text: String,
}

/// The renderer's input: title, body blocks and optional page footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    pub footer: Option<PageFooter>,
}

/// Map a report onto the block model of `variant`.
pub fn layout_report(report: &Report, variant: LayoutVariant) -> ReportLayout {
    let mut blocks = Vec::new();

    for section in &report.sections {
        if variant.is_table() {
            blocks.push(Block::TableRow {
                label: section.label.clone(),
                value: section.content.clone(),
            });
        } else {
            let indented = variant == LayoutVariant::PlainParagraphs;
            if !section.is_preamble() {
                blocks.push(if indented {
                    Block::Label(section.label.clone())
                } else {
                    Block::Heading(section.label.clone())
                });
            }
            blocks.extend(section.content.iter().map(|line| Block::Paragraph {
                text: line.clone(),
                indented,
            }));
        }
    }

    let footer = variant.has_footer().then(|| PageFooter {
        text: report
            .footer
            .clone()
            .unwrap_or_else(|| generated_at_footer(chrono::Local::now())),
    });

    ReportLayout {
        title: report.title.clone(),
        blocks,
        footer,
    }
}

/// Rebuild the sections a layout was produced from.
pub fn recover_sections(layout: &ReportLayout) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();

    for block in &layout.blocks {
        match block {
            Block::Label(label) | Block::Heading(label) => sections.push(Section::new(label)),
            Block::Paragraph { text, .. } => match sections.last_mut() {
                Some(current) => current.content.push(text.clone()),
                None => sections.push(Section::new("").with_content([text.clone()])),
            },
            Block::TableRow { label, value } => {
                sections.push(Section::new(label).with_content(value.iter().cloned()));
            }
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sections::parse_sections;

    const ALL_VARIANTS: [LayoutVariant; 4] = [
        LayoutVariant::PlainParagraphs,
        LayoutVariant::HeadingAndBody,
        LayoutVariant::LabelValueTable,
        LayoutVariant::LabelValueTableWithFooter,
    ];

    fn sample() -> Report {
        Report::new(vec![
            Section::new("Tên học phần").with_content(["Toán rời rạc"]),
            Section::new("Số tín chỉ").with_content(["3"]),
        ])
        .with_title("Thông tin")
    }

    #[test]
    fn plain_paragraphs_mapping() {
        let layout = layout_report(&sample(), LayoutVariant::PlainParagraphs);
        assert_eq!(
            layout.blocks,
            vec![
                Block::Label("Tên học phần".into()),
                Block::Paragraph {
                    text: "Toán rời rạc".into(),
                    indented: true
                },
                Block::Label("Số tín chỉ".into()),
                Block::Paragraph {
                    text: "3".into(),
                    indented: true
                },
            ]
        );
        assert!(layout.footer.is_none());
        assert_eq!(layout.title.as_deref(), Some("Thông tin"));
    }

    #[test]
    fn table_mapping_one_row_per_section() {
        let layout = layout_report(&sample(), LayoutVariant::LabelValueTable);
        assert_eq!(layout.blocks.len(), 2);
        assert_eq!(
            layout.blocks[1],
            Block::TableRow {
                label: "Số tín chỉ".into(),
                value: vec!["3".into()]
            }
        );
    }

    #[test]
    fn only_table_variants_emit_rows() {
        for variant in [
            LayoutVariant::PlainParagraphs,
            LayoutVariant::HeadingAndBody,
            LayoutVariant::LabelValueTable,
            LayoutVariant::LabelValueTableWithFooter,
        ] {
            let layout = layout_report(&sample(), variant);
            let rows = layout
                .blocks
                .iter()
                .filter(|b| matches!(b, Block::TableRow { .. }))
                .count();
            let expected = if variant.is_table() { layout.blocks.len() } else { 0 };
            assert_eq!(rows, expected, "{variant:?}");
        }
    }

    #[test]
    fn footer_only_in_footer_variant() {
        for variant in ALL_VARIANTS {
            let layout = layout_report(&sample(), variant);
            assert_eq!(layout.footer.is_some(), variant.has_footer(), "{variant:?}");
        }
    }

    #[test]
    fn footer_uses_report_text_or_timestamp() {
        let report = sample().with_footer("Khoa CNTT");
        let layout = layout_report(&report, LayoutVariant::LabelValueTableWithFooter);
        assert_eq!(layout.footer.unwrap().text, "Khoa CNTT");

        let layout = layout_report(&sample(), LayoutVariant::LabelValueTableWithFooter);
        assert!(layout.footer.unwrap().text.starts_with("Xuất lúc "));
    }

    #[test]
    fn preamble_has_no_label_block() {
        let report = Report::new(parse_sections("Mở đầu\n1. A\nx"));
        let layout = layout_report(&report, LayoutVariant::HeadingAndBody);
        assert_eq!(
            layout.blocks[0],
            Block::Paragraph {
                text: "Mở đầu".into(),
                indented: false
            }
        );
        let layout = layout_report(&report, LayoutVariant::LabelValueTable);
        assert!(matches!(&layout.blocks[0], Block::TableRow { label, .. } if label.is_empty()));
    }

    #[test]
    fn recovery_is_inverse_for_every_variant() {
        let replies = [
            "",
            "không có mục",
            "1. Tên học phần\nToán rời rạc\n2. Số tín chỉ\n3\n",
            "mở đầu\n1. A\n2. B\nb1\nb2\n3.\n",
            "1. Ghi chú\nmột\n1. Ghi chú\nhai",
        ];
        for reply in replies {
            let report = Report::new(parse_sections(reply));
            for variant in ALL_VARIANTS {
                let layout = layout_report(&report, variant);
                assert_eq!(
                    recover_sections(&layout),
                    report.sections,
                    "reply {reply:?}, variant {variant:?}"
                );
            }
        }
    }

    #[test]
    fn relayout_is_stable() {
        let report = Report::new(parse_sections("mở đầu\n1. A\na\n2. B\n"));
        for variant in ALL_VARIANTS {
            let once = recover_sections(&layout_report(&report, variant));
            let twice = recover_sections(&layout_report(&Report::new(once.clone()), variant));
            assert_eq!(once, twice);
        }
    }
}
