//! Default prompts and report strings.
//!
//! Every piece of model-facing text lives here so it can be changed in one
//! place and inspected from tests without calling a model. Callers override
//! the prompt and system instruction through [`crate::config::ReportConfig`];
//! these constants are only the defaults.
//!
//! The defaults target Vietnamese course syllabi (đề cương học phần): the
//! prompt asks for a numbered list, which is exactly the shape the section
//! parser in [`crate::pipeline::sections`] expects.

/// System message sent before the document text.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "Bạn là một trợ lý AI thông minh, chuyên trích xuất thông tin từ tài liệu.";

/// Default user-editable extraction prompt.
///
/// Asks for one numbered item per field so the reply splits cleanly into
/// sections; "Không tìm thấy" ("not found") keeps every number present even
/// when the syllabus lacks the field.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Bạn là một trợ lý AI chuyên nghiệp trong việc trích xuất thông tin.

Từ nội dung đề cương học phần dưới đây, hãy trích xuất và trình bày rõ ràng theo kiểu đánh số thứ tự theo các mục sau:
1. Tên học phần
2. Mã học phần (nếu có)
3. Số tín chỉ
4. Điều kiện tiên quyết (nếu có)
5. Mục tiêu học phần
6. Chuẩn đầu ra của học phần (CLO)
7. Nội dung học phần tóm tắt
8. Tài liệu tham khảo (ghi rõ tên, tác giả, năm, NXB nếu có)

Nếu không tìm thấy thông tin nào, hãy ghi là "Không tìm thấy".
"#;

/// Default report title.
pub const DEFAULT_REPORT_TITLE: &str = "Thông tin trích xuất từ đề cương học phần";

/// Default file name of the downloadable report.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "extracted_information.pdf";

/// Footer text used when the report carries none: the generation time.
pub fn generated_at_footer(now: chrono::DateTime<chrono::Local>) -> String {
    format!("Xuất lúc {}", now.format("%d/%m/%Y %H:%M"))
}

/// Page-number label drawn in the footer (`p` is 1-indexed).
pub fn page_label(page: usize, total: usize) -> String {
    format!("Trang {page}/{total}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_prompt_is_a_numbered_list() {
        let markers = DEFAULT_EXTRACTION_PROMPT
            .lines()
            .filter(|l| l.trim_start().starts_with(|c: char| c.is_ascii_digit()))
            .count();
        assert_eq!(markers, 8);
    }

    #[test]
    fn footer_formats() {
        let t = chrono::Local.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).unwrap();
        assert_eq!(generated_at_footer(t), "Xuất lúc 18/10/2026 09:05");
        assert_eq!(page_label(2, 7), "Trang 2/7");
    }
}
