//! Post-processing: deterministic cleanup of the model reply.
//!
//! Chat models add formatting the prompt did not ask for: an outer
//! ` ```text ` fence, Windows line endings, zero-width characters copied from
//! the source document, or bold markers around the item numbers
//! (`**1. Tên học phần:** …`). Left alone, the last one hides every marker
//! from the section parser.
//!
//! Each rule is a pure `&str → String` pass and never removes words; the
//! cleaned reply is what the user sees and what the parser reads.
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised so the fence regex
//! only has to handle `\n`; bold unwrapping runs last, on clean lines.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all clean-up rules to a raw model reply.
///
/// Rules (applied in order):
/// 1. Strip an outer markdown fence wrapping the whole reply
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Remove invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
/// 4. Trim trailing whitespace per line and surrounding blank lines
/// 5. Unwrap `**…**` emphasis on numbered item lines
pub fn clean_reply(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_whitespace(&s);
    unwrap_bold_markers(&s)
}

// ── Rule 1: Strip outer fence ────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim whitespace ──────────────────────────────────────────────────

fn trim_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

// ── Rule 5: Unwrap bold item numbers ─────────────────────────────────────────
//
// Only lines whose text starts with `**N.` (or `__N.`) are touched, and only
// the emphasis markers are removed:
//   `**1. Tên học phần:** Toán rời rạc` → `1. Tên học phần: Toán rời rạc`

static RE_BOLD_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(\*\*|__)([0-9]{1,2}\.)").unwrap());

fn unwrap_bold_markers(input: &str) -> String {
    input
        .lines()
        .map(|line| match RE_BOLD_ITEM.captures(line) {
            Some(caps) => {
                let delim = &caps[2];
                let rest = &line[caps.get(0).map_or(0, |m| m.end())..];
                format!("{}{}{}", &caps[1], &caps[3], rest.replace(delim, ""))
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fence() {
        let input = "```text\n1. A\nx\n```";
        assert_eq!(strip_outer_fence(input), "1. A\nx");
    }

    #[test]
    fn test_inner_fence_untouched() {
        let input = "1. Mã nguồn\n```\nfn main() {}\n```\n2. B";
        assert_eq!(strip_outer_fence(input), input);
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "Toán\u{200B} rời\u{FEFF} rạc\u{00AD}";
        assert_eq!(remove_invisible_chars(input), "Toán rời rạc");
    }

    #[test]
    fn test_trim_whitespace() {
        assert_eq!(trim_whitespace("\n\n1. A   \n  x\t\n\n"), "1. A\n  x");
    }

    #[test]
    fn test_unwrap_bold_item() {
        assert_eq!(
            unwrap_bold_markers("**1. Tên học phần:** Toán rời rạc"),
            "1. Tên học phần: Toán rời rạc"
        );
        assert_eq!(unwrap_bold_markers("  __2. Số tín chỉ__"), "  2. Số tín chỉ");
    }

    #[test]
    fn test_bold_in_content_untouched() {
        let input = "Nội dung **quan trọng** ở đây";
        assert_eq!(unwrap_bold_markers(input), input);
    }

    #[test]
    fn test_clean_reply_full_pipeline() {
        let input = "```\r\n**1. Tên học phần:** Toán rời rạc\r\n\r\n**2. Số tín chỉ:** 3   \r\n```";
        let cleaned = clean_reply(input);
        assert_eq!(
            cleaned,
            "1. Tên học phần: Toán rời rạc\n\n2. Số tín chỉ: 3"
        );
    }

    #[test]
    fn test_clean_reply_plain_text_unchanged() {
        let input = "1. Tên học phần\nToán rời rạc\n2. Số tín chỉ\n3";
        assert_eq!(clean_reply(input), input);
    }
}
