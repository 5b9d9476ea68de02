//! Best-effort field extraction from free-text model output.
//!
//! The idea prompt asks for labelled fields (`**프로젝트 이름:** "..."` and so on),
//! but models drift, so every lookup tries a strict pattern and then a looser
//! one, and returns `None` instead of guessing.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::idea::SUMMARY_MAX_CHARS;

static TITLE_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)\*\*프로젝트 이름:\*\*[ \t]*["“]?([^"”\n]+?)["”]?[ \t]*$"#)
        .expect("static regex is valid")
});

static TITLE_LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?im)(?:프로젝트[ \t]*(?:이름|명)|project[ \t]*name)[ \t]*\**[ \t]*[:：][ \t]*\**[ \t]*["“]?([^"”\n*]+)"#)
        .expect("static regex is valid")
});

static ONE_LINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)한[ \t]*줄[ \t]*설명[ \t]*\**[ \t]*[:：][ \t]*\**[ \t]*(.+)$").expect("static regex is valid")
});

static HOW_IT_WORKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)어떻게[ \t]*작동해[ \t]*\??[ \t]*\**[ \t]*[:：]?[ \t]*\**[ \t]*(.+)$")
        .expect("static regex is valid")
});

/// Project title, or `None` when neither pattern finds a non-empty one.
pub fn extract_title(text: &str) -> Option<String> {
    [&*TITLE_STRICT, &*TITLE_LOOSE]
        .iter()
        .filter_map(|re| re.captures(text))
        .filter_map(|caps| caps.get(1).map(|m| clean_field(m.as_str())))
        .find(|title| !title.is_empty())
}

/// Short summary for the summary log, at most `SUMMARY_MAX_CHARS` characters.
///
/// Prefers the one-line description, then the how-it-works paragraph, then the
/// fourth non-empty line, then the head of the text.
pub fn extract_summary(text: &str) -> String {
    let field = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_field(m.as_str()))
            .filter(|s| !s.is_empty())
    };

    let summary = field(&*ONE_LINER)
        .or_else(|| field(&*HOW_IT_WORKS))
        .or_else(|| {
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .nth(3)
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.trim().to_string());

    truncate_chars(&summary, SUMMARY_MAX_CHARS)
}

fn clean_field(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '*' | '"' | '“' | '”' | '[' | ']' | '\''))
        .trim()
        .to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"영감봇
**프로젝트 이름:** "냉장고 파수꾼"

**한 줄 설명:** 냉장고 속 식재료 유통기한을 사진 한 장으로 관리하는 앱

**왜 이걸 만들어?** 매주 상한 우유를 버리는 게 지겨워서

**어떻게 작동해?** 장 본 영수증을 찍으면 OCR로 품목을 읽고 유통기한 알림을 보낸다.

**기술 스택:**
- Flutter (앱)

**예상 개발 시간:** 12시간"#;

    #[test]
    fn test_strict_title() {
        assert_eq!(extract_title(WELL_FORMED).as_deref(), Some("냉장고 파수꾼"));
    }

    #[test]
    fn test_loose_title_without_bold_or_quotes() {
        let text = "프로젝트명: 빨래 건조 예보기\n한 줄 설명: 날씨로 빨래 타이밍 알려줌";
        assert_eq!(extract_title(text).as_deref(), Some("빨래 건조 예보기"));

        let english = "Project Name: **Sock Matcher**";
        assert_eq!(extract_title(english).as_deref(), Some("Sock Matcher"));
    }

    #[test]
    fn test_no_title_in_free_text() {
        assert!(extract_title("오늘은 아이디어가 없네요. 다음에 다시 물어봐 주세요.").is_none());
        assert!(extract_title("**프로젝트 이름:** \"\"").is_none());
    }

    #[test]
    fn test_summary_prefers_one_liner() {
        assert_eq!(
            extract_summary(WELL_FORMED),
            "냉장고 속 식재료 유통기한을 사진 한 장으로 관리하는 앱"
        );
    }

    #[test]
    fn test_summary_falls_back_to_how_it_works() {
        let text = "**프로젝트 이름:** \"A\"\n**어떻게 작동해?** 센서가 문 열림을 감지한다.";
        assert_eq!(extract_summary(text), "센서가 문 열림을 감지한다.");
    }

    #[test]
    fn test_summary_falls_back_to_fourth_line() {
        let text = "one\n\ntwo\nthree\n  four  \nfive";
        assert_eq!(extract_summary(text), "four");
    }

    #[test]
    fn test_summary_falls_back_to_head_and_truncates() {
        let text = "가".repeat(500);
        let summary = extract_summary(&text);
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_long_how_it_works_is_truncated() {
        let text = format!("**어떻게 작동해?** {}", "x".repeat(400));
        assert_eq!(extract_summary(&text).len(), SUMMARY_MAX_CHARS);
    }
}
