// All LLM prompt constants for the idea pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

use rand::seq::SliceRandom;

use crate::models::idea::IdeaKind;

/// People a software idea can be aimed at. One is picked per prompt.
pub const SOFTWARE_AUDIENCES: &[&str] = &[
    "맞벌이 부부",
    "자취하는 대학생",
    "반려동물을 키우는 1인 가구",
    "어린 자녀를 둔 부모",
    "재택근무하는 직장인",
    "부모님과 떨어져 사는 자녀",
    "식물을 키우는 초보 가드너",
    "룸메이트와 사는 사회초년생",
];

/// People a hardware + software idea can be aimed at.
pub const MIXED_AUDIENCES: &[&str] = &[
    "메이커 취미를 시작한 개발자",
    "라즈베리파이가 서랍에 잠자는 사람",
    "스마트홈을 꾸미고 싶은 자취생",
    "아이와 주말 프로젝트를 하고 싶은 부모",
    "출퇴근 길이 긴 직장인",
];

/// Idea prompt for a pure software answer to an everyday domestic pain point.
/// Replace: {audience}, {exclusions}
pub const SOFTWARE_PROMPT_TEMPLATE: &str = r#"당신은 개발자들에게 영감을 주는 창의적인 프로젝트 아이디어를 제안하는 전문가입니다.

이번에는 "{audience}"이(가) 집에서 매일 겪는 사소하지만 짜증나는 불편함을 하나 골라,
그것을 해결하는 **소프트웨어 전용** 토이 프로젝트 아이디어를 하나 생성해주세요.

**규칙:**
1. 하드웨어 없이 웹, 모바일, 봇, 데스크톱 앱만으로 구현 가능해야 함
2. 실제 생활의 구체적인 불편함에서 출발할 것
3. 유머러스하거나 공감가는 동기 포함
4. 구체적인 기술 스택 제안
5. 현실적인 개발 시간 예상
{exclusions}
**응답 형식 (정확히 이 형식만 사용):**

영감봇
**프로젝트 이름:** "프로젝트명"

**한 줄 설명:** 이 프로젝트가 무엇인지 한 문장으로 설명

**왜 이걸 만들어?** 재미있거나 공감가는 동기 설명

**어떻게 작동해?** 구체적인 작동 원리 설명 (2-4문장)

**기술 스택:**
- 기술1 (용도)
- 기술2 (용도)
- 기술3 (용도)

**예상 개발 시간:** N시간

---
아이디어를 생성해주세요."#;

/// Idea prompt for hardware + software projects.
/// Replace: {audience}, {exclusions}
pub const MIXED_PROMPT_TEMPLATE: &str = r#"당신은 개발자들에게 영감을 주는 창의적인 프로젝트 아이디어를 제안하는 전문가입니다.

"{audience}"을(를) 위한 재미있고 신박한 **하드웨어 + 소프트웨어** 토이 프로젝트 아이디어를 하나 생성해주세요.

**규칙:**
1. 실현 가능하면서도 독특한 아이디어
2. IoT, 센서, 마이크로컨트롤러, 자동화 등 하드웨어 요소를 반드시 포함
3. 유머러스하거나 실용적인 동기 포함
4. 구체적인 기술 스택 제안 (부품 포함)
5. 현실적인 개발 시간 예상
{exclusions}
**응답 형식 (정확히 이 형식만 사용):**

영감봇
**프로젝트 이름:** "프로젝트명"

**한 줄 설명:** 이 프로젝트가 무엇인지 한 문장으로 설명

**왜 이걸 만들어?** 재미있거나 공감가는 동기 설명

**어떻게 작동해?** 구체적인 작동 원리 설명 (2-4문장)

**기술 스택:**
- 기술1 (용도)
- 기술2 (용도)
- 기술3 (용도)

**예상 개발 시간:** N시간

---
아이디어를 생성해주세요."#;

/// Novelty judge prompt. Sent with web-search grounding.
/// Replace: {title}, {idea_text}, {summary_context}, {json_only}
pub const NOVELTY_PROMPT_TEMPLATE: &str = r#"당신은 토이 프로젝트 아이디어의 참신함을 심사하는 엄격한 심사위원입니다.
웹 검색을 활용해 아래 후보 아이디어가 이미 널리 알려진 앱/제품/오픈소스 프로젝트이거나,
아래 "이전에 보낸 아이디어 목록"의 항목과 사실상 같은 아이디어인지 판단하세요.

제목만 다르고 핵심 문제와 해결 방식이 같다면 중복입니다.
대상 사용자나 문제 상황이 분명히 다르면 참신한 것으로 봅니다.

[후보 아이디어 제목]
{title}

[후보 아이디어 전문]
{idea_text}

[이전에 보낸 아이디어 목록]
{summary_context}

다음 스키마의 JSON으로만 답하세요:
{"is_novel": true 또는 false, "reason": "한두 문장 판단 근거", "similar_examples": ["비슷한 기존 사례", "최대 5개"]}

{json_only}"#;

pub fn template_for(kind: IdeaKind) -> &'static str {
    match kind {
        IdeaKind::Software => SOFTWARE_PROMPT_TEMPLATE,
        IdeaKind::Mixed => MIXED_PROMPT_TEMPLATE,
    }
}

pub fn audiences_for(kind: IdeaKind) -> &'static [&'static str] {
    match kind {
        IdeaKind::Software => SOFTWARE_AUDIENCES,
        IdeaKind::Mixed => MIXED_AUDIENCES,
    }
}

/// Random audience for `kind`.
pub fn pick_audience(kind: IdeaKind) -> &'static str {
    audiences_for(kind)
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("개발자")
}

/// Exclusion block listing recent titles and the long-horizon summary log.
/// Empty when there is nothing to exclude.
pub fn exclusion_block(recent_titles: &[String], summary_context: &str) -> String {
    let mut block = String::new();

    if !recent_titles.is_empty() {
        block.push_str("\n**최근에 보낸 아이디어 (비슷한 주제도 절대 금지):**\n");
        for title in recent_titles {
            block.push_str("- ");
            block.push_str(title);
            block.push('\n');
        }
    }

    if !summary_context.is_empty() {
        block.push_str("\n**지금까지 보낸 아이디어 요약 (핵심 문제나 해결 방식이 겹치면 안 됨):**\n");
        block.push_str(summary_context);
        block.push('\n');
    }

    block
}

/// Feedback block appended after a rejected draft. Empty on the first attempt.
pub fn rejection_block(reasons: &[String]) -> String {
    if reasons.is_empty() {
        return String::new();
    }

    let mut block = String::from(
        "\n\n**이전 시도는 아래 이유로 거절되었습니다. 완전히 다른 문제와 해결책을 제안하세요:**\n",
    );
    for (i, reason) in reasons.iter().enumerate() {
        block.push_str(&format!("{}. {}\n", i + 1, reason));
    }
    block
}
