// Shared prompt fragments.
// Each pipeline that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting pieces.

/// Instruction appended to prompts whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction shared by every chat-bound prompt: Telegram renders legacy Markdown.
pub const TELEGRAM_MARKDOWN_INSTRUCTION: &str = "\
    Format the answer for Telegram legacy Markdown: use *bold* and _italic_ only, \
    never use # headings or tables.";

/// Fills `{key}` placeholders in a single pass.
///
/// Substituted values are never rescanned, so model output that happens to
/// contain `{key}` stays literal. Braces that name no key (JSON schemas in the
/// templates) are kept as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}
