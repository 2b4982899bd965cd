//! 提示词构建
//!
//! 把一个批次的字符渲染成发给模型的指令文本。

use crate::models::CharacterRecord;

const PROMPT_TEMPLATE: &str = r#"You are an expert typographer and writer. Provide short, descriptive, and engaging explanations for the following unicode characters.

The descriptions should:

1. Describe appearance if relevant.
2. Explain what it symbolizes or represents.
3. Mention common usage in digital communication, UI, or text if applicable.
4. Be concise (1-2 sentences).

Return exactly one entry per input character as JSON matching the provided schema:
{"descriptions": [{"codepoint": "<uppercase hex codepoint, e.g. 1F451>", "description": "<text>"}]}
Use the uppercase codepoint given for each character as its "codepoint" value.

Input characters:
{characters}
"#;

/// 渲染单个字符行
pub fn render_line(record: &CharacterRecord) -> String {
    format!(
        "- {} (Codepoint: {}, Name: {}, Block: {})",
        record.glyph, record.codepoint, record.name, record.block
    )
}

/// 构建一个批次的提示词
///
/// 相同输入总是得到相同输出。
pub fn build_prompt(records: &[CharacterRecord]) -> String {
    let mut lines = String::new();
    for record in records {
        lines.push_str(&render_line(record));
        lines.push('\n');
    }
    PROMPT_TEMPLATE.replace("{characters}", &lines)
}
