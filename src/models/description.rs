use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::character::CharacterRecord;

/// 码位 → 描述
///
/// 运行期间只增不减；已有描述的码位在分发前就被过滤掉，不会被覆盖。
pub type DescriptionMap = HashMap<String, String>;

/// 单个字符的描述（结构化响应中的一项）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphDescription {
    /// 大写十六进制码位，例如 1F451
    pub codepoint: String,
    /// 简短描述
    pub description: String,
}

/// 一个批次的结构化响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphDescriptionBatch {
    pub descriptions: Vec<GlyphDescription>,
}

impl GlyphDescriptionBatch {
    /// 随请求一同发送的 JSON Schema
    pub fn json_schema() -> &'static Value {
        static SCHEMA: OnceLock<Value> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            json!({
                "type": "object",
                "properties": {
                    "descriptions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "codepoint": {
                                    "type": "string",
                                    "description": "The uppercase unicode codepoint, e.g., 1F451"
                                },
                                "description": {
                                    "type": "string",
                                    "description": "A concise description of the character."
                                }
                            },
                            "required": ["codepoint", "description"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["descriptions"],
                "additionalProperties": false
            })
        })
    }
}

/// 一个待请求的批次
#[derive(Debug, Clone)]
pub struct Batch {
    /// 批次首个字符在待处理列表中的偏移，仅用于日志
    pub index: usize,
    pub records: Vec<CharacterRecord>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 一个批次的结果
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub index: usize,
    pub descriptions: DescriptionMap,
}

/// 规范化模型返回的码位
///
/// 接受 `1f600`、`U+1F600`、` 0041 ` 等写法，返回大写十六进制；无法识别时返回 `None`。
pub fn normalize_codepoint(raw: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^(?i:U\+)?([0-9A-Fa-f]{1,6})$").expect("码位正则表达式非法")
    });

    pattern
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_codepoint_variants() {
        assert_eq!(normalize_codepoint("1F600").as_deref(), Some("1F600"));
        assert_eq!(normalize_codepoint("1f600").as_deref(), Some("1F600"));
        assert_eq!(normalize_codepoint("U+0041").as_deref(), Some("0041"));
        assert_eq!(normalize_codepoint("u+e000").as_deref(), Some("E000"));
        assert_eq!(normalize_codepoint("  2603 ").as_deref(), Some("2603"));
    }

    #[test]
    fn test_normalize_codepoint_rejects_garbage() {
        assert_eq!(normalize_codepoint(""), None);
        assert_eq!(normalize_codepoint("GRINNING FACE"), None);
        assert_eq!(normalize_codepoint("1F600 1F601"), None);
        assert_eq!(normalize_codepoint("1234567"), None);
    }

    #[test]
    fn test_schema_requires_descriptions() {
        let schema = GlyphDescriptionBatch::json_schema();
        assert_eq!(schema["required"][0], "descriptions");
        assert_eq!(
            schema["properties"]["descriptions"]["items"]["required"],
            json!(["codepoint", "description"])
        );
    }
}
