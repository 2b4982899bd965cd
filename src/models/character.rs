use serde::{Deserialize, Serialize};

/// 字符目录中的单个字符
///
/// 来自外部构建步骤生成的 `unicode-data.json`，只读。
/// 除 `code` 外的字段缺失或为 null 时按空字符串处理，多余字段忽略。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(rename = "code", deserialize_with = "deserialize_codepoint")]
    pub codepoint: String,
    #[serde(rename = "char", default, deserialize_with = "deserialize_optional_text")]
    pub glyph: String,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub block: String,
}

impl CharacterRecord {
    pub fn new(
        codepoint: impl Into<String>,
        glyph: impl Into<String>,
        name: impl Into<String>,
        block: impl Into<String>,
    ) -> Self {
        Self {
            codepoint: codepoint.into(),
            glyph: glyph.into(),
            name: name.into(),
            block: block.into(),
        }
    }
}

/// 字符目录文件的顶层结构
#[derive(Debug, Default, Deserialize)]
pub struct UnicodeCatalog {
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
}

// 目录里的 code 统一转成大写，保证与描述文件的键一致
fn deserialize_codepoint<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_uppercase())
}

// null 与缺失同样处理
fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_ignores_extra_fields() {
        let json = r#"{
            "characters": [
                {"code": "1F600", "char": "😀", "name": "GRINNING FACE", "block": "Emoticons", "category": "So"}
            ]
        }"#;

        let catalog: UnicodeCatalog = serde_json::from_str(json).unwrap();

        assert_eq!(catalog.characters.len(), 1);
        assert_eq!(
            catalog.characters[0],
            CharacterRecord::new("1F600", "😀", "GRINNING FACE", "Emoticons")
        );
    }

    #[test]
    fn test_deserialize_missing_optional_fields() {
        let json = r#"{"characters": [{"code": "e000"}]}"#;

        let catalog: UnicodeCatalog = serde_json::from_str(json).unwrap();
        let record = &catalog.characters[0];

        assert_eq!(record.codepoint, "E000");
        assert!(record.glyph.is_empty());
        assert!(record.name.is_empty());
        assert!(record.block.is_empty());
    }

    #[test]
    fn test_deserialize_null_optional_fields() {
        let json = r#"{"characters": [
            {"code": "0041", "char": "A", "name": "LATIN CAPITAL LETTER A", "block": null},
            {"code": "0042", "char": null, "name": null, "block": "Basic Latin"}
        ]}"#;

        let catalog: UnicodeCatalog = serde_json::from_str(json).unwrap();

        assert_eq!(
            catalog.characters[0],
            CharacterRecord::new("0041", "A", "LATIN CAPITAL LETTER A", "")
        );
        assert_eq!(
            catalog.characters[1],
            CharacterRecord::new("0042", "", "", "Basic Latin")
        );
    }

    #[test]
    fn test_missing_characters_key_is_empty_catalog() {
        let catalog: UnicodeCatalog = serde_json::from_str("{}").unwrap();
        assert!(catalog.characters.is_empty());
    }
}
