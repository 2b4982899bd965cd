//! 字符目录与描述文件的读写
//!
//! 描述文件的每次写入都先写到同目录的临时文件，再 rename 覆盖目标，
//! 进程在写入途中被杀掉时磁盘上仍然是完整的 JSON。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, error, info};

use crate::error::{AppResult, FileError};
use crate::models::{CharacterRecord, DescriptionMap, UnicodeCatalog};

/// 加载字符目录
///
/// 文件不存在时记录错误并返回空列表，这是用户可以自行修复的情况（先构建目录）。
pub async fn load_catalog(path: &Path) -> AppResult<Vec<CharacterRecord>> {
    if !file_exists(path).await? {
        error!("❌ 未找到字符目录: {}", path.display());
        error!("💡 请先运行构建步骤生成该文件（例如 `just build`）");
        return Ok(Vec::new());
    }

    let content = read_to_string(path).await?;
    let catalog: UnicodeCatalog =
        serde_json::from_str(&content).map_err(|source| FileError::JsonParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

    info!("✓ 从字符目录加载了 {} 个字符", catalog.characters.len());
    Ok(catalog.characters)
}

/// 加载已有描述
///
/// 文件不存在是首次运行的正常情况，返回空表。
pub async fn load_descriptions(path: &Path) -> AppResult<DescriptionMap> {
    if !file_exists(path).await? {
        info!("📄 未找到已有描述，从头开始");
        return Ok(DescriptionMap::new());
    }

    let content = read_to_string(path).await?;
    let descriptions: DescriptionMap =
        serde_json::from_str(&content).map_err(|source| FileError::JsonParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

    info!("✓ 加载了 {} 条已有描述", descriptions.len());
    Ok(descriptions)
}

/// 写入检查点
pub async fn save_descriptions(descriptions: &DescriptionMap, path: &Path) -> AppResult<()> {
    write_json_atomically(descriptions, path).await?;
    debug!("检查点已写入: {} ({} 条)", path.display(), descriptions.len());
    Ok(())
}

/// 按码位排序后写入最终文件
///
/// 键按字典序升序排列，覆盖已有内容。返回排序后的映射。
pub async fn finalize_and_save(
    descriptions: &DescriptionMap,
    path: &Path,
) -> AppResult<BTreeMap<String, String>> {
    let sorted: BTreeMap<String, String> = descriptions
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    write_json_atomically(&sorted, path).await?;

    info!("✓ 已排序并保存 {} 条描述", sorted.len());
    Ok(sorted)
}

// 只有 NotFound 视为不存在，权限等错误照常返回
async fn file_exists(path: &Path) -> AppResult<bool> {
    fs::try_exists(path).await.map_err(|source| {
        FileError::ReadFailed {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

async fn read_to_string(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).await.map_err(|source| {
        FileError::ReadFailed {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

async fn write_json_atomically<T: Serialize>(value: &T, path: &Path) -> AppResult<()> {
    let mut body = serde_json::to_string_pretty(value).map_err(FileError::JsonSerializeFailed)?;
    body.push('\n');

    let tmp_path = temp_path_for(path);
    let write_failed = |source: std::io::Error| FileError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_failed)?;
    }
    fs::write(&tmp_path, body).await.map_err(write_failed)?;
    fs::rename(&tmp_path, path).await.map_err(write_failed)?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "descriptions.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_catalog_missing_file_returns_empty() {
        let dir = tempdir().unwrap();
        let records = load_catalog(&dir.path().join("unicode-data.json"))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_load_catalog_reads_characters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unicode-data.json");
        std::fs::write(
            &path,
            r#"{"version": "15.1", "characters": [
                {"code": "0041", "char": "A", "name": "LATIN CAPITAL LETTER A", "block": "Basic Latin"},
                {"code": "1F600", "char": "😀", "name": "GRINNING FACE", "block": "Emoticons"}
            ]}"#,
        )
        .unwrap();

        let records = load_catalog(&path).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].codepoint, "1F600");
    }

    #[tokio::test]
    async fn test_load_catalog_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unicode-data.json");
        std::fs::write(&path, "not json").unwrap();

        let result = load_catalog(&path).await;

        assert!(matches!(
            result,
            Err(crate::AppError::File(FileError::JsonParseFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_path_is_error_not_missing() {
        let dir = tempdir().unwrap();
        // 父路径是普通文件，metadata 返回 ENOTDIR 而不是 NotFound
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let catalog = load_catalog(&blocker.join("unicode-data.json")).await;
        assert!(matches!(
            catalog,
            Err(crate::AppError::File(FileError::ReadFailed { .. }))
        ));

        let descriptions = load_descriptions(&blocker.join("descriptions.json")).await;
        assert!(matches!(
            descriptions,
            Err(crate::AppError::File(FileError::ReadFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_load_descriptions_missing_file_returns_empty() {
        let dir = tempdir().unwrap();
        let map = load_descriptions(&dir.path().join("descriptions.json"))
            .await
            .unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("descriptions.json");
        let mut map = DescriptionMap::new();
        map.insert("1F600".to_string(), "A yellow face with a broad grin.".to_string());
        map.insert("2603".to_string(), "A snowman ☃ with \"quotes\".".to_string());

        save_descriptions(&map, &path).await.unwrap();
        let loaded = load_descriptions(&path).await.unwrap();

        assert_eq!(loaded, map);
        assert!(!temp_path_for(&path).exists());
    }

    #[tokio::test]
    async fn test_finalize_writes_sorted_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("descriptions.json");
        let mut map = DescriptionMap::new();
        map.insert("1F600".to_string(), "grin".to_string());
        map.insert("0041".to_string(), "letter".to_string());
        map.insert("00E9".to_string(), "accent".to_string());

        let sorted = finalize_and_save(&map, &path).await.unwrap();

        let keys: Vec<_> = sorted.keys().cloned().collect();
        assert_eq!(keys, vec!["0041", "00E9", "1F600"]);

        let text = std::fs::read_to_string(&path).unwrap();
        let a = text.find("\"0041\"").unwrap();
        let e = text.find("\"00E9\"").unwrap();
        let grin = text.find("\"1F600\"").unwrap();
        assert!(a < e && e < grin);
        assert!(text.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_finalize_keeps_non_ascii_unescaped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("descriptions.json");
        let mut map = DescriptionMap::new();
        map.insert("2603".to_string(), "☃ snowman".to_string());

        finalize_and_save(&map, &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("☃ snowman"));
    }
}
