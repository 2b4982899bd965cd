//! 描述获取 - 业务能力层
//!
//! 对单个批次：构建提示词 → 调用 LLM（带重试）→ 解析结构化响应。
//! 任何失败（网络、限流、格式不符）都交给重试层；重试耗尽后把错误交给调用方。

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::LlmError;
use crate::models::{
    normalize_codepoint, Batch, BatchResult, DescriptionMap, GlyphDescription,
    GlyphDescriptionBatch,
};
use crate::services::llm_service::TextGenerator;
use crate::services::prompt_builder::build_prompt;
use crate::utils::logging::truncate_text;
use crate::utils::{retry_with_backoff, RetryExhausted, RetryPolicy};

/// 描述获取器
///
/// 只持有只读的生成器和重试策略，可以在多个 worker 间共享。
pub struct DescriptionFetcher {
    generator: Arc<dyn TextGenerator>,
    retry: RetryPolicy,
}

impl DescriptionFetcher {
    pub fn new(generator: Arc<dyn TextGenerator>, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// 请求一个提示词的描述列表
    ///
    /// 每次尝试都是一次独立的远端调用；解析失败同样会触发重试。
    pub async fn fetch_batch(
        &self,
        prompt: &str,
    ) -> Result<Vec<GlyphDescription>, RetryExhausted<LlmError>> {
        retry_with_backoff(&self.retry, "描述请求", || {
            let generator = Arc::clone(&self.generator);
            let prompt = prompt.to_owned();
            async move {
                let raw = generator
                    .generate(&prompt, GlyphDescriptionBatch::json_schema())
                    .await?;
                parse_response(&raw)
            }
        })
        .await
    }

    /// 处理一个批次
    ///
    /// 返回的键都经过规范化，并且只包含本批次请求过的码位。
    pub async fn process_batch(
        &self,
        batch: &Batch,
    ) -> Result<BatchResult, RetryExhausted<LlmError>> {
        let prompt = build_prompt(&batch.records);
        let items = self.fetch_batch(&prompt).await?;

        let requested: HashSet<&str> = batch
            .records
            .iter()
            .map(|r| r.codepoint.as_str())
            .collect();

        let mut descriptions = DescriptionMap::with_capacity(items.len());
        for item in items {
            let Some(codepoint) = normalize_codepoint(&item.codepoint) else {
                warn!("[批次 {}] 忽略无法识别的码位: {}", batch.index, item.codepoint);
                continue;
            };
            if !requested.contains(codepoint.as_str()) {
                warn!("[批次 {}] 忽略未请求的码位: {}", batch.index, codepoint);
                continue;
            }
            descriptions.entry(codepoint).or_insert(item.description);
        }

        if descriptions.len() < batch.len() {
            debug!(
                "[批次 {}] 请求 {} 个字符，返回 {} 条描述",
                batch.index,
                batch.len(),
                descriptions.len()
            );
        }

        Ok(BatchResult {
            index: batch.index,
            descriptions,
        })
    }
}

/// 解析结构化响应
///
/// 接受纯 JSON，或被 Markdown 代码块包裹的 JSON；描述为空的条目会被跳过。
pub fn parse_response(raw: &str) -> Result<Vec<GlyphDescription>, LlmError> {
    let body = strip_code_fence(raw);

    let parsed: GlyphDescriptionBatch =
        serde_json::from_str(body).map_err(|source| LlmError::MalformedResponse {
            snippet: truncate_text(body, 120),
            source,
        })?;

    Ok(parsed
        .descriptions
        .into_iter()
        .filter_map(|item| {
            let description = item.description.trim();
            if description.is_empty() {
                None
            } else {
                Some(GlyphDescription {
                    codepoint: item.codepoint,
                    description: description.to_string(),
                })
            }
        })
        .collect())
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 跳过语言标记（例如 ```json），代码块可能整段写在一行
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
