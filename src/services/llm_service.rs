//! LLM 服务 - 业务能力层
//!
//! 只负责"给定提示词和 schema，拿回一段 JSON 文本"的能力，不关心批次和重试。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 通过 `response_format = json_schema` 请求结构化输出
//! - 兼容 OpenAI API 的服务（默认 Gemini 的 OpenAI 兼容端点）

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, ConfigError, LlmError};

/// 远端文本生成能力
///
/// 批处理层只依赖这个 trait，测试中可以替换成内存实现。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 发送提示词，返回应当符合 `schema` 的 JSON 文本
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, LlmError>;

    /// 用于日志的模型名称
    fn model_name(&self) -> &str;
}

/// LLM 服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    ///
    /// 缺少 API 密钥时返回 `ConfigError::MissingApiKey`。
    pub fn new(config: &Config) -> AppResult<Self> {
        let api_key = config.require_api_key()?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.llm_api_base_url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                reason: e.to_string(),
            })?;

        let client = Client::with_config(openai_config).with_http_client(http_client);

        Ok(Self {
            client,
            model_name: config.llm_model_name.clone(),
        })
    }

    fn api_failed(&self, source: impl std::error::Error + Send + Sync + 'static) -> LlmError {
        LlmError::ApiCallFailed {
            model: self.model_name.clone(),
            source: Box::new(source),
        }
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符", prompt.len());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| self.api_failed(e))?;

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                name: "glyph_description_batch".to_string(),
                description: Some("Descriptions for a batch of unicode characters".to_string()),
                schema: Some(schema.clone()),
                strict: Some(true),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .response_format(response_format)
            .build()
            .map_err(|e| self.api_failed(e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.api_failed(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
