use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::orchestrator::BatchOptions;
use crate::utils::RetryPolicy;

/// API 密钥所在的环境变量
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// 默认配置文件名，存在时自动加载
pub const DEFAULT_CONFIG_FILE: &str = "glyph-describer.toml";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 文件 ---
    /// 字符目录（外部构建步骤生成）
    pub catalog_path: PathBuf,
    /// 描述文件，同时也是检查点
    pub descriptions_path: PathBuf,
    // --- 批处理 ---
    pub batch_size: usize,
    pub max_workers: usize,
    // --- 重试 ---
    pub max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_jitter_ms: u64,
    // --- 运行方式 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 是否显示进度条
    pub show_progress: bool,
    /// 只统计待处理数量，不调用 API
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: None,
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
            request_timeout_secs: 120,
            catalog_path: PathBuf::from("src/unicode-data.json"),
            descriptions_path: PathBuf::from("descriptions.json"),
            batch_size: 25,
            max_workers: 5,
            max_attempts: 5,
            retry_initial_delay_ms: 2_000,
            retry_max_delay_ms: 60_000,
            retry_jitter_ms: 500,
            verbose_logging: false,
            show_progress: true,
            dry_run: false,
        }
    }
}

/// 配置文件内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    llm_api_base_url: Option<String>,
    llm_model_name: Option<String>,
    request_timeout_secs: Option<u64>,
    catalog_path: Option<PathBuf>,
    descriptions_path: Option<PathBuf>,
    batch_size: Option<usize>,
    max_workers: Option<usize>,
    max_attempts: Option<u32>,
    retry_initial_delay_ms: Option<u64>,
    retry_max_delay_ms: Option<u64>,
    retry_jitter_ms: Option<u64>,
    verbose_logging: Option<bool>,
    show_progress: Option<bool>,
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载
    ///
    /// `config_file` 为 `None` 时尝试当前目录下的 `glyph-describer.toml`，不存在则跳过；
    /// 显式指定的文件必须存在。
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match config_file {
            Some(path) => config.merge_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    config.merge_file(default_path)?;
                }
            }
        }

        config.merge_env()?;
        Ok(config)
    }

    /// 仅使用默认值和环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_toml(&content, path)
    }

    fn merge_toml(&mut self, content: &str, path: &Path) -> Result<(), ConfigError> {
        let file: FileConfig = toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(v) = file.llm_api_base_url {
            self.llm_api_base_url = v;
        }
        if let Some(v) = file.llm_model_name {
            self.llm_model_name = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.catalog_path {
            self.catalog_path = v;
        }
        if let Some(v) = file.descriptions_path {
            self.descriptions_path = v;
        }
        if let Some(v) = file.batch_size {
            self.batch_size = v;
        }
        if let Some(v) = file.max_workers {
            self.max_workers = v;
        }
        if let Some(v) = file.max_attempts {
            self.max_attempts = v;
        }
        if let Some(v) = file.retry_initial_delay_ms {
            self.retry_initial_delay_ms = v;
        }
        if let Some(v) = file.retry_max_delay_ms {
            self.retry_max_delay_ms = v;
        }
        if let Some(v) = file.retry_jitter_ms {
            self.retry_jitter_ms = v;
        }
        if let Some(v) = file.verbose_logging {
            self.verbose_logging = v;
        }
        if let Some(v) = file.show_progress {
            self.show_progress = v;
        }
        Ok(())
    }

    fn merge_env(&mut self) -> Result<(), ConfigError> {
        if let Some(key) = env_string(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm_api_key = Some(key);
        }
        if let Some(v) = env_string("LLM_API_BASE_URL") {
            self.llm_api_base_url = v;
        }
        if let Some(v) = env_string("LLM_MODEL_NAME") {
            self.llm_model_name = v;
        }
        if let Some(v) = env_string("CATALOG_PATH") {
            self.catalog_path = PathBuf::from(v);
        }
        if let Some(v) = env_string("DESCRIPTIONS_PATH") {
            self.descriptions_path = PathBuf::from(v);
        }
        if let Some(v) = env_parse("REQUEST_TIMEOUT_SECS", "u64")? {
            self.request_timeout_secs = v;
        }
        if let Some(v) = env_parse("BATCH_SIZE", "usize")? {
            self.batch_size = v;
        }
        if let Some(v) = env_parse("MAX_WORKERS", "usize")? {
            self.max_workers = v;
        }
        if let Some(v) = env_parse("MAX_ATTEMPTS", "u32")? {
            self.max_attempts = v;
        }
        if let Some(v) = env_parse("VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        Ok(())
    }

    /// 检查数值配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "必须大于 0"));
        }
        if self.max_workers == 0 {
            return Err(invalid("max_workers", "必须大于 0"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "必须大于 0"));
        }
        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(invalid(
                "retry_initial_delay_ms",
                "不能大于 retry_max_delay_ms",
            ));
        }
        Ok(())
    }

    /// 取出 API 密钥，缺失时返回带修复提示的错误
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.llm_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingApiKey {
                var_name: API_KEY_ENV.to_string(),
            })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            multiplier: 2.0,
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            jitter: Duration::from_millis(self.retry_jitter_ms),
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.batch_size,
            max_workers: self.max_workers,
            show_progress: self.show_progress,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_parse<T: FromStr>(name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        },
        Err(_) => Ok(None),
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
