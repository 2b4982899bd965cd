//! 应用主流程
//!
//! 加载 → 筛选 → 批量生成 → 排序保存。运行只有三个阶段：
//! Idle（加载前）→ Processing（批次在途）→ Done（检查点与排序结果已写入）。
//! 进程重启后完全根据描述文件重新计算待处理字符。

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, API_KEY_ENV};
use crate::error::{AppResult, ConfigError};
use crate::models::{finalize_and_save, load_catalog, load_descriptions};
use crate::orchestrator::batch_processor::{self, partition};
use crate::services::{filter_pending, DescriptionFetcher, LlmService, TextGenerator};
use crate::utils::logging::{log_pending, log_startup, print_final_stats};

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Processing,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "Idle"),
            RunPhase::Processing => write!(f, "Processing"),
            RunPhase::Done => write!(f, "Done"),
        }
    }
}

/// 运行结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// 字符目录不存在或为空，没有任何副作用
    NoCatalog,
    /// 所有字符都已有描述
    NothingToDo,
    /// 仅统计，未调用 API
    DryRun,
    /// 正常完成（可能有空批次）
    Completed,
}

impl RunStatus {
    /// 是否应以非零状态退出
    pub fn is_failure(self) -> bool {
        matches!(self, RunStatus::NoCatalog)
    }
}

/// 运行报告
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    /// 描述文件中的总条数
    pub total_descriptions: usize,
    /// 本次新生成的条数
    pub generated: usize,
    /// 没有返回描述的批次（起始索引）
    pub empty_batches: Vec<usize>,
}

impl RunReport {
    fn early(status: RunStatus, total_descriptions: usize) -> Self {
        Self {
            status,
            total_descriptions,
            generated: 0,
            empty_batches: Vec::new(),
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    fetcher: Option<Arc<DescriptionFetcher>>,
}

impl App {
    /// 初始化应用
    ///
    /// 非 dry-run 模式下缺少 API 密钥会直接返回错误。
    pub fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;

        let fetcher = if config.dry_run {
            None
        } else {
            let service = LlmService::new(&config)?;
            info!("✓ 已找到 {}，LLM 客户端已创建", API_KEY_ENV);
            Some(Arc::new(DescriptionFetcher::new(
                Arc::new(service),
                config.retry_policy(),
            )))
        };

        log_startup(&config.llm_model_name, config.batch_size, config.max_workers);

        Ok(Self { config, fetcher })
    }

    /// 使用自定义生成器初始化（测试或其它后端）
    pub fn with_generator(config: Config, generator: Arc<dyn TextGenerator>) -> AppResult<Self> {
        config.validate()?;
        let fetcher = DescriptionFetcher::new(generator, config.retry_policy());
        Ok(Self {
            config,
            fetcher: Some(Arc::new(fetcher)),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunReport> {
        let mut phase = RunPhase::Idle;
        info!("▶ 阶段: {}", phase);

        let catalog = load_catalog(&self.config.catalog_path).await?;
        if catalog.is_empty() {
            warn!("⚠️ 字符目录为空，程序结束");
            return Ok(RunReport::early(RunStatus::NoCatalog, 0));
        }

        let descriptions_path = &self.config.descriptions_path;
        let descriptions = load_descriptions(descriptions_path).await?;
        let pending = filter_pending(&catalog, &descriptions);

        if pending.is_empty() {
            info!("✅ 所有字符都已有描述");
            return Ok(RunReport::early(RunStatus::NothingToDo, descriptions.len()));
        }

        if self.config.dry_run {
            let total_batches = partition(&pending, self.config.batch_size).len();
            log_pending(pending.len(), total_batches);
            info!("💡 dry-run 模式，不调用 API");
            return Ok(RunReport::early(RunStatus::DryRun, descriptions.len()));
        }

        let fetcher = self
            .fetcher
            .clone()
            .ok_or_else(|| ConfigError::MissingApiKey {
                var_name: API_KEY_ENV.to_string(),
            })?;

        phase = RunPhase::Processing;
        info!("▶ 阶段: {} (模型: {})", phase, fetcher.model_name());

        let outcome = batch_processor::run_all(
            fetcher,
            pending,
            descriptions,
            descriptions_path,
            &self.config.batch_options(),
        )
        .await?;

        let sorted = finalize_and_save(&outcome.descriptions, descriptions_path).await?;

        phase = RunPhase::Done;
        info!("▶ 阶段: {}", phase);

        print_final_stats(
            outcome.generated,
            sorted.len(),
            outcome.empty_batches.len(),
            &descriptions_path.display().to_string(),
        );

        Ok(RunReport {
            status: RunStatus::Completed,
            total_descriptions: sorted.len(),
            generated: outcome.generated,
            empty_batches: outcome.empty_batches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_catalog_is_failure() {
        assert!(RunStatus::NoCatalog.is_failure());
        assert!(!RunStatus::NothingToDo.is_failure());
        assert!(!RunStatus::DryRun.is_failure());
        assert!(!RunStatus::Completed.is_failure());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(RunPhase::Processing.to_string(), "Processing");
    }
}
