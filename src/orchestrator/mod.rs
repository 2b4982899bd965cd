//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用主流程
//! - 初始化（配置校验、API 密钥检查、创建 LLM 客户端）
//! - 加载字符目录和已有描述，筛选待处理字符
//! - 调用批处理器，最后排序保存
//!
//! ### `batch_processor` - 批量处理器
//! - 切分批次，控制并发数量（Semaphore）
//! - 隔离单个批次的失败
//! - 合并结果并写入检查点
//!
//! ## 层次关系
//!
//! ```text
//! app (加载 / 筛选 / 最终保存)
//!     ↓
//! batch_processor (Vec<Batch>，并发 + 合并)
//!     ↓
//! services::DescriptionFetcher (单个批次：提示词 → 重试请求 → 解析)
//!     ↓
//! services::TextGenerator (远端 LLM)
//! ```

pub mod app;
pub mod batch_processor;

pub use app::{App, RunPhase, RunReport, RunStatus};
pub use batch_processor::{partition, run_all, BatchOptions, RunOutcome};
