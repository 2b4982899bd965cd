//! # Glyph Describer
//!
//! 为 Unicode 字符批量生成简短描述的小工具
//!
//! ## 架构设计
//!
//! 流程：加载 → 筛选 → 分批 → 调用远端 API → 合并 → 持久化
//!
//! ### ① 数据层（Models）
//! - `models/` - 字符记录、描述表、批次与结构化响应
//! - `models/loaders` - 字符目录与描述文件的读写（原子替换）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 只处理单个批次
//! - `filter_pending` - 筛选还没有描述的字符
//! - `build_prompt` - 构建提示词
//! - `LlmService` - 远端 LLM 调用（`TextGenerator` 的实现）
//! - `DescriptionFetcher` - 带重试的批次请求与响应解析
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 分批、并发、失败隔离、合并与检查点
//! - `orchestrator/app` - 应用主流程
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{CharacterRecord, DescriptionMap};
pub use orchestrator::{App, RunReport, RunStatus};
pub use services::{DescriptionFetcher, LlmService, TextGenerator};
