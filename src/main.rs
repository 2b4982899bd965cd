use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use glyph_describer::utils::logging;
use glyph_describer::{App, Config};

/// 为 Unicode 字符批量生成简短描述
#[derive(Debug, Parser)]
#[command(name = "glyph-describer", version)]
struct Cli {
    /// 配置文件路径（默认尝试 ./glyph-describer.toml）
    #[arg(long)]
    config: Option<PathBuf>,
    /// 字符目录 JSON
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// 描述文件 JSON
    #[arg(long)]
    descriptions: Option<PathBuf>,
    /// 每批字符数
    #[arg(long)]
    batch_size: Option<usize>,
    /// 最大并发批次数
    #[arg(long)]
    max_workers: Option<usize>,
    /// 模型名称
    #[arg(long)]
    model: Option<String>,
    /// OpenAI 兼容的 API 地址
    #[arg(long)]
    base_url: Option<String>,
    /// 只统计待处理字符，不调用 API
    #[arg(long)]
    dry_run: bool,
    /// 不显示进度条
    #[arg(long)]
    no_progress: bool,
    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.catalog {
            config.catalog_path = v;
        }
        if let Some(v) = self.descriptions {
            config.descriptions_path = v;
        }
        if let Some(v) = self.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = self.max_workers {
            config.max_workers = v;
        }
        if let Some(v) = self.model {
            config.llm_model_name = v;
        }
        if let Some(v) = self.base_url {
            config.llm_api_base_url = v;
        }
        config.dry_run |= self.dry_run;
        config.show_progress &= !self.no_progress;
        config.verbose_logging |= self.verbose;
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 读取 .env（不存在时忽略）
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let report = App::initialize(config)?.run().await?;

    if report.status.is_failure() {
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
