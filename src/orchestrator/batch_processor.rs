//! 批量描述处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **分批**：把待处理字符切成固定大小的连续批次
//! 2. **并发控制**：使用 Semaphore 限制同时在途的批次数量
//! 3. **失败隔离**：单个批次重试耗尽后按空结果处理，不影响其它批次
//! 4. **合并与检查点**：全部批次结束后在单个任务里合并结果，再写入检查点
//!
//! worker 之间不共享可变状态，描述表只在 join 之后被修改，因此不需要锁。

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::error::AppResult;
use crate::models::{save_descriptions, Batch, BatchResult, CharacterRecord, DescriptionMap};
use crate::services::DescriptionFetcher;
use crate::utils::logging::{log_empty_batches, log_pending};
use crate::utils::progress::create_progress_bar;

/// 批处理参数
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// 每批字符数
    pub batch_size: usize,
    /// 最大并发批次数
    pub max_workers: usize,
    /// 是否显示进度条
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 25,
            max_workers: 5,
            show_progress: false,
        }
    }
}

/// 一次完整运行的结果
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// 合并后的描述表
    pub descriptions: DescriptionMap,
    /// 本次新增的描述数
    pub generated: usize,
    /// 没有返回任何描述的批次（起始索引）
    pub empty_batches: Vec<usize>,
}

/// 切分批次
///
/// 连续切分，最后一批可能不足 `batch_size`；`index` 为批次首个字符的偏移。
pub fn partition(records: &[CharacterRecord], batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    records
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            index: i * batch_size,
            records: chunk.to_vec(),
        })
        .collect()
}

/// 处理全部待处理字符
///
/// 所有批次结束后把结果合并进 `descriptions` 并写入 `checkpoint_path`。
/// 没有待处理字符时直接返回，不发请求也不写文件。
pub async fn run_all(
    fetcher: Arc<DescriptionFetcher>,
    pending: Vec<CharacterRecord>,
    mut descriptions: DescriptionMap,
    checkpoint_path: &Path,
    options: &BatchOptions,
) -> AppResult<RunOutcome> {
    let batches = partition(&pending, options.batch_size);
    if batches.is_empty() {
        return Ok(RunOutcome {
            descriptions,
            ..Default::default()
        });
    }

    log_pending(pending.len(), batches.len());

    let semaphore = Arc::new(Semaphore::new(options.max_workers.max(1)));
    let progress = create_progress_bar(batches.len() as u64, "生成描述", options.show_progress);

    let mut indices = Vec::with_capacity(batches.len());
    let mut handles = Vec::with_capacity(batches.len());

    for batch in batches {
        let batch_index = batch.index;
        let semaphore = Arc::clone(&semaphore);
        let fetcher = Arc::clone(&fetcher);
        let progress = progress.clone();

        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return None;
            };
            debug!("[批次 {}] 开始请求 {} 个字符", batch.index, batch.len());

            let result = match fetcher.process_batch(&batch).await {
                Ok(result) => Some(result),
                Err(e) => {
                    error!("[批次 {}] ❌ 请求失败: {}", batch.index, e);
                    None
                }
            };
            progress.inc(1);
            result
        });

        indices.push(batch_index);
        handles.push(handle);
    }

    // 等待所有批次完成
    let joined = join_all(handles).await;
    progress.finish_and_clear();

    let before = descriptions.len();
    let mut empty_batches = Vec::new();

    for (batch_index, outcome) in indices.into_iter().zip(joined) {
        match outcome {
            Ok(Some(result)) if !result.descriptions.is_empty() => {
                merge_batch(&mut descriptions, result);
            }
            Ok(_) => empty_batches.push(batch_index),
            Err(e) => {
                error!("[批次 {}] 任务执行失败: {}", batch_index, e);
                empty_batches.push(batch_index);
            }
        }
    }

    log_empty_batches(&empty_batches);

    save_descriptions(&descriptions, checkpoint_path).await?;

    let generated = descriptions.len() - before;
    info!(
        "✓ 本次生成 {} 条描述，当前共 {} 条",
        generated,
        descriptions.len()
    );

    Ok(RunOutcome {
        descriptions,
        generated,
        empty_batches,
    })
}

// 已有的键保持不变
fn merge_batch(descriptions: &mut DescriptionMap, result: BatchResult) {
    for (codepoint, text) in result.descriptions {
        descriptions.entry(codepoint).or_insert(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<CharacterRecord> {
        (0..n)
            .map(|i| CharacterRecord::new(format!("{:04X}", 0x41 + i), "", "", ""))
            .collect()
    }

    #[test]
    fn test_partition_sizes_and_indices() {
        let batches = partition(&records(60), 25);

        let sizes: Vec<_> = batches.iter().map(Batch::len).collect();
        let indices: Vec<_> = batches.iter().map(|b| b.index).collect();
        assert_eq!(sizes, vec![25, 25, 10]);
        assert_eq!(indices, vec![0, 25, 50]);
    }

    #[test]
    fn test_partition_batches_are_disjoint_and_complete() {
        let input = records(7);
        let batches = partition(&input, 3);

        let flattened: Vec<_> = batches
            .iter()
            .flat_map(|b| b.records.iter().cloned())
            .collect();
        assert_eq!(flattened, input);
    }

    #[test]
    fn test_partition_empty_input() {
        assert!(partition(&[], 25).is_empty());
    }

    #[test]
    fn test_merge_batch_does_not_overwrite() {
        let mut descriptions = DescriptionMap::new();
        descriptions.insert("0041".to_string(), "original".to_string());

        let mut incoming = DescriptionMap::new();
        incoming.insert("0041".to_string(), "replacement".to_string());
        incoming.insert("0042".to_string(), "new".to_string());

        merge_batch(
            &mut descriptions,
            BatchResult {
                index: 0,
                descriptions: incoming,
            },
        );

        assert_eq!(descriptions["0041"], "original");
        assert_eq!(descriptions["0042"], "new");
    }
}
