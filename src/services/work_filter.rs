//! 待处理字符筛选

use std::collections::HashSet;

use tracing::{debug, info};

use crate::models::{CharacterRecord, DescriptionMap};

/// 筛选出还没有描述的字符
///
/// 保持目录顺序；同一码位在目录中重复出现时只保留第一次，
/// 这样切分出的批次之间码位互不重叠。
pub fn filter_pending(
    catalog: &[CharacterRecord],
    descriptions: &DescriptionMap,
) -> Vec<CharacterRecord> {
    let mut seen = HashSet::with_capacity(catalog.len());
    let mut duplicates = 0usize;

    let pending: Vec<CharacterRecord> = catalog
        .iter()
        .filter(|record| !descriptions.contains_key(&record.codepoint))
        .filter(|record| {
            let first = seen.insert(record.codepoint.as_str());
            if !first {
                duplicates += 1;
            }
            first
        })
        .cloned()
        .collect();

    if duplicates > 0 {
        debug!("目录中有 {} 个重复码位已跳过", duplicates);
    }
    info!("📝 {} 个字符待处理", pending.len());
    pending
}
