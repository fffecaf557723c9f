use chrono::{DateTime, Utc};
use serde::Deserialize;

/// 统计查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    // 要求数据至少新于该时间点
    pub as_of: Option<DateTime<Utc>>,
}
