use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub lifecycle: LifecycleConfig,
    pub aggregation: AggregationConfig,
    pub directory: DirectoryConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            system_name: "HWSystem Grading".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub unix_socket_path: String,
    pub workers: usize,
    pub max_workers: usize,
    pub timeouts: TimeoutConfig,
    pub limits: LimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            unix_socket_path: String::new(),
            workers: 0,
            max_workers: 8,
            timeouts: TimeoutConfig::default(),
            limits: LimitConfig::default(),
        }
    }
}

/// 超时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub client_request: u64,
    pub client_disconnect: u64,
    pub keep_alive: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            client_request: 5000,
            client_disconnect: 1000,
            keep_alive: 30,
        }
    }
}

/// 限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    pub max_payload_size: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 1024 * 1024,
        }
    }
}

/// JWT 配置（令牌由身份提供方签发，本服务只做校验）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    #[serde(skip_serializing)] // 不序列化到JSON响应中
    pub secret: String,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub max_age: usize,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { max_age: 3600 }
    }
}

/// 提交生命周期配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub lock_timeout_ms: u64,    // 等待单个提交锁的最长时间
    pub max_retries: u32,        // Timeout/Conflict 的内部重试次数
    pub retry_backoff_ms: u64,   // 首次重试退避
    pub sweep_interval_secs: u64, // 自动批阅扫描间隔，0 表示关闭
    pub lock_prune_interval_secs: u64, // 清理空闲锁的间隔，0 表示关闭
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 3000,
            max_retries: 3,
            retry_backoff_ms: 50,
            sweep_interval_secs: 300,
            lock_prune_interval_secs: 60,
        }
    }
}

/// 统计聚合配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub max_staleness_secs: i64,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_staleness_secs: 60,
            cache_capacity: 10_000,
            cache_ttl_secs: 3600,
        }
    }
}

/// 组织架构数据（学校 / 班级 / 家长关系）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub seed_file: String, // 启动时导入的 JSON 文件，留空则跳过
}
