use std::time::Duration;

use crate::dispatch::{RetryPolicy, ScanSettings};
use crate::pipeline::WorkflowSettings;

/// 服务配置 - order pipeline 的所有配置项
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (存在时写入滚动文件) |
/// | OUTBOUND_TIMEOUT_MS | 10000 | 聚合平台 / 3PL 调用超时(毫秒) |
/// | PROPOSAL_RETRY_ATTEMPTS | 3 | 报价请求重试次数 |
/// | PROPOSAL_RETRY_BASE_MS | 500 | 报价重试基础延迟(毫秒) |
/// | CRON_INTERVAL_SECS | 60 | 定时扫描间隔(秒) |
/// | SCAN_BATCH_LIMIT | 200 | 单次扫描订单上限 |
/// | PERFORMER_LOOKUP_MINUTES | 15 | 寻找骑手超时后重新竞价(分钟) |
/// | NO_DISPATCHER_MINUTES | 10 | 出餐后无骑手告警(分钟) |
/// | AUTO_CLOSE_AFTER_HOURS | 12 | 自动关单(小时) |
/// | DISPATCH_CONCURRENCY | 8 | 并发下单 3PL 数量 |
/// | THREE_PL_BASE_URL | - | 3PL 服务地址 (未设置则关闭 3PL) |
/// | DEFAULT_COOKING_MINUTES | 20 | 门店未配置时的默认出餐时间 |
/// | SEED_FILE | - | 启动时加载的门店 / 订单 JSON |
///
/// # 示例
///
/// ```ignore
/// HTTP_PORT=9000 THREE_PL_BASE_URL=http://3pl.local cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub outbound_timeout_ms: u64,
    pub proposal_retry_attempts: u32,
    pub proposal_retry_base_ms: u64,
    pub cron_interval_secs: u64,
    pub scan_batch_limit: usize,
    pub performer_lookup_minutes: i64,
    pub no_dispatcher_minutes: i64,
    pub auto_close_after_hours: i64,
    pub dispatch_concurrency: usize,
    pub three_pl_base_url: Option<String>,
    pub default_cooking_minutes: i64,
    pub seed_file: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: env_or("HTTP_PORT", 8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_opt("LOG_DIR"),
            outbound_timeout_ms: env_or("OUTBOUND_TIMEOUT_MS", 10_000),
            proposal_retry_attempts: env_or("PROPOSAL_RETRY_ATTEMPTS", 3),
            proposal_retry_base_ms: env_or("PROPOSAL_RETRY_BASE_MS", 500),
            cron_interval_secs: env_or("CRON_INTERVAL_SECS", 60),
            scan_batch_limit: env_or("SCAN_BATCH_LIMIT", 200),
            performer_lookup_minutes: env_or("PERFORMER_LOOKUP_MINUTES", 15),
            no_dispatcher_minutes: env_or("NO_DISPATCHER_MINUTES", 10),
            auto_close_after_hours: env_or("AUTO_CLOSE_AFTER_HOURS", 12),
            dispatch_concurrency: env_or("DISPATCH_CONCURRENCY", 8),
            three_pl_base_url: env_opt("THREE_PL_BASE_URL"),
            default_cooking_minutes: env_or("DEFAULT_COOKING_MINUTES", 20),
            seed_file: env_opt("SEED_FILE"),
        }
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_millis(self.outbound_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.proposal_retry_attempts,
            Duration::from_millis(self.proposal_retry_base_ms),
        )
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            interval: Duration::from_secs(self.cron_interval_secs.max(1)),
            batch_limit: self.scan_batch_limit,
            performer_lookup_minutes: self.performer_lookup_minutes,
            no_dispatcher_minutes: self.no_dispatcher_minutes,
            auto_close_after_hours: self.auto_close_after_hours,
        }
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            outbound_timeout: self.outbound_timeout(),
            default_cooking_minutes: self.default_cooking_minutes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
