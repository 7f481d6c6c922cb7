//! 按客户端的令牌桶限流。
//!
//! 每个客户端标识对应一个令牌桶（稳态速率 + 突发容量）。后台清扫任务定期移除
//! 长时间未访问的客户端，避免注册表无限增长；清扫通过 `watch` 通道停止。

pub mod middleware;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::RateLimitConfig;

pub use middleware::{client_identity, rate_limit_middleware};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitPolicy {
    pub requests_per_minute: u32,
    pub burst: u32,
    /// 超过该时长未访问的客户端会被清扫
    pub idle_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            requests_per_minute: 100,
            burst: 10,
            idle_ttl: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(600),
        }
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(cfg: &RateLimitConfig) -> Self {
        Self {
            requests_per_minute: cfg.requests_per_minute.max(1),
            burst: cfg.burst.max(1),
            idle_ttl: Duration::from_secs(cfg.idle_ttl_secs.max(1)),
            sweep_interval: Duration::from_secs(cfg.sweep_interval_secs.max(1)),
        }
    }
}

/// 单次准入判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// 拒绝；`retry_after` 为下一个令牌可用前的等待时间
    Limited { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    fn try_take(&mut self, rate_per_sec: f64, capacity: f64, now: Instant) -> Admission {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate_per_sec).min(capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Admission::Allowed
        } else {
            let wait = (1.0 - self.tokens) / rate_per_sec;
            Admission::Limited {
                retry_after: Duration::from_secs_f64(wait),
            }
        }
    }
}

#[derive(Debug)]
struct ClientEntry {
    bucket: TokenBucket,
    last_access: Instant,
}

#[derive(Debug)]
struct Registry {
    policy: RateLimitPolicy,
    clients: Mutex<HashMap<String, ClientEntry>>,
}

impl Registry {
    fn rate_per_sec(&self) -> f64 {
        f64::from(self.policy.requests_per_minute) / 60.0
    }

    fn capacity(&self) -> f64 {
        f64::from(self.policy.burst)
    }

    fn check_at(&self, client: &str, now: Instant) -> Admission {
        let (rate, capacity) = (self.rate_per_sec(), self.capacity());
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = clients
            .entry(client.to_string())
            .or_insert_with(|| ClientEntry {
                bucket: TokenBucket::full(capacity, now),
                last_access: now,
            });
        entry.last_access = now;
        entry.bucket.try_take(rate, capacity, now)
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let ttl = self.policy.idle_ttl;
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let before = clients.len();
        clients.retain(|_, entry| now.saturating_duration_since(entry.last_access) <= ttl);
        before - clients.len()
    }

    fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct Sweeper {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct RateLimiter {
    registry: Arc<Registry>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            registry: Arc::new(Registry {
                policy,
                clients: Mutex::new(HashMap::new()),
            }),
            sweeper: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.registry.policy
    }

    /// 为客户端消耗一个令牌；返回是否放行
    pub fn admit(&self, client: &str) -> bool {
        self.check(client).is_allowed()
    }

    pub fn check(&self, client: &str) -> Admission {
        self.registry.check_at(client, Instant::now())
    }

    /// 指定时间点的准入判定
    pub fn check_at(&self, client: &str, now: Instant) -> Admission {
        self.registry.check_at(client, now)
    }

    /// 立即清扫一次，返回移除的客户端数
    pub fn sweep_idle(&self) -> usize {
        self.registry.sweep_at(Instant::now())
    }

    pub fn sweep_idle_at(&self, now: Instant) -> usize {
        self.registry.sweep_at(now)
    }

    pub fn tracked_clients(&self) -> usize {
        self.registry.len()
    }

    /// 启动后台清扫任务（需要在 Tokio 运行时内调用；重复调用无效果）
    pub fn start_sweeper(&self) {
        let mut slot = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let registry = Arc::clone(&self.registry);
        let period = registry.policy.sweep_interval;
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = registry.sweep_at(Instant::now());
                        if removed > 0 {
                            tracing::debug!(removed, remaining = registry.len(), "清扫空闲限流客户端");
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("限流清扫任务已退出");
        });

        *slot = Some(Sweeper { stop_tx, task });
    }

    /// 停止后台清扫任务并等待其退出
    pub async fn shutdown(&self) {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Sweeper { stop_tx, task }) = sweeper {
            let _ = stop_tx.send(true);
            if let Err(e) = task.await {
                tracing::warn!("限流清扫任务异常结束: {e}");
            }
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        let sweeper = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.task.abort();
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policy", &self.registry.policy)
            .field("clients", &self.registry.len())
            .finish()
    }
}
