// ==========================================
// 甜甜圈成本核算系统 - 防抖持久化调度器
// ==========================================
// 职责: 按逻辑键合并连续编辑，延迟 ~250ms 后落库一次
// 红线: 所有落库写（防抖的和立即的）都经同一把写锁串行化
// 红线: 被取代的排程不产生任何 I/O，也不改动状态指示器
// ==========================================

use crate::domain::AppStatus;
use crate::engine::events::{OptionalEventPublisher, StateEvent, StateEventKind};
use crate::i18n::{t, t_with_args};
use crate::repository::RepositoryResult;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 持久化逻辑键
///
/// 同键编辑互相取代，不同键互不影响
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveKey {
    Bahan(i64),
    Resep(i64),
    Topping(i64),
    ProduksiSetting,
}

#[derive(Clone)]
pub struct DebouncedSaver {
    /// key -> 最新排程的代号；落库前比对，不一致说明已被取代
    pending: Arc<Mutex<HashMap<SaveKey, u64>>>,
    generation: Arc<AtomicU64>,
    /// 串行化全部落库写的写锁
    write_lock: Arc<tokio::sync::Mutex<()>>,
    /// 在途写计数，>0 时状态为忙
    in_flight: Arc<AtomicUsize>,
    status: Arc<Mutex<AppStatus>>,
    events: OptionalEventPublisher,
    delay: Duration,
    disposed: Arc<AtomicBool>,
}

impl DebouncedSaver {
    pub fn new(
        delay_ms: u64,
        status: Arc<Mutex<AppStatus>>,
        events: OptionalEventPublisher,
        disposed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            status,
            events,
            delay: Duration::from_millis(delay_ms),
            disposed,
        }
    }

    fn lock_status(&self) -> std::sync::MutexGuard<AppStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_busy(&self) {
        let mut status = self.lock_status();
        status.message = t("status.saving");
        status.is_busy = true;
        status.is_error = false;
        status.last_updated = Utc::now();
    }

    fn set_saved(&self) {
        let mut status = self.lock_status();
        status.message = t("status.saved");
        status.is_busy = false;
        status.is_error = false;
        status.last_updated = Utc::now();
    }

    fn set_error(&self, reason: &str) {
        let mut status = self.lock_status();
        status.message = t_with_args("status.save_failed", &[("reason", reason)]);
        status.is_busy = false;
        status.is_error = true;
        status.last_updated = Utc::now();
    }

    /// 写任务完成（成功/失败/被取代）后的计数回收
    fn finish_one(&self, outcome: WriteOutcome) {
        let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        match outcome {
            WriteOutcome::Completed => {
                if remaining == 0 {
                    self.set_saved();
                }
            }
            WriteOutcome::Failed(reason) => {
                self.set_error(&reason);
            }
            // 被取代的排程无 I/O 可报，但若它恰好是最后一个收尾的
            // （取代它的写已先行完成），仍要把计数归零态落到指示器上
            WriteOutcome::Superseded => {
                if remaining == 0 && !self.lock_status().is_error {
                    self.set_saved();
                }
            }
        }
    }

    /// 排程一次防抖写
    ///
    /// 同键的未触发排程被本次取代；延迟结束后仍是最新代号才真正落库
    pub fn schedule<F>(&self, key: SaveKey, write: F)
    where
        F: FnOnce() -> RepositoryResult<()> + Send + 'static,
    {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.insert(key, generation);
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.set_busy();

        let saver = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(saver.delay).await;

            if !saver.claim(key, generation) {
                saver.finish_one(WriteOutcome::Superseded);
                return;
            }

            let _guard = saver.write_lock.lock().await;
            if saver.disposed.load(Ordering::SeqCst) {
                saver.finish_one(WriteOutcome::Superseded);
                return;
            }

            match write() {
                Ok(()) => {
                    saver.finish_one(WriteOutcome::Completed);
                    saver
                        .events
                        .publish(StateEvent::new(StateEventKind::SaveCompleted, None));
                }
                Err(e) => {
                    tracing::error!("防抖落库失败 - key={:?}, error={}", key, e);
                    saver.finish_one(WriteOutcome::Failed(e.to_string()));
                    saver
                        .events
                        .publish(StateEvent::new(StateEventKind::SaveFailed, None));
                }
            }
        });
    }

    /// 仅当代号仍是最新时认领该键（认领即从排程表移除）
    fn claim(&self, key: SaveKey, generation: u64) -> bool {
        if self.disposed.load(Ordering::SeqCst) {
            return false;
        }
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        match pending.get(&key) {
            Some(current) if *current == generation => {
                pending.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// 立即写（结构性操作），同样经过写锁与在途计数
    ///
    /// 错误向调用方返回，由其决定是否转为用户可见状态
    pub async fn run_immediate<T, F>(&self, write: F) -> RepositoryResult<T>
    where
        F: FnOnce() -> RepositoryResult<T>,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.set_busy();

        let _guard = self.write_lock.lock().await;
        match write() {
            Ok(value) => {
                self.finish_one(WriteOutcome::Completed);
                self.events
                    .publish(StateEvent::new(StateEventKind::SaveCompleted, None));
                Ok(value)
            }
            Err(e) => {
                tracing::error!("立即落库失败 - error={}", e);
                self.finish_one(WriteOutcome::Failed(e.to_string()));
                self.events
                    .publish(StateEvent::new(StateEventKind::SaveFailed, None));
                Err(e)
            }
        }
    }

    /// 在途写计数（含尚未触发的防抖排程）
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 取消全部未触发的排程；之后的 schedule 调用成为空操作
    pub fn dispose(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.clear();
    }
}

enum WriteOutcome {
    Completed,
    Failed(String),
    Superseded,
}
