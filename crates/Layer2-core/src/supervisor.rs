//! Task Supervisor - 비동기 콜백 실행 및 취소
//!
//! Features:
//! - `(subscriber, entity)` 쌍마다 최대 하나의 PendingTask
//! - 새 태스크 제출 시 기존 태스크에 취소 신호 (대기하지 않음)
//! - 취소는 협조적: 작업이 `CancellationToken`을 관찰해야 실제로 멈춤
//! - 완료 시 자신의 PendingTask만 제거 (generation 비교)

use crate::callback::{panic_message, TaskFuture};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use lifecycle_foundation::{Direction, Error, Result, SubscriberKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, trace, warn};

// ============================================================================
// PendingTask
// ============================================================================

/// 실행 중인 비동기 반응
#[derive(Debug, Clone)]
pub struct PendingTask {
    pub direction: Direction,
    pub generation: u64,
    pub started_at: DateTime<Utc>,
    token: CancellationToken,
}

impl PendingTask {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

type PendingMap<K> = HashMap<(SubscriberKey, K), PendingTask>;

// ============================================================================
// TaskSupervisor
// ============================================================================

/// 비동기 콜백 감독자
pub struct TaskSupervisor<K> {
    runtime: Option<Handle>,
    pending: Arc<Mutex<PendingMap<K>>>,
    tasks: TaskTracker,
    next_generation: AtomicU64,
}

impl<K> TaskSupervisor<K>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    /// 지정한 런타임에서 태스크를 실행하는 감독자
    pub fn new(runtime: Option<Handle>) -> Self {
        Self {
            runtime,
            pending: Arc::new(Mutex::new(HashMap::new())),
            tasks: TaskTracker::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    /// 현재 tokio 런타임을 사용 (없으면 비동기 콜백은 실패로 기록됨)
    pub fn from_current() -> Self {
        Self::new(Handle::try_current().ok())
    }

    pub fn has_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// 비동기 작업 제출
    ///
    /// 같은 쌍에 실행 중인 태스크가 있으면 취소 신호를 보낸 뒤 교체합니다.
    pub fn submit<F>(
        &self,
        subscriber: &SubscriberKey,
        entity: K,
        direction: Direction,
        work: F,
    ) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> TaskFuture + Send + 'static,
    {
        let runtime = self.runtime.as_ref().ok_or(Error::NoRuntime)?;

        let token = CancellationToken::new();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let pair = (subscriber.clone(), entity);

        {
            let mut pending = self.pending.lock();
            let previous = pending.insert(
                pair.clone(),
                PendingTask {
                    direction,
                    generation,
                    started_at: Utc::now(),
                    token: token.clone(),
                },
            );
            if let Some(previous) = previous {
                previous.token.cancel();
                debug!(
                    subscriber = %pair.0,
                    entity = ?pair.1,
                    stale = %previous.direction,
                    next = %direction,
                    superseded = previous.direction.opposes(direction),
                    "Cancelled stale task"
                );
            }
        }

        let pending = Arc::clone(&self.pending);
        let work_token = token.clone();

        // work는 태스크 안에서 호출 (동기 부분의 panic도 여기서 잡힘)
        self.tasks.spawn_on(
            async move {
                let outcome = AssertUnwindSafe(async move { work(work_token).await })
                    .catch_unwind()
                    .await;

                {
                    let mut pending = pending.lock();
                    if pending.get(&pair).is_some_and(|t| t.generation == generation) {
                        pending.remove(&pair);
                    }
                }

                let (subscriber, entity) = pair;
                match outcome {
                    Ok(Ok(())) if token.is_cancelled() => {
                        debug!(%subscriber, ?entity, %direction, "Task stopped after cancellation");
                    }
                    Ok(Ok(())) => {
                        trace!(%subscriber, ?entity, %direction, "Task completed");
                    }
                    Ok(Err(e)) if token.is_cancelled() => {
                        debug!(%subscriber, ?entity, %direction, error = %e, "Task interrupted");
                    }
                    Ok(Err(e)) => {
                        let err = Error::callback(&subscriber, &entity, format!("{:#}", e));
                        warn!(%direction, error = %err, "Task callback failed");
                    }
                    Err(panic) => {
                        let err = Error::callback(&subscriber, &entity, panic_message(panic.as_ref()));
                        error!(%direction, error = %err, "Task callback panicked");
                    }
                }
            },
            runtime,
        );

        Ok(())
    }

    /// 쌍의 실행 중인 태스크에 취소 신호, 있었으면 true
    pub fn cancel(&self, subscriber: &SubscriberKey, entity: &K) -> bool {
        let removed = self.pending.lock().remove(&(subscriber.clone(), entity.clone()));
        match removed {
            Some(task) => {
                task.token.cancel();
                debug!(%subscriber, ?entity, direction = %task.direction, "Cancelled pending task");
                true
            }
            None => false,
        }
    }

    /// 모든 실행 중인 태스크에 취소 신호
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.pending.lock().drain().collect();
        for (_, task) in &drained {
            task.token.cancel();
        }
        drained.len()
    }

    pub fn is_pending(&self, subscriber: &SubscriberKey, entity: &K) -> bool {
        self.pending
            .lock()
            .contains_key(&(subscriber.clone(), entity.clone()))
    }

    pub fn pending(&self, subscriber: &SubscriberKey, entity: &K) -> Option<PendingTask> {
        self.pending
            .lock()
            .get(&(subscriber.clone(), entity.clone()))
            .cloned()
    }

    /// 추적 중인 PendingTask 수
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// 아직 종료되지 않은 태스크 수 (취소됐지만 실행 중인 것 포함)
    pub fn running_count(&self) -> usize {
        self.tasks.len()
    }

    /// 현재 실행 중인 모든 태스크가 끝날 때까지 대기
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

impl<K> fmt::Debug for TaskSupervisor<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSupervisor")
            .field("has_runtime", &self.runtime.is_some())
            .field("running", &self.tasks.len())
            .finish()
    }
}
