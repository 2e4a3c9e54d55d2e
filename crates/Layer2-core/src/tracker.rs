//! Lifecycle Tracker - 원시 이벤트와 (해제)등록을 콜백 호출로 변환
//!
//! 하나의 락이 StateTable + ObserverRegistry를 함께 보호합니다. 원시 이벤트,
//! 등록, 해제는 각각 락을 한 번 잡고 처리되며, 동기 콜백은 락을 잡은 채
//! 실행됩니다. 따라서 등록 시 replay는 마지막으로 처리된 이벤트와 일관된
//! 상태를 봅니다.
//!
//! 동기 콜백은 같은 트래커를 다시 호출하면 안 됩니다 (락은 재진입 불가).
//! 느린 동기 콜백은 전체 전달을 지연시킵니다.

use crate::callback::{panic_message, Callback, Updated};
use crate::registry::{ObserverRegistry, Registration};
use crate::state::StateTable;
use crate::subscriber::Subscriber;
use crate::supervisor::{PendingTask, TaskSupervisor};
use lifecycle_foundation::{
    Direction, EntitySource, Error, RawEvent, RawEventListener, Result, SourceSubscription,
    SubscriberKey, TrackedEntity, TrackerConfig, UpdateKind,
};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, error, info, trace, warn};

/// 락으로 보호되는 상태 (StateTable + ObserverRegistry)
struct TrackerState<E: TrackedEntity> {
    table: StateTable<E>,
    registry: ObserverRegistry<E>,
    closed: bool,
}

// ============================================================================
// LifecycleTracker
// ============================================================================

/// 라이프사이클 이벤트 추적기 (Dispatcher)
pub struct LifecycleTracker<E: TrackedEntity> {
    config: TrackerConfig,
    source: Arc<dyn EntitySource<E>>,
    state: Mutex<TrackerState<E>>,
    supervisor: TaskSupervisor<E::Key>,
    subscription: Mutex<Option<SourceSubscription>>,
    this: Weak<Self>,
}

impl<E: TrackedEntity> LifecycleTracker<E> {
    /// 현재 tokio 런타임(있으면)을 비동기 콜백에 사용하는 트래커 생성
    pub fn new(config: TrackerConfig, source: Arc<dyn EntitySource<E>>) -> Arc<Self> {
        Self::with_runtime(config, source, Handle::try_current().ok())
    }

    /// 비동기 콜백용 런타임을 지정하여 생성
    pub fn with_runtime(
        config: TrackerConfig,
        source: Arc<dyn EntitySource<E>>,
        runtime: Option<Handle>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            config,
            source,
            state: Mutex::new(TrackerState {
                table: StateTable::new(),
                registry: ObserverRegistry::new(),
                closed: false,
            }),
            supervisor: TaskSupervisor::new(runtime),
            subscription: Mutex::new(None),
            this: this.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // ========================================================================
    // 시작 / 종료
    // ========================================================================

    /// 소스 구독 후 현재 엔티티로 StateTable 채우기
    ///
    /// 구독을 먼저 하고 열거하므로 그 사이의 이벤트는 중복 억제로 흡수됩니다.
    /// 열거 실패 시 빈 스냅샷으로 계속 진행합니다.
    pub fn start(&self) -> Result<()> {
        {
            let mut subscription = self.subscription.lock();
            if subscription.is_some() {
                return Ok(());
            }
            if self.state.lock().closed {
                return Err(Error::Closed);
            }

            let listener: Arc<dyn RawEventListener<E>> = Arc::new(SourceListener {
                tracker: self.this.clone(),
            });
            let handle = self
                .source
                .subscribe(listener)
                .map_err(|e| Error::SourceSubscription(format!("{}: {}", self.source.name(), e)))?;
            *subscription = Some(handle);
        }

        info!(tracker = %self.config.name, source = self.source.name(), "Tracker started");

        if self.config.seed_on_start {
            self.seed();
        }
        Ok(())
    }

    fn seed(&self) {
        match self.source.enumerate_current() {
            Ok(entities) => {
                debug!(tracker = %self.config.name, count = entities.len(), "Seeding state table");
                for entity in entities {
                    self.handle_event(RawEvent::Appeared(entity));
                }
            }
            Err(e) => {
                warn!(
                    tracker = %self.config.name,
                    source = self.source.name(),
                    error = %e,
                    "Source enumeration failed, continuing with empty snapshot"
                );
            }
        }
    }

    /// 소스를 다시 열거하여 StateTable과 맞춤
    ///
    /// 새로 보이는 엔티티는 appear, 사라진 엔티티는 disappear로 처리됩니다.
    pub fn resync(&self) {
        let current = match self.source.enumerate_current() {
            Ok(entities) => entities,
            Err(e) => {
                warn!(tracker = %self.config.name, error = %e, "Resync skipped, enumeration failed");
                return;
            }
        };

        let mut state = self.state.lock();
        if state.closed {
            return;
        }

        let seen: std::collections::HashSet<E::Key> = current.iter().map(|e| e.key()).collect();
        let stale: Vec<E::Key> = state
            .table
            .keys()
            .into_iter()
            .filter(|k| !seen.contains(k))
            .collect();

        debug!(tracker = %self.config.name, stale = stale.len(), "Resyncing with source");
        for key in stale {
            self.apply_disappeared(&mut state, key);
        }
        for entity in current {
            self.apply_appeared(&mut state, entity);
        }
    }

    /// 모든 구독자 해제 (대칭 teardown) 후 소스 구독 해제
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            for key in state.registry.keys() {
                self.unregister_locked(&mut state, &key);
            }
            state.closed = true;
            state.table.clear();
        }

        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }
        info!(tracker = %self.config.name, "Tracker closed");
    }

    /// `close()` 후 비동기 태스크가 끝나기를 `drain_timeout`까지 대기
    ///
    /// 시간 내에 끝나지 않은 태스크에는 취소 신호를 보냅니다.
    pub async fn shutdown(&self) {
        self.close();
        if tokio::time::timeout(self.config.drain_timeout(), self.supervisor.drain())
            .await
            .is_err()
        {
            let cancelled = self.supervisor.cancel_all();
            warn!(
                tracker = %self.config.name,
                cancelled,
                "Drain timed out, cancelled remaining tasks"
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    // ========================================================================
    // 등록 / 해제
    // ========================================================================

    /// 구독자 등록
    ///
    /// 같은 락 안에서 현재 스냅샷을 찍고 등록한 뒤, 필터를 통과하는 엔티티에
    /// 대해 스냅샷 순서대로 `on_appear`를 replay합니다.
    pub fn register(&self, key: impl Into<SubscriberKey>, subscriber: Subscriber<E>) -> Result<()> {
        let key = key.into();
        let mut state = self.state.lock();

        if state.closed {
            return Err(Error::Closed);
        }
        if state.registry.contains(&key) {
            warn!(tracker = %self.config.name, subscriber = %key, "Duplicate registration rejected");
            return Err(Error::duplicate(&key));
        }

        let replay: Vec<E> = state
            .table
            .snapshot()
            .into_iter()
            .filter(|entity| subscriber.matches(entity))
            .collect();

        let on_appear = subscriber.on_appear.clone();
        let mut registration = Registration::new(key.clone(), subscriber);
        for entity in &replay {
            registration.open(entity.key());
        }
        state.registry.register(registration)?;

        debug!(
            tracker = %self.config.name,
            subscriber = %key,
            replay = replay.len(),
            "Subscriber registered"
        );

        for entity in replay {
            let entity_key = entity.key();
            self.deliver(&key, &entity_key, Direction::Appear, on_appear.clone(), entity);
        }
        Ok(())
    }

    /// 구독자 해제
    ///
    /// 열린 엔티티마다 `on_disappear`를 정확히 한 번 합성한 뒤 제거합니다.
    /// 없는 키는 아무것도 하지 않습니다.
    pub fn unregister(&self, key: impl Into<SubscriberKey>) -> Result<()> {
        let key = key.into();
        let mut state = self.state.lock();
        if !self.unregister_locked(&mut state, &key) {
            debug!(tracker = %self.config.name, subscriber = %key, "Unregister of unknown subscriber ignored");
        }
        Ok(())
    }

    fn unregister_locked(&self, state: &mut TrackerState<E>, key: &SubscriberKey) -> bool {
        let Some(registration) = state.registry.unregister(key) else {
            return false;
        };

        let on_disappear = registration.subscriber().on_disappear.clone();
        let open: Vec<E> = state
            .table
            .snapshot()
            .into_iter()
            .filter(|entity| registration.is_open(&entity.key()))
            .collect();

        debug!(
            tracker = %self.config.name,
            subscriber = %key,
            open = open.len(),
            "Subscriber unregistered"
        );

        for entity in open {
            let entity_key = entity.key();
            self.deliver(key, &entity_key, Direction::Disappear, on_disappear.clone(), entity);
        }
        true
    }

    // ========================================================================
    // 원시 이벤트 처리
    // ========================================================================

    /// 원시 이벤트 하나 처리
    pub fn handle_event(&self, event: RawEvent<E>) {
        let mut state = self.state.lock();
        if state.closed {
            trace!(tracker = %self.config.name, event = event.kind(), "Event after close ignored");
            return;
        }

        match event {
            RawEvent::Appeared(entity) => self.apply_appeared(&mut state, entity),
            RawEvent::Updated(entity, kind) => self.apply_updated(&mut state, entity, kind),
            RawEvent::Disappeared(key) => self.apply_disappeared(&mut state, key),
        }
    }

    fn apply_appeared(&self, state: &mut TrackerState<E>, entity: E) {
        let entity_key = entity.key();
        if state.table.contains(&entity_key) {
            trace!(tracker = %self.config.name, entity = ?entity_key, "Duplicate appearance ignored");
            return;
        }

        state.table.upsert(entity.clone());
        debug!(tracker = %self.config.name, entity = ?entity_key, "Entity appeared");

        for key in state.registry.keys() {
            let Some(registration) = state.registry.get_mut(&key) else {
                continue;
            };
            if registration.is_open(&entity_key) || !registration.matches(&entity) {
                continue;
            }
            registration.open(entity_key.clone());
            let on_appear = registration.subscriber().on_appear.clone();
            self.deliver(&key, &entity_key, Direction::Appear, on_appear, entity.clone());
        }
    }

    fn apply_updated(&self, state: &mut TrackerState<E>, entity: E, kind: UpdateKind) {
        let entity_key = entity.key();
        if !state.table.contains(&entity_key) {
            debug!(
                tracker = %self.config.name,
                entity = ?entity_key,
                kind = kind.as_str(),
                "Update for unknown entity, treating as appearance"
            );
            self.apply_appeared(state, entity);
            return;
        }

        state.table.upsert(entity.clone());
        debug!(tracker = %self.config.name, entity = ?entity_key, kind = kind.as_str(), "Entity updated");

        for key in state.registry.keys() {
            let Some(registration) = state.registry.get_mut(&key) else {
                continue;
            };
            let matches = registration.matches(&entity);

            match (registration.is_open(&entity_key), matches) {
                (true, true) => match registration.subscriber().on_update.clone() {
                    Some(on_update) => {
                        let updated = Updated {
                            entity: entity.clone(),
                            kind,
                        };
                        self.deliver(&key, &entity_key, Direction::Update, on_update, updated);
                    }
                    None => {
                        let on_appear = registration.subscriber().on_appear.clone();
                        self.deliver(&key, &entity_key, Direction::Update, on_appear, entity.clone());
                    }
                },
                (false, true) => {
                    registration.open(entity_key.clone());
                    let on_appear = registration.subscriber().on_appear.clone();
                    self.deliver(&key, &entity_key, Direction::Appear, on_appear, entity.clone());
                }
                (true, false) => {
                    registration.close(&entity_key);
                    let on_disappear = registration.subscriber().on_disappear.clone();
                    self.deliver(&key, &entity_key, Direction::Disappear, on_disappear, entity.clone());
                }
                (false, false) => {}
            }
        }
    }

    fn apply_disappeared(&self, state: &mut TrackerState<E>, entity_key: E::Key) {
        let Some(entity) = state.table.remove(&entity_key) else {
            trace!(tracker = %self.config.name, entity = ?entity_key, "Disappearance of unknown entity ignored");
            return;
        };
        debug!(tracker = %self.config.name, entity = ?entity_key, "Entity disappeared");

        for key in state.registry.keys() {
            let Some(registration) = state.registry.get_mut(&key) else {
                continue;
            };
            if !registration.close(&entity_key) {
                continue;
            }
            let on_disappear = registration.subscriber().on_disappear.clone();
            self.deliver(&key, &entity_key, Direction::Disappear, on_disappear, entity.clone());
        }
    }

    // ========================================================================
    // 콜백 전달
    // ========================================================================

    /// 콜백 하나 전달
    ///
    /// 같은 쌍에 반대 방향의 비동기 태스크가 실행 중이면 먼저 취소 신호를
    /// 보냅니다. 같은 방향의 update는 실행 중인 태스크를 그대로 둡니다
    /// (새 태스크를 제출하는 경우에는 `submit`이 교체합니다).
    fn deliver<T>(
        &self,
        subscriber: &SubscriberKey,
        entity_key: &E::Key,
        direction: Direction,
        callback: Callback<T>,
        value: T,
    ) where
        T: Send + 'static,
    {
        if self
            .supervisor
            .pending(subscriber, entity_key)
            .is_some_and(|task| task.direction.opposes(direction))
        {
            self.supervisor.cancel(subscriber, entity_key);
        }

        match callback {
            Callback::Noop => {}
            Callback::Sync(f) => {
                trace!(%subscriber, entity = ?entity_key, %direction, "Invoking callback");
                let outcome = if self.config.isolate_panics {
                    panic::catch_unwind(AssertUnwindSafe(|| f(&value)))
                } else {
                    Ok(f(&value))
                };

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        let err = Error::callback(subscriber, entity_key, format!("{:#}", e));
                        warn!(tracker = %self.config.name, %direction, error = %err, "Callback failed");
                    }
                    Err(payload) => {
                        let err = Error::callback(subscriber, entity_key, panic_message(payload.as_ref()));
                        error!(tracker = %self.config.name, %direction, error = %err, "Callback panicked");
                    }
                }
            }
            Callback::Task(f) => {
                trace!(%subscriber, entity = ?entity_key, %direction, "Submitting task callback");
                let work = move |token| f(value, token);
                if let Err(e) = self
                    .supervisor
                    .submit(subscriber, entity_key.clone(), direction, work)
                {
                    let err = Error::callback(subscriber, entity_key, e.to_string());
                    error!(tracker = %self.config.name, %direction, error = %err, "Task callback not started");
                }
            }
        }
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 현재 엔티티 스냅샷 (삽입 순서)
    pub fn snapshot(&self) -> Vec<E> {
        self.state.lock().table.snapshot()
    }

    pub fn get(&self, key: &E::Key) -> Option<E> {
        self.state.lock().table.get(key).cloned()
    }

    pub fn contains(&self, key: &E::Key) -> bool {
        self.state.lock().table.contains(key)
    }

    pub fn is_registered(&self, key: &SubscriberKey) -> bool {
        self.state.lock().registry.contains(key)
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    /// 구독자에게 appear가 열려 있는 엔티티 키
    pub fn open_entities(&self, key: &SubscriberKey) -> Vec<E::Key> {
        self.state
            .lock()
            .registry
            .get(key)
            .map(|r| r.open_keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn pending_task(&self, subscriber: &SubscriberKey, entity: &E::Key) -> Option<PendingTask> {
        self.supervisor.pending(subscriber, entity)
    }

    pub fn pending_tasks(&self) -> usize {
        self.supervisor.pending_count()
    }

    /// 실행 중인 비동기 콜백이 모두 끝날 때까지 대기
    pub async fn drain(&self) {
        self.supervisor.drain().await;
    }
}

impl<E: TrackedEntity> RawEventListener<E> for LifecycleTracker<E> {
    fn on_raw_event(&self, event: RawEvent<E>) {
        self.handle_event(event);
    }
}

// ============================================================================
// SourceListener
// ============================================================================

/// 소스에 등록되는 리스너 - 트래커를 약하게 참조하여 순환 참조 방지
struct SourceListener<E: TrackedEntity> {
    tracker: Weak<LifecycleTracker<E>>,
}

impl<E: TrackedEntity> RawEventListener<E> for SourceListener<E> {
    fn on_raw_event(&self, event: RawEvent<E>) {
        match self.tracker.upgrade() {
            Some(tracker) => tracker.handle_event(event),
            None => trace!(event = event.kind(), "Tracker dropped, raw event discarded"),
        }
    }
}
