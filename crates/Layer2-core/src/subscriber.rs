//! Subscriber - 선언적 구독자 정의
//!
//! `{on_appear, on_update?, on_disappear}` + 필터를 묶은 값입니다.

use crate::callback::{Callback, Filter, Updated};
use lifecycle_foundation::TrackedEntity;

/// 등록할 구독자
#[derive(Debug, Clone)]
pub struct Subscriber<E: TrackedEntity> {
    pub(crate) on_appear: Callback<E>,
    pub(crate) on_update: Option<Callback<Updated<E>>>,
    pub(crate) on_disappear: Callback<E>,
    pub(crate) filter: Filter<E>,
}

impl<E: TrackedEntity> Subscriber<E> {
    pub fn new(on_appear: Callback<E>, on_disappear: Callback<E>) -> Self {
        Self {
            on_appear,
            on_update: None,
            on_disappear,
            filter: Filter::all(),
        }
    }

    /// update 콜백 지정
    ///
    /// 지정하지 않으면 update는 새 페이로드로 `on_appear`를 다시 호출합니다.
    pub fn with_update(mut self, on_update: Callback<Updated<E>>) -> Self {
        self.on_update = Some(on_update);
        self
    }

    pub fn with_filter(mut self, filter: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Filter::new(filter);
        self
    }

    pub fn filter(mut self, filter: Filter<E>) -> Self {
        self.filter = filter;
        self
    }

    pub fn matches(&self, entity: &E) -> bool {
        self.filter.matches(entity)
    }

    pub fn has_update(&self) -> bool {
        self.on_update.is_some()
    }
}
