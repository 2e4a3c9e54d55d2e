//! Event Types - EntitySource가 발행하는 원시 전이 이벤트

use crate::core::{TrackedEntity, UpdateKind};
use std::fmt;

/// EntitySource의 원시 전이 이벤트
///
/// 소멸 이벤트는 키만 가집니다. 마지막으로 알려진 상태는 StateTable이
/// 보관합니다.
pub enum RawEvent<E: TrackedEntity> {
    /// 엔티티 등장
    Appeared(E),

    /// 엔티티 변경 (버전 관리 소스 전용)
    Updated(E, UpdateKind),

    /// 엔티티 소멸
    Disappeared(E::Key),
}

impl<E: TrackedEntity> RawEvent<E> {
    /// 대상 엔티티 키
    pub fn key(&self) -> E::Key {
        match self {
            Self::Appeared(e) | Self::Updated(e, _) => e.key(),
            Self::Disappeared(k) => k.clone(),
        }
    }

    /// 이벤트 이름 (로깅용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Appeared(_) => "appeared",
            Self::Updated(_, UpdateKind::Modified) => "updated",
            Self::Updated(_, UpdateKind::Relocated) => "relocated",
            Self::Disappeared(_) => "disappeared",
        }
    }
}

impl<E: TrackedEntity> Clone for RawEvent<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Appeared(e) => Self::Appeared(e.clone()),
            Self::Updated(e, kind) => Self::Updated(e.clone(), *kind),
            Self::Disappeared(k) => Self::Disappeared(k.clone()),
        }
    }
}

impl<E: TrackedEntity> fmt::Debug for RawEvent<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Appeared(e) => f.debug_tuple("Appeared").field(e).finish(),
            Self::Updated(e, kind) => f.debug_tuple("Updated").field(e).field(kind).finish(),
            Self::Disappeared(k) => f.debug_tuple("Disappeared").field(k).finish(),
        }
    }
}
