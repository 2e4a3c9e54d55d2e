//! Observer Registry - `subscriber key -> Registration`
//!
//! 등록 순서를 유지하며, 디스패치도 이 순서를 따릅니다.

use crate::subscriber::Subscriber;
use chrono::{DateTime, Utc};
use lifecycle_foundation::{Error, Result, SubscriberKey, TrackedEntity};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Registration - 등록된 구독자
// ============================================================================

/// 등록된 구독자와 그 구독자에게 appear가 열린 엔티티 집합
pub struct Registration<E: TrackedEntity> {
    key: SubscriberKey,
    subscriber: Subscriber<E>,
    /// appear가 전달되고 아직 disappear가 전달되지 않은 엔티티
    open: HashSet<E::Key>,
    registered_at: DateTime<Utc>,
}

impl<E: TrackedEntity> Registration<E> {
    pub fn new(key: SubscriberKey, subscriber: Subscriber<E>) -> Self {
        Self {
            key,
            subscriber,
            open: HashSet::new(),
            registered_at: Utc::now(),
        }
    }

    pub fn key(&self) -> &SubscriberKey {
        &self.key
    }

    pub fn subscriber(&self) -> &Subscriber<E> {
        &self.subscriber
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// 필터 평가 (디스패치 시점)
    pub fn matches(&self, entity: &E) -> bool {
        self.subscriber.matches(entity)
    }

    pub fn is_open(&self, key: &E::Key) -> bool {
        self.open.contains(key)
    }

    /// appear 전달 표시, 이미 열려 있었으면 false
    pub fn open(&mut self, key: E::Key) -> bool {
        self.open.insert(key)
    }

    /// disappear 전달 표시, 열려 있지 않았으면 false
    pub fn close(&mut self, key: &E::Key) -> bool {
        self.open.remove(key)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn open_keys(&self) -> impl Iterator<Item = &E::Key> {
        self.open.iter()
    }
}

// ============================================================================
// ObserverRegistry
// ============================================================================

/// 구독자 레지스트리
///
/// 외부에서 직접 변경하지 않습니다. LifecycleTracker가 자신의 락 안에서만
/// 사용합니다.
pub struct ObserverRegistry<E: TrackedEntity> {
    entries: HashMap<SubscriberKey, Registration<E>>,
    order: Vec<SubscriberKey>,
}

impl<E: TrackedEntity> ObserverRegistry<E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// 등록 - 이미 있는 키면 `DuplicateRegistration`, 레지스트리 변경 없음
    pub fn register(&mut self, registration: Registration<E>) -> Result<()> {
        let key = registration.key().clone();
        if self.entries.contains_key(&key) {
            return Err(Error::duplicate(&key));
        }
        self.order.push(key.clone());
        self.entries.insert(key, registration);
        Ok(())
    }

    /// 등록 해제 - 없는 키는 None
    pub fn unregister(&mut self, key: &SubscriberKey) -> Option<Registration<E>> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub fn contains(&self, key: &SubscriberKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &SubscriberKey) -> Option<&Registration<E>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &SubscriberKey) -> Option<&mut Registration<E>> {
        self.entries.get_mut(key)
    }

    /// 등록 순서대로 키 목록
    pub fn keys(&self) -> Vec<SubscriberKey> {
        self.order.clone()
    }

    /// 필터가 엔티티를 허용하는 구독자 키 (등록 순서)
    pub fn matching(&self, entity: &E) -> Vec<SubscriberKey> {
        self.order
            .iter()
            .filter(|key| self.entries.get(*key).is_some_and(|r| r.matches(entity)))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: TrackedEntity> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Callback;

    #[derive(Debug, Clone)]
    struct Named(&'static str);

    impl TrackedEntity for Named {
        type Key = &'static str;
        fn key(&self) -> &'static str {
            self.0
        }
    }

    fn subscriber() -> Subscriber<Named> {
        Subscriber::new(Callback::noop(), Callback::noop())
    }

    #[test]
    fn test_duplicate_register_has_no_side_effects() {
        let mut registry = ObserverRegistry::new();
        let mut first = Registration::new("k1".into(), subscriber());
        first.open("x");
        registry.register(first).unwrap();

        let err = registry
            .register(Registration::new("k1".into(), subscriber()))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRegistration { .. }));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&"k1".into()).unwrap().is_open(&"x"));
    }

    #[test]
    fn test_unregister_unknown_is_none() {
        let mut registry: ObserverRegistry<Named> = ObserverRegistry::new();
        assert!(registry.unregister(&"missing".into()).is_none());
    }

    #[test]
    fn test_matching_evaluates_filters_in_order() {
        let mut registry = ObserverRegistry::new();
        registry
            .register(Registration::new(
                "only-x".into(),
                subscriber().with_filter(|e: &Named| e.0 == "x"),
            ))
            .unwrap();
        registry
            .register(Registration::new("all".into(), subscriber()))
            .unwrap();

        assert_eq!(
            registry.matching(&Named("x")),
            vec![SubscriberKey::from("only-x"), SubscriberKey::from("all")]
        );
        assert_eq!(registry.matching(&Named("y")), vec![SubscriberKey::from("all")]);

        registry.unregister(&"only-x".into());
        assert_eq!(registry.keys(), vec![SubscriberKey::from("all")]);
    }

    #[test]
    fn test_open_close_pairs() {
        let mut reg = Registration::new("k".into(), subscriber());
        assert!(reg.open("a"));
        assert!(!reg.open("a"));
        assert!(reg.close(&"a"));
        assert!(!reg.close(&"a"));
        assert_eq!(reg.open_count(), 0);
    }
}
