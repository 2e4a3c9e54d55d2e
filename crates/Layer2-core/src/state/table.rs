//! StateTable - `entity key -> last known entity`
//!
//! 삽입 순서를 유지합니다. 이미 있는 키를 다시 upsert하면 페이로드만 바뀌고
//! 스냅샷 내 위치는 그대로입니다.

use lifecycle_foundation::TrackedEntity;
use std::collections::{BTreeMap, HashMap};

struct Slot<E> {
    seq: u64,
    entity: E,
}

/// 현재 존재하는 엔티티 테이블
///
/// 테이블에 없는 키는 `present = false`와 같습니다.
pub struct StateTable<E: TrackedEntity> {
    records: HashMap<E::Key, Slot<E>>,
    order: BTreeMap<u64, E::Key>,
    next_seq: u64,
}

impl<E: TrackedEntity> StateTable<E> {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// 삽입 또는 갱신, 이전 상태 반환
    pub fn upsert(&mut self, entity: E) -> Option<E> {
        let key = entity.key();
        if let Some(slot) = self.records.get_mut(&key) {
            return Some(std::mem::replace(&mut slot.entity, entity));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.records.insert(key, Slot { seq, entity });
        None
    }

    /// 제거, 제거된 상태 반환
    pub fn remove(&mut self, key: &E::Key) -> Option<E> {
        let slot = self.records.remove(key)?;
        self.order.remove(&slot.seq);
        Some(slot.entity)
    }

    pub fn get(&self, key: &E::Key) -> Option<&E> {
        self.records.get(key).map(|slot| &slot.entity)
    }

    pub fn contains(&self, key: &E::Key) -> bool {
        self.records.contains_key(key)
    }

    /// 삽입 순서대로 현재 엔티티 목록
    pub fn snapshot(&self) -> Vec<E> {
        self.order
            .values()
            .filter_map(|key| self.records.get(key))
            .map(|slot| slot.entity.clone())
            .collect()
    }

    /// 삽입 순서대로 키 목록
    pub fn keys(&self) -> Vec<E::Key> {
        self.order.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 전체 제거, 제거된 엔티티를 삽입 순서대로 반환
    pub fn clear(&mut self) -> Vec<E> {
        let removed = self.snapshot();
        self.records.clear();
        self.order.clear();
        removed
    }
}

impl<E: TrackedEntity> Default for StateTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Record {
        id: &'static str,
        version: u32,
    }

    impl TrackedEntity for Record {
        type Key = &'static str;
        fn key(&self) -> &'static str {
            self.id
        }
    }

    fn rec(id: &'static str, version: u32) -> Record {
        Record { id, version }
    }

    #[test]
    fn test_upsert_returns_previous() {
        let mut table = StateTable::new();
        assert_eq!(table.upsert(rec("a", 1)), None);
        assert_eq!(table.upsert(rec("a", 2)), Some(rec("a", 1)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&"a"), Some(&rec("a", 2)));
    }

    #[test]
    fn test_snapshot_keeps_insertion_order() {
        let mut table = StateTable::new();
        table.upsert(rec("b", 1));
        table.upsert(rec("a", 1));
        table.upsert(rec("c", 1));
        table.upsert(rec("b", 2));

        let ids: Vec<_> = table.snapshot().into_iter().map(|r| (r.id, r.version)).collect();
        assert_eq!(ids, vec![("b", 2), ("a", 1), ("c", 1)]);
    }

    #[test]
    fn test_remove_and_reinsert_moves_to_end() {
        let mut table = StateTable::new();
        table.upsert(rec("a", 1));
        table.upsert(rec("b", 1));

        assert_eq!(table.remove(&"a"), Some(rec("a", 1)));
        assert_eq!(table.remove(&"a"), None);
        assert!(!table.contains(&"a"));

        table.upsert(rec("a", 3));
        assert_eq!(table.keys(), vec!["b", "a"]);
    }

    #[test]
    fn test_clear() {
        let mut table = StateTable::new();
        table.upsert(rec("a", 1));
        table.upsert(rec("b", 1));

        let removed = table.clear();
        assert_eq!(removed.len(), 2);
        assert!(table.is_empty());
        assert!(table.snapshot().is_empty());
    }
}
