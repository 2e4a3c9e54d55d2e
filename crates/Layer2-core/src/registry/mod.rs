//! # Observer Registry
//!
//! 구독자 키 → 등록 정보 (콜백, 필터, 열린 엔티티 집합)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ObserverRegistry<E>                         │
//! │  ┌──────────┬──────────┬──────────┐                          │
//! │  │ "k1"     │ "k2"     │ ...      │   (등록 순서 유지)        │
//! │  │ filter   │ filter   │          │                          │
//! │  │ open{A}  │ open{A,B}│          │                          │
//! │  └──────────┴──────────┴──────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod observer;

pub use observer::{ObserverRegistry, Registration};
