//! State - 엔티티 상태 테이블

mod table;

pub use table::StateTable;
