mod store;

pub use store::{JsonStore, Scope};
