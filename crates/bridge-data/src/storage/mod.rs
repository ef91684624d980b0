//! 스토리지 구현.

pub mod postgres;

pub use postgres::*;
