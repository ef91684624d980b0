//! 도메인 모델.
//!
//! 게이트웨이에서 관측되는 모든 데이터의 정규화된 표현입니다.
//! 모든 타입은 명시적 필드 목록을 가지며 리플렉션을 사용하지 않습니다.

pub mod deal;
pub mod group;
pub mod position;
pub mod symbol;
pub mod user;

pub use deal::{Coded, Deal, DealAction, DealEntry, DealReason, EnumCode, ModifyFlag};
pub use group::{CommissionTier, GroupCommission, GroupSnapshot, GroupSymbolSettings};
pub use position::Position;
pub use symbol::SymbolInfo;
pub use user::UserRecord;
