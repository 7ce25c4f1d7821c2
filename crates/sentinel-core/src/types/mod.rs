//! 시그널 분류 타입.
//!
//! 방향, 티어, 등급 등 엔진 전반에서 공유되는 분류 타입을 정의합니다.

pub mod direction;
pub mod signal;
pub mod tier;

pub use direction::*;
pub use signal::*;
pub use tier::*;
