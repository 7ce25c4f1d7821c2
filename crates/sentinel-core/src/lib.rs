//! # Sentinel Core
//!
//! 시그널 결정 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - 방향/티어/등급 등 시그널 분류 타입
//! - 지표 스냅샷 및 시장 컨텍스트 구조체
//! - 거래 기록 및 자본 원장 포트
//! - 에러 타입
//! - 로깅 인프라

pub mod error;
pub mod ledger;
pub mod logging;
pub mod market;
pub mod types;

pub use error::*;
pub use ledger::*;
pub use logging::*;
pub use market::*;
pub use types::*;
