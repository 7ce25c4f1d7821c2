//! # Sentinel Risk
//!
//! 리스크 계획과 거래 안전장치를 제공합니다.
//!
//! - **RiskCalculator**: ATR 기반 손절/목표가/포지션 사이징
//! - **CircuitBreaker**: 프로세스 전역 거래 허용 상태 머신
//! - **AdaptiveThreshold**: 승률 기반 신뢰도 임계값 조정
//! - **DrawdownGuard**: 자본 드로다운 기반 운용 모드
//! - **hold_estimator**: 목표가 도달 시간 추정

pub mod adaptive_threshold;
pub mod calculator;
pub mod circuit_breaker;
pub mod config;
pub mod drawdown_guard;
pub mod hold_estimator;

pub use adaptive_threshold::{AdaptiveThreshold, ThresholdState};
pub use calculator::{RiskCalculator, RiskPlan};
pub use hold_estimator::{estimate_target_etas, TargetEta};
pub use circuit_breaker::{CircuitBreaker, CircuitDecision, CircuitState};
pub use config::{
    AdaptiveThresholdConfig, CircuitBreakerConfig, DrawdownConfig, RiskConfig,
};
pub use drawdown_guard::{DrawdownGuard, DrawdownMode, DrawdownState};
