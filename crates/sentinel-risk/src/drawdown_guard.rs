//! 자본 드로다운 기반 운용 모드.
//!
//! 시작 자본 대비 드로다운에 따라 포지션 배수와 허용 티어를
//! 제한합니다. 자본 원장 조회 실패는 하드 에러로 전파되며,
//! 오케스트레이터는 이를 HALT와 동일하게 취급합니다 (fail-closed).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sentinel_core::{CapitalLedger, SentinelResult, SignalTier};

use crate::config::DrawdownConfig;

/// 드로다운 운용 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DrawdownMode {
    /// 정상 운용
    Normal,
    /// 축소 운용 (포지션 50%)
    Caution,
    /// 방어 운용 (포지션 25%)
    Defensive,
    /// 거래 중지
    Halt,
}

/// 드로다운 판정 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownState {
    /// 운용 모드
    pub mode: DrawdownMode,
    /// 드로다운 (%)
    pub drawdown_pct: f64,
    /// 포지션 크기 배수
    pub position_multiplier: f64,
    /// 허용되는 최저 강도 티어 (HALT면 None)
    pub min_admissible_tier: Option<SignalTier>,
    /// 추가 요구 신뢰도
    pub extra_confidence_required: i32,
}

impl DrawdownState {
    /// 거래가 허용되는 모드인지 확인합니다.
    pub fn allows_trading(&self) -> bool {
        self.mode != DrawdownMode::Halt
    }

    /// 주어진 티어의 거래가 허용되는지 확인합니다.
    pub fn is_tier_allowed(&self, tier: SignalTier) -> bool {
        match self.mode {
            DrawdownMode::Halt => false,
            _ => match self.min_admissible_tier {
                Some(min) => tier.is_at_least(min),
                None => true,
            },
        }
    }
}

/// 드로다운 가드.
#[derive(Debug, Clone, Default)]
pub struct DrawdownGuard {
    config: DrawdownConfig,
}

impl DrawdownGuard {
    /// 주어진 설정으로 가드를 생성합니다.
    pub fn new(config: DrawdownConfig) -> Self {
        Self { config }
    }

    /// 설정을 반환합니다.
    pub fn config(&self) -> &DrawdownConfig {
        &self.config
    }

    /// 현재/시작 자본에서 운용 모드를 판정합니다.
    pub fn mode(&self, current_capital: Decimal, starting_capital: Decimal) -> DrawdownState {
        let drawdown_pct = if starting_capital > Decimal::ZERO {
            let ratio = ((starting_capital - current_capital) / starting_capital)
                .to_f64()
                .unwrap_or(0.0);
            (ratio * 100.0).max(0.0)
        } else {
            0.0
        };

        let state = if drawdown_pct >= self.config.halt_pct {
            DrawdownState {
                mode: DrawdownMode::Halt,
                drawdown_pct,
                position_multiplier: 0.0,
                min_admissible_tier: None,
                extra_confidence_required: 0,
            }
        } else if drawdown_pct >= self.config.defensive_pct {
            DrawdownState {
                mode: DrawdownMode::Defensive,
                drawdown_pct,
                position_multiplier: 0.25,
                min_admissible_tier: Some(SignalTier::Extreme),
                extra_confidence_required: 15,
            }
        } else if drawdown_pct >= self.config.caution_pct {
            DrawdownState {
                mode: DrawdownMode::Caution,
                drawdown_pct,
                position_multiplier: 0.5,
                min_admissible_tier: Some(SignalTier::Strong),
                extra_confidence_required: 5,
            }
        } else {
            DrawdownState {
                mode: DrawdownMode::Normal,
                drawdown_pct,
                position_multiplier: 1.0,
                min_admissible_tier: None,
                extra_confidence_required: 0,
            }
        };

        if state.mode != DrawdownMode::Normal {
            warn!(
                mode = ?state.mode,
                drawdown_pct = state.drawdown_pct,
                "Drawdown guard restricting trading"
            );
        } else {
            debug!(drawdown_pct = state.drawdown_pct, "Drawdown guard normal");
        }

        state
    }

    /// 자본 원장에서 운용 모드를 판정합니다.
    ///
    /// 원장 조회 실패는 하드 에러로 전파됩니다.
    pub fn from_ledger(&self, ledger: &dyn CapitalLedger) -> SentinelResult<DrawdownState> {
        let current = ledger.current()?;
        let starting = ledger.starting()?;
        Ok(self.mode(current, starting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normal_below_boundary() {
        let guard = DrawdownGuard::default();
        // 9.99% 드로다운
        let state = guard.mode(dec!(9001), dec!(10000));
        assert_eq!(state.mode, DrawdownMode::Normal);
        assert_eq!(state.position_multiplier, 1.0);
        assert!(state.is_tier_allowed(SignalTier::Weak));
    }

    #[test]
    fn test_caution_at_exact_boundary() {
        let guard = DrawdownGuard::default();
        // 정확히 10.0% 드로다운
        let state = guard.mode(dec!(9000), dec!(10000));
        assert_eq!(state.mode, DrawdownMode::Caution);
        assert_eq!(state.position_multiplier, 0.5);
        assert_eq!(state.extra_confidence_required, 5);
        assert!(state.is_tier_allowed(SignalTier::Extreme));
        assert!(state.is_tier_allowed(SignalTier::Strong));
        assert!(!state.is_tier_allowed(SignalTier::Moderate));
    }

    #[test]
    fn test_defensive_tier_gate() {
        let guard = DrawdownGuard::default();
        // 25% 드로다운
        let state = guard.mode(dec!(7500), dec!(10000));
        assert_eq!(state.mode, DrawdownMode::Defensive);
        assert_eq!(state.position_multiplier, 0.25);
        assert_eq!(state.extra_confidence_required, 15);
        assert!(state.is_tier_allowed(SignalTier::Extreme));
        assert!(!state.is_tier_allowed(SignalTier::Strong));
    }

    #[test]
    fn test_halt_blocks_every_tier() {
        let guard = DrawdownGuard::default();
        // 30% 드로다운
        let state = guard.mode(dec!(7000), dec!(10000));
        assert_eq!(state.mode, DrawdownMode::Halt);
        assert!(!state.allows_trading());
        assert!(!state.is_tier_allowed(SignalTier::Extreme));
        assert!(!state.is_tier_allowed(SignalTier::Strong));
        assert!(!state.is_tier_allowed(SignalTier::Weak));
    }

    #[test]
    fn test_profit_is_zero_drawdown() {
        let guard = DrawdownGuard::default();
        let state = guard.mode(dec!(12000), dec!(10000));
        assert_eq!(state.mode, DrawdownMode::Normal);
        assert_eq!(state.drawdown_pct, 0.0);
    }

    #[test]
    fn test_from_ledger() {
        let guard = DrawdownGuard::default();
        let ledger = sentinel_core::InMemoryLedger::new(dec!(10000));
        ledger.set_current_capital(dec!(8500)).unwrap();

        let state = guard.from_ledger(&ledger).unwrap();
        assert_eq!(state.mode, DrawdownMode::Caution);
    }
}
