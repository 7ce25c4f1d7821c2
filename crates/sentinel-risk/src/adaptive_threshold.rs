//! 승률 기반 신뢰도 임계값 조정.
//!
//! 최근 성과가 좋으면 임계값을 완화하고 나쁘면 강화합니다.
//! 원장 조회 실패 시 기본 임계값으로 동작합니다 (fail-open).
//! 안전 관련 컴포넌트가 아니라 최적화 컴포넌트이기 때문입니다.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sentinel_core::{OutcomeLedger, TradeOutcome};

use crate::config::AdaptiveThresholdConfig;

/// 임계값 계산 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdState {
    /// 기본 임계값
    pub base_threshold: i32,
    /// 조정된 유효 임계값
    pub adjusted_threshold: i32,
    /// 최근 구간 승률 (%, 표본 부족 시 None)
    pub last_window_win_rate: Option<f64>,
    /// 표본 수
    pub sample_count: usize,
}

/// 적응형 신뢰도 임계값.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveThreshold {
    config: AdaptiveThresholdConfig,
}

impl AdaptiveThreshold {
    /// 주어진 설정으로 생성합니다.
    pub fn new(config: AdaptiveThresholdConfig) -> Self {
        Self { config }
    }

    /// 설정을 반환합니다.
    pub fn config(&self) -> &AdaptiveThresholdConfig {
        &self.config
    }

    /// 최근 결과 집합에서 유효 임계값을 계산합니다.
    pub fn effective(&self, base_threshold: i32, outcomes: &[TradeOutcome]) -> ThresholdState {
        let sample_count = outcomes.len();

        if sample_count < self.config.min_samples {
            return ThresholdState {
                base_threshold,
                adjusted_threshold: base_threshold,
                last_window_win_rate: None,
                sample_count,
            };
        }

        let wins = outcomes.iter().filter(|o| o.win).count();
        let win_rate = wins as f64 / sample_count as f64 * 100.0;

        let delta = if win_rate > self.config.high_win_rate {
            self.config.relax_delta
        } else if win_rate < self.config.low_win_rate {
            self.config.tighten_delta
        } else {
            0
        };

        let adjusted =
            (base_threshold + delta).clamp(self.config.floor, self.config.ceiling);

        debug!(
            win_rate,
            base = base_threshold,
            adjusted,
            "Adaptive threshold computed"
        );

        ThresholdState {
            base_threshold,
            adjusted_threshold: adjusted,
            last_window_win_rate: Some(win_rate),
            sample_count,
        }
    }

    /// 원장에서 최근 결과를 읽어 유효 임계값을 계산합니다.
    ///
    /// 원장 조회 실패 시 기본 임계값을 사용합니다.
    pub fn from_ledger(&self, base_threshold: i32, ledger: &dyn OutcomeLedger) -> ThresholdState {
        match ledger.recent_outcomes(self.config.window) {
            Ok(outcomes) => self.effective(base_threshold, &outcomes),
            Err(err) => {
                warn!(error = %err, "Outcome ledger unavailable, using base threshold");
                ThresholdState {
                    base_threshold,
                    adjusted_threshold: base_threshold,
                    last_window_win_rate: None,
                    sample_count: 0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn outcomes(wins: usize, losses: usize) -> Vec<TradeOutcome> {
        let mut list = Vec::new();
        for _ in 0..wins {
            list.push(TradeOutcome {
                win: true,
                pnl_pct: 2.0,
                closed_at: Utc::now(),
            });
        }
        for _ in 0..losses {
            list.push(TradeOutcome {
                win: false,
                pnl_pct: -1.0,
                closed_at: Utc::now(),
            });
        }
        list
    }

    #[test]
    fn test_insufficient_samples_returns_base() {
        let threshold = AdaptiveThreshold::default();
        // 4건은 최소 표본(5) 미만, 승률 무관
        let state = threshold.effective(70, &outcomes(4, 0));

        assert_eq!(state.adjusted_threshold, 70);
        assert!(state.last_window_win_rate.is_none());
    }

    #[test]
    fn test_high_win_rate_relaxes() {
        let threshold = AdaptiveThreshold::default();
        // 승률 80% > 65%
        let state = threshold.effective(70, &outcomes(8, 2));

        assert_eq!(state.adjusted_threshold, 65);
        assert_eq!(state.last_window_win_rate, Some(80.0));
    }

    #[test]
    fn test_low_win_rate_tightens() {
        let threshold = AdaptiveThreshold::default();
        // 승률 30% < 40%
        let state = threshold.effective(70, &outcomes(3, 7));

        assert_eq!(state.adjusted_threshold, 80);
    }

    #[test]
    fn test_middle_win_rate_unchanged() {
        let threshold = AdaptiveThreshold::default();
        // 승률 50%
        let state = threshold.effective(70, &outcomes(5, 5));

        assert_eq!(state.adjusted_threshold, 70);
    }

    #[test]
    fn test_clamped_to_bounds() {
        let threshold = AdaptiveThreshold::default();

        // 상한 클램프: 75 + 10 = 85 -> 80
        let state = threshold.effective(75, &outcomes(2, 8));
        assert_eq!(state.adjusted_threshold, 80);

        // 하한 클램프: 42 - 5 = 37 -> 40
        let state = threshold.effective(42, &outcomes(9, 1));
        assert_eq!(state.adjusted_threshold, 40);
    }
}
