//! 리스크 컴포넌트 설정.
//!
//! 손절/목표가 산출, 서킷브레이커, 적응형 임계값, 드로다운 가드의
//! 설정 구조체를 정의합니다.

use serde::{Deserialize, Serialize};

use sentinel_core::{SentinelError, SentinelResult};

/// 리스크 계산기 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// 손절 거리 ATR 배수 (기본값: 1.5)
    #[serde(default = "default_stop_atr_mult")]
    pub stop_atr_mult: f64,

    /// 손절 거리 상한 ATR 배수 (기본값: 3.0)
    #[serde(default = "default_max_stop_atr_mult")]
    pub max_stop_atr_mult: f64,

    /// 진입가 대비 최대 역방향 손절 거리 (기본값: 5%)
    #[serde(default = "default_max_adverse_pct")]
    pub max_adverse_pct: f64,

    /// 거래당 리스크 비율 (기본값: 1%)
    #[serde(default = "default_risk_pct")]
    pub risk_pct: f64,

    /// 포지션 수량 상한 (기본값: 100,000)
    #[serde(default = "default_max_position_units")]
    pub max_position_units: f64,

    /// 목표가별 부분 청산 비율 (기본값: 33/33/34%)
    #[serde(default = "default_partial_close_ratios")]
    pub partial_close_ratios: [f64; 3],

    /// 트레일링 스탑 ATR 배수 (기본값: 2.0)
    #[serde(default = "default_trailing_atr_mult")]
    pub trailing_atr_mult: f64,
}

fn default_stop_atr_mult() -> f64 {
    1.5
}

fn default_max_stop_atr_mult() -> f64 {
    3.0
}

fn default_max_adverse_pct() -> f64 {
    5.0
}

fn default_risk_pct() -> f64 {
    1.0
}

fn default_max_position_units() -> f64 {
    100_000.0
}

fn default_partial_close_ratios() -> [f64; 3] {
    [0.33, 0.33, 0.34]
}

fn default_trailing_atr_mult() -> f64 {
    2.0
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_atr_mult: default_stop_atr_mult(),
            max_stop_atr_mult: default_max_stop_atr_mult(),
            max_adverse_pct: default_max_adverse_pct(),
            risk_pct: default_risk_pct(),
            max_position_units: default_max_position_units(),
            partial_close_ratios: default_partial_close_ratios(),
            trailing_atr_mult: default_trailing_atr_mult(),
        }
    }
}

impl RiskConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> SentinelResult<()> {
        if self.stop_atr_mult <= 0.0 || self.stop_atr_mult > self.max_stop_atr_mult {
            return Err(SentinelError::Config(
                "stop_atr_mult must be positive and not exceed max_stop_atr_mult".into(),
            ));
        }

        if self.max_adverse_pct <= 0.0 || self.max_adverse_pct > 50.0 {
            return Err(SentinelError::Config(
                "max_adverse_pct must be between 0 and 50".into(),
            ));
        }

        if self.risk_pct <= 0.0 || self.risk_pct > 10.0 {
            return Err(SentinelError::Config(
                "risk_pct must be between 0 and 10".into(),
            ));
        }

        let ratio_sum: f64 = self.partial_close_ratios.iter().sum();
        if (ratio_sum - 1.0).abs() > 0.01 {
            return Err(SentinelError::Config(
                "partial_close_ratios must sum to 1.0".into(),
            ));
        }

        Ok(())
    }
}

/// 서킷브레이커 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// 거래 중지를 유발하는 연속 손실 횟수 (기본값: 3)
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,

    /// 연속 손실 후 쿨다운 시간 (기본값: 4시간)
    #[serde(default = "default_loss_cooldown_hours")]
    pub loss_cooldown_hours: i64,

    /// 일일 최대 실현 손실 비율 (기본값: 5%)
    #[serde(default = "default_max_daily_loss_pct")]
    pub max_daily_loss_pct: f64,

    /// 최대 동시 포지션 수 (기본값: 10)
    #[serde(default = "default_max_open_positions")]
    pub max_open_positions: usize,

    /// 같은 방향 최대 동시 포지션 수 (기본값: 5)
    #[serde(default = "default_max_same_direction")]
    pub max_same_direction: usize,

    /// 단일 거래 최대 리스크 비율 (기본값: 2%)
    #[serde(default = "default_max_single_risk_pct")]
    pub max_single_risk_pct: f64,

    /// 전체 미청산 리스크 상한 비율 (기본값: 10%)
    #[serde(default = "default_max_total_risk_pct")]
    pub max_total_risk_pct: f64,

    /// 시장 급락 판정 임계값 (기본값: -5%)
    #[serde(default = "default_market_dump_threshold_pct")]
    pub market_dump_threshold_pct: f64,

    /// 연속 손실 판정에 조회할 최근 결과 수 (기본값: 10)
    #[serde(default = "default_outcome_window")]
    pub outcome_window: usize,
}

fn default_max_consecutive_losses() -> u32 {
    3
}

fn default_loss_cooldown_hours() -> i64 {
    4
}

fn default_max_daily_loss_pct() -> f64 {
    5.0
}

fn default_max_open_positions() -> usize {
    10
}

fn default_max_same_direction() -> usize {
    5
}

fn default_max_single_risk_pct() -> f64 {
    2.0
}

fn default_max_total_risk_pct() -> f64 {
    10.0
}

fn default_market_dump_threshold_pct() -> f64 {
    -5.0
}

fn default_outcome_window() -> usize {
    10
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_losses: default_max_consecutive_losses(),
            loss_cooldown_hours: default_loss_cooldown_hours(),
            max_daily_loss_pct: default_max_daily_loss_pct(),
            max_open_positions: default_max_open_positions(),
            max_same_direction: default_max_same_direction(),
            max_single_risk_pct: default_max_single_risk_pct(),
            max_total_risk_pct: default_max_total_risk_pct(),
            market_dump_threshold_pct: default_market_dump_threshold_pct(),
            outcome_window: default_outcome_window(),
        }
    }
}

impl CircuitBreakerConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> SentinelResult<()> {
        if self.max_consecutive_losses == 0 {
            return Err(SentinelError::Config(
                "max_consecutive_losses must be greater than 0".into(),
            ));
        }

        if self.loss_cooldown_hours <= 0 {
            return Err(SentinelError::Config(
                "loss_cooldown_hours must be greater than 0".into(),
            ));
        }

        if self.max_daily_loss_pct <= 0.0 {
            return Err(SentinelError::Config(
                "max_daily_loss_pct must be greater than 0".into(),
            ));
        }

        if self.market_dump_threshold_pct >= 0.0 {
            return Err(SentinelError::Config(
                "market_dump_threshold_pct must be negative".into(),
            ));
        }

        Ok(())
    }
}

/// 적응형 신뢰도 임계값 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveThresholdConfig {
    /// 조정에 필요한 최소 표본 수 (기본값: 5)
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// 임계값 완화 기준 승률 (기본값: 65%)
    #[serde(default = "default_high_win_rate")]
    pub high_win_rate: f64,

    /// 임계값 강화 기준 승률 (기본값: 40%)
    #[serde(default = "default_low_win_rate")]
    pub low_win_rate: f64,

    /// 완화 폭 (기본값: -5)
    #[serde(default = "default_relax_delta")]
    pub relax_delta: i32,

    /// 강화 폭 (기본값: +10)
    #[serde(default = "default_tighten_delta")]
    pub tighten_delta: i32,

    /// 임계값 하한 (기본값: 40)
    #[serde(default = "default_floor")]
    pub floor: i32,

    /// 임계값 상한 (기본값: 80)
    #[serde(default = "default_ceiling")]
    pub ceiling: i32,

    /// 승률 계산에 조회할 최근 결과 수 (기본값: 10)
    #[serde(default = "default_threshold_window")]
    pub window: usize,
}

fn default_min_samples() -> usize {
    5
}

fn default_high_win_rate() -> f64 {
    65.0
}

fn default_low_win_rate() -> f64 {
    40.0
}

fn default_relax_delta() -> i32 {
    -5
}

fn default_tighten_delta() -> i32 {
    10
}

fn default_floor() -> i32 {
    40
}

fn default_ceiling() -> i32 {
    80
}

fn default_threshold_window() -> usize {
    10
}

impl Default for AdaptiveThresholdConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            high_win_rate: default_high_win_rate(),
            low_win_rate: default_low_win_rate(),
            relax_delta: default_relax_delta(),
            tighten_delta: default_tighten_delta(),
            floor: default_floor(),
            ceiling: default_ceiling(),
            window: default_threshold_window(),
        }
    }
}

impl AdaptiveThresholdConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> SentinelResult<()> {
        if self.floor >= self.ceiling {
            return Err(SentinelError::Config(
                "floor must be less than ceiling".into(),
            ));
        }

        if self.low_win_rate >= self.high_win_rate {
            return Err(SentinelError::Config(
                "low_win_rate must be less than high_win_rate".into(),
            ));
        }

        Ok(())
    }
}

/// 드로다운 가드 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownConfig {
    /// CAUTION 진입 드로다운 (기본값: 10%)
    #[serde(default = "default_caution_pct")]
    pub caution_pct: f64,

    /// DEFENSIVE 진입 드로다운 (기본값: 20%)
    #[serde(default = "default_defensive_pct")]
    pub defensive_pct: f64,

    /// HALT 진입 드로다운 (기본값: 30%)
    #[serde(default = "default_halt_pct")]
    pub halt_pct: f64,
}

fn default_caution_pct() -> f64 {
    10.0
}

fn default_defensive_pct() -> f64 {
    20.0
}

fn default_halt_pct() -> f64 {
    30.0
}

impl Default for DrawdownConfig {
    fn default() -> Self {
        Self {
            caution_pct: default_caution_pct(),
            defensive_pct: default_defensive_pct(),
            halt_pct: default_halt_pct(),
        }
    }
}

impl DrawdownConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> SentinelResult<()> {
        if self.caution_pct <= 0.0
            || self.caution_pct >= self.defensive_pct
            || self.defensive_pct >= self.halt_pct
        {
            return Err(SentinelError::Config(
                "drawdown thresholds must be positive and strictly increasing".into(),
            ));
        }

        Ok(())
    }
}
