//! ATR 기반 손절/목표가/포지션 사이징.
//!
//! 제공 기능:
//! - 지지/저항을 반영한 손절가 산출 (최대 역방향 거리 클램프)
//! - 1x/2x/3x ATR 목표가 (지지/저항으로 보정)
//! - 리스크 기반 포지션 사이징
//! - 단조 강화되는 트레일링 스탑 재계산

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentinel_core::{Direction, SentinelError, SentinelResult, SupportResistance};

use crate::config::RiskConfig;

/// 정수 연산을 사용하여 가격에 배수를 적용.
/// 배수는 소수점 4자리까지 지원합니다.
fn mul_f64(value: Decimal, factor: f64) -> Decimal {
    let scaled = (factor * 10_000.0).round() as i64;
    (value * Decimal::from(scaled)) / Decimal::from(10_000)
}

/// 정수 연산을 사용하여 가격에 백분율 조정을 적용.
/// 예시: apply_pct(50000, -5.0) = 47500
fn apply_pct(price: Decimal, pct: f64) -> Decimal {
    let scaled_factor = ((100.0 + pct) * 10_000.0).round() as i64;
    (price * Decimal::from(scaled_factor)) / Decimal::from(1_000_000)
}

/// 가격 크기에 따라 반올림 자릿수를 결정합니다.
///
/// 저가 종목이 0으로 반올림되지 않도록 크기가 작을수록
/// 더 많은 소수 자리를 유지합니다.
pub fn smart_round(value: Decimal) -> Decimal {
    let abs = value.abs();
    let dp = if abs >= Decimal::from(1000) {
        2
    } else if abs >= Decimal::ONE {
        4
    } else if abs >= Decimal::new(1, 2) {
        6
    } else {
        8
    };
    value.round_dp(dp)
}

/// 한 시그널의 리스크 계획.
///
/// 생성 후 불변이며, 트레일링 스탑 레벨만 외부 추적기가
/// [`RiskCalculator::trailing_stop`]으로 재계산해 갱신합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPlan {
    /// 손절가
    pub stop_loss: Decimal,
    /// 목표가 3단계
    pub targets: [Decimal; 3],
    /// 거래당 리스크 금액
    pub risk_amount: Decimal,
    /// 평균 목표 거리 / 손절 거리
    pub reward_to_risk: f64,
    /// 포지션 수량
    pub position_size: Decimal,
    /// 포지션 가치
    pub position_value: Decimal,
    /// 트레일링 스탑 레벨 (진입 후 추적기가 갱신)
    pub trailing_stop_level: Option<Decimal>,
    /// 목표가별 부분 청산 비율
    pub partial_close_ratios: [f64; 3],
}

/// 리스크 계획 계산기.
#[derive(Debug, Clone, Default)]
pub struct RiskCalculator {
    config: RiskConfig,
}

impl RiskCalculator {
    /// 주어진 설정으로 계산기를 생성합니다.
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// 설정을 반환합니다.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// 진입가/ATR/지지저항에서 리스크 계획을 산출합니다.
    pub fn calculate(
        &self,
        price: Decimal,
        atr: Decimal,
        sr: &SupportResistance,
        direction: Direction,
        capital: Decimal,
    ) -> SentinelResult<RiskPlan> {
        if price <= Decimal::ZERO {
            return Err(SentinelError::InvalidInput(
                "price must be positive".to_string(),
            ));
        }
        if capital <= Decimal::ZERO {
            return Err(SentinelError::InvalidInput(
                "capital must be positive".to_string(),
            ));
        }

        // ATR 미산출 시 가격의 1% 사용
        let atr = if atr > Decimal::ZERO {
            atr
        } else {
            price * Decimal::new(1, 2)
        };

        let (stop_loss, targets) = match direction {
            Direction::Buy => self.buy_levels(price, atr, sr),
            Direction::Sell => self.sell_levels(price, atr, sr),
            Direction::Neutral => {
                return Err(SentinelError::InvalidInput(
                    "cannot build a risk plan for a neutral signal".to_string(),
                ))
            }
        };

        let stop_distance = (price - stop_loss).abs();
        let mean_target_distance = (targets
            .iter()
            .map(|t| (*t - price).abs())
            .sum::<Decimal>())
            / Decimal::from(3);

        let reward_to_risk = if stop_distance > Decimal::ZERO {
            (mean_target_distance / stop_distance).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        let risk_amount = mul_f64(capital, self.config.risk_pct / 100.0);
        let mut position_size = if stop_distance > Decimal::ZERO {
            risk_amount / stop_distance
        } else {
            Decimal::ZERO
        };

        let max_units = Decimal::from(self.config.max_position_units as i64);
        if position_size > max_units {
            position_size = max_units;
        }

        let plan = RiskPlan {
            stop_loss: smart_round(stop_loss),
            targets: [
                smart_round(targets[0]),
                smart_round(targets[1]),
                smart_round(targets[2]),
            ],
            risk_amount: smart_round(risk_amount),
            reward_to_risk,
            position_size: smart_round(position_size),
            position_value: smart_round(position_size * price),
            trailing_stop_level: None,
            partial_close_ratios: self.config.partial_close_ratios,
        };

        debug!(
            %price,
            stop_loss = %plan.stop_loss,
            rr = plan.reward_to_risk,
            size = %plan.position_size,
            "Risk plan calculated"
        );

        Ok(plan)
    }

    /// 트레일링 스탑 레벨을 재계산합니다.
    ///
    /// 단조 강화만 허용합니다: 이전 레벨보다 불리해지지 않으며,
    /// 최초 손절(1.5 ATR)보다 진입가에서 멀어지지 않습니다.
    pub fn trailing_stop(
        &self,
        entry: Decimal,
        current_price: Decimal,
        atr: Decimal,
        direction: Direction,
        previous_level: Option<Decimal>,
    ) -> Decimal {
        let atr = if atr > Decimal::ZERO {
            atr
        } else {
            entry * Decimal::new(1, 2)
        };
        let mult = self.config.trailing_atr_mult;
        let initial_stop_mult = self.config.stop_atr_mult;

        match direction {
            Direction::Buy => {
                let mut level = current_price - mul_f64(atr, mult);
                let floor = entry - mul_f64(atr, initial_stop_mult);
                if level < floor {
                    level = floor;
                }
                if let Some(prev) = previous_level {
                    if level < prev {
                        level = prev;
                    }
                }
                smart_round(level)
            }
            Direction::Sell | Direction::Neutral => {
                let mut level = current_price + mul_f64(atr, mult);
                let ceiling = entry + mul_f64(atr, initial_stop_mult);
                if level > ceiling {
                    level = ceiling;
                }
                if let Some(prev) = previous_level {
                    if level > prev {
                        level = prev;
                    }
                }
                smart_round(level)
            }
        }
    }

    fn buy_levels(
        &self,
        price: Decimal,
        atr: Decimal,
        sr: &SupportResistance,
    ) -> (Decimal, [Decimal; 3]) {
        let atr_stop = price - mul_f64(atr, self.config.stop_atr_mult);

        // 지지선 아래로 손절을 내리되, 최대 거리(3 ATR, 5%)로 클램프
        let mut stop = match sr.support1 {
            Some(s1) => s1.min(atr_stop),
            None => atr_stop,
        };
        let max_atr_stop = price - mul_f64(atr, self.config.max_stop_atr_mult);
        if stop < max_atr_stop {
            stop = max_atr_stop;
        }
        let max_adverse = apply_pct(price, -self.config.max_adverse_pct);
        if stop < max_adverse {
            stop = max_adverse;
        }

        let mut t1 = price + atr;
        if let Some(r1) = sr.resistance1 {
            t1 = t1.max(mul_f64(r1, 0.99));
        }
        let mut t2 = price + mul_f64(atr, 2.0);
        if let Some(r1) = sr.resistance1 {
            t2 = t2.max(r1);
        }
        let mut t3 = price + mul_f64(atr, 3.0);
        if let Some(r2) = sr.resistance2 {
            t3 = t3.max(r2);
        }

        // 목표가 단조 증가 보장
        if t2 <= t1 {
            t2 = t1 + atr;
        }
        if t3 <= t2 {
            t3 = t2 + atr;
        }

        (stop, [t1, t2, t3])
    }

    fn sell_levels(
        &self,
        price: Decimal,
        atr: Decimal,
        sr: &SupportResistance,
    ) -> (Decimal, [Decimal; 3]) {
        let atr_stop = price + mul_f64(atr, self.config.stop_atr_mult);

        let mut stop = match sr.resistance1 {
            Some(r1) => r1.max(atr_stop),
            None => atr_stop,
        };
        let max_atr_stop = price + mul_f64(atr, self.config.max_stop_atr_mult);
        if stop > max_atr_stop {
            stop = max_atr_stop;
        }
        let max_adverse = apply_pct(price, self.config.max_adverse_pct);
        if stop > max_adverse {
            stop = max_adverse;
        }

        let mut t1 = price - atr;
        if let Some(s1) = sr.support1 {
            t1 = t1.min(mul_f64(s1, 1.01));
        }
        let mut t2 = price - mul_f64(atr, 2.0);
        if let Some(s1) = sr.support1 {
            t2 = t2.min(s1);
        }
        let mut t3 = price - mul_f64(atr, 3.0);
        if let Some(s2) = sr.support2 {
            t3 = t3.min(s2);
        }

        // 목표가 단조 감소 보장
        if t2 >= t1 {
            t2 = t1 - atr;
        }
        if t3 >= t2 {
            t3 = t2 - atr;
        }

        (stop, [t1, t2, t3])
    }
}
