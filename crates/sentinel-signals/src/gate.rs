//! 정밀 게이트.
//!
//! 신뢰도/합의를 통과한 후보에 마지막으로 적용되는 10개의 이름
//! 붙은 관문입니다. 모든 관문을 평가한 뒤 첫 실패를 대표 사유로
//! 보고하며, 별도로 진입 정밀도(풀백/지지 근접/반전 징후)를
//! 채점합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentinel_core::{
    Direction, FeatureSnapshot, FundingRate, OrderFlowSummary, TimeframeAgreement,
};
use sentinel_risk::RiskPlan;

use crate::config::GateConfig;

/// 단일 관문 평가 기록.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCheck {
    /// 관문 이름
    pub name: String,
    /// 통과 여부
    pub passed: bool,
}

/// 진입 정밀도 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryQuality {
    /// 정밀 조건 2개 이상
    Premium,
    /// 정밀 조건 1개
    Standard,
    /// 정밀 조건 없음
    Poor,
}

/// 게이트 평가 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    /// 전체 통과 여부
    pub passed: bool,
    /// 관문별 기록 (항상 10개)
    pub checks: Vec<GateCheck>,
    /// 첫 번째 실패 관문 이름
    pub primary_failure: Option<String>,
    /// 진입 정밀도 점수 (0-3)
    pub precision_score: u8,
    /// 진입 정밀도 등급
    pub entry_quality: EntryQuality,
}

/// 정밀 게이트.
#[derive(Debug, Clone, Default)]
pub struct PrecisionGate {
    config: GateConfig,
}

impl PrecisionGate {
    /// 주어진 설정으로 게이트를 생성합니다.
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// 후보를 10개 관문에 통과시키고 진입 정밀도를 채점합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &self,
        direction: Direction,
        features: &FeatureSnapshot,
        confidence: f64,
        timeframe: Option<&TimeframeAgreement>,
        order_flow: Option<&OrderFlowSummary>,
        funding: Option<FundingRate>,
        plan: &RiskPlan,
    ) -> GateResult {
        let features = features.sanitized();
        let c = &self.config;

        let mtf_aligned = timeframe
            .map(|tfa| tfa.supports(direction) && tfa.aligned >= c.min_mtf_aligned)
            .unwrap_or(false);

        let first_target_rr = reward_to_risk_first_target(&features, plan);

        let ema_distance_ok = match ema_distance_atr(&features, features.ema21) {
            Some(distance) => distance <= c.max_ema_distance_atr,
            None => true,
        };

        let band_position_ok = match direction {
            Direction::Buy => features.bb_pctb <= c.max_pctb_buy,
            Direction::Sell => features.bb_pctb >= c.min_pctb_sell,
            Direction::Neutral => false,
        };

        let order_flow_ok = match order_flow {
            Some(flow) => flow.direction != direction.opposite(),
            None => true,
        };

        let funding_ok = match funding {
            Some(rate) => match direction {
                Direction::Buy => rate.rate_pct <= c.max_funding_against_pct,
                Direction::Sell => rate.rate_pct >= -c.max_funding_against_pct,
                Direction::Neutral => false,
            },
            None => true,
        };

        let checks: [(&str, bool); 10] = [
            ("ADX_STRONG", features.adx >= c.min_adx),
            ("VOLUME_OK", features.volume_ratio >= c.min_volume_ratio),
            ("MTF_ALIGNED", mtf_aligned),
            ("CONFIDENCE_HIGH", confidence >= c.min_confidence as f64),
            ("RR_OK", first_target_rr >= c.min_reward_risk),
            ("NOT_OVEREXTENDED", ema_distance_ok),
            ("BAND_POSITION", band_position_ok),
            ("BAND_WIDTH", features.band_width_ratio() >= c.min_band_width_ratio),
            ("ORDER_FLOW_OK", order_flow_ok),
            ("FUNDING_OK", funding_ok),
        ];

        let primary_failure = checks
            .iter()
            .find(|(_, passed)| !passed)
            .map(|(name, _)| name.to_string());
        let passed = primary_failure.is_none();

        let precision_score = self.entry_precision(direction, &features);
        let entry_quality = match precision_score {
            0 => EntryQuality::Poor,
            1 => EntryQuality::Standard,
            _ => EntryQuality::Premium,
        };

        debug!(
            %direction,
            passed,
            primary_failure = primary_failure.as_deref().unwrap_or("-"),
            precision_score,
            "Precision gate evaluated"
        );

        GateResult {
            passed,
            checks: checks
                .iter()
                .map(|(name, passed)| GateCheck {
                    name: name.to_string(),
                    passed: *passed,
                })
                .collect(),
            primary_failure,
            precision_score,
            entry_quality,
        }
    }

    /// 진입 정밀도를 채점합니다 (0-3).
    ///
    /// EMA 풀백, 지지/저항 근접, 반전 징후를 각 1점으로 봅니다.
    fn entry_precision(&self, direction: Direction, features: &FeatureSnapshot) -> u8 {
        let mut score = 0u8;
        let atr = features.atr.to_f64().unwrap_or(0.0);
        if atr <= 0.0 {
            return 0;
        }

        if let Some(distance) = ema_distance_atr(features, features.ema21) {
            if distance <= self.config.pullback_atr {
                score += 1;
            }
        }
        if let Some(distance) = ema_distance_atr(features, features.ema50) {
            if distance <= self.config.pullback_atr {
                score += 1;
            }
        }

        let level = match direction {
            Direction::Buy => features.support_resistance.support1,
            Direction::Sell => features.support_resistance.resistance1,
            Direction::Neutral => None,
        };
        if let Some(level) = level {
            let distance = (features.price - level).abs().to_f64().unwrap_or(f64::MAX) / atr;
            if distance <= self.config.sr_proximity_atr {
                score += 1;
            }
        }

        let reversal_hint = match direction {
            Direction::Buy => features.rsi < 40.0 && features.bb_pctb < 0.25,
            Direction::Sell => features.rsi > 60.0 && features.bb_pctb > 0.75,
            Direction::Neutral => false,
        };
        if reversal_hint {
            score += 1;
        }

        score.min(3)
    }
}

/// 1차 목표 기준 손익비를 계산합니다.
fn reward_to_risk_first_target(features: &FeatureSnapshot, plan: &RiskPlan) -> f64 {
    let stop_distance = (features.price - plan.stop_loss).abs();
    if stop_distance <= Decimal::ZERO {
        return 0.0;
    }
    let target_distance = (plan.targets[0] - features.price).abs();
    (target_distance / stop_distance).to_f64().unwrap_or(0.0)
}

/// EMA 이격을 ATR 배수로 반환합니다. ATR이 없으면 None.
fn ema_distance_atr(features: &FeatureSnapshot, ema: Decimal) -> Option<f64> {
    let atr = features.atr.to_f64()?;
    if atr <= 0.0 {
        return None;
    }
    let distance = (features.price - ema).abs().to_f64()?;
    Some(distance / atr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sentinel_core::{MacdCross, MaCross, ObvTrend, SupportResistance};
    use sentinel_risk::{RiskCalculator, RiskConfig};

    fn prime_snapshot() -> FeatureSnapshot {
        FeatureSnapshot {
            price: dec!(100),
            rsi: 28.0,
            macd_hist: 0.8,
            macd_crossover: Some(MacdCross::Bullish),
            bb_pctb: 0.15,
            bb_upper: dec!(104),
            bb_lower: dec!(96),
            stoch_k: 18.0,
            stoch_d: 20.0,
            adx: 30.0,
            plus_di: 32.0,
            minus_di: 12.0,
            volume_ratio: 2.0,
            ma_cross: Some(MaCross::Golden),
            obv_trend: ObvTrend::Rising,
            ema9: dec!(99.5),
            ema21: dec!(99),
            ema50: dec!(99.2),
            atr: dec!(2),
            price_change_pct: 1.0,
            divergence: None,
            fvg_fib: None,
            support_resistance: SupportResistance {
                support1: Some(dec!(99)),
                support2: Some(dec!(95)),
                resistance1: Some(dec!(110)),
                resistance2: Some(dec!(115)),
            },
        }
    }

    fn buy_alignment() -> TimeframeAgreement {
        TimeframeAgreement {
            dominant: Direction::Buy,
            aligned: 4,
            total: 4,
            confluence_score: 40.0,
        }
    }

    fn buy_plan(features: &FeatureSnapshot) -> RiskPlan {
        RiskCalculator::new(RiskConfig::default())
            .calculate(
                features.price,
                features.atr,
                &features.support_resistance,
                Direction::Buy,
                dec!(10000),
            )
            .unwrap()
    }

    #[test]
    fn test_prime_setup_passes_all_gates() {
        let gate = PrecisionGate::default();
        let snap = prime_snapshot();
        let plan = buy_plan(&snap);
        let tfa = buy_alignment();
        let flow = OrderFlowSummary {
            direction: Direction::Buy,
            score: 70.0,
        };

        let result = gate.evaluate(
            Direction::Buy,
            &snap,
            92.0,
            Some(&tfa),
            Some(&flow),
            None,
            &plan,
        );

        assert!(result.passed, "failed: {:?}", result.primary_failure);
        assert_eq!(result.checks.len(), 10);
        assert_eq!(result.primary_failure, None);
    }

    #[test]
    fn test_crowded_funding_fails_gate() {
        let gate = PrecisionGate::default();
        let snap = prime_snapshot();
        let plan = buy_plan(&snap);
        let tfa = buy_alignment();

        let result = gate.evaluate(
            Direction::Buy,
            &snap,
            92.0,
            Some(&tfa),
            None,
            Some(FundingRate { rate_pct: 6.0 }),
            &plan,
        );

        assert!(!result.passed);
        assert_eq!(result.primary_failure.as_deref(), Some("FUNDING_OK"));
    }

    #[test]
    fn test_missing_timeframes_fail_mtf_gate() {
        let gate = PrecisionGate::default();
        let snap = prime_snapshot();
        let plan = buy_plan(&snap);

        let result = gate.evaluate(Direction::Buy, &snap, 92.0, None, None, None, &plan);

        assert!(!result.passed);
        assert_eq!(result.primary_failure.as_deref(), Some("MTF_ALIGNED"));
    }

    #[test]
    fn test_low_confidence_fails() {
        let gate = PrecisionGate::default();
        let snap = prime_snapshot();
        let plan = buy_plan(&snap);
        let tfa = buy_alignment();

        let result = gate.evaluate(Direction::Buy, &snap, 75.0, Some(&tfa), None, None, &plan);

        assert!(!result.passed);
        assert_eq!(result.primary_failure.as_deref(), Some("CONFIDENCE_HIGH"));
    }

    #[test]
    fn test_all_gates_evaluated_despite_early_failure() {
        let gate = PrecisionGate::default();
        let mut snap = prime_snapshot();
        snap.adx = 10.0; // 첫 관문 실패
        snap.volume_ratio = 0.5; // 두 번째 관문도 실패
        let plan = buy_plan(&snap);

        let result = gate.evaluate(Direction::Buy, &snap, 92.0, None, None, None, &plan);

        assert_eq!(result.primary_failure.as_deref(), Some("ADX_STRONG"));
        let failed: Vec<_> = result
            .checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| check.name.clone())
            .collect();
        assert!(failed.contains(&"VOLUME_OK".to_string()));
        assert!(failed.contains(&"MTF_ALIGNED".to_string()));
    }

    #[test]
    fn test_overextension_fails() {
        let gate = PrecisionGate::default();
        let mut snap = prime_snapshot();
        // EMA21에서 6 ATR 이격
        snap.ema21 = dec!(88);
        snap.support_resistance.support1 = Some(dec!(88));
        let plan = buy_plan(&snap);
        let tfa = buy_alignment();

        let result = gate.evaluate(Direction::Buy, &snap, 92.0, Some(&tfa), None, None, &plan);

        let check = result
            .checks
            .iter()
            .find(|c| c.name == "NOT_OVEREXTENDED")
            .unwrap();
        assert!(!check.passed);
    }

    #[test]
    fn test_entry_precision_premium() {
        let gate = PrecisionGate::default();
        let snap = prime_snapshot();
        let plan = buy_plan(&snap);
        let tfa = buy_alignment();

        let result = gate.evaluate(Direction::Buy, &snap, 92.0, Some(&tfa), None, None, &plan);

        // EMA21 풀백(0.5 ATR) + EMA50 풀백(0.4 ATR) + 지지선 근접 + 반전 징후
        assert_eq!(result.precision_score, 3);
        assert_eq!(result.entry_quality, EntryQuality::Premium);
    }

    #[test]
    fn test_entry_precision_poor_when_extended() {
        let gate = PrecisionGate::default();
        let mut snap = prime_snapshot();
        snap.ema21 = dec!(90);
        snap.ema50 = dec!(88);
        snap.rsi = 55.0;
        snap.bb_pctb = 0.5;
        snap.support_resistance = SupportResistance::default();
        let plan = buy_plan(&snap);

        let result = gate.evaluate(Direction::Buy, &snap, 92.0, None, None, None, &plan);

        assert_eq!(result.precision_score, 0);
        assert_eq!(result.entry_quality, EntryQuality::Poor);
    }
}
