//! 신뢰도 점수기.
//!
//! 7개 컴포넌트(기술/MTF/거래량/모멘텀/감성/주문흐름/매크로)를
//! 각각 0-100으로 점수화한 뒤 가중 합산하고, 이어서 유계 조정
//! (호가창, 온체인, 펀딩, 공포탐욕 편향, 고급 보정, ML 승률)을
//! 순서대로 적용합니다. 매 조정 후 [0, 100]으로 클램프하므로
//! 단일 입력이 점수를 지배할 수 없습니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sentinel_core::{
    AdvancedBoosts, Direction, FeatureSnapshot, FundingRate, Grade, MacdCross, MacroRegime,
    ObvTrend, OnChainSignal, OrderBookImbalance, OrderFlowSummary, SentimentSnapshot, Signal,
    TimeframeAgreement,
};
use sentinel_ml::{FeatureVector, WinProbabilityModel};

use crate::config::ScorerConfig;

/// 점수 계산에 쓰이는 선택적 시장 컨텍스트.
///
/// 모든 필드는 선택적이며, 누락된 입력은 해당 컴포넌트/조정을
/// 중립으로 만듭니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreContext<'a> {
    pub timeframe: Option<&'a TimeframeAgreement>,
    pub sentiment: Option<&'a SentimentSnapshot>,
    pub fear_greed: Option<i32>,
    pub order_flow: Option<&'a OrderFlowSummary>,
    pub macro_regime: Option<MacroRegime>,
    pub funding: Option<FundingRate>,
    pub order_book: Option<OrderBookImbalance>,
    pub on_chain: Option<OnChainSignal>,
    pub advanced: Option<AdvancedBoosts>,
    pub is_crypto: bool,
}

/// 점수 계산 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceResult {
    /// 최종 신뢰도 (0-100)
    pub score: f64,
    /// 문자 등급
    pub grade: Grade,
    /// 컴포넌트별 점수와 조정별 델타
    pub breakdown: BTreeMap<String, f64>,
    /// ML 모델 승률 (모델 부재/실패 시 None)
    pub win_probability: Option<f64>,
    /// 학습 데이터로 영속화되는 feature vector
    pub feature_vector: FeatureVector,
}

impl ConfidenceResult {
    /// 정수 신뢰도를 반환합니다.
    pub fn score_rounded(&self) -> i32 {
        self.score.round() as i32
    }
}

/// 신뢰도 점수기.
pub struct ConfidenceScorer {
    config: ScorerConfig,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ScorerConfig::default())
    }
}

impl ConfidenceScorer {
    /// 주어진 설정으로 점수기를 생성합니다.
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// 방향성 시그널의 신뢰도를 계산합니다.
    ///
    /// 모델 호출이 실패하면 ML 조정만 건너뛰고 점수는 유지됩니다.
    pub fn score(
        &self,
        signal: &Signal,
        features: &FeatureSnapshot,
        ctx: &ScoreContext<'_>,
        model: Option<&dyn WinProbabilityModel>,
    ) -> ConfidenceResult {
        let direction = signal.direction;
        let features = features.sanitized();
        let mut breakdown = BTreeMap::new();

        let technical = self.technical_component(direction, &features);
        let mtf = self.mtf_component(direction, ctx.timeframe);
        let volume = self.volume_component(direction, &features);
        let momentum = self.momentum_component(direction, &features);
        let sentiment = self.sentiment_component(direction, ctx.sentiment, ctx.fear_greed);
        let order_flow = self.order_flow_component(direction, ctx.order_flow);
        let macro_env = self.macro_component(ctx.macro_regime);

        breakdown.insert("technical".to_string(), technical);
        breakdown.insert("mtf".to_string(), mtf);
        breakdown.insert("volume".to_string(), volume);
        breakdown.insert("momentum".to_string(), momentum);
        breakdown.insert("sentiment".to_string(), sentiment);
        breakdown.insert("order_flow".to_string(), order_flow);
        breakdown.insert("macro".to_string(), macro_env);

        let mut score = (technical * self.config.technical_weight
            + mtf * self.config.mtf_weight
            + volume * self.config.volume_weight
            + momentum * self.config.momentum_weight
            + sentiment * self.config.sentiment_weight
            + order_flow * self.config.order_flow_weight
            + macro_env * self.config.macro_weight)
            / 100.0;
        score = score.clamp(0.0, 100.0);

        // 유계 조정: 매 적용 후 클램프
        let adjustments: [(&str, f64); 5] = [
            ("adj_order_book", order_book_delta(direction, ctx.order_book)),
            ("adj_on_chain", on_chain_delta(direction, ctx.on_chain)),
            ("adj_funding", funding_delta(direction, ctx.funding)),
            (
                "adj_fear_greed",
                fear_greed_bias_delta(direction, ctx.fear_greed),
            ),
            ("adj_advanced", advanced_delta(ctx.advanced)),
        ];
        for (name, delta) in adjustments {
            if delta != 0.0 {
                score = (score + delta).clamp(0.0, 100.0);
            }
            breakdown.insert(name.to_string(), delta);
        }

        // ML 조정 전 신뢰도로 feature vector를 조립합니다. 모델
        // 출력이 자기 입력에 섞이지 않게 하기 위함입니다.
        let feature_vector = FeatureVector::assemble(
            &features,
            signal.tier,
            ctx.timeframe,
            ctx.sentiment,
            ctx.order_flow,
            ctx.macro_regime,
            ctx.fear_greed.unwrap_or(50),
            score.round() as i32,
            ctx.is_crypto,
        );

        let mut win_probability = None;
        let mut ml_delta = 0.0;
        if let Some(model) = model {
            match model.predict(&feature_vector) {
                Ok(wp) => {
                    win_probability = Some(wp);
                    ml_delta = ml_adjustment(wp);
                    score = (score + ml_delta).clamp(0.0, 100.0);
                }
                Err(e) => {
                    warn!(
                        model = model.model_name(),
                        error = %e,
                        "Win probability prediction failed, skipping ML adjustment"
                    );
                }
            }
        }
        breakdown.insert("adj_ml".to_string(), ml_delta);

        let grade = Grade::from_score(score.round() as i32);
        debug!(%direction, score, grade = %grade, "Confidence scored");

        ConfidenceResult {
            score,
            grade,
            breakdown,
            win_probability,
            feature_vector,
        }
    }

    /// 기술 지표 컴포넌트 (RSI, MACD, %B, 스토캐스틱, ADX).
    fn technical_component(&self, direction: Direction, f: &FeatureSnapshot) -> f64 {
        let mut score: f64 = 50.0;

        match direction {
            Direction::Buy => {
                if f.rsi <= 20.0 {
                    score += 25.0;
                } else if f.rsi <= 30.0 {
                    score += 20.0;
                } else if f.rsi <= 40.0 {
                    score += 12.0;
                } else if f.rsi <= 50.0 {
                    score += 5.0;
                } else if f.rsi >= 70.0 {
                    score -= 15.0;
                }
            }
            Direction::Sell => {
                if f.rsi >= 80.0 {
                    score += 25.0;
                } else if f.rsi >= 70.0 {
                    score += 20.0;
                } else if f.rsi >= 60.0 {
                    score += 12.0;
                } else if f.rsi >= 50.0 {
                    score += 5.0;
                } else if f.rsi <= 30.0 {
                    score -= 15.0;
                }
            }
            Direction::Neutral => {}
        }

        let crossover_matches = matches!(
            (direction, f.macd_crossover),
            (Direction::Buy, Some(MacdCross::Bullish)) | (Direction::Sell, Some(MacdCross::Bearish))
        );
        let hist_matches = (direction.is_buy() && f.macd_hist > 0.0)
            || (direction.is_sell() && f.macd_hist < 0.0);
        if crossover_matches {
            score += 15.0;
        } else if hist_matches {
            score += 8.0;
        }

        match direction {
            Direction::Buy => {
                if f.bb_pctb < 0.1 {
                    score += 15.0;
                } else if f.bb_pctb < 0.2 {
                    score += 12.0;
                } else if f.bb_pctb < 0.3 {
                    score += 6.0;
                }
                if f.stoch_k < 20.0 {
                    score += 12.0;
                } else if f.stoch_k < 30.0 {
                    score += 8.0;
                }
            }
            Direction::Sell => {
                if f.bb_pctb > 0.9 {
                    score += 15.0;
                } else if f.bb_pctb > 0.8 {
                    score += 12.0;
                } else if f.bb_pctb > 0.7 {
                    score += 6.0;
                }
                if f.stoch_k > 80.0 {
                    score += 12.0;
                } else if f.stoch_k > 70.0 {
                    score += 8.0;
                }
            }
            Direction::Neutral => {}
        }

        if f.adx > 30.0 {
            score += 10.0;
        } else if f.adx > 20.0 {
            score += 6.0;
        } else if f.adx > 15.0 {
            score += 3.0;
        }

        score.clamp(0.0, 100.0)
    }

    /// 타임프레임 합류 컴포넌트.
    fn mtf_component(&self, direction: Direction, timeframe: Option<&TimeframeAgreement>) -> f64 {
        match timeframe {
            Some(tfa) if tfa.supports(direction) => {
                let ratio = if tfa.total > 0 {
                    tfa.aligned as f64 / tfa.total as f64
                } else {
                    0.0
                };
                (50.0 + ratio * 50.0).min(100.0)
            }
            Some(tfa) if tfa.dominant == direction.opposite() => 20.0,
            _ => 40.0,
        }
    }

    /// 거래량 컴포넌트 (상대 거래량 + OBV 방향).
    fn volume_component(&self, direction: Direction, f: &FeatureSnapshot) -> f64 {
        let mut score: f64 = 50.0;

        if f.volume_ratio >= 2.0 {
            score += 30.0;
        } else if f.volume_ratio >= 1.5 {
            score += 20.0;
        } else if f.volume_ratio >= 1.2 {
            score += 10.0;
        } else if f.volume_ratio < 0.5 {
            score -= 20.0;
        }

        let obv_supports = matches!(
            (direction, f.obv_trend),
            (Direction::Buy, ObvTrend::Rising) | (Direction::Sell, ObvTrend::Falling)
        );
        let obv_opposes = matches!(
            (direction, f.obv_trend),
            (Direction::Buy, ObvTrend::Falling) | (Direction::Sell, ObvTrend::Rising)
        );
        if obv_supports {
            score += 10.0;
        } else if obv_opposes {
            score -= 10.0;
        }

        score.clamp(0.0, 100.0)
    }

    /// 모멘텀 컴포넌트 (EMA 정렬 + 최근 가격 변화).
    fn momentum_component(&self, direction: Direction, f: &FeatureSnapshot) -> f64 {
        let mut score: f64 = 50.0;

        let full_stack = match direction {
            Direction::Buy => {
                f.price > f.ema9 && f.ema9 > f.ema21 && f.ema21 > f.ema50
            }
            Direction::Sell => {
                f.price < f.ema9 && f.ema9 < f.ema21 && f.ema21 < f.ema50
            }
            Direction::Neutral => false,
        };
        let partial_stack = match direction {
            Direction::Buy => f.price > f.ema21,
            Direction::Sell => f.price < f.ema21,
            Direction::Neutral => false,
        };
        if full_stack {
            score += 20.0;
        } else if partial_stack {
            score += 10.0;
        }

        let change_supports = (direction.is_buy() && f.price_change_pct > 0.0)
            || (direction.is_sell() && f.price_change_pct < 0.0);
        if change_supports {
            score += (f.price_change_pct.abs() * 5.0).min(15.0);
        }

        score.clamp(0.0, 100.0)
    }

    /// 감성 컴포넌트 (종합 감성 점수 + 공포탐욕 극단 보너스).
    fn sentiment_component(
        &self,
        direction: Direction,
        sentiment: Option<&SentimentSnapshot>,
        fear_greed: Option<i32>,
    ) -> f64 {
        let mut score: f64 = 50.0;

        if let Some(s) = sentiment {
            match direction {
                Direction::Buy => score += s.score * 0.25,
                Direction::Sell => score -= s.score * 0.25,
                Direction::Neutral => {}
            }
        }

        // 극단 공포에서의 매수, 극단 탐욕에서의 매도는 역추세 보너스
        if let Some(fg) = fear_greed {
            match direction {
                Direction::Buy => {
                    if fg < 25 {
                        score += 15.0;
                    } else if fg > 80 {
                        score -= 10.0;
                    }
                }
                Direction::Sell => {
                    if fg > 75 {
                        score += 15.0;
                    } else if fg < 20 {
                        score -= 10.0;
                    }
                }
                Direction::Neutral => {}
            }
        }

        score.clamp(0.0, 100.0)
    }

    /// 주문 흐름 컴포넌트.
    fn order_flow_component(
        &self,
        direction: Direction,
        order_flow: Option<&OrderFlowSummary>,
    ) -> f64 {
        match order_flow {
            Some(flow) if flow.direction == direction => 80.0,
            Some(flow) if flow.direction == direction.opposite() => 20.0,
            _ => 50.0,
        }
    }

    /// 매크로 환경 컴포넌트.
    fn macro_component(&self, regime: Option<MacroRegime>) -> f64 {
        match regime {
            Some(MacroRegime::Allow) => 65.0,
            Some(MacroRegime::Caution) => 40.0,
            Some(MacroRegime::Block) => 15.0,
            None => 50.0,
        }
    }
}

/// 호가창 불균형 조정.
fn order_book_delta(direction: Direction, order_book: Option<OrderBookImbalance>) -> f64 {
    let Some(book) = order_book else {
        return 0.0;
    };
    let ratio = book.bid_ask_ratio;
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0.0;
    }
    // 매도는 비율을 뒤집어 동일한 사다리를 적용합니다.
    let effective = match direction {
        Direction::Buy => ratio,
        Direction::Sell => 1.0 / ratio,
        Direction::Neutral => return 0.0,
    };
    if effective >= 2.0 {
        10.0
    } else if effective >= 1.3 {
        5.0
    } else if effective <= 0.5 {
        -10.0
    } else if effective <= 0.77 {
        -5.0
    } else {
        0.0
    }
}

/// 온체인 시그널 조정.
fn on_chain_delta(direction: Direction, on_chain: Option<OnChainSignal>) -> f64 {
    let Some(signal) = on_chain else {
        return 0.0;
    };
    let effective = match direction {
        Direction::Buy => signal.score,
        Direction::Sell => -signal.score,
        Direction::Neutral => return 0.0,
    };
    if effective >= 50.0 {
        8.0
    } else if effective >= 20.0 {
        4.0
    } else if effective <= -50.0 {
        -8.0
    } else if effective <= -20.0 {
        -4.0
    } else {
        0.0
    }
}

/// 펀딩 비율 조정. 과밀한 쪽으로의 진입을 벌점 처리합니다.
fn funding_delta(direction: Direction, funding: Option<FundingRate>) -> f64 {
    let Some(rate) = funding else {
        return 0.0;
    };
    // 양수 펀딩 = 롱 과밀. 매도는 부호를 뒤집습니다.
    let effective = match direction {
        Direction::Buy => rate.rate_pct,
        Direction::Sell => -rate.rate_pct,
        Direction::Neutral => return 0.0,
    };
    if effective > 0.05 {
        -15.0
    } else if effective > 0.01 {
        -8.0
    } else if effective < -0.05 {
        10.0
    } else if effective < -0.01 {
        8.0
    } else {
        0.0
    }
}

/// 공포탐욕 편향 조정. 극단 구간의 추격 진입을 벌점 처리합니다.
fn fear_greed_bias_delta(direction: Direction, fear_greed: Option<i32>) -> f64 {
    let Some(fg) = fear_greed else {
        return 0.0;
    };
    match direction {
        Direction::Buy => {
            if fg <= 10 {
                -8.0
            } else if fg <= 25 {
                -3.0
            } else if fg >= 90 {
                -5.0
            } else if fg >= 70 {
                5.0
            } else {
                0.0
            }
        }
        Direction::Sell => {
            if fg >= 90 {
                -8.0
            } else if fg >= 75 {
                -3.0
            } else if fg <= 10 {
                -5.0
            } else if fg <= 30 {
                5.0
            } else {
                0.0
            }
        }
        Direction::Neutral => 0.0,
    }
}

/// 고급 분석 보정 조정. 항목별 ±15로 클램프합니다.
fn advanced_delta(advanced: Option<AdvancedBoosts>) -> f64 {
    let Some(boosts) = advanced else {
        return 0.0;
    };
    boosts.structure_break.clamp(-15.0, 15.0)
        + boosts.order_block.clamp(-15.0, 15.0)
        + boosts.liquidity_sweep.clamp(-15.0, 15.0)
        + boosts.volume_profile.clamp(-15.0, 15.0)
}

/// ML 승률 조정. 중립 구간(0.35-0.75)은 점수를 건드리지 않습니다.
fn ml_adjustment(win_probability: f64) -> f64 {
    if win_probability >= 0.75 {
        ((win_probability - 0.5) * 40.0).min(20.0)
    } else if win_probability <= 0.35 {
        -((0.5 - win_probability) * 30.0).min(15.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sentinel_core::{MaCross, SignalTier, SupportResistance};
    use sentinel_ml::{MlError, MlResult, MockModel};

    fn buy_signal() -> Signal {
        Signal::directional(
            Direction::Buy,
            SignalTier::Extreme,
            vec!["test".to_string()],
        )
    }

    fn strong_buy_snapshot() -> FeatureSnapshot {
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
            ema50: dec!(97),
            atr: dec!(2),
            price_change_pct: 0.0,
            divergence: None,
            fvg_fib: None,
            support_resistance: SupportResistance::default(),
        }
    }

    fn full_alignment() -> TimeframeAgreement {
        TimeframeAgreement {
            dominant: Direction::Buy,
            aligned: 4,
            total: 4,
            confluence_score: 40.0,
        }
    }

    struct FailingModel;

    impl WinProbabilityModel for FailingModel {
        fn predict(&self, _features: &FeatureVector) -> MlResult<f64> {
            Err(MlError::Inference("session lost".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing_model"
        }
    }

    #[test]
    fn test_strong_setup_scores_high() {
        let scorer = ConfidenceScorer::default();
        let tfa = full_alignment();
        let flow = OrderFlowSummary {
            direction: Direction::Buy,
            score: 70.0,
        };
        let ctx = ScoreContext {
            timeframe: Some(&tfa),
            order_flow: Some(&flow),
            ..Default::default()
        };

        let result = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, None);

        // 기술 100, MTF 100, 거래량 90, 모멘텀 70, 감성 50,
        // 주문흐름 80, 매크로 50 -> 가중합 90
        assert!((result.score - 90.0).abs() < 1e-9);
        assert_eq!(result.grade, Grade::A);
        assert_eq!(result.breakdown["technical"], 100.0);
        assert_eq!(result.breakdown["mtf"], 100.0);
        assert_eq!(result.breakdown["order_flow"], 80.0);
    }

    #[test]
    fn test_order_book_adjustment_caps_at_100() {
        let scorer = ConfidenceScorer::default();
        let tfa = full_alignment();
        let flow = OrderFlowSummary {
            direction: Direction::Buy,
            score: 70.0,
        };
        let ctx = ScoreContext {
            timeframe: Some(&tfa),
            order_flow: Some(&flow),
            order_book: Some(OrderBookImbalance { bid_ask_ratio: 2.2 }),
            ..Default::default()
        };

        let result = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, None);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_crowded_funding_penalty() {
        let scorer = ConfidenceScorer::default();
        let ctx = ScoreContext {
            funding: Some(FundingRate { rate_pct: 6.0 }),
            ..Default::default()
        };

        let baseline = scorer.score(
            &buy_signal(),
            &strong_buy_snapshot(),
            &ScoreContext::default(),
            None,
        );
        let penalized = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, None);

        assert!((baseline.score - penalized.score - 15.0).abs() < 1e-9);
        assert_eq!(penalized.breakdown["adj_funding"], -15.0);
    }

    #[test]
    fn test_opposing_timeframes_drag_score() {
        let scorer = ConfidenceScorer::default();
        let opposed = TimeframeAgreement {
            dominant: Direction::Sell,
            aligned: 3,
            total: 4,
            confluence_score: 30.0,
        };
        let ctx = ScoreContext {
            timeframe: Some(&opposed),
            ..Default::default()
        };

        let result = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, None);
        assert_eq!(result.breakdown["mtf"], 20.0);
    }

    #[test]
    fn test_ml_boost_and_penalty() {
        let scorer = ConfidenceScorer::default();
        let ctx = ScoreContext::default();

        let confident = MockModel::new(0.85);
        let boosted = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, Some(&confident));
        assert_eq!(boosted.win_probability, Some(0.85));
        assert!((boosted.breakdown["adj_ml"] - 14.0).abs() < 1e-9);

        let bearish = MockModel::new(0.2);
        let penalized = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, Some(&bearish));
        assert!((penalized.breakdown["adj_ml"] + 9.0).abs() < 1e-9);

        let neutral = MockModel::new(0.5);
        let unchanged = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, Some(&neutral));
        assert_eq!(unchanged.breakdown["adj_ml"], 0.0);
    }

    #[test]
    fn test_model_failure_skips_adjustment() {
        let scorer = ConfidenceScorer::default();
        let ctx = ScoreContext::default();

        let baseline = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, None);
        let with_failure =
            scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, Some(&FailingModel));

        assert_eq!(baseline.score, with_failure.score);
        assert_eq!(with_failure.win_probability, None);
    }

    #[test]
    fn test_feature_vector_uses_pre_ml_confidence() {
        let scorer = ConfidenceScorer::default();
        let ctx = ScoreContext::default();

        let confident = MockModel::new(0.9);
        let result = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, Some(&confident));

        let pre_ml = result.score - result.breakdown["adj_ml"];
        assert_eq!(result.feature_vector.confidence, pre_ml.round() as f32);
    }

    #[test]
    fn test_sell_direction_mirrors_ladders() {
        let scorer = ConfidenceScorer::default();
        let sell = Signal::directional(
            Direction::Sell,
            SignalTier::Strong,
            vec!["test".to_string()],
        );
        let mut snap = strong_buy_snapshot();
        snap.rsi = 72.0;
        snap.macd_crossover = Some(MacdCross::Bearish);
        snap.bb_pctb = 0.85;
        snap.stoch_k = 82.0;
        snap.ema9 = dec!(100.5);
        snap.ema21 = dec!(101);
        snap.ema50 = dec!(103);
        snap.obv_trend = ObvTrend::Falling;

        let result = scorer.score(&sell, &snap, &ScoreContext::default(), None);
        assert!(result.breakdown["technical"] >= 90.0);
        assert_eq!(result.breakdown["volume"], 90.0);
    }

    #[test]
    fn test_extreme_greed_penalizes_late_buy() {
        let scorer = ConfidenceScorer::default();
        let ctx = ScoreContext {
            fear_greed: Some(95),
            ..Default::default()
        };

        let result = scorer.score(&buy_signal(), &strong_buy_snapshot(), &ctx, None);
        assert_eq!(result.breakdown["adj_fear_greed"], -5.0);
    }
}
