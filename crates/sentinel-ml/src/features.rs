//! 승률 모델 입력 feature vector.
//!
//! 점수기가 스캔마다 조립하며, 모델이 로드되어 있지 않아도 항상
//! 생성되어 학습 데이터로 영속화됩니다. feature 순서는 학습
//! 파이프라인과의 계약이므로 변경하면 안 됩니다.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use sentinel_core::{
    Direction, FeatureSnapshot, MacroRegime, OrderFlowSummary, SentimentSnapshot, SignalTier,
    TimeframeAgreement,
};

use crate::error::{MlError, MlResult};

/// feature 개수 (모델 입력 크기).
pub const FEATURE_COUNT: usize = 15;

/// 고정된 feature 이름 순서.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "rsi",
    "macd_hist",
    "adx",
    "bb_pctb",
    "stoch_k",
    "atr_pct",
    "volume_ratio",
    "mtf_score",
    "sentiment_score",
    "fear_greed",
    "order_flow_score",
    "macro_score",
    "confidence",
    "tier_numeric",
    "is_crypto",
];

/// 한 후보의 모델 입력 feature 집합.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rsi: f32,
    pub macd_hist: f32,
    pub adx: f32,
    pub bb_pctb: f32,
    pub stoch_k: f32,
    pub atr_pct: f32,
    pub volume_ratio: f32,
    pub mtf_score: f32,
    pub sentiment_score: f32,
    pub fear_greed: f32,
    pub order_flow_score: f32,
    pub macro_score: f32,
    pub confidence: f32,
    pub tier_numeric: f32,
    pub is_crypto: f32,
}

impl FeatureVector {
    /// 스캔 컨텍스트에서 feature vector를 조립합니다.
    ///
    /// 누락된 선택적 입력은 중립값으로 치환합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        features: &FeatureSnapshot,
        tier: Option<SignalTier>,
        timeframe: Option<&TimeframeAgreement>,
        sentiment: Option<&SentimentSnapshot>,
        order_flow: Option<&OrderFlowSummary>,
        macro_regime: Option<MacroRegime>,
        fear_greed: i32,
        confidence: i32,
        is_crypto: bool,
    ) -> Self {
        let atr_pct = if features.price > rust_decimal::Decimal::ZERO {
            (features.atr / features.price).to_f64().unwrap_or(0.0) * 100.0
        } else {
            0.0
        };

        let order_flow_score = match order_flow {
            Some(flow) => match flow.direction {
                Direction::Buy => flow.score,
                Direction::Sell => -flow.score,
                Direction::Neutral => 0.0,
            },
            None => 0.0,
        };

        let macro_score = match macro_regime {
            Some(MacroRegime::Allow) => 1.0,
            Some(MacroRegime::Caution) => 0.5,
            Some(MacroRegime::Block) => 0.0,
            None => 0.5,
        };

        Self {
            rsi: features.rsi as f32,
            macd_hist: features.macd_hist as f32,
            adx: features.adx as f32,
            bb_pctb: features.bb_pctb as f32,
            stoch_k: features.stoch_k as f32,
            atr_pct: atr_pct as f32,
            volume_ratio: features.volume_ratio as f32,
            mtf_score: timeframe.map(|t| t.confluence_score).unwrap_or(0.0) as f32,
            sentiment_score: sentiment.map(|s| s.score).unwrap_or(0.0) as f32,
            fear_greed: fear_greed as f32,
            order_flow_score: order_flow_score as f32,
            macro_score: macro_score as f32,
            confidence: confidence as f32,
            tier_numeric: tier.map(|t| t.number() as f32).unwrap_or(0.0),
            is_crypto: if is_crypto { 1.0 } else { 0.0 },
        }
    }

    /// 모델 입력 순서대로 배열을 반환합니다.
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.rsi,
            self.macd_hist,
            self.adx,
            self.bb_pctb,
            self.stoch_k,
            self.atr_pct,
            self.volume_ratio,
            self.mtf_score,
            self.sentiment_score,
            self.fear_greed,
            self.order_flow_score,
            self.macro_score,
            self.confidence,
            self.tier_numeric,
            self.is_crypto,
        ]
    }

    /// 모든 feature가 유한한 수치인지 검증합니다.
    pub fn validate(&self) -> MlResult<()> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(MlError::InvalidInput(format!(
                    "Non-finite feature value: {}",
                    name
                )));
            }
        }
        Ok(())
    }
}
