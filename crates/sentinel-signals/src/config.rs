//! 시그널 파이프라인 설정.
//!
//! 탐지기, 필터, 점수기, 합의 엔진, 정밀 게이트, 파이프라인의
//! 설정 구조체를 정의합니다.

use serde::{Deserialize, Serialize};

use sentinel_core::{SentinelError, SentinelResult};

/// 시그널 탐지기 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// 거래량 확인 판정 비율 (기본값: 1.2)
    #[serde(default = "default_volume_confirm_ratio")]
    pub volume_confirm_ratio: f64,

    /// MTF 근거 채택에 필요한 최소 합류 점수 (기본값: 20)
    #[serde(default = "default_mtf_min_confluence")]
    pub mtf_min_confluence: f64,
}

fn default_volume_confirm_ratio() -> f64 {
    1.2
}

fn default_mtf_min_confluence() -> f64 {
    20.0
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            volume_confirm_ratio: default_volume_confirm_ratio(),
            mtf_min_confluence: default_mtf_min_confluence(),
        }
    }
}

/// 프리트레이드 필터 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 요구되는 최소 세션 품질 (기본값: 3)
    #[serde(default = "default_min_session_quality")]
    pub min_session_quality: u8,

    /// 침체장 판정 밴드 폭 비율 (기본값: 1.0%)
    #[serde(default = "default_quiet_band_width_ratio")]
    pub quiet_band_width_ratio: f64,

    /// 침체장 판정 ADX 상한 (기본값: 20)
    #[serde(default = "default_quiet_adx")]
    pub quiet_adx: f64,

    /// 뉴스 전후 차단 시간 (기본값: 30분)
    #[serde(default = "default_news_blackout_minutes")]
    pub news_blackout_minutes: i64,
}

fn default_min_session_quality() -> u8 {
    3
}

fn default_quiet_band_width_ratio() -> f64 {
    0.010
}

fn default_quiet_adx() -> f64 {
    20.0
}

fn default_news_blackout_minutes() -> i64 {
    30
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_session_quality: default_min_session_quality(),
            quiet_band_width_ratio: default_quiet_band_width_ratio(),
            quiet_adx: default_quiet_adx(),
            news_blackout_minutes: default_news_blackout_minutes(),
        }
    }
}

/// 신뢰도 점수기 설정 (컴포넌트별 가중치, 합 100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// 기술 지표 가중치 (기본값: 40)
    #[serde(default = "default_technical_weight")]
    pub technical_weight: f64,

    /// 타임프레임 합류 가중치 (기본값: 20)
    #[serde(default = "default_mtf_weight")]
    pub mtf_weight: f64,

    /// 거래량 가중치 (기본값: 15)
    #[serde(default = "default_volume_weight")]
    pub volume_weight: f64,

    /// 모멘텀 가중치 (기본값: 5)
    #[serde(default = "default_momentum_weight")]
    pub momentum_weight: f64,

    /// 감성 가중치 (기본값: 5)
    #[serde(default = "default_sentiment_weight")]
    pub sentiment_weight: f64,

    /// 주문 흐름 가중치 (기본값: 10)
    #[serde(default = "default_order_flow_weight")]
    pub order_flow_weight: f64,

    /// 매크로 가중치 (기본값: 5)
    #[serde(default = "default_macro_weight")]
    pub macro_weight: f64,
}

fn default_technical_weight() -> f64 {
    40.0
}

fn default_mtf_weight() -> f64 {
    20.0
}

fn default_volume_weight() -> f64 {
    15.0
}

fn default_momentum_weight() -> f64 {
    5.0
}

fn default_sentiment_weight() -> f64 {
    5.0
}

fn default_order_flow_weight() -> f64 {
    10.0
}

fn default_macro_weight() -> f64 {
    5.0
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            technical_weight: default_technical_weight(),
            mtf_weight: default_mtf_weight(),
            volume_weight: default_volume_weight(),
            momentum_weight: default_momentum_weight(),
            sentiment_weight: default_sentiment_weight(),
            order_flow_weight: default_order_flow_weight(),
            macro_weight: default_macro_weight(),
        }
    }
}

impl ScorerConfig {
    /// 가중치 합을 반환합니다.
    pub fn weight_sum(&self) -> f64 {
        self.technical_weight
            + self.mtf_weight
            + self.volume_weight
            + self.momentum_weight
            + self.sentiment_weight
            + self.order_flow_weight
            + self.macro_weight
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> SentinelResult<()> {
        if (self.weight_sum() - 100.0).abs() > 0.01 {
            return Err(SentinelError::Config(
                "scorer weights must sum to 100".into(),
            ));
        }
        Ok(())
    }
}

/// 합의 엔진 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// 통과에 필요한 최소 찬성 표 (기본값: 8)
    #[serde(default = "default_required_for")]
    pub required_for: u32,

    /// 허용되는 최대 반대 표 (기본값: 1)
    #[serde(default = "default_max_against")]
    pub max_against: u32,
}

fn default_required_for() -> u32 {
    8
}

fn default_max_against() -> u32 {
    1
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            required_for: default_required_for(),
            max_against: default_max_against(),
        }
    }
}

/// 정밀 게이트 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// 최소 ADX (기본값: 25)
    #[serde(default = "default_min_adx")]
    pub min_adx: f64,

    /// 최소 거래량 비율 (기본값: 1.5)
    #[serde(default = "default_min_volume_ratio")]
    pub min_volume_ratio: f64,

    /// 방향 일치에 필요한 최소 타임프레임 수 (기본값: 3)
    #[serde(default = "default_min_mtf_aligned")]
    pub min_mtf_aligned: u32,

    /// 최소 신뢰도 (기본값: 80, A등급만)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: i32,

    /// 1차 목표 기준 최소 손익비 (기본값: 2.5)
    #[serde(default = "default_min_reward_risk")]
    pub min_reward_risk: f64,

    /// EMA21 대비 최대 이격 ATR 배수 (기본값: 2.5)
    #[serde(default = "default_max_ema_distance_atr")]
    pub max_ema_distance_atr: f64,

    /// 매수 시 최대 %B (기본값: 0.35)
    #[serde(default = "default_max_pctb_buy")]
    pub max_pctb_buy: f64,

    /// 매도 시 최소 %B (기본값: 0.65)
    #[serde(default = "default_min_pctb_sell")]
    pub min_pctb_sell: f64,

    /// 최소 밴드 폭 비율 (기본값: 1.5%)
    #[serde(default = "default_min_band_width_ratio")]
    pub min_band_width_ratio: f64,

    /// 방향 역행 펀딩 한계 (%) (기본값: 2.0)
    #[serde(default = "default_max_funding_against_pct")]
    pub max_funding_against_pct: f64,

    /// 진입 정밀도: EMA 풀백 허용 ATR 배수 (기본값: 0.6)
    #[serde(default = "default_pullback_atr")]
    pub pullback_atr: f64,

    /// 진입 정밀도: 지지/저항 근접 허용 ATR 배수 (기본값: 0.7)
    #[serde(default = "default_sr_proximity_atr")]
    pub sr_proximity_atr: f64,
}

fn default_min_adx() -> f64 {
    25.0
}

fn default_min_volume_ratio() -> f64 {
    1.5
}

fn default_min_mtf_aligned() -> u32 {
    3
}

fn default_min_confidence() -> i32 {
    80
}

fn default_min_reward_risk() -> f64 {
    2.5
}

fn default_max_ema_distance_atr() -> f64 {
    2.5
}

fn default_max_pctb_buy() -> f64 {
    0.35
}

fn default_min_pctb_sell() -> f64 {
    0.65
}

fn default_min_band_width_ratio() -> f64 {
    0.015
}

fn default_max_funding_against_pct() -> f64 {
    2.0
}

fn default_pullback_atr() -> f64 {
    0.6
}

fn default_sr_proximity_atr() -> f64 {
    0.7
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_adx: default_min_adx(),
            min_volume_ratio: default_min_volume_ratio(),
            min_mtf_aligned: default_min_mtf_aligned(),
            min_confidence: default_min_confidence(),
            min_reward_risk: default_min_reward_risk(),
            max_ema_distance_atr: default_max_ema_distance_atr(),
            max_pctb_buy: default_max_pctb_buy(),
            min_pctb_sell: default_min_pctb_sell(),
            min_band_width_ratio: default_min_band_width_ratio(),
            max_funding_against_pct: default_max_funding_against_pct(),
            pullback_atr: default_pullback_atr(),
            sr_proximity_atr: default_sr_proximity_atr(),
        }
    }
}

/// 결정 파이프라인 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 기본 신뢰도 임계값 (적응형 조정의 기준, 기본값: 70)
    #[serde(default = "default_base_confidence_threshold")]
    pub base_confidence_threshold: i32,
}

fn default_base_confidence_threshold() -> i32 {
    70
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_confidence_threshold: default_base_confidence_threshold(),
        }
    }
}
