//! 시장 컨텍스트 값 타입.
//!
//! 외부 지표 수집기가 스캔마다 생성하는 읽기 전용 입력 구조체입니다.
//! 엔진은 지표를 직접 계산하지 않고 이 스냅샷만 소비합니다.
//! 가격/레벨은 `Decimal`, 점수/비율은 `f64`를 사용합니다.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// MACD 크로스오버 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MacdCross {
    /// 상향 돌파
    Bullish,
    /// 하향 돌파
    Bearish,
}

/// 이동평균 교차 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaCross {
    /// 골든 크로스
    Golden,
    /// 데드 크로스
    Death,
}

/// OBV(On-Balance Volume) 추세.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObvTrend {
    /// 상승
    Rising,
    /// 하락
    Falling,
    /// 횡보
    Flat,
}

impl Default for ObvTrend {
    fn default() -> Self {
        Self::Flat
    }
}

/// 가격/오실레이터 다이버전스.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Divergence {
    /// 강세 다이버전스
    Bullish,
    /// 약세 다이버전스
    Bearish,
}

/// FVG + 피보나치 되돌림 합류 보너스.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FvgFibConfluence {
    /// 합류가 지지하는 방향
    pub direction: Direction,
    /// 황금 비율(0.618) 되돌림 여부
    pub golden_ratio: bool,
}

/// 지지/저항 레벨. 가까운 순서입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    /// 첫 번째 지지선
    pub support1: Option<Decimal>,
    /// 두 번째 지지선
    pub support2: Option<Decimal>,
    /// 첫 번째 저항선
    pub resistance1: Option<Decimal>,
    /// 두 번째 저항선
    pub resistance2: Option<Decimal>,
}

/// 한 스캔 사이클의 지표 스냅샷.
///
/// 외부 수집기가 생성하며 엔진의 모든 컴포넌트가 읽기 전용으로
/// 소비합니다. 수치 필드의 검증은 [`FeatureSnapshot::sanitized`]에서
/// 한 번만 수행합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    /// 현재 가격
    pub price: Decimal,
    /// RSI (0-100)
    pub rsi: f64,
    /// MACD 히스토그램
    pub macd_hist: f64,
    /// MACD 크로스오버 (없으면 None)
    pub macd_crossover: Option<MacdCross>,
    /// 볼린저 밴드 %B
    pub bb_pctb: f64,
    /// 볼린저 밴드 상단
    pub bb_upper: Decimal,
    /// 볼린저 밴드 하단
    pub bb_lower: Decimal,
    /// 스토캐스틱 %K
    pub stoch_k: f64,
    /// 스토캐스틱 %D
    pub stoch_d: f64,
    /// ADX 추세 강도
    pub adx: f64,
    /// +DI
    pub plus_di: f64,
    /// -DI
    pub minus_di: f64,
    /// 거래량 비율 (현재/평균)
    pub volume_ratio: f64,
    /// 골든/데드 크로스 (없으면 None)
    pub ma_cross: Option<MaCross>,
    /// OBV 추세
    #[serde(default)]
    pub obv_trend: ObvTrend,
    /// EMA 9
    pub ema9: Decimal,
    /// EMA 21
    pub ema21: Decimal,
    /// EMA 50
    pub ema50: Decimal,
    /// ATR (변동성 단위)
    pub atr: Decimal,
    /// 최근 가격 변화율 (%)
    pub price_change_pct: f64,
    /// 다이버전스 (없으면 None)
    #[serde(default)]
    pub divergence: Option<Divergence>,
    /// FVG + 피보나치 합류 (없으면 None)
    #[serde(default)]
    pub fvg_fib: Option<FvgFibConfluence>,
    /// 지지/저항 레벨
    #[serde(default)]
    pub support_resistance: SupportResistance,
}

impl FeatureSnapshot {
    /// 가격이 유효한지 확인합니다.
    pub fn has_valid_price(&self) -> bool {
        self.price > Decimal::ZERO
    }

    /// 비정상 수치를 안전한 기본값으로 치환한 사본을 반환합니다.
    ///
    /// NaN/Inf 점수는 중립값으로, 0 이하의 ATR은 가격의 1%로
    /// 치환합니다. 가격 자체가 0 이하인 스냅샷은 여기서 고치지
    /// 않으며, 탐지기가 중립으로 처리합니다.
    pub fn sanitized(&self) -> Self {
        let mut snap = self.clone();

        snap.rsi = sanitize_score(snap.rsi, 50.0);
        snap.macd_hist = sanitize_score(snap.macd_hist, 0.0);
        snap.bb_pctb = sanitize_score(snap.bb_pctb, 0.5);
        snap.stoch_k = sanitize_score(snap.stoch_k, 50.0);
        snap.stoch_d = sanitize_score(snap.stoch_d, 50.0);
        snap.adx = sanitize_score(snap.adx, 0.0);
        snap.plus_di = sanitize_score(snap.plus_di, 0.0);
        snap.minus_di = sanitize_score(snap.minus_di, 0.0);
        snap.volume_ratio = sanitize_score(snap.volume_ratio, 1.0);
        snap.price_change_pct = sanitize_score(snap.price_change_pct, 0.0);

        if snap.atr <= Decimal::ZERO && snap.price > Decimal::ZERO {
            // ATR 미산출 시 가격의 1%를 변동성 단위로 사용
            snap.atr = snap.price * Decimal::new(1, 2);
        }

        snap
    }

    /// 볼린저 밴드 폭을 가격 대비 비율로 반환합니다.
    pub fn band_width_ratio(&self) -> f64 {
        if self.price <= Decimal::ZERO {
            return 0.0;
        }
        let width = self.bb_upper - self.bb_lower;
        if width <= Decimal::ZERO {
            return 0.0;
        }
        (width / self.price).to_f64().unwrap_or(0.0)
    }
}

fn sanitize_score(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// 멀티 타임프레임 합의 요약. 외부에서 계산되어 전달됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAgreement {
    /// 우세 방향
    pub dominant: Direction,
    /// 정렬된 타임프레임 수
    pub aligned: u32,
    /// 전체 타임프레임 수
    pub total: u32,
    /// 합류 점수
    pub confluence_score: f64,
}

impl TimeframeAgreement {
    /// 주어진 방향으로 정렬되어 있는지 확인합니다.
    pub fn supports(&self, direction: Direction) -> bool {
        self.dominant == direction && self.aligned > 0
    }
}

/// 주문 흐름 요약.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderFlowSummary {
    /// 우세 방향
    pub direction: Direction,
    /// 흐름 강도 점수 (0-100)
    pub score: f64,
}

/// 감성 점수 스냅샷 (-100 ~ +100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    /// 종합 감성 점수
    pub score: f64,
}

/// 매크로 환경 판정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MacroRegime {
    /// 진입 허용
    Allow,
    /// 주의
    Caution,
    /// 진입 차단
    Block,
}

/// 펀딩 비율 (%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    /// 펀딩 비율 (%, 양수 = 롱 과밀)
    pub rate_pct: f64,
}

/// 호가창 불균형 (매수/매도 잔량 비율).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookImbalance {
    /// 매수 잔량 / 매도 잔량
    pub bid_ask_ratio: f64,
}

/// 온체인 시그널 점수 (-100 ~ +100, 양수 = 매집).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnChainSignal {
    /// 온체인 종합 점수
    pub score: f64,
}

/// 시장 구조 요약 (구조 돌파, 구조 존 근접).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureSummary {
    /// 최근 구조 돌파 방향
    pub break_direction: Option<Direction>,
    /// 지지 존 근접 여부
    pub near_support_zone: bool,
    /// 저항 존 근접 여부
    pub near_resistance_zone: bool,
}

/// 고급 분석 보정치. 각 항목은 적용 시 ±15로 클램프됩니다.
///
/// 구조 돌파/오더 블록/유동성 스윕/볼륨 프로파일 분석은 외부
/// 수집기의 몫이며 엔진은 보정치만 받습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedBoosts {
    /// 구조 돌파 보정
    pub structure_break: f64,
    /// 오더 블록 근접 보정
    pub order_block: f64,
    /// 유동성 스윕 보정
    pub liquidity_sweep: f64,
    /// 볼륨 프로파일 존 보정
    pub volume_profile: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> FeatureSnapshot {
        FeatureSnapshot {
            price: dec!(100),
            rsi: 45.0,
            macd_hist: 0.5,
            macd_crossover: None,
            bb_pctb: 0.4,
            bb_upper: dec!(105),
            bb_lower: dec!(95),
            stoch_k: 40.0,
            stoch_d: 42.0,
            adx: 22.0,
            plus_di: 25.0,
            minus_di: 15.0,
            volume_ratio: 1.3,
            ma_cross: None,
            obv_trend: ObvTrend::Flat,
            ema9: dec!(101),
            ema21: dec!(100),
            ema50: dec!(98),
            atr: dec!(2),
            price_change_pct: 0.8,
            divergence: None,
            fvg_fib: None,
            support_resistance: SupportResistance::default(),
        }
    }

    #[test]
    fn test_sanitized_replaces_nan() {
        let mut snap = snapshot();
        snap.rsi = f64::NAN;
        snap.volume_ratio = f64::INFINITY;

        let clean = snap.sanitized();
        assert_eq!(clean.rsi, 50.0);
        assert_eq!(clean.volume_ratio, 1.0);
    }

    #[test]
    fn test_sanitized_fixes_zero_atr() {
        let mut snap = snapshot();
        snap.atr = Decimal::ZERO;

        let clean = snap.sanitized();
        assert_eq!(clean.atr, dec!(1)); // 가격 100의 1%
    }

    #[test]
    fn test_band_width_ratio() {
        let snap = snapshot();
        // (105 - 95) / 100 = 0.1
        assert!((snap.band_width_ratio() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_timeframe_supports() {
        let tfa = TimeframeAgreement {
            dominant: Direction::Buy,
            aligned: 3,
            total: 4,
            confluence_score: 30.0,
        };
        assert!(tfa.supports(Direction::Buy));
        assert!(!tfa.supports(Direction::Sell));
    }
}
