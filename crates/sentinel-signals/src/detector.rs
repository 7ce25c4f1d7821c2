//! 시그널 탐지기.
//!
//! 지표 스냅샷에 대해 고정된 검사 배터리를 수행해 방향별 근거를
//! 수집하고, 우세한 쪽의 근거 수와 거래량/타임프레임 확인으로
//! 티어를 배정합니다. 순수 함수이며 비정상 입력은 중립을 반환합니다.

use tracing::debug;

use sentinel_core::{
    Direction, Divergence, FeatureSnapshot, FvgFibConfluence, MaCross, MacdCross, ObvTrend,
    OrderFlowSummary, Signal, SignalTier, TimeframeAgreement,
};

use crate::config::DetectorConfig;

/// 시그널 탐지기.
#[derive(Debug, Clone, Default)]
pub struct SignalDetector {
    config: DetectorConfig,
}

impl SignalDetector {
    /// 주어진 설정으로 탐지기를 생성합니다.
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// 지표 스냅샷에서 방향성 시그널을 탐지합니다.
    pub fn detect(
        &self,
        features: &FeatureSnapshot,
        timeframe: Option<&TimeframeAgreement>,
        order_flow: Option<&OrderFlowSummary>,
    ) -> Signal {
        if !features.has_valid_price() {
            return Signal::neutral();
        }
        let features = features.sanitized();

        let mut buy_reasons: Vec<String> = Vec::new();
        let mut sell_reasons: Vec<String> = Vec::new();

        // Check 1: RSI 극단
        if features.rsi <= 30.0 {
            buy_reasons.push(format!("RSI deeply oversold ({:.1})", features.rsi));
        } else if features.rsi <= 40.0 {
            buy_reasons.push(format!("RSI oversold ({:.1})", features.rsi));
        } else if features.rsi >= 70.0 {
            sell_reasons.push(format!("RSI deeply overbought ({:.1})", features.rsi));
        } else if features.rsi >= 60.0 {
            sell_reasons.push(format!("RSI overbought ({:.1})", features.rsi));
        }

        // Check 2: MACD 크로스오버 또는 히스토그램
        match features.macd_crossover {
            Some(MacdCross::Bullish) => buy_reasons.push("MACD bullish crossover".to_string()),
            Some(MacdCross::Bearish) => sell_reasons.push("MACD bearish crossover".to_string()),
            None => {
                if features.macd_hist > 0.0 {
                    buy_reasons.push("MACD histogram positive".to_string());
                } else if features.macd_hist < 0.0 {
                    sell_reasons.push("MACD histogram negative".to_string());
                }
            }
        }

        // Check 3: 볼린저 밴드 위치
        if features.bb_pctb < 0.0 {
            buy_reasons.push("Price below lower band".to_string());
        } else if features.bb_pctb < 0.20 {
            buy_reasons.push("Price near lower band".to_string());
        } else if features.bb_pctb > 1.0 {
            sell_reasons.push("Price above upper band".to_string());
        } else if features.bb_pctb > 0.80 {
            sell_reasons.push("Price near upper band".to_string());
        }

        // Check 4: 스토캐스틱 극단
        if features.stoch_k <= 25.0 {
            buy_reasons.push(format!("Stochastic oversold ({:.1})", features.stoch_k));
        } else if features.stoch_k >= 75.0 {
            sell_reasons.push(format!("Stochastic overbought ({:.1})", features.stoch_k));
        }

        // Check 5: ADX 추세 강도 + DI 방향
        if features.adx > 20.0 {
            if features.plus_di > features.minus_di {
                buy_reasons.push(format!("Uptrend strength (ADX {:.1})", features.adx));
            } else if features.minus_di > features.plus_di {
                sell_reasons.push(format!("Downtrend strength (ADX {:.1})", features.adx));
            }
        }

        // Check 6: EMA 스택
        let price = features.price;
        if price > features.ema9 && features.ema9 > features.ema21 && features.ema21 > features.ema50
        {
            buy_reasons.push("Full bullish EMA stack".to_string());
        } else if price < features.ema9
            && features.ema9 < features.ema21
            && features.ema21 < features.ema50
        {
            sell_reasons.push("Full bearish EMA stack".to_string());
        } else if price > features.ema21 {
            buy_reasons.push("Price above EMA21".to_string());
        } else if price < features.ema21 {
            sell_reasons.push("Price below EMA21".to_string());
        }

        // Check 7: 골든/데드 크로스
        match features.ma_cross {
            Some(MaCross::Golden) => buy_reasons.push("Golden cross".to_string()),
            Some(MaCross::Death) => sell_reasons.push("Death cross".to_string()),
            None => {}
        }

        // Check 8: 타임프레임 합류
        if let Some(tfa) = timeframe {
            if tfa.confluence_score >= self.config.mtf_min_confluence {
                match tfa.dominant {
                    Direction::Buy => buy_reasons.push(format!(
                        "Timeframe confluence {}/{} bullish",
                        tfa.aligned, tfa.total
                    )),
                    Direction::Sell => sell_reasons.push(format!(
                        "Timeframe confluence {}/{} bearish",
                        tfa.aligned, tfa.total
                    )),
                    Direction::Neutral => {}
                }
            }
        }

        // Check 9: 주문 흐름 방향
        if let Some(flow) = order_flow {
            match flow.direction {
                Direction::Buy => buy_reasons.push("Order flow buying pressure".to_string()),
                Direction::Sell => sell_reasons.push("Order flow selling pressure".to_string()),
                Direction::Neutral => {}
            }
        }

        // Check 10: FVG + 피보나치 합류 (황금 비율은 근거 2개)
        if let Some(FvgFibConfluence {
            direction,
            golden_ratio,
        }) = features.fvg_fib
        {
            let side = match direction {
                Direction::Buy => Some(&mut buy_reasons),
                Direction::Sell => Some(&mut sell_reasons),
                Direction::Neutral => None,
            };
            if let Some(reasons) = side {
                reasons.push("FVG + Fibonacci confluence".to_string());
                if golden_ratio {
                    reasons.push("Golden ratio retracement".to_string());
                }
            }
        }

        // Check 11: OBV는 현재 우세한 쪽에만 추가
        if buy_reasons.len() > sell_reasons.len() && features.obv_trend == ObvTrend::Rising {
            buy_reasons.push("OBV rising".to_string());
        } else if sell_reasons.len() > buy_reasons.len() && features.obv_trend == ObvTrend::Falling
        {
            sell_reasons.push("OBV falling".to_string());
        }

        let volume_confirmed = features.volume_ratio >= self.config.volume_confirm_ratio;
        let mtf_aligned = |direction: Direction| {
            timeframe
                .map(|tfa| tfa.supports(direction))
                .unwrap_or(false)
        };

        let (direction, reasons) = if buy_reasons.len() > sell_reasons.len()
            && buy_reasons.len() >= 2
        {
            (Direction::Buy, buy_reasons)
        } else if sell_reasons.len() > buy_reasons.len() && sell_reasons.len() >= 2 {
            (Direction::Sell, sell_reasons)
        } else {
            // 동점이거나 근거 부족: 다이버전스 폴백
            return self.divergence_fallback(&features);
        };

        let golden_confluence = features
            .fvg_fib
            .map(|c| c.direction == direction && c.golden_ratio)
            .unwrap_or(false);
        let any_confluence = features
            .fvg_fib
            .map(|c| c.direction == direction)
            .unwrap_or(false);

        let count = reasons.len();
        let tier = if count >= 5 && volume_confirmed && mtf_aligned(direction) {
            SignalTier::Extreme
        } else if count >= 4 && (volume_confirmed || mtf_aligned(direction)) {
            SignalTier::Strong
        } else if count >= 3 || (count >= 2 && golden_confluence) {
            SignalTier::Moderate
        } else if count >= 2 || (count >= 1 && any_confluence) {
            SignalTier::Speculative
        } else {
            SignalTier::Weak
        };

        debug!(
            %direction,
            %tier,
            reason_count = count,
            volume_confirmed,
            "Signal detected"
        );

        Signal::directional(direction, tier, reasons)
    }

    /// 주 배터리가 중립일 때 다이버전스만으로 약한 시그널을 생성합니다.
    fn divergence_fallback(&self, features: &FeatureSnapshot) -> Signal {
        match features.divergence {
            Some(Divergence::Bullish) => Signal::directional(
                Direction::Buy,
                SignalTier::Divergence,
                vec!["Bullish price/oscillator divergence".to_string()],
            ),
            Some(Divergence::Bearish) => Signal::directional(
                Direction::Sell,
                SignalTier::Divergence,
                vec!["Bearish price/oscillator divergence".to_string()],
            ),
            None => Signal::neutral(),
        }
    }
}
