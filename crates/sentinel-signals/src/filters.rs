//! 프리트레이드 필터.
//!
//! 탐지된 시그널을 점수화 전에 걸러냅니다. 세션 품질, 침체장,
//! 뉴스 블랙아웃 중 하나라도 걸리면 시그널은 차단 사유를 담은
//! 중립으로 강등됩니다.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentinel_core::{FeatureSnapshot, Signal};

use crate::config::FilterConfig;

/// 예정된 거시 뉴스 이벤트.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsEvent {
    /// 이벤트 이름 (예: "FOMC")
    pub name: String,
    /// 발표 시각 (UTC)
    pub at: DateTime<Utc>,
}

/// 뉴스 이벤트 일정.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsCalendar {
    pub events: Vec<NewsEvent>,
}

impl NewsCalendar {
    pub fn new(events: Vec<NewsEvent>) -> Self {
        Self { events }
    }

    /// 주어진 시각이 블랙아웃 윈도우 안에 있으면 해당 이벤트를 반환합니다.
    pub fn active_blackout(&self, now: DateTime<Utc>, blackout: Duration) -> Option<&NewsEvent> {
        self.events
            .iter()
            .find(|event| (event.at - now).abs() <= blackout)
    }
}

/// 프리트레이드 필터 묶음.
#[derive(Debug, Clone, Default)]
pub struct PreTradeFilters {
    config: FilterConfig,
}

impl PreTradeFilters {
    /// 주어진 설정으로 필터를 생성합니다.
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// UTC 시각에 대한 세션 품질 점수를 반환합니다 (0-6).
    ///
    /// 런던/뉴욕 겹침 구간이 가장 좋고, 아시아 새벽이 가장 나쁩니다.
    pub fn session_quality(&self, now: DateTime<Utc>) -> u8 {
        match now.hour() {
            13..=15 => 6, // 런던/뉴욕 겹침
            2..=4 => 5,   // 런던 세션
            0..=1 => 3,   // 아시아 새벽
            _ => 2,
        }
    }

    /// 침체장 여부를 판정합니다.
    ///
    /// 밴드 폭과 ADX가 동시에 낮을 때만 침체장으로 봅니다.
    pub fn is_quiet_market(&self, features: &FeatureSnapshot) -> bool {
        features.band_width_ratio() < self.config.quiet_band_width_ratio
            && features.adx < self.config.quiet_adx
    }

    /// 방향성 시그널에 필터를 적용합니다.
    ///
    /// 하나라도 걸리면 사유를 담은 중립 시그널을 반환합니다.
    pub fn apply(
        &self,
        signal: Signal,
        features: &FeatureSnapshot,
        calendar: Option<&NewsCalendar>,
        now: DateTime<Utc>,
    ) -> Signal {
        if !signal.is_actionable() {
            return signal;
        }

        let quality = self.session_quality(now);
        if quality < self.config.min_session_quality {
            debug!(quality, hour = now.hour(), "Signal blocked by session filter");
            return Signal::neutral_with_reasons(vec![format!(
                "Session quality {} below minimum {}",
                quality, self.config.min_session_quality
            )]);
        }

        if self.is_quiet_market(features) {
            debug!(
                band_width_ratio = features.band_width_ratio(),
                adx = features.adx,
                "Signal blocked by quiet market filter"
            );
            return Signal::neutral_with_reasons(vec![
                "Quiet market: narrow bands and weak trend".to_string(),
            ]);
        }

        if let Some(calendar) = calendar {
            let blackout = Duration::minutes(self.config.news_blackout_minutes);
            if let Some(event) = calendar.active_blackout(now, blackout) {
                debug!(event = %event.name, "Signal blocked by news blackout");
                return Signal::neutral_with_reasons(vec![format!(
                    "News blackout: {} within {} minutes",
                    event.name, self.config.news_blackout_minutes
                )]);
            }
        }

        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use sentinel_core::{Direction, SignalTier};

    fn trending_snapshot() -> FeatureSnapshot {
        FeatureSnapshot {
            price: dec!(100),
            rsi: 50.0,
            macd_hist: 0.0,
            macd_crossover: None,
            bb_pctb: 0.5,
            bb_upper: dec!(104),
            bb_lower: dec!(96),
            stoch_k: 50.0,
            stoch_d: 50.0,
            adx: 28.0,
            plus_di: 20.0,
            minus_di: 20.0,
            volume_ratio: 1.0,
            ma_cross: None,
            obv_trend: Default::default(),
            ema9: dec!(100),
            ema21: dec!(100),
            ema50: dec!(100),
            atr: dec!(2),
            price_change_pct: 0.0,
            divergence: None,
            fvg_fib: None,
            support_resistance: sentinel_core::SupportResistance::default(),
        }
    }

    fn buy_signal() -> Signal {
        Signal::directional(
            Direction::Buy,
            SignalTier::Strong,
            vec!["test".to_string()],
        )
    }

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_session_quality_ranking() {
        let filters = PreTradeFilters::default();
        assert_eq!(filters.session_quality(at_hour(14)), 6);
        assert_eq!(filters.session_quality(at_hour(3)), 5);
        assert_eq!(filters.session_quality(at_hour(1)), 3);
        assert_eq!(filters.session_quality(at_hour(17)), 2);
        assert_eq!(filters.session_quality(at_hour(22)), 2);
    }

    #[test]
    fn test_late_ny_hours_block() {
        // 16시 이후는 겹침 구간이 끝나 기본 품질(2)로 떨어진다
        let filters = PreTradeFilters::default();
        for hour in 16..=19 {
            let signal = filters.apply(buy_signal(), &trending_snapshot(), None, at_hour(hour));
            assert_eq!(signal.direction, Direction::Neutral, "hour {}", hour);
            assert!(signal.reasons[0].contains("Session quality"));
        }
    }

    #[test]
    fn test_good_session_passes() {
        let filters = PreTradeFilters::default();
        let signal = filters.apply(buy_signal(), &trending_snapshot(), None, at_hour(14));
        assert_eq!(signal.direction, Direction::Buy);
    }

    #[test]
    fn test_dead_session_blocks() {
        let filters = PreTradeFilters::default();
        let signal = filters.apply(buy_signal(), &trending_snapshot(), None, at_hour(22));
        assert_eq!(signal.direction, Direction::Neutral);
        assert!(signal.reasons[0].contains("Session quality"));
    }

    #[test]
    fn test_quiet_market_blocks() {
        let filters = PreTradeFilters::default();
        let mut snap = trending_snapshot();
        // 밴드 폭 0.4%, ADX 12: 침체장
        snap.bb_upper = dec!(100.2);
        snap.bb_lower = dec!(99.8);
        snap.adx = 12.0;

        let signal = filters.apply(buy_signal(), &snap, None, at_hour(14));
        assert_eq!(signal.direction, Direction::Neutral);
        assert!(signal.reasons[0].contains("Quiet market"));
    }

    #[test]
    fn test_narrow_bands_with_strong_trend_pass() {
        let filters = PreTradeFilters::default();
        let mut snap = trending_snapshot();
        snap.bb_upper = dec!(100.2);
        snap.bb_lower = dec!(99.8);
        snap.adx = 30.0;

        let signal = filters.apply(buy_signal(), &snap, None, at_hour(14));
        assert_eq!(signal.direction, Direction::Buy);
    }

    #[test]
    fn test_news_blackout_blocks() {
        let filters = PreTradeFilters::default();
        let now = at_hour(14);
        let calendar = NewsCalendar::new(vec![NewsEvent {
            name: "FOMC".to_string(),
            at: now + Duration::minutes(20),
        }]);

        let signal = filters.apply(buy_signal(), &trending_snapshot(), Some(&calendar), now);
        assert_eq!(signal.direction, Direction::Neutral);
        assert!(signal.reasons[0].contains("FOMC"));
    }

    #[test]
    fn test_news_outside_window_passes() {
        let filters = PreTradeFilters::default();
        let now = at_hour(14);
        let calendar = NewsCalendar::new(vec![NewsEvent {
            name: "CPI".to_string(),
            at: now + Duration::minutes(45),
        }]);

        let signal = filters.apply(buy_signal(), &trending_snapshot(), Some(&calendar), now);
        assert_eq!(signal.direction, Direction::Buy);
    }

    #[test]
    fn test_neutral_passes_through_unchanged() {
        let filters = PreTradeFilters::default();
        let signal = filters.apply(Signal::neutral(), &trending_snapshot(), None, at_hour(22));
        assert_eq!(signal.direction, Direction::Neutral);
        assert!(signal.reasons.is_empty());
    }
}
