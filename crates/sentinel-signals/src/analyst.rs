//! 외부 시장 분석가 연동.
//!
//! 분석가는 파이프라인 밖의 선택적 보조 의견입니다. 원격 분석가가
//! 요청 한도에 걸리면 안내된 대기 시간만큼 백오프 후 재시도하고,
//! 재시도가 소진되면 규칙 기반 분석가로 영구 전환합니다. 전환 후
//! 원격 호출은 더 이상 시도하지 않습니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sentinel_core::{Direction, FeatureSnapshot, SentinelError, SentinelResult};

/// 요청 한도 메시지에 대기 시간이 없을 때의 기본 백오프 (초).
const DEFAULT_BACKOFF_SECS: u64 = 60;

/// 요청 한도 재시도 횟수.
const MAX_ATTEMPTS: u32 = 3;

/// 분석가의 시장 평가.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAssessment {
    /// 제안 방향
    pub direction: Direction,
    /// 확신도 (0-100)
    pub conviction: f64,
    /// 평가 근거
    pub rationale: String,
}

/// 시장 분석가 포트.
#[async_trait]
pub trait MarketAnalyst: Send + Sync {
    /// 종목의 지표 스냅샷을 평가합니다.
    async fn analyze(
        &self,
        symbol: &str,
        features: &FeatureSnapshot,
    ) -> SentinelResult<MarketAssessment>;

    /// 분석가 이름을 반환합니다.
    fn name(&self) -> &str;
}

/// 원격 분석가 없이 동작하는 규칙 기반 분석가.
///
/// 지표 몇 개로 방향과 확신도를 낸 단순 휴리스틱이며, 원격
/// 분석가의 폴백으로만 쓰입니다.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedAnalyst;

#[async_trait]
impl MarketAnalyst for RuleBasedAnalyst {
    async fn analyze(
        &self,
        _symbol: &str,
        features: &FeatureSnapshot,
    ) -> SentinelResult<MarketAssessment> {
        let features = features.sanitized();
        let mut bias = 0.0f64;

        if features.rsi <= 35.0 {
            bias += 1.0;
        } else if features.rsi >= 65.0 {
            bias -= 1.0;
        }
        if features.macd_hist > 0.0 {
            bias += 1.0;
        } else if features.macd_hist < 0.0 {
            bias -= 1.0;
        }
        if features.price > features.ema21 {
            bias += 0.5;
        } else if features.price < features.ema21 {
            bias -= 0.5;
        }

        let (direction, rationale) = if bias >= 1.0 {
            (Direction::Buy, "Oversold with improving momentum")
        } else if bias <= -1.0 {
            (Direction::Sell, "Overbought with fading momentum")
        } else {
            (Direction::Neutral, "No clear rule-based edge")
        };
        let conviction = (bias.abs() * 20.0).min(60.0);

        Ok(MarketAssessment {
            direction,
            conviction,
            rationale: rationale.to_string(),
        })
    }

    fn name(&self) -> &str {
        "rule_based"
    }
}

/// 요청 한도 백오프와 영구 폴백을 제공하는 분석가 래퍼.
pub struct RetryingAnalyst {
    primary: Arc<dyn MarketAnalyst>,
    fallback: RuleBasedAnalyst,
    failed_over: AtomicBool,
}

impl RetryingAnalyst {
    /// 원격 분석가를 감싸는 래퍼를 생성합니다.
    pub fn new(primary: Arc<dyn MarketAnalyst>) -> Self {
        Self {
            primary,
            fallback: RuleBasedAnalyst,
            failed_over: AtomicBool::new(false),
        }
    }

    /// 규칙 기반 분석가로 영구 전환되었는지 확인합니다.
    pub fn is_failed_over(&self) -> bool {
        self.failed_over.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MarketAnalyst for RetryingAnalyst {
    async fn analyze(
        &self,
        symbol: &str,
        features: &FeatureSnapshot,
    ) -> SentinelResult<MarketAssessment> {
        if self.failed_over.load(Ordering::Relaxed) {
            return self.fallback.analyze(symbol, features).await;
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match self.primary.analyze(symbol, features).await {
                Ok(assessment) => return Ok(assessment),
                Err(SentinelError::RateLimit(message)) => {
                    let wait_secs =
                        parse_retry_after_secs(&message).unwrap_or(DEFAULT_BACKOFF_SECS);
                    if attempt == MAX_ATTEMPTS {
                        warn!(
                            analyst = self.primary.name(),
                            attempts = MAX_ATTEMPTS,
                            "Rate limit retries exhausted, failing over permanently"
                        );
                        self.failed_over.store(true, Ordering::Relaxed);
                        return self.fallback.analyze(symbol, features).await;
                    }
                    info!(
                        analyst = self.primary.name(),
                        attempt,
                        wait_secs,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                }
                Err(e) => {
                    // 한도 외 에러는 이번 호출만 폴백으로 처리합니다.
                    warn!(
                        analyst = self.primary.name(),
                        error = %e,
                        "Analyst call failed, using rule-based fallback for this call"
                    );
                    return self.fallback.analyze(symbol, features).await;
                }
            }
        }

        self.fallback.analyze(symbol, features).await
    }

    fn name(&self) -> &str {
        if self.is_failed_over() {
            self.fallback.name()
        } else {
            self.primary.name()
        }
    }
}

/// 한도 메시지에서 대기 시간(초)을 파싱합니다.
///
/// "retry after 30s" 같은 형태에서 첫 번째 정수를 취합니다.
fn parse_retry_after_secs(message: &str) -> Option<u64> {
    let digits: String = message
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|&secs| secs > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sentinel_core::{ObvTrend, SupportResistance};
    use std::sync::atomic::AtomicU32;

    fn oversold_snapshot() -> FeatureSnapshot {
        FeatureSnapshot {
            price: dec!(100),
            rsi: 30.0,
            macd_hist: 0.5,
            macd_crossover: None,
            bb_pctb: 0.2,
            bb_upper: dec!(104),
            bb_lower: dec!(96),
            stoch_k: 25.0,
            stoch_d: 28.0,
            adx: 25.0,
            plus_di: 28.0,
            minus_di: 15.0,
            volume_ratio: 1.4,
            ma_cross: None,
            obv_trend: ObvTrend::Rising,
            ema9: dec!(99.5),
            ema21: dec!(99),
            ema50: dec!(98),
            atr: dec!(2),
            price_change_pct: 0.5,
            divergence: None,
            fvg_fib: None,
            support_resistance: SupportResistance::default(),
        }
    }

    /// 지정된 횟수만큼 한도 에러를 내고 이후 성공하는 분석가.
    struct FlakyAnalyst {
        calls: AtomicU32,
        rate_limited_calls: u32,
    }

    impl FlakyAnalyst {
        fn new(rate_limited_calls: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                rate_limited_calls,
            }
        }
    }

    #[async_trait]
    impl MarketAnalyst for FlakyAnalyst {
        async fn analyze(
            &self,
            _symbol: &str,
            _features: &FeatureSnapshot,
        ) -> SentinelResult<MarketAssessment> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.rate_limited_calls {
                return Err(SentinelError::RateLimit(
                    "retry after 30s".to_string(),
                ));
            }
            Ok(MarketAssessment {
                direction: Direction::Buy,
                conviction: 75.0,
                rationale: "remote assessment".to_string(),
            })
        }

        fn name(&self) -> &str {
            "flaky_remote"
        }
    }

    struct AlwaysBroken;

    #[async_trait]
    impl MarketAnalyst for AlwaysBroken {
        async fn analyze(
            &self,
            _symbol: &str,
            _features: &FeatureSnapshot,
        ) -> SentinelResult<MarketAssessment> {
            Err(SentinelError::Analyst("upstream 500".to_string()))
        }

        fn name(&self) -> &str {
            "broken_remote"
        }
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after_secs("retry after 30s"), Some(30));
        assert_eq!(parse_retry_after_secs("rate limited, wait 5 seconds"), Some(5));
        assert_eq!(parse_retry_after_secs("too many requests"), None);
        assert_eq!(parse_retry_after_secs("wait 0s"), None);
    }

    #[tokio::test]
    async fn test_rule_based_buy_on_oversold() {
        let analyst = RuleBasedAnalyst;
        let assessment = analyst.analyze("BTC/USDT", &oversold_snapshot()).await.unwrap();

        assert_eq!(assessment.direction, Direction::Buy);
        assert!(assessment.conviction > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_backoff() {
        let remote = Arc::new(FlakyAnalyst::new(2));
        let analyst = RetryingAnalyst::new(remote);

        let assessment = analyst
            .analyze("BTC/USDT", &oversold_snapshot())
            .await
            .unwrap();

        // 두 번 한도에 걸린 뒤 세 번째 시도에서 성공
        assert_eq!(assessment.rationale, "remote assessment");
        assert!(!analyst.is_failed_over());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fail_over_permanently() {
        let remote = Arc::new(FlakyAnalyst::new(10));
        let analyst = RetryingAnalyst::new(remote.clone());

        let assessment = analyst
            .analyze("BTC/USDT", &oversold_snapshot())
            .await
            .unwrap();

        assert!(analyst.is_failed_over());
        assert_eq!(assessment.rationale, "Oversold with improving momentum");
        assert_eq!(analyst.name(), "rule_based");

        // 전환 후에는 원격 분석가를 다시 호출하지 않는다
        let calls_before = remote.calls.load(Ordering::SeqCst);
        let _ = analyst.analyze("BTC/USDT", &oversold_snapshot()).await.unwrap();
        assert_eq!(remote.calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn test_non_rate_limit_error_falls_back_once() {
        let analyst = RetryingAnalyst::new(Arc::new(AlwaysBroken));

        let assessment = analyst
            .analyze("BTC/USDT", &oversold_snapshot())
            .await
            .unwrap();

        assert_eq!(assessment.direction, Direction::Buy);
        // 일시 폴백이므로 영구 전환은 아니다
        assert!(!analyst.is_failed_over());
    }
}
