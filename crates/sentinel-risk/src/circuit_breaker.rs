//! 프로세스 전역 거래 허용 상태 머신.
//!
//! 명시적 플래그(수동 중지, 뉴스 킬, 시장 급락)만 저장하며,
//! 손실 기반 상태는 호출마다 결과 원장에서 다시 계산합니다.
//! 조건이 해소되거나 쿨다운이 지나면 자연히 해제됩니다.
//!
//! 이 컴포넌트의 차단 판정은 에러가 아니라 조언 값입니다. 원장
//! 조회 실패만 하드 에러로 전파됩니다.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sentinel_core::{Direction, OutcomeLedger, SentinelResult};

use crate::config::CircuitBreakerConfig;

/// 서킷브레이커 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// 거래 허용
    TradingAllowed,
    /// 연속 손실로 중지
    PausedConsecutiveLosses,
    /// 일일 손실 한도 초과로 중지
    PausedDailyLoss,
    /// 동시 포지션 한도 도달로 중지
    PausedOpenPositionLimit,
    /// 수동 중지
    PausedManual,
    /// 뉴스 킬 스위치 활성
    PausedNewsWindow,
    /// 시장 급락 감지로 중지
    PausedMarketDump,
}

/// 거래 허용 판정 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDecision {
    /// 거래 허용 여부
    pub allowed: bool,
    /// 현재 상태
    pub state: CircuitState,
    /// 차단 사유 (허용 시 None)
    pub reason: Option<String>,
}

impl CircuitDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            state: CircuitState::TradingAllowed,
            reason: None,
        }
    }

    fn blocked(state: CircuitState, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            state,
            reason: Some(reason.into()),
        }
    }
}

/// 거래 허용 서킷브레이커.
///
/// 플래그 설정은 멱등합니다. 파생 상태는 저장하지 않습니다.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    manually_halted: AtomicBool,
    news_kill_active: AtomicBool,
    market_dump_active: AtomicBool,
}

impl CircuitBreaker {
    /// 주어진 설정으로 서킷브레이커를 생성합니다.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            manually_halted: AtomicBool::new(false),
            news_kill_active: AtomicBool::new(false),
            market_dump_active: AtomicBool::new(false),
        }
    }

    /// 설정을 반환합니다.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// 수동으로 거래를 중지합니다.
    pub fn halt(&self) {
        self.manually_halted.store(true, Ordering::Relaxed);
        info!("Circuit breaker manually halted");
    }

    /// 수동 중지를 해제합니다.
    pub fn resume(&self) {
        self.manually_halted.store(false, Ordering::Relaxed);
        info!("Circuit breaker manually resumed");
    }

    /// 뉴스 킬 스위치를 설정/해제합니다.
    pub fn set_news_kill(&self, active: bool) {
        self.news_kill_active.store(active, Ordering::Relaxed);
        info!(active, "News kill switch updated");
    }

    /// 벤치마크 변동률로 시장 급락 플래그를 갱신합니다.
    ///
    /// 임계값(-5%) 이하이면 플래그를 설정하고, 회복하면 해제합니다.
    pub fn check_market_dump(&self, benchmark_change_pct: f64) {
        let dumping = benchmark_change_pct <= self.config.market_dump_threshold_pct;
        let was = self.market_dump_active.swap(dumping, Ordering::Relaxed);
        if dumping && !was {
            warn!(
                change_pct = benchmark_change_pct,
                "Market dump detected, trading paused"
            );
        }
    }

    /// 시장 급락 플래그를 해제합니다.
    pub fn clear_market_dump(&self) {
        self.market_dump_active.store(false, Ordering::Relaxed);
    }

    /// 거래 허용 여부를 판정합니다.
    ///
    /// 검사 순서: 수동 중지, 뉴스 킬, 시장 급락, 연속 손실,
    /// 일일 손실, 동시 포지션 수.
    pub fn can_trade(&self, ledger: &dyn OutcomeLedger) -> SentinelResult<CircuitDecision> {
        if self.manually_halted.load(Ordering::Relaxed) {
            return Ok(CircuitDecision::blocked(
                CircuitState::PausedManual,
                "Trading manually halted",
            ));
        }

        if self.news_kill_active.load(Ordering::Relaxed) {
            return Ok(CircuitDecision::blocked(
                CircuitState::PausedNewsWindow,
                "News kill switch active",
            ));
        }

        if self.market_dump_active.load(Ordering::Relaxed) {
            return Ok(CircuitDecision::blocked(
                CircuitState::PausedMarketDump,
                "Market dump in progress",
            ));
        }

        let outcomes = ledger.recent_outcomes(self.config.outcome_window)?;

        // 연속 손실: 최신순으로 선두의 손실 개수
        let consecutive_losses = outcomes.iter().take_while(|o| !o.win).count() as u32;
        if consecutive_losses >= self.config.max_consecutive_losses {
            if let Some(latest_loss) = outcomes.first() {
                let cooldown = Duration::hours(self.config.loss_cooldown_hours);
                let elapsed = Utc::now() - latest_loss.closed_at;
                if elapsed < cooldown {
                    return Ok(CircuitDecision::blocked(
                        CircuitState::PausedConsecutiveLosses,
                        format!(
                            "{} consecutive losses, cooldown {} min remaining",
                            consecutive_losses,
                            (cooldown - elapsed).num_minutes().max(0)
                        ),
                    ));
                }
            }
        }

        // 일일 손실: 최근 24시간의 실현 손익 합
        let day_ago = Utc::now() - Duration::hours(24);
        let daily_pnl_pct: f64 = outcomes
            .iter()
            .filter(|o| o.closed_at >= day_ago)
            .map(|o| o.pnl_pct)
            .sum();
        if daily_pnl_pct < -self.config.max_daily_loss_pct {
            return Ok(CircuitDecision::blocked(
                CircuitState::PausedDailyLoss,
                format!("Daily loss {:.2}% exceeds limit", daily_pnl_pct),
            ));
        }

        let open_positions = ledger.open_positions()?;
        if open_positions.len() >= self.config.max_open_positions {
            return Ok(CircuitDecision::blocked(
                CircuitState::PausedOpenPositionLimit,
                format!("{} open positions at limit", open_positions.len()),
            ));
        }

        Ok(CircuitDecision::allowed())
    }

    /// 같은 방향 동시 노출을 검사합니다.
    pub fn can_open_direction(
        &self,
        direction: Direction,
        ledger: &dyn OutcomeLedger,
    ) -> SentinelResult<CircuitDecision> {
        let same_direction = ledger
            .open_positions()?
            .iter()
            .filter(|p| p.direction == direction)
            .count();

        if same_direction >= self.config.max_same_direction {
            return Ok(CircuitDecision::blocked(
                CircuitState::PausedOpenPositionLimit,
                format!("{} {} positions already open", same_direction, direction),
            ));
        }

        Ok(CircuitDecision::allowed())
    }

    /// 단일 거래 및 전체 미청산 리스크 예산을 검사합니다.
    pub fn check_risk_budget(
        &self,
        new_risk_pct: f64,
        ledger: &dyn OutcomeLedger,
    ) -> SentinelResult<CircuitDecision> {
        if new_risk_pct > self.config.max_single_risk_pct {
            return Ok(CircuitDecision::blocked(
                CircuitState::PausedOpenPositionLimit,
                format!(
                    "Single trade risk {:.2}% exceeds {:.2}% cap",
                    new_risk_pct, self.config.max_single_risk_pct
                ),
            ));
        }

        let open_risk_pct: f64 = ledger
            .open_positions()?
            .iter()
            .map(|p| p.risk_pct)
            .sum();

        if open_risk_pct + new_risk_pct > self.config.max_total_risk_pct {
            return Ok(CircuitDecision::blocked(
                CircuitState::PausedOpenPositionLimit,
                format!(
                    "Total open risk {:.2}% would exceed {:.2}% cap",
                    open_risk_pct + new_risk_pct,
                    self.config.max_total_risk_pct
                ),
            ));
        }

        Ok(CircuitDecision::allowed())
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
