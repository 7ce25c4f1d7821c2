//! 거래 기록/자본 원장 포트.
//!
//! 서킷브레이커, 적응형 임계값, 드로다운 가드는 스캔마다 이 포트를
//! 다시 읽어 파생 상태를 계산합니다. 원장 조회 실패는 엔진에서
//! 유일한 하드 에러이며 [`crate::SentinelError::Ledger`]로 전파됩니다.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SentinelError, SentinelResult};
use crate::types::Direction;

/// 청산된 거래의 결과 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// 수익 여부
    pub win: bool,
    /// 실현 손익 (%)
    pub pnl_pct: f64,
    /// 청산 시각
    pub closed_at: DateTime<Utc>,
}

/// 미청산 포지션.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    /// 포지션 식별자
    pub id: Uuid,
    /// 심볼
    pub symbol: String,
    /// 방향
    pub direction: Direction,
    /// 진입 시 배정된 리스크 (%)
    pub risk_pct: f64,
    /// 진입 시각
    pub opened_at: DateTime<Utc>,
}

impl OpenPosition {
    /// 새 포지션 기록을 생성합니다.
    pub fn new(symbol: impl Into<String>, direction: Direction, risk_pct: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            direction,
            risk_pct,
            opened_at: Utc::now(),
        }
    }
}

/// 거래 결과 원장 포트.
///
/// 결과는 최신순으로 반환합니다.
pub trait OutcomeLedger: Send + Sync {
    /// 최근 `window`건의 청산 결과를 최신순으로 반환합니다.
    fn recent_outcomes(&self, window: usize) -> SentinelResult<Vec<TradeOutcome>>;

    /// 현재 미청산 포지션 목록을 반환합니다.
    fn open_positions(&self) -> SentinelResult<Vec<OpenPosition>>;
}

/// 자본 원장 포트.
pub trait CapitalLedger: Send + Sync {
    /// 현재 자본을 반환합니다.
    fn current(&self) -> SentinelResult<Decimal>;

    /// 시작 자본을 반환합니다.
    fn starting(&self) -> SentinelResult<Decimal>;
}

#[derive(Debug, Default)]
struct LedgerState {
    outcomes: Vec<TradeOutcome>,
    positions: Vec<OpenPosition>,
}

/// 테스트 및 페이퍼 트레이딩용 인메모리 원장.
///
/// Mutex로 쓰기를 직렬화하는 단일 쓰기자 구현입니다. 운영 환경은
/// 동일 포트를 영속 스토어로 구현해 주입합니다.
#[derive(Debug)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    starting_capital: Decimal,
    current_capital: Mutex<Decimal>,
}

impl InMemoryLedger {
    /// 시작 자본으로 원장을 생성합니다.
    pub fn new(starting_capital: Decimal) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            starting_capital,
            current_capital: Mutex::new(starting_capital),
        }
    }

    /// 청산 결과를 기록합니다.
    pub fn record_outcome(&self, outcome: TradeOutcome) -> SentinelResult<()> {
        let mut state = self.lock_state()?;
        state.outcomes.push(outcome);
        Ok(())
    }

    /// 포지션 진입을 기록합니다.
    pub fn record_open(&self, position: OpenPosition) -> SentinelResult<()> {
        let mut state = self.lock_state()?;
        state.positions.push(position);
        Ok(())
    }

    /// 포지션 청산을 기록합니다. 해당 포지션이 없으면 무시합니다.
    pub fn record_close(&self, id: Uuid) -> SentinelResult<()> {
        let mut state = self.lock_state()?;
        state.positions.retain(|p| p.id != id);
        Ok(())
    }

    /// 현재 자본을 갱신합니다.
    pub fn set_current_capital(&self, capital: Decimal) -> SentinelResult<()> {
        let mut current = self
            .current_capital
            .lock()
            .map_err(|_| SentinelError::Ledger("capital lock poisoned".to_string()))?;
        *current = capital;
        Ok(())
    }

    fn lock_state(&self) -> SentinelResult<std::sync::MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|_| SentinelError::Ledger("ledger lock poisoned".to_string()))
    }
}

impl OutcomeLedger for InMemoryLedger {
    fn recent_outcomes(&self, window: usize) -> SentinelResult<Vec<TradeOutcome>> {
        let state = self.lock_state()?;
        let mut outcomes: Vec<TradeOutcome> = state.outcomes.clone();
        outcomes.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));
        outcomes.truncate(window);
        Ok(outcomes)
    }

    fn open_positions(&self) -> SentinelResult<Vec<OpenPosition>> {
        let state = self.lock_state()?;
        Ok(state.positions.clone())
    }
}

impl CapitalLedger for InMemoryLedger {
    fn current(&self) -> SentinelResult<Decimal> {
        let current = self
            .current_capital
            .lock()
            .map_err(|_| SentinelError::Ledger("capital lock poisoned".to_string()))?;
        Ok(*current)
    }

    fn starting(&self) -> SentinelResult<Decimal> {
        Ok(self.starting_capital)
    }
}
