//! 시그널 방향 타입.

use serde::{Deserialize, Serialize};

/// 시그널 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// 매수
    Buy,
    /// 매도
    Sell,
    /// 중립 (파이프라인 조기 종료)
    Neutral,
}

impl Direction {
    /// 반대 방향을 반환합니다. 중립은 중립 그대로입니다.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
            Direction::Neutral => Direction::Neutral,
        }
    }

    /// 매수 방향인지 확인합니다.
    pub fn is_buy(&self) -> bool {
        matches!(self, Direction::Buy)
    }

    /// 매도 방향인지 확인합니다.
    pub fn is_sell(&self) -> bool {
        matches!(self, Direction::Sell)
    }

    /// 방향성이 있는지 확인합니다 (중립이 아닌지).
    pub fn is_directional(&self) -> bool {
        !matches!(self, Direction::Neutral)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Neutral => "NEUTRAL",
        };
        write!(f, "{}", s)
    }
}
