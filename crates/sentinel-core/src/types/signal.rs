//! 탐지된 시그널 타입.

use serde::{Deserialize, Serialize};

use super::{Direction, SignalTier};

/// 탐지기가 생성한 방향성 시그널.
///
/// 중립 시그널은 티어를 가질 수 없습니다. `tier`가 `Option`이므로
/// "중립인데 티어가 있는" 상태는 타입 수준에서 표현 불가능합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// 시그널 방향
    pub direction: Direction,
    /// 시그널 티어 (중립이면 None)
    pub tier: Option<SignalTier>,
    /// 시그널 근거 목록 (탐지 순서 유지)
    pub reasons: Vec<String>,
    /// 방향을 지지한 지표 개수
    pub indicator_count: usize,
}

impl Signal {
    /// 중립 시그널을 생성합니다.
    pub fn neutral() -> Self {
        Self {
            direction: Direction::Neutral,
            tier: None,
            reasons: Vec::new(),
            indicator_count: 0,
        }
    }

    /// 근거가 첨부된 중립 시그널을 생성합니다 (필터 거부 사유 기록용).
    pub fn neutral_with_reasons(reasons: Vec<String>) -> Self {
        Self {
            direction: Direction::Neutral,
            tier: None,
            reasons,
            indicator_count: 0,
        }
    }

    /// 방향성 시그널을 생성합니다.
    pub fn directional(
        direction: Direction,
        tier: SignalTier,
        reasons: Vec<String>,
    ) -> Self {
        let indicator_count = reasons.len();
        Self {
            direction,
            tier: Some(tier),
            reasons,
            indicator_count,
        }
    }

    /// 실행 가능한 시그널인지 확인합니다 (방향 + 티어 보유).
    pub fn is_actionable(&self) -> bool {
        self.direction.is_directional() && self.tier.is_some()
    }
}
