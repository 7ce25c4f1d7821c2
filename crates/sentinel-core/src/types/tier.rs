//! 시그널 티어 및 신뢰도 등급.

use serde::{Deserialize, Serialize};

/// 시그널 강도 티어.
///
/// 번호가 낮을수록 강한 시그널입니다 (1 = 최강). 문자열 비교 대신
/// [`SignalTier::rank`] 순위 테이블로 비교합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalTier {
    /// 최강 시그널 (티어 1)
    Extreme,
    /// 강한 시그널 (티어 2)
    Strong,
    /// 보통 시그널 (티어 3)
    Moderate,
    /// 투기적 시그널 (티어 4)
    Speculative,
    /// 다이버전스 기반 시그널 (티어 5)
    Divergence,
    /// 약한 시그널 (티어 6, 실행 비권장)
    Weak,
}

impl SignalTier {
    /// 티어 번호를 반환합니다 (1 = 최강, 6 = 최약).
    pub fn number(&self) -> u8 {
        match self {
            SignalTier::Extreme => 1,
            SignalTier::Strong => 2,
            SignalTier::Moderate => 3,
            SignalTier::Speculative => 4,
            SignalTier::Divergence => 5,
            SignalTier::Weak => 6,
        }
    }

    /// 강도 순위를 반환합니다 (높을수록 강함). 드로다운 가드의
    /// 티어 허용 비교에 사용됩니다.
    pub fn rank(&self) -> u8 {
        match self {
            SignalTier::Extreme => 6,
            SignalTier::Strong => 5,
            SignalTier::Moderate => 4,
            SignalTier::Speculative => 3,
            SignalTier::Divergence => 2,
            SignalTier::Weak => 1,
        }
    }

    /// `other` 이상의 강도인지 확인합니다.
    pub fn is_at_least(&self, other: SignalTier) -> bool {
        self.rank() >= other.rank()
    }
}

impl std::fmt::Display for SignalTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SignalTier::Extreme => "EXTREME",
            SignalTier::Strong => "STRONG",
            SignalTier::Moderate => "MODERATE",
            SignalTier::Speculative => "SPECULATIVE",
            SignalTier::Divergence => "DIVERGENCE",
            SignalTier::Weak => "WEAK",
        };
        write!(f, "{}", s)
    }
}

/// 신뢰도 점수의 문자 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// 점수(0-100)에서 등급을 계산합니다.
    pub fn from_score(score: i32) -> Self {
        if score >= 80 {
            Grade::A
        } else if score >= 65 {
            Grade::B
        } else if score >= 50 {
            Grade::C
        } else if score >= 35 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", s)
    }
}
