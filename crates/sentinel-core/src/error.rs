//! 시그널 결정 엔진의 에러 타입.
//!
//! 이 모듈은 엔진 전반에서 사용되는 에러 타입을 정의합니다.
//! 게이트/합의/서킷브레이커의 거부는 에러가 아니라 결과 값입니다.
//! 원장(ledger) 접근 실패만이 하드 에러로 전파됩니다.

use thiserror::Error;

/// 핵심 엔진 에러.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 원장 에러 (거래 기록/자본 조회 실패)
    #[error("원장 에러: {0}")]
    Ledger(String),

    /// 외부 분석가 요청 한도 초과
    #[error("요청 한도 초과: {0}")]
    RateLimit(String),

    /// 외부 분석가 에러
    #[error("분석가 에러: {0}")]
    Analyst(String),

    /// 모델 추론 에러
    #[error("모델 에러: {0}")]
    Model(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 엔진 작업을 위한 Result 타입.
pub type SentinelResult<T> = Result<T, SentinelError>;

impl SentinelError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SentinelError::RateLimit(_))
    }

    /// 평가 전체를 중단해야 하는 하드 에러인지 확인합니다.
    pub fn is_hard(&self) -> bool {
        matches!(self, SentinelError::Ledger(_))
    }
}

impl From<serde_json::Error> for SentinelError {
    fn from(err: serde_json::Error) -> Self {
        SentinelError::Serialization(err.to_string())
    }
}
