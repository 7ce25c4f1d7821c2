//! # Sentinel Signals
//!
//! 시그널 탐지부터 최종 결정까지의 파이프라인을 제공합니다.
//!
//! 후보 종목별 흐름:
//!
//! ```text
//! FeatureSnapshot
//!        │
//!        ▼
//! ┌──────────────┐   ┌──────────────┐
//! │SignalDetector│ → │PreTradeFilter│  중립이면 조기 종료
//! └──────┬───────┘   └──────┬───────┘
//!        ▼                  ▼
//! ┌──────────────┐   ┌──────────────┐
//! │RiskCalculator│   │ConfidenceScorer│
//! └──────┬───────┘   └──────┬───────┘
//!        ▼                  ▼
//! ┌──────────────┐   ┌──────────────┐
//! │ConsensusEngine│  │PrecisionGate │
//! └──────┬───────┘   └──────┬───────┘
//!        └────────┬─────────┘
//!                 ▼
//!   CircuitBreaker / AdaptiveThreshold / DrawdownGuard
//!                 ▼
//!             Decision
//! ```

pub mod analyst;
pub mod config;
pub mod consensus;
pub mod detector;
pub mod filters;
pub mod gate;
pub mod pipeline;
pub mod scorer;

pub use analyst::{MarketAnalyst, MarketAssessment, RetryingAnalyst, RuleBasedAnalyst};
pub use config::{
    ConsensusConfig, DetectorConfig, FilterConfig, GateConfig, PipelineConfig, ScorerConfig,
};
pub use consensus::{Ballot, ConsensusEngine, ConsensusResult, Vote, VOTER_COUNT};
pub use detector::SignalDetector;
pub use filters::{NewsCalendar, NewsEvent, PreTradeFilters};
pub use gate::{EntryQuality, GateCheck, GateResult, PrecisionGate};
pub use pipeline::{Decision, DecisionPipeline, RejectionReason, ScanCandidate, TradeIntent};
pub use scorer::{ConfidenceResult, ConfidenceScorer, ScoreContext};
