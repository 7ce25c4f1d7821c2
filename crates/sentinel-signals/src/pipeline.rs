//! 결정 파이프라인.
//!
//! 스캔 사이클마다 후보 종목을 탐지 -> 필터 -> 리스크 계획 ->
//! 신뢰도 -> 합의 -> 정밀 게이트 -> 안전장치 순으로 통과시키고
//! 수락/거절을 결정합니다. 후보 하나의 실패가 스캔 전체를
//! 중단시키지 않도록 [`DecisionPipeline::run_scan`]이 종목별
//! 오류 경계를 제공합니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use sentinel_core::{
    AdvancedBoosts, CapitalLedger, Direction, FeatureSnapshot, FundingRate, Grade, MacroRegime,
    OnChainSignal, OrderBookImbalance, OrderFlowSummary, OutcomeLedger, SentimentSnapshot,
    SentinelResult, SignalTier, StructureSummary, TimeframeAgreement,
};
use sentinel_ml::WinProbabilityModel;
use sentinel_risk::{
    estimate_target_etas, AdaptiveThreshold, CircuitBreaker, DrawdownGuard, DrawdownMode,
    RiskCalculator, RiskPlan, TargetEta,
};

use crate::config::PipelineConfig;
use crate::consensus::ConsensusEngine;
use crate::detector::SignalDetector;
use crate::filters::{NewsCalendar, PreTradeFilters};
use crate::gate::{EntryQuality, PrecisionGate};
use crate::scorer::{ConfidenceScorer, ScoreContext};

/// 스캔 사이클의 후보 종목 하나.
///
/// 지표 스냅샷 외의 모든 컨텍스트는 선택적입니다. 외부 수집기가
/// 채우지 못한 입력은 해당 단계에서 중립으로 처리됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCandidate {
    /// 종목 심볼
    pub symbol: String,
    /// 지표 스냅샷
    pub features: FeatureSnapshot,
    /// 멀티 타임프레임 합의
    #[serde(default)]
    pub timeframe: Option<TimeframeAgreement>,
    /// 감성 점수
    #[serde(default)]
    pub sentiment: Option<SentimentSnapshot>,
    /// 공포탐욕 지수 (0-100)
    #[serde(default)]
    pub fear_greed: Option<i32>,
    /// 주문 흐름 요약
    #[serde(default)]
    pub order_flow: Option<OrderFlowSummary>,
    /// 매크로 환경 판정
    #[serde(default)]
    pub macro_regime: Option<MacroRegime>,
    /// 펀딩 비율
    #[serde(default)]
    pub funding: Option<FundingRate>,
    /// 호가창 불균형
    #[serde(default)]
    pub order_book: Option<OrderBookImbalance>,
    /// 온체인 시그널
    #[serde(default)]
    pub on_chain: Option<OnChainSignal>,
    /// 시장 구조 요약
    #[serde(default)]
    pub structure: Option<StructureSummary>,
    /// 고급 분석 보정치
    #[serde(default)]
    pub advanced: Option<AdvancedBoosts>,
    /// 암호화폐 여부 (feature vector용)
    #[serde(default)]
    pub is_crypto: bool,
}

impl ScanCandidate {
    /// 지표 스냅샷만으로 후보를 생성합니다.
    pub fn new(symbol: impl Into<String>, features: FeatureSnapshot) -> Self {
        Self {
            symbol: symbol.into(),
            features,
            timeframe: None,
            sentiment: None,
            fear_greed: None,
            order_flow: None,
            macro_regime: None,
            funding: None,
            order_book: None,
            on_chain: None,
            structure: None,
            advanced: None,
            is_crypto: false,
        }
    }
}

/// 거절 사유.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// 방향성 시그널이 탐지되지 않음
    NeutralSignal,
    /// 프리트레이드 필터에 걸림
    FilteredOut { reasons: Vec<String> },
    /// 합의 투표 미달
    ConsensusFailed { votes_for: u32, votes_against: u32 },
    /// 정밀 게이트 실패
    GateFailed { gate: String },
    /// 서킷 브레이커 차단
    CircuitBreaker { reason: String },
    /// 드로다운 모드가 허용하지 않는 티어
    TierNotAdmitted {
        tier: SignalTier,
        mode: DrawdownMode,
    },
    /// 유효 임계값 미달
    ConfidenceBelowThreshold { confidence: i32, threshold: i32 },
    /// 동일 방향 포지션 한도 도달
    DirectionCapReached { reason: String },
    /// 리스크 예산 초과
    RiskBudgetExceeded { reason: String },
    /// 드로다운 HALT
    DrawdownHalt,
    /// 원장 조회 불가
    LedgerUnavailable { detail: String },
    /// 송신 전 검증 실패
    ValidationFailed { detail: String },
    /// 비정상 입력
    InvalidInput { detail: String },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::NeutralSignal => write!(f, "no directional signal"),
            RejectionReason::FilteredOut { reasons } => {
                write!(f, "filtered out: {}", reasons.join(", "))
            }
            RejectionReason::ConsensusFailed {
                votes_for,
                votes_against,
            } => write!(f, "consensus failed ({} for, {} against)", votes_for, votes_against),
            RejectionReason::GateFailed { gate } => write!(f, "gate failed: {}", gate),
            RejectionReason::CircuitBreaker { reason } => {
                write!(f, "circuit breaker: {}", reason)
            }
            RejectionReason::TierNotAdmitted { tier, mode } => {
                write!(f, "tier {} not admitted in {:?} mode", tier, mode)
            }
            RejectionReason::ConfidenceBelowThreshold {
                confidence,
                threshold,
            } => write!(f, "confidence {} below threshold {}", confidence, threshold),
            RejectionReason::DirectionCapReached { reason } => {
                write!(f, "direction cap: {}", reason)
            }
            RejectionReason::RiskBudgetExceeded { reason } => {
                write!(f, "risk budget: {}", reason)
            }
            RejectionReason::DrawdownHalt => write!(f, "drawdown halt"),
            RejectionReason::LedgerUnavailable { detail } => {
                write!(f, "ledger unavailable: {}", detail)
            }
            RejectionReason::ValidationFailed { detail } => {
                write!(f, "validation failed: {}", detail)
            }
            RejectionReason::InvalidInput { detail } => write!(f, "invalid input: {}", detail),
        }
    }
}

/// 수락된 거래 의도.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeIntent {
    /// 종목 심볼
    pub symbol: String,
    /// 방향
    pub direction: Direction,
    /// 시그널 티어
    pub tier: SignalTier,
    /// 최종 신뢰도
    pub confidence: f64,
    /// 문자 등급
    pub grade: Grade,
    /// 시그널 근거
    pub reasons: Vec<String>,
    /// 리스크 계획 (드로다운 배수 반영)
    pub plan: RiskPlan,
    /// 진입 정밀도 등급
    pub entry_quality: EntryQuality,
    /// 진입 정밀도 점수 (0-3)
    pub precision_score: u8,
    /// 합의 찬성 수
    pub votes_for: u32,
    /// 합의 반대 수
    pub votes_against: u32,
    /// ML 승률
    pub win_probability: Option<f64>,
    /// 적용된 유효 임계값
    pub threshold: i32,
    /// 드로다운 포지션 배수
    pub position_multiplier: f64,
    /// 목표가별 도달 시간 추정
    pub target_etas: Vec<TargetEta>,
    /// 결정 시각
    pub decided_at: DateTime<Utc>,
}

/// 후보 하나에 대한 최종 결정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decision {
    /// 모든 단계 통과
    Accept(Box<TradeIntent>),
    /// 거절
    Reject {
        symbol: String,
        reason: RejectionReason,
    },
}

impl Decision {
    /// 수락 여부를 반환합니다.
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept(_))
    }

    /// 거절 사유를 반환합니다 (수락이면 None).
    pub fn rejection_reason(&self) -> Option<&RejectionReason> {
        match self {
            Decision::Accept(_) => None,
            Decision::Reject { reason, .. } => Some(reason),
        }
    }
}

/// 결정 파이프라인.
pub struct DecisionPipeline {
    config: PipelineConfig,
    detector: SignalDetector,
    filters: PreTradeFilters,
    scorer: ConfidenceScorer,
    consensus: ConsensusEngine,
    gate: PrecisionGate,
    risk: RiskCalculator,
    breaker: CircuitBreaker,
    threshold: AdaptiveThreshold,
    drawdown: DrawdownGuard,
    outcomes: Arc<dyn OutcomeLedger>,
    capital: Arc<dyn CapitalLedger>,
    model: Option<Arc<dyn WinProbabilityModel>>,
    calendar: Option<NewsCalendar>,
}

impl DecisionPipeline {
    /// 기본 구성의 파이프라인을 생성합니다.
    pub fn new(
        config: PipelineConfig,
        outcomes: Arc<dyn OutcomeLedger>,
        capital: Arc<dyn CapitalLedger>,
    ) -> Self {
        Self {
            config,
            detector: SignalDetector::default(),
            filters: PreTradeFilters::default(),
            scorer: ConfidenceScorer::default(),
            consensus: ConsensusEngine::default(),
            gate: PrecisionGate::default(),
            risk: RiskCalculator::default(),
            breaker: CircuitBreaker::new(Default::default()),
            threshold: AdaptiveThreshold::default(),
            drawdown: DrawdownGuard::default(),
            outcomes,
            capital,
            model: None,
            calendar: None,
        }
    }

    /// 승률 모델을 연결합니다.
    pub fn with_model(mut self, model: Arc<dyn WinProbabilityModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// 뉴스 일정을 연결합니다.
    pub fn with_calendar(mut self, calendar: NewsCalendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// 탐지기를 교체합니다.
    pub fn with_detector(mut self, detector: SignalDetector) -> Self {
        self.detector = detector;
        self
    }

    /// 필터를 교체합니다.
    pub fn with_filters(mut self, filters: PreTradeFilters) -> Self {
        self.filters = filters;
        self
    }

    /// 점수기를 교체합니다.
    pub fn with_scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// 합의 엔진을 교체합니다.
    pub fn with_consensus(mut self, consensus: ConsensusEngine) -> Self {
        self.consensus = consensus;
        self
    }

    /// 정밀 게이트를 교체합니다.
    pub fn with_gate(mut self, gate: PrecisionGate) -> Self {
        self.gate = gate;
        self
    }

    /// 리스크 계산기를 교체합니다.
    pub fn with_risk_calculator(mut self, risk: RiskCalculator) -> Self {
        self.risk = risk;
        self
    }

    /// 서킷 브레이커를 교체합니다.
    pub fn with_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = breaker;
        self
    }

    /// 적응형 임계값을 교체합니다.
    pub fn with_threshold(mut self, threshold: AdaptiveThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// 드로다운 가드를 교체합니다.
    pub fn with_drawdown_guard(mut self, drawdown: DrawdownGuard) -> Self {
        self.drawdown = drawdown;
        self
    }

    /// 서킷 브레이커에 접근합니다 (수동 중지/뉴스 킬/급락 플래그).
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// 후보 하나를 평가합니다.
    ///
    /// 원장 조회 실패 같은 하드 에러만 `Err`로 전파되며, 나머지는
    /// 모두 사유를 담은 [`Decision::Reject`]로 표현됩니다.
    pub fn evaluate(
        &self,
        candidate: &ScanCandidate,
        now: DateTime<Utc>,
    ) -> SentinelResult<Decision> {
        let span = sentinel_core::scan_span!("evaluate_candidate", candidate.symbol);
        let _guard = span.enter();

        let symbol = candidate.symbol.clone();
        let reject = |reason: RejectionReason| {
            debug!(symbol = %candidate.symbol, %reason, "Candidate rejected");
            Decision::Reject {
                symbol: candidate.symbol.clone(),
                reason,
            }
        };

        if !candidate.features.has_valid_price() {
            return Ok(reject(RejectionReason::InvalidInput {
                detail: "non-positive price".to_string(),
            }));
        }
        let features = candidate.features.sanitized();

        // 1. 탐지
        let signal = self.detector.detect(
            &features,
            candidate.timeframe.as_ref(),
            candidate.order_flow.as_ref(),
        );
        if !signal.is_actionable() {
            return Ok(reject(RejectionReason::NeutralSignal));
        }

        // 2. 프리트레이드 필터
        let signal = self
            .filters
            .apply(signal, &features, self.calendar.as_ref(), now);
        if !signal.is_actionable() {
            return Ok(reject(RejectionReason::FilteredOut {
                reasons: signal.reasons,
            }));
        }
        let direction = signal.direction;
        let Some(tier) = signal.tier else {
            return Ok(reject(RejectionReason::InvalidInput {
                detail: "directional signal without tier".to_string(),
            }));
        };

        // 3. 리스크 계획
        let capital = self.capital.current()?;
        let mut plan = match self.risk.calculate(
            features.price,
            features.atr,
            &features.support_resistance,
            direction,
            capital,
        ) {
            Ok(plan) => plan,
            Err(e) if e.is_hard() => return Err(e),
            Err(e) => {
                return Ok(reject(RejectionReason::InvalidInput {
                    detail: e.to_string(),
                }))
            }
        };

        // 4. 신뢰도
        let ctx = ScoreContext {
            timeframe: candidate.timeframe.as_ref(),
            sentiment: candidate.sentiment.as_ref(),
            fear_greed: candidate.fear_greed,
            order_flow: candidate.order_flow.as_ref(),
            macro_regime: candidate.macro_regime,
            funding: candidate.funding,
            order_book: candidate.order_book,
            on_chain: candidate.on_chain,
            advanced: candidate.advanced,
            is_crypto: candidate.is_crypto,
        };
        let scored = self
            .scorer
            .score(&signal, &features, &ctx, self.model.as_deref());

        // 5. 합의
        let consensus =
            self.consensus
                .evaluate(direction, &features, &ctx, candidate.structure.as_ref());
        if !consensus.passes {
            return Ok(reject(RejectionReason::ConsensusFailed {
                votes_for: consensus.votes_for,
                votes_against: consensus.votes_against,
            }));
        }

        // 6. 정밀 게이트
        let gated = self.gate.evaluate(
            direction,
            &features,
            scored.score,
            ctx.timeframe,
            ctx.order_flow,
            ctx.funding,
            &plan,
        );
        if !gated.passed {
            let gate = gated
                .primary_failure
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Ok(reject(RejectionReason::GateFailed { gate }));
        }

        // 7. 서킷 브레이커
        let breaker = self.breaker.can_trade(self.outcomes.as_ref())?;
        if !breaker.allowed {
            return Ok(reject(RejectionReason::CircuitBreaker {
                reason: breaker
                    .reason
                    .unwrap_or_else(|| "trading paused".to_string()),
            }));
        }
        let direction_check = self
            .breaker
            .can_open_direction(direction, self.outcomes.as_ref())?;
        if !direction_check.allowed {
            return Ok(reject(RejectionReason::DirectionCapReached {
                reason: direction_check
                    .reason
                    .unwrap_or_else(|| "direction cap reached".to_string()),
            }));
        }
        let new_risk_pct = if capital > Decimal::ZERO {
            use rust_decimal::prelude::ToPrimitive;
            ((plan.risk_amount / capital) * Decimal::from(100))
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };
        let budget = self
            .breaker
            .check_risk_budget(new_risk_pct, self.outcomes.as_ref())?;
        if !budget.allowed {
            return Ok(reject(RejectionReason::RiskBudgetExceeded {
                reason: budget
                    .reason
                    .unwrap_or_else(|| "risk budget exceeded".to_string()),
            }));
        }

        // 8. 드로다운 가드 (fail-closed: 원장 실패는 하드 에러)
        let drawdown = self.drawdown.from_ledger(self.capital.as_ref())?;
        if !drawdown.allows_trading() {
            return Ok(reject(RejectionReason::DrawdownHalt));
        }
        if !drawdown.is_tier_allowed(tier) {
            return Ok(reject(RejectionReason::TierNotAdmitted {
                tier,
                mode: drawdown.mode,
            }));
        }

        // 9. 적응형 임계값 + 드로다운 추가 요구치
        let threshold_state = self
            .threshold
            .from_ledger(self.config.base_confidence_threshold, self.outcomes.as_ref());
        let required = threshold_state.adjusted_threshold + drawdown.extra_confidence_required;
        let confidence = scored.score_rounded();
        if confidence < required {
            return Ok(reject(RejectionReason::ConfidenceBelowThreshold {
                confidence,
                threshold: required,
            }));
        }

        // 10. 드로다운 배수 반영
        let multiplier =
            Decimal::from_f64(drawdown.position_multiplier).unwrap_or(Decimal::ONE);
        plan.position_size *= multiplier;
        plan.position_value *= multiplier;
        plan.risk_amount *= multiplier;

        // 11. 송신 전 검증
        if let Err(detail) = validate_plan(direction, &features, &plan) {
            warn!(symbol = %candidate.symbol, detail, "Pre-send validation failed");
            return Ok(reject(RejectionReason::ValidationFailed {
                detail: detail.to_string(),
            }));
        }

        let target_etas = estimate_target_etas(
            features.price,
            features.atr,
            features.adx,
            features.volume_ratio,
            &plan.targets,
            candidate.is_crypto,
        );

        info!(
            symbol = %symbol,
            %direction,
            %tier,
            confidence,
            grade = %scored.grade,
            votes_for = consensus.votes_for,
            entry_quality = ?gated.entry_quality,
            "Trade intent accepted"
        );

        Ok(Decision::Accept(Box::new(TradeIntent {
            symbol,
            direction,
            tier,
            confidence: scored.score,
            grade: scored.grade,
            reasons: signal.reasons,
            plan,
            entry_quality: gated.entry_quality,
            precision_score: gated.precision_score,
            votes_for: consensus.votes_for,
            votes_against: consensus.votes_against,
            win_probability: scored.win_probability,
            threshold: required,
            position_multiplier: drawdown.position_multiplier,
            target_etas,
            decided_at: now,
        })))
    }

    /// 후보 집합을 평가합니다.
    ///
    /// 종목별 오류 경계: 한 후보의 실패는 해당 후보의 거절로만
    /// 기록되고 나머지 후보는 계속 평가됩니다.
    pub fn run_scan(&self, candidates: &[ScanCandidate], now: DateTime<Utc>) -> Vec<Decision> {
        let mut decisions = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let decision = match self.evaluate(candidate, now) {
                Ok(decision) => decision,
                Err(e) if e.is_hard() => {
                    error!(symbol = %candidate.symbol, error = %e, "Ledger failure during scan");
                    Decision::Reject {
                        symbol: candidate.symbol.clone(),
                        reason: RejectionReason::LedgerUnavailable {
                            detail: e.to_string(),
                        },
                    }
                }
                Err(e) => {
                    warn!(symbol = %candidate.symbol, error = %e, "Candidate evaluation failed");
                    Decision::Reject {
                        symbol: candidate.symbol.clone(),
                        reason: RejectionReason::InvalidInput {
                            detail: e.to_string(),
                        },
                    }
                }
            };
            decisions.push(decision);
        }

        let accepted = decisions.iter().filter(|d| d.is_accept()).count();
        info!(
            candidates = candidates.len(),
            accepted,
            "Scan cycle complete"
        );
        decisions
    }
}

/// 수락 직전의 리스크 계획 일관성 검증.
fn validate_plan(
    direction: Direction,
    features: &FeatureSnapshot,
    plan: &RiskPlan,
) -> Result<(), &'static str> {
    if plan.position_size <= Decimal::ZERO {
        return Err("non-positive position size");
    }
    match direction {
        Direction::Buy => {
            if plan.stop_loss >= features.price {
                return Err("stop above entry for buy");
            }
            if plan.targets[0] <= features.price {
                return Err("first target below entry for buy");
            }
            if !(plan.targets[0] < plan.targets[1] && plan.targets[1] < plan.targets[2]) {
                return Err("targets not ascending for buy");
            }
        }
        Direction::Sell => {
            if plan.stop_loss <= features.price {
                return Err("stop below entry for sell");
            }
            if plan.targets[0] >= features.price {
                return Err("first target above entry for sell");
            }
            if !(plan.targets[0] > plan.targets[1] && plan.targets[1] > plan.targets[2]) {
                return Err("targets not descending for sell");
            }
        }
        Direction::Neutral => return Err("neutral direction"),
    }
    Ok(())
}
