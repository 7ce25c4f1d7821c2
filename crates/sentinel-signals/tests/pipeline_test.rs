//! 파이프라인 엔드투엔드 시나리오 테스트.
//!
//! 완전히 정렬된 셋업의 수락, 과밀 펀딩의 게이트 거절, 연속 손실
//! 이후의 서킷 차단, 드로다운 모드의 티어 제한을 검증합니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use sentinel_core::{
    Direction, FeatureSnapshot, FundingRate, Grade, InMemoryLedger, MaCross, MacdCross, ObvTrend,
    OrderBookImbalance, OrderFlowSummary, SignalTier, StructureSummary, SupportResistance,
    TimeframeAgreement, TradeOutcome,
};
use sentinel_ml::MockModel;
use sentinel_signals::{
    Decision, DecisionPipeline, PipelineConfig, RejectionReason, ScanCandidate,
};

/// 런던/뉴욕 겹침 구간의 고정된 스캔 시각.
fn scan_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap()
}

/// 모든 지표가 매수로 정렬된 스냅샷.
fn prime_buy_snapshot() -> FeatureSnapshot {
    FeatureSnapshot {
        price: dec!(100),
        rsi: 28.0,
        macd_hist: 0.8,
        macd_crossover: Some(MacdCross::Bullish),
        bb_pctb: 0.15,
        bb_upper: dec!(104),
        bb_lower: dec!(96),
        stoch_k: 18.0,
        stoch_d: 20.0,
        adx: 30.0,
        plus_di: 32.0,
        minus_di: 12.0,
        volume_ratio: 2.0,
        ma_cross: Some(MaCross::Golden),
        obv_trend: ObvTrend::Rising,
        ema9: dec!(99.5),
        ema21: dec!(99),
        ema50: dec!(97),
        atr: dec!(2),
        price_change_pct: 1.5,
        divergence: None,
        fvg_fib: None,
        support_resistance: SupportResistance {
            support1: Some(dec!(99)),
            support2: Some(dec!(95)),
            resistance1: Some(dec!(110)),
            resistance2: Some(dec!(115)),
        },
    }
}

/// 컨텍스트까지 전부 정렬된 후보.
fn prime_candidate() -> ScanCandidate {
    let mut candidate = ScanCandidate::new("BTC/USDT", prime_buy_snapshot());
    candidate.timeframe = Some(TimeframeAgreement {
        dominant: Direction::Buy,
        aligned: 4,
        total: 4,
        confluence_score: 40.0,
    });
    candidate.order_flow = Some(OrderFlowSummary {
        direction: Direction::Buy,
        score: 70.0,
    });
    candidate.structure = Some(StructureSummary {
        break_direction: Some(Direction::Buy),
        near_support_zone: true,
        near_resistance_zone: false,
    });
    candidate.order_book = Some(OrderBookImbalance { bid_ask_ratio: 2.2 });
    candidate.is_crypto = true;
    candidate
}

fn pipeline_with_ledger(ledger: Arc<InMemoryLedger>) -> DecisionPipeline {
    DecisionPipeline::new(PipelineConfig::default(), ledger.clone(), ledger)
}

#[test]
fn test_fully_aligned_setup_is_accepted() {
    let ledger = Arc::new(InMemoryLedger::new(dec!(10000)));
    let pipeline = pipeline_with_ledger(ledger);

    let decision = pipeline.evaluate(&prime_candidate(), scan_time()).unwrap();

    let Decision::Accept(intent) = decision else {
        panic!("expected accept, got {:?}", decision.rejection_reason());
    };
    assert_eq!(intent.symbol, "BTC/USDT");
    assert_eq!(intent.direction, Direction::Buy);
    assert_eq!(intent.tier, SignalTier::Extreme);
    assert_eq!(intent.confidence, 100.0);
    assert_eq!(intent.grade, Grade::A);
    assert!(intent.votes_for >= 10);
    assert_eq!(intent.votes_against, 0);
    assert_eq!(intent.position_multiplier, 1.0);
    // 매수 계획의 일관성
    assert!(intent.plan.stop_loss < dec!(100));
    assert!(intent.plan.targets[0] > dec!(100));
    assert!(intent.plan.position_size > dec!(0));
    // 목표가별 도달 시간 추정이 함께 실린다
    assert_eq!(intent.target_etas.len(), 3);
    assert!(intent.target_etas[0].days < intent.target_etas[2].days);
}

#[test]
fn test_crowded_funding_is_stopped_at_the_gate() {
    let ledger = Arc::new(InMemoryLedger::new(dec!(10000)));
    let pipeline = pipeline_with_ledger(ledger);

    let mut candidate = prime_candidate();
    candidate.funding = Some(FundingRate { rate_pct: 6.0 });

    let decision = pipeline.evaluate(&candidate, scan_time()).unwrap();

    // 펀딩 벌점(-15) 후에도 신뢰도는 80 이상이라 게이트의
    // FUNDING_OK에서만 걸린다
    assert_eq!(
        decision.rejection_reason(),
        Some(&RejectionReason::GateFailed {
            gate: "FUNDING_OK".to_string()
        })
    );
}

#[test]
fn test_consecutive_losses_trip_the_breaker() {
    let ledger = Arc::new(InMemoryLedger::new(dec!(10000)));
    for _ in 0..3 {
        ledger
            .record_outcome(TradeOutcome {
                win: false,
                pnl_pct: -1.0,
                closed_at: Utc::now() - Duration::hours(1),
            })
            .unwrap();
    }
    let pipeline = pipeline_with_ledger(ledger);

    // 지표가 완벽해도 서킷 브레이커가 막는다
    let decision = pipeline.evaluate(&prime_candidate(), scan_time()).unwrap();

    match decision.rejection_reason() {
        Some(RejectionReason::CircuitBreaker { reason }) => {
            assert!(reason.contains("consecutive losses"), "reason: {}", reason);
        }
        other => panic!("expected circuit breaker rejection, got {:?}", other),
    }
}

#[test]
fn test_defensive_drawdown_scales_position_and_threshold() {
    let ledger = Arc::new(InMemoryLedger::new(dec!(10000)));
    // 25% 드로다운: DEFENSIVE (EXTREME만 허용, 포지션 25%, 신뢰도 +15)
    ledger.set_current_capital(dec!(7500)).unwrap();
    let pipeline = pipeline_with_ledger(ledger);

    let decision = pipeline.evaluate(&prime_candidate(), scan_time()).unwrap();

    // EXTREME 티어에 신뢰도 100 >= 70 + 15라서 수락 자체는 유지되고,
    // 포지션 배수만 0.25로 줄어든다
    let Decision::Accept(intent) = decision else {
        panic!("expected accept, got {:?}", decision.rejection_reason());
    };
    assert_eq!(intent.position_multiplier, 0.25);
    assert_eq!(intent.threshold, 85);
}

#[test]
fn test_drawdown_halt_rejects_everything() {
    let ledger = Arc::new(InMemoryLedger::new(dec!(10000)));
    // 35% 드로다운: HALT
    ledger.set_current_capital(dec!(6500)).unwrap();
    let pipeline = pipeline_with_ledger(ledger);

    let decision = pipeline.evaluate(&prime_candidate(), scan_time()).unwrap();

    assert_eq!(
        decision.rejection_reason(),
        Some(&RejectionReason::DrawdownHalt)
    );
}

#[test]
fn test_cold_streak_raises_threshold() {
    let ledger = Arc::new(InMemoryLedger::new(dec!(10000)));
    // 승률 10% (10개 중 1승): 임계값 70 -> 80.
    // 최신 기록을 승리로 두어 연속 손실 브레이커는 건드리지 않는다.
    for i in 0..9 {
        ledger
            .record_outcome(TradeOutcome {
                win: false,
                pnl_pct: -0.1,
                closed_at: Utc::now() - Duration::days(3) - Duration::hours(i as i64),
            })
            .unwrap();
    }
    ledger
        .record_outcome(TradeOutcome {
            win: true,
            pnl_pct: 0.5,
            closed_at: Utc::now() - Duration::days(2),
        })
        .unwrap();
    let pipeline = pipeline_with_ledger(ledger);

    let decision = pipeline.evaluate(&prime_candidate(), scan_time()).unwrap();

    // 신뢰도 100은 상향된 임계값도 넘으므로 수락 자체는 유지된다
    let Decision::Accept(intent) = decision else {
        panic!("expected accept, got {:?}", decision.rejection_reason());
    };
    assert_eq!(intent.threshold, 80);
}

#[test]
fn test_ml_model_feeds_win_probability_through() {
    let ledger = Arc::new(InMemoryLedger::new(dec!(10000)));
    let pipeline = pipeline_with_ledger(ledger).with_model(Arc::new(MockModel::new(0.85)));

    let decision = pipeline.evaluate(&prime_candidate(), scan_time()).unwrap();

    let Decision::Accept(intent) = decision else {
        panic!("expected accept, got {:?}", decision.rejection_reason());
    };
    assert_eq!(intent.win_probability, Some(0.85));
}

#[test]
fn test_run_scan_mixes_accepts_and_rejects() {
    let ledger = Arc::new(InMemoryLedger::new(dec!(10000)));
    let pipeline = pipeline_with_ledger(ledger);

    let good = prime_candidate();

    let mut flat_snap = prime_buy_snapshot();
    flat_snap.rsi = 50.0;
    flat_snap.macd_crossover = None;
    flat_snap.macd_hist = 0.0;
    flat_snap.bb_pctb = 0.5;
    flat_snap.stoch_k = 50.0;
    flat_snap.adx = 16.0;
    flat_snap.volume_ratio = 1.0;
    flat_snap.ma_cross = None;
    flat_snap.obv_trend = ObvTrend::Flat;
    flat_snap.ema9 = dec!(100);
    flat_snap.ema21 = dec!(100);
    flat_snap.ema50 = dec!(100);
    let flat = ScanCandidate::new("DOGE/USDT", flat_snap);

    let decisions = pipeline.run_scan(&[good, flat], scan_time());

    assert_eq!(decisions.len(), 2);
    assert!(decisions[0].is_accept());
    assert_eq!(
        decisions[1].rejection_reason(),
        Some(&RejectionReason::NeutralSignal)
    );
}
