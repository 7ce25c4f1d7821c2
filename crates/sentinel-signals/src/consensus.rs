//! 지표 합의 엔진.
//!
//! 12명의 고정된 투표자가 제안된 방향에 대해 찬성/반대/기권으로
//! 투표합니다. 찬성이 충분히 많고 반대가 거의 없어야 통과하며,
//! 입력이 없는 투표자는 기권합니다. 표 수는 항상 12입니다.

use serde::{Deserialize, Serialize};
use tracing::debug;

use sentinel_core::{
    Direction, FeatureSnapshot, MacdCross, ObvTrend, StructureSummary,
};

use crate::config::ConsensusConfig;
use crate::scorer::ScoreContext;

/// 투표자 수 (고정).
pub const VOTER_COUNT: usize = 12;

/// 단일 투표자의 표.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vote {
    For,
    Against,
    Abstain,
}

/// 투표자별 기록.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    /// 투표자 이름
    pub voter: String,
    /// 표
    pub vote: Vote,
}

/// 합의 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// 찬성 수
    pub votes_for: u32,
    /// 반대 수
    pub votes_against: u32,
    /// 기권 수
    pub abstentions: u32,
    /// 통과 여부
    pub passes: bool,
    /// 투표자별 기록 (항상 12개)
    pub ballots: Vec<Ballot>,
}

/// 합의 엔진.
#[derive(Debug, Clone, Default)]
pub struct ConsensusEngine {
    config: ConsensusConfig,
}

impl ConsensusEngine {
    /// 주어진 설정으로 엔진을 생성합니다.
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// 제안된 방향에 대해 투표를 수행합니다.
    pub fn evaluate(
        &self,
        direction: Direction,
        features: &FeatureSnapshot,
        ctx: &ScoreContext<'_>,
        structure: Option<&StructureSummary>,
    ) -> ConsensusResult {
        let features = features.sanitized();
        let opposite = direction.opposite();

        let votes: [(&str, Vote); VOTER_COUNT] = [
            ("RSI", self.vote_rsi(direction, features.rsi)),
            ("MACD", self.vote_macd(direction, &features)),
            ("BB", self.vote_bb(direction, features.bb_pctb)),
            ("STOCH", self.vote_stoch(direction, features.stoch_k)),
            ("EMA_STACK", self.vote_ema_stack(direction, &features)),
            (
                "MTF",
                match ctx.timeframe {
                    Some(tfa) if tfa.supports(direction) => Vote::For,
                    Some(tfa) if tfa.dominant == opposite => Vote::Against,
                    _ => Vote::Abstain,
                },
            ),
            ("VOLUME", self.vote_volume(direction, &features)),
            (
                "ORDER_FLOW",
                match ctx.order_flow {
                    Some(flow) if flow.direction == direction => Vote::For,
                    Some(flow) if flow.direction == opposite => Vote::Against,
                    _ => Vote::Abstain,
                },
            ),
            (
                "MARKET_STRUCT",
                match structure.and_then(|s| s.break_direction) {
                    Some(d) if d == direction => Vote::For,
                    Some(d) if d == opposite => Vote::Against,
                    _ => Vote::Abstain,
                },
            ),
            ("STRUCT_ZONE", self.vote_structure_zone(direction, structure)),
            ("FUNDING", self.vote_funding(direction, ctx)),
            ("FEAR_GREED", self.vote_fear_greed(direction, ctx.fear_greed)),
        ];

        let mut votes_for = 0;
        let mut votes_against = 0;
        let mut abstentions = 0;
        let mut ballots = Vec::with_capacity(VOTER_COUNT);
        for (voter, vote) in votes {
            match vote {
                Vote::For => votes_for += 1,
                Vote::Against => votes_against += 1,
                Vote::Abstain => abstentions += 1,
            }
            ballots.push(Ballot {
                voter: voter.to_string(),
                vote,
            });
        }

        let passes =
            votes_for >= self.config.required_for && votes_against <= self.config.max_against;

        debug!(
            %direction,
            votes_for,
            votes_against,
            abstentions,
            passes,
            "Consensus vote complete"
        );

        ConsensusResult {
            votes_for,
            votes_against,
            abstentions,
            passes,
            ballots,
        }
    }

    fn vote_rsi(&self, direction: Direction, rsi: f64) -> Vote {
        match direction {
            Direction::Buy => {
                if rsi <= 42.0 {
                    Vote::For
                } else if rsi >= 60.0 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Sell => {
                if rsi >= 58.0 {
                    Vote::For
                } else if rsi <= 40.0 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Neutral => Vote::Abstain,
        }
    }

    fn vote_macd(&self, direction: Direction, features: &FeatureSnapshot) -> Vote {
        if let Some(cross) = features.macd_crossover {
            let bullish = cross == MacdCross::Bullish;
            return match direction {
                Direction::Buy if bullish => Vote::For,
                Direction::Buy => Vote::Against,
                Direction::Sell if !bullish => Vote::For,
                Direction::Sell => Vote::Against,
                Direction::Neutral => Vote::Abstain,
            };
        }
        match direction {
            Direction::Buy if features.macd_hist > 0.0 => Vote::For,
            Direction::Buy if features.macd_hist < 0.0 => Vote::Against,
            Direction::Sell if features.macd_hist < 0.0 => Vote::For,
            Direction::Sell if features.macd_hist > 0.0 => Vote::Against,
            _ => Vote::Abstain,
        }
    }

    fn vote_bb(&self, direction: Direction, pctb: f64) -> Vote {
        match direction {
            Direction::Buy => {
                if pctb <= 0.30 {
                    Vote::For
                } else if pctb >= 0.75 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Sell => {
                if pctb >= 0.70 {
                    Vote::For
                } else if pctb <= 0.25 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Neutral => Vote::Abstain,
        }
    }

    fn vote_stoch(&self, direction: Direction, stoch_k: f64) -> Vote {
        match direction {
            Direction::Buy => {
                if stoch_k <= 30.0 {
                    Vote::For
                } else if stoch_k >= 75.0 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Sell => {
                if stoch_k >= 70.0 {
                    Vote::For
                } else if stoch_k <= 25.0 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Neutral => Vote::Abstain,
        }
    }

    fn vote_ema_stack(&self, direction: Direction, f: &FeatureSnapshot) -> Vote {
        match direction {
            Direction::Buy => {
                if f.price > f.ema9 && f.ema9 > f.ema21 && f.ema21 > f.ema50 {
                    Vote::For
                } else if f.price < f.ema21 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Sell => {
                if f.price < f.ema9 && f.ema9 < f.ema21 && f.ema21 < f.ema50 {
                    Vote::For
                } else if f.price > f.ema21 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Neutral => Vote::Abstain,
        }
    }

    fn vote_volume(&self, direction: Direction, f: &FeatureSnapshot) -> Vote {
        let obv_opposes = matches!(
            (direction, f.obv_trend),
            (Direction::Buy, ObvTrend::Falling) | (Direction::Sell, ObvTrend::Rising)
        );
        if f.volume_ratio >= 1.2 && !obv_opposes {
            Vote::For
        } else if f.volume_ratio < 0.8 {
            Vote::Against
        } else {
            Vote::Abstain
        }
    }

    fn vote_structure_zone(
        &self,
        direction: Direction,
        structure: Option<&StructureSummary>,
    ) -> Vote {
        let Some(s) = structure else {
            return Vote::Abstain;
        };
        match direction {
            Direction::Buy => {
                if s.near_support_zone {
                    Vote::For
                } else if s.near_resistance_zone {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Sell => {
                if s.near_resistance_zone {
                    Vote::For
                } else if s.near_support_zone {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Neutral => Vote::Abstain,
        }
    }

    fn vote_funding(&self, direction: Direction, ctx: &ScoreContext<'_>) -> Vote {
        let Some(rate) = ctx.funding else {
            return Vote::Abstain;
        };
        // 양수 펀딩 = 롱 과밀. 매도는 부호를 뒤집습니다.
        let effective = match direction {
            Direction::Buy => rate.rate_pct,
            Direction::Sell => -rate.rate_pct,
            Direction::Neutral => return Vote::Abstain,
        };
        if effective < -0.005 {
            Vote::For
        } else if effective > 0.03 {
            Vote::Against
        } else {
            Vote::Abstain
        }
    }

    fn vote_fear_greed(&self, direction: Direction, fear_greed: Option<i32>) -> Vote {
        let Some(fg) = fear_greed else {
            return Vote::Abstain;
        };
        match direction {
            Direction::Buy => {
                if fg <= 35 {
                    Vote::For
                } else if fg >= 85 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Sell => {
                if fg >= 65 {
                    Vote::For
                } else if fg <= 15 {
                    Vote::Against
                } else {
                    Vote::Abstain
                }
            }
            Direction::Neutral => Vote::Abstain,
        }
    }
}
