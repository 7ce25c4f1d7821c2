//! 목표가 도달 시간 추정.
//!
//! ATR 기반 일간 기대 변동폭을 ADX(추세 강도)와 거래량 배율로
//! 보정하여 목표가별 예상 소요 일수를 계산합니다. 가격은 직선으로
//! 움직이지 않으므로 ATR의 일부만 추세 진행분으로 간주합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ATR 중 추세 방향 진행분으로 보는 비율.
const TREND_EFFICIENCY: f64 = 0.40;

/// 멀수록 불확실한 목표가별 가중치.
const UNCERTAINTY: [f64; 3] = [1.0, 1.15, 1.3];

/// 목표가 하나의 도달 시간 추정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEta {
    /// 목표가
    pub target: Decimal,
    /// 예상 소요 일수 (암호화폐는 달력일, 주식은 거래일)
    pub days: f64,
    /// 사람이 읽는 표기 (예: "~6h", "~3d", "~2w")
    pub label: String,
}

/// 목표가 3단계의 도달 시간을 추정합니다.
///
/// ATR이나 가격이 비정상이면 빈 벡터를 반환합니다. 암호화폐는
/// 4시간봉 ATR과 24시간 장을, 주식은 일봉 ATR과 하루 8시간 장을
/// 가정합니다.
pub fn estimate_target_etas(
    price: Decimal,
    atr: Decimal,
    adx: f64,
    volume_ratio: f64,
    targets: &[Decimal; 3],
    is_crypto: bool,
) -> Vec<TargetEta> {
    let price_f = price.to_f64().unwrap_or(0.0);
    let atr_f = atr.to_f64().unwrap_or(0.0);
    if price_f <= 0.0 || atr_f <= 0.0 {
        return Vec::new();
    }

    // 일간 ATR 환산: 4시간봉 6개가 겹치는 구간이라 sqrt 스케일
    let daily_atr = if is_crypto {
        atr_f * 6.0_f64.sqrt()
    } else {
        atr_f
    };

    let adx = adx.max(5.0);
    let adx_factor = if adx >= 40.0 {
        0.65
    } else if adx >= 25.0 {
        0.80
    } else if adx >= 15.0 {
        1.0
    } else {
        1.4
    };

    let volume_ratio = volume_ratio.max(0.3);
    let vol_factor = if volume_ratio >= 2.0 {
        0.75
    } else if volume_ratio >= 1.3 {
        0.90
    } else if volume_ratio >= 0.7 {
        1.0
    } else {
        1.3
    };

    let effective_daily_move = daily_atr * TREND_EFFICIENCY / adx_factor / vol_factor;
    if effective_daily_move <= 0.0 {
        return Vec::new();
    }

    targets
        .iter()
        .zip(UNCERTAINTY)
        .map(|(&target, uncertainty)| {
            let distance = (target.to_f64().unwrap_or(price_f) - price_f).abs();
            let days = distance / effective_daily_move * uncertainty;
            TargetEta {
                target,
                days: (days * 10.0).round() / 10.0,
                label: format_eta(days, is_crypto),
            }
        })
        .collect()
}

/// 소요 일수를 사람이 읽는 표기로 변환합니다.
fn format_eta(days: f64, is_crypto: bool) -> String {
    // 주식은 거래일 기준이라 주당 5일, 월당 22일로 환산
    let (hours_per_day, days_per_week, days_per_month) = if is_crypto {
        (24.0, 7.0, 30.0)
    } else {
        (8.0, 5.0, 22.0)
    };

    let hours = days * hours_per_day;
    if hours < 24.0 {
        format!("~{}h", (hours.round() as i64).max(1))
    } else if days < 7.0 {
        format!("~{}d", (days.round() as i64).max(1))
    } else if days < days_per_month * 2.0 {
        format!("~{}w", ((days / days_per_week).round() as i64).max(1))
    } else {
        format!("~{}mo", ((days / days_per_month).round() as i64).max(1))
    }
}
