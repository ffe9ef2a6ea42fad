//! CHoCH 확정 검사.
//!
//! 최근 3개 마감 캔들 — pre-CHoCH `[-3]`, CHoCH `[-2]`, 확정 `[-1]` —
//! 이 마지막으로 검증된 8피벗 패턴과 맞는 반전을 완성하는지 판정합니다.
//!
//! 상방(UP) 반전은 하락 패턴을, 하방(DOWN) 반전은 상승 패턴을 뒤집는
//! 것이므로 방향은 저장된 패턴 방향과 교차 대응합니다. 조건이 아직
//! 충족되지 않은 것은 에러가 아니며 단순히 발화하지 않습니다.

use crate::pivot::Pivot;
use crate::state::TimeframeState;
use crate::{DetectorError, DetectorResult};
use choch_core::{Candle, ChochSignal, Direction, PatternGroup};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

/// 감지 결과.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// 시그널 발화 여부
    pub fired: bool,
    /// 시그널 방향
    pub direction: Option<Direction>,
    /// 패턴 그룹
    pub group: Option<PatternGroup>,
    /// 시그널 가격 (CHoCH 봉의 종가)
    pub price: Option<Decimal>,
    /// 시그널 시각 (확정 봉의 시작 시간)
    pub signal_time: Option<DateTime<Utc>>,
    /// 패턴 피벗 P1..P8
    pub pivots: Option<[Pivot; 8]>,
}

impl Detection {
    /// 발화하지 않은 결과를 생성합니다.
    pub fn none() -> Self {
        Self::default()
    }

    /// 발화한 결과를 시그널로 변환합니다.
    pub fn to_signal(&self, window: &[Candle]) -> Option<ChochSignal> {
        if !self.fired {
            return None;
        }
        let last = window.last()?;
        let pivots = self.pivots.as_ref()?;

        Some(ChochSignal::new(
            last.symbol.clone(),
            last.timeframe,
            self.direction?,
            self.group?,
            self.price?,
            self.signal_time?,
            std::array::from_fn(|i| pivots[i].price),
            std::array::from_fn(|i| pivots[i].bar),
        ))
    }
}

/// CHoCH 확정 검사를 수행합니다.
///
/// 발화 시 `choch_locked`를 설정하고 발화 정보를 담은 [`Detection`]을
/// 반환합니다. 패턴이 없거나 조건 미충족이면 빈 결과를 반환합니다.
pub fn check_choch(state: &mut TimeframeState, window: &[Candle]) -> DetectorResult<Detection> {
    // 확정에는 마감 캔들 3개가 필요하다
    if window.len() < 3 {
        return Ok(Detection::none());
    }
    if !state.has_pattern() {
        return Ok(Detection::none());
    }
    let Some(last_eight_bar) = state.last_eight_bar else {
        return Ok(Detection::none());
    };

    let cur_bar = window.len() - 1;
    if cur_bar <= last_eight_bar {
        return Ok(Detection::none());
    }

    // 패턴이 성립했는데 그룹/참조가 없으면 로직 버그다
    let group = state.group.ok_or(DetectorError::MissingGroup)?;
    let (p2, p5, p6, p7) = match (state.p2_ref, state.p5_ref, state.p6_ref, state.p7_ref) {
        (Some(p2), Some(p5), Some(p6), Some(p7)) => (p2, p5, p6, p7),
        _ => return Err(DetectorError::MissingPatternRefs),
    };
    let pattern = state.pattern.ok_or(DetectorError::MissingPatternRefs)?;

    let pre = &window[cur_bar - 2];
    let mid = &window[cur_bar - 1];
    let cur = &window[cur_bar];

    // 피벗 봉 거래량 v1..v8, CHoCH 봉 거래량 v_mid
    let mut vols = [Decimal::ZERO; 8];
    for (i, pivot) in pattern.iter().enumerate() {
        let candle = window
            .get(pivot.bar)
            .ok_or(DetectorError::PivotOutOfWindow { bar: pivot.bar })?;
        vols[i] = candle.volume;
    }
    let v_mid = mid.volume;

    let (direction, base, basic, group_price) = if state.last_eight_down {
        // 하락 패턴의 상방 반전
        let base =
            mid.low > pre.low && mid.close > pre.high && mid.close > p6 && mid.close < p2;
        let basic = cur.low > pre.high && cur.close <= p2;
        let group_price = match group {
            PatternGroup::G1 | PatternGroup::G3 => cur.close <= p5,
            PatternGroup::G2 => cur.close <= p7,
        };
        (Direction::Up, base, basic, group_price)
    } else {
        // 상승 패턴의 하방 반전
        let base =
            mid.high < pre.high && mid.close < pre.low && mid.close < p6 && mid.close > p2;
        let basic = cur.high < pre.low && cur.close >= p2;
        let group_price = match group {
            PatternGroup::G1 | PatternGroup::G3 => cur.close >= p5,
            PatternGroup::G2 => cur.close >= p7,
        };
        (Direction::Down, base, basic, group_price)
    };

    let volume_ok = match group {
        PatternGroup::G1 => g1_volume_ok(&vols, v_mid),
        PatternGroup::G2 | PatternGroup::G3 => g23_volume_ok(&vols, v_mid),
    };

    if state.choch_locked || !(base && basic && group_price && volume_ok) {
        return Ok(Detection::none());
    }

    state.choch_locked = true;

    info!(
        direction = %direction,
        group = %group,
        price = %mid.close,
        signal_time = %cur.open_time,
        "CHoCH 확정"
    );

    Ok(Detection {
        fired: true,
        direction: Some(direction),
        group: Some(group),
        price: Some(mid.close),
        signal_time: Some(cur.open_time),
        pivots: Some(pattern),
    })
}

/// G1 거래량 조건: (A ∧ B) ∨ C.
///
/// - A (678 클러스터): `max(v6, v7, v8) ∈ {v6, v8, v_mid}`
/// - B (456 클러스터): `max(v4, v5, v6) ∈ {v4, v6}`
/// - C (45678 클러스터): `max(v4..v8) ∈ {v8, v_mid}`
fn g1_volume_ok(v: &[Decimal; 8], v_mid: Decimal) -> bool {
    let m678 = v[5].max(v[6]).max(v[7]);
    let a = m678 == v[5] || m678 == v[7] || m678 == v_mid;

    let m456 = v[3].max(v[4]).max(v[5]);
    let b = m456 == v[3] || m456 == v[5];

    let m45678 = m456.max(v[6]).max(v[7]);
    let c = m45678 == v[7] || m45678 == v_mid;

    (a && b) || c
}

/// G2/G3 거래량 조건 (456 클러스터): `max(v4, v5, v6) ∈ {v4, v5, v_mid}`.
fn g23_volume_ok(v: &[Decimal; 8], v_mid: Decimal) -> bool {
    let m456 = v[3].max(v[4]).max(v[5]);
    m456 == v[3] || m456 == v[4] || m456 == v_mid
}
