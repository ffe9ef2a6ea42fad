//! 8피벗 패턴 검증.
//!
//! 마지막 8개 피벗 P1..P8이 유효한 상승/하락 패턴인지 판정합니다.
//! 유효성 = 교대 구조 ∧ 리테스트 ∧ 극값 ∧ 돌파 ∧ (G1 ∨ G2 ∨ G3).
//!
//! 검증에 성공하면 상태에 방향 플래그, 그룹 태그, 참조 가격
//! (P2/P5/P6/P7), P8 봉 인덱스, 패턴 피벗을 기록합니다. 잠금
//! (`choch_locked`)은 건드리지 않습니다. 잠금은 확정기와
//! 신규-피벗 해제 규칙이 관리합니다.

use crate::pivot::PivotKind;
use crate::state::TimeframeState;
use choch_core::{Candle, PatternGroup};
use rust_decimal::Decimal;
use tracing::info;

/// 마지막 8개 피벗으로 8피벗 패턴을 검증합니다.
///
/// 성공하면 상태를 갱신하고 `true`를 반환합니다. 실패하면 상태를
/// 변경하지 않습니다 (호출자가 재구성 전에 상태를 초기화합니다).
pub fn check_eight_pattern(state: &mut TimeframeState, window: &[Candle]) -> bool {
    let Some(pivots) = state.last_eight() else {
        return false;
    };

    let prices: [Decimal; 8] = std::array::from_fn(|i| pivots[i].price);
    let kinds: [PivotKind; 8] = std::array::from_fn(|i| pivots[i].kind);

    // 교대 구조: 상승은 L,H,L,H,L,H,L,H / 하락은 H,L,H,L,H,L,H,L
    let up_struct = kinds
        .iter()
        .enumerate()
        .all(|(i, k)| *k == if i % 2 == 0 { PivotKind::Low } else { PivotKind::High });
    let down_struct = kinds
        .iter()
        .enumerate()
        .all(|(i, k)| *k == if i % 2 == 0 { PivotKind::High } else { PivotKind::Low });

    if !(up_struct || down_struct) {
        return false;
    }

    // 피벗 봉의 고가/저가 조회
    let bar_high = |i: usize| window.get(pivots[i].bar).map(|c| c.high);
    let bar_low = |i: usize| window.get(pivots[i].bar).map(|c| c.low);

    let (Some(hi7), Some(lo7), Some(hi4), Some(lo4)) =
        (bar_high(6), bar_low(6), bar_high(3), bar_low(3))
    else {
        return false;
    };

    // 리테스트: P7이 P4 구간을 다시 건드려야 한다
    let retest = (up_struct && lo7 < hi4) || (down_struct && hi7 > lo4);
    if !retest {
        return false;
    }

    // 극값: 상승이면 P8이 최고가, 하락이면 최저가
    let max_price = prices.iter().copied().max().unwrap_or(prices[7]);
    let min_price = prices.iter().copied().min().unwrap_or(prices[7]);
    let extreme = (up_struct && prices[7] == max_price) || (down_struct && prices[7] == min_price);
    if !extreme {
        return false;
    }

    // 돌파: 상승은 lo5 > hi2 ∧ lo3 > lo1, 하락은 hi5 < lo2 ∧ hi3 < hi1
    let (Some(hi5), Some(lo5), Some(hi2), Some(lo2)) =
        (bar_high(4), bar_low(4), bar_high(1), bar_low(1))
    else {
        return false;
    };
    let (Some(hi3), Some(lo3), Some(hi1), Some(lo1)) =
        (bar_high(2), bar_low(2), bar_high(0), bar_low(0))
    else {
        return false;
    };

    let breakout = if up_struct {
        lo5 > hi2 && lo3 > lo1
    } else {
        hi5 < lo2 && hi3 < hi1
    };
    if !breakout {
        return false;
    }

    let group = if up_struct {
        classify_group_up(&prices)
    } else {
        classify_group_down(&prices)
    };
    let Some(group) = group else {
        return false;
    };

    state.last_eight_up = up_struct;
    state.last_eight_down = down_struct;
    state.group = Some(group);
    state.p2_ref = Some(prices[1]);
    state.p5_ref = Some(prices[4]);
    state.p6_ref = Some(prices[5]);
    state.p7_ref = Some(prices[6]);
    state.last_eight_bar = Some(pivots[7].bar);
    state.pattern = Some(pivots);

    info!(
        direction = if up_struct { "up" } else { "down" },
        group = %group,
        p8_bar = pivots[7].bar,
        "8피벗 패턴 성립"
    );

    true
}

/// 상승 패턴의 그룹 분류.
///
/// 판정 우선순위 G1 > G2 > G3: 순서대로 평가해 첫 번째로 만족하는
/// 그룹을 선택한다.
fn classify_group_up(p: &[Decimal; 8]) -> Option<PatternGroup> {
    let (p2, p3, p4, p5, p6, p7, p8) = (p[1], p[2], p[3], p[4], p[5], p[6], p[7]);

    if p2 < p4 && p4 < p6 && p6 < p8 && p3 < p5 && p5 < p7 {
        return Some(PatternGroup::G1);
    }
    if p3 < p7 && p7 < p5 && p2 < p6 && p6 < p4 && p4 < p8 && p2 < p5 {
        return Some(PatternGroup::G2);
    }
    if p3 < p5 && p5 < p7 && p2 < p6 && p6 < p4 && p4 < p8 && p2 < p5 {
        return Some(PatternGroup::G3);
    }
    None
}

/// 하락 패턴의 그룹 분류 (상승의 대칭).
///
/// 판정 우선순위 G1 > G2 > G3.
fn classify_group_down(p: &[Decimal; 8]) -> Option<PatternGroup> {
    let (p2, p3, p4, p5, p6, p7, p8) = (p[1], p[2], p[3], p[4], p[5], p[6], p[7]);

    if p2 > p4 && p4 > p6 && p6 > p8 && p3 > p5 && p5 > p7 {
        return Some(PatternGroup::G1);
    }
    if p3 > p7 && p7 > p5 && p2 > p6 && p6 > p4 && p4 > p8 && p2 > p5 {
        return Some(PatternGroup::G2);
    }
    if p3 > p5 && p5 > p7 && p2 > p6 && p6 > p4 && p4 > p8 && p2 > p5 {
        return Some(PatternGroup::G3);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::{Pivot, PivotVariant};
    use choch_core::{Symbol, Timeframe};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// 피벗 명세 (봉 인덱스, 가격, 종류)로 윈도우와 상태를 구성.
    ///
    /// 피벗 봉은 고점이면 `high = price`, 저점이면 `low = price`가 되도록
    /// 만들고 나머지 봉은 중립 값으로 채운다.
    fn build(
        spec: &[(usize, Decimal, PivotKind)],
        len: usize,
    ) -> (Vec<Candle>, TimeframeState) {
        let start = Utc.with_ymd_and_hms(2025, 10, 24, 0, 0, 0).unwrap();
        let mut window = Vec::with_capacity(len);

        for i in 0..len {
            let (high, low) = match spec.iter().find(|(bar, _, _)| *bar == i) {
                Some((_, price, PivotKind::High)) => (*price, *price - dec!(2)),
                Some((_, price, PivotKind::Low)) => (*price + dec!(2), *price),
                None => (dec!(90), dec!(88)),
            };
            window.push(Candle::new(
                Symbol::new("BTC", "USDT"),
                Timeframe::M15,
                start + Duration::minutes(15 * i as i64),
                low + dec!(0.1),
                high,
                low,
                high - dec!(0.1),
                dec!(100),
            ));
        }

        let mut state = TimeframeState::new(200);
        for (bar, price, kind) in spec {
            state.store_pivot(Pivot {
                bar: *bar,
                price: *price,
                kind: *kind,
                variant: Some(PivotVariant::Ph1),
            });
        }

        (window, state)
    }

    const BARS: [usize; 8] = [2, 5, 8, 11, 14, 17, 20, 23];

    fn spec_from(prices: [Decimal; 8], first: PivotKind) -> Vec<(usize, Decimal, PivotKind)> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let kind = if i % 2 == 0 { first } else { first.opposite() };
                (BARS[i], *p, kind)
            })
            .collect()
    }

    /// 유효한 G1 하락 패턴: 리테스트(hi7 > lo4)와 돌파(hi5 < lo2)를
    /// 모두 만족하는 기하 구조.
    fn valid_g1_down() -> [Decimal; 8] {
        [
            dec!(120),   // P1 H
            dec!(108),   // P2 L
            dec!(106),   // P3 H
            dec!(101),   // P4 L
            dec!(102),   // P5 H
            dec!(98),    // P6 L
            dec!(101.5), // P7 H
            dec!(96),    // P8 L
        ]
    }

    #[test]
    fn test_valid_g1_down_pattern() {
        let spec = spec_from(valid_g1_down(), PivotKind::High);
        let (window, mut state) = build(&spec, 26);

        assert!(check_eight_pattern(&mut state, &window));
        assert!(state.last_eight_down);
        assert!(!state.last_eight_up);
        assert_eq!(state.group, Some(PatternGroup::G1));
        assert_eq!(state.p2_ref, Some(dec!(108)));
        assert_eq!(state.p5_ref, Some(dec!(102)));
        assert_eq!(state.p6_ref, Some(dec!(98)));
        assert_eq!(state.p7_ref, Some(dec!(101.5)));
        assert_eq!(state.last_eight_bar, Some(23));
        // 잠금은 검증이 건드리지 않는다
        assert!(!state.choch_locked);
    }

    #[test]
    fn test_valid_g1_up_pattern() {
        let prices = [
            dec!(80),  // P1 L
            dec!(100), // P2 H
            dec!(101), // P3 L
            dec!(110), // P4 H
            dec!(102), // P5 L
            dec!(115), // P6 H
            dec!(105), // P7 L
            dec!(120), // P8 H
        ];
        let spec = spec_from(prices, PivotKind::Low);
        let (window, mut state) = build(&spec, 26);

        assert!(check_eight_pattern(&mut state, &window));
        assert!(state.last_eight_up);
        assert_eq!(state.group, Some(PatternGroup::G1));
        // 극값 불변식: P8이 최고가
        assert_eq!(state.pattern.unwrap()[7].price, dec!(120));
    }

    #[test]
    fn test_g2_up_pattern() {
        let prices = [
            dec!(85),  // P1 L
            dec!(90),  // P2 H
            dec!(95),  // P3 L
            dec!(104), // P4 H
            dec!(98),  // P5 L
            dec!(103), // P6 H
            dec!(97),  // P7 L
            dec!(110), // P8 H
        ];
        let spec = spec_from(prices, PivotKind::Low);
        let (window, mut state) = build(&spec, 26);

        assert!(check_eight_pattern(&mut state, &window));
        assert_eq!(state.group, Some(PatternGroup::G2));
    }

    #[test]
    fn test_g3_up_pattern() {
        let prices = [
            dec!(85),  // P1 L
            dec!(90),  // P2 H
            dec!(95),  // P3 L
            dec!(104), // P4 H
            dec!(97),  // P5 L
            dec!(103), // P6 H
            dec!(99),  // P7 L
            dec!(110), // P8 H
        ];
        let spec = spec_from(prices, PivotKind::Low);
        let (window, mut state) = build(&spec, 26);

        assert!(check_eight_pattern(&mut state, &window));
        assert_eq!(state.group, Some(PatternGroup::G3));
    }

    #[test]
    fn test_broken_alternation_rejected() {
        let mut spec = spec_from(valid_g1_down(), PivotKind::High);
        // P3을 저점으로 바꿔 교대 구조를 깨뜨린다
        spec[2].2 = PivotKind::Low;
        let (window, mut state) = build(&spec, 26);

        assert!(!check_eight_pattern(&mut state, &window));
        assert!(!state.has_pattern());
        assert!(state.group.is_none());
    }

    #[test]
    fn test_failed_retest_rejected() {
        let mut prices = valid_g1_down();
        // hi7(100.5) > lo4(101)이 거짓이 되도록 P7을 낮춘다
        prices[6] = dec!(100.5);
        let spec = spec_from(prices, PivotKind::High);
        let (window, mut state) = build(&spec, 26);

        assert!(!check_eight_pattern(&mut state, &window));
    }

    #[test]
    fn test_failed_breakout_rejected() {
        let mut prices = valid_g1_down();
        // hi5 < lo2가 거짓이 되도록 P5를 P2 위로 올린다
        prices[4] = dec!(109);
        prices[2] = dec!(110);
        prices[0] = dec!(120);
        let spec = spec_from(prices, PivotKind::High);
        let (window, mut state) = build(&spec, 26);

        assert!(!check_eight_pattern(&mut state, &window));
    }

    #[test]
    fn test_no_group_rejected() {
        // 구조/리테스트/돌파는 만족하지만 어떤 그룹 순서도 만족하지 않는 기하
        let prices = [
            dec!(120), // P1 H
            dec!(103), // P2 L
            dec!(106), // P3 H
            dec!(108), // P4 L  (p2 > p4 위반, p6 > p4 위반)
            dec!(102), // P5 H
            dec!(98),  // P6 L
            dec!(110), // P7 H (리테스트: 110 > 108)
            dec!(96),  // P8 L
        ];
        let spec = spec_from(prices, PivotKind::High);
        let (window, mut state) = build(&spec, 26);

        assert!(!check_eight_pattern(&mut state, &window));
        assert!(state.group.is_none());
    }

    #[test]
    fn test_group_precedence_g1_first() {
        // G1 기하는 G3 조건과 겹치지 않지만, 평가 순서가 G1부터임을 고정한다
        assert_eq!(
            classify_group_down(&valid_g1_down()),
            Some(PatternGroup::G1)
        );
    }

    #[test]
    fn test_exactly_one_group() {
        // 그룹 순서는 상호 배타적이다: G1 기하는 G2/G3 체인을 만족하지 않는다
        let p = valid_g1_down();
        let (p3, p4, p5, p6, p7) = (p[2], p[3], p[4], p[5], p[6]);
        // G2 체인 p3 > p7 > p5 와 G3 체인 p6 > p4는 G1 체인과 동시에 성립할 수 없다
        assert!(!(p3 > p7 && p7 > p5 && p6 > p4));
    }
}
