//! (심볼, 타임프레임) 단위 감지 상태.

use crate::pivot::Pivot;
use choch_core::PatternGroup;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// (심볼, 타임프레임) 하나에 대한 감지 상태.
///
/// 피벗 히스토리와 마지막으로 검증된 8피벗 패턴 정보, CHoCH 잠금을
/// 보관합니다. 실전 흐름에서는 스캔마다 [`TimeframeState::reset`] 후
/// 새 윈도우에서 전부 재구성되므로, 패턴/잠금 전이는 한 스캔 안에서만
/// 의미를 갖습니다.
#[derive(Debug, Clone)]
pub struct TimeframeState {
    /// 봉 인덱스 순서의 피벗 히스토리 (상한 `keep_pivots`)
    pivots: VecDeque<Pivot>,
    /// 피벗 저장 상한
    keep_pivots: usize,
    /// 마지막 검증이 상승 8피벗 패턴이었는지
    pub last_eight_up: bool,
    /// 마지막 검증이 하락 8피벗 패턴이었는지
    pub last_eight_down: bool,
    /// 패턴 그룹 태그
    pub group: Option<PatternGroup>,
    /// P2 참조 가격
    pub p2_ref: Option<Decimal>,
    /// P5 참조 가격
    pub p5_ref: Option<Decimal>,
    /// P6 참조 가격
    pub p6_ref: Option<Decimal>,
    /// P7 참조 가격
    pub p7_ref: Option<Decimal>,
    /// P8이 형성된 봉 인덱스
    pub last_eight_bar: Option<usize>,
    /// 검증된 패턴의 8개 피벗 (P1..P8)
    pub pattern: Option<[Pivot; 8]>,
    /// CHoCH 잠금: 패턴 하나당 시그널 하나를 보장
    pub choch_locked: bool,
}

impl TimeframeState {
    /// 새 상태를 생성합니다.
    pub fn new(keep_pivots: usize) -> Self {
        Self {
            pivots: VecDeque::with_capacity(keep_pivots.min(64)),
            keep_pivots,
            last_eight_up: false,
            last_eight_down: false,
            group: None,
            p2_ref: None,
            p5_ref: None,
            p6_ref: None,
            p7_ref: None,
            last_eight_bar: None,
            pattern: None,
            choch_locked: false,
        }
    }

    /// 피벗 히스토리와 패턴/잠금 정보를 모두 초기화합니다.
    ///
    /// 새 윈도우에서 피벗을 재구성하기 전에 호출합니다. 재구성 간에
    /// 피벗이 중복 누적되는 것을 방지합니다.
    pub fn reset(&mut self) {
        self.pivots.clear();
        self.last_eight_up = false;
        self.last_eight_down = false;
        self.group = None;
        self.p2_ref = None;
        self.p5_ref = None;
        self.p6_ref = None;
        self.p7_ref = None;
        self.last_eight_bar = None;
        self.pattern = None;
        self.choch_locked = false;
    }

    /// 피벗을 저장합니다.
    ///
    /// 저장 상한을 넘으면 가장 오래된 피벗이 밀려납니다. 검증된 패턴의
    /// P8보다 엄격하게 새로운 피벗이 저장되면 잠금이 풀리고 패턴이
    /// 비활성화됩니다 (다음 패턴이 새 시그널을 낼 수 있도록).
    pub fn store_pivot(&mut self, pivot: Pivot) {
        if let Some(last_eight_bar) = self.last_eight_bar {
            if pivot.bar > last_eight_bar {
                self.choch_locked = false;
                self.last_eight_up = false;
                self.last_eight_down = false;
            }
        }

        self.pivots.push_back(pivot);
        while self.pivots.len() > self.keep_pivots {
            self.pivots.pop_front();
        }
    }

    /// 저장된 피벗 수를 반환합니다.
    pub fn pivot_count(&self) -> usize {
        self.pivots.len()
    }

    /// 가장 최근 피벗을 반환합니다.
    pub fn last_pivot(&self) -> Option<&Pivot> {
        self.pivots.back()
    }

    /// 마지막 8개 피벗을 오래된 순서(P1..P8)로 반환합니다.
    pub fn last_eight(&self) -> Option<[Pivot; 8]> {
        let n = self.pivots.len();
        if n < 8 {
            return None;
        }
        let mut out = [*self.pivots.back().unwrap(); 8];
        for (i, pivot) in self.pivots.iter().skip(n - 8).enumerate() {
            out[i] = *pivot;
        }
        Some(out)
    }

    /// 저장된 피벗 이터레이터 (봉 인덱스 순).
    pub fn pivots(&self) -> impl Iterator<Item = &Pivot> {
        self.pivots.iter()
    }

    /// 검증된 패턴이 있는지 확인합니다.
    pub fn has_pattern(&self) -> bool {
        self.last_eight_up || self.last_eight_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::{PivotKind, PivotVariant};
    use rust_decimal_macros::dec;

    fn pivot(bar: usize, kind: PivotKind) -> Pivot {
        Pivot {
            bar,
            price: dec!(100),
            kind,
            variant: Some(PivotVariant::Ph1),
        }
    }

    #[test]
    fn test_ring_cap() {
        let mut state = TimeframeState::new(8);
        for i in 0..12 {
            state.store_pivot(pivot(i, PivotKind::High));
        }
        assert_eq!(state.pivot_count(), 8);
        assert_eq!(state.pivots().next().unwrap().bar, 4);
    }

    #[test]
    fn test_last_eight_order() {
        let mut state = TimeframeState::new(200);
        for i in 0..10 {
            state.store_pivot(pivot(i, PivotKind::High));
        }
        let eight = state.last_eight().unwrap();
        assert_eq!(eight[0].bar, 2);
        assert_eq!(eight[7].bar, 9);

        let mut small = TimeframeState::new(200);
        small.store_pivot(pivot(0, PivotKind::High));
        assert!(small.last_eight().is_none());
    }

    #[test]
    fn test_unlock_on_newer_pivot() {
        let mut state = TimeframeState::new(200);
        state.last_eight_bar = Some(23);
        state.last_eight_down = true;
        state.choch_locked = true;

        // P8 이전 봉의 피벗은 잠금을 건드리지 않는다
        state.store_pivot(pivot(20, PivotKind::Low));
        assert!(state.choch_locked);
        assert!(state.last_eight_down);

        // P8보다 새로운 피벗은 잠금을 풀고 패턴을 비활성화한다
        state.store_pivot(pivot(25, PivotKind::High));
        assert!(!state.choch_locked);
        assert!(!state.has_pattern());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = TimeframeState::new(200);
        state.store_pivot(pivot(1, PivotKind::High));
        state.last_eight_up = true;
        state.choch_locked = true;
        state.p5_ref = Some(dec!(102));

        state.reset();
        assert_eq!(state.pivot_count(), 0);
        assert!(!state.has_pattern());
        assert!(!state.choch_locked);
        assert!(state.p5_ref.is_none());
    }
}
