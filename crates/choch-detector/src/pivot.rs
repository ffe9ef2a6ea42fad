//! 피벗 감지 및 변형 분류.
//!
//! 봉 `i`는 고가가 좌우 `left`/`right`개 봉의 고가를 모두 엄격하게
//! 초과할 때 피벗 고점입니다 (저점은 대칭). 감지된 피벗은 주변 3개 봉의
//! 고가/저가 관계에 따라 6가지 변형 중 하나로 분류됩니다.
//!
//! 같은 종류의 피벗이 연속되면 두 피벗 사이 구간에서 반대 극값을 찾아
//! 합성 피벗을 삽입해 교대 구조를 보존합니다. 구간 길이가 3을 넘으면
//! 50봉 윈도우 안에서 신뢰할 수 있는 합성 피벗으로 보기 어려워 삽입하지
//! 않습니다.

use choch_core::Candle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 합성 피벗을 삽입할 수 있는 최대 구간 길이.
const MAX_SYNTHETIC_GAP: usize = 3;

/// 피벗 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotKind {
    /// 피벗 고점
    High,
    /// 피벗 저점
    Low,
}

impl PivotKind {
    /// 반대 종류를 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            PivotKind::High => PivotKind::Low,
            PivotKind::Low => PivotKind::High,
        }
    }
}

/// 피벗 변형.
///
/// 실제 피벗은 주변 3개 봉으로 분류된 PH/PL 변형을 갖고, 합성 피벗은
/// `Synthetic`을 갖습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotVariant {
    Ph1,
    Ph2,
    Ph3,
    Pl1,
    Pl2,
    Pl3,
    /// 교대 구조 보존을 위해 삽입된 합성 피벗
    Synthetic,
}

impl std::fmt::Display for PivotVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PivotVariant::Ph1 => "PH1",
            PivotVariant::Ph2 => "PH2",
            PivotVariant::Ph3 => "PH3",
            PivotVariant::Pl1 => "PL1",
            PivotVariant::Pl2 => "PL2",
            PivotVariant::Pl3 => "PL3",
            PivotVariant::Synthetic => "SYN",
        };
        write!(f, "{}", s)
    }
}

/// 윈도우 내 봉 하나에 대응하는 피벗 점.
///
/// `variant`가 `None`이면 변형 필터를 끈 상태에서 분류에 실패한 채
/// 저장된 피벗입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    /// 윈도우 내 봉 인덱스
    pub bar: usize,
    /// 피벗 가격 (고점이면 고가, 저점이면 저가)
    pub price: Decimal,
    /// 피벗 종류
    pub kind: PivotKind,
    /// 피벗 변형
    pub variant: Option<PivotVariant>,
}

/// 봉 `i`가 피벗 고점인지 확인합니다.
///
/// 고가가 `[i - left, i)` 및 `(i, i + right]` 구간의 모든 고가를
/// 엄격하게 초과해야 합니다. 호출자는 `left <= i < len - right`를
/// 보장해야 합니다.
pub fn is_pivot_high(window: &[Candle], i: usize, left: usize, right: usize) -> bool {
    let center = window[i].high;
    let left_ok = window[i - left..i].iter().all(|c| c.high < center);
    let right_ok = window[i + 1..=i + right].iter().all(|c| c.high < center);
    left_ok && right_ok
}

/// 봉 `i`가 피벗 저점인지 확인합니다.
pub fn is_pivot_low(window: &[Candle], i: usize, left: usize, right: usize) -> bool {
    let center = window[i].low;
    let left_ok = window[i - left..i].iter().all(|c| c.low > center);
    let right_ok = window[i + 1..=i + right].iter().all(|c| c.low > center);
    left_ok && right_ok
}

/// 피벗 변형을 분류합니다.
///
/// 봉 `i - 1`, `i`, `i + 1`의 고가/저가 삼중항으로 판정합니다.
/// 어느 변형에도 해당하지 않으면 `None`을 반환합니다.
pub fn classify_variant(window: &[Candle], i: usize, kind: PivotKind) -> Option<PivotVariant> {
    if i < 1 || i + 1 >= window.len() {
        return None;
    }

    let (h1, h2, h3) = (window[i - 1].high, window[i].high, window[i + 1].high);
    let (l1, l2, l3) = (window[i - 1].low, window[i].low, window[i + 1].low);

    match kind {
        PivotKind::High => {
            if h2 > h1 && h2 > h3 && l2 > l1 && l2 > l3 {
                Some(PivotVariant::Ph1)
            } else if h2 >= h1 && h2 > h3 && l2 > l3 && l2 < l1 {
                Some(PivotVariant::Ph2)
            } else if h2 > h1 && h2 >= h3 && l2 < l3 && l2 > l1 {
                Some(PivotVariant::Ph3)
            } else {
                None
            }
        }
        PivotKind::Low => {
            if l2 < l1 && l2 < l3 && h2 < h1 && h2 < h3 {
                Some(PivotVariant::Pl1)
            } else if h2 >= h1 && h2 < h3 && l2 < l3 && l2 <= l1 {
                Some(PivotVariant::Pl2)
            } else if l2 < l1 && l2 < l3 && h2 < h1 && h2 > h3 {
                Some(PivotVariant::Pl3)
            } else {
                None
            }
        }
    }
}

/// 같은 종류의 피벗이 연속될 때 삽입할 합성 피벗을 계산합니다.
///
/// 두 피벗 사이의 봉 수가 `[1, 3]`일 때만 구간에서 반대 극값(고점 연속이면
/// 최저 저가, 저점 연속이면 최고 고가)을 찾아 반대 종류의 합성 피벗을
/// 만듭니다. 극값이 여러 봉이면 첫 번째 봉을 사용합니다.
pub fn synthetic_pivot(window: &[Candle], last: &Pivot, new_bar: usize, new_kind: PivotKind) -> Option<Pivot> {
    if last.kind != new_kind {
        return None;
    }
    if new_bar <= last.bar + 1 {
        return None;
    }

    let gap = new_bar - last.bar - 1;
    if gap > MAX_SYNTHETIC_GAP {
        debug!(gap, "합성 피벗 구간이 너무 큼, 삽입 생략");
        return None;
    }

    // min_by/역순 min_by는 동률에서 첫 번째 봉을 선택한다
    let range = last.bar + 1..new_bar;
    let (bar, price) = match new_kind {
        PivotKind::High => range
            .map(|b| (b, window[b].low))
            .min_by(|a, b| a.1.cmp(&b.1))?,
        PivotKind::Low => range
            .map(|b| (b, window[b].high))
            .min_by(|a, b| b.1.cmp(&a.1))?,
    };

    Some(Pivot {
        bar,
        price,
        kind: new_kind.opposite(),
        variant: Some(PivotVariant::Synthetic),
    })
}
