//! CHoCH 시그널 타입.
//!
//! 이 모듈은 감지 엔진이 외부로 내보내는 시그널 관련 타입을 정의합니다:
//! - `Direction` - 시그널 방향 (UP/DOWN)
//! - `PatternGroup` - 8피벗 패턴의 그룹 분류 (G1/G2/G3)
//! - `ChochSignal` - 확정된 CHoCH 시그널 엔티티

use crate::types::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CHoCH 시그널 방향.
///
/// UP은 하락 8피벗 패턴의 반전, DOWN은 상승 8피벗 패턴의 반전을
/// 확정한 것입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 상방 반전
    Up,
    /// 하방 반전
    Down,
}

impl Direction {
    /// 포지션 방향 레이블을 반환합니다 (외부 저장소 계약 형식).
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Up => "Long",
            Direction::Down => "Short",
        }
    }

    /// 시그널 유형 레이블을 반환합니다.
    pub fn signal_type(&self) -> &'static str {
        match self {
            Direction::Up => "CHoCH Up",
            Direction::Down => "CHoCH Down",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// 8피벗 패턴의 그룹 분류.
///
/// 세 가지 상호 배타적인 가격 순서 패밀리 중 하나입니다.
/// 판정 우선순위는 G1 > G2 > G3입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternGroup {
    /// 단조 사다리형
    G1,
    /// P5-P7 교차형
    G2,
    /// P4-P6 교차형
    G3,
}

impl std::fmt::Display for PatternGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternGroup::G1 => write!(f, "G1"),
            PatternGroup::G2 => write!(f, "G2"),
            PatternGroup::G3 => write!(f, "G3"),
        }
    }
}

/// 확정된 CHoCH 시그널.
///
/// 검증된 8피벗 패턴 하나당 최대 한 번만 발행됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChochSignal {
    /// 고유 시그널 ID
    pub id: Uuid,
    /// 거래 심볼
    pub symbol: Symbol,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 시그널 방향
    pub direction: Direction,
    /// 패턴 그룹
    pub group: PatternGroup,
    /// 시그널 가격 (CHoCH 봉의 종가)
    pub price: Decimal,
    /// 시그널 시각 (확정 봉의 시작 시간)
    pub signal_time: DateTime<Utc>,
    /// 패턴을 구성한 8개 피벗 가격 (P1..P8)
    pub pivot_prices: [Decimal; 8],
    /// 패턴을 구성한 8개 피벗의 윈도우 내 봉 인덱스
    pub pivot_bars: [usize; 8],
    /// 감지 시각
    pub detected_at: DateTime<Utc>,
}

impl ChochSignal {
    /// 새 시그널을 생성합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        timeframe: Timeframe,
        direction: Direction,
        group: PatternGroup,
        price: Decimal,
        signal_time: DateTime<Utc>,
        pivot_prices: [Decimal; 8],
        pivot_bars: [usize; 8],
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            timeframe,
            direction,
            group,
            price,
            signal_time,
            pivot_prices,
            pivot_bars,
            detected_at: Utc::now(),
        }
    }

    /// 시그널 유형 레이블을 반환합니다 ("CHoCH Up" | "CHoCH Down").
    pub fn signal_type(&self) -> &'static str {
        self.direction.signal_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_labels() {
        assert_eq!(Direction::Up.label(), "Long");
        assert_eq!(Direction::Down.label(), "Short");
        assert_eq!(Direction::Up.signal_type(), "CHoCH Up");
        assert_eq!(Direction::Down.to_string(), "DOWN");
    }

    #[test]
    fn test_group_display() {
        assert_eq!(PatternGroup::G2.to_string(), "G2");
    }

    #[test]
    fn test_signal_creation() {
        let signal = ChochSignal::new(
            Symbol::new("BTC", "USDT"),
            Timeframe::M15,
            Direction::Up,
            PatternGroup::G1,
            dec!(99.0),
            Utc.with_ymd_and_hms(2025, 10, 24, 10, 0, 0).unwrap(),
            [
                dec!(110),
                dec!(108),
                dec!(106),
                dec!(104),
                dec!(102),
                dec!(100),
                dec!(98),
                dec!(96),
            ],
            [2, 5, 8, 11, 14, 17, 20, 23],
        );

        assert_eq!(signal.signal_type(), "CHoCH Up");
        assert_eq!(signal.pivot_prices[7], dec!(96));
        assert_eq!(signal.pivot_bars[0], 2);
    }
}
