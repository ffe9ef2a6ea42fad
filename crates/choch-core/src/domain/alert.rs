//! 외부 저장소 계약용 알림 레코드.
//!
//! 실제 영속화는 외부 협력자의 몫이지만, `alerts` 테이블의 행 형식은
//! 이 타입이 계약으로 고정합니다. 과거 행에는 `pattern_group`이 없을 수
//! 있으며, 그 경우 "N/A"로 표시됩니다.

use crate::domain::ChochSignal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `alerts` 테이블 한 행에 해당하는 알림 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    /// 저장소가 부여하는 기본 키 (저장 전에는 `None`)
    pub id: Option<i64>,
    /// 거래 심볼 (거래소 형식, 예: "BTCUSDT")
    pub symbol: String,
    /// 타임프레임 (예: "15m")
    pub timeframe: String,
    /// 방향 ("Long" | "Short")
    pub direction: String,
    /// 패턴 그룹 ("G1" | "G2" | "G3", 과거 행은 `None`)
    pub pattern_group: Option<String>,
    /// 시그널 유형 ("CHoCH Up" | "CHoCH Down")
    pub signal_type: String,
    /// 시그널 가격
    pub price: Decimal,
    /// 시그널 시각
    pub signal_time: DateTime<Utc>,
    /// 레코드 생성 시각
    pub created_at: DateTime<Utc>,
}

impl AlertRecord {
    /// 시그널로부터 알림 레코드를 생성합니다.
    pub fn from_signal(signal: &ChochSignal) -> Self {
        Self {
            id: None,
            symbol: signal.symbol.to_exchange_symbol(),
            timeframe: signal.timeframe.to_string(),
            direction: signal.direction.label().to_string(),
            pattern_group: Some(signal.group.to_string()),
            signal_type: signal.signal_type().to_string(),
            price: signal.price,
            signal_time: signal.signal_time,
            created_at: Utc::now(),
        }
    }

    /// 그룹 표시 레이블을 반환합니다 (없으면 "N/A").
    pub fn group_label(&self) -> &str {
        self.pattern_group.as_deref().unwrap_or("N/A")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Symbol, Timeframe};
    use crate::{Direction, PatternGroup};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_alert_record_from_signal() {
        let signal = ChochSignal::new(
            Symbol::new("ETH", "USDT"),
            Timeframe::M25,
            Direction::Down,
            PatternGroup::G2,
            dec!(2501.5),
            Utc.with_ymd_and_hms(2025, 10, 26, 0, 20, 0).unwrap(),
            [dec!(1); 8],
            [0; 8],
        );

        let record = AlertRecord::from_signal(&signal);
        assert_eq!(record.symbol, "ETHUSDT");
        assert_eq!(record.timeframe, "25m");
        assert_eq!(record.direction, "Short");
        assert_eq!(record.signal_type, "CHoCH Down");
        assert_eq!(record.group_label(), "G2");
    }

    #[test]
    fn test_alert_record_missing_group() {
        let record = AlertRecord {
            id: Some(1),
            symbol: "BTCUSDT".to_string(),
            timeframe: "5m".to_string(),
            direction: "Long".to_string(),
            pattern_group: None,
            signal_type: "CHoCH Up".to_string(),
            price: dec!(50000),
            signal_time: Utc::now(),
            created_at: Utc::now(),
        };

        assert_eq!(record.group_label(), "N/A");
    }
}
