//! 마감 캔들 데이터 구조체.
//!
//! 감지 엔진은 캔들 마감 기준으로만 동작합니다. `Candle`은 항상 이미
//! 마감된 봉이며, 페처 또는 집계기가 생성한 뒤에는 불변입니다.

use crate::error::{ChochError, ChochResult};
use crate::types::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 마감된 OHLCV 캔들.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량 (기준 자산 단위)
    pub volume: Decimal,
    /// 캔들 종료 시간
    pub close_time: DateTime<Utc>,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        let close_time = open_time + timeframe.duration();
        Self {
            symbol,
            timeframe,
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
        }
    }

    /// OHLC 불변식을 검증합니다.
    ///
    /// `low <= min(open, close) <= max(open, close) <= high`, `volume >= 0`.
    pub fn validate(&self) -> ChochResult<()> {
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);

        if self.low > body_low || body_high > self.high {
            return Err(ChochError::InvalidInput(format!(
                "OHLC 불변식 위반: {} {} O:{} H:{} L:{} C:{}",
                self.symbol, self.open_time, self.open, self.high, self.low, self.close
            )));
        }

        if self.volume < Decimal::ZERO {
            return Err(ChochError::InvalidInput(format!(
                "음수 거래량: {} {} V:{}",
                self.symbol, self.open_time, self.volume
            )));
        }

        Ok(())
    }

    /// 캔들 몸통 크기(절대값)를 반환합니다.
    pub fn body_size(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉(종가 < 시가)인지 확인합니다.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}
