//! 테스트용 인메모리 페처.
//!
//! 엔진 통합 테스트에서 거래소 없이 캔들 시퀀스를 재생할 때 사용합니다.

use crate::fetcher::{CandleFetcher, FetchError, FetchResult};
use async_trait::async_trait;
use choch_core::{Candle, Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// 인메모리 캔들 페처.
///
/// (심볼, 타임프레임)별로 타임스탬프 순서의 캔들을 보관합니다.
#[derive(Debug, Default)]
pub struct SimulatedFetcher {
    data: HashMap<(Symbol, Timeframe), BTreeMap<DateTime<Utc>, Candle>>,
}

impl SimulatedFetcher {
    /// 새 페처를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 캔들을 적재합니다. 같은 시작 시각의 캔들은 덮어씁니다.
    pub fn load_candles(&mut self, candles: Vec<Candle>) {
        for candle in candles {
            self.data
                .entry((candle.symbol.clone(), candle.timeframe))
                .or_default()
                .insert(candle.open_time, candle);
        }
    }

    /// 적재된 캔들 수를 반환합니다.
    pub fn candle_count(&self, symbol: &Symbol, timeframe: Timeframe) -> usize {
        self.data
            .get(&(symbol.clone(), timeframe))
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CandleFetcher for SimulatedFetcher {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch_closed_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> FetchResult<Vec<Candle>> {
        if timeframe.is_aggregated() {
            return Err(FetchError::UnsupportedTimeframe(timeframe));
        }

        let Some(map) = self.data.get(&(symbol.clone(), timeframe)) else {
            return Ok(vec![]);
        };

        let mut candles: Vec<Candle> = map.values().cloned().collect();
        if candles.len() > limit {
            let drop = candles.len() - limit;
            candles.drain(..drop);
        }
        Ok(candles)
    }

    async fn list_symbols(
        &self,
        quote: &str,
        _min_volume_24h: Decimal,
    ) -> FetchResult<Vec<Symbol>> {
        let mut symbols: Vec<Symbol> = self
            .data
            .keys()
            .filter(|(s, _)| s.quote == quote.to_uppercase())
            .map(|(s, _)| s.clone())
            .collect();
        symbols.sort_by(|a, b| a.base.cmp(&b.base));
        symbols.dedup();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn candles(symbol: &Symbol, count: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2025, 10, 24, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                Candle::new(
                    symbol.clone(),
                    Timeframe::M5,
                    start + Duration::minutes(5 * i as i64),
                    dec!(100),
                    dec!(101),
                    dec!(99),
                    dec!(100.5),
                    dec!(10),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_returns_last_limit() {
        let symbol = Symbol::new("BTC", "USDT");
        let mut fetcher = SimulatedFetcher::new();
        fetcher.load_candles(candles(&symbol, 60));

        let out = fetcher
            .fetch_closed_candles(&symbol, Timeframe::M5, 50)
            .await
            .unwrap();
        assert_eq!(out.len(), 50);
        // 가장 오래된 10개가 잘려나가고 오름차순을 유지한다
        assert!(out.windows(2).all(|w| w[0].open_time < w[1].open_time));
        assert_eq!(
            out[0].open_time,
            Utc.with_ymd_and_hms(2025, 10, 24, 0, 50, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_empty() {
        let fetcher = SimulatedFetcher::new();
        let out = fetcher
            .fetch_closed_candles(&Symbol::new("XRP", "USDT"), Timeframe::M5, 50)
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_list_symbols() {
        let mut fetcher = SimulatedFetcher::new();
        fetcher.load_candles(candles(&Symbol::new("ETH", "USDT"), 3));
        fetcher.load_candles(candles(&Symbol::new("BTC", "USDT"), 3));

        let symbols = fetcher.list_symbols("USDT", dec!(0)).await.unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].base, "BTC");
    }
}
