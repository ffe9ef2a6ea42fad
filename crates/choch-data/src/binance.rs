//! Binance USDⓈ-M 선물 페처.
//!
//! 공개 REST 엔드포인트만 사용합니다 (서명 불필요):
//! - `/fapi/v1/klines`: 캔들 조회
//! - `/fapi/v1/ticker/24hr`: 심볼 탐색 (24시간 거래대금 필터)
//!
//! klines는 항상 형성 중인 마지막 봉을 포함해 반환하므로 `limit + 1`개를
//! 요청한 뒤 마지막 행을 버립니다. 페처를 떠나는 캔들은 전부 마감된
//! 봉입니다.

use crate::fetcher::{CandleFetcher, FetchError, FetchResult};
use async_trait::async_trait;
use choch_core::{Candle, Symbol, Timeframe};
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// USDⓈ-M 선물 REST 기본 URL.
const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";

/// klines 응답 행.
///
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
///   trades, taker_base, taker_quote, ignore]`
#[derive(Debug, Deserialize)]
#[allow(dead_code)] // 응답 필드 전체 매핑 (일부만 사용)
struct BinanceKline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    u64,
    String,
    String,
    String,
);

/// 24시간 티커 응답 (필요 필드만).
#[derive(Debug, Deserialize)]
struct Ticker24h {
    symbol: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
}

/// Binance 선물 캔들 페처.
pub struct BinanceFetcher {
    client: Client,
    base_url: String,
}

impl BinanceFetcher {
    /// 새 페처를 생성합니다.
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// 기본 URL을 바꿉니다 (테스트용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn parse_decimal(s: &str) -> FetchResult<Decimal> {
        Decimal::from_str(s).map_err(|e| FetchError::Parse(format!("{}: {}", s, e)))
    }

    /// HTTP 상태 코드를 에러로 분류합니다.
    fn status_error(status: StatusCode) -> FetchError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                FetchError::Fatal(format!("인증 실패: {}", status))
            }
            StatusCode::TOO_MANY_REQUESTS | StatusCode::IM_A_TEAPOT => {
                FetchError::Transient(format!("요청 한도 초과: {}", status))
            }
            s if s.is_server_error() => FetchError::Transient(format!("서버 에러: {}", s)),
            s => FetchError::Fatal(format!("요청 실패: {}", s)),
        }
    }

    async fn public_get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> FetchResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    fn kline_to_candle(
        symbol: &Symbol,
        timeframe: Timeframe,
        row: &BinanceKline,
    ) -> FetchResult<Candle> {
        let open_time = DateTime::from_timestamp_millis(row.0)
            .ok_or_else(|| FetchError::Parse(format!("잘못된 타임스탬프: {}", row.0)))?;

        Ok(Candle::new(
            symbol.clone(),
            timeframe,
            open_time,
            Self::parse_decimal(&row.1)?,
            Self::parse_decimal(&row.2)?,
            Self::parse_decimal(&row.3)?,
            Self::parse_decimal(&row.4)?,
            Self::parse_decimal(&row.5)?,
        ))
    }
}

impl Default for BinanceFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandleFetcher for BinanceFetcher {
    fn name(&self) -> &str {
        "binance-futures"
    }

    async fn fetch_closed_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> FetchResult<Vec<Candle>> {
        // 집계 타임프레임은 거래소 간격이 아니다: 호출자가 5분봉으로 조회해
        // 로컬에서 집계해야 한다
        if timeframe.is_aggregated() {
            return Err(FetchError::UnsupportedTimeframe(timeframe));
        }

        let rows: Vec<BinanceKline> = self
            .public_get(
                "/fapi/v1/klines",
                &[
                    ("symbol", symbol.to_exchange_symbol()),
                    ("interval", timeframe.to_interval_str().to_string()),
                    ("limit", (limit + 1).to_string()),
                ],
            )
            .await?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in &rows {
            candles.push(Self::kline_to_candle(symbol, timeframe, row)?);
        }

        // 마지막 행은 형성 중인 봉이므로 버린다
        candles.pop();
        if candles.len() > limit {
            let drop = candles.len() - limit;
            candles.drain(..drop);
        }

        debug!(
            symbol = %symbol,
            timeframe = %timeframe,
            count = candles.len(),
            "마감 캔들 조회 완료"
        );

        Ok(candles)
    }

    async fn list_symbols(
        &self,
        quote: &str,
        min_volume_24h: Decimal,
    ) -> FetchResult<Vec<Symbol>> {
        let tickers: Vec<Ticker24h> = self.public_get("/fapi/v1/ticker/24hr", &[]).await?;

        let mut symbols = Vec::new();
        for ticker in tickers {
            let Some(symbol) = Symbol::from_exchange(&ticker.symbol, quote) else {
                continue;
            };
            let volume = Decimal::from_str(&ticker.quote_volume).unwrap_or(Decimal::ZERO);
            if volume >= min_volume_24h {
                symbols.push(symbol);
            }
        }

        symbols.sort_by(|a, b| a.base.cmp(&b.base));
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kline_row_parsing() {
        let json = r#"[
            [1729790700000, "67000.1", "67100.0", "66900.5", "67050.0", "123.45",
             1729790999999, "8270000.0", 1000, "60.0", "4020000.0", "0"]
        ]"#;
        let rows: Vec<BinanceKline> = serde_json::from_str(json).unwrap();
        let symbol = Symbol::new("BTC", "USDT");

        let candle = BinanceFetcher::kline_to_candle(&symbol, Timeframe::M5, &rows[0]).unwrap();
        assert_eq!(candle.open, dec!(67000.1));
        assert_eq!(candle.high, dec!(67100.0));
        assert_eq!(candle.low, dec!(66900.5));
        assert_eq!(candle.close, dec!(67050.0));
        assert_eq!(candle.volume, dec!(123.45));
        assert_eq!(candle.open_time.timestamp_millis(), 1729790700000);
        assert!(candle.validate().is_ok());
    }

    #[test]
    fn test_status_classification() {
        assert!(BinanceFetcher::status_error(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(BinanceFetcher::status_error(StatusCode::INTERNAL_SERVER_ERROR).is_transient());
        assert!(!BinanceFetcher::status_error(StatusCode::UNAUTHORIZED).is_transient());
        assert!(!BinanceFetcher::status_error(StatusCode::BAD_REQUEST).is_transient());
    }

    #[tokio::test]
    async fn test_aggregated_timeframe_rejected() {
        let fetcher = BinanceFetcher::new();
        let symbol = Symbol::new("BTC", "USDT");
        let result = fetcher
            .fetch_closed_candles(&symbol, Timeframe::M25, 50)
            .await;
        assert!(matches!(
            result,
            Err(FetchError::UnsupportedTimeframe(Timeframe::M25))
        ));
    }
}
