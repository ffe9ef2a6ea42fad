//! 캔들 페처 trait 정의.

use async_trait::async_trait;
use choch_core::{Candle, Symbol, Timeframe};
use rust_decimal::Decimal;
use thiserror::Error;

/// 캔들 조회 에러.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 일시적 실패 (네트워크, 타임아웃, 요청 한도). 다음 스캔에서 재시도.
    #[error("일시적 조회 실패: {0}")]
    Transient(String),

    /// 영구 실패 (인증, 잘못된 요청). 상위로 전파.
    #[error("영구 조회 실패: {0}")]
    Fatal(String),

    /// 응답 파싱 실패. 일시적 실패로 취급.
    #[error("응답 파싱 실패: {0}")]
    Parse(String),

    /// 페처가 지원하지 않는 타임프레임 (집계 타임프레임은 5분봉으로 조회)
    #[error("지원하지 않는 타임프레임: {0}")]
    UnsupportedTimeframe(Timeframe),
}

impl FetchError {
    /// 다음 스캔에서 재시도할 수 있는 에러인지 확인합니다.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_) | FetchError::Parse(_))
    }
}

/// 조회 작업 결과 타입.
pub type FetchResult<T> = Result<T, FetchError>;

/// 마감 캔들 페처.
///
/// 구현체는 형성 중인 봉을 절대 반환해서는 안 됩니다. 감지 엔진 전체가
/// 마감 캔들 전제 위에서 동작합니다.
#[async_trait]
pub trait CandleFetcher: Send + Sync {
    /// 페처 이름을 반환합니다.
    fn name(&self) -> &str;

    /// 최근 마감 캔들을 오름차순으로 최대 `limit`개 조회합니다.
    async fn fetch_closed_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> FetchResult<Vec<Candle>>;

    /// 24시간 거래대금이 `min_volume_24h` 이상인 심볼 목록을 조회합니다.
    async fn list_symbols(
        &self,
        quote: &str,
        min_volume_24h: Decimal,
    ) -> FetchResult<Vec<Symbol>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_classification() {
        assert!(FetchError::Transient("timeout".into()).is_transient());
        assert!(FetchError::Parse("bad json".into()).is_transient());
        assert!(!FetchError::Fatal("401".into()).is_transient());
        assert!(!FetchError::UnsupportedTimeframe(Timeframe::M25).is_transient());
    }
}
