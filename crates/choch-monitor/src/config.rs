//! 환경변수 기반 설정 모듈.

use choch_core::{ChochError, ChochResult, Symbol, Timeframe};
use choch_detector::DetectorConfig;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 감시 심볼 지정.
#[derive(Debug, Clone)]
pub enum SymbolsSpec {
    /// 거래대금 필터를 통과한 전체 심볼
    All,
    /// 명시된 심볼 목록
    List(Vec<Symbol>),
}

/// 모니터 전체 설정.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// 감시 심볼
    pub symbols: SymbolsSpec,
    /// 감시 타임프레임
    pub timeframes: Vec<Timeframe>,
    /// 호가 통화 (심볼 탐색용)
    pub quote_currency: String,
    /// 24시간 최소 거래대금 (SYMBOLS=ALL일 때)
    pub min_volume_24h: Decimal,
    /// 스캔당 캔들 윈도우 크기
    pub window_size: usize,
    /// 마감 후 스캔 유예 시간 (초)
    pub scan_grace_seconds: i64,
    /// 캔들 조회 타임아웃 (초)
    pub fetch_timeout_seconds: u64,
    /// 감지기 설정
    pub detector: DetectorConfig,
}

impl MonitorConfig {
    /// 환경변수에서 설정 로드.
    pub fn from_env() -> ChochResult<Self> {
        dotenvy::dotenv().ok();

        let quote_currency =
            std::env::var("QUOTE_CURRENCY").unwrap_or_else(|_| "USDT".to_string());

        let symbols_raw = std::env::var("SYMBOLS").unwrap_or_else(|_| "ALL".to_string());
        let symbols = parse_symbols(&symbols_raw, &quote_currency)?;

        let timeframes_raw =
            std::env::var("TIMEFRAMES").unwrap_or_else(|_| "5m,15m,30m,1h".to_string());
        let timeframes = parse_timeframes(&timeframes_raw)?;

        let detector = DetectorConfig {
            left: env_var_parse("PIVOT_LEFT", 1),
            right: env_var_parse("PIVOT_RIGHT", 1),
            keep_pivots: env_var_parse("KEEP_PIVOTS", 200),
            use_variant_filter: env_var_bool("USE_VARIANT_FILTER", true),
            allow: choch_detector::VariantAllowSet {
                ph1: env_var_bool("ALLOW_PH1", true),
                ph2: env_var_bool("ALLOW_PH2", true),
                ph3: env_var_bool("ALLOW_PH3", true),
                pl1: env_var_bool("ALLOW_PL1", true),
                pl2: env_var_bool("ALLOW_PL2", true),
                pl3: env_var_bool("ALLOW_PL3", true),
            },
            window_size: env_var_parse("WINDOW_SIZE", 50),
        };

        Ok(Self {
            symbols,
            timeframes,
            quote_currency,
            min_volume_24h: env_var_parse("MIN_VOLUME_24H", Decimal::from(1_000_000)),
            window_size: detector.window_size,
            scan_grace_seconds: env_var_parse("SCAN_GRACE_SECONDS", 30),
            fetch_timeout_seconds: env_var_parse("FETCH_TIMEOUT_SECONDS", 10),
            detector,
        })
    }
}

/// "ALL" 또는 쉼표 목록("BTC/USDT,ETHUSDT")을 파싱합니다.
pub(crate) fn parse_symbols(raw: &str, quote: &str) -> ChochResult<SymbolsSpec> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(SymbolsSpec::All);
    }

    let mut symbols = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let symbol = Symbol::from_pair(part)
            .or_else(|| Symbol::from_exchange(part, quote))
            .ok_or_else(|| ChochError::Config(format!("잘못된 심볼: {}", part)))?;
        symbols.push(symbol);
    }

    if symbols.is_empty() {
        return Err(ChochError::Config("SYMBOLS가 비어 있습니다".to_string()));
    }
    Ok(SymbolsSpec::List(symbols))
}

/// 쉼표 목록("5m,15m,1h")을 타임프레임으로 파싱합니다.
pub(crate) fn parse_timeframes(raw: &str) -> ChochResult<Vec<Timeframe>> {
    let mut timeframes = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let tf = Timeframe::from_str(part).map_err(ChochError::Config)?;
        if !timeframes.contains(&tf) {
            timeframes.push(tf);
        }
    }

    if timeframes.is_empty() {
        return Err(ChochError::Config(
            "TIMEFRAMES가 비어 있습니다".to_string(),
        ));
    }
    Ok(timeframes)
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용).
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱.
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols_all() {
        assert!(matches!(
            parse_symbols("ALL", "USDT").unwrap(),
            SymbolsSpec::All
        ));
        assert!(matches!(
            parse_symbols("all", "USDT").unwrap(),
            SymbolsSpec::All
        ));
    }

    #[test]
    fn test_parse_symbols_list() {
        let spec = parse_symbols("BTC/USDT, ETHUSDT", "USDT").unwrap();
        let SymbolsSpec::List(symbols) = spec else {
            panic!("목록이어야 한다");
        };
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].base, "BTC");
        assert_eq!(symbols[1].base, "ETH");
    }

    #[test]
    fn test_parse_symbols_invalid() {
        assert!(parse_symbols("NOTAPAIR", "USDT").is_err());
        assert!(parse_symbols("", "USDT").is_err());
    }

    #[test]
    fn test_parse_timeframes() {
        let tfs = parse_timeframes("5m,25m,1h").unwrap();
        assert_eq!(
            tfs,
            vec![Timeframe::M5, Timeframe::M25, Timeframe::H1]
        );

        // 중복 제거
        let tfs = parse_timeframes("5m,5m").unwrap();
        assert_eq!(tfs.len(), 1);

        assert!(parse_timeframes("7m").is_err());
        assert!(parse_timeframes("").is_err());
    }
}
