//! 트레이딩 심볼 정의.
//!
//! 이 시스템은 암호화폐 선물 페어만 감시하므로 심볼은 기준 자산과
//! 호가 자산의 쌍으로 구성됩니다. 예: BTC/USDT.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래 가능한 암호화폐 페어를 나타내는 심볼.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 기준 자산 (예: BTC)
    pub base: String,
    /// 호가 자산 (예: USDT)
    pub quote: String,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// "BASE/QUOTE" 형식 문자열에서 심볼을 파싱합니다.
    pub fn from_pair(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            Some(Self::new(parts[0], parts[1]))
        } else {
            None
        }
    }

    /// 거래소 형식 문자열("BTCUSDT")에서 심볼을 파싱합니다.
    ///
    /// 호가 자산 접미사가 일치하지 않으면 `None`을 반환합니다.
    pub fn from_exchange(s: &str, quote: &str) -> Option<Self> {
        let s = s.to_uppercase();
        let quote = quote.to_uppercase();
        let base = s.strip_suffix(quote.as_str())?;
        if base.is_empty() {
            return None;
        }
        Some(Self::new(base, quote))
    }

    /// 거래소 심볼 형식을 반환합니다 (예: "BTCUSDT").
    pub fn to_exchange_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::new("btc", "usdt");
        assert_eq!(symbol.base, "BTC");
        assert_eq!(symbol.quote, "USDT");
        assert_eq!(symbol.to_string(), "BTC/USDT");
        assert_eq!(symbol.to_exchange_symbol(), "BTCUSDT");
    }

    #[test]
    fn test_symbol_from_pair() {
        let symbol = Symbol::from_pair("ETH/USDT").unwrap();
        assert_eq!(symbol.base, "ETH");
        assert_eq!(symbol.quote, "USDT");

        assert!(Symbol::from_pair("ETHUSDT").is_none());
        assert!(Symbol::from_pair("/USDT").is_none());
    }

    #[test]
    fn test_symbol_from_exchange() {
        let symbol = Symbol::from_exchange("BNBUSDT", "USDT").unwrap();
        assert_eq!(symbol.base, "BNB");

        assert!(Symbol::from_exchange("BNBBUSD", "USDT").is_none());
        assert!(Symbol::from_exchange("USDT", "USDT").is_none());
    }
}
