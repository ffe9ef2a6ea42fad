//! 스캔 통계 구조체.

use serde::{Deserialize, Serialize};

/// 워커별 스캔 통계.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// 총 스캔 횟수
    pub scans: usize,
    /// 발화한 시그널 수
    pub signals: usize,
    /// 건너뛴 횟수 (데이터 부족 등)
    pub skipped: usize,
    /// 에러 횟수
    pub errors: usize,
}

impl ScanStats {
    /// 새 통계 객체 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 통계 요약 로그 출력.
    pub fn log_summary(&self, symbol: &str, timeframe: &str) {
        tracing::info!(
            symbol = symbol,
            timeframe = timeframe,
            scans = self.scans,
            signals = self.signals,
            skipped = self.skipped,
            errors = self.errors,
            "워커 스캔 요약"
        );
    }
}
