//! (심볼, 타임프레임) 스캔 워커.
//!
//! 키 하나당 워커 하나가 감지 상태를 독점 소유하며, 요청 채널이 스캔을
//! 직렬화합니다. 스캔 파이프라인: (보류 시그널 재전송) → 마감 캔들 조회
//! → 필요 시 집계 → 입력 검증 → 피벗 재구성 → 8피벗 검증 → CHoCH 확정
//! → 발행.

use crate::error::{ScanError, ScanResult};
use crate::sink::{SignalSink, SinkError};
use crate::stats::ScanStats;
use choch_core::{scan_span, Candle, ChochSignal, Symbol, Timeframe};
use choch_data::{AlignedCandleAggregator, CandleFetcher};
use choch_detector::{ChochDetector, TimeframeState};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Instrument};

/// 스캔 요청.
#[derive(Debug, Clone, Copy)]
pub struct ScanRequest {
    /// 이 스캔을 유발한 캔들 마감 시각
    pub close_time: DateTime<Utc>,
}

/// 스캔 한 번의 결과.
#[derive(Debug)]
pub enum ScanOutcome {
    /// 시그널 발화 및 발행 완료
    Signal(ChochSignal),
    /// 정상 스캔, 시그널 없음
    NoSignal,
    /// 건너뜀 (데이터 부족 등)
    Skipped(&'static str),
}

/// (심볼, 타임프레임) 하나를 담당하는 스캔 워커.
pub(crate) struct ScanWorker {
    symbol: Symbol,
    timeframe: Timeframe,
    window_size: usize,
    fetch_timeout: Duration,
    detector: ChochDetector,
    state: TimeframeState,
    /// 일시적 발행 실패로 보류된 시그널. 잠금은 유지된 상태다.
    pending: Option<ChochSignal>,
    fetcher: Arc<dyn CandleFetcher>,
    sink: Arc<dyn SignalSink>,
    stats: ScanStats,
}

impl ScanWorker {
    pub(crate) fn new(
        symbol: Symbol,
        timeframe: Timeframe,
        window_size: usize,
        fetch_timeout: Duration,
        detector: ChochDetector,
        fetcher: Arc<dyn CandleFetcher>,
        sink: Arc<dyn SignalSink>,
    ) -> Self {
        let state = detector.new_state();
        Self {
            symbol,
            timeframe,
            window_size,
            fetch_timeout,
            detector,
            state,
            pending: None,
            fetcher,
            sink,
            stats: ScanStats::new(),
        }
    }

    /// 요청 채널이 닫힐 때까지 스캔 요청을 처리합니다.
    pub(crate) async fn run(mut self, mut rx: mpsc::Receiver<ScanRequest>) {
        while let Some(request) = rx.recv().await {
            let span = scan_span!("scan", self.symbol, self.timeframe, request.close_time);
            let result = self.scan(&request).instrument(span).await;

            self.stats.scans += 1;
            match result {
                Ok(ScanOutcome::Signal(signal)) => {
                    self.stats.signals += 1;
                    info!(
                        symbol = %self.symbol,
                        timeframe = %self.timeframe,
                        signal_type = signal.signal_type(),
                        group = %signal.group,
                        price = %signal.price,
                        "시그널 발행 완료"
                    );
                }
                Ok(ScanOutcome::NoSignal) => {}
                Ok(ScanOutcome::Skipped(reason)) => {
                    self.stats.skipped += 1;
                    debug!(symbol = %self.symbol, timeframe = %self.timeframe, reason, "스캔 건너뜀");
                }
                Err(e) if e.is_critical() => {
                    self.stats.errors += 1;
                    error!(
                        symbol = %self.symbol,
                        timeframe = %self.timeframe,
                        error = %e,
                        "치명적 에러, 워커 중단"
                    );
                    break;
                }
                Err(e) if e.is_retryable() => {
                    self.stats.errors += 1;
                    warn!(
                        symbol = %self.symbol,
                        timeframe = %self.timeframe,
                        error = %e,
                        "일시적 에러, 다음 마감에서 재시도"
                    );
                }
                Err(e) => {
                    self.stats.errors += 1;
                    warn!(
                        symbol = %self.symbol,
                        timeframe = %self.timeframe,
                        error = %e,
                        "스캔 사이클 건너뜀"
                    );
                }
            }
        }

        self.stats
            .log_summary(&self.symbol.to_string(), self.timeframe.to_interval_str());
    }

    /// 스캔 한 사이클을 수행합니다.
    pub(crate) async fn scan(&mut self, _request: &ScanRequest) -> ScanResult<ScanOutcome> {
        // 보류 시그널이 있으면 새 스캔보다 먼저 재전송한다.
        // 잠금이 걸려 있으므로 같은 패턴이 다시 발화하지는 않는다.
        if let Some(signal) = self.pending.take() {
            match self.sink.publish(&signal).await {
                Ok(()) => {
                    info!(signal_id = %signal.id, "보류 시그널 재전송 완료");
                }
                Err(SinkError::Transient(e)) => {
                    self.pending = Some(signal);
                    return Err(ScanError::SinkTransient(e));
                }
                Err(SinkError::Fatal(e)) => return Err(ScanError::SinkFatal(e)),
            }
        }

        let window = self.fetch_window().await?;
        if window.len() < self.window_size {
            return Ok(ScanOutcome::Skipped("마감 캔들 부족"));
        }

        for candle in &window {
            candle
                .validate()
                .map_err(|e| ScanError::InputMalformed(e.to_string()))?;
        }

        let pivot_count = self.detector.rebuild_pivots(&mut self.state, &window)?;
        debug!(pivots = pivot_count, "피벗 재구성");

        let detection = self.detector.process(&mut self.state, &window)?;
        if !detection.fired {
            return Ok(ScanOutcome::NoSignal);
        }

        let signal = detection.to_signal(&window).ok_or_else(|| {
            ScanError::LogicAssertion("발화된 감지 결과에 시그널 데이터가 없습니다".to_string())
        })?;

        match self.sink.publish(&signal).await {
            Ok(()) => Ok(ScanOutcome::Signal(signal)),
            Err(SinkError::Transient(e)) => {
                // 잠금은 유지한 채 시그널을 보류한다: 재발화 없이 재전송만 한다
                self.pending = Some(signal);
                Err(ScanError::SinkTransient(e))
            }
            Err(SinkError::Fatal(e)) => Err(ScanError::SinkFatal(e)),
        }
    }

    /// 대상 타임프레임의 마감 캔들 윈도우를 조회합니다.
    ///
    /// 집계 타임프레임은 5분봉을 `window_size × multiplier`개 조회해
    /// 로컬에서 집계한 뒤 마지막 `window_size`개로 자릅니다.
    async fn fetch_window(&self) -> ScanResult<Vec<Candle>> {
        match self.timeframe.base_multiplier() {
            None => {
                self.fetch_with_timeout(self.timeframe, self.window_size)
                    .await
            }
            Some(multiplier) => {
                let base = self
                    .fetch_with_timeout(Timeframe::M5, self.window_size * multiplier)
                    .await?;
                let mut aggregated = AlignedCandleAggregator::aggregate(&base, self.timeframe)?;
                if aggregated.len() > self.window_size {
                    let drop = aggregated.len() - self.window_size;
                    aggregated.drain(..drop);
                }
                Ok(aggregated)
            }
        }
    }

    async fn fetch_with_timeout(
        &self,
        timeframe: Timeframe,
        limit: usize,
    ) -> ScanResult<Vec<Candle>> {
        let fetch = self
            .fetcher
            .fetch_closed_candles(&self.symbol, timeframe, limit);

        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(ScanError::FetcherTransient(format!(
                "조회 타임아웃 ({}초)",
                self.fetch_timeout.as_secs()
            ))),
        }
    }
}
