//! 스캔 엔진.
//!
//! (심볼, 타임프레임) 키마다 장수명 워커 태스크를 띄우고, 스케줄러 틱마다
//! 마감된 타임프레임의 스캔 요청을 분배합니다. 워커 채널은 용량 1이어서
//! 이전 스캔이 끝나지 않은 키의 요청은 병합됩니다 (마감 캔들 하나당 스캔
//! 한 번).

use crate::error::{ScanError, ScanResult};
use crate::scheduler::TimeframeScheduler;
use crate::sink::SignalSink;
use crate::worker::{ScanOutcome, ScanRequest, ScanWorker};
use choch_core::{ChochSignal, Symbol, Timeframe};
use choch_data::CandleFetcher;
use choch_detector::{ChochDetector, DetectorConfig};
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// 스케줄러 틱 주기.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// 엔진 설정.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 감시할 심볼 목록
    pub symbols: Vec<Symbol>,
    /// 감시할 타임프레임 목록
    pub timeframes: Vec<Timeframe>,
    /// 스캔당 캔들 윈도우 크기
    pub window_size: usize,
    /// 마감 후 스캔 유예 시간 (초)
    pub scan_grace_seconds: i64,
    /// 캔들 조회 타임아웃 (초)
    pub fetch_timeout_seconds: u64,
    /// 감지기 설정
    pub detector: DetectorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: vec![],
            timeframes: vec![
                Timeframe::M5,
                Timeframe::M15,
                Timeframe::M30,
                Timeframe::H1,
            ],
            window_size: 50,
            scan_grace_seconds: 30,
            fetch_timeout_seconds: 10,
            detector: DetectorConfig::default(),
        }
    }
}

/// CHoCH 스캔 엔진.
pub struct ScanEngine {
    config: EngineConfig,
    detector: ChochDetector,
    fetcher: Arc<dyn CandleFetcher>,
    sink: Arc<dyn SignalSink>,
}

impl ScanEngine {
    /// 새 엔진을 생성합니다.
    pub fn new(
        config: EngineConfig,
        fetcher: Arc<dyn CandleFetcher>,
        sink: Arc<dyn SignalSink>,
    ) -> ScanResult<Self> {
        let detector = ChochDetector::new(config.detector.clone())
            .map_err(|e| ScanError::LogicAssertion(e.to_string()))?;
        Ok(Self {
            config,
            detector,
            fetcher,
            sink,
        })
    }

    /// 키 하나를 즉시 한 번 스캔합니다 (CLI 단발 스캔용).
    ///
    /// 발화한 시그널은 싱크로 발행된 뒤 반환됩니다.
    pub async fn scan_key(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> ScanResult<Option<ChochSignal>> {
        let mut worker = ScanWorker::new(
            symbol.clone(),
            timeframe,
            self.config.window_size,
            Duration::from_secs(self.config.fetch_timeout_seconds),
            self.detector.clone(),
            self.fetcher.clone(),
            self.sink.clone(),
        );

        let request = ScanRequest {
            close_time: timeframe.latest_close(Utc::now()),
        };
        match worker.scan(&request).await? {
            ScanOutcome::Signal(signal) => Ok(Some(signal)),
            ScanOutcome::NoSignal => Ok(None),
            ScanOutcome::Skipped(reason) => {
                debug!(symbol = %symbol, timeframe = %timeframe, reason, "스캔 건너뜀");
                Ok(None)
            }
        }
    }

    /// Ctrl-C까지 엔진을 실행합니다.
    pub async fn run(self) -> ScanResult<()> {
        self.run_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// 종료 future가 완료될 때까지 엔진을 실행합니다.
    pub async fn run_with_shutdown(self, shutdown: impl Future<Output = ()>) -> ScanResult<()> {
        let mut scheduler = TimeframeScheduler::new(
            self.config.timeframes.clone(),
            self.config.scan_grace_seconds,
        );

        // 키별 워커 생성: 워커가 상태를 독점 소유하고 채널이 직렬화한다
        let mut senders: HashMap<(Symbol, Timeframe), mpsc::Sender<ScanRequest>> = HashMap::new();
        let mut handles = Vec::new();

        for symbol in &self.config.symbols {
            for &timeframe in &self.config.timeframes {
                let (tx, rx) = mpsc::channel(1);
                let worker = ScanWorker::new(
                    symbol.clone(),
                    timeframe,
                    self.config.window_size,
                    Duration::from_secs(self.config.fetch_timeout_seconds),
                    self.detector.clone(),
                    self.fetcher.clone(),
                    self.sink.clone(),
                );
                handles.push(tokio::spawn(worker.run(rx)));
                senders.insert((symbol.clone(), timeframe), tx);
            }
        }

        info!(
            symbols = self.config.symbols.len(),
            timeframes = self.config.timeframes.len(),
            workers = senders.len(),
            "스캔 엔진 시작"
        );

        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("종료 신호 수신, 엔진 종료 중...");
                    break;
                }
                _ = interval.tick() => {
                    let ready = scheduler.get_scannable(Utc::now());
                    for (timeframe, close_time) in ready {
                        let mut dispatched = 0usize;
                        let mut coalesced = 0usize;

                        for symbol in &self.config.symbols {
                            let Some(tx) = senders.get(&(symbol.clone(), timeframe)) else {
                                continue;
                            };
                            match tx.try_send(ScanRequest { close_time }) {
                                Ok(()) => dispatched += 1,
                                Err(mpsc::error::TrySendError::Full(_)) => {
                                    // 이전 스캔이 진행 중: 요청 병합
                                    coalesced += 1;
                                }
                                Err(mpsc::error::TrySendError::Closed(_)) => {
                                    warn!(symbol = %symbol, timeframe = %timeframe, "워커 채널 닫힘");
                                }
                            }
                        }

                        info!(
                            timeframe = %timeframe,
                            close_time = %close_time,
                            dispatched,
                            coalesced,
                            "스캔 디스패치"
                        );
                    }
                }
            }
        }

        // 채널을 닫아 워커를 정상 종료시킨다
        drop(senders);
        for handle in handles {
            let _ = handle.await;
        }

        info!("스캔 엔진 종료");
        Ok(())
    }
}
