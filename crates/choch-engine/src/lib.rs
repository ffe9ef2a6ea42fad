//! # CHoCH Engine
//!
//! (심볼, 타임프레임) 단위 스캔 오케스트레이션:
//! - [`scheduler`]: 캔들 마감 시각 기준 스캔 스케줄링
//! - [`worker`]: 키별 직렬화된 스캔 워커 (조회 → 집계 → 감지 → 발행)
//! - [`engine`]: 워커 풀 구성과 스케줄러 틱 루프
//! - [`sink`]: 시그널 발행 계약
//! - [`stats`]: 스캔 통계

pub mod engine;
pub mod error;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod worker;

pub use engine::{EngineConfig, ScanEngine};
pub use error::{ScanError, ScanResult};
pub use scheduler::TimeframeScheduler;
pub use sink::{LogSink, SignalSink, SinkError};
pub use stats::ScanStats;
pub use worker::{ScanOutcome, ScanRequest};
