//! 시그널 발행 계약.

use async_trait::async_trait;
use choch_core::ChochSignal;
use thiserror::Error;
use tracing::info;

/// 발행 에러.
#[derive(Debug, Error)]
pub enum SinkError {
    /// 일시적 실패: 시그널은 잠금 안에 보존되고 다음 스캔에서 재전송된다.
    #[error("일시적 전송 실패: {0}")]
    Transient(String),

    /// 영구 실패: 해당 워커를 중단한다.
    #[error("영구 전송 실패: {0}")]
    Fatal(String),
}

/// 시그널 싱크.
///
/// 발행은 트랜잭션 단위입니다: 시그널은 완전히 전달되거나 전혀
/// 전달되지 않아야 하며, 부분 기록은 허용되지 않습니다.
#[async_trait]
pub trait SignalSink: Send + Sync {
    /// 싱크 이름을 반환합니다.
    fn name(&self) -> &str;

    /// 시그널을 발행합니다.
    async fn publish(&self, signal: &ChochSignal) -> Result<(), SinkError>;
}

/// 로그로만 발행하는 기본 싱크.
///
/// 알림 채널이 설정되지 않았을 때 사용합니다.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl SignalSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(&self, signal: &ChochSignal) -> Result<(), SinkError> {
        info!(
            symbol = %signal.symbol,
            timeframe = %signal.timeframe,
            signal_type = signal.signal_type(),
            direction = signal.direction.label(),
            group = %signal.group,
            price = %signal.price,
            signal_time = %signal.signal_time,
            "CHoCH 시그널"
        );
        Ok(())
    }
}
