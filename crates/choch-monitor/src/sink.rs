//! 시그널 싱크 어댑터.
//!
//! 알림 채널 구현체를 엔진의 [`SignalSink`] 계약에 연결합니다.

use async_trait::async_trait;
use choch_core::ChochSignal;
use choch_engine::{SignalSink, SinkError};
use choch_notification::{NotificationError, NotificationSender, TelegramSender};

/// 텔레그램 전송기를 감싸는 싱크 어댑터.
pub struct TelegramSink {
    sender: TelegramSender,
}

impl TelegramSink {
    /// 새 어댑터를 생성합니다.
    pub fn new(sender: TelegramSender) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl SignalSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn publish(&self, signal: &ChochSignal) -> Result<(), SinkError> {
        self.sender.send_signal(signal).await.map_err(|e| match e {
            // 설정 오류는 재시도해도 소용이 없다
            NotificationError::InvalidConfig(msg) => SinkError::Fatal(msg),
            other => SinkError::Transient(other.to_string()),
        })
    }
}
