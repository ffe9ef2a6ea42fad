//! 알림 타입 및 trait 정의.

use async_trait::async_trait;
use choch_core::ChochSignal;

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl NotificationError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NotificationError::RateLimited(_) | NotificationError::NetworkError(_)
        )
    }
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// CHoCH 시그널 알림을 전송합니다.
    async fn send_signal(&self, signal: &ChochSignal) -> NotificationResult<()>;

    /// 전송기가 활성화되어 있는지 확인합니다.
    fn is_enabled(&self) -> bool;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}
