//! CHoCH 시스템의 공통 에러 타입.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum ChochError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력 (캔들 불변식 위반 등)
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type ChochResult<T> = Result<T, ChochError>;

impl ChochError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChochError::Network(_))
    }
}

impl From<serde_json::Error> for ChochError {
    fn from(err: serde_json::Error) -> Self {
        ChochError::Serialization(err.to_string())
    }
}
