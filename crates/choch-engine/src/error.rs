//! 스캔 에러 타입.

use choch_data::{AggregateError, FetchError};
use choch_detector::DetectorError;
use thiserror::Error;

/// 스캔 사이클 에러.
///
/// 순수 패턴 로직의 에러는 감지기 안에서 분류되어 이 타입으로만
/// 엔진 경계를 넘습니다.
#[derive(Debug, Error)]
pub enum ScanError {
    /// 캔들 OHLC 불변식 위반. 사이클 건너뜀.
    #[error("캔들 데이터 불량: {0}")]
    InputMalformed(String),

    /// 마감 캔들 부족. 조용히 건너뜀.
    #[error("데이터 부족: 필요 {required}개, 보유 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 일시적 조회 실패. 다음 마감 시 재시도.
    #[error("조회 일시 실패: {0}")]
    FetcherTransient(String),

    /// 영구 조회 실패. 슈퍼바이저로 전파.
    #[error("조회 영구 실패: {0}")]
    FetcherFatal(String),

    /// 일시적 발행 실패. 시그널은 잠금 안에 보존되고 재전송된다.
    #[error("발행 일시 실패: {0}")]
    SinkTransient(String),

    /// 영구 발행 실패. 워커 중단.
    #[error("발행 영구 실패: {0}")]
    SinkFatal(String),

    /// 로직 위반 (버그). 사이클 건너뛰고 상태와 함께 기록.
    #[error("로직 위반: {0}")]
    LogicAssertion(String),
}

/// 스캔 작업 결과 타입.
pub type ScanResult<T> = Result<T, ScanError>;

impl ScanError {
    /// 다음 스캔에서 재시도할 수 있는 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::FetcherTransient(_) | ScanError::SinkTransient(_)
        )
    }

    /// 워커를 중단해야 하는 치명적 에러인지 확인합니다.
    pub fn is_critical(&self) -> bool {
        matches!(self, ScanError::FetcherFatal(_) | ScanError::SinkFatal(_))
    }
}

impl From<FetchError> for ScanError {
    fn from(err: FetchError) -> Self {
        if err.is_transient() {
            ScanError::FetcherTransient(err.to_string())
        } else {
            ScanError::FetcherFatal(err.to_string())
        }
    }
}

impl From<DetectorError> for ScanError {
    fn from(err: DetectorError) -> Self {
        match err {
            DetectorError::InsufficientData { required, provided } => {
                ScanError::InsufficientData { required, provided }
            }
            other => ScanError::LogicAssertion(other.to_string()),
        }
    }
}

impl From<AggregateError> for ScanError {
    fn from(err: AggregateError) -> Self {
        ScanError::LogicAssertion(err.to_string())
    }
}
