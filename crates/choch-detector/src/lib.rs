//! # CHoCH Detector
//!
//! 마감 캔들 윈도우에서 CHoCH(Change of Character) 반전 패턴을 감지합니다.
//!
//! # 감지 파이프라인
//!
//! 1. **피벗 감지** ([`pivot`]): 윈도우에서 피벗 고점/저점을 찾고
//!    6가지 변형(PH1~PH3, PL1~PL3)으로 분류하며, 같은 종류의 피벗이
//!    연속되면 합성 피벗을 삽입합니다.
//! 2. **8피벗 검증** ([`pattern`]): 마지막 8개 피벗이 교대 구조, 리테스트,
//!    극값, 돌파 조건과 세 가지 그룹 순서(G1/G2/G3) 중 하나를 만족하는지
//!    검증합니다.
//! 3. **CHoCH 확정** ([`confirm`]): 최근 3개 마감 캔들이 가격/거래량
//!    반전 규칙을 만족하면 시그널을 발화하고 잠금을 겁니다.
//!
//! 모든 입력은 마감된 캔들입니다. 형성 중인 봉은 페처 단계에서 이미
//! 제거되어 있어야 합니다.

pub mod config;
pub mod confirm;
pub mod detector;
pub mod pattern;
pub mod pivot;
pub mod state;

pub use config::{DetectorConfig, VariantAllowSet};
pub use confirm::Detection;
pub use detector::ChochDetector;
pub use pivot::{Pivot, PivotKind, PivotVariant};
pub use state::TimeframeState;

use thiserror::Error;

/// 감지기 오류.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// 데이터 부족 오류
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 패턴은 성립했지만 그룹 태그가 없음 (로직 버그)
    #[error("8피벗 패턴에 그룹 태그가 없습니다")]
    MissingGroup,

    /// 패턴 참조 가격 누락 (로직 버그)
    #[error("8피벗 패턴의 참조 가격이 없습니다")]
    MissingPatternRefs,

    /// 피벗 봉 인덱스가 윈도우를 벗어남
    #[error("피벗 봉 인덱스가 윈도우를 벗어났습니다: {bar}")]
    PivotOutOfWindow { bar: usize },
}

/// 감지 작업 결과 타입.
pub type DetectorResult<T> = Result<T, DetectorError>;
