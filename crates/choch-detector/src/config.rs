//! 감지기 설정.

use crate::pivot::PivotVariant;
use crate::{DetectorError, DetectorResult};
use serde::{Deserialize, Serialize};

/// 피벗 변형 허용 집합.
///
/// 분류된 변형이 허용 집합에 없으면 해당 피벗은 버려집니다.
/// 합성 피벗은 필터 대상이 아닙니다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VariantAllowSet {
    pub ph1: bool,
    pub ph2: bool,
    pub ph3: bool,
    pub pl1: bool,
    pub pl2: bool,
    pub pl3: bool,
}

impl Default for VariantAllowSet {
    fn default() -> Self {
        Self {
            ph1: true,
            ph2: true,
            ph3: true,
            pl1: true,
            pl2: true,
            pl3: true,
        }
    }
}

impl VariantAllowSet {
    /// 해당 변형이 허용되는지 확인합니다.
    pub fn allows(&self, variant: PivotVariant) -> bool {
        match variant {
            PivotVariant::Ph1 => self.ph1,
            PivotVariant::Ph2 => self.ph2,
            PivotVariant::Ph3 => self.ph3,
            PivotVariant::Pl1 => self.pl1,
            PivotVariant::Pl2 => self.pl2,
            PivotVariant::Pl3 => self.pl3,
            PivotVariant::Synthetic => true,
        }
    }
}

/// 감지기 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// 피벗 왼쪽 비교 봉 수
    pub left: usize,
    /// 피벗 오른쪽 비교 봉 수
    pub right: usize,
    /// 피벗 저장 상한
    pub keep_pivots: usize,
    /// 변형 필터 사용 여부
    pub use_variant_filter: bool,
    /// 변형 허용 집합
    pub allow: VariantAllowSet,
    /// 스캔당 캔들 윈도우 크기
    pub window_size: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            left: 1,
            right: 1,
            keep_pivots: 200,
            use_variant_filter: true,
            allow: VariantAllowSet::default(),
            window_size: 50,
        }
    }
}

impl DetectorConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> DetectorResult<()> {
        if self.left < 1 || self.right < 1 {
            return Err(DetectorError::InvalidParameter(
                "left와 right는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.keep_pivots < 8 {
            return Err(DetectorError::InvalidParameter(
                "keep_pivots는 8 이상이어야 합니다".to_string(),
            ));
        }
        if self.window_size < self.left + self.right + 1 {
            return Err(DetectorError::InvalidParameter(format!(
                "window_size({})가 피벗 스팬({})보다 작습니다",
                self.window_size,
                self.left + self.right + 1
            )));
        }
        Ok(())
    }
}
