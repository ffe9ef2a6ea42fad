//! 감지기 파사드.
//!
//! 스캔 한 번의 감지 흐름을 묶습니다: 피벗 재구성(초기화 → 감지 →
//! 변형 필터 → 합성 삽입 → 저장 → 8피벗 검증) 후 마지막 봉에서
//! CHoCH 확정 검사를 수행합니다.

use crate::config::DetectorConfig;
use crate::confirm::{check_choch, Detection};
use crate::pattern::check_eight_pattern;
use crate::pivot::{classify_variant, is_pivot_high, is_pivot_low, synthetic_pivot, Pivot, PivotKind};
use crate::state::TimeframeState;
use crate::DetectorResult;
use choch_core::Candle;
use tracing::debug;

/// CHoCH 감지기.
///
/// 설정만 보관하는 무상태 구성요소입니다. (심볼, 타임프레임)별 상태는
/// 호출자가 [`TimeframeState`]로 소유합니다.
#[derive(Debug, Clone)]
pub struct ChochDetector {
    config: DetectorConfig,
}

impl ChochDetector {
    /// 새 감지기를 생성합니다.
    pub fn new(config: DetectorConfig) -> DetectorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 감지기 설정을 반환합니다.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 설정에 맞는 새 상태를 생성합니다.
    pub fn new_state(&self) -> TimeframeState {
        TimeframeState::new(self.config.keep_pivots)
    }

    /// 새 윈도우에서 피벗 히스토리를 처음부터 재구성합니다.
    ///
    /// 이전 상태의 피벗은 모두 버려집니다. 재구성 후 8피벗 패턴 검증까지
    /// 수행하며, 저장된 피벗 수를 반환합니다.
    pub fn rebuild_pivots(
        &self,
        state: &mut TimeframeState,
        window: &[Candle],
    ) -> DetectorResult<usize> {
        state.reset();

        let left = self.config.left;
        let right = self.config.right;
        if window.len() < left + right + 1 {
            return Ok(0);
        }

        for i in left..window.len() - right {
            let is_ph = is_pivot_high(window, i, left, right);
            let is_pl = is_pivot_low(window, i, left, right);

            // 한 봉이 고점과 저점을 동시에 만족하면 고점으로 처리한다
            let kind = if is_ph {
                PivotKind::High
            } else if is_pl {
                PivotKind::Low
            } else {
                continue;
            };

            let price = match kind {
                PivotKind::High => window[i].high,
                PivotKind::Low => window[i].low,
            };

            let variant = classify_variant(window, i, kind);
            if self.config.use_variant_filter {
                match variant {
                    Some(v) if self.config.allow.allows(v) => {}
                    _ => continue,
                }
            }

            if let Some(last) = state.last_pivot().copied() {
                if let Some(fake) = synthetic_pivot(window, &last, i, kind) {
                    debug!(bar = fake.bar, price = %fake.price, "합성 피벗 삽입");
                    state.store_pivot(fake);
                }
            }

            state.store_pivot(Pivot {
                bar: i,
                price,
                kind,
                variant,
            });
        }

        check_eight_pattern(state, window);

        debug!(
            bars = window.len(),
            pivots = state.pivot_count(),
            pattern = state.has_pattern(),
            "피벗 재구성 완료"
        );

        Ok(state.pivot_count())
    }

    /// 마지막 봉에서 CHoCH 확정 검사를 수행합니다.
    ///
    /// [`ChochDetector::rebuild_pivots`]로 재구성된 상태를 사용합니다.
    pub fn process(
        &self,
        state: &mut TimeframeState,
        window: &[Candle],
    ) -> DetectorResult<Detection> {
        check_choch(state, window)
    }
}
