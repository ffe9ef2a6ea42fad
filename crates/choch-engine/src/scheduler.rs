//! 타임프레임 스케줄러.
//!
//! 각 타임프레임의 캔들이 정확히 마감되었을 때만 스캔을 허용합니다.
//! 마감 경계는 집계기와 동일한 정렬 산술([`Timeframe::latest_close`])을
//! 사용하므로, 25m처럼 1440분을 나누지 않는 타임프레임도 고정 기준점
//! 기준으로 일관되게 스케줄됩니다.
//!
//! 거래소 기록 지연을 감안해 마감 후 유예 시간(grace)이 지나야 스캔
//! 대상이 됩니다. 틱을 놓쳐도 마감 캔들 하나당 스캔은 한 번만 실행됩니다.

use chrono::{DateTime, Duration, Utc};
use choch_core::Timeframe;
use std::collections::HashMap;
use tracing::debug;

/// 마감 시각 기준 타임프레임 스케줄러.
#[derive(Debug)]
pub struct TimeframeScheduler {
    timeframes: Vec<Timeframe>,
    grace: Duration,
    /// 타임프레임별 마지막으로 스캔한 마감 시각
    last_scanned: HashMap<Timeframe, DateTime<Utc>>,
}

impl TimeframeScheduler {
    /// 새 스케줄러를 생성합니다.
    pub fn new(timeframes: Vec<Timeframe>, grace_seconds: i64) -> Self {
        Self {
            timeframes,
            grace: Duration::seconds(grace_seconds),
            last_scanned: HashMap::new(),
        }
    }

    /// `now` 기준으로 스캔할 타임프레임과 해당 마감 시각을 반환합니다.
    ///
    /// 반환된 타임프레임의 스캔 워터마크는 즉시 갱신되므로, 같은 마감
    /// 캔들에 대해 두 번 반환되지 않습니다.
    pub fn get_scannable(&mut self, now: DateTime<Utc>) -> Vec<(Timeframe, DateTime<Utc>)> {
        let mut ready = Vec::new();

        for &tf in &self.timeframes {
            let close_time = tf.latest_close(now);

            let already_scanned = self
                .last_scanned
                .get(&tf)
                .is_some_and(|scanned| close_time <= *scanned);
            if already_scanned {
                continue;
            }

            if now < close_time + self.grace {
                debug!(timeframe = %tf, close_time = %close_time, "유예 시간 대기 중");
                continue;
            }

            self.last_scanned.insert(tf, close_time);
            ready.push((tf, close_time));
        }

        ready
    }

    /// 타임프레임의 마지막 스캔 마감 시각을 반환합니다.
    pub fn last_scanned(&self, timeframe: Timeframe) -> Option<DateTime<Utc>> {
        self.last_scanned.get(&timeframe).copied()
    }
}
