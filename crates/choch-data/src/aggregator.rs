//! 정렬 캔들 집계기.
//!
//! 마감된 5분봉 시퀀스를 고정 기준점 정렬을 유지하면서
//! 10m/20m/25m/40m/50m 캔들로 합성합니다.
//!
//! 각 5분봉은 `Timeframe::period_start`로 소속 기간을 배정받고, 기간을
//! 완전히 채운 그룹(`interval / 5`개)만 출력됩니다. 입력에 공백이 있으면
//! 해당 기간은 보간 없이 그대로 빠집니다.

use choch_core::{Candle, Timeframe};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// 집계 에러.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// 대상이 집계 타임프레임이 아님
    #[error("집계 대상이 아닌 타임프레임입니다: {0}")]
    NotAggregated(Timeframe),

    /// 입력이 5분봉이 아님
    #[error("5분봉 입력이 아닙니다: {0}")]
    NotBaseInput(Timeframe),
}

/// 고정 기준점 정렬 캔들 집계기.
pub struct AlignedCandleAggregator;

impl AlignedCandleAggregator {
    /// 마감된 5분봉을 대상 타임프레임 캔들로 집계합니다.
    ///
    /// 입력은 이미 마감되고 시간순으로 정렬된 5분봉이어야 합니다.
    /// 출력의 모든 `open_time`은 `reference + k * interval` 등차수열 위에
    /// 있으며, 완전한 기간만 포함됩니다.
    pub fn aggregate(base: &[Candle], target: Timeframe) -> Result<Vec<Candle>, AggregateError> {
        if !target.is_aggregated() {
            return Err(AggregateError::NotAggregated(target));
        }
        let expected = target
            .base_multiplier()
            .expect("집계 타임프레임은 배수를 갖는다");

        // 기간 시작 시각 기준으로 그룹화 (BTreeMap: 시간 오름차순)
        let mut groups: BTreeMap<DateTime<Utc>, Vec<&Candle>> = BTreeMap::new();
        for candle in base {
            if candle.timeframe != Timeframe::M5 {
                return Err(AggregateError::NotBaseInput(candle.timeframe));
            }
            let period_start = target.period_start(candle.open_time);
            groups.entry(period_start).or_default().push(candle);
        }

        let mut out = Vec::with_capacity(groups.len());
        let mut incomplete = 0usize;

        for (period_start, members) in groups {
            if members.len() != expected {
                incomplete += 1;
                continue;
            }

            let first = members[0];
            let mut high = first.high;
            let mut low = first.low;
            let mut volume = first.volume;
            for candle in &members[1..] {
                high = high.max(candle.high);
                low = low.min(candle.low);
                volume += candle.volume;
            }

            let aggregated = Candle::new(
                first.symbol.clone(),
                target,
                period_start,
                first.open,
                high,
                low,
                members[expected - 1].close,
                volume,
            );

            if let Err(e) = aggregated.validate() {
                warn!(error = %e, period_start = %period_start, "집계 캔들 불변식 위반");
            }

            out.push(aggregated);
        }

        if incomplete > 0 {
            debug!(incomplete, target = %target, "불완전 기간 제외");
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choch_core::Symbol;
    use chrono::{Duration, TimeZone, Timelike};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    /// `start`부터 5분 간격으로 `count`개의 5분봉 생성.
    ///
    /// i번째 봉: open = 100 + i, close = open + 1, high = close + 1,
    /// low = open - 1, volume = 10.
    fn base_candles(start: DateTime<Utc>, count: usize) -> Vec<Candle> {
        (0..count)
            .map(|i| {
                let open = dec!(100) + Decimal::from(i as i64);
                Candle::new(
                    Symbol::new("BTC", "USDT"),
                    Timeframe::M5,
                    start + Duration::minutes(5 * i as i64),
                    open,
                    open + dec!(2),
                    open - dec!(1),
                    open + dec!(1),
                    dec!(10),
                )
            })
            .collect()
    }

    #[test]
    fn test_25m_alignment_across_midnight() {
        // 23:30 ~ 01:30 시작 시각의 5분봉 25개 → 25분봉 5개
        let base = base_candles(utc(2025, 10, 25, 23, 30), 25);
        let out = AlignedCandleAggregator::aggregate(&base, Timeframe::M25).unwrap();

        let open_times: Vec<_> = out.iter().map(|c| c.open_time).collect();
        assert_eq!(
            open_times,
            vec![
                utc(2025, 10, 25, 23, 30),
                utc(2025, 10, 25, 23, 55),
                utc(2025, 10, 26, 0, 20),
                utc(2025, 10, 26, 0, 45),
                utc(2025, 10, 26, 1, 10),
            ]
        );

        // 어느 경계도 자정에 정렬되지 않는다
        assert!(out.iter().all(|c| {
            !(c.open_time.time().hour() == 0 && c.open_time.time().minute() == 0)
        }));

        // 00:20 캔들: open = 5m[00:20].open, close = 5m[00:40].close,
        // volume = Σ 5m[00:20..00:40]
        let c = &out[2];
        assert_eq!(c.open, dec!(110)); // 00:20은 10번째 봉 (100 + 10)
        assert_eq!(c.close, dec!(115)); // 00:40은 14번째 봉, close = 114 + 1
        assert_eq!(c.volume, dec!(50));
        assert_eq!(c.close_time, utc(2025, 10, 26, 0, 45));
    }

    #[test]
    fn test_open_time_progression_invariant() {
        let base = base_candles(utc(2025, 10, 25, 23, 30), 25);
        for tf in [Timeframe::M10, Timeframe::M20, Timeframe::M25, Timeframe::M40] {
            let out = AlignedCandleAggregator::aggregate(&base, tf).unwrap();
            assert!(!out.is_empty(), "{} 집계 결과가 비어 있음", tf);
            for candle in &out {
                assert_eq!(
                    tf.period_start(candle.open_time),
                    candle.open_time,
                    "{} 캔들이 등차수열을 벗어남",
                    tf
                );
            }
        }
    }

    #[test]
    fn test_partial_periods_dropped() {
        // 23:30부터 21개: 마지막 기간(01:10~)은 1/5만 차서 제외된다
        let base = base_candles(utc(2025, 10, 25, 23, 30), 21);
        let out = AlignedCandleAggregator::aggregate(&base, Timeframe::M25).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_gap_omits_period_without_interpolation() {
        let mut base = base_candles(utc(2025, 10, 25, 23, 30), 25);
        // 00:25 봉 제거 → 00:20 기간이 4/5가 되어 빠진다
        base.retain(|c| c.open_time != utc(2025, 10, 26, 0, 25));

        let out = AlignedCandleAggregator::aggregate(&base, Timeframe::M25).unwrap();
        let open_times: Vec<_> = out.iter().map(|c| c.open_time).collect();
        assert!(!open_times.contains(&utc(2025, 10, 26, 0, 20)));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_appending_incomplete_candles_is_idempotent() {
        let base = base_candles(utc(2025, 10, 25, 23, 30), 25);
        let first = AlignedCandleAggregator::aggregate(&base, Timeframe::M25).unwrap();

        // 새 기간을 완성하지 못하는 5분봉을 덧붙여도 결과는 같다
        let extended = base_candles(utc(2025, 10, 25, 23, 30), 27);
        let second = AlignedCandleAggregator::aggregate(&extended, Timeframe::M25).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_native_target() {
        let base = base_candles(utc(2025, 10, 25, 23, 30), 5);
        assert!(matches!(
            AlignedCandleAggregator::aggregate(&base, Timeframe::M15),
            Err(AggregateError::NotAggregated(Timeframe::M15))
        ));
    }

    #[test]
    fn test_rejects_non_base_input() {
        let mut base = base_candles(utc(2025, 10, 25, 23, 30), 5);
        base[0].timeframe = Timeframe::M15;
        assert!(matches!(
            AlignedCandleAggregator::aggregate(&base, Timeframe::M10),
            Err(AggregateError::NotBaseInput(Timeframe::M15))
        ));
    }

    #[test]
    fn test_empty_input() {
        let out = AlignedCandleAggregator::aggregate(&[], Timeframe::M25).unwrap();
        assert!(out.is_empty());
    }
}
