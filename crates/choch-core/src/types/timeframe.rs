//! 캔들 타임프레임 정의 및 경계 정렬.
//!
//! 이 모듈은 타임프레임 타입과 캔들 경계 계산을 정의합니다.
//! 집계기(aggregator)와 스케줄러가 동일한 경계를 공유해야 하므로
//! 기준점(reference) 맵과 경계 산술은 모두 여기에 있습니다.
//!
//! # 정렬 규칙
//!
//! - **네이티브 타임프레임** (5m, 15m, 30m, 1h, 2h, 4h, 1d): 간격이
//!   1440분을 나누므로 임의의 UTC 자정을 기준으로 정렬됩니다.
//! - **집계 타임프레임** (10m, 20m, 25m, 40m, 50m): 5분봉에서 합성되며
//!   고정 기준 시각(reference instant)을 기준으로 정렬됩니다.
//!   특히 25m은 1440 % 25 != 0이므로 자정 정렬 시 날짜마다 경계가
//!   어긋납니다. 고정 기준점만이 전역적으로 일관된 분할을 보장합니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 캔들 타임프레임.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// 5분봉 (집계의 기준 타임프레임)
    M5,
    /// 10분봉 (집계)
    M10,
    /// 15분봉
    M15,
    /// 20분봉 (집계)
    M20,
    /// 25분봉 (집계)
    M25,
    /// 30분봉
    M30,
    /// 40분봉 (집계)
    M40,
    /// 50분봉 (집계)
    M50,
    /// 1시간봉
    H1,
    /// 2시간봉
    H2,
    /// 4시간봉
    H4,
    /// 일봉
    D1,
}

impl Timeframe {
    /// 이 타임프레임의 분 단위 값을 반환합니다.
    pub fn as_minutes(&self) -> i64 {
        match self {
            Timeframe::M5 => 5,
            Timeframe::M10 => 10,
            Timeframe::M15 => 15,
            Timeframe::M20 => 20,
            Timeframe::M25 => 25,
            Timeframe::M30 => 30,
            Timeframe::M40 => 40,
            Timeframe::M50 => 50,
            Timeframe::H1 => 60,
            Timeframe::H2 => 120,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// 이 타임프레임의 초 단위 값을 반환합니다.
    pub fn as_secs(&self) -> i64 {
        self.as_minutes() * 60
    }

    /// 이 타임프레임의 기간을 반환합니다.
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.as_secs())
    }

    /// 5분봉에서 합성되는 집계 타임프레임인지 확인합니다.
    pub fn is_aggregated(&self) -> bool {
        matches!(
            self,
            Timeframe::M10 | Timeframe::M20 | Timeframe::M25 | Timeframe::M40 | Timeframe::M50
        )
    }

    /// 집계 타임프레임 하나를 채우는 데 필요한 5분봉 개수를 반환합니다.
    ///
    /// 네이티브 타임프레임은 `None`을 반환합니다 (거래소에서 직접 조회).
    pub fn base_multiplier(&self) -> Option<usize> {
        if self.is_aggregated() {
            Some((self.as_minutes() / 5) as usize)
        } else {
            None
        }
    }

    /// 집계 타임프레임의 고정 기준 시각(UTC)을 반환합니다.
    ///
    /// 기준 시각은 거래소 캔들의 실제 시작 시각에서 가져온 값이며
    /// 집계기와 스케줄러가 공유합니다.
    pub fn reference(&self) -> Option<DateTime<Utc>> {
        let reference = match self {
            Timeframe::M10 => Utc.with_ymd_and_hms(2025, 10, 24, 17, 10, 0),
            Timeframe::M20 => Utc.with_ymd_and_hms(2025, 10, 24, 17, 20, 0),
            Timeframe::M25 => Utc.with_ymd_and_hms(2025, 10, 24, 17, 5, 0),
            Timeframe::M40 => Utc.with_ymd_and_hms(2025, 10, 24, 16, 40, 0),
            Timeframe::M50 => Utc.with_ymd_and_hms(2025, 10, 20, 0, 0, 0),
            _ => return None,
        };
        Some(reference.unwrap())
    }

    /// 경계 계산에 사용할 앵커 시각을 반환합니다.
    ///
    /// 집계 타임프레임은 고정 기준 시각, 네이티브 타임프레임은 UTC 자정
    /// (에포크)을 사용합니다. 네이티브 간격은 모두 1440분을 나누므로 어느
    /// 자정을 쓰더라도 경계가 동일합니다.
    pub fn anchor(&self) -> DateTime<Utc> {
        self.reference().unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// `t`가 속한 캔들 기간의 시작 시각을 반환합니다.
    ///
    /// `period_index = floor((t - anchor) / interval)` 이며, 앵커 이전
    /// 시각에 대해서도 유클리드 내림으로 음수 인덱스를 허용합니다.
    pub fn period_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let anchor = self.anchor();
        let interval = self.as_secs();
        let diff = (t - anchor).num_seconds();
        let period_index = diff.div_euclid(interval);
        anchor + Duration::seconds(period_index * interval)
    }

    /// `now` 이전(또는 동일)에 마감된 가장 최근 캔들의 마감 시각을 반환합니다.
    ///
    /// 경계 시각마다 직전 캔들이 마감되므로, 최근 마감 시각은 `now`가 속한
    /// 기간의 시작 시각과 같습니다.
    pub fn latest_close(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.period_start(now)
    }

    /// 거래소 간격 문자열로 변환합니다.
    pub fn to_interval_str(&self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M10 => "10m",
            Timeframe::M15 => "15m",
            Timeframe::M20 => "20m",
            Timeframe::M25 => "25m",
            Timeframe::M30 => "30m",
            Timeframe::M40 => "40m",
            Timeframe::M50 => "50m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// 간격 문자열에서 파싱합니다.
    pub fn from_interval_str(s: &str) -> Option<Self> {
        match s {
            "5m" => Some(Timeframe::M5),
            "10m" => Some(Timeframe::M10),
            "15m" => Some(Timeframe::M15),
            "20m" => Some(Timeframe::M20),
            "25m" => Some(Timeframe::M25),
            "30m" => Some(Timeframe::M30),
            "40m" => Some(Timeframe::M40),
            "50m" => Some(Timeframe::M50),
            "1h" => Some(Timeframe::H1),
            "2h" => Some(Timeframe::H2),
            "4h" => Some(Timeframe::H4),
            "1d" => Some(Timeframe::D1),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_interval_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_interval_str(s).ok_or_else(|| format!("Invalid timeframe: {}", s))
    }
}
