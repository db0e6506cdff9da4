// Copyright 2015-2024 Swim Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use super::{InvalidNanoseconds, Timestamp};

#[test]
fn reject_overflowing_nanos() {
    assert_eq!(
        Timestamp::new(0, 1_000_000_000),
        Err(InvalidNanoseconds(1_000_000_000))
    );
    assert!(Timestamp::new(-5, 999_999_999).is_ok());
}

#[test]
fn offset_converted_to_utc() {
    let offset = FixedOffset::east_opt(3600).unwrap();
    let local = offset.with_ymd_and_hms(2020, 1, 1, 1, 0, 0).unwrap();
    let utc = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(Timestamp::from(local), Timestamp::from(utc));
}

#[test]
fn naive_is_asserted_utc() {
    let naive = NaiveDate::from_ymd_opt(1999, 12, 31)
        .unwrap()
        .and_hms_nano_opt(23, 59, 59, 500)
        .unwrap();
    let ts = Timestamp::from_naive_utc(naive);
    assert_eq!(ts.seconds(), 946684799);
    assert_eq!(ts.nanoseconds(), 500);
}

#[test]
fn datetime_round_trip() {
    let dt: DateTime<Utc> = Utc.timestamp_opt(-62_135_596_800, 123_456_789).unwrap();
    let ts = Timestamp::from(dt);
    assert_eq!(ts.to_datetime(), Some(dt));
}

#[test]
fn out_of_range_datetime() {
    let ts = Timestamp::from_seconds(i64::MAX);
    assert!(ts.to_datetime().is_none());
    assert_eq!(ts.to_string(), format!("{}.000000000s", i64::MAX));
}
