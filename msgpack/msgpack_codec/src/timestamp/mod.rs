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

use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

#[cfg(test)]
mod tests;

pub(crate) const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// An instant on the UTC time line as carried by the MessagePack timestamp extension (type -1).
///
/// The nanosecond component is always less than one second. A timestamp can only be
/// created from a value with a known offset from UTC: local times are converted and
/// naive date-times must be explicitly asserted to be UTC with [`Timestamp::from_naive_utc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: u32,
}

/// The nanosecond component of a timestamp was not less than one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidNanoseconds(pub u32);

impl Timestamp {
    pub const UNIX_EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanoseconds: 0,
    };

    /// # Arguments
    /// * `seconds` - Seconds since the Unix epoch.
    /// * `nanoseconds` - Sub-second component, must be less than 1e9.
    pub fn new(seconds: i64, nanoseconds: u32) -> Result<Self, InvalidNanoseconds> {
        if nanoseconds < NANOS_PER_SECOND {
            Ok(Timestamp {
                seconds,
                nanoseconds,
            })
        } else {
            Err(InvalidNanoseconds(nanoseconds))
        }
    }

    pub const fn from_seconds(seconds: i64) -> Self {
        Timestamp {
            seconds,
            nanoseconds: 0,
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// Interpret a date-time with no time zone as UTC.
    pub fn from_naive_utc(naive: NaiveDateTime) -> Self {
        Timestamp::from(Utc.from_utc_datetime(&naive))
    }

    /// Convert to a UTC date-time. Fails if the instant is outside the range that
    /// [`chrono`] can represent.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanoseconds).single()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(value: DateTime<Tz>) -> Self {
        let utc = value.with_timezone(&Utc);
        let mut seconds = utc.timestamp();
        let mut nanoseconds = utc.timestamp_subsec_nanos();
        //Leap seconds are reported as an overflowing nanosecond component.
        if nanoseconds >= NANOS_PER_SECOND {
            seconds += 1;
            nanoseconds -= NANOS_PER_SECOND;
        }
        Timestamp {
            seconds,
            nanoseconds,
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}.{:09}s", self.seconds, self.nanoseconds),
        }
    }
}
