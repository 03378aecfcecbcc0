//! Reusable value checks for key-check requirements.
//!
//! Each check judges a single value fetched from a request store. They are
//! built once and may be shared between any number of requirements.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::error::Error;
use crate::request::Request;

/// Judges whether a fetched value is acceptable.
///
/// # Examples
///
/// ```
/// use request_guard::{Request, ValueCheck};
/// use serde_json::Value;
///
/// struct Even;
///
/// impl ValueCheck for Even {
///     fn accepts(&self, value: &Value, _request: &dyn Request) -> bool {
///         value.as_i64().is_some_and(|n| n % 2 == 0)
///     }
/// }
/// ```
pub trait ValueCheck: Send + Sync {
    /// Returns true if `value` passes the check.
    fn accepts(&self, value: &Value, request: &dyn Request) -> bool;
}

/// Source of the current time, in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> f64;
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        self.0
    }
}

const TIME_UNITS: [(char, f64); 7] = [
    ('s', 1.0),
    ('m', 60.0),
    ('h', 3_600.0),
    ('d', 86_400.0),
    ('w', 604_800.0),
    ('M', 2_592_000.0),
    ('y', 31_536_000.0),
];

/// Passes if a timestamp is no older than a maximum age.
///
/// Ages are given in seconds or as `"<count><unit>"` with unit one of
/// `s`, `m`, `h`, `d`, `w`, `M` (30 days) or `y` (365 days). A bare count
/// is seconds. The comparison is inclusive: a timestamp exactly `age`
/// seconds old passes.
///
/// # Examples
///
/// ```
/// use request_guard::{FixedClock, TimestampAge};
///
/// let fresh = TimestampAge::parse("1d").unwrap().with_clock(FixedClock(100_000.0));
/// assert!(fresh.is_fresh(13_600.0));
/// assert!(!fresh.is_fresh(13_599.0));
/// ```
#[derive(Clone)]
pub struct TimestampAge {
    age: f64,
    clock: Arc<dyn Clock>,
}

impl TimestampAge {
    /// A check for timestamps at most `seconds` old.
    ///
    /// # Errors
    ///
    /// A negative age only accepts timestamps at least that far in the
    /// past.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `seconds` is not finite.
    pub fn new(seconds: f64) -> Result<Self, Error> {
        if !seconds.is_finite() {
            return Err(Error::invalid_argument(
                "timestamp age must be a finite number of seconds",
            ));
        }
        Ok(Self {
            age: seconds,
            clock: Arc::new(SystemClock),
        })
    }

    /// Parses an age string such as `"30s"`, `"3m"` or `"1d"`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `age` is not an unsigned integer
    /// optionally followed by a single unit letter.
    pub fn parse(age: &str) -> Result<Self, Error> {
        let malformed = || Error::invalid_argument(format!("malformed timestamp age '{}'", age));

        let trimmed = age.trim_end();
        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (count, unit) = trimmed.split_at(digits_end);
        if count.is_empty() {
            return Err(malformed());
        }

        let multiplier = match unit {
            "" => 1.0,
            _ => {
                let mut chars = unit.chars();
                let letter = chars.next().ok_or_else(malformed)?;
                if chars.next().is_some() {
                    return Err(malformed());
                }
                TIME_UNITS
                    .iter()
                    .find(|(u, _)| *u == letter)
                    .map(|(_, seconds)| *seconds)
                    .ok_or_else(malformed)?
            }
        };

        let count: f64 = count.parse().map_err(|_| malformed())?;
        Self::new(count * multiplier)
    }

    /// Replaces the clock used to read the current time.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The maximum age, in seconds.
    pub fn age(&self) -> f64 {
        self.age
    }

    /// Returns true if `timestamp` is no older than the maximum age.
    pub fn is_fresh(&self, timestamp: f64) -> bool {
        let now = self.clock.now();
        timestamp + self.age >= now
    }
}

impl FromStr for TimestampAge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl ValueCheck for TimestampAge {
    fn accepts(&self, value: &Value, _request: &dyn Request) -> bool {
        value.as_f64().is_some_and(|t| self.is_fresh(t))
    }
}

impl fmt::Debug for TimestampAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampAge").field("age", &self.age).finish()
    }
}

/// Passes if the value is an array containing an item.
///
/// # Examples
///
/// ```
/// use request_guard::Contains;
/// use serde_json::json;
///
/// let admin = Contains::new("admin");
/// assert!(admin.matches(&json!(["user", "admin"])));
/// assert!(!admin.matches(&json!("admin")));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Contains {
    item: Value,
}

impl Contains {
    /// A check for arrays containing `item`.
    pub fn new(item: impl Into<Value>) -> Self {
        Self { item: item.into() }
    }

    /// Returns true if `value` is an array holding the item.
    pub fn matches(&self, value: &Value) -> bool {
        value
            .as_array()
            .is_some_and(|items| items.contains(&self.item))
    }
}

impl ValueCheck for Contains {
    fn accepts(&self, value: &Value, _request: &dyn Request) -> bool {
        self.matches(value)
    }
}

/// Passes if the value equals what the request context holds under a key.
///
/// A missing context key compares as `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    key: String,
}

impl MatchContext {
    /// A check against the context value stored under `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The context key compared against.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl ValueCheck for MatchContext {
    fn accepts(&self, value: &Value, request: &dyn Request) -> bool {
        let expected = request.context().fetch(&self.key).unwrap_or(Value::Null);
        *value == expected
    }
}

/// Adapts a plain closure over the fetched value.
pub(crate) struct FnCheck<F>(pub(crate) F);

impl<F> ValueCheck for FnCheck<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn accepts(&self, value: &Value, _request: &dyn Request) -> bool {
        (self.0)(value)
    }
}
