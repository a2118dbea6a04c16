use super::cas::next_cas;
use bytes::Bytes;

/// Cache value associated with a key
pub type ValueType = Bytes;

/// Expiration values below this many seconds (30 days) are relative to now,
/// anything above is an absolute Unix timestamp.
pub const MAX_RELATIVE_SECONDS: i64 = 60 * 60 * 24 * 30;

/// Expiration sentinel for records that never expire.
pub const NEVER_EXPIRES: u64 = 0;

/// Converts client supplied `exptime` seconds into an absolute expiration
/// instant in milliseconds since epoch.
///
/// - `0` never expires,
/// - values below [`MAX_RELATIVE_SECONDS`] (negative ones included) are
///   relative to `now`; negative values land in the past,
/// - anything else is an absolute Unix time in seconds.
pub fn expiration_from_seconds(exptime: i64, now: u64) -> u64 {
    if exptime == 0 {
        return NEVER_EXPIRES;
    }
    if exptime < MAX_RELATIVE_SECONDS {
        let offset = exptime.saturating_mul(1000);
        // 0 is the never expires sentinel, an instant in the past must not collapse into it
        return now.saturating_add_signed(offset).max(1);
    }
    (exptime as u64).saturating_mul(1000)
}

/// Value, flags, expiration and cas token stored under a key
#[derive(Clone, Debug)]
pub struct Record {
    pub(crate) value: ValueType,
    pub(crate) flags: u32,
    pub(crate) expiration: u64,
    pub(crate) cas: u64,
}

impl Record {
    /// Creates a record with a fresh cas token, `now` is the current time
    /// in milliseconds since epoch.
    pub fn new(value: ValueType, exptime: i64, flags: u32, now: u64) -> Record {
        Record {
            value,
            flags,
            expiration: expiration_from_seconds(exptime, now),
            cas: next_cas(),
        }
    }

    pub fn value(&self) -> &ValueType {
        &self.value
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    pub fn cas(&self) -> u64 {
        self.cas
    }

    /// Recomputes expiration with the same rule as construction and
    /// rotates the cas token. `0` resets the record to never expire.
    pub fn touch(&mut self, exptime: i64, now: u64) {
        self.expiration = expiration_from_seconds(exptime, now);
        self.cas = next_cas();
    }

    /// Replaces the payload keeping flags and expiration, rotates the cas token.
    pub fn update_value(&mut self, value: ValueType) {
        self.value = value;
        self.cas = next_cas();
    }

    pub fn is_valid(&self, now: u64) -> bool {
        self.expiration == NEVER_EXPIRES || now < self.expiration
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
