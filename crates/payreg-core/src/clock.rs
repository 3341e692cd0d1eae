//! Timestamp formatting shared by artifacts and store records.

/// `chrono` format of every persisted timestamp: ISO-8601, microseconds, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current UTC time in [`TIMESTAMP_FORMAT`].
///
/// # Examples
///
/// ```
/// let now = payreg_core::clock::utc_timestamp();
/// assert_eq!(now.len(), "2026-01-01T00:00:00.000000".len());
/// assert!(!now.ends_with('Z'));
/// ```
#[must_use]
pub fn utc_timestamp() -> String {
    chrono::Utc::now()
        .naive_utc()
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
