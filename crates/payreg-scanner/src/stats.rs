//! Scan statistics with atomic counters.
//!
//! This module provides [`ScanStats`] for counting work done by the parallel
//! analyzer and [`StatsSnapshot`] for point-in-time views.
//!
//! All counters use [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering; they are informational and carry no synchronization.
//!
//! # Examples
//!
//! ```
//! use payreg_scanner::ScanStats;
//!
//! let stats = ScanStats::new();
//! stats.add_discovered(1);
//! stats.increment_parsed();
//! stats.add_handlers(2);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.handlers, 2);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for scan statistics.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Source files found by the walker.
    discovered: AtomicU64,
    /// Files parsed without errors.
    parsed: AtomicU64,
    /// Files that could not be read.
    read_errors: AtomicU64,
    /// Files rejected for syntax errors.
    parse_errors: AtomicU64,
    /// Classes classified as models.
    models: AtomicU64,
    /// Route handlers, one per matching decorator.
    handlers: AtomicU64,
}

impl ScanStats {
    /// Creates a new [`ScanStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to the discovered files counter.
    #[inline]
    pub fn add_discovered(&self, count: u64) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    /// Increments the parsed files counter.
    #[inline]
    pub fn increment_parsed(&self) {
        self.parsed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the read error counter.
    #[inline]
    pub fn increment_read_errors(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the parse error counter.
    #[inline]
    pub fn increment_parse_errors(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds to the model counter.
    #[inline]
    pub fn add_models(&self, count: u64) {
        self.models.fetch_add(count, Ordering::Relaxed);
    }

    /// Adds to the route handler counter.
    #[inline]
    pub fn add_handlers(&self, count: u64) {
        self.handlers.fetch_add(count, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all statistics.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            discovered: self.discovered.load(Ordering::Relaxed),
            parsed: self.parsed.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            models: self.models.load(Ordering::Relaxed),
            handlers: self.handlers.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.discovered.store(0, Ordering::Relaxed);
        self.parsed.store(0, Ordering::Relaxed);
        self.read_errors.store(0, Ordering::Relaxed);
        self.parse_errors.store(0, Ordering::Relaxed);
        self.models.store(0, Ordering::Relaxed);
        self.handlers.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of [`ScanStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Source files found by the walker.
    pub discovered: u64,
    /// Files parsed without errors.
    pub parsed: u64,
    /// Files that could not be read.
    pub read_errors: u64,
    /// Files rejected for syntax errors.
    pub parse_errors: u64,
    /// Classes classified as models.
    pub models: u64,
    /// Route handlers, one per matching decorator.
    pub handlers: u64,
}

impl StatsSnapshot {
    /// Files skipped for any reason.
    #[inline]
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.read_errors + self.parse_errors
    }
}
