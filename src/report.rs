// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Statistics extracted from a single result file, and their summation.

use std::fmt;

/// Label carried by the aggregate [`Report`] produced by [`summarize()`].
pub const SUMMARY_LABEL: &str = "Summary";

/// Statistics from a set of tests, usually a single result file.
///
/// All counts are extracted from the file's root tag by
/// [`parse_report()`] and validated to be non-negative there.
///
/// [`parse_report()`]: crate::parser::parse_report
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
    /// Origin of this [`Report`], as displayed to the user.
    ///
    /// This is the path of the parsed result file, or [`SUMMARY_LABEL`]
    /// for the aggregate.
    pub path: String,

    /// Number of tests the file declares.
    pub test_count: usize,

    /// Number of errored tests.
    pub error_count: usize,

    /// Number of failed tests.
    pub failure_count: usize,

    /// Number of skipped (or disabled) tests.
    pub skipped_count: usize,

    /// Pre-rendered detail blocks, one per testcase with errors or
    /// failures.
    ///
    /// [`None`] when detail collection wasn't requested, [`Some`]
    /// (possibly empty) when it was.
    pub details: Option<Vec<String>>,
}

impl Report {
    /// Creates an empty [`Report`] labelled with the given `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            test_count: 0,
            error_count: 0,
            failure_count: 0,
            skipped_count: 0,
            details: None,
        }
    }

    /// Indicates whether this [`Report`] counts any errors or failures.
    ///
    /// Records without problems are omitted from the output unless
    /// explicitly requested.
    #[must_use]
    pub const fn has_problems(&self) -> bool {
        self.error_count > 0 || self.failure_count > 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} test{}, {} error{}, {} failure{}, {} skipped",
            self.path,
            self.test_count,
            plural(self.test_count),
            self.error_count,
            plural(self.error_count),
            self.failure_count,
            plural(self.failure_count),
            self.skipped_count,
        )
    }
}

/// Sums the given [`Report`]s into a fresh aggregate one.
///
/// The aggregate is labelled [`SUMMARY_LABEL`], carries the elementwise
/// sum of the four counts, and never carries details. Summation is
/// commutative and associative, so the input order doesn't matter, and
/// an empty input yields an all-zero aggregate.
#[must_use]
pub fn summarize<'r>(reports: impl IntoIterator<Item = &'r Report>) -> Report {
    reports
        .into_iter()
        .fold(Report::new(SUMMARY_LABEL), |mut sum, report| {
            sum.test_count += report.test_count;
            sum.error_count += report.error_count;
            sum.failure_count += report.failure_count;
            sum.skipped_count += report.skipped_count;
            sum
        })
}

/// Returns an `s` suffix unless the given `num` is exactly `1`.
const fn plural(num: usize) -> &'static str {
    if num == 1 {
        ""
    } else {
        "s"
    }
}
