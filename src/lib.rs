// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Collects the xUnit results generated when testing a set of packages.
//!
//! The crate recursively crawls for XML files under a build tree. Each
//! XML file is parsed, and if it has the structure of an xUnit result
//! file its statistics are extracted, summed up and rendered as a
//! summary with a pass/fail exit status.
//!
//! The pipeline is [`collect_reports()`] → [`summarize()`] →
//! [`writer::write_results()`]; each stage is usable on its own.

pub mod cli;
pub mod collector;
pub mod parser;
pub mod report;
pub mod writer;

pub use self::{
    collector::collect_reports,
    parser::{parse_report, ParseError, Schema},
    report::{summarize, Report},
};
