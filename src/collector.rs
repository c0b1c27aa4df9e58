// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Discovery of result files under a build tree.

use std::path::Path;

use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    parser::{parse_report, ParseError, Schema},
    report::Report,
};

/// Collects test results by parsing every XML file under `build_base`.
///
/// The tree is crawled recursively in ascending lexicographic filename
/// order at every level, independent of the filesystem's native
/// ordering, so repeated runs over the same tree are deterministic.
/// Directories whose name starts with a dot are pruned before descent.
///
/// Files that fail to parse are logged and skipped, never aborting the
/// crawl: ill-formed XML is worth a warning, while files that merely
/// aren't result files ([`ParseError::UnrecognizedRoot`] and
/// [`ParseError::InvalidAttribute`]) are expected noise and only logged
/// at the debug level.
#[must_use]
pub fn collect_reports(
    build_base: &Path,
    schema: Schema,
    collect_details: bool,
) -> Vec<Report> {
    let mut reports = Vec::new();

    let walker = WalkDir::new(build_base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden_dir(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("cannot access an entry under '{}': {e}", build_base.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("xml") {
            continue;
        }

        match parse_report(path, schema, collect_details) {
            Ok(report) => reports.push(report),
            Err(e @ ParseError::Malformed { .. }) => {
                warn!("skipping '{}': {e}", path.display());
            }
            Err(
                e @ (ParseError::UnrecognizedRoot { .. }
                | ParseError::InvalidAttribute { .. }),
            ) => {
                debug!("skipping '{}': {e}", path.display());
            }
            Err(e) => {
                error!("skipping '{}': {e} ({e:?})", path.display());
            }
        }
    }

    reports
}

/// Indicates whether the given entry is a directory that shouldn't be
/// descended into.
fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}
