// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) of the `testsum` executable.

use std::path::PathBuf;

use crate::{parser::Schema, writer::RenderOptions};

pub use clap::Parser;

/// Root CLI of the `testsum` executable.
#[derive(clap::Parser, Clone, Debug)]
#[command(
    name = "testsum",
    about = "Summarize xUnit XML test results found under a build tree.",
    version
)]
pub struct Opts {
    /// The base path to recursively crawl for XML result files.
    #[arg(
        long,
        value_name = "PATH",
        default_value = "build",
        value_parser = existing_dir
    )]
    pub build_base: PathBuf,

    /// Show all result files, even those without errors or failures.
    #[arg(long)]
    pub all: bool,

    /// Show additional information for each error and failure.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Only print the paths of the parsed result files.
    #[arg(long)]
    pub result_files_only: bool,

    /// Accept result files missing the `tests` or `failures` attributes.
    #[arg(long)]
    pub lenient: bool,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require
    /// the trait being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Returns the result file [`Schema`] these [`Opts`] select.
    #[must_use]
    pub const fn schema(&self) -> Schema {
        if self.lenient {
            Schema::Lenient
        } else {
            Schema::Strict
        }
    }

    /// Returns the [`RenderOptions`] these [`Opts`] select.
    #[must_use]
    pub const fn render_options(&self) -> RenderOptions {
        RenderOptions {
            show_all: self.all,
            show_details: self.verbose,
            paths_only: self.result_files_only,
        }
    }
}

/// Validates that the given path exists and is a directory, before any
/// crawling starts.
fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(format!("path '{value}' does not exist"));
    }
    if !path.is_dir() {
        return Err(format!("path '{value}' is not a directory"));
    }
    Ok(path)
}
