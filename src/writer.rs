// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rendering of collected [`Report`]s and their aggregate.

use std::{borrow::Cow, io};

use console::Style;

use crate::report::Report;

/// Options controlling which [`Report`]s are rendered and how.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Render every [`Report`], not only the ones with problems.
    pub show_all: bool,

    /// Render the detail blocks collected for errors and failures.
    pub show_details: bool,

    /// Render only the paths of the parsed result files.
    pub paths_only: bool,
}

/// [`Style`]s for terminal output.
///
/// Styling is purely cosmetic: it never changes the rendered text, and
/// is disabled entirely when stdout isn't a terminal.
#[derive(Debug)]
pub struct Styles {
    /// [`Style`] for rendering [`Report`]s with errors or failures.
    pub err: Style,

    /// [`Style`] for rendering the aggregate line.
    pub bold: Style,

    /// Indicates whether the terminal was detected.
    pub is_present: bool,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            err: Style::new().red(),
            bold: Style::new().bold(),
            is_present: console::user_attended() && console::colors_enabled(),
        }
    }
}

impl Styles {
    /// Creates new [`Styles`], detecting the terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new [`Styles`] that never color anything, for piped
    /// output and tests.
    #[must_use]
    pub fn plain() -> Self {
        Self { is_present: false, ..Self::default() }
    }

    /// If terminal is present colors `input` with [`Styles::err`] color
    /// or leaves "as is" otherwise.
    #[must_use]
    pub fn err<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        if self.is_present {
            self.err.apply_to(input.into()).to_string().into()
        } else {
            input.into()
        }
    }

    /// If terminal is present makes `input` __bold__ or leaves "as is"
    /// otherwise.
    #[must_use]
    pub fn bold<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        if self.is_present {
            self.bold.apply_to(input.into()).to_string().into()
        } else {
            input.into()
        }
    }
}

/// Writes the collected `reports` and their `summary` to the given
/// `out`.
///
/// Only notable reports (errors or failures, or everything with
/// [`RenderOptions::show_all`]) get their own line; the summary is
/// always written, separated by a blank line whenever at least one
/// report line was written before it. With
/// [`RenderOptions::show_details`], each report line is followed by its
/// detail blocks, the first line of every block marked with a `-` and
/// the remaining lines indented.
///
/// In [`RenderOptions::paths_only`] mode, only the paths of the parsed
/// result files are written, one per line.
///
/// # Errors
///
/// If writing to `out` fails.
pub fn write_results(
    out: &mut impl io::Write,
    styles: &Styles,
    reports: &[Report],
    summary: &Report,
    options: RenderOptions,
) -> io::Result<()> {
    if options.paths_only {
        for report in reports {
            writeln!(out, "{}", report.path)?;
        }
        return Ok(());
    }

    let mut printed_any = false;
    for report in reports {
        if !options.show_all && !report.has_problems() {
            continue;
        }

        let line = report.to_string();
        if report.has_problems() {
            writeln!(out, "{}", styles.err(line))?;
        } else {
            writeln!(out, "{line}")?;
        }
        printed_any = true;

        if options.show_details {
            for block in report.details.iter().flatten() {
                write_detail_block(out, block)?;
            }
        }
    }

    if printed_any {
        writeln!(out)?;
    }
    writeln!(out, "{}", styles.bold(summary.to_string()))
}

/// Writes one detail block: `- ` marks it as a new entry on its first
/// line, the rest is indented to align underneath.
fn write_detail_block(out: &mut impl io::Write, block: &str) -> io::Result<()> {
    for (i, line) in block.lines().enumerate() {
        if i == 0 {
            writeln!(out, "- {line}")?;
        } else {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(())
}
