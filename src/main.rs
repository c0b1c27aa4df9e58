// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::{io, process};

use tracing::error;
use tracing_subscriber::EnvFilter;

use testsum::{
    cli::Opts,
    collector::collect_reports,
    report::summarize,
    writer::{write_results, Styles},
};

fn main() {
    // Diagnostics go to stderr, so the report output on stdout stays
    // machine-consumable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parsed();

    let mut reports =
        collect_reports(&opts.build_base, opts.schema(), opts.verbose);
    reports.sort_by(|a, b| a.path.cmp(&b.path));
    let summary = summarize(&reports);

    let mut stdout = io::stdout().lock();
    if let Err(e) = write_results(
        &mut stdout,
        &Styles::new(),
        &reports,
        &summary,
        opts.render_options(),
    ) {
        error!("failed to write the summary: {e}");
        process::exit(1);
    }

    process::exit(i32::from(summary.has_problems()));
}
