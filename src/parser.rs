// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsing of a single [xUnit XML report][1] into a [`Report`].
//!
//! The parser is streaming: the whole document is consumed on every
//! parse, so ill-formed markup is rejected even when only the counts on
//! the root tag are needed.
//!
//! [1]: https://llg.cubic.org/docs/junit

use std::{fs, io, path::Path};

use derive_more::{Display, Error};
use itertools::Itertools as _;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::report::Report;

/// Possible failures of [`parse_report()`].
///
/// The [`Collector`] decides how loudly a skipped file is reported based
/// on the variant, so parsing never aborts a whole run.
///
/// [`Collector`]: crate::collector
#[derive(Debug, Display, Error)]
pub enum ParseError {
    /// The file is not well-formed XML at all.
    #[display("malformed XML document: {cause}")]
    Malformed {
        /// Description of what broke, taken from the XML reader.
        cause: String,
    },

    /// Well-formed XML, but not an xUnit report.
    ///
    /// This is the expected outcome for XML files that happen to live
    /// under the crawled tree without being result files.
    #[display("the root tag '{tag}' is neither 'testsuite' nor 'testsuites'")]
    UnrecognizedRoot {
        /// The actual root tag.
        tag: String,
    },

    /// A counting attribute is missing, non-numeric or negative.
    #[display("the '{attribute}' attribute {reason}")]
    InvalidAttribute {
        /// Name of the offending attribute.
        attribute: &'static str,

        /// Why the attribute was rejected.
        reason: &'static str,
    },

    /// Reading the file failed underneath the parser.
    #[display("failed to read the file: {source}")]
    Io {
        /// The underlying I/O failure.
        source: io::Error,
    },
}

/// Required-ness of the counting attributes on the root tag.
///
/// Result files produced by some frameworks omit `tests` or `failures`
/// entirely, so the schema is a configuration choice rather than a
/// hardcoded rule. The CLI defaults to [`Schema::Strict`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Schema {
    /// `tests` and `failures` must be present on the root tag.
    #[default]
    Strict,

    /// Every counting attribute defaults to `0` when absent.
    Lenient,
}

/// Parses the file at the given `path` as an xUnit result file.
///
/// Counts are read from the root tag: `tests`, `errors`, `failures` and
/// the skip count, which may be spelled `skip` or `skipped` (both are
/// summed when both are present). Presence requirements follow the given
/// [`Schema`].
///
/// With `collect_details`, every `testcase` found underneath is
/// inspected and the ones carrying `error` or `failure` children are
/// rendered into the returned [`Report`]'s detail blocks, in document
/// order.
///
/// # Errors
///
/// See [`ParseError`] for the failure taxonomy.
pub fn parse_report(
    path: &Path,
    schema: Schema,
    collect_details: bool,
) -> Result<Report, ParseError> {
    let text =
        fs::read_to_string(path).map_err(|source| ParseError::Io { source })?;

    let mut report = Report::new(path.display().to_string());
    if collect_details {
        report.details = Some(Vec::new());
    }

    let mut reader = Reader::from_str(&text);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    // Locate the root element. Only the XML declaration, comments and
    // processing instructions may precede it.
    let root = loop {
        match reader.read_event_into(&mut buf).map_err(malformed)? {
            Event::Start(e) => {
                let tag = check_root_tag(&e)?;
                read_counts(&e, schema, &mut report)?;
                break Some(tag);
            }
            Event::Empty(e) => {
                check_root_tag(&e)?;
                read_counts(&e, schema, &mut report)?;
                break None;
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => {
                return Err(malformed("the document has no root element"));
            }
            _ => return Err(malformed("content before the root element")),
        }
        buf.clear();
    };
    buf.clear();

    let mut body = Body::new(root, report.details.as_mut());
    loop {
        match reader.read_event_into(&mut buf).map_err(malformed)? {
            Event::Start(e) => body.open(&e, false)?,
            Event::Empty(e) => body.open(&e, true)?,
            Event::End(_) => body.close(),
            Event::Text(e) => {
                if body.closed() {
                    return Err(malformed("content after the document element"));
                }
                if let Some(capture) = body.capture.as_mut() {
                    capture.text.push_str(&e.xml_content().map_err(malformed)?);
                }
            }
            Event::CData(e) => {
                if body.closed() {
                    return Err(malformed("content after the document element"));
                }
                if let Some(capture) = body.capture.as_mut() {
                    capture
                        .text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    if !body.closed() {
        return Err(malformed("unexpected end of document"));
    }

    Ok(report)
}

/// Wraps any underlying XML reader failure into a
/// [`ParseError::Malformed`].
fn malformed(cause: impl ToString) -> ParseError {
    ParseError::Malformed { cause: cause.to_string() }
}

/// Checks that the root tag marks a single suite or a collection of
/// suites, returning its name.
fn check_root_tag(e: &BytesStart<'_>) -> Result<String, ParseError> {
    match e.name().as_ref() {
        tag @ (b"testsuite" | b"testsuites") => {
            Ok(String::from_utf8_lossy(tag).into_owned())
        }
        tag => Err(ParseError::UnrecognizedRoot {
            tag: String::from_utf8_lossy(tag).into_owned(),
        }),
    }
}

/// Extracts the four counts from the root tag's attributes into the
/// given [`Report`].
fn read_counts(
    e: &BytesStart<'_>,
    schema: Schema,
    report: &mut Report,
) -> Result<(), ParseError> {
    let required = schema == Schema::Strict;
    report.test_count = count_attr(e, "tests", required)?;
    report.error_count = count_attr(e, "errors", false)?;
    report.failure_count = count_attr(e, "failures", required)?;
    report.skipped_count =
        count_attr(e, "skip", false)? + count_attr(e, "skipped", false)?;
    Ok(())
}

/// Reads a single counting attribute, validating it parses as a
/// non-negative integer.
fn count_attr(
    e: &BytesStart<'_>,
    attribute: &'static str,
    required: bool,
) -> Result<usize, ParseError> {
    let Some(value) = attr_value(e, attribute.as_bytes())? else {
        return if required {
            Err(ParseError::InvalidAttribute { attribute, reason: "is required" })
        } else {
            Ok(0)
        };
    };
    let value: i64 = value.trim().parse().map_err(|_| {
        ParseError::InvalidAttribute { attribute, reason: "should be an integer" }
    })?;
    usize::try_from(value).map_err(|_| ParseError::InvalidAttribute {
        attribute,
        reason: "should be a positive integer",
    })
}

/// Looks up a single attribute by name, unescaping its value.
fn attr_value(
    e: &BytesStart<'_>,
    name: &[u8],
) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.as_ref() == name {
            let value = attr.unescape_value().map_err(malformed)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Which `testcase` child's text body is being captured.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OutputKind {
    /// A `system-out` element.
    Stdout,

    /// A `system-err` element.
    Stderr,
}

/// Text capture for an open `system-out`/`system-err` element.
#[derive(Debug)]
struct Capture {
    kind: OutputKind,
    text: String,

    /// Stack depth the captured element was opened at, so nested markup
    /// doesn't terminate the capture early.
    depth: usize,
}

/// State of the descent through the document body.
///
/// Tracks open elements to pick up `testcase` children of `testsuite`s
/// (nested arbitrarily deep under a `testsuites` root) in document
/// order, and to reject trailing junk after the document element.
struct Body<'d> {
    /// Names of the currently open elements, root included.
    stack: Vec<String>,

    /// The `testcase` currently being assembled, with the stack depth
    /// its element was opened at.
    testcase: Option<(Testcase, usize)>,

    /// Active `system-out`/`system-err` text capture, if any.
    capture: Option<Capture>,

    /// Detail sink of the parsed [`Report`], absent when details
    /// weren't requested.
    details: Option<&'d mut Vec<String>>,
}

impl<'d> Body<'d> {
    /// Creates a walker for a document whose root element is `root`
    /// (or was already self-closed, when [`None`]).
    fn new(root: Option<String>, details: Option<&'d mut Vec<String>>) -> Self {
        Self {
            stack: root.into_iter().collect(),
            testcase: None,
            capture: None,
            details,
        }
    }

    /// Indicates whether the document element has been fully closed.
    fn closed(&self) -> bool {
        self.stack.is_empty()
    }

    /// Handles an opening (or self-closing, with `empty`) tag.
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), ParseError> {
        let Some(parent) = self.stack.last() else {
            return Err(malformed("content after the document element"));
        };
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        if self.details.is_some() {
            match name.as_str() {
                "testcase" if parent == "testsuite" && self.testcase.is_none() => {
                    let testcase = Testcase::from_attributes(e)?;
                    if empty {
                        self.push_detail(testcase);
                    } else {
                        self.testcase = Some((testcase, self.stack.len() + 1));
                    }
                }
                "error" | "failure" if self.in_testcase() => {
                    let message = attr_value(e, b"message")?.unwrap_or_default();
                    if let Some((testcase, _)) = self.testcase.as_mut() {
                        if name == "error" {
                            testcase.error_messages.push(message);
                        } else {
                            testcase.failure_messages.push(message);
                        }
                    }
                }
                "system-out" | "system-err" if self.in_testcase() => {
                    let kind = if name == "system-out" {
                        OutputKind::Stdout
                    } else {
                        OutputKind::Stderr
                    };
                    if empty {
                        self.push_output(kind, String::new());
                    } else {
                        self.capture = Some(Capture {
                            kind,
                            text: String::new(),
                            depth: self.stack.len() + 1,
                        });
                    }
                }
                _ => {}
            }
        }

        if !empty {
            self.stack.push(name);
        }
        Ok(())
    }

    /// Handles a closing tag. Name/nesting mismatches are already
    /// rejected by the reader itself.
    fn close(&mut self) {
        let _ = self.stack.pop();

        if let Some(capture) = self.capture.take() {
            if self.stack.len() < capture.depth {
                self.push_output(capture.kind, capture.text);
            } else {
                self.capture = Some(capture);
            }
        }

        if let Some((testcase, depth)) = self.testcase.take() {
            if self.stack.len() < depth {
                self.push_detail(testcase);
            } else {
                self.testcase = Some((testcase, depth));
            }
        }
    }

    /// Indicates whether the next opened element is an immediate child
    /// of the `testcase` being assembled.
    fn in_testcase(&self) -> bool {
        self.testcase
            .as_ref()
            .is_some_and(|(_, depth)| self.stack.len() == *depth)
    }

    /// Records a finished output capture on the current `testcase`.
    fn push_output(&mut self, kind: OutputKind, text: String) {
        if let Some((testcase, _)) = self.testcase.as_mut() {
            match kind {
                OutputKind::Stdout => testcase.system_outs.push(text),
                OutputKind::Stderr => testcase.system_errs.push(text),
            }
        }
    }

    /// Renders a finished `testcase` into a detail block, unless it has
    /// nothing to report.
    fn push_detail(&mut self, testcase: Testcase) {
        if let Some(details) = self.details.as_mut() {
            if testcase.has_problems() {
                details.push(testcase.render());
            }
        }
    }
}

/// Information from a single `testcase` tag.
#[derive(Debug, Default)]
struct Testcase {
    classname: Option<String>,
    file: Option<String>,
    line: Option<String>,
    name: Option<String>,

    /// Execution time in seconds, validated at parse time but not part
    /// of the rendered block.
    #[allow(dead_code)]
    time: Option<f64>,
    error_messages: Vec<String>,
    failure_messages: Vec<String>,
    system_outs: Vec<String>,
    system_errs: Vec<String>,
}

impl Testcase {
    /// Builds a [`Testcase`] from the attributes of its tag.
    fn from_attributes(e: &BytesStart<'_>) -> Result<Self, ParseError> {
        let mut testcase = Self::default();
        for attr in e.attributes() {
            let attr = attr.map_err(malformed)?;
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            match attr.key.as_ref() {
                b"classname" => testcase.classname = Some(value),
                b"file" => testcase.file = Some(value),
                b"line" => testcase.line = Some(value),
                b"name" => testcase.name = Some(value),
                b"time" => {
                    let time = value.trim().parse().map_err(|_| {
                        ParseError::InvalidAttribute {
                            attribute: "time",
                            reason: "should be a floating point number",
                        }
                    })?;
                    testcase.time = Some(time);
                }
                _ => {}
            }
        }
        Ok(testcase)
    }

    /// Indicates whether this [`Testcase`] carries any error or failure
    /// content worth a detail block.
    fn has_problems(&self) -> bool {
        !self.error_messages.is_empty() || !self.failure_messages.is_empty()
    }

    /// Renders this [`Testcase`] into an opaque multi-line detail
    /// block: a label line, followed by a bracketed section per
    /// non-empty message category.
    fn render(&self) -> String {
        let location = self.file.as_ref().map(|file| match &self.line {
            Some(line) => format!("({file}:{line})"),
            None => format!("({file})"),
        });
        let label = [
            self.classname.as_deref(),
            self.name.as_deref(),
            location.as_deref(),
        ]
        .into_iter()
        .flatten()
        .join(" ");

        let mut lines = vec![label];
        for (label, messages) in [
            ("error message", &self.error_messages),
            ("failure message", &self.failure_messages),
            ("stdout output", &self.system_outs),
            ("stderr output", &self.system_errs),
        ] {
            if messages.is_empty() {
                continue;
            }
            lines.push(format!("<<< {label}"));
            for message in messages {
                let trimmed = message.trim_matches(|c| c == '\n' || c == '\r');
                for line in trimmed.lines() {
                    lines.push(format!("  {line}"));
                }
            }
            lines.push(">>>".to_owned());
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write as _};

    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        File::create(&path)
            .and_then(|mut f| f.write_all(content.as_bytes()))
            .expect("failed to write a fixture file");
        path
    }

    fn parse(content: &str, schema: Schema, details: bool) -> Result<Report, ParseError> {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "result.xml", content);
        parse_report(&path, schema, details)
    }

    #[test]
    fn extracts_declared_counts() {
        let report = parse(
            r#"<testsuite tests="7" errors="2" failures="1" skipped="3"/>"#,
            Schema::Strict,
            false,
        )
        .unwrap();

        assert_eq!(report.test_count, 7);
        assert_eq!(report.error_count, 2);
        assert_eq!(report.failure_count, 1);
        assert_eq!(report.skipped_count, 3);
        assert_eq!(report.details, None);
    }

    #[test]
    fn accepts_suite_collection_root() {
        let report = parse(
            r#"<testsuites tests="4" failures="0">
                 <testsuite tests="4" failures="0"/>
               </testsuites>"#,
            Schema::Strict,
            false,
        )
        .unwrap();

        assert_eq!(report.test_count, 4);
    }

    #[test]
    fn sums_both_skip_spellings() {
        let report = parse(
            r#"<testsuite tests="5" failures="0" skip="1" skipped="2"/>"#,
            Schema::Strict,
            false,
        )
        .unwrap();

        assert_eq!(report.skipped_count, 3);
    }

    #[test]
    fn optional_counts_default_to_zero() {
        let report = parse(
            r#"<testsuite tests="2" failures="0"/>"#,
            Schema::Strict,
            false,
        )
        .unwrap();

        assert_eq!(report.error_count, 0);
        assert_eq!(report.skipped_count, 0);
    }

    #[test]
    fn strict_schema_requires_tests_and_failures() {
        let err = parse(r#"<testsuite failures="0"/>"#, Schema::Strict, false)
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidAttribute { attribute: "tests", .. },
        ));

        let err = parse(r#"<testsuite tests="3"/>"#, Schema::Strict, false)
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidAttribute { attribute: "failures", .. },
        ));
    }

    #[test]
    fn lenient_schema_defaults_everything() {
        let report = parse("<testsuite/>", Schema::Lenient, false).unwrap();
        assert_eq!(report.test_count, 0);
        assert_eq!(report.failure_count, 0);
    }

    #[test]
    fn rejects_non_integer_attribute() {
        let err = parse(
            r#"<testsuite tests="many" failures="0"/>"#,
            Schema::Strict,
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidAttribute {
                attribute: "tests",
                reason: "should be an integer",
            },
        ));
    }

    #[test]
    fn rejects_negative_attribute() {
        let err = parse(
            r#"<testsuite tests="3" errors="-1" failures="0"/>"#,
            Schema::Strict,
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidAttribute {
                attribute: "errors",
                reason: "should be a positive integer",
            },
        ));
    }

    #[test]
    fn rejects_unknown_root_tag() {
        let err = parse("<foo/>", Schema::Strict, false).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedRoot { tag } if tag == "foo"));
    }

    #[test]
    fn rejects_plain_text() {
        let err = parse("just some notes\n", Schema::Strict, false).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn rejects_truncated_document() {
        let err = parse(r#"<testsuite tests="1" failures="0">"#, Schema::Strict, false)
            .unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = parse_report(&dir.path().join("gone.xml"), Schema::Strict, false)
            .unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn collects_failure_details_in_document_order() {
        let report = parse(
            r#"<testsuite tests="3" failures="2">
                 <testcase classname="suite.A" name="first" file="a.py" line="10">
                   <failure message="boom"/>
                 </testcase>
                 <testcase classname="suite.A" name="passing"/>
                 <testcase classname="suite.B" name="second">
                   <failure message="bang"/>
                 </testcase>
               </testsuite>"#,
            Schema::Strict,
            true,
        )
        .unwrap();

        let details = report.details.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(
            details[0],
            "suite.A first (a.py:10)\n<<< failure message\n  boom\n>>>",
        );
        assert_eq!(
            details[1],
            "suite.B second\n<<< failure message\n  bang\n>>>",
        );
    }

    #[test]
    fn detail_collection_descends_into_nested_suites() {
        let report = parse(
            r#"<testsuites tests="2" failures="1">
                 <testsuite name="inner" tests="2" failures="1">
                   <testcase name="t">
                     <error message="broken"/>
                     <system-out>captured text</system-out>
                   </testcase>
                 </testsuite>
               </testsuites>"#,
            Schema::Strict,
            true,
        )
        .unwrap();

        let details = report.details.unwrap();
        assert_eq!(
            details,
            ["t\n<<< error message\n  broken\n>>>\n<<< stdout output\n  captured text\n>>>"],
        );
    }

    #[test]
    fn message_attribute_defaults_to_empty() {
        let report = parse(
            r#"<testsuite tests="1" failures="1">
                 <testcase name="t"><failure/></testcase>
               </testsuite>"#,
            Schema::Strict,
            true,
        )
        .unwrap();

        assert_eq!(report.details.unwrap(), ["t\n<<< failure message\n>>>"]);
    }

    #[test]
    fn passing_testcases_yield_no_detail_blocks() {
        let report = parse(
            r#"<testsuite tests="2" failures="0">
                 <testcase name="a"/>
                 <testcase name="b"><system-out>noise</system-out></testcase>
               </testsuite>"#,
            Schema::Strict,
            true,
        )
        .unwrap();

        assert_eq!(report.details, Some(vec![]));
    }

    #[test]
    fn rejects_unparseable_testcase_time() {
        let err = parse(
            r#"<testsuite tests="1" failures="0">
                 <testcase name="t" time="fast"/>
               </testsuite>"#,
            Schema::Strict,
            true,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidAttribute { attribute: "time", .. },
        ));
    }

    #[test]
    fn multiline_messages_are_indented() {
        let report = parse(
            "<testsuite tests=\"1\" failures=\"1\">\
               <testcase name=\"t\">\
                 <failure message=\"first line&#10;second line\"/>\
               </testcase>\
             </testsuite>",
            Schema::Strict,
            true,
        )
        .unwrap();

        assert_eq!(
            report.details.unwrap(),
            ["t\n<<< failure message\n  first line\n  second line\n>>>"],
        );
    }
}
