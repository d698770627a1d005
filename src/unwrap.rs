use std::fmt;
use std::ops::Range;

use crate::docx::{body_tables, is_wml};
use crate::error::Error;
use crate::wrapper::{WrapperContent, classify, sole_cell};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NoParent,
    NoSingleCell,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoParent => f.write_str("no parent element"),
            SkipReason::NoSingleCell => f.write_str("no single cell"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableOutcome {
    Unwrapped(WrapperContent),
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub wrappers_found: usize,
    pub unwrapped: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PassReport {
    fn record(&mut self, outcome: &TableOutcome) {
        match outcome {
            TableOutcome::Unwrapped(_) => self.unwrapped += 1,
            TableOutcome::Skipped(_) => self.skipped += 1,
            TableOutcome::Failed(_) => self.failed += 1,
        }
    }
}

pub struct Pass {
    /// The rewritten document text, or `None` when nothing was unwrapped.
    pub xml: Option<String>,
    pub report: PassReport,
}

struct Splice {
    range: Range<usize>,
    replacement: String,
}

/// Run one scan-and-splice pass over the tables directly under `w:body`.
///
/// All wrappers are classified against the parsed text before anything is
/// changed; the splices are then applied to produce the next text. The
/// parsed tree is never edited. A wrapper nested in another one reaches
/// body level once its parent is unwrapped, so it is handled next pass.
pub fn unwrap_pass(xml: &str) -> Result<Pass, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let wrappers: Vec<_> = body_tables(&doc)?
        .into_iter()
        .filter_map(|node| classify(node).map(|content| (node, content)))
        .collect();

    let mut report = PassReport {
        wrappers_found: wrappers.len(),
        ..PassReport::default()
    };
    let mut splices: Vec<Splice> = Vec::new();

    for (table, content) in wrappers {
        let pos = doc.text_pos_at(table.range().start);
        let outcome = match plan_splice(xml, table) {
            Ok(splice) => {
                splices.push(splice);
                log::debug!("unwrapped {content} wrapper at {pos}");
                TableOutcome::Unwrapped(content)
            }
            Err(Anomaly::Skip(reason)) => {
                log::debug!("skipped {content} wrapper at {pos}: {reason}");
                TableOutcome::Skipped(reason)
            }
            Err(Anomaly::Fail(msg)) => {
                log::warn!("could not unwrap {content} wrapper at {pos}: {msg}");
                TableOutcome::Failed(msg)
            }
        };
        report.record(&outcome);
    }

    let xml = (!splices.is_empty()).then(|| apply_splices(xml, &splices));
    Ok(Pass { xml, report })
}

/// Number of body-level tables in `xml` currently classified as wrappers.
pub fn count_wrappers(xml: &str) -> Result<usize, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    Ok(body_tables(&doc)?
        .into_iter()
        .filter(|n| classify(*n).is_some())
        .count())
}

enum Anomaly {
    Skip(SkipReason),
    Fail(String),
}

fn plan_splice(xml: &str, table: roxmltree::Node) -> Result<Splice, Anomaly> {
    let range = table.range();
    let parent = table
        .parent_element()
        .ok_or(Anomaly::Skip(SkipReason::NoParent))?;
    let cell = sole_cell(table).ok_or(Anomaly::Skip(SkipReason::NoSingleCell))?;

    // Copied content keeps only the namespace bindings in scope at the splice point.
    for ns in cell.namespaces() {
        if parent.lookup_namespace_uri(ns.name()) != Some(ns.uri()) {
            return Err(Anomaly::Fail(format!(
                "namespace {} is declared inside the wrapper",
                ns.uri()
            )));
        }
    }

    let mut replacement = String::new();
    for child in cell.children().filter(|n| n.is_element()) {
        if is_wml(child, "tcPr") {
            continue;
        }
        let text = xml
            .get(child.range())
            .ok_or_else(|| Anomaly::Fail("cell content range is out of bounds".into()))?;
        replacement.push_str(text);
    }

    if xml.get(range.clone()).is_none() {
        return Err(Anomaly::Fail("table range is out of bounds".into()));
    }
    Ok(Splice { range, replacement })
}

fn apply_splices(xml: &str, splices: &[Splice]) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut cursor = 0;
    for splice in splices {
        out.push_str(&xml[cursor..splice.range.start]);
        out.push_str(&splice.replacement);
        cursor = splice.range.end;
    }
    out.push_str(&xml[cursor..]);
    out
}
