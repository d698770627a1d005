mod discover;
mod docx;
mod error;
mod unwrap;
mod wrapper;

pub use discover::{
    DEFAULT_OUTPUT_DIR, OUTPUT_DIR_ENV, QUARTO_OUTPUT_DIR_ENV, discover, is_excluded,
    output_dir_from_env, select,
};
pub use docx::Package;
pub use error::Error;
pub use unwrap::{Pass, PassReport, SkipReason, TableOutcome, count_wrappers, unwrap_pass};
pub use wrapper::{WrapperContent, classify};

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const DEFAULT_MAX_PASSES: usize = 5;

#[derive(Clone, Debug)]
pub struct Options {
    /// Upper bound on scan-and-splice passes per document. Each pass
    /// removes one layer of nested wrappers.
    pub max_passes: usize,
    /// Report what would change without writing anything.
    pub dry_run: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            dry_run: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnwrapReport {
    pub passes: usize,
    pub unwrapped: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Wrappers still present after the pass cap was reached.
    pub remaining: usize,
}

pub struct Unwrapped {
    /// The final document text, or `None` when no pass changed anything.
    pub xml: Option<String>,
    pub report: UnwrapReport,
}

/// Run passes over `xml` until one finds nothing to unwrap or `max_passes`
/// is reached.
pub fn unwrap_xml(xml: &str, max_passes: usize) -> Result<Unwrapped, Error> {
    let mut current: Option<String> = None;
    let mut report = UnwrapReport::default();
    let mut settled = false;

    for pass_no in 1..=max_passes {
        let text = current.as_deref().unwrap_or(xml);
        let pass = unwrap_pass(text)?;
        report.passes = pass_no;
        report.unwrapped += pass.report.unwrapped;
        report.skipped += pass.report.skipped;
        report.failed += pass.report.failed;

        match pass.xml {
            Some(next) => current = Some(next),
            None => {
                settled = true;
                break;
            }
        }
    }

    if !settled {
        report.remaining = count_wrappers(current.as_deref().unwrap_or(xml))?;
    }

    Ok(Unwrapped {
        xml: current,
        report,
    })
}

#[derive(Debug)]
pub enum FileOutcome {
    Modified(UnwrapReport),
    Unmodified(UnwrapReport),
    Failed(Error),
}

/// Unwrap every wrapper table in the DOCX at `path` and save it in place.
/// The file is only rewritten when at least one table was unwrapped.
pub fn unwrap_file(path: &Path, options: &Options) -> FileOutcome {
    match try_unwrap_file(path, options) {
        Ok((true, report)) => FileOutcome::Modified(report),
        Ok((false, report)) => FileOutcome::Unmodified(report),
        Err(e) => {
            log::warn!("{}: {e}", path.display());
            FileOutcome::Failed(e)
        }
    }
}

fn try_unwrap_file(path: &Path, options: &Options) -> Result<(bool, UnwrapReport), Error> {
    let t0 = Instant::now();

    let mut package = Package::open(path)?;
    let t_load = t0.elapsed();
    log::debug!("{}: main part is {}", path.display(), package.main_part());

    let Unwrapped { xml, report } = unwrap_xml(package.xml(), options.max_passes)?;
    let t_unwrap = t0.elapsed();

    if report.remaining > 0 {
        log::warn!(
            "{}: {} wrapper table(s) remain after {} passes",
            path.display(),
            report.remaining,
            report.passes
        );
    }

    let Some(xml) = xml else {
        return Ok((false, report));
    };
    if !options.dry_run {
        package.set_xml(xml);
        package.save(path)?;
    }
    let t_total = t0.elapsed();

    log::info!(
        "{}: {} unwrapped in {} pass(es). Timing: load={:.1}ms, unwrap={:.1}ms, save={:.1}ms, total={:.1}ms",
        path.display(),
        report.unwrapped,
        report.passes,
        t_load.as_secs_f64() * 1000.0,
        (t_unwrap - t_load).as_secs_f64() * 1000.0,
        (t_total - t_unwrap).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
    );

    Ok((true, report))
}

/// Process `files` in order, writing one progress line per file and a final
/// `modified/total` line to `out`. Paths are shown relative to `base` where
/// possible.
pub fn run(
    files: &[PathBuf],
    options: &Options,
    base: &Path,
    out: &mut impl Write,
) -> Result<RunSummary, Error> {
    let mut summary = RunSummary::default();
    if files.is_empty() {
        writeln!(out, "No .docx files to process")?;
        return Ok(summary);
    }
    writeln!(out, "Unwrapping wrapper tables in {} .docx file(s)", files.len())?;

    let verb = if options.dry_run { "would unwrap" } else { "unwrapped" };
    for path in files {
        let shown = path.strip_prefix(base).unwrap_or(path).display();
        let outcome = unwrap_file(path, options);
        match &outcome {
            FileOutcome::Modified(report) => writeln!(
                out,
                "  {shown}: {verb} {} table(s) in {} pass(es)",
                report.unwrapped, report.passes
            )?,
            FileOutcome::Unmodified(_) => writeln!(out, "  {shown}: unchanged")?,
            FileOutcome::Failed(e) => writeln!(out, "  {shown}: FAILED: {e}")?,
        }
        summary.record(&outcome);
    }

    writeln!(
        out,
        "Done: {}/{} file(s) modified, {} table(s) {verb}, {} failed",
        summary.modified, summary.total, summary.tables_unwrapped, summary.failed
    )?;
    Ok(summary)
}

/// Per-run tally of file outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub modified: usize,
    pub unmodified: usize,
    pub failed: usize,
    pub tables_unwrapped: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.total += 1;
        match outcome {
            FileOutcome::Modified(report) => {
                self.modified += 1;
                self.tables_unwrapped += report.unwrapped;
            }
            FileOutcome::Unmodified(_) => self.unmodified += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }
    }
}
