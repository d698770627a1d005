use std::path::PathBuf;

use clap::Parser;
use clap::builder::RangedU64ValueParser;
use docx_unwrap::{DEFAULT_MAX_PASSES, Options};

#[derive(Parser, Debug)]
#[command(version, about = "Remove single-cell wrapper tables around figures and tables in DOCX files")]
struct Args {
    /// Files to process. When omitted, .docx files are searched for under
    /// the output directory and the current directory.
    paths: Vec<PathBuf>,

    /// Directory holding generated documents [default: $QUARTO_PROJECT_OUTPUT_DIR,
    /// then $OUTPUT_DIR, then "output"]
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum unwrap passes per document; each pass removes one nesting level
    #[arg(
        long,
        env = "DOCX_UNWRAP_MAX_PASSES",
        default_value_t = DEFAULT_MAX_PASSES,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    max_passes: usize,

    /// Report what would change without writing any file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<(), docx_unwrap::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let cwd = std::env::current_dir()?;

    let files = if args.paths.is_empty() {
        let output_dir = args.output_dir.unwrap_or_else(docx_unwrap::output_dir_from_env);
        log::info!("searching {} and {}", output_dir.display(), cwd.display());
        docx_unwrap::discover(&[output_dir.as_path(), cwd.as_path()])
    } else {
        docx_unwrap::select(args.paths)
    };

    let options = Options {
        max_passes: args.max_passes,
        dry_run: args.dry_run,
    };
    docx_unwrap::run(&files, &options, &cwd, &mut std::io::stdout().lock())?;
    Ok(())
}
