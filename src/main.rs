use std::io::{self, Write};
use std::process;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;

use semdiff::cli::{build_options, Args};
use semdiff::engine::perform_diff;
use semdiff::input::read_file_text;
use semdiff::report::{render_focus, render_report};

fn main() -> Result<()> {
    // Usage problems exit 1; --help and --version keep clap's behavior.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            process::exit(1);
        }
    };

    let opts = match build_options(&args) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    };

    let run = || -> Result<()> {
        let content_a = read_file_text(&args.file_a)?;
        let content_b = read_file_text(&args.file_b)?;

        if opts.config.debug {
            eprintln!(
                "File A ('{}') has {} lines.",
                args.file_a.display(),
                content_a.matches('\n').count() + 1
            );
            eprintln!(
                "File B ('{}') has {} lines.",
                args.file_b.display(),
                content_b.matches('\n').count() + 1
            );
            eprintln!(
                "Using similarity threshold: {:.2}",
                opts.config.similarity_threshold
            );
        }

        let entries = perform_diff(&content_a, &content_b, &opts.config);

        let stdout = io::stdout();
        let mut out = stdout.lock();
        match opts.focus {
            Some(focus) => render_focus(&content_a, &entries, focus, &mut out)?,
            None => render_report(&entries, &opts.details, &mut out)?,
        }
        out.flush()?;
        Ok(())
    };

    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
    Ok(())
}
