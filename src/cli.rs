use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::engine::DiffConfig;
use crate::report::{DetailSelection, FocusRange};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// File A (base)
    pub file_a: PathBuf,

    /// File B (target)
    pub file_b: PathBuf,

    /// Semantic similarity threshold (0.0 to 1.0)
    #[arg(long, default_value_t = 0.55, value_name = "VALUE", allow_hyphen_values = true)]
    pub threshold: f32,

    /// Comma-separated sections to show in detail
    /// (new,deleted,changed,moved,unchanged,all)
    #[arg(long, default_value = "new,deleted", value_name = "SECTIONS")]
    pub details: String,

    /// Report on lines n,m of File A only (e.g. --focus 10,20)
    #[arg(long, value_name = "N,M")]
    pub focus: Option<String>,

    /// Enable diagnostic tracing to stderr
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug)]
pub struct Options {
    pub config: DiffConfig,
    pub details: DetailSelection,
    pub focus: Option<FocusRange>,
}

pub fn build_options(args: &Args) -> Result<Options> {
    let config = DiffConfig {
        similarity_threshold: args.threshold,
        debug: args.debug,
        ..DiffConfig::default()
    };
    config.validate()?;

    let details = DetailSelection::parse(&args.details)
        .with_context(|| format!("invalid --details value: {}", args.details))?;
    let focus = args
        .focus
        .as_deref()
        .map(FocusRange::parse)
        .transpose()
        .context("invalid --focus value")?;

    Ok(Options {
        config,
        details,
        focus,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DiffKind;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["semdiff", "a.txt", "b.txt"];
        argv.extend(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_match_the_engine_defaults() {
        let opts = build_options(&args(&[])).unwrap();
        assert_eq!(opts.config.similarity_threshold, 0.55);
        assert_eq!(opts.config.min_megablock_length, 3);
        assert!(!opts.config.debug);
        // default --details is new,deleted
        assert!(opts.details.shows(DiffKind::Added));
        assert!(opts.details.shows(DiffKind::Deleted));
        assert!(!opts.details.shows(DiffKind::Unchanged));
        assert!(opts.focus.is_none());
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        assert!(build_options(&args(&["--threshold", "1.2"])).is_err());
        assert!(build_options(&args(&["--threshold", "-0.5"])).is_err());
        assert!(build_options(&args(&["--threshold", "1.0"])).is_ok());
    }

    #[test]
    fn focus_flag_is_parsed_and_validated() {
        let opts = build_options(&args(&["--focus", "10,20"])).unwrap();
        assert_eq!(opts.focus, Some(FocusRange { start: 10, end: 20 }));
        assert!(build_options(&args(&["--focus", "20,10"])).is_err());
        assert!(build_options(&args(&["--focus", "nope"])).is_err());
    }

    #[test]
    fn bad_details_token_is_rejected() {
        assert!(build_options(&args(&["--details", "new,bogus"])).is_err());
    }

    #[test]
    fn debug_flag_reaches_the_config() {
        let opts = build_options(&args(&["--debug"])).unwrap();
        assert!(opts.config.debug);
    }
}
