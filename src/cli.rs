use std::path::PathBuf;

use clap::Parser;

/// Computes the walking and public transit travel time between every pair of
/// grid cells and stores it as a `.npy` matrix
#[derive(Debug, Clone, Parser)]
#[command(name = "transgrid", version)]
pub struct Args {
    /// Station list (JSON)
    #[arg(long, default_value = "stops-bg.json")]
    pub stations: PathBuf,

    /// Route list (JSON)
    #[arg(long, default_value = "routes.txt")]
    pub routes: PathBuf,

    /// Grid configuration (TOML); built-in defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Cells along the west-east axis, overrides the configuration
    #[arg(long)]
    pub width: Option<usize>,

    /// Cells along the south-north axis, overrides the configuration
    #[arg(long)]
    pub height: Option<usize>,

    /// Worker threads, defaults to all cores
    #[arg(long)]
    pub threads: Option<usize>,

    /// Matrix output path
    #[arg(short, long, default_value = "distance_matrix.npy")]
    pub output: PathBuf,

    /// Skip writing the `<output>.meta.json` grid description
    #[arg(long)]
    pub no_meta: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scraper_file_names() {
        let args = Args::parse_from(["transgrid"]);
        assert_eq!(args.stations, PathBuf::from("stops-bg.json"));
        assert_eq!(args.routes, PathBuf::from("routes.txt"));
        assert_eq!(args.output, PathBuf::from("distance_matrix.npy"));
        assert!(args.width.is_none());
        assert!(!args.no_meta);
    }

    #[test]
    fn parses_overrides() {
        let args = Args::parse_from([
            "transgrid",
            "--width",
            "40",
            "--height",
            "30",
            "--threads",
            "2",
            "-o",
            "out/m.npy",
            "--no-meta",
        ]);
        assert_eq!(args.width, Some(40));
        assert_eq!(args.height, Some(30));
        assert_eq!(args.threads, Some(2));
        assert_eq!(args.output, PathBuf::from("out/m.npy"));
        assert!(args.no_meta);
    }

    #[test]
    fn command_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
