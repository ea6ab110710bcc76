use std::path::{Path, PathBuf};

use clap::Parser;

use crate::data::coordinate::Coordinate;

#[derive(Parser)]
#[command(author, version, about = "Replay a location track and route it to home", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "CSV track with latitude,longitude[,accuracy] columns")]
    track: PathBuf,

    #[arg(short, long, help = "JSON configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Directions API key (overrides config and ORS_API_KEY)")]
    api_key: Option<String>,

    #[arg(long, help = "Directions provider base URL")]
    base_url: Option<String>,

    #[arg(long, help = "Where the home coordinate is persisted")]
    home_file: Option<PathBuf>,

    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true, help = "Select this home before the first fix")]
    select_home: Option<Coordinate>,

    #[arg(long, default_value_t = false, help = "Delete the saved home before replaying")]
    delete_home: bool,

    #[arg(long, default_value_t = false, help = "Deliver fixes back to back instead of at the update cadence")]
    no_pacing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,
}

impl Args {
    pub fn track(&self) -> &Path {
        &self.track
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn home_file(&self) -> Option<&Path> {
        self.home_file.as_deref()
    }

    pub fn select_home(&self) -> Option<Coordinate> {
        self.select_home
    }

    pub fn delete_home(&self) -> bool {
        self.delete_home
    }

    pub fn no_pacing(&self) -> bool {
        self.no_pacing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scripted_run() {
        let args = Args::try_parse_from([
            "homeward", "--track", "trip.csv", "--select-home", "9.93,-84.08", "--no-pacing",
        ])
        .unwrap();
        assert_eq!(args.track(), Path::new("trip.csv"));
        assert_eq!(args.select_home(), Coordinate::new(9.93, -84.08).ok());
        assert!(args.no_pacing());
        assert!(!args.delete_home());
        assert!(args.config().is_none());
    }

    #[test]
    fn accepts_southern_hemisphere_home() {
        let args = Args::try_parse_from([
            "homeward", "--track", "trip.csv", "--select-home", "-33.9,151.2",
        ])
        .unwrap();
        assert_eq!(args.select_home(), Coordinate::new(-33.9, 151.2).ok());

        let args = Args::try_parse_from(["homeward", "--track", "t.csv", "--select-home", "-33.9,-70.6"]).unwrap();
        assert_eq!(args.select_home(), Coordinate::new(-33.9, -70.6).ok());
    }

    #[test]
    fn rejects_invalid_home() {
        assert!(Args::try_parse_from(["homeward", "--track", "t.csv", "--select-home", "99,0"]).is_err());
    }
}
