//! emoji-smash: tap groups of matching emoji against the clock, in the terminal.

mod app;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use emoji_smash::pipeline::PhaseTiming;
use emoji_smash::round::RoundConfig;
use emoji_smash::session::{FileStore, MemoryStore, RecordStore, Session, config_dir};
use log::LevelFilter;
use std::path::PathBuf;

/// Frontend options that are not part of a round's rules.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub round: RoundConfig,
    pub seed: Option<u64>,
    pub no_animation: bool,
    pub frame_rate: f64,
    pub start_screen: bool,
}

impl GameConfig {
    fn from_args(args: &Args) -> Self {
        let timing = if args.no_animation {
            PhaseTiming::INSTANT
        } else {
            PhaseTiming::default()
        };
        Self {
            round: RoundConfig {
                round_secs: args.round_secs.max(1),
                timing,
                variant: args.variant.into(),
                ..RoundConfig::default()
            },
            seed: args.seed,
            no_animation: args.no_animation,
            frame_rate: args.frame_rate.clamp(1.0, 240.0),
            start_screen: !args.no_menu,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| config_dir().join("emoji-smash.log"));
    logging::init(&log_file, args.log_level)?;
    log::info!("emoji-smash {} starting", env!("CARGO_PKG_VERSION"));

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using defaults: {}", e);
        theme::Theme::default()
    });
    let store: Box<dyn RecordStore> = if args.no_persist {
        Box::new(MemoryStore::default())
    } else {
        Box::new(FileStore::in_config_dir())
    };
    let session = Session::open(store);
    let config = GameConfig::from_args(&args);

    let mut app = App::new(config, theme, session);
    app.run()?;
    Ok(())
}

/// Emoji tile-matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "emoji-smash",
    version,
    about = "Tap groups of two or more matching emoji before the clock runs out.",
    long_about = "emoji-smash is a terminal tile-matching game on a 6x8 board.\n\n\
        Tap a group of two or more connected, identical emoji to smash it. Tiles above fall \
        down and new ones drop in. Keep smashing groups to build a combo; a combo of 4 or more \
        earns a power item (bomb, lightning or rainbow).\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Enter / Space  Tap    Mouse  Tap clicked cell\n  \
        1-9            Use item       P              Pause  Q / Esc Quit menu\n  \
        R              Restart (results screen)"
)]
pub struct Args {
    /// Icon set: a (5 emoji) or b (6 emoji, harder).
    #[arg(short, long, default_value = "a")]
    pub variant: VariantArg,

    /// Round length in seconds.
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub round_secs: u32,

    /// Seed for the random source (same seed, same boards).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Disable destroy/fall animation (cycles complete on the next frame).
    #[arg(long)]
    pub no_animation: bool,

    /// Skip the start screen and start a round immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Keep the all-time combo record in memory only.
    #[arg(long)]
    pub no_persist: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Log file. Defaults to emoji-smash.log in the config directory.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum VariantArg {
    #[default]
    A,
    B,
}

impl From<VariantArg> for emoji_smash::grid::Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::A => Self::A,
            VariantArg::B => Self::B,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emoji_smash::grid::Variant;

    #[test]
    fn defaults_match_a_standard_round() {
        let args = Args::parse_from(["emoji-smash"]);
        let config = GameConfig::from_args(&args);
        assert_eq!(config.round, RoundConfig::default());
        assert!(config.start_screen);
        assert_eq!(args.log_level, LevelFilter::Info);
    }

    #[test]
    fn flags_reach_the_round_config() {
        let args = Args::parse_from([
            "emoji-smash",
            "--variant",
            "b",
            "--round-secs",
            "60",
            "--no-animation",
            "--seed",
            "7",
            "--palette",
            "colourblind",
            "--log-level",
            "off",
        ]);
        let config = GameConfig::from_args(&args);
        assert_eq!(config.round.variant, Variant::B);
        assert_eq!(config.round.round_secs, 60);
        assert_eq!(config.round.timing, PhaseTiming::INSTANT);
        assert_eq!(config.seed, Some(7));
        assert_eq!(args.palette, Palette::Colorblind);
        assert_eq!(args.log_level, LevelFilter::Off);
    }
}
