use clap::{Parser, ValueEnum};
use fip_core::config::{Config, TaggerKind};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fipdl",
    version,
    about = "Show what FIP is playing right now and save the current song"
)]
pub struct Args {
    /// Directory to save the song in (default from config, ~/Music/FIP)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Download without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Only print the schedule
    #[arg(short, long)]
    pub list: bool,

    /// Tag writer to use
    #[arg(long, value_enum)]
    pub tagger: Option<TaggerArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggerArg {
    Eyed3,
    Builtin,
}

impl From<TaggerArg> for TaggerKind {
    fn from(arg: TaggerArg) -> Self {
        match arg {
            TaggerArg::Eyed3 => TaggerKind::Eyed3,
            TaggerArg::Builtin => TaggerKind::Builtin,
        }
    }
}

impl Args {
    /// Fold command-line overrides into the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.dir {
            config.paths.music_dir = dir.clone();
        }
        if let Some(tagger) = self.tagger {
            config.tools.tagger = tagger.into();
        }
    }
}
