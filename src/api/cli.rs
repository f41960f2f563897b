use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Race analytics from Mario Kart 64 screen captures.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the template masks (default: <exe dir>/assets/masks).
    #[arg(long, global = true)]
    pub masks: Option<PathBuf>,
    /// JSON configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Frames per second of the source video.
    #[arg(long, global = true)]
    pub frame_rate: Option<f64>,
    /// Classify frames on a thread pool.
    #[arg(long, global = true, default_value_t = false)]
    pub parallel: bool,
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Logical-AND pixel values of two images.
    And {
        input1: PathBuf,
        input2: PathBuf,
        output: PathBuf,
    },
    /// Compute difference score for the given image and mask.
    Compare { image: PathBuf, mask: PathBuf },
    /// Shift the given image using the given x and y offsets.
    Translatexy {
        input: PathBuf,
        output: PathBuf,
        #[arg(allow_negative_numbers = true)]
        dx: i64,
        #[arg(allow_negative_numbers = true)]
        dy: i64,
    },
    /// Report the current game state for the given image.
    Ident { image: PathBuf },
    /// Emit race events for an entire video, one image per frame.
    Video {
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translatexy_negative_offsets() {
        let cli = Cli::try_parse_from(["kartvid", "translatexy", "in.png", "out.ppm", "-3", "7"])
            .unwrap();
        match cli.command {
            Command::Translatexy { dx, dy, .. } => assert_eq!((dx, dy), (-3, 7)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_video_requires_frames() {
        assert!(Cli::try_parse_from(["kartvid", "video"]).is_err());
        assert!(Cli::try_parse_from(["kartvid", "bogus"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "kartvid", "video", "a.png", "b.png", "--parallel", "-vv", "--frame-rate", "25",
        ])
        .unwrap();
        assert!(cli.parallel);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.frame_rate, Some(25.0));
    }
}
