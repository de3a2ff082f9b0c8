use clap::Parser;
use std::path::PathBuf;

use crate::entities::ColorModel;

/// Headless multi-view render scheduler driven by a synthetic producer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Number of views composited side by side
    #[arg(short = 'n', long = "views", value_name = "N", default_value_t = 2)]
    pub views: u32,

    /// Source frame width
    #[arg(long = "width", value_name = "PX", default_value_t = 352)]
    pub width: u32,

    /// Source frame height
    #[arg(long = "height", value_name = "PX", default_value_t = 288)]
    pub height: u32,

    /// Producer frame rate (scenes per second)
    #[arg(long = "fps", value_name = "FPS", default_value_t = 30.0)]
    pub fps: f64,

    /// Playback speed the producer stamps into pts (2.0 = pts advance twice as fast)
    #[arg(short = 's', long = "speed", value_name = "X", default_value_t = 1.0)]
    pub speed: f64,

    /// Run time in seconds
    #[arg(short = 'd', long = "duration", value_name = "SECS", default_value_t = 3.0)]
    pub duration: f64,

    /// Source color model (i420, nv12, yuy2, rgb24, ...)
    #[arg(long = "color", value_name = "MODEL", default_value = "i420")]
    pub color: ColorModel,

    /// Double the frame size every N scenes (exercises display frame reallocation)
    #[arg(long = "resize-every", value_name = "N")]
    pub resize_every: Option<u32>,

    /// Render tick period override in milliseconds
    #[arg(long = "tick", value_name = "MS")]
    pub tick_ms: Option<u64>,

    /// Pending scene limit override (drops oldest when full)
    #[arg(long = "max-pending", value_name = "N")]
    pub max_pending: Option<usize>,

    /// Write the effective configuration to the config file and continue
    #[arg(long = "save-config")]
    pub save_config: bool,

    /// Enable debug logging to file (default: yuvtk.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["yuvtk"]);
        assert_eq!(args.views, 2);
        assert_eq!((args.width, args.height), (352, 288));
        assert_eq!(args.color, ColorModel::I420);
        assert_eq!(args.verbosity, 0);
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(["yuvtk", "-n", "4", "--color", "NV12", "-vv", "--tick", "16", "-l"]);
        assert_eq!(args.views, 4);
        assert_eq!(args.color, ColorModel::Nv12);
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.tick_ms, Some(16));
        assert_eq!(args.log_file, Some(None));
    }

    #[test]
    fn test_bad_color_rejected() {
        assert!(Args::try_parse_from(["yuvtk", "--color", "xyz"]).is_err());
    }
}
