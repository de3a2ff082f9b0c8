//! Headless driver: synthetic multi-view producer -> render scheduler -> in-memory renderer

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

use yuvtk::cli::Args;
use yuvtk::config::{self, PathConfig, CONFIG_FILE};
use yuvtk::headless::{HeadlessRenderer, NoConversion};
use yuvtk::measures::{self, MeasureKind};
use yuvtk::{Frame, FrameFormat, Plane, Rect, RenderScheduler, SceneRendered, SchedulerConfig, SchedulerHandle, ViewId};

fn init_logger(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::config_file("yuvtk.log", path_config));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn load_config(args: &Args, path_config: &PathConfig) -> Result<SchedulerConfig> {
    let path = config::config_file(CONFIG_FILE, path_config);
    let mut config = SchedulerConfig::load_or_default(&path)?;

    // CLI overrides
    if let Some(ms) = args.tick_ms {
        config.tick_period_ms = ms;
    }
    if args.max_pending.is_some() {
        config.max_pending_scenes = args.max_pending;
    }
    config.validate()?;

    if args.save_config {
        config.save(&path)?;
        info!("Saved config to {}", path.display());
    }
    Ok(config)
}

/// Views side by side, each shown at its source size
fn side_by_side_layout(views: u32, width: u32, height: u32) -> (Vec<ViewId>, Vec<Rect>, Vec<Rect>) {
    let (w, h) = (width as i32, height as i32);
    (0..views)
        .map(|v| (ViewId(v), Rect::new(0, 0, w, h), Rect::new(v as i32 * w, 0, w, h)))
        .fold((Vec::new(), Vec::new(), Vec::new()), |(mut ids, mut src, mut dst), (id, s, d)| {
            ids.push(id);
            src.push(s);
            dst.push(d);
            (ids, src, dst)
        })
}

/// Moving gradient; each view is offset so measures between views are non-zero
fn synthetic_frame(view: u32, format: FrameFormat, index: u32) -> Frame {
    let mut frame = Frame::new(format).with_view(ViewId(view));
    for plane in Plane::ALL {
        let stride = format.stride(plane);
        if stride == 0 {
            continue;
        }
        let base = index.wrapping_add(view * 16) as usize;
        for (row, line) in frame.plane_mut(plane).chunks_mut(stride).enumerate() {
            for (x, px) in line.iter_mut().enumerate() {
                *px = (base + x + row) as u8;
            }
        }
    }
    frame
}

fn run_producer(handle: SchedulerHandle, args: &Args) -> u32 {
    let fps = args.fps.max(0.1);
    let period = Duration::from_secs_f64(1.0 / fps);
    let pts_step = 1000.0 / fps * args.speed;
    let deadline = Instant::now() + Duration::from_secs_f64(args.duration.max(0.0));

    let mut next = Instant::now();
    let mut index = 0u32;
    while Instant::now() < deadline {
        let scale = match args.resize_every {
            Some(n) if n > 0 && (index / n) % 2 == 1 => 2,
            _ => 1,
        };
        let format = FrameFormat::new(args.color, args.width * scale, args.height * scale);
        let frames = (0..args.views).map(|v| synthetic_frame(v, format, index)).collect();
        let pts = (index as f64 * pts_step) as u32;
        handle.render_scene(frames, Some(pts), false);
        index += 1;

        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            next = now;
        }
    }
    index
}

fn main() -> Result<()> {
    let args = Args::parse();
    let path_config = PathConfig {
        config_dir: args.config_dir.clone(),
    };
    init_logger(&args, &path_config)?;
    info!("yuvtk {} starting", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    let config = load_config(&args, &path_config)?;
    debug!("Scheduler config: {:?}", config);

    let renderer = HeadlessRenderer::new();
    let counters = renderer.counters();
    let mut scheduler = RenderScheduler::new(renderer, NoConversion, config);
    let rendered_rx = scheduler
        .events()
        .subscribe_channel::<SceneRendered>(scheduler.config().event_channel_capacity);

    let handle = scheduler.handle();
    let (ids, src, dst) = side_by_side_layout(args.views, args.width, args.height);
    handle.set_layout(ids, src, dst)?;

    // Observer on its own thread; the channel closes when the scheduler is dropped
    let observer = thread::Builder::new()
        .name("yuvtk-observer".to_string())
        .spawn(move || {
            let (mut received, mut presented, mut last) = (0usize, 0usize, None);
            for event in rendered_rx {
                received += 1;
                presented += usize::from(event.rendered);
                last = Some(event.scene);
            }
            (received, presented, last)
        })
        .context("failed to spawn observer thread")?;

    scheduler.start()?;
    let produced = run_producer(handle.clone(), &args);

    // Let the render thread drain what is queued
    let drain_deadline = Instant::now() + Duration::from_secs(2);
    while handle.pending_scenes() > 0 && Instant::now() < drain_deadline {
        thread::sleep(scheduler.config().tick_period());
    }
    let speed = handle.speed_ratio();
    scheduler.stop()?;
    drop(scheduler);

    let (received, presented, last) = observer
        .join()
        .map_err(|_| anyhow::anyhow!("observer thread panicked"))?;
    let stats = counters.snapshot();
    if stats.live_frames() != 0 {
        warn!("{} display frames still allocated after stop", stats.live_frames());
    }

    println!("scenes produced:   {}", produced);
    println!("scenes presented:  {}", stats.scenes);
    println!("frames presented:  {}", stats.frames);
    println!("allocations:       {} ({} released)", stats.allocations, stats.deallocations);
    println!("events received:   {} ({} rendered)", received, presented);
    println!("speed ratio:       {:.3}", speed);

    if let Some(scene) = last {
        if let [a, b, ..] = scene.frames.as_slice() {
            let report = measures::compute(a, b)?;
            if let Some(psnr) = report.get(MeasureKind::Psnr, None) {
                println!("PSNR view0/view1:  {:.2} dB", psnr);
            }
        }
    }
    Ok(())
}
