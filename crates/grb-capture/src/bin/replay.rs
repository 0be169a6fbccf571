// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! grb-replay - Send captured or synthetic GRB frames over UDP.
//!
//! Usage:
//!   grb-replay --input packets.csv --target 127.0.0.1:50020
//!   grb-replay --input GOESR.pcap --target 239.1.2.3:50020 --rate 2000 --loop
//!   grb-replay --synthetic 60 --rate 100

use clap::Parser;
use grb::RHCP_VCID;
use grb_capture::{
    CaptureFormat, CaptureReader, FrameRate, ReplayConfig, Replayer, SyntheticStream, DEFAULT_PORT,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "grb-replay")]
#[command(about = "Replay GRB frames over UDP")]
#[command(version)]
struct Args {
    /// Capture file (.csv, .bin, .pcap)
    #[arg(short, long, required_unless_present = "synthetic")]
    input: Option<PathBuf>,

    /// Capture format, when the extension does not tell
    #[arg(short, long)]
    format: Option<CaptureFormat>,

    /// Generate this many seconds of synthetic instrument data instead
    #[arg(long, conflicts_with = "input")]
    synthetic: Option<u32>,

    /// Destination address
    #[arg(short, long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    target: SocketAddr,

    /// Frames per second (0 = unlimited)
    #[arg(short, long, default_value = "1000")]
    rate: f64,

    /// Multicast TTL
    #[arg(long, default_value = "1")]
    ttl: u32,

    /// Loop playback indefinitely
    #[arg(short, long)]
    loop_playback: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Quiet mode (minimal output)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .init();

    if let Some(path) = &args.input {
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
    }

    let rate = FrameRate::from_fps(args.rate);
    let config = ReplayConfig::new(args.target).rate(rate).ttl(args.ttl);
    let mut replayer = Replayer::new(config)?;

    if !args.quiet {
        info!("GRB replay v{}", env!("CARGO_PKG_VERSION"));
        info!("Target: {}", args.target);
        info!("Rate: {}", format_rate(rate));
        if args.loop_playback {
            info!("Loop: enabled");
        }
        info!("Starting playback. Press Ctrl+C to stop.");
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut loops = 0u32;
    'playback: while running.load(Ordering::SeqCst) {
        if let Some(seconds) = args.synthetic {
            let mut stream = SyntheticStream::new(0x81, RHCP_VCID, chrono::Utc::now());
            for _ in 0..seconds {
                for frame in stream.next_second()? {
                    if !running.load(Ordering::SeqCst) {
                        break 'playback;
                    }
                    replayer.send(&frame)?;
                }
            }
        } else if let Some(path) = &args.input {
            for item in CaptureReader::open(path, args.format)? {
                if !running.load(Ordering::SeqCst) {
                    break 'playback;
                }
                match item {
                    Ok(frame) => replayer.send(&frame)?,
                    Err(e) if !e.is_fatal() => warn!("Skipping input frame: {}", e),
                    Err(e) => return Err(e.into()),
                }
            }
        }

        loops += 1;
        if !args.loop_playback {
            break;
        }
    }

    let stats = replayer.stats();
    if !args.quiet {
        info!("Playback complete");
        info!("  Frames sent: {}", stats.frames_sent);
        info!("  Bytes sent: {}", stats.bytes_sent);
        info!("  Duration: {:.1}s", stats.duration_secs);
        info!("  Throughput: {:.1} frames/s", stats.frames_per_second());
        if args.loop_playback {
            info!("  Loops completed: {}", loops);
        }
    }

    Ok(())
}

fn format_rate(rate: FrameRate) -> String {
    match rate {
        FrameRate::PerSecond(fps) => format!("{:.1} frames/s", fps),
        FrameRate::Unlimited => "unlimited".to_string(),
    }
}
