// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! grb-decode - Reassemble GRB frames into decoded instrument records.
//!
//! Usage:
//!   grb-decode --input packets.csv
//!   grb-decode --input GOESR.pcap --output records.jsonl --validate-crc
//!   grb-decode --listen 0.0.0.0:50020 --group 239.1.2.3
//!   grb-decode gen-config --output grb.toml

use anyhow::Context;
use clap::{Parser, Subcommand};
use grb::{ErrorClass, IngestConfig, IngestStats, Ingestor};
use grb_capture::{CaptureFormat, CaptureReader, JsonLinesSink, UdpFrameReceiver};
use serde::Serialize;
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "grb-decode")]
#[command(about = "Reassemble GOES-R GRB frames into instrument records")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Capture file (.csv, .bin, .pcap)
    #[arg(short, long, conflicts_with = "listen")]
    input: Option<PathBuf>,

    /// Capture format, when the extension does not tell
    #[arg(short, long)]
    format: Option<CaptureFormat>,

    /// Receive frames on this UDP address instead of reading a file
    #[arg(short, long)]
    listen: Option<SocketAddrV4>,

    /// Multicast group to join when listening
    #[arg(long, requires = "listen")]
    group: Option<Ipv4Addr>,

    /// Interface address for the multicast join
    #[arg(long, default_value = "0.0.0.0")]
    interface: Ipv4Addr,

    /// Engine configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file for decoded records (JSON Lines, default stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write final statistics as JSON to this file
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Drop packets with a bad CRC-32 trailer
    #[arg(long)]
    validate_crc: bool,

    /// Reject frames with a bad FECF
    #[arg(long)]
    check_fecf: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Quiet mode (minimal output)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the default configuration as TOML
    GenConfig {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct Summary<'a> {
    records_written: u64,
    elapsed_secs: f64,
    ingest: &'a IngestStats,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging; RUST_LOG overrides --log-level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(Command::GenConfig { output }) = &args.command {
        let toml = IngestConfig::default().to_toml()?;
        match output {
            Some(path) => std::fs::write(path, toml)
                .with_context(|| format!("writing {}", path.display()))?,
            None => print!("{}", toml),
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => IngestConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => IngestConfig::default(),
    };
    if args.validate_crc {
        config = config.validate_crc(true);
    }
    if args.check_fecf {
        let mut frames = config.frames;
        frames.check_fecf = true;
        config = config.frame_validation(frames);
    }

    let mut ingestor = Ingestor::new(config)?;

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut sink = JsonLinesSink::new(writer);

    if !args.quiet {
        info!("GRB decoder v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Virtual channel {}, APIDs {:03x?}",
            ingestor.config().virtual_channel,
            ingestor.config().apids
        );
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let start = Instant::now();

    if let Some(path) = &args.input {
        let reader = CaptureReader::open(path, args.format)?;
        if !args.quiet {
            info!("Input: {} ({})", path.display(), reader.format());
        }
        for item in reader {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            match item {
                Ok(frame) => handle_frame(&mut ingestor, &mut sink, &frame)?,
                Err(e) if !e.is_fatal() => warn!("Skipping input frame: {}", e),
                Err(e) => return Err(e).context("reading capture"),
            }
        }
    } else if let Some(addr) = args.listen {
        let mut receiver = UdpFrameReceiver::bind(addr, args.group, args.interface)?;
        if !args.quiet {
            info!("Listening on {}. Press Ctrl+C to stop.", receiver.local_addr()?);
        }
        let mut last_report = Instant::now();
        while running.load(Ordering::SeqCst) {
            if let Some(frame) = receiver.recv_frame()? {
                handle_frame(&mut ingestor, &mut sink, &frame)?;
                sink.flush()?;
            }
            if !args.quiet && last_report.elapsed() >= Duration::from_secs(10) {
                let stats = ingestor.stats();
                info!(
                    "Received {} frames, {} records",
                    stats.frames_received, stats.packets_completed
                );
                last_report = Instant::now();
            }
        }
    } else {
        anyhow::bail!("Nothing to decode: pass --input or --listen");
    }

    sink.flush()?;
    let elapsed = start.elapsed().as_secs_f64();
    let stats = ingestor.stats();

    if !args.quiet {
        info!("Decoding complete");
        info!("  Frames received: {}", stats.frames_received);
        info!("  Frames accepted: {}", stats.frames_accepted);
        for (reason, count) in &stats.frames_rejected {
            info!("  Frames rejected ({}): {}", reason, count);
        }
        info!("  Other channel: {}", stats.frames_other_channel);
        info!("  Duplicates: {}", stats.frames_duplicate);
        info!("  Records: {}", stats.packets_completed);
        info!("  Protocol errors: {}", stats.protocol_errors);
        if stats.crc_failures > 0 {
            info!("  CRC failures: {}", stats.crc_failures);
        }
        info!("  Duration: {:.1}s", elapsed);
    }

    if let Some(path) = &args.stats {
        let summary = Summary {
            records_written: sink.written(),
            elapsed_secs: elapsed,
            ingest: stats,
        };
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

/// Feed one frame and write whatever it completed. Protocol errors lose a
/// record and are logged; invariant errors end the run.
fn handle_frame<W: Write>(
    ingestor: &mut Ingestor,
    sink: &mut JsonLinesSink<W>,
    frame: &[u8],
) -> anyhow::Result<()> {
    let result = ingestor.process_frame(frame);
    // records completed before an error are still valid
    sink.write_all(&ingestor.drain_all())?;

    match result {
        Ok(_) => Ok(()),
        Err(e) => match e.class() {
            ErrorClass::Protocol => {
                warn!("{}", e);
                Ok(())
            }
            ErrorClass::Invariant => {
                error!("{}", e);
                Err(anyhow::Error::new(e).context("reassembly invariant violated"))
            }
        },
    }
}
