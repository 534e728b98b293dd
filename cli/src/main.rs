use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::exit,
    sync::{Arc, Mutex},
    time::Duration,
};

use archive::{FileStateStore, StateStore};
use byte_unit::Byte;
use canvas::{CanvasConfig, CanvasStore, SystemClock};
use clap::{Parser, Subcommand, ValueEnum};
use decoder::{Channels, Decoder};
use image::ImageFormat;
use log::{error, info};
use snapshot::{FilePublisher, SnapshotCoordinator};
use structures::{qoi_body, BUFFER_LEN};

mod errors;
mod requests;
mod targeting;

use crate::errors::CliError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChannelsArg {
    Rgb,
    Rgba,
}

impl From<ChannelsArg> for Channels {
    fn from(arg: ChannelsArg) -> Self {
        match arg {
            ChannelsArg::Rgb => Channels::Rgb,
            ChannelsArg::Rgba => Channels::Rgba,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the shared canvas, reading requests from stdin
    Serve {
        #[clap(long, default_value = "state.bin")]
        state: PathBuf,
        #[clap(long, default_value = "frames")]
        out_dir: PathBuf,
        #[clap(long, default_value = "60")]
        interval_seconds: u64,
        #[clap(long, default_value = "10")]
        first_tick_seconds: u64,
        #[clap(long, default_value = "59")]
        cooldown_seconds: f64,
        #[clap(long, value_enum, default_value = "rgba")]
        channels: ChannelsArg,
    },
    /// Render a QOI file to a PNG
    Render {
        in_file: PathBuf,
        out_file: PathBuf,
        /// colour pixels by the kind of chunk that produced them
        #[clap(long)]
        chunks: bool,
        #[clap(long, value_enum, default_value = "rgba")]
        channels: ChannelsArg,
    },
    /// Print the byte offset controlling a pixel
    Locate { in_file: PathBuf, x: u32, y: u32 },
    /// Print the byte writes that paint pixels, in order
    Plan {
        in_file: PathBuf,
        r: u8,
        g: u8,
        b: u8,
        /// pixel to paint as X,Y; repeat for more pixels
        #[clap(long = "at", value_parser = parse_point, required = true)]
        at: Vec<(u32, u32)>,
    },
}

fn parse_point(arg: &str) -> Result<(u32, u32), String> {
    let (x, y) = arg
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {arg}"))?;
    let coordinate = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|err| format!("bad coordinate {s}: {err}"))
    };
    Ok((coordinate(x)?, coordinate(y)?))
}

fn read_body(path: &Path) -> Result<Vec<u8>, CliError> {
    let file = fs::read(path)?;
    Ok(qoi_body(&file).to_vec())
}

fn serve(
    state_path: PathBuf,
    out_dir: PathBuf,
    first: Duration,
    interval: Duration,
    config: CanvasConfig,
    channels: Channels,
) -> Result<(), CliError> {
    let mut store = FileStateStore::new(state_path);
    let canvas = CanvasStore::from_state(store.load()?, config, Arc::new(SystemClock))?;

    info!(
        "Serving a buffer of {} ({} bytes), cooldown {}s",
        Byte::from_bytes(BUFFER_LEN as _).get_appropriate_unit(true),
        BUFFER_LEN,
        config.cooldown_seconds
    );
    info!("Starting with {}", canvas.stats());

    let canvas = Arc::new(Mutex::new(canvas));
    let coordinator = SnapshotCoordinator::new(
        canvas.clone(),
        Box::new(store),
        Box::new(FilePublisher::new(out_dir)),
    )
    .with_decoder(Decoder::default().with_channels(channels))
    .spawn(first, interval);

    let result = (|| -> Result<(), CliError> {
        let mut stdout = io::stdout().lock();
        for line in io::stdin().lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let reply = match requests::parse(&line) {
                Ok(request) => requests::handle(&canvas, request),
                Err(err) => err.to_string(),
            };
            writeln!(stdout, "{reply}")?;
        }
        Ok(())
    })();

    coordinator.stop();
    result
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve {
            state,
            out_dir,
            interval_seconds,
            first_tick_seconds,
            cooldown_seconds,
            channels,
        } => {
            let config = CanvasConfig {
                cooldown_seconds,
                ..CanvasConfig::default()
            };
            serve(
                state,
                out_dir,
                Duration::from_secs(first_tick_seconds),
                Duration::from_secs(interval_seconds),
                config,
                channels.into(),
            )
        }
        Commands::Render {
            in_file,
            out_file,
            chunks,
            channels,
        } => {
            let body = read_body(&in_file)?;
            let decoder = Decoder::default().with_channels(channels.into());

            let image = if chunks {
                decoder.render_chunk_map(&body)
            } else {
                decoder.render(&body).0
            };
            image.save_with_format(out_file, ImageFormat::Png)?;
            Ok(())
        }
        Commands::Locate { in_file, x, y } => {
            let body = read_body(&in_file)?;
            let offset = Decoder::default()
                .locate(&body, x, y)
                .ok_or(CliError::Unreachable { x, y })?;
            println!("{offset}");
            Ok(())
        }
        Commands::Plan {
            in_file,
            r,
            g,
            b,
            at,
        } => {
            let body = read_body(&in_file)?;
            let writes = targeting::plan_pixels(&Decoder::default(), &body, &at, [r, g, b])
                .map_err(|(x, y)| CliError::Unreachable { x, y })?;
            for (offset, value) in writes {
                println!("{offset} {value}");
            }
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        error!("{err}");
        exit(1);
    }
}
