use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use moodlock_capture::{load_frame, SequenceSource, StillSource};
use moodlock_core::detector::analyze_regions;
use moodlock_engine::{spawn_engine, Config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moodlock", about = "Face presence detection, face lock and mood inference")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run face detection on one or more images
    Detect {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Print per-region heuristic metrics for an image
    Metrics { image: PathBuf },
    /// Infer a mood from an image
    Mood {
        image: PathBuf,
        /// Lock the face first and infer from the lock
        #[arg(long)]
        lock: bool,
    },
    /// Poll a sequence of images at the detection cadence, locking the first good face
    Watch {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Number of detection cycles to run
        #[arg(short, long, default_value_t = 10)]
        ticks: u32,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;

    match cli.command {
        Commands::Detect { images } => {
            let session = config.build_session(None);
            for path in images {
                let frame = load_frame(&path)?;
                let result = session.detect_face(Some(&frame));
                println!(
                    "{}",
                    serde_json::json!({ "image": path.display().to_string(), "result": result })
                );
            }
        }
        Commands::Metrics { image } => {
            // Score at the same resolution detection analyses.
            let frame = load_frame(&image)?;
            let frame = frame
                .downsample(config.max_frame_width, config.max_frame_height)
                .unwrap_or(frame);
            let regions: Vec<_> = analyze_regions(&frame)
                .into_iter()
                .map(|(region, score)| serde_json::json!({ "region": region, "score": score }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&regions)?);
        }
        Commands::Mood { image, lock } => {
            let engine = spawn_engine(&config, Box::new(StillSource::open(&image)?), None)?;
            let detection = engine.detect().await?;
            println!("detection: {}", serde_json::to_string(&detection)?);

            let mood = if lock {
                if !engine.lock().await? {
                    anyhow::bail!("no lockable face in {}", image.display());
                }
                engine.mood_from_lock().await?
            } else {
                engine.mood_from_video().await?
            };
            println!("{}", serde_json::to_string_pretty(&mood)?);
        }
        Commands::Watch { images, ticks } => {
            let engine = spawn_engine(&config, Box::new(SequenceSource::open(images)?), None)?;
            let mut interval = tokio::time::interval(config.detect_interval());

            for tick in 1..=ticks {
                interval.tick().await;
                let detection = engine.detect().await?;

                let mut status = engine.lock_status().await?;
                if status.is_none() && detection.is_lockable() && engine.lock().await? {
                    tracing::info!(tick, "face locked");
                    status = engine.lock_status().await?;
                }

                match status {
                    Some(s) => println!(
                        "[{tick}] {} face={} quality={} locked remaining={}s",
                        detection.detection_method,
                        detection.face_detected,
                        s.quality,
                        s.remaining.as_secs()
                    ),
                    None => println!(
                        "[{tick}] {} face={} confidence={:.2} unlocked",
                        detection.detection_method, detection.face_detected, detection.confidence
                    ),
                }
            }

            match engine.mood_from_lock().await {
                Ok(mood) => println!("{}", serde_json::to_string_pretty(&mood)?),
                Err(e) => println!("no mood: {e}"),
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
