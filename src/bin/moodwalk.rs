//! Offline mood generator: read a recording, write a transformed WAV.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use moodwalker_core::config::GeneratorConfig;
use moodwalker_core::{Generator, Mood};

#[derive(Parser, Debug)]
#[command(name = "moodwalk")]
#[command(about = "Turn a voice or instrument recording into a mood-styled WAV", long_about = None)]
struct CliArgs {
    /// Recording to transform (WAV or MP3)
    #[arg(long, short, value_name = "FILE")]
    input: PathBuf,

    /// Mood to apply: happy, calm, energetic, sad, angry
    #[arg(long, short, value_name = "MOOD")]
    mood: Option<Mood>,

    /// Pick the mood from the recording when --mood is not given
    #[arg(long)]
    suggest: bool,

    /// Seed for reproducible output
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// JSON generator config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output file or directory; defaults to the user's audio directory
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn output_path(requested: Option<&Path>, filename: &str) -> PathBuf {
    match requested {
        Some(p) if p.is_dir() => p.join(filename),
        Some(p) => p.to_path_buf(),
        None => directories::UserDirs::new()
            .and_then(|dirs| dirs.audio_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(filename),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    let generator = Arc::new(Generator::new(config));

    let recording = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;

    let mood = match args.mood {
        Some(m) => Some(m),
        None if args.suggest => {
            let mut rng = match args.seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_os_rng(),
            };
            let suggestion = generator.suggest(&recording, &mut rng)?;
            info!(
                mood = %suggestion.mood,
                confidence = suggestion.confidence,
                "using suggested mood"
            );
            Some(suggestion.mood)
        }
        None => None,
    };

    let (filename, wav) = match generator.generate_async(Some(recording), mood, args.seed).await {
        Ok(song) => (song.download_filename(), Arc::clone(&song.wav)),
        Err(e) => match e.recovered_audio() {
            Some(audio) => {
                warn!("{e}; writing the rendered audio anyway");
                (audio.download_filename(), Arc::clone(&audio.wav))
            }
            None => return Err(e.into()),
        },
    };

    let path = output_path(args.output.as_deref(), &filename);
    tokio::fs::write(&path, &wav[..])
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = wav.len(), "wrote song");
    println!("{}", path.display());
    Ok(())
}
