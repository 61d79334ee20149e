//! thesis-narrator - Narrate academic papers as audio through a cloud TTS backend

mod audio;
mod config;
mod pages;
mod session;
mod text;
mod thesis;
mod tts;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::NarratorConfig;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use session::RecordCache;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use text::Sanitizer;
use thesis::{Segmenter, ThesisRecord, parse_document};
use tts::{NarrationUnit, Narrator, VoiceSettings};
use tts_client::ProviderConfig;

/// Characters of each chapter shown by the outline
const OUTLINE_PREVIEW_CHARS: usize = 1500;

#[derive(Parser, Debug)]
#[command(name = "thesis-narrator")]
#[command(about = "Narrate academic papers (PDF or text dumps) as audio", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the paper (PDF, or text with form-feed page breaks)
    file: Option<PathBuf>,

    /// What to narrate: outline, summary, chapter:N, chapters, full
    #[arg(short, long, default_value = "outline")]
    unit: UnitSelection,

    /// Directory for audio files (default: current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Override the extracted title
    #[arg(long)]
    title: Option<String>,

    /// Voice name (e.g. ko-KR-Neural2-B)
    #[arg(long)]
    voice: Option<String>,

    /// Speaking rate (0.25-4.0)
    #[arg(long)]
    rate: Option<f32>,

    /// Maximum characters per synthesis request (100-1500)
    #[arg(long)]
    chunk_budget: Option<usize>,

    /// Chunk requests in flight at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Re-parse the document even if a cached record exists
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice
    SetVoice {
        /// Voice name (e.g. ko-KR-Neural2-B)
        name: String,
    },
    /// Set default speaking rate
    SetRate {
        /// Value (0.25-4.0)
        value: f32,
    },
    /// Set default chunk budget
    SetChunkBudget {
        /// Characters per request (100-1500)
        value: usize,
    },
    /// Set default number of concurrent requests
    SetJobs {
        /// Value (1-16)
        value: usize,
    },
}

/// Which part of the paper to narrate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UnitSelection {
    Outline,
    Summary,
    /// One-based chapter number
    Chapter(usize),
    Chapters,
    Full,
}

impl FromStr for UnitSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "outline" => Ok(Self::Outline),
            "summary" => Ok(Self::Summary),
            "chapters" => Ok(Self::Chapters),
            "full" => Ok(Self::Full),
            _ => {
                let number = lower
                    .strip_prefix("chapter:")
                    .ok_or_else(|| format!("Unknown unit '{}'", s))?;
                match number.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(Self::Chapter(n)),
                    _ => Err(format!("Invalid chapter number '{}' (chapters start at 1)", number)),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let path = args
        .file
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Paper path is required. Run 'thesis-narrator --help' for usage."))?;

    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let config = NarratorConfig::load().context("Failed to load configuration")?;

    if args.debug {
        eprintln!("Paper: {}", path.display());
        eprintln!("Unit: {:?}", args.unit);
        eprintln!("Config: {:?}", config);
    }

    let record = load_record(&path, &config, &args)?;

    eprintln!("Title: {}", record.title);
    eprintln!(
        "Chapters: {}, Characters: ~{}",
        record.chapters.len(),
        record.total_chars()
    );

    if args.unit == UnitSelection::Outline {
        print_outline(&record);
        return Ok(());
    }

    let units = select_units(&args.unit, &record)?;
    let narrator = build_narrator(&config, &args)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let mut written = Vec::new();
    for unit in &units {
        match narrate_to_file(&narrator, unit, &record, &output_dir).await {
            Ok(Some(path)) => written.push(path),
            Ok(None) => eprintln!("Skipping {}: no text to narrate", unit),
            Err(e) => {
                if !written.is_empty() {
                    eprintln!("Files written before the failure:");
                    for path in &written {
                        eprintln!("  {}", path.display());
                    }
                }
                return Err(e);
            }
        }
    }

    if written.is_empty() {
        eprintln!("Nothing was narrated.");
    }
    Ok(())
}

/// Parse the paper, or reuse the cached record for identical source bytes.
fn load_record(path: &Path, config: &NarratorConfig, args: &Args) -> Result<ThesisRecord> {
    let source = pages::open(path);
    let bytes = source.source_bytes()?;
    let cache = RecordCache::default_location()?;

    let segmenter = Segmenter::new()
        .with_min_chapter_chars(config.min_chapter_chars)
        .with_summary_fallback_chars(config.summary_fallback_chars);

    let entry = cache.load_or_parse(path, &bytes, args.no_cache, || {
        eprintln!("Parsing: {}", path.display());
        let pages = source.pages_from_bytes(&bytes);
        Ok(parse_document(&pages, &segmenter))
    })?;
    info!("record {} parsed at {}", entry.source_hash, entry.created_at);

    Ok(entry.record_with_title(args.title.as_deref()))
}

fn print_outline(record: &ThesisRecord) {
    println!("Title: {}", record.title);
    println!();
    println!("Summary ({} chars):", record.summary.chars().count());
    println!("{}", record.summary);

    println!();
    println!("Chapters ({}):", record.chapters.len());
    for (i, chapter) in record.chapters.iter().enumerate() {
        println!();
        println!("[{}] {} ({} chars)", i + 1, chapter.label, chapter.body.chars().count());
        println!("{}", chapter.preview(OUTLINE_PREVIEW_CHARS));
    }
}

/// Expand the CLI selection into the units to narrate, in order.
fn select_units(selection: &UnitSelection, record: &ThesisRecord) -> Result<Vec<NarrationUnit>> {
    let units = match selection {
        UnitSelection::Outline => Vec::new(),
        UnitSelection::Summary => vec![NarrationUnit::Summary],
        UnitSelection::Full => vec![NarrationUnit::Full],
        UnitSelection::Chapter(n) => {
            let unit = NarrationUnit::chapter(record, n - 1).ok_or_else(|| {
                anyhow::anyhow!(
                    "Chapter {} not found (the paper has {} chapters)",
                    n,
                    record.chapters.len()
                )
            })?;
            vec![unit]
        }
        UnitSelection::Chapters => (0..record.chapters.len())
            .filter_map(|i| NarrationUnit::chapter(record, i))
            .collect(),
    };

    if units.is_empty() && *selection == UnitSelection::Chapters {
        anyhow::bail!("No chapters were found in this paper");
    }
    Ok(units)
}

/// Combine saved config with per-run flags into a narrator.
fn build_narrator(config: &NarratorConfig, args: &Args) -> Result<Narrator> {
    let mut voice = VoiceSettings::new()
        .with_voice(config.voice_name.clone())
        .with_language_code(config.language_code.clone())
        .with_speaking_rate(args.rate.unwrap_or(config.speaking_rate))
        .with_encoding(config.encoding);
    if let Some(name) = &args.voice {
        voice = voice.with_voice(name.clone());
    }

    let provider_config = ProviderConfig::load().context("Failed to load provider configuration")?;
    let synthesizer = tts::create_synthesizer(&provider_config)?;

    let budget = config::clamp_chunk_budget(args.chunk_budget.unwrap_or(config.chunk_budget));
    let jobs = config::clamp_jobs(args.jobs.unwrap_or(config.max_concurrency));

    if args.debug {
        eprintln!("Voice: {} ({})", voice.voice_name, voice.language_code);
        eprintln!("Rate: {}", voice.speaking_rate);
        eprintln!("Chunk budget: {}", budget);
        eprintln!("Jobs: {}", jobs);
    }

    Ok(Narrator::new(synthesizer, voice)
        .with_chunk_budget(budget)
        .with_sanitizer(Sanitizer::new().with_pause_ms(config.pause_ms))
        .with_max_concurrency(jobs))
}

/// Narrate one unit and write it under `output_dir`.
async fn narrate_to_file(
    narrator: &Narrator,
    unit: &NarrationUnit,
    record: &ThesisRecord,
    output_dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(script) = unit.script(record) else {
        anyhow::bail!("{} is not part of this paper", unit);
    };

    eprintln!("\nNarrating {}...", unit);
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})")?
            .progress_chars("#>-"),
    );

    let result = narrator
        .narrate(unit, &script, |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        })
        .await;
    pb.finish_and_clear();

    let Some(audio) = result? else {
        return Ok(None);
    };

    let path = output_dir.join(audio::suggested_filename(unit, narrator.voice().encoding));
    audio::write_audio(&path, &audio.bytes)?;

    let size_kb = audio.bytes.len() as f64 / 1024.0;
    eprintln!(
        "Output: {} ({} chunks, {:.1} KB)",
        path.display(),
        audio.chunk_count,
        size_kb
    );
    Ok(Some(path))
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    let mut config = NarratorConfig::load()?;

    match action {
        ConfigAction::Show => {
            let config_path = NarratorConfig::config_path()?;
            println!("Config file: {}", config_path.display());
            println!();
            println!("voice_name = {}", config.voice_name);
            println!("language_code = {}", config.language_code);
            println!("speaking_rate = {}", config.speaking_rate);
            println!("encoding = {}", config.encoding.api_name());
            println!("chunk_budget = {}", config.chunk_budget);
            println!("pause_ms = {}", config.pause_ms);
            println!("max_concurrency = {}", config.max_concurrency);
            println!("min_chapter_chars = {}", config.min_chapter_chars);
            println!("summary_fallback_chars = {}", config.summary_fallback_chars);

            println!();
            match ProviderConfig::config_path() {
                Ok(path) => println!("Provider config: {}", path.display()),
                Err(e) => println!("Provider config: unavailable ({})", e),
            }
            match ProviderConfig::load() {
                Ok(provider) => {
                    println!("provider = {}", provider.provider);
                    let credential = if provider.resolve_credential().is_ok() {
                        "configured"
                    } else {
                        "missing"
                    };
                    println!("credentials = {}", credential);
                }
                Err(e) => println!("provider = unreadable ({})", e),
            }
        }
        ConfigAction::SetVoice { name } => {
            let voice = VoiceSettings::new().with_voice(name.clone());
            config.voice_name = voice.voice_name;
            config.language_code = voice.language_code;
            config.save()?;
            println!("Default voice set to: {} ({})", config.voice_name, config.language_code);
        }
        ConfigAction::SetRate { value } => {
            config.speaking_rate = config::clamp_speaking_rate(*value);
            config.save()?;
            println!("Default speaking rate set to: {}", config.speaking_rate);
        }
        ConfigAction::SetChunkBudget { value } => {
            config.chunk_budget = config::clamp_chunk_budget(*value);
            config.save()?;
            println!("Default chunk budget set to: {}", config.chunk_budget);
        }
        ConfigAction::SetJobs { value } => {
            config.max_concurrency = config::clamp_jobs(*value);
            config.save()?;
            println!("Default jobs set to: {}", config.max_concurrency);
        }
    }

    Ok(())
}
