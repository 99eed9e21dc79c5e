use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};

use groomcard::draft::{Gender, PhotoRole, ReportDraft, DEFAULT_SERVICES};
use groomcard::settings::{rewrite_config, SettingsStore};
use groomcard::{
    enhance_notes, enhance_notes_or_keep, photo, template, ExportConfig, NotesRewriter,
    RewriteConfig, Studio,
};

#[derive(Parser)]
#[command(name = "groomcard", version, about = "Build shareable pet grooming report cards")]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose a report and export it as a PNG
    Export(ExportArgs),
    /// Normalize a single photo to a bounded JPEG
    Normalize {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 1200)]
        max_dimension: u32,
        #[arg(long, default_value_t = 80)]
        quality: u8,
    },
    /// Rewrite grooming notes and print the result
    Rewrite {
        #[arg(long)]
        notes: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, env = "GROOMCARD_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// List report templates
    Templates,
    /// List the standard services
    Services,
    /// Manage persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save an API key for note rewriting
    SetKey { key: String },
    /// Remove the saved API key
    ClearKey,
    /// Print the current settings
    Show,
    /// Print the settings file location
    Path,
}

#[derive(Args)]
struct ExportArgs {
    /// JSON draft to start from; flags override its fields
    #[arg(long)]
    draft: Option<PathBuf>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    breed: Option<String>,
    #[arg(long)]
    age: Option<String>,
    /// Weight in kilograms
    #[arg(long)]
    weight: Option<String>,
    /// male, female or other
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    groomer: Option<String>,
    /// Service performed (repeatable)
    #[arg(long = "service")]
    services: Vec<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Service date, YYYY-MM-DD
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    template: Option<String>,
    /// Photo taken before grooming
    #[arg(long)]
    before: Option<PathBuf>,
    /// Photo taken after grooming
    #[arg(long)]
    after: Option<PathBuf>,
    /// Rewrite the notes before exporting
    #[arg(long)]
    enhance: bool,
    /// Directory to write the PNG into
    #[arg(long, default_value = ".")]
    out: PathBuf,
    #[arg(long)]
    pixel_ratio: Option<f32>,
    #[arg(long)]
    settle_ms: Option<u64>,
    #[arg(long, env = "GROOMCARD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli.command).await {
        eprintln!("error: {:#}", e);
        if let Some(err) = e.downcast_ref::<groomcard::Error>() {
            eprintln!("hint: {}", err.hint());
        }
        std::process::exit(1);
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Export(args) => export(args).await,
        Command::Normalize {
            input,
            output,
            max_dimension,
            quality,
        } => {
            let config = ExportConfig {
                max_dimension,
                jpeg_quality: quality,
                ..Default::default()
            };
            let photo = photo::normalize_file(&input, &config)
                .await
                .with_context(|| format!("normalizing {}", input.display()))?;
            let output = output.unwrap_or_else(|| normalized_path(&input));
            tokio::fs::write(&output, &photo.data)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "{} ({}x{}, {} bytes)",
                output.display(),
                photo.width,
                photo.height,
                photo.data.len()
            );
            Ok(())
        }
        Command::Rewrite {
            notes,
            name,
            api_key,
        } => {
            let mut draft = ReportDraft::new();
            draft.pet.name = name.unwrap_or_default();
            draft.set_notes(notes);
            let rewriter = rewriter_for(api_key.as_deref())?;
            if !enhance_notes(&mut draft, rewriter.as_deref()).await? {
                bail!("nothing to rewrite: the notes are empty");
            }
            println!("{}", draft.display_notes());
            Ok(())
        }
        Command::Templates => {
            for t in template::TEMPLATES {
                let marker = if t.id == template::DEFAULT_TEMPLATE_ID { "*" } else { " " };
                println!("{} {:<14} {:<14} {}", marker, t.id, t.name, t.primary);
            }
            Ok(())
        }
        Command::Services => {
            for s in DEFAULT_SERVICES {
                println!("{}", s);
            }
            Ok(())
        }
        Command::Config { action } => config(action),
    }
}

async fn export(args: ExportArgs) -> anyhow::Result<()> {
    let mut draft = match &args.draft {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading draft {}", path.display()))?;
            serde_json::from_str::<ReportDraft>(&raw)
                .with_context(|| format!("parsing draft {}", path.display()))?
        }
        None => ReportDraft::new(),
    };
    apply_flags(&mut draft, &args);
    if template::find(&draft.template_id).is_none() {
        warn!(
            "unknown template '{}', using {}",
            draft.template_id,
            template::DEFAULT_TEMPLATE_ID
        );
    }

    let mut config = ExportConfig::default();
    if let Some(ratio) = args.pixel_ratio {
        config.raster.pixel_ratio = ratio;
    }
    if let Some(ms) = args.settle_ms {
        config.raster.settle_ms = ms;
    }
    let studio = Studio::new(config).await?;

    for (role, path) in [(PhotoRole::Before, &args.before), (PhotoRole::After, &args.after)] {
        let Some(path) = path else { continue };
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {} photo {}", role.label(), path.display()))?;
        let photo = studio
            .normalize(bytes)
            .await
            .with_context(|| format!("normalizing {} photo {}", role.label(), path.display()))?;
        debug!("{} photo is {}x{}", role.label(), photo.width, photo.height);
        draft.set_photo(role, photo);
    }

    // Rewriting is optional: any failure, setup included, keeps the notes.
    if args.enhance {
        let rewritten = match rewriter_for(args.api_key.as_deref()) {
            Ok(rewriter) => enhance_notes_or_keep(&mut draft, Ok(rewriter.as_deref())).await,
            Err(e) => enhance_notes_or_keep(&mut draft, Err(e)).await,
        };
        if rewritten {
            info!("notes rewritten");
        }
    }

    let report = studio.export(&draft).await?;
    let path = report.save(&args.out)?;
    studio.close().await?;
    println!(
        "{} ({}x{} at {:.2}x)",
        path.display(),
        report.width,
        report.height,
        report.pixel_ratio
    );
    Ok(())
}

fn apply_flags(draft: &mut ReportDraft, args: &ExportArgs) {
    if let Some(v) = &args.name {
        draft.pet.name = v.clone();
    }
    if let Some(v) = &args.breed {
        draft.pet.breed = v.clone();
    }
    if let Some(v) = &args.age {
        draft.pet.age = v.clone();
    }
    if let Some(v) = &args.weight {
        draft.pet.weight = v.clone();
    }
    if let Some(v) = args.gender {
        draft.pet.gender = v;
    }
    if let Some(v) = &args.groomer {
        draft.groomer_name = v.clone();
    }
    for s in &args.services {
        draft.services.insert(s.as_str());
    }
    if let Some(v) = &args.notes {
        draft.set_notes(v.as_str());
    }
    if let Some(v) = args.date {
        draft.date = v;
    }
    if let Some(v) = &args.template {
        draft.template_id = v.clone();
    }
}

fn normalized_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    input.with_file_name(format!("{}-normalized.jpg", stem))
}

/// Set up the rewriter from the explicit key and the persisted settings.
fn rewriter_for(explicit: Option<&str>) -> groomcard::Result<Option<Box<dyn NotesRewriter>>> {
    let loaded = SettingsStore::default_location().and_then(|store| store.load());
    build_rewriter(rewrite_config(explicit, loaded)?)
}

#[cfg(feature = "rewrite")]
fn build_rewriter(
    config: Option<RewriteConfig>,
) -> groomcard::Result<Option<Box<dyn NotesRewriter>>> {
    match config {
        Some(config) => Ok(Some(Box::new(groomcard::GeminiRewriter::new(config)?))),
        None => Ok(None),
    }
}

#[cfg(not(feature = "rewrite"))]
fn build_rewriter(
    config: Option<RewriteConfig>,
) -> groomcard::Result<Option<Box<dyn NotesRewriter>>> {
    if config.is_some() {
        warn!("built without the `rewrite` feature; note rewriting is unavailable");
    }
    Ok(None)
}

fn config(action: ConfigAction) -> anyhow::Result<()> {
    let store = SettingsStore::default_location()?;
    match action {
        ConfigAction::SetKey { key } => {
            store.set_api_key(&key)?;
            println!("API key saved to {}", store.path().display());
        }
        ConfigAction::ClearKey => {
            store.clear_api_key()?;
            println!("API key removed");
        }
        ConfigAction::Show => {
            let settings = store.load()?;
            let key = if settings.api_key.is_some() { "set" } else { "not set" };
            println!("file:     {}", store.path().display());
            println!("api_key:  {}", key);
            println!(
                "model:    {}",
                settings
                    .model
                    .as_deref()
                    .unwrap_or(groomcard::rewrite::config::DEFAULT_MODEL)
            );
            println!(
                "endpoint: {}",
                settings
                    .endpoint
                    .as_deref()
                    .unwrap_or(groomcard::rewrite::config::DEFAULT_ENDPOINT)
            );
        }
        ConfigAction::Path => println!("{}", store.path().display()),
    }
    Ok(())
}
