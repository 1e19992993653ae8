use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use storyreel_core::core::ai::{
    FeatureOrchestrator, FeatureOutcome, FeatureSetting, GeminiCapabilities, SceneGenerator,
};
use storyreel_core::core::assets::import_image;
use storyreel_core::core::render::{
    build_export_args, build_filter_graph, check_scene_durations, FFmpegEngine, ProgressEvent,
    ProgressSink, ScenePlan, StoryboardExporter,
};
use storyreel_core::core::settings::{SettingsManager, StudioSettings};
use storyreel_core::core::storyboard::TextOverlay;
use storyreel_core::ActiveProject;

#[derive(Parser, Debug)]
#[command(name = "storyreel", version, about = "Storyboard editing and MP4 export")]
struct Cli {
    /// Project file (created on first save).
    #[arg(long, global = true, default_value = "storyreel.json")]
    project: PathBuf,

    /// Settings file; defaults to the platform config directory.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Print `list` and `plan` output as JSON.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Also write daily rolling logs to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List assets and storyboard entries.
    List,
    /// Print the topic summary of the storyboard.
    Topic,
    /// Print the FFmpeg invocation an export would run.
    Plan,
    /// Export the storyboard to an MP4 file.
    Export(ExportArgs),
    /// Import image files into the media bin.
    Import(ImportArgs),
    /// Generate scene images from a prompt.
    Generate {
        prompt: String,
    },
    /// Append an asset to the storyboard.
    AddScene {
        asset_id: String,
    },
    /// Remove a storyboard entry (the asset stays in the bin).
    RemoveScene {
        item_id: String,
    },
    /// Move a storyboard entry from one position to another (0-based).
    Move {
        from: usize,
        to: usize,
    },
    /// Set a scene's display duration in seconds.
    Duration {
        item_id: String,
        seconds: f64,
    },
    /// Set or clear a scene's CSS filter.
    Filter {
        item_id: String,
        expression: Option<String>,
    },
    /// Add a text overlay to a scene.
    Overlay {
        item_id: String,
        text: String,
    },
    /// Delete an asset that no scene references.
    DeleteAsset {
        asset_id: String,
    },
    /// Toggle an AI feature on a scene.
    Feature {
        item_id: String,
        #[arg(value_enum)]
        feature: FeatureArg,
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Generate captions for a scene.
    Caption {
        item_id: String,
    },
    /// Synthesize speech for a scene's caption or speech text.
    Speech {
        item_id: String,
    },
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Output MP4 path; defaults to the configured download name.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ImportArgs {
    /// Image files (png, jpg, webp, gif).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Keywords for every imported file; defaults to the file name.
    #[arg(long, value_delimiter = ',')]
    keywords: Vec<String>,

    /// Also append each imported asset to the storyboard.
    #[arg(long, default_value_t = false)]
    add_to_storyboard: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FeatureArg {
    BackgroundRemoved,
    Relit,
    EnhancedQuality,
    FlickerRemoved,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

impl FeatureArg {
    fn setting(self, enabled: bool) -> FeatureSetting {
        match self {
            FeatureArg::BackgroundRemoved => FeatureSetting::BackgroundRemoved(enabled),
            FeatureArg::Relit => FeatureSetting::Relit(enabled),
            FeatureArg::EnhancedQuality => FeatureSetting::EnhancedQuality(enabled),
            FeatureArg::FlickerRemoved => FeatureSetting::FlickerRemoved(enabled),
        }
    }
}

/// Forwards progress events to the log.
struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Message(message) => info!("{}", message),
            ProgressEvent::Warning(message) => warn!("{}", message),
            ProgressEvent::Failed(message) => error!("{}", message),
            ProgressEvent::Idle => debug!("idle"),
        }
    }
}

fn init_logging(
    log_dir: Option<&Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log dir '{}'", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "storyreel.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(guard)
}

fn load_settings(path: Option<PathBuf>) -> anyhow::Result<StudioSettings> {
    let manager = match path {
        Some(path) => SettingsManager::new(path),
        None => SettingsManager::default_location()?,
    };
    let mut settings = manager.load();
    settings.apply_env_overrides();
    settings.normalize();
    Ok(settings)
}

fn gemini(settings: &StudioSettings) -> anyhow::Result<Arc<GeminiCapabilities>> {
    let ai = GeminiCapabilities::new(&settings.ai)
        .context("configure Gemini (set GEMINI_API_KEY or ai.apiKey in settings)")?;
    Ok(Arc::new(ai))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_dir.as_deref())?;
    let settings = load_settings(cli.settings)?;

    let project = ActiveProject::open(cli.project.clone())
        .with_context(|| format!("open project '{}'", cli.project.display()))?;

    let changed = match cli.cmd {
        Command::List => cmd_list(&project, cli.json).await?,
        Command::Topic => {
            println!("{}", project.state.read().await.current_topic());
            false
        }
        Command::Plan => cmd_plan(&project, &settings, cli.json).await?,
        Command::Export(args) => cmd_export(&project, &settings, args).await?,
        Command::Import(args) => cmd_import(&project, args).await?,
        Command::Generate { prompt } => {
            let generator = SceneGenerator::new(
                project.state.clone(),
                gemini(&settings)?,
                Arc::new(TerminalProgress),
            );
            let ids = generator.generate(&prompt).await?;
            for id in ids {
                println!("{}", id);
            }
            true
        }
        Command::AddScene { asset_id } => {
            let item_id = project.state.write().await.add_to_storyboard(&asset_id)?;
            println!("{}", item_id);
            true
        }
        Command::RemoveScene { item_id } => {
            project.state.write().await.remove_from_storyboard(&item_id)?;
            true
        }
        Command::Move { from, to } => {
            project.state.write().await.move_item(from, to)?;
            true
        }
        Command::Duration { item_id, seconds } => {
            project.state.write().await.set_duration(&item_id, seconds)?;
            true
        }
        Command::Filter {
            item_id,
            expression,
        } => {
            project.state.write().await.set_filter(&item_id, expression)?;
            true
        }
        Command::Overlay { item_id, text } => {
            let overlay_id = project
                .state
                .write()
                .await
                .add_text_overlay(&item_id, TextOverlay::new(text))?;
            println!("{}", overlay_id);
            true
        }
        Command::DeleteAsset { asset_id } => {
            project.state.write().await.delete_asset(&asset_id)?;
            true
        }
        Command::Feature {
            item_id,
            feature,
            state,
        } => {
            let orchestrator = orchestrator(&project, &settings)?;
            let setting = feature.setting(matches!(state, Toggle::On));
            let outcome = orchestrator.set_feature(&item_id, setting).await?;
            report_outcome(outcome)?
        }
        Command::Caption { item_id } => {
            let outcome = orchestrator(&project, &settings)?
                .generate_captions(&item_id)
                .await?;
            report_outcome(outcome)?
        }
        Command::Speech { item_id } => {
            let outcome = orchestrator(&project, &settings)?
                .generate_speech(&item_id)
                .await?;
            report_outcome(outcome)?
        }
    };

    if changed {
        project
            .save()
            .await
            .with_context(|| format!("save project '{}'", project.path.display()))?;
    }
    Ok(())
}

fn orchestrator(
    project: &ActiveProject,
    settings: &StudioSettings,
) -> anyhow::Result<FeatureOrchestrator> {
    Ok(FeatureOrchestrator::new(
        project.state.clone(),
        gemini(settings)?,
        Arc::new(TerminalProgress),
    ))
}

/// Returns whether the project changed.
fn report_outcome(outcome: FeatureOutcome) -> anyhow::Result<bool> {
    match outcome {
        FeatureOutcome::Applied => Ok(true),
        FeatureOutcome::Committed { cached } => {
            if cached {
                info!("Using cached variant");
            }
            Ok(true)
        }
        FeatureOutcome::RolledBack(err) => Err(err.into()),
        FeatureOutcome::AlreadyInFlight => {
            anyhow::bail!("a request for this feature is already running")
        }
    }
}

async fn cmd_list(project: &ActiveProject, json: bool) -> anyhow::Result<bool> {
    let state = project.state.read().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&*state)?);
        return Ok(false);
    }
    println!("Assets ({}):", state.assets.len());
    for asset in &state.assets {
        let variants: Vec<&str> = asset.variant_sources.keys().map(|k| k.label()).collect();
        println!(
            "  {}  {}  [{}]  variants: {}",
            asset.id,
            asset.display_name(),
            asset.keywords.join(", "),
            if variants.is_empty() {
                "-".to_string()
            } else {
                variants.join(", ")
            }
        );
    }
    println!("Storyboard ({}):", state.storyboard.len());
    for (position, item) in state.storyboard.items().iter().enumerate() {
        println!(
            "  {:>2}. {}  asset {}  {:.1}s{}",
            position,
            item.id,
            item.asset_id,
            item.duration_seconds,
            if item.audio_source.is_some() {
                "  +audio"
            } else {
                ""
            }
        );
    }
    Ok(false)
}

/// Planned FFmpeg invocation
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput {
    scenes: usize,
    total_duration: f64,
    skipped: Vec<String>,
    staged_files: Vec<String>,
    filter_complex: String,
    args: Vec<String>,
}

async fn cmd_plan(
    project: &ActiveProject,
    settings: &StudioSettings,
    json: bool,
) -> anyhow::Result<bool> {
    let snapshot = project.state.read().await.snapshot();
    check_scene_durations(&snapshot.storyboard).map_err(anyhow::Error::msg)?;
    let plan = ScenePlan::build(&snapshot.storyboard, &snapshot.assets);
    for warning in &plan.warnings {
        warn!("{}", warning);
    }
    if plan.is_empty() {
        anyhow::bail!("nothing to export: the storyboard has no renderable scenes");
    }

    let output = PlanOutput {
        scenes: plan.scenes.len(),
        total_duration: plan.total_duration(),
        skipped: plan.warnings.iter().map(|w| w.to_string()).collect(),
        staged_files: plan.staged_files(),
        filter_complex: build_filter_graph(&plan, &settings.export),
        args: build_export_args(&plan, &settings.export),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(false);
    }

    println!("{} scenes, {:.1}s total", output.scenes, output.total_duration);
    println!("staged files: {}", output.staged_files.join(" "));
    println!("filter_complex: {}", output.filter_complex);
    println!("ffmpeg {}", output.args.join(" "));
    Ok(false)
}

async fn cmd_export(
    project: &ActiveProject,
    settings: &StudioSettings,
    args: ExportArgs,
) -> anyhow::Result<bool> {
    let snapshot = project.state.read().await.snapshot();
    let engine = FFmpegEngine::new(settings.ffmpeg.binary());
    let mut exporter = StoryboardExporter::new(engine, settings.export.clone());

    let video = exporter
        .export_storyboard(&snapshot.storyboard, &snapshot.assets, &TerminalProgress)
        .await?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&video.file_name));
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out, &video.bytes)
        .with_context(|| format!("write video '{}'", out.display()))?;

    if !video.skipped_scenes.is_empty() {
        warn!("{} scene(s) were skipped", video.skipped_scenes.len());
    }
    eprintln!("wrote {} ({} bytes)", out.display(), video.bytes.len());
    Ok(false)
}

async fn cmd_import(project: &ActiveProject, args: ImportArgs) -> anyhow::Result<bool> {
    let mut assets = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let asset = import_image(file, args.keywords.clone())
            .await
            .with_context(|| format!("import '{}'", file.display()))?;
        assets.push(asset);
    }

    let mut state = project.state.write().await;
    let ids = state.add_assets(assets);
    for id in &ids {
        if args.add_to_storyboard {
            state.add_to_storyboard(id)?;
        }
        println!("{}", id);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_is_global() {
        let cli = Cli::try_parse_from(["storyreel", "plan", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.cmd, Command::Plan));

        let cli = Cli::try_parse_from(["storyreel", "list"]).unwrap();
        assert!(!cli.json);
    }

    #[test]
    fn test_plan_output_json() {
        let output = PlanOutput {
            scenes: 1,
            total_duration: 5.0,
            skipped: vec![],
            staged_files: vec!["img0.png".to_string()],
            filter_complex: "[v0][a0]concat=n=1:v=1:a=1[outv][outa]".to_string(),
            args: vec!["-hide_banner".to_string()],
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["totalDuration"], 5.0);
        assert_eq!(json["stagedFiles"][0], "img0.png");
        assert!(json["filterComplex"].as_str().unwrap().contains("concat=n=1"));
    }
}
