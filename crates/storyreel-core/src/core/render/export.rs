//! Storyboard export job.
//!
//! Drives a `TranscodeEngine` through
//! `Idle -> Initializing -> Staging -> GraphBuilding -> Executing -> Finalizing`,
//! then always through `CleaningUp` before settling in `Done` or `Failed`.
//! Every error is caught at the job boundary, reported once through the
//! progress sink, and the busy indicator is cleared exactly once.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{
    build_export_args, check_scene_durations, encoding_message, parse_elapsed_time, ExportSettings, MediaFetcher,
    ProgressSink, ScenePlan, SourceFetcher, TranscodeEngine,
};
use crate::core::assets::MediaAsset;
use crate::core::render::AssetResolutionWarning;
use crate::core::storyboard::StoryboardItem;

/// Log lines kept for error messages
const LOG_TAIL_LINES: usize = 12;

pub const EXPORT_MIME_TYPE: &str = "video/mp4";

// =============================================================================
// Errors
// =============================================================================

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Storyboard is empty. Add scenes before exporting.")]
    EmptyStoryboard,
    #[error("Failed to initialize the video engine: {0}")]
    EngineInitialization(String),
    #[error("Failed to prepare scene media: {0}")]
    Staging(String),
    #[error("Video encoding failed: {0}")]
    TranscodeExecution(String),
    #[error("Failed to read the exported video: {0}")]
    ReadBack(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

// =============================================================================
// Job state
// =============================================================================

/// Export job phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportPhase {
    Idle,
    Initializing,
    Staging,
    GraphBuilding,
    Executing,
    Finalizing,
    CleaningUp,
    Done,
    Failed,
}

impl ExportPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExportPhase::Done | ExportPhase::Failed)
    }

    /// Whether the job may move from `self` to `next`.
    pub fn can_transition_to(self, next: ExportPhase) -> bool {
        use ExportPhase::*;
        match (self, next) {
            (Idle, Initializing)
            | (Initializing, Staging)
            | (Staging, GraphBuilding)
            | (GraphBuilding, Executing)
            | (Executing, Finalizing)
            | (CleaningUp, Done) => true,
            (Initializing | Staging | GraphBuilding | Executing | Finalizing, CleaningUp) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Exported video returned to the caller
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedVideo {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Suggested download name
    pub file_name: String,
    /// Scenes skipped because their asset was missing
    pub skipped_scenes: Vec<AssetResolutionWarning>,
}

// =============================================================================
// Exporter
// =============================================================================

/// Runs storyboard exports on one engine instance.
///
/// The engine is loaded on the first export and reused afterwards. `&mut self`
/// keeps a single export in flight per instance.
pub struct StoryboardExporter<E, F = MediaFetcher> {
    engine: E,
    fetcher: F,
    settings: ExportSettings,
    engine_loaded: bool,
    phase: ExportPhase,
    history: Vec<ExportPhase>,
    failed_in: Option<ExportPhase>,
}

impl<E: TranscodeEngine> StoryboardExporter<E, MediaFetcher> {
    pub fn new(engine: E, settings: ExportSettings) -> Self {
        Self::with_fetcher(engine, MediaFetcher::new(), settings)
    }
}

impl<E: TranscodeEngine, F: SourceFetcher> StoryboardExporter<E, F> {
    pub fn with_fetcher(engine: E, fetcher: F, settings: ExportSettings) -> Self {
        Self {
            engine,
            fetcher,
            settings,
            engine_loaded: false,
            phase: ExportPhase::Idle,
            history: Vec::new(),
            failed_in: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Phase of the current or most recent export
    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    /// Phases visited by the most recent export, in order
    pub fn phase_history(&self) -> &[ExportPhase] {
        &self.history
    }

    /// Phase in which the most recent export failed
    pub fn failed_in(&self) -> Option<ExportPhase> {
        self.failed_in
    }

    fn enter(&mut self, next: ExportPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid export transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!("Export phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        self.history.push(next);
    }

    /// Exports `storyboard` to an MP4.
    ///
    /// `storyboard` and `assets` are a snapshot; the job never touches live
    /// studio state.
    pub async fn export_storyboard(
        &mut self,
        storyboard: &[StoryboardItem],
        assets: &[MediaAsset],
        sink: &dyn ProgressSink,
    ) -> ExportResult<ExportedVideo> {
        self.phase = ExportPhase::Idle;
        self.history.clear();
        self.failed_in = None;

        if storyboard.is_empty() {
            return Err(self.reject(ExportError::EmptyStoryboard, sink));
        }
        if let Err(message) = check_scene_durations(storyboard) {
            return Err(self.reject(ExportError::Staging(message), sink));
        }

        info!("Starting export of {} storyboard entries", storyboard.len());
        let mut cleanup_files = Vec::new();
        let outcome = self
            .run_job(storyboard, assets, sink, &mut cleanup_files)
            .await;

        if outcome.is_err() {
            self.failed_in = Some(self.phase);
        }
        self.enter(ExportPhase::CleaningUp);
        self.clean_up(&cleanup_files).await;

        match outcome {
            Ok(video) => {
                self.enter(ExportPhase::Done);
                info!(
                    "Export finished: {} bytes, {} scenes skipped",
                    video.bytes.len(),
                    video.skipped_scenes.len()
                );
                sink.report("Export complete.");
                sink.clear();
                Ok(video)
            }
            Err(err) => {
                self.enter(ExportPhase::Failed);
                error!("Export failed during {:?}: {}", self.failed_in, err);
                sink.fail(&err.to_string());
                sink.clear();
                Err(err)
            }
        }
    }

    /// Fails the export before any engine work.
    fn reject(&mut self, err: ExportError, sink: &dyn ProgressSink) -> ExportError {
        warn!("Export rejected: {}", err);
        self.failed_in = Some(ExportPhase::Idle);
        self.enter(ExportPhase::Failed);
        sink.fail(&err.to_string());
        sink.clear();
        err
    }

    async fn run_job(
        &mut self,
        storyboard: &[StoryboardItem],
        assets: &[MediaAsset],
        sink: &dyn ProgressSink,
        cleanup_files: &mut Vec<String>,
    ) -> ExportResult<ExportedVideo> {
        // Initializing
        self.enter(ExportPhase::Initializing);
        sink.report("Initializing video engine...");
        if !self.engine_loaded {
            self.engine
                .load()
                .await
                .map_err(|e| ExportError::EngineInitialization(e.to_string()))?;
            self.engine_loaded = true;
            info!("Video engine loaded");
        }

        // Staging
        self.enter(ExportPhase::Staging);
        let plan = ScenePlan::build(storyboard, assets);
        for warning in &plan.warnings {
            sink.warn(&warning.to_string());
        }
        if plan.is_empty() {
            return Err(ExportError::Staging(
                "none of the storyboard scenes reference an existing asset".to_string(),
            ));
        }

        let total = plan.scenes.len();
        for (i, scene) in plan.scenes.iter().enumerate() {
            sink.report(&format!("Preparing scene {} of {}...", i + 1, total));
            self.stage(&scene.image_source, &scene.image_file, cleanup_files)
                .await?;
            if let Some(audio) = &scene.audio {
                self.stage(&audio.source, &audio.file_name, cleanup_files)
                    .await?;
            }
        }

        // GraphBuilding
        self.enter(ExportPhase::GraphBuilding);
        sink.report("Building video timeline...");
        let args = build_export_args(&plan, &self.settings);
        debug!("FFmpeg args: {:?}", args);

        // Executing
        self.enter(ExportPhase::Executing);
        sink.report("Encoding video...");
        let output_file = self.settings.output_file.clone();
        cleanup_files.push(output_file.clone());

        let total_duration = plan.total_duration();
        let tail: Mutex<VecDeque<String>> = Mutex::new(VecDeque::with_capacity(LOG_TAIL_LINES));
        let on_log = |line: &str| {
            if let Some(elapsed) = parse_elapsed_time(line) {
                sink.report(&encoding_message(elapsed, total_duration));
                return;
            }
            let mut tail = tail.lock().unwrap_or_else(|e| e.into_inner());
            if tail.len() == LOG_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        };

        let code = self
            .engine
            .exec(&args, &on_log)
            .await
            .map_err(|e| ExportError::TranscodeExecution(e.to_string()))?;
        if code != 0 {
            let tail = tail.into_inner().unwrap_or_else(|e| e.into_inner());
            let detail = tail.back().cloned().unwrap_or_default();
            return Err(ExportError::TranscodeExecution(if detail.is_empty() {
                format!("FFmpeg exited with code {code}")
            } else {
                format!("FFmpeg exited with code {code}: {detail}")
            }));
        }

        // Finalizing
        self.enter(ExportPhase::Finalizing);
        sink.report("Finalizing video...");
        let bytes = self
            .engine
            .read_file(&output_file)
            .await
            .map_err(|e| ExportError::ReadBack(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ExportError::ReadBack(format!("{output_file} is empty")));
        }

        Ok(ExportedVideo {
            bytes,
            mime_type: EXPORT_MIME_TYPE.to_string(),
            file_name: self.settings.download_name.clone(),
            skipped_scenes: plan.warnings,
        })
    }

    async fn stage(
        &mut self,
        source: &str,
        file_name: &str,
        cleanup_files: &mut Vec<String>,
    ) -> ExportResult<()> {
        let bytes = self
            .fetcher
            .fetch(source)
            .await
            .map_err(|e| ExportError::Staging(format!("{file_name}: {e}")))?;
        cleanup_files.push(file_name.to_string());
        self.engine
            .write_file(file_name, &bytes)
            .await
            .map_err(|e| ExportError::Staging(format!("{file_name}: {e}")))?;
        debug!("Staged {} ({} bytes)", file_name, bytes.len());
        Ok(())
    }

    async fn clean_up(&mut self, files: &[String]) {
        for file in files {
            if let Err(e) = self.engine.delete_file(file).await {
                warn!("Failed to delete {} from engine working area: {}", file, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::data_uri;
    use crate::core::ffmpeg::{FFmpegError, FFmpegResult};
    use crate::core::render::{ChannelProgressSink, EngineLog, ProgressEvent};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::mpsc::UnboundedReceiver;

    #[derive(Clone, Copy, PartialEq)]
    enum ExecBehavior {
        Succeed,
        ExitCode(i32),
        SpawnError,
        NoOutput,
    }

    struct MockEngine {
        files: HashMap<String, Vec<u8>>,
        loads: usize,
        fail_load: bool,
        exec_calls: Vec<Vec<String>>,
        exec_behavior: ExecBehavior,
        written: Vec<String>,
        deleted: Vec<String>,
        log_lines: Vec<String>,
    }

    impl MockEngine {
        fn new(exec_behavior: ExecBehavior) -> Self {
            Self {
                files: HashMap::new(),
                loads: 0,
                fail_load: false,
                exec_calls: Vec::new(),
                exec_behavior,
                written: Vec::new(),
                deleted: Vec::new(),
                log_lines: vec![
                    "frame=10 fps=25 time=00:00:02.50 bitrate=N/A".to_string(),
                    "Conversion failed!".to_string(),
                ],
            }
        }
    }

    #[async_trait]
    impl TranscodeEngine for MockEngine {
        async fn load(&mut self) -> FFmpegResult<()> {
            self.loads += 1;
            if self.fail_load {
                return Err(FFmpegError::NotFound);
            }
            Ok(())
        }

        async fn write_file(&mut self, name: &str, bytes: &[u8]) -> FFmpegResult<()> {
            self.written.push(name.to_string());
            self.files.insert(name.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn exec(&mut self, args: &[String], on_log: EngineLog<'_>) -> FFmpegResult<i32> {
            self.exec_calls.push(args.to_vec());
            for line in &self.log_lines {
                on_log(line);
            }
            match self.exec_behavior {
                ExecBehavior::Succeed => {
                    self.files.insert("output.mp4".into(), b"mp4-bytes".to_vec());
                    Ok(0)
                }
                ExecBehavior::ExitCode(code) => Ok(code),
                ExecBehavior::SpawnError => Err(FFmpegError::ExecutionFailed("spawn".into())),
                ExecBehavior::NoOutput => Ok(0),
            }
        }

        async fn read_file(&mut self, name: &str) -> FFmpegResult<Vec<u8>> {
            self.files
                .get(name)
                .cloned()
                .ok_or_else(|| FFmpegError::OutputError(format!("{name} missing")))
        }

        async fn delete_file(&mut self, name: &str) -> FFmpegResult<()> {
            self.deleted.push(name.to_string());
            self.files
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| FFmpegError::OutputError(format!("{name} missing")))
        }
    }

    fn image(i: usize) -> String {
        data_uri::encode("image/png", format!("png-{i}").as_bytes())
    }

    fn storyboard(audio: &[bool]) -> (Vec<StoryboardItem>, Vec<MediaAsset>) {
        let mut items = Vec::new();
        let mut assets = Vec::new();
        for (i, has_audio) in audio.iter().enumerate() {
            let asset = MediaAsset::uploaded(image(i), "x.png", vec![]);
            let mut item = StoryboardItem::new(asset.id.clone());
            if *has_audio {
                item.audio_source = Some(data_uri::encode("audio/wav", b"RIFF"));
            }
            assets.push(asset);
            items.push(item);
        }
        (items, assets)
    }

    fn drain(rx: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn count(events: &[ProgressEvent], pred: impl Fn(&ProgressEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[tokio::test]
    async fn test_empty_storyboard_never_loads_engine() {
        let mut exporter =
            StoryboardExporter::new(MockEngine::new(ExecBehavior::Succeed), ExportSettings::default());
        let (sink, mut rx) = ChannelProgressSink::new();

        let result = exporter.export_storyboard(&[], &[], &sink).await;

        assert!(matches!(result, Err(ExportError::EmptyStoryboard)));
        assert_eq!(exporter.engine().loads, 0);
        assert!(exporter.engine().exec_calls.is_empty());
        assert_eq!(exporter.phase_history(), &[ExportPhase::Failed]);

        let events = drain(&mut rx);
        assert_eq!(count(&events, |e| matches!(e, ProgressEvent::Failed(_))), 1);
        assert_eq!(events.last(), Some(&ProgressEvent::Idle));
        assert_eq!(count(&events, |e| *e == ProgressEvent::Idle), 1);
    }

    #[tokio::test]
    async fn test_successful_export() {
        let mut exporter =
            StoryboardExporter::new(MockEngine::new(ExecBehavior::Succeed), ExportSettings::default());
        let (sink, mut rx) = ChannelProgressSink::new();
        let (items, assets) = storyboard(&[true, false]);

        let video = exporter
            .export_storyboard(&items, &assets, &sink)
            .await
            .unwrap();

        assert_eq!(video.bytes, b"mp4-bytes");
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(video.file_name, "ai_video_export.mp4");
        assert!(video.skipped_scenes.is_empty());

        let engine = exporter.engine();
        assert_eq!(engine.written, vec!["img0.png", "audio0.wav", "img1.png"]);
        assert_eq!(
            engine.deleted,
            vec!["img0.png", "audio0.wav", "img1.png", "output.mp4"]
        );
        assert!(engine.files.is_empty());

        use ExportPhase::*;
        assert_eq!(
            exporter.phase_history(),
            &[Initializing, Staging, GraphBuilding, Executing, Finalizing, CleaningUp, Done]
        );

        let events = drain(&mut rx);
        assert_eq!(count(&events, |e| matches!(e, ProgressEvent::Failed(_))), 0);
        assert_eq!(count(&events, |e| *e == ProgressEvent::Idle), 1);
        assert_eq!(
            count(&events, |e| matches!(e, ProgressEvent::Message(m) if m.starts_with("Preparing scene"))),
            2
        );
        assert!(events.contains(&ProgressEvent::Message(
            "Encoding video: 2.5s of 10.0s (25%)".to_string()
        )));
    }

    #[tokio::test]
    async fn test_engine_loaded_once_across_exports() {
        let mut exporter =
            StoryboardExporter::new(MockEngine::new(ExecBehavior::Succeed), ExportSettings::default());
        let (items, assets) = storyboard(&[false]);
        let sink = crate::core::render::NullProgress;

        exporter.export_storyboard(&items, &assets, &sink).await.unwrap();
        exporter.export_storyboard(&items, &assets, &sink).await.unwrap();
        assert_eq!(exporter.engine().loads, 1);
        assert_eq!(exporter.engine().exec_calls.len(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_runs_when_execute_fails() {
        let mut exporter = StoryboardExporter::new(
            MockEngine::new(ExecBehavior::ExitCode(1)),
            ExportSettings::default(),
        );
        let (sink, mut rx) = ChannelProgressSink::new();
        let (items, assets) = storyboard(&[false, true, false]);

        let err = exporter
            .export_storyboard(&items, &assets, &sink)
            .await
            .unwrap_err();

        match &err {
            ExportError::TranscodeExecution(msg) => {
                assert!(msg.contains("code 1"));
                assert!(msg.contains("Conversion failed!"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let engine = exporter.engine();
        for staged in ["img0.png", "img1.png", "audio1.wav", "img2.png"] {
            assert!(engine.deleted.contains(&staged.to_string()), "{staged} not deleted");
        }
        assert!(engine.files.is_empty());
        assert_eq!(exporter.failed_in(), Some(ExportPhase::Executing));
        assert_eq!(
            &exporter.phase_history()[exporter.phase_history().len() - 2..],
            &[ExportPhase::CleaningUp, ExportPhase::Failed]
        );

        let events = drain(&mut rx);
        assert_eq!(count(&events, |e| matches!(e, ProgressEvent::Failed(_))), 1);
        assert_eq!(count(&events, |e| *e == ProgressEvent::Idle), 1);
        assert!(!events.contains(&ProgressEvent::Message("Export complete.".into())));
    }

    #[tokio::test]
    async fn test_exec_error_maps_to_transcode_execution() {
        let mut exporter = StoryboardExporter::new(
            MockEngine::new(ExecBehavior::SpawnError),
            ExportSettings::default(),
        );
        let (items, assets) = storyboard(&[false]);
        let result = exporter
            .export_storyboard(&items, &assets, &crate::core::render::NullProgress)
            .await;
        assert!(matches!(result, Err(ExportError::TranscodeExecution(_))));
        assert!(exporter.engine().files.is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_is_read_back_error() {
        let mut exporter = StoryboardExporter::new(
            MockEngine::new(ExecBehavior::NoOutput),
            ExportSettings::default(),
        );
        let (items, assets) = storyboard(&[false]);
        let result = exporter
            .export_storyboard(&items, &assets, &crate::core::render::NullProgress)
            .await;
        assert!(matches!(result, Err(ExportError::ReadBack(_))));
        assert_eq!(exporter.failed_in(), Some(ExportPhase::Finalizing));
    }

    #[tokio::test]
    async fn test_load_failure() {
        let mut engine = MockEngine::new(ExecBehavior::Succeed);
        engine.fail_load = true;
        let mut exporter = StoryboardExporter::new(engine, ExportSettings::default());
        let (items, assets) = storyboard(&[false]);

        let result = exporter
            .export_storyboard(&items, &assets, &crate::core::render::NullProgress)
            .await;
        assert!(matches!(result, Err(ExportError::EngineInitialization(_))));
        assert!(exporter.engine().written.is_empty());
        assert_eq!(
            exporter.phase_history(),
            &[ExportPhase::Initializing, ExportPhase::CleaningUp, ExportPhase::Failed]
        );
    }

    #[tokio::test]
    async fn test_staging_failure_cleans_written_files() {
        let mut exporter =
            StoryboardExporter::new(MockEngine::new(ExecBehavior::Succeed), ExportSettings::default());
        let (items, mut assets) = storyboard(&[false, false]);
        assets[1].base_source = "data:image/png;base64,!!!".into();

        let result = exporter
            .export_storyboard(&items, &assets, &crate::core::render::NullProgress)
            .await;
        assert!(matches!(result, Err(ExportError::Staging(_))));
        assert_eq!(exporter.engine().written, vec!["img0.png"]);
        assert_eq!(exporter.engine().deleted, vec!["img0.png"]);
        assert!(exporter.engine().exec_calls.is_empty());
    }

    #[tokio::test]
    async fn test_missing_asset_warns_and_continues() {
        let mut exporter =
            StoryboardExporter::new(MockEngine::new(ExecBehavior::Succeed), ExportSettings::default());
        let (sink, mut rx) = ChannelProgressSink::new();
        let (mut items, assets) = storyboard(&[false, false, false]);
        items[1].asset_id = "deleted-asset".into();

        let video = exporter
            .export_storyboard(&items, &assets, &sink)
            .await
            .unwrap();

        assert_eq!(video.skipped_scenes.len(), 1);
        assert_eq!(exporter.engine().written, vec!["img0.png", "img2.png"]);
        let graph_arg = exporter.engine().exec_calls[0]
            .iter()
            .find(|a| a.contains("concat="))
            .cloned()
            .unwrap();
        assert!(graph_arg.contains("concat=n=2:v=1:a=1"));

        let events = drain(&mut rx);
        assert_eq!(count(&events, |e| matches!(e, ProgressEvent::Warning(_))), 1);
        assert_eq!(count(&events, |e| matches!(e, ProgressEvent::Failed(_))), 0);
    }

    #[tokio::test]
    async fn test_all_assets_missing_fails_in_staging() {
        let mut exporter =
            StoryboardExporter::new(MockEngine::new(ExecBehavior::Succeed), ExportSettings::default());
        let items = vec![StoryboardItem::new("gone")];
        let result = exporter
            .export_storyboard(&items, &[], &crate::core::render::NullProgress)
            .await;
        assert!(matches!(result, Err(ExportError::Staging(_))));
        assert!(exporter.engine().exec_calls.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_duration_rejected_before_engine_work() {
        let mut exporter =
            StoryboardExporter::new(MockEngine::new(ExecBehavior::Succeed), ExportSettings::default());
        let (mut items, assets) = storyboard(&[false, false]);
        items[1].duration_seconds = -3.0;
        let (sink, mut rx) = ChannelProgressSink::new();

        let result = exporter.export_storyboard(&items, &assets, &sink).await;

        match result {
            Err(ExportError::Staging(message)) => assert!(message.contains("scene 2"), "{message}"),
            other => panic!("expected a staging error, got {other:?}"),
        }
        assert_eq!(exporter.engine().loads, 0);
        assert!(exporter.engine().exec_calls.is_empty());
        assert_eq!(exporter.phase_history(), &[ExportPhase::Failed]);
        assert_eq!(exporter.failed_in(), Some(ExportPhase::Idle));

        let events = drain(&mut rx);
        assert_eq!(count(&events, |e| matches!(e, ProgressEvent::Failed(_))), 1);
        assert_eq!(events.last(), Some(&ProgressEvent::Idle));
    }

    #[test]
    fn test_phase_transitions() {
        use ExportPhase::*;
        assert!(Idle.can_transition_to(Initializing));
        assert!(Executing.can_transition_to(CleaningUp));
        assert!(CleaningUp.can_transition_to(Done));
        for phase in [Idle, Initializing, Staging, GraphBuilding, Executing, Finalizing, CleaningUp] {
            assert!(phase.can_transition_to(Failed), "{phase:?}");
        }
        assert!(!Done.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Initializing));
        assert!(!Staging.can_transition_to(Done));
    }
}
