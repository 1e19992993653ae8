//! Scene plan and filter graph generation.
//!
//! The plan is built once per export and is the only source of FFmpeg input
//! indices: staging writes exactly the files it names and the filter graph
//! references exactly the inputs it numbers.

use std::fmt;

use tracing::warn;

use super::{resolve_image_source, ExportSettings};
use crate::core::assets::MediaAsset;
use crate::core::storyboard::{is_valid_duration, StoryboardItem};
use crate::core::{AssetId, ItemId, TimeSec};

/// Scene dropped from an export because its asset no longer exists
#[derive(Clone, Debug, PartialEq)]
pub struct AssetResolutionWarning {
    /// Storyboard position (zero-based)
    pub position: usize,
    pub item_id: ItemId,
    pub asset_id: AssetId,
}

impl fmt::Display for AssetResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scene {} skipped: asset {} not found",
            self.position + 1,
            self.asset_id
        )
    }
}

/// Audio input of a planned scene
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedAudio {
    pub source: String,
    pub file_name: String,
    pub input_index: usize,
}

/// One scene that will be staged and encoded
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedScene {
    /// Storyboard position (zero-based); names files and stream labels
    pub position: usize,
    pub item_id: ItemId,
    pub duration: TimeSec,
    /// Resolved image reference (variant or base)
    pub image_source: String,
    pub image_file: String,
    pub image_input: usize,
    pub audio: Option<PlannedAudio>,
}

/// Ordered list of scenes to stage, with their input indices
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenePlan {
    pub scenes: Vec<PlannedScene>,
    pub warnings: Vec<AssetResolutionWarning>,
}

impl ScenePlan {
    /// Plans `storyboard` against `assets`, skipping entries whose asset is
    /// missing. Inputs are numbered sequentially: each scene's image, then
    /// its audio when present.
    pub fn build(storyboard: &[StoryboardItem], assets: &[MediaAsset]) -> Self {
        let mut plan = ScenePlan::default();
        let mut next_input = 0usize;

        for (position, item) in storyboard.iter().enumerate() {
            let Some(asset) = assets.iter().find(|a| a.id == item.asset_id) else {
                let warning = AssetResolutionWarning {
                    position,
                    item_id: item.id.clone(),
                    asset_id: item.asset_id.clone(),
                };
                warn!("{}", warning);
                plan.warnings.push(warning);
                continue;
            };

            let image_input = next_input;
            next_input += 1;

            let audio = item.audio_source.as_ref().map(|source| {
                let input_index = next_input;
                next_input += 1;
                PlannedAudio {
                    source: source.clone(),
                    file_name: audio_file_name(position),
                    input_index,
                }
            });

            plan.scenes.push(PlannedScene {
                position,
                item_id: item.id.clone(),
                duration: item.duration_seconds,
                image_source: resolve_image_source(item, asset).to_string(),
                image_file: image_file_name(position),
                image_input,
                audio,
            });
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn total_duration(&self) -> TimeSec {
        self.scenes.iter().map(|s| s.duration).sum()
    }

    /// Every file name staged for this plan, in staging order.
    pub fn staged_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        for scene in &self.scenes {
            files.push(scene.image_file.clone());
            if let Some(audio) = &scene.audio {
                files.push(audio.file_name.clone());
            }
        }
        files
    }
}

/// Fails on the first scene whose duration is not positive and finite.
pub fn check_scene_durations(storyboard: &[StoryboardItem]) -> Result<(), String> {
    match storyboard
        .iter()
        .enumerate()
        .find(|(_, item)| !is_valid_duration(item.duration_seconds))
    {
        Some((position, item)) => Err(format!(
            "scene {} has an invalid duration ({} seconds)",
            position + 1,
            item.duration_seconds
        )),
        None => Ok(()),
    }
}

pub fn image_file_name(position: usize) -> String {
    format!("img{position}.png")
}

pub fn audio_file_name(position: usize) -> String {
    format!("audio{position}.wav")
}

/// Builds the `-filter_complex` graph for `plan`.
///
/// Every scene contributes exactly one video and one audio stream: staged
/// audio is normalized and padded/trimmed to the scene, scenes without audio
/// get synthesized silence of the same length.
pub fn build_filter_graph(plan: &ScenePlan, settings: &ExportSettings) -> String {
    let (w, h) = (settings.width, settings.height);
    let mut chains = Vec::with_capacity(plan.scenes.len() * 2 + 1);
    let mut concat_inputs = String::new();

    for scene in &plan.scenes {
        let n = scene.position;
        let d = scene.duration;

        chains.push(format!(
            "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},\
             trim=duration={d},setpts=PTS-STARTPTS[v{n}]",
            input = scene.image_input,
            fps = settings.fps,
        ));

        match &scene.audio {
            Some(audio) => chains.push(format!(
                "[{input}:a]aresample={sr},aformat=sample_fmts=fltp:channel_layouts=stereo,\
                 apad,atrim=duration={d},asetpts=PTS-STARTPTS[a{n}]",
                input = audio.input_index,
                sr = settings.sample_rate,
            )),
            None => chains.push(format!(
                "anullsrc=channel_layout=stereo:sample_rate={sr},\
                 aformat=sample_fmts=fltp:channel_layouts=stereo,\
                 atrim=duration={d},asetpts=PTS-STARTPTS[a{n}]",
                sr = settings.sample_rate,
            )),
        }

        concat_inputs.push_str(&format!("[v{n}][a{n}]"));
    }

    chains.push(format!(
        "{concat_inputs}concat=n={}:v=1:a=1[outv][outa]",
        plan.scenes.len()
    ));
    chains.join(";")
}

/// Builds the full FFmpeg argument list for `plan`.
pub fn build_export_args(plan: &ScenePlan, settings: &ExportSettings) -> Vec<String> {
    let mut args: Vec<String> = vec!["-hide_banner".into()];

    for scene in &plan.scenes {
        args.extend([
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            settings.fps.to_string(),
            "-t".to_string(),
            scene.duration.to_string(),
            "-i".to_string(),
            scene.image_file.clone(),
        ]);
        if let Some(audio) = &scene.audio {
            args.extend(["-i".to_string(), audio.file_name.clone()]);
        }
    }

    args.extend([
        "-filter_complex".to_string(),
        build_filter_graph(plan, settings),
        "-map".to_string(),
        "[outv]".to_string(),
        "-map".to_string(),
        "[outa]".to_string(),
        "-c:v".to_string(),
        settings.video_codec.clone(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-pix_fmt".to_string(),
        settings.pixel_format.clone(),
        "-r".to_string(),
        settings.fps.to_string(),
        "-c:a".to_string(),
        settings.audio_codec.clone(),
        "-b:a".to_string(),
        settings.audio_bitrate.clone(),
        "-ar".to_string(),
        settings.sample_rate.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-y".to_string(),
        settings.output_file.clone(),
    ]);
    args
}
