use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::error::{FreddyError, Result};

use super::{MediaTools, StreamLayout};

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    check_tool("ffmpeg")
}

/// Check if FFprobe is installed and accessible.
pub fn check_ffprobe() -> Result<()> {
    check_tool("ffprobe")
}

fn check_tool(tool: &'static str) -> Result<()> {
    let output = StdCommand::new(tool).arg("-version").output().map_err(|e| {
        FreddyError::collaborator(
            tool,
            format!("{tool} not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"),
        )
    })?;

    if !output.status.success() {
        return Err(FreddyError::collaborator(tool, format!("{tool} check failed")));
    }

    debug!("{} is available", tool);
    Ok(())
}

/// Look of the phrase caption drawn on every clip.
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub frame_size: u32,
    pub font_size: u32,
    pub font_color: String,
    pub box_color: String,
    pub box_border: u32,
    pub top_margin: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            frame_size: 720,
            font_size: 24,
            font_color: "white".to_string(),
            box_color: "black@0.5".to_string(),
            box_border: 5,
            top_margin: 50,
        }
    }
}

impl OverlayStyle {
    /// Video filter chain: square scale, then a centered caption read from `text_file`.
    pub fn filter(&self, text_file: &Path) -> String {
        let size = self.frame_size;
        format!(
            "scale={size}:{size},setdar=1:1,drawtext=textfile={}:expansion=none:fontcolor={}:fontsize={}:box=1:boxcolor={}:boxborderw={}:x=(w-text_w)/2:y={}",
            escape_drawtext(&text_file.to_string_lossy()),
            self.font_color,
            self.font_size,
            self.box_color,
            self.box_border,
            self.top_margin
        )
    }
}

/// Escape a value for a filter option inside a `-vf` filtergraph.
///
/// The option parser and the graph parser each consume one level of escaping.
pub fn escape_drawtext(value: &str) -> String {
    let option = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `concat` filter graph over `count` inputs.
pub(crate) fn concat_filter(count: usize, with_audio: bool) -> String {
    let mut graph = String::new();
    for i in 0..count {
        if with_audio {
            graph.push_str(&format!("[{i}:v:0][{i}:a:0]"));
        } else {
            graph.push_str(&format!("[{i}:v:0]"));
        }
    }

    if with_audio {
        graph.push_str(&format!("concat=n={count}:v=1:a=1[outv][outa]"));
    } else {
        graph.push_str(&format!("concat=n={count}:v=1:a=0[outv]"));
    }
    graph
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"duration=(\d+(?:\.\d+)?)").expect("valid regex"))
}

/// Parse `ffprobe -show_format` output into whole seconds, rounded up.
pub(crate) fn parse_duration(output: &str) -> Result<u64> {
    let captures = duration_regex().captures(output).ok_or_else(|| {
        FreddyError::collaborator("ffprobe", "no duration in ffprobe output")
    })?;

    let secs: f64 = captures[1].parse().map_err(|e| {
        FreddyError::collaborator("ffprobe", format!("Failed to parse duration '{}': {e}", &captures[1]))
    })?;

    Ok(secs.ceil() as u64)
}

/// Parse `codec_type` lines from ffprobe.
pub(crate) fn parse_stream_layout(output: &str) -> StreamLayout {
    let mut layout = StreamLayout::default();
    for line in output.lines() {
        match line.trim().trim_end_matches(',') {
            "video" => layout.has_video = true,
            "audio" => layout.has_audio = true,
            _ => {}
        }
    }
    layout
}

/// [`MediaTools`] backed by the `ffmpeg` and `ffprobe` binaries.
pub struct FfmpegTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    style: OverlayStyle,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self::new(OverlayStyle::default())
    }
}

impl FfmpegTools {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            style,
        }
    }

    async fn run_ffmpeg(&self, args: Vec<OsString>, dest: &Path) -> Result<()> {
        debug!("Running ffmpeg {:?}", args);

        let output = Command::new(&self.ffmpeg)
            .args(["-y", "-v", "error"])
            .args(&args)
            .output()
            .await
            .map_err(|e| FreddyError::collaborator("ffmpeg", format!("Failed to run FFmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FreddyError::collaborator(
                "ffmpeg",
                format!("FFmpeg failed ({}): {}", output.status, stderr.trim()),
            ));
        }

        if !dest.exists() {
            return Err(FreddyError::collaborator(
                "ffmpeg",
                format!("Output file was not created: {}", dest.display()),
            ));
        }

        Ok(())
    }

    async fn run_ffprobe(&self, args: &[&str], input: &Path) -> Result<String> {
        if !input.exists() {
            return Err(FreddyError::FileNotFound(input.display().to_string()));
        }

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error"])
            .args(args)
            .arg(input)
            .output()
            .await
            .map_err(|e| FreddyError::collaborator("ffprobe", format!("Failed to run FFprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FreddyError::collaborator(
                "ffprobe",
                format!("FFprobe failed: {}", stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn input_args(inputs: &[PathBuf]) -> Vec<OsString> {
    let mut args = Vec::with_capacity(inputs.len() * 2);
    for input in inputs {
        args.push("-i".into());
        args.push(input.into());
    }
    args
}

#[async_trait]
impl MediaTools for FfmpegTools {
    async fn duration(&self, path: &Path) -> Result<u64> {
        let output = self.run_ffprobe(&["-show_format"], path).await?;
        let secs = parse_duration(&output)?;
        debug!("Duration of {}: {}s", path.display(), secs);
        Ok(secs)
    }

    async fn stream_layout(&self, path: &Path) -> Result<StreamLayout> {
        let output = self
            .run_ffprobe(&["-show_entries", "stream=codec_type", "-of", "csv=p=0"], path)
            .await?;
        Ok(parse_stream_layout(&output))
    }

    async fn overlay_text(&self, video: &Path, text: &str, dest: &Path) -> Result<()> {
        let text_file = dest.with_extension("txt");
        tokio::fs::write(&text_file, text).await?;

        let mut args: Vec<OsString> = vec!["-i".into(), video.into(), "-vf".into()];
        args.push(self.style.filter(&text_file).into());
        args.extend(["-an", "-pix_fmt", "yuv420p"].map(OsString::from));
        args.push(dest.into());

        self.run_ffmpeg(args, dest).await
    }

    async fn concat_video_only(&self, inputs: &[PathBuf], dest: &Path) -> Result<()> {
        let mut args = input_args(inputs);
        args.push("-filter_complex".into());
        args.push(concat_filter(inputs.len(), false).into());
        args.extend(["-map", "[outv]", "-an", "-pix_fmt", "yuv420p"].map(OsString::from));
        args.push(dest.into());

        self.run_ffmpeg(args, dest).await
    }

    async fn merge(&self, video: &Path, audio: &Path, dest: &Path) -> Result<()> {
        let mut args: Vec<OsString> = vec!["-i".into(), video.into(), "-i".into(), audio.into()];
        args.extend(
            ["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-shortest"]
                .map(OsString::from),
        );
        args.push(dest.into());

        self.run_ffmpeg(args, dest).await
    }

    async fn concat_av(&self, inputs: &[PathBuf], dest: &Path) -> Result<()> {
        let mut args = input_args(inputs);
        args.push("-filter_complex".into());
        args.push(concat_filter(inputs.len(), true).into());
        args.extend(["-map", "[outv]", "-map", "[outa]", "-pix_fmt", "yuv420p"].map(OsString::from));
        args.push(dest.into());

        self.run_ffmpeg(args, dest).await
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
