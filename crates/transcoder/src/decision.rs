use serde::{Deserialize, Serialize};

use rustplex_core::MediaAlternative;

/// What the local player can handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCaps {
    pub containers: Vec<String>,
    pub video_codecs: Vec<String>,
    pub audio_codecs: Vec<String>,
    pub max_bitrate_kbps: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl Default for ClientCaps {
    fn default() -> Self {
        Self {
            containers: vec![
                "mp4".into(),
                "mkv".into(),
                "matroska".into(),
                "mov".into(),
                "avi".into(),
                "mpegts".into(),
                "mp3".into(),
                "flac".into(),
            ],
            video_codecs: vec![
                "h264".into(),
                "hevc".into(),
                "mpeg2video".into(),
                "mpeg4".into(),
                "vc1".into(),
            ],
            audio_codecs: vec![
                "aac".into(),
                "mp3".into(),
                "ac3".into(),
                "eac3".into(),
                "dca".into(),
                "flac".into(),
            ],
            max_bitrate_kbps: None,
            max_width: None,
            max_height: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayMethod {
    DirectPlay,
    Remux,
    Transcode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TranscodeReason {
    ContainerNotSupported,
    VideoCodecNotSupported,
    AudioCodecNotSupported,
    BitrateTooHigh,
    ResolutionTooHigh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayDecision {
    pub method: PlayMethod,
    pub reasons: Vec<TranscodeReason>,
    pub transcode_video: bool,
    pub transcode_audio: bool,
}

/// Decide how to play one media alternative given the player's capabilities.
///
/// Attributes the server did not report are assumed playable.
pub fn decide(media: &MediaAlternative, caps: &ClientCaps) -> PlayDecision {
    let mut reasons = Vec::new();
    let mut transcode_video = false;
    let mut transcode_audio = false;

    if let Some(ref container) = media.container {
        let container_ok = caps
            .containers
            .iter()
            .any(|c| container.eq_ignore_ascii_case(c));
        if !container_ok {
            reasons.push(TranscodeReason::ContainerNotSupported);
        }
    }

    if let Some(ref codec) = media.video_codec {
        let codec_ok = caps
            .video_codecs
            .iter()
            .any(|c| c.eq_ignore_ascii_case(codec));
        if !codec_ok {
            reasons.push(TranscodeReason::VideoCodecNotSupported);
            transcode_video = true;
        }
    }

    if matches!((caps.max_bitrate_kbps, media.bitrate_kbps), (Some(max), Some(br)) if br > max) {
        reasons.push(TranscodeReason::BitrateTooHigh);
        transcode_video = true;
    }

    let too_wide = matches!((caps.max_width, media.width), (Some(max), Some(w)) if w > max);
    let too_tall = matches!((caps.max_height, media.height), (Some(max), Some(h)) if h > max);
    if too_wide || too_tall {
        reasons.push(TranscodeReason::ResolutionTooHigh);
        transcode_video = true;
    }

    if let Some(ref codec) = media.audio_codec {
        let codec_ok = caps
            .audio_codecs
            .iter()
            .any(|c| c.eq_ignore_ascii_case(codec));
        if !codec_ok {
            reasons.push(TranscodeReason::AudioCodecNotSupported);
            transcode_audio = true;
        }
    }

    let method = if reasons.is_empty() {
        PlayMethod::DirectPlay
    } else if !transcode_video && !transcode_audio {
        // Only container mismatch -> remux
        PlayMethod::Remux
    } else {
        PlayMethod::Transcode
    };

    PlayDecision {
        method,
        reasons,
        transcode_video,
        transcode_audio,
    }
}
