use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Media-processing task kind the user picks at the start of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    MergeAudioVideo,
    MergeAudioTracks,
    AudioToImage,
    ConvertFormat,
    LoopAudio,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::MergeAudioVideo,
        Operation::MergeAudioTracks,
        Operation::AudioToImage,
        Operation::ConvertFormat,
        Operation::LoopAudio,
    ];

    /// Name used on the wire and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::MergeAudioVideo => "merge_audio_video",
            Operation::MergeAudioTracks => "merge_audio_tracks",
            Operation::AudioToImage => "audio_to_image",
            Operation::ConvertFormat => "convert_format",
            Operation::LoopAudio => "loop_audio",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operation::MergeAudioVideo => "Merge audio into video",
            Operation::MergeAudioTracks => "Merge audio tracks",
            Operation::AudioToImage => "Audio + still image to video",
            Operation::ConvertFormat => "Convert format",
            Operation::LoopAudio => "Loop audio",
        }
    }

    /// Parses a wire name, accepting `-` in place of `_`.
    pub fn from_wire(name: &str) -> Option<Operation> {
        let normalized = name.trim().replace('-', "_");
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(&normalized))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation `{0}`")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::from_wire(s).ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Operation;

    #[test]
    fn wire_names_round_trip_and_accept_dashes() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_wire(op.as_str()), Some(op));
        }
        assert_eq!(
            Operation::from_wire("merge-audio-video"),
            Some(Operation::MergeAudioVideo)
        );
        assert_eq!(Operation::from_wire("transmogrify"), None);
    }
}
