//! Static description of what each operation needs: input slots and options.
use crate::options::OptionValue;
use crate::Operation;

/// Media kind an input slot declares. The server does the real validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Image,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSlotSpec {
    /// Multipart field name sent to `/upload`.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: MediaKind,
    /// Whether the slot accepts more than one file.
    pub multiple: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Toggle {
        default: bool,
    },
    Choice {
        choices: &'static [&'static str],
        default: &'static str,
    },
    Integer {
        min: i64,
        max: i64,
        default: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionFieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: OptionKind,
}

impl OptionFieldSpec {
    pub fn default_value(&self) -> OptionValue {
        match self.kind {
            OptionKind::Toggle { default } => OptionValue::Bool(default),
            OptionKind::Choice { default, .. } => OptionValue::Text(default.to_string()),
            OptionKind::Integer { default, .. } => OptionValue::Number(default),
        }
    }
}

const AUDIO_FILE: InputSlotSpec = InputSlotSpec {
    name: "audio_file",
    label: "Audio file",
    kind: MediaKind::Audio,
    multiple: false,
};

const VIDEO_FILE: InputSlotSpec = InputSlotSpec {
    name: "video_file",
    label: "Video file",
    kind: MediaKind::Video,
    multiple: false,
};

const IMAGE_FILE: InputSlotSpec = InputSlotSpec {
    name: "image_file",
    label: "Image file",
    kind: MediaKind::Image,
    multiple: false,
};

const AUDIO_FILES: InputSlotSpec = InputSlotSpec {
    name: "audio_files",
    label: "Audio tracks",
    kind: MediaKind::Audio,
    multiple: true,
};

const MEDIA_FILE: InputSlotSpec = InputSlotSpec {
    name: "media_file",
    label: "Media file",
    kind: MediaKind::Any,
    multiple: false,
};

const LOOP_AUDIO_TOGGLE: OptionFieldSpec = OptionFieldSpec {
    name: "loop_audio",
    label: "Loop audio to match video duration",
    kind: OptionKind::Toggle { default: false },
};

const MIX_MODE: OptionFieldSpec = OptionFieldSpec {
    name: "mix_mode",
    label: "Mix mode",
    kind: OptionKind::Choice {
        choices: &["overlay", "concatenate"],
        default: "overlay",
    },
};

const TARGET_FORMAT: OptionFieldSpec = OptionFieldSpec {
    name: "target_format",
    label: "Target format",
    kind: OptionKind::Choice {
        choices: &["mp4", "mp3", "wav", "avi"],
        default: "mp4",
    },
};

const LOOP_DURATION: OptionFieldSpec = OptionFieldSpec {
    name: "duration",
    label: "Loop duration (seconds)",
    kind: OptionKind::Integer {
        min: 1,
        max: 3600,
        default: 60,
    },
};

/// Ordered input slots the operation requires.
pub fn slots_for(operation: Operation) -> &'static [InputSlotSpec] {
    match operation {
        Operation::MergeAudioVideo => &[AUDIO_FILE, VIDEO_FILE],
        Operation::MergeAudioTracks => &[AUDIO_FILES],
        Operation::AudioToImage => &[AUDIO_FILE, IMAGE_FILE],
        Operation::ConvertFormat => &[MEDIA_FILE],
        Operation::LoopAudio => &[AUDIO_FILE],
    }
}

/// Ordered option fields the operation exposes.
pub fn option_fields_for(operation: Operation) -> &'static [OptionFieldSpec] {
    match operation {
        Operation::MergeAudioVideo => &[LOOP_AUDIO_TOGGLE],
        Operation::MergeAudioTracks => &[MIX_MODE],
        Operation::AudioToImage => &[],
        Operation::ConvertFormat => &[TARGET_FORMAT],
        Operation::LoopAudio => &[LOOP_DURATION],
    }
}

/// Like [`slots_for`], keyed by wire name. Unknown names need no inputs.
pub fn slots_for_name(name: &str) -> &'static [InputSlotSpec] {
    Operation::from_wire(name).map(slots_for).unwrap_or(&[])
}

/// Like [`option_fields_for`], keyed by wire name. Unknown names have no options.
pub fn option_fields_for_name(name: &str) -> &'static [OptionFieldSpec] {
    Operation::from_wire(name)
        .map(option_fields_for)
        .unwrap_or(&[])
}

pub fn find_slot(operation: Operation, slot: &str) -> Option<&'static InputSlotSpec> {
    slots_for(operation).iter().find(|spec| spec.name == slot)
}

pub fn find_option_field(operation: Operation, name: &str) -> Option<&'static OptionFieldSpec> {
    option_fields_for(operation)
        .iter()
        .find(|field| field.name == name)
}
