//! Recognition modes.

use serde::{Deserialize, Serialize};

/// What kind of content a session recognizes.
///
/// | Mode | Part type | Output content type     |
/// |------|-----------|-------------------------|
/// | Text | `Text`    | `text/plain`            |
/// | Math | `Math`    | `application/x-latex`   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecognitionMode {
    Text,
    Math,
}

impl RecognitionMode {
    pub const ALL: [RecognitionMode; 2] = [RecognitionMode::Text, RecognitionMode::Math];

    /// Human-readable label; also the stem of the session's package name.
    pub fn label(&self) -> &'static str {
        match self {
            RecognitionMode::Text => "Text Recognition",
            RecognitionMode::Math => "Math Recognition",
        }
    }

    /// Engine content-part type the session's editor is bound to.
    pub fn part_type(&self) -> &'static str {
        match self {
            RecognitionMode::Text => "Text",
            RecognitionMode::Math => "Math",
        }
    }

    /// Content type requested on export.  Doubles as the session cache key.
    pub fn mime_type(&self) -> &'static str {
        match self {
            RecognitionMode::Text => "text/plain",
            RecognitionMode::Math => "application/x-latex",
        }
    }
}

impl std::fmt::Display for RecognitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
