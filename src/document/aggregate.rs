//! Document-level text built from per-block results.
//!
//! Rules, in block order:
//!
//! | Block | Recognized text      | Contributes        |
//! |-------|----------------------|--------------------|
//! | Text  | non-empty `t`        | `t`                |
//! | Text  | empty or none        | `""` (placeholder) |
//! | Math  | non-empty `t`        | `$$t$$`            |
//! | Math  | empty or none        | nothing            |
//!
//! Contributions are joined with a blank line.

use crate::document::block::{BlockKind, ContentBlock};

pub const MATH_DELIMITER: &str = "$$";
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Combine every block's recognized text into one document string.
pub fn aggregate_text(blocks: &[ContentBlock]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(blocks.len());

    for block in blocks {
        match (block.kind, block.recognized_text.as_deref()) {
            (BlockKind::Text, Some(text)) if !text.is_empty() => parts.push(text.to_string()),
            (BlockKind::Text, _) => parts.push(String::new()),
            (BlockKind::Math, Some(latex)) if !latex.is_empty() => {
                parts.push(format!("{MATH_DELIMITER}{latex}{MATH_DELIMITER}"))
            }
            (BlockKind::Math, _) => {}
        }
    }

    parts.join(BLOCK_SEPARATOR)
}
