use crate::prelude::*;

/// Attachments longer than this are cut, counting in characters.
pub const MAX_ATTACHMENT_CHARS: usize = 200_000;

/// File content shared with the assistant as extra context.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,

    /// Either `local upload` or the data path it was read from.
    pub source: String,

    /// Original size in bytes.
    pub size: usize,

    pub text: String,
    pub truncated: bool,
}

impl Attachment {
    pub fn new(name: impl Into<String>, source: impl Into<String>, raw: &str) -> Self {
        let (text, truncated) = truncate(raw);
        Self { name: name.into(), source: source.into(), size: raw.len(), text, truncated }
    }

    fn describe(&self, index: usize) -> String {
        format!(
            "[File {}] {}\nSource: {}\nSize: {}{}\nContent:\n{}",
            index + 1,
            self.name,
            self.source,
            format_bytes(self.size),
            if self.truncated { " (truncated)" } else { "" },
            self.text,
        )
    }
}

fn truncate(raw: &str) -> (String, bool) {
    match raw.char_indices().nth(MAX_ATTACHMENT_CHARS) {
        None => (raw.to_owned(), false),
        Some((end, _)) => (
            format!(
                "{}\n\n[content truncated: longer than {MAX_ATTACHMENT_CHARS} characters]",
                &raw[..end],
            ),
            true,
        ),
    }
}

/// Context block listing all the attachments, or [`None`] if there are none.
#[must_use]
pub fn build_context(attachments: &[Attachment]) -> Option<String> {
    if attachments.is_empty() {
        return None;
    }
    let blocks: Vec<_> =
        attachments.iter().enumerate().map(|(index, attachment)| attachment.describe(index)).collect();
    Some(blocks.join("\n\n"))
}

#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let kilobytes = bytes as f64 / 1024.0;
    if kilobytes < 1024.0 {
        format!("{kilobytes:.1} KB")
    } else {
        format!("{:.2} MB", kilobytes / 1024.0)
    }
}

/// Check a data-directory path entered by the user.
///
/// Backslashes count as separators. The path must start with `data/` and must not contain `..`.
pub fn validate_data_path(path: &str) -> Result<String> {
    let normalized = path.trim().replace('\\', "/");
    ensure!(!normalized.is_empty(), "the data path is empty");
    ensure!(
        normalized.starts_with("data/") && !normalized.contains(".."),
        "`{normalized}` must start with `data/` and must not contain `..`",
    );
    Ok(normalized)
}
