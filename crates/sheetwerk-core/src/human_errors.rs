// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for HTTP clients.
//
// Every technical error is mapped to a plain message with a suggestion. The
// client shows `message` as-is; there are no machine-readable codes.

use serde::Serialize;

use crate::error::SheetwerkError;

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same request again might succeed.
    pub retriable: bool,
}

impl HumanError {
    fn new(message: impl Into<String>, suggestion: impl Into<String>, retriable: bool) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
        }
    }
}

/// Convert a `SheetwerkError` into a `HumanError` suitable for the client.
pub fn humanize_error(err: &SheetwerkError) -> HumanError {
    match err {
        // -- Request errors --
        SheetwerkError::InvalidRequest(detail) => HumanError::new(
            format!("The request was incomplete: {detail}"),
            "Choose the file again and resend it.",
            false,
        ),

        SheetwerkError::UnsupportedDocument(detail) => HumanError::new(
            "This type of document isn't supported.",
            format!("Save the file as .xlsx or .pdf and try again. (File type: {detail})"),
            false,
        ),

        // -- Spreadsheet input --
        SheetwerkError::Spreadsheet(_) | SheetwerkError::Xml { .. } => HumanError::new(
            "This spreadsheet couldn't be opened.",
            "The file may be damaged or saved in an older format. Open it in a spreadsheet app and save it again as .xlsx.",
            false,
        ),

        // -- Rendering / assembly --
        SheetwerkError::Render(_) | SheetwerkError::ImageError(_) => HumanError::new(
            "The spreadsheet couldn't be turned into pages.",
            "Try again. Very large sheets may need to be split into smaller ones first.",
            true,
        ),

        SheetwerkError::Font(_) => HumanError::new(
            "The service is missing the fonts it needs.",
            "This is a server problem; please try again later.",
            true,
        ),

        SheetwerkError::PdfError(_) => HumanError::new(
            "There's a problem with this PDF file.",
            "The file may be damaged. Check that it opens on your device, or try a different file.",
            false,
        ),

        // -- Storage --
        SheetwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError::new(
                    "The file couldn't be found.",
                    "It may have expired. Convert the document again.",
                    false,
                )
            } else {
                HumanError::new(
                    "There was a problem saving the result.",
                    "Try again. If this keeps happening, the server may be out of space.",
                    true,
                )
            }
        }

        SheetwerkError::Serialization(_) => HumanError::new(
            "The service had an internal data problem.",
            "Try again. If this keeps happening, please report it.",
            true,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_spreadsheet_is_not_retriable() {
        let err = SheetwerkError::Spreadsheet("invalid Zip archive".into());
        let human = humanize_error(&err);
        assert!(!human.retriable);
        assert!(human.message.contains("spreadsheet"));
    }

    #[test]
    fn xml_error_reads_like_spreadsheet_error() {
        let err = SheetwerkError::xml("xl/styles.xml", "unexpected EOF");
        let human = humanize_error(&err);
        assert_eq!(human.message, "This spreadsheet couldn't be opened.");
    }

    #[test]
    fn render_failure_is_retriable() {
        let human = humanize_error(&SheetwerkError::Render("codec".into()));
        assert!(human.retriable);
    }

    #[test]
    fn invalid_request_carries_detail() {
        let err = SheetwerkError::InvalidRequest("No file uploaded".into());
        let human = humanize_error(&err);
        assert!(human.message.contains("No file uploaded"));
    }

    #[test]
    fn missing_file_is_not_retriable() {
        let err = SheetwerkError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(!humanize_error(&err).retriable);
    }
}
