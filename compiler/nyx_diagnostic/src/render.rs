//! Plain-text rendering of diagnostics.
//!
//! A diagnostic carries a severity, a formatted message, and a source
//! location; rendering recovers the file, line and column through the
//! source manager: `uri:line:col: severity: message`.

use crate::{Diagnostic, Severity, SourceManager};

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Note => "note",
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Fatal => "fatal error",
    }
}

/// Render one diagnostic as a single line.
///
/// Diagnostics at synthesized locations render without the position
/// prefix.
pub fn render_diagnostic(diagnostic: &Diagnostic, sources: &mut SourceManager) -> String {
    let label = severity_label(diagnostic.severity);
    let position = sources
        .uri(diagnostic.location.file)
        .map(str::to_owned)
        .zip(sources.line_col(diagnostic.location));
    match position {
        Some((uri, (line, column))) => {
            format!("{uri}:{line}:{column}: {label}: {}", diagnostic.message)
        }
        None => format!("{label}: {}", diagnostic.message),
    }
}

/// Render a batch in emission order, one line each.
pub fn render_all(diagnostics: &[Diagnostic], sources: &mut SourceManager) -> Vec<String> {
    diagnostics
        .iter()
        .map(|diagnostic| render_diagnostic(diagnostic, sources))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagId;
    use nyx_ir::SourceLocation;

    #[test]
    fn renders_with_position() {
        let mut sources = SourceManager::new();
        let file = sources.add_memory_file("demo.nyx", "def x;\ndef y;\n");
        let diagnostic = Diagnostic {
            id: DiagId::ErrExpectedIdentifier,
            severity: Severity::Error,
            message: "expected an identifier".to_owned(),
            location: SourceLocation::new(file, 7),
        };
        assert_eq!(
            render_diagnostic(&diagnostic, &mut sources),
            "demo.nyx:2:1: error: expected an identifier"
        );
    }

    #[test]
    fn renders_dummy_location_without_position() {
        let mut sources = SourceManager::new();
        let diagnostic = Diagnostic {
            id: DiagId::ErrUnexpectedEof,
            severity: Severity::Fatal,
            message: "unexpected end of file".to_owned(),
            location: SourceLocation::DUMMY,
        };
        assert_eq!(
            render_diagnostic(&diagnostic, &mut sources),
            "fatal error: unexpected end of file"
        );
    }

    #[test]
    fn batch_rendering_preserves_order() {
        let mut sources = SourceManager::new();
        let file = sources.add_memory_file("a.nyx", "x");
        let first = Diagnostic {
            id: DiagId::ErrExpectedIdentifier,
            severity: Severity::Warning,
            message: "first".to_owned(),
            location: SourceLocation::new(file, 0),
        };
        let second = Diagnostic {
            id: DiagId::ErrExpectedIdentifier,
            severity: Severity::Note,
            message: "second".to_owned(),
            location: SourceLocation::new(file, 0),
        };
        let rendered = render_all(&[first, second], &mut sources);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].contains("warning: first"));
        assert!(rendered[1].contains("note: second"));
    }
}
