//! Diagnostic consumers.
//!
//! The engine pushes every formatted diagnostic into a consumer. Consumers
//! decide what failure means; the engine itself never aborts.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Diagnostic;

/// Receives formatted diagnostics in emission order.
pub trait DiagnosticConsumer {
    fn handle_diagnostic(&mut self, diagnostic: Diagnostic);
}

/// Stores diagnostics for later inspection.
///
/// Cheap to clone; all clones share the same storage, so a test can keep
/// one handle while the engine owns another.
#[derive(Clone, Default)]
pub struct CollectingConsumer {
    storage: Rc<RefCell<Vec<Diagnostic>>>,
}

impl CollectingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.storage.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.storage.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.borrow().is_empty()
    }

    /// Messages only, for compact assertions.
    pub fn messages(&self) -> Vec<String> {
        self.storage
            .borrow()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }
}

impl DiagnosticConsumer for CollectingConsumer {
    fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.storage.borrow_mut().push(diagnostic);
    }
}

/// Discards everything.
#[derive(Default)]
pub struct SilentConsumer;

impl DiagnosticConsumer for SilentConsumer {
    fn handle_diagnostic(&mut self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiagId, Severity};
    use nyx_ir::SourceLocation;

    #[test]
    fn clones_share_storage() {
        let a = CollectingConsumer::new();
        let mut b = a.clone();
        b.handle_diagnostic(Diagnostic {
            id: DiagId::ErrExpectedIdentifier,
            severity: Severity::Error,
            message: "x".into(),
            location: SourceLocation::DUMMY,
        });
        assert_eq!(a.len(), 1);
        assert_eq!(a.messages(), vec!["x".to_string()]);
    }
}
