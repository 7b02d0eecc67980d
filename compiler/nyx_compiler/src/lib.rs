//! The Nyx front-end pipeline: source text to a typed, semantically
//! validated AST.
//!
//! Wiring, in dependency order: a [`SourceManager`] resolves the input,
//! the preprocessor lexes it, the two-phase parser drives Sema, and the
//! caller's [`AstConsumer`] observes each successful top-level parse and
//! finally the whole translation unit. The front-end is transient: nothing
//! is persisted between runs.

use std::rc::Rc;

use tracing::debug;

use nyx_diagnostic::{DiagnosticsEngine, SourceManager};
use nyx_ir::{AstContext, DeclId, SharedInterner};
use nyx_lexer::Preprocessor;
use nyx_parse::Parser;
use nyx_sema::Sema;

/// Downstream integration point.
///
/// `handle_top_level_decl` runs after each successful top-level parse;
/// returning `false` aborts the unit. `handle_translation_unit` runs once
/// after end of input, even for an empty unit.
pub trait AstConsumer {
    fn handle_top_level_decl(&mut self, decls: &[DeclId], context: &AstContext) -> bool {
        let _ = (decls, context);
        true
    }

    fn handle_translation_unit(&mut self, context: &AstContext);
}

/// A consumer that does nothing.
#[derive(Default)]
pub struct NullAstConsumer;

impl AstConsumer for NullAstConsumer {
    fn handle_translation_unit(&mut self, _context: &AstContext) {}
}

/// Everything the front-end produced for one translation unit.
pub struct CompileResult {
    pub context: AstContext,
    /// Top-level declarations in source order, phase-2 resolved.
    pub top_level: Vec<DeclId>,
    pub interner: SharedInterner,
}

/// Run the whole front-end over one in-memory source.
pub fn compile_source(
    uri: &str,
    consumer: &mut dyn AstConsumer,
    sources: &mut SourceManager,
    diag: Rc<DiagnosticsEngine>,
) -> CompileResult {
    let file = sources.file_id(uri);
    let text = sources.file_content(file).unwrap_or("").to_owned();
    debug!(uri, bytes = text.len(), "parsing translation unit");

    let interner = SharedInterner::new();
    let pp = Preprocessor::with_interner(file, &text, interner.clone(), Rc::clone(&diag));
    let sema = Sema::new(interner.clone(), diag);
    let mut parser = Parser::new(pp, sema);

    let mut top_level: Vec<DeclId> = Vec::new();
    let mut aborted = false;
    loop {
        let mut group = Vec::new();
        let done = parser.parse_top_level_decl(&mut group);
        if !group.is_empty() {
            if !consumer.handle_top_level_decl(&group, parser.sema().context()) {
                aborted = true;
                break;
            }
            top_level.append(&mut group);
        }
        if done {
            break;
        }
    }

    if !aborted {
        let mut produced = Vec::new();
        parser.divert_phase(&mut produced);
        if !produced.is_empty() {
            consumer.handle_top_level_decl(&produced, parser.sema().context());
        }
        top_level.append(&mut produced);
    }

    let top_level: Vec<DeclId> = top_level
        .iter()
        .map(|&decl| parser.resolved_decl_for(decl))
        .collect();

    let context = parser.into_sema().into_context();
    consumer.handle_translation_unit(&context);
    CompileResult {
        context,
        top_level,
        interner,
    }
}

/// Convenience entry: one in-memory file, no external source provider.
pub fn compile_text(
    uri: &str,
    text: &str,
    consumer: &mut dyn AstConsumer,
    diag: Rc<DiagnosticsEngine>,
) -> CompileResult {
    let mut sources = SourceManager::new();
    sources.add_memory_file(uri, text);
    compile_source(uri, consumer, &mut sources, diag)
}
