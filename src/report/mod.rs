//! Diagnostics — the append-only report sink lint passes write into.
//!
//! Formatting and CLI presentation live outside this crate; the sink just
//! accumulates entries in traversal order and owns the per-(node, check)
//! dedup set so one pass cannot suppress another's findings.

use rustc_hash::FxHashSet;
use std::sync::Arc;

use crate::ast::{Node, NodeId};
use crate::base::LineCol;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A diagnostic message with location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Identifier of the check that produced this entry.
    pub check: &'static str,
    /// Severity level.
    pub severity: Severity,
    /// Source position (0-indexed line/column).
    pub pos: LineCol,
    /// The diagnostic message.
    pub message: Arc<str>,
    /// The offending source line, when the parser supplied it.
    pub source_line: Option<Arc<str>>,
}

/// Collects diagnostics during an analysis run.
#[derive(Debug, Default)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
    reported: FxHashSet<(NodeId, &'static str)>,
}

impl Report {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at an explicit position, bypassing node dedup.
    pub fn add(
        &mut self,
        check: &'static str,
        severity: Severity,
        pos: LineCol,
        message: impl Into<Arc<str>>,
    ) {
        self.diagnostics.push(Diagnostic {
            check,
            severity,
            pos,
            message: message.into(),
            source_line: None,
        });
    }

    /// Append a warning attached to a node.
    ///
    /// Returns `false` without recording anything when this (node, check)
    /// pair was already reported.
    pub fn warn_node(
        &mut self,
        check: &'static str,
        node: &Node,
        message: impl Into<Arc<str>>,
    ) -> bool {
        if !self.reported.insert((node.id(), check)) {
            return false;
        }
        self.diagnostics.push(Diagnostic {
            check,
            severity: Severity::Warning,
            pos: node.pos(),
            message: message.into(),
            source_line: node.source_line().map(Arc::from),
        });
        true
    }

    /// Has this (node, check) pair been reported already?
    pub fn already_reported(&self, node: &Node, check: &'static str) -> bool {
        self.reported.contains(&(node.id(), check))
    }

    /// All entries, in emission (traversal) order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Check if the report is empty.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all entries, leaving the report empty but keeping the dedup set.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
