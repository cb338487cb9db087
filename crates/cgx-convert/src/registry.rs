//! Write-once map from source terminals to the network element ends built for them.
//!
//! Builders register every terminal that produces an element end. Later passes
//! (tap changer regulation, state overlay, operational limits) resolve source
//! terminals through the registry instead of re-deriving which element a
//! terminal ended up on.

use std::collections::BTreeMap;

use cgx_core::{ConversionError, ConversionResult, TerminalRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTerminal {
    /// Topological node the terminal is attached to
    pub node: String,
    pub terminal: TerminalRef,
}

#[derive(Debug, Default)]
pub struct TerminalRegistry {
    entries: BTreeMap<String, RegisteredTerminal>,
}

impl TerminalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a source terminal with a network element end.
    ///
    /// A second registration of the same terminal is an error, even when it
    /// would record the same element end.
    pub fn register(
        &mut self,
        source_terminal: &str,
        node: &str,
        terminal: TerminalRef,
    ) -> ConversionResult<()> {
        if let Some(existing) = self.entries.get(source_terminal) {
            return Err(ConversionError::DuplicateTerminal {
                terminal: source_terminal.to_string(),
                first: existing.terminal.element.clone(),
                second: terminal.element,
            });
        }
        self.entries.insert(
            source_terminal.to_string(),
            RegisteredTerminal {
                node: node.to_string(),
                terminal,
            },
        );
        Ok(())
    }

    pub fn get(&self, source_terminal: &str) -> Option<&RegisteredTerminal> {
        self.entries.get(source_terminal)
    }

    pub fn terminal(&self, source_terminal: &str) -> Option<&TerminalRef> {
        self.entries.get(source_terminal).map(|e| &e.terminal)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered terminals in source terminal id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredTerminal)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }
}
