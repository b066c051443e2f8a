//! Inbound adapters that translate external requests into reconciler calls
//! while keeping framework details at the edge.
//!
//! The command-line adapter lives under [`cli`]; job-queue consumers are
//! expected to sit alongside it and reuse [`cli::LeadSyncCommands`].

pub mod cli;
