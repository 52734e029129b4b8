//! Sans-IO core of the autolink engine.
//!
//! Watches text typed into an editor and turns completed words into
//! `[[wikilinks]]` to other documents, matching by title or alias prefix.
//! Hosts feed text changes, keys and vault events into an [`AutoLinker`]
//! and mirror the edits it makes.

pub mod buffer;
pub mod config;
pub mod debounce;
pub mod disambiguation;
pub mod edit;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod link_parser;
pub mod resolver;
pub mod suggest;
pub mod title_index;
pub mod undo;
pub mod vault;

pub use buffer::{LineBuffer, Position, TextBuffer};
pub use config::{LinkMode, ModeName, Settings};
pub use engine::{AutoLinker, InputOutcome, TextChangeOutcome};
pub use error::{AutolinkError, Result};
pub use resolver::Candidate;
pub use suggest::{
    EventOrigin, HeadlessHost, Key, KeyContext, PointerAction, SessionHost, SessionView,
};
pub use vault::{Document, DocumentSet, ScopeMode, VaultEvent};
