//! Core review model: corpus, evaluation store, navigation, export.

pub mod corpus;
mod error;
pub mod export;
pub mod form;
pub mod key;
pub mod labels;
pub mod navigator;
pub mod screen;
pub mod session;
pub mod store;

pub use corpus::{Corpus, DialogueId, DialogueItem};
pub use error::CoreError;
pub use export::ExportReport;
pub use form::FormState;
pub use labels::{LABEL_CATALOG, LabelKind, LabelSummary};
pub use navigator::Navigator;
pub use session::ReviewSession;
pub use store::{
    DEFAULT_IMPORTANCE, Entry, EvaluationStore, Field, Judgment, JudgmentCounts, Value,
};
