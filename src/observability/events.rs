//! Observable events
//!
//! Events are explicit and typed. Each carries the severity it is logged at.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A model declaration was frozen
    ModelDeclared,
    /// A record was constructed
    RecordBuilt,
    /// A construction call failed
    RecordRejected,
    /// An undeclared input key was dropped under allow-unknown
    UnknownFieldDiscarded,
    /// A field was written after construction
    FieldWritten,
    /// A declaration source was loaded into a registry
    ModelsLoaded,
    /// A check run over an input stream finished
    CheckComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ModelDeclared => "MODEL_DECLARED",
            Event::RecordBuilt => "RECORD_BUILT",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::UnknownFieldDiscarded => "UNKNOWN_FIELD_DISCARDED",
            Event::FieldWritten => "FIELD_WRITTEN",
            Event::ModelsLoaded => "MODELS_LOADED",
            Event::CheckComplete => "CHECK_COMPLETE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::ModelDeclared | Event::RecordBuilt => Severity::Debug,
            Event::FieldWritten => Severity::Trace,
            Event::RecordRejected | Event::UnknownFieldDiscarded => Severity::Info,
            Event::ModelsLoaded | Event::CheckComplete => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
