//! High-level operations that span the whole journal.
//!
//! Day-to-day reads and writes go through [`crate::journal::Journal`]; the
//! operations here move the journal in and out of the store as a whole.

pub mod transfer;

pub use transfer::{
    export_all, import_all, import_file, write_export, ExportedDocument, ImportOutcome,
};
