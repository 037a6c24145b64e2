//! crm-import library - Bulk import pipeline
//!
//! Three sequential stages over a delimited contact source:
//! parse (CSV to normalized records), import (fixed-size batches with
//! duplicate-skipping), and validate (integrity checks producing a durable
//! report). Row and batch errors accumulate in counters; only an unreadable
//! source or unreachable storage aborts a run.

pub mod importer;
pub mod parser;
pub mod types;
pub mod validator;
