//! Builds a protein "semantic layer" from UniProt, STRING and OpenTargets.
//!
//! The pipeline fetches and decodes the three sources, normalizes each record
//! set, replaces the `clean_*` tables in a [`store::TableStore`], and derives
//! `semantic_layer` from what was stored. See [`app::App::run`].

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod fs_util;
pub mod normalize;
pub mod opentargets;
pub mod output;
pub mod schema;
pub mod semantic;
pub mod store;
pub mod string_db;
pub mod uniprot;
