//! Keeps a mod launcher's three documents in agreement: the mod registry, the
//! GUI presentation order and the enabled/load order.

pub mod backup;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod enabled_list;
pub mod engine;
pub mod merge;
pub mod order;
pub mod registry;
pub mod writer;
