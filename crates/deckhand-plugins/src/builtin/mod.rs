//! Plugins shipped with deckhand.

pub mod slack;
pub mod trace;

use crate::PluginEntry;

/// Every built-in plugin, in load order.
pub static CATALOG: &[PluginEntry] = &[
    PluginEntry {
        descriptor: &slack::DESCRIPTOR,
        build: slack::build,
    },
    PluginEntry {
        descriptor: &trace::DESCRIPTOR,
        build: trace::build,
    },
];

pub fn catalog() -> &'static [PluginEntry] {
    CATALOG
}
