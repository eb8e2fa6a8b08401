//! Canonical text form of a [`ConfigModel`].
//!
//! Output is grouped by section in model order. Every emitted section is
//! followed by a blank line, and multi-line values are written as indented
//! continuation lines so that [`parse_overlay`](super::parser::parse_overlay)
//! reads back the same values.

use super::model::ConfigModel;
use crate::filter::KeyFilter;

/// Serialize every entry of `model`.
pub fn serialize(model: &ConfigModel) -> String {
    render(model, |_, _| true)
}

/// Serialize the entries of `model` that `filter` lets through.
pub fn serialize_filtered(model: &ConfigModel, filter: &KeyFilter) -> String {
    render(model, |section, key| filter.should_include(section, key))
}

fn render(model: &ConfigModel, keep: impl Fn(&str, &str) -> bool) -> String {
    let mut out = String::new();

    for section in model.sections() {
        let mut header_written = false;
        for entry in section.entries() {
            if !keep(section.name(), &entry.key) {
                continue;
            }
            if !header_written {
                out.push('[');
                out.push_str(section.name());
                out.push_str("]\n");
                header_written = true;
            }
            out.push_str(&entry.key);
            out.push_str(" = ");
            out.push_str(&entry.value.replace('\n', "\n  "));
            out.push('\n');
        }
        if header_written {
            out.push('\n');
        }
    }

    if out.is_empty() {
        out.push('\n');
    }
    out
}
