//! Variable name synthesis.
//!
//! Short names, long names and units are deterministic functions of the
//! parameter table and a variable's GRIB1 identification. Short names are
//! disambiguated within a group by numeric suffixes in encounter order.

use std::collections::HashMap;

use grib1_collection::VarDesc;

use crate::tables::ParameterTable;

/// Canonicalize a parameter description into a name token.
///
/// Punctuation is dropped, whitespace runs collapse to `_`, and only ASCII
/// letters, digits and `_` survive. A leading digit gets an `N` prefix so
/// the token is a valid identifier.
pub fn derive_from_description(description: &str) -> String {
    let mut out = String::with_capacity(description.len());
    let mut pending_sep = false;
    for ch in description.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() {
                pending_sep = true;
            }
            continue;
        }
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.push(ch);
        }
    }
    if out.is_empty() {
        return "VAR".to_string();
    }
    if out.as_bytes()[0].is_ascii_digit() {
        out.insert(0, 'N');
    }
    out
}

/// Synthesize the base short name for one variable, before disambiguation.
pub fn short_name(
    table: &dyn ParameterTable,
    center: i32,
    subcenter: i32,
    desc: &VarDesc,
) -> String {
    let mut name = match table.parameter(center, subcenter, desc.table_version, desc.parameter) {
        Some(param) => derive_from_description(&param.description),
        None => format!(
            "VAR{}-{}-{}-{}",
            center, subcenter, desc.table_version, desc.parameter
        ),
    };
    if let Some(code) = desc.level_type {
        name.push('_');
        name.push_str(&table.level_short_name(code));
    }
    if let Some(stat) = desc.intv_type.and_then(|i| table.stat_type(i)) {
        name.push('_');
        name.push_str(stat.abbrev());
    }
    name
}

/// Disambiguate short names within one group.
///
/// The first occurrence of a name keeps it; later occurrences get `_1`,
/// `_2`, ... in encounter order.
pub fn disambiguate(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let out = if *count == 0 {
                name.clone()
            } else {
                format!("{}_{}", name, *count)
            };
            *count += 1;
            out
        })
        .collect()
}

/// Synthesize the long name for one variable.
pub fn long_name(
    table: &dyn ParameterTable,
    center: i32,
    subcenter: i32,
    desc: &VarDesc,
) -> String {
    let mut out = String::new();
    if desc.probability_name.is_some() {
        out.push_str("Probability ");
    }
    match table.parameter(center, subcenter, desc.table_version, desc.parameter) {
        Some(param) => out.push_str(&param.description),
        None => out.push_str(&format!(
            "Unknown Parameter {}-{}-{}-{}",
            center, subcenter, desc.table_version, desc.parameter
        )),
    }
    if let Some(stat) = desc.intv_type.and_then(|i| table.stat_type(i)) {
        out.push_str(&format!(" ({})", stat.description()));
    }
    if let Some(code) = desc.level_type {
        out.push_str(&format!(" @ {}", table.level_short_name(code)));
        if desc.is_layer {
            out.push_str(" layer");
        }
    }
    out
}

/// Units string for one variable: the parameter's unit, or empty when the
/// parameter is unknown.
pub fn units(table: &dyn ParameterTable, center: i32, subcenter: i32, desc: &VarDesc) -> String {
    table
        .parameter(center, subcenter, desc.table_version, desc.parameter)
        .map(|p| p.unit)
        .unwrap_or_default()
}
