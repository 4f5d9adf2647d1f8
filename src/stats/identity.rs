use crate::corpus::Instrument;

/// Stable key for an instrument: `program_{program}_name_{name}`, with
/// `unknown` standing in for an empty name.
///
/// Two instruments sharing program and name get the same key; see
/// [`DuplicatePolicy`](super::DuplicatePolicy) for how result maps handle that.
pub fn make_id(inst: &Instrument) -> String {
    let name = if inst.name.is_empty() { "unknown" } else { inst.name.as_str() };
    format!("program_{}_name_{}", inst.program, name)
}
