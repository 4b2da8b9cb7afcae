//! Path component hygiene.

/// Make a collection or file name safe to use as a single path component.
///
/// Collection names come straight from the library and may contain path
/// separators; a name must never escape its directory level. Separators and
/// NUL are replaced, an empty name becomes `_`.
pub fn sanitize_component(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    name.chars().map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c }).collect()
}
