//! Readable type names.
//!
//! [`std::any::type_name`] returns fully qualified paths (`alloc::string::String`,
//! `my_crate::shapes::Circle`). Descriptor names and diagnostics use the last path segment
//! instead, keeping generic arguments intact.

/// Strips the module path from a type name
///
/// Only the outermost path is removed, generic arguments are kept as they are. A leading
/// qualifier such as `&` is dropped together with the path.
///
/// # Examples
///
/// ```rust
/// use metascope::utils::trim_type_name;
///
/// assert_eq!(trim_type_name("alloc::string::String"), "String");
/// assert_eq!(trim_type_name("app::shapes::Circle"), "Circle");
/// assert_eq!(trim_type_name("alloc::vec::Vec<alloc::string::String>"), "Vec<alloc::string::String>");
/// assert_eq!(trim_type_name("f32"), "f32");
/// ```
#[must_use]
pub fn trim_type_name(full: &str) -> &str {
    let bytes = full.as_bytes();
    let mut depth = 0usize;
    let mut start = 0;

    for (position, byte) in bytes.iter().enumerate() {
        match byte {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' | b')' | b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(position + 1) == Some(&b':') => start = position + 2,
            _ => {}
        }
    }

    &full[start..]
}

/// Last path segment of `T`'s type name
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    trim_type_name(std::any::type_name::<T>())
}
