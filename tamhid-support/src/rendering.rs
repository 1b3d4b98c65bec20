//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format type descriptors and definition-name
//! lists in error output and `Display` impls.

/// Shortens a fully qualified type path for display.
///
/// # Examples
/// ```
/// use tamhid_support::rendering::shorten_type_path;
///
/// let short = shorten_type_path("tamhid_processing::config::ConfigurationClassProcessor");
/// assert_eq!(short, "ConfigurationClassProcessor");
///
/// let short = shorten_type_path("alloc::sync::Arc<dyn my_app::traits::EventSink>");
/// assert_eq!(short, "Arc<dyn EventSink>");
/// ```
pub fn shorten_type_path(full_path: &str) -> String {
    // Keep only the final segment of every `::` path, including
    // paths nested inside generic arguments.
    let mut result = String::with_capacity(full_path.len());
    let mut segment_start = 0;
    let mut last_separator: Option<usize> = None;

    let bytes = full_path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b':' if i + 1 < bytes.len() && bytes[i + 1] == b':' => {
                last_separator = Some(i);
                i += 2;
                continue;
            }
            b'<' | b'>' | b',' | b' ' => {
                let from = last_separator.map_or(segment_start, |sep| sep + 2);
                result.push_str(&full_path[from..i]);
                result.push(bytes[i] as char);
                segment_start = i + 1;
                last_separator = None;
            }
            _ => {}
        }
        i += 1;
    }

    let from = last_separator.map_or(segment_start, |sep| sep + 2);
    result.push_str(&full_path[from..]);
    result
}

/// Renders a list of definition names as a single readable string.
///
/// Used for depends-on lists and registration summaries.
///
/// # Examples
/// ```
/// use tamhid_support::rendering::render_name_list;
///
/// let names = vec!["cache", "dataSource", "migrations"];
/// assert_eq!(render_name_list(&names), "cache, dataSource, migrations");
/// ```
pub fn render_name_list(names: &[impl AsRef<str>]) -> String {
    names
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}
