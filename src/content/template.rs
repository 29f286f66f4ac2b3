//! Removal of templating-engine escape markers from raw bodies.

const RAW_OPEN: &str = "{% raw %}";
const RAW_CLOSE: &str = "{% endraw %}";

/// Removes all `{% raw %}` / `{% endraw %}` markers, leaving the enclosed
/// content untouched. Idempotent.
pub fn strip_template_syntax(text: &str) -> String {
    text.replace(RAW_OPEN, "").replace(RAW_CLOSE, "")
}
