//! HTML wrappers used by preview surfaces.

use super::device::{PreviewDevice, Zoom};

/// Sandbox flags for rendered documents: scripts run, but the document gets
/// an opaque origin and cannot reach the host's state or storage.
pub const PREVIEW_SANDBOX: &str = "allow-scripts";

/// Escapes text for use inside a double-quoted HTML attribute.
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wraps a generated document in a standalone page that renders it inside a
/// sandboxed iframe sized for `device` and scaled by `zoom`.
pub fn isolated_document(html: &str, device: PreviewDevice, zoom: Zoom) -> String {
    let frame_style = match device.viewport() {
        Some((width, height)) => format!(
            "width:{width}px;height:{height}px;border:8px solid #000;border-radius:40px;"
        ),
        None => "width:100%;height:100vh;border:none;".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Sitecraft Preview</title></head>
<body style="margin:0;background-color:#f0f2f5;display:flex;align-items:center;justify-content:center;">
<div style="transform:scale({zoom});transform-origin:center center;">
<iframe title="Website Preview" sandbox="{sandbox}" style="{frame_style}background:#fff;" srcdoc="{srcdoc}"></iframe>
</div>
</body>
</html>
"#,
        zoom = zoom.factor(),
        sandbox = PREVIEW_SANDBOX,
        frame_style = frame_style,
        srcdoc = escape_attribute(html),
    )
}
