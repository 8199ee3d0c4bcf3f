use crate::config::ViewerConfig;
use crate::display::{DisplayNode, fragment_to_html};
use crate::escape::htmlize_str;

pub const DEFAULT_STYLESHEET: &str = "\
body{font-family:sans-serif;display:flex;gap:1em;margin:1em;}\
#trace{flex:2;}\
#code-panel{flex:1;position:sticky;top:1em;align-self:flex-start;}\
pre{display:inline;margin:0 0.2em;white-space:pre-wrap;}\
fieldset.block{border:1px solid #bbb;border-radius:4px;margin:0.3em 0;}\
.result-hidden{opacity:0.6;}\
.kind-model{border-color:#3b82f6;}\
.kind-code{border-color:#a855f7;}\
.kind-api{border-color:#14b8a6;}\
.kind-if{border-color:#f59e0b;}\
.kind-repeat,.kind-repeat-until,.kind-for{border-color:#22c55e;}\
.kind-call,.kind-function{border-color:#ec4899;}\
.kind-error{border-color:#ef4444;background:#fef2f2;}\
legend{font-weight:bold;}";

/// A complete HTML document: the rendered trace beside the code slot.
pub fn render_page(
    fragment: &[DisplayNode<'_>],
    code: Option<&str>,
    config: &ViewerConfig,
    css: &str,
) -> String {
    let code = code
        .map(|code| format!("<pre>{}</pre>", htmlize_str(code)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>
<html>
<head>
<meta charset=\"utf-8\">
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<div id=\"trace\">{trace}</div>
<div id=\"code-panel\"><div id=\"{slot}\">{code}</div></div>
</body>
</html>
",
        title = htmlize_str(&config.title),
        trace = fragment_to_html(fragment),
        slot = htmlize_str(&config.code_slot_id),
    )
}
