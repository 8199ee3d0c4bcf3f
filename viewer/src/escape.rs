use pdl::Scalar;
use serde_json::Value;

/// Shown for absent and empty values.
pub const PLACEHOLDER: &str = "☐";

/// Substituted for every line break.
pub const LINE_BREAK: &str = "<br>";

/// Escape text for display. Empty text becomes [`PLACEHOLDER`].
pub fn htmlize_str(text: &str) -> String {
    if text.is_empty() {
        return PLACEHOLDER.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str(LINE_BREAK),
            c => out.push(c),
        }
    }
    out
}

/// Escape any value. Non-text values are escaped through their compact JSON text.
pub fn htmlize(value: &Value) -> String {
    match value {
        Value::Null => PLACEHOLDER.to_string(),
        Value::String(text) => htmlize_str(text),
        other => htmlize_str(&other.to_string()),
    }
}

pub fn htmlize_opt(value: Option<&Value>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), htmlize)
}

pub fn htmlize_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Text(text) => htmlize_str(text),
        Scalar::Number(number) => htmlize_str(&number.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_and_empty_share_the_placeholder() {
        assert_eq!(htmlize(&Value::Null), PLACEHOLDER);
        assert_eq!(htmlize_str(""), PLACEHOLDER);
        assert_eq!(htmlize_opt(None), PLACEHOLDER);
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            htmlize_str(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn line_breaks_become_markers() {
        assert_eq!(htmlize_str("one\ntwo\n"), "one<br>two<br>");
    }

    #[test]
    fn structures_use_their_json_text() {
        assert_eq!(htmlize(&json!({"a": [1, "b"]})), "{&quot;a&quot;:[1,&quot;b&quot;]}");
        assert_eq!(htmlize(&json!(42)), "42");
        assert_eq!(htmlize(&json!(true)), "true");
    }

    #[test]
    fn numbers_keep_their_text() {
        let scalar = Scalar::Number(serde_json::Number::from_f64(2.5).unwrap());
        assert_eq!(htmlize_scalar(&scalar), "2.5");
    }
}
