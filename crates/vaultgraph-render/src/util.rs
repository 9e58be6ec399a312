use std::fmt::Write as _;

/// Escapes text for use in XML element content and double-quoted attributes.
pub(crate) fn escape_xml_into(out: &mut String, text: &str) {
    let mut start = 0usize;
    for (i, b) in text.bytes().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            b'\n' => "&#10;",
            b'\r' => "&#13;",
            b'\t' => "&#9;",
            _ => continue,
        };
        out.push_str(&text[start..i]);
        out.push_str(esc);
        start = i + 1;
    }
    out.push_str(&text[start..]);
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_xml_into(&mut out, text);
    out
}

/// Number formatting for SVG/XML attributes: no `-0`, no float noise, integers without `.0`.
pub(crate) fn fmt_display(v: f64) -> FmtDisplay {
    FmtDisplay(v)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FmtDisplay(f64);

impl std::fmt::Display for FmtDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut v = self.0;
        if !v.is_finite() || v.abs() < 1e-9 {
            return f.write_str("0");
        }
        let nearest = v.round();
        if (v - nearest).abs() < 1e-6 {
            v = nearest;
        }
        if v == 0.0 {
            return f.write_str("0");
        }
        let mut s = String::new();
        let _ = write!(s, "{:.3}", v);
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        f.write_str(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_xml_handles_markup_and_quotes() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape_xml("plain"), "plain");
        assert_eq!(escape_xml("it's"), "it&#39;s");
    }

    #[test]
    fn escape_xml_keeps_attribute_whitespace() {
        assert_eq!(escape_xml("a\r\nb\tc"), "a&#13;&#10;b&#9;c");
    }

    #[test]
    fn fmt_display_trims_noise() {
        assert_eq!(fmt_display(100.0).to_string(), "100");
        assert_eq!(fmt_display(-0.0).to_string(), "0");
        assert_eq!(fmt_display(12.5).to_string(), "12.5");
        assert_eq!(fmt_display(1.0000001).to_string(), "1");
        assert_eq!(fmt_display(f64::NAN).to_string(), "0");
        assert_eq!(fmt_display(-42.25).to_string(), "-42.25");
    }
}
