//! Plain-text exposition encoding.
//!
//! Renders the `# HELP` / `# TYPE` header and `name{labels} value` sample
//! lines instruments emit into a scrape buffer. Label strings arrive
//! pre-rendered; this module only decides the punctuation around them.

use std::fmt::Write;

/// Appends the two comment lines that precede an instrument's samples.
pub(crate) fn write_header(buf: &mut String, name: &str, description: &str, kind: &str) {
    let _ = writeln!(buf, "# HELP {name} {description}");
    let _ = writeln!(buf, "# TYPE {name} {kind}");
}

/// Appends one `name{labels} value` sample line.
///
/// `parent_labels` come from the caller of the scrape and precede the
/// series' own labels. The braces are omitted entirely when both label
/// strings are empty.
pub(crate) fn write_sample(
    buf: &mut String,
    name: &str,
    parent_labels: &str,
    own_labels: &str,
    value: f64,
) {
    buf.push_str(name);
    if !parent_labels.is_empty() || !own_labels.is_empty() {
        buf.push('{');
        buf.push_str(parent_labels);
        if !parent_labels.is_empty() && !own_labels.is_empty() {
            buf.push(',');
        }
        buf.push_str(own_labels);
        buf.push('}');
    }
    buf.push(' ');
    buf.push_str(&format_value(value));
    buf.push('\n');
}

/// Formats a sample value at `f32` precision, shortest round-trip form.
///
/// Narrowing happens before the non-finite checks, so finite values beyond
/// `f32` range render as the infinities.
fn format_value(value: f64) -> String {
    let value = value as f32;
    if value.is_nan() {
        "NaN".to_owned()
    } else if value == f32::INFINITY {
        "+Inf".to_owned()
    } else if value == f32::NEG_INFINITY {
        "-Inf".to_owned()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lines() {
        let mut buf = String::new();
        write_header(&mut buf, "algod_peers", "connected peers", "gauge");
        assert_eq!(
            buf,
            "# HELP algod_peers connected peers\n# TYPE algod_peers gauge\n"
        );
    }

    #[test]
    fn header_keeps_help_line_for_empty_description() {
        let mut buf = String::new();
        write_header(&mut buf, "algod_peers", "", "gauge");
        assert_eq!(buf, "# HELP algod_peers \n# TYPE algod_peers gauge\n");
    }

    #[test]
    fn sample_braces_follow_the_label_strings() {
        let cases = vec![
            ("", "", "algod_peers 7\n"),
            ("", r#"dir="in""#, "algod_peers{dir=\"in\"} 7\n"),
            (r#"host="n1""#, "", "algod_peers{host=\"n1\"} 7\n"),
            (
                r#"host="n1""#,
                r#"dir="in""#,
                "algod_peers{host=\"n1\",dir=\"in\"} 7\n",
            ),
        ];
        for (parent, own, want) in cases {
            let mut buf = String::new();
            write_sample(&mut buf, "algod_peers", parent, own, 7.0);
            assert_eq!(buf, want);
        }
    }

    #[test]
    fn value_formatting() {
        let tests = vec![
            (7.0, "7"),
            (2.5, "2.5"),
            (-1.5, "-1.5"),
            (0.0, "0"),
            (1e300, "+Inf"),
            (-1e300, "-Inf"),
            (f64::INFINITY, "+Inf"),
            (f64::NEG_INFINITY, "-Inf"),
            (f64::NAN, "NaN"),
        ];
        for (value, want) in tests {
            assert_eq!(want, format_value(value));
        }
    }
}
