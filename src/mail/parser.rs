use crate::mail::{MailError, MailParser, ParsedMail};

/// Best-effort RFC 822 header scanner. Reads the header block (up to the
/// first blank line), unfolds continuation lines, and picks out Subject,
/// To and From. Anything it cannot find stays None.
pub struct HeaderParser;

impl HeaderParser {
    fn unfolded_headers(source: &str) -> Vec<String> {
        let mut headers: Vec<String> = Vec::new();
        for line in source.lines() {
            if line.trim().is_empty() {
                break;
            }
            if (line.starts_with(' ') || line.starts_with('\t'))
                && let Some(last) = headers.last_mut()
            {
                // Folded continuation of the previous header
                last.push(' ');
                last.push_str(line.trim());
            } else {
                headers.push(line.to_string());
            }
        }
        headers
    }

    fn header_value(headers: &[String], name: &str) -> Option<String> {
        headers.iter().find_map(|h| {
            let (field, value) = h.split_once(':')?;
            if field.trim().eq_ignore_ascii_case(name) {
                let value = value.trim();
                (!value.is_empty()).then(|| value.to_string())
            } else {
                None
            }
        })
    }
}

impl MailParser for HeaderParser {
    fn parse(&self, source: &str) -> Result<ParsedMail, MailError> {
        let headers = Self::unfolded_headers(source);
        Ok(ParsedMail {
            subject: Self::header_value(&headers, "Subject"),
            to: Self::header_value(&headers, "To"),
            from: Self::header_value(&headers, "From"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MailParser;

    #[test]
    fn picks_out_envelope_fields() {
        let source = "From: jan@example.com\r\nTo: team@example.com\r\nSubject: Rechnung Januar\r\n\r\nbody text\r\n";
        let parsed = HeaderParser.parse(source).unwrap();
        assert_eq!(parsed.from.as_deref(), Some("jan@example.com"));
        assert_eq!(parsed.to.as_deref(), Some("team@example.com"));
        assert_eq!(parsed.subject.as_deref(), Some("Rechnung Januar"));
    }

    #[test]
    fn unfolds_continuation_lines() {
        let source = "Subject: a very long\n subject line\n\nbody";
        let parsed = HeaderParser.parse(source).unwrap();
        assert_eq!(parsed.subject.as_deref(), Some("a very long subject line"));
    }

    #[test]
    fn missing_headers_stay_none() {
        let parsed = HeaderParser.parse("just a body, no headers\n").unwrap();
        assert!(parsed.subject.is_none());
        assert!(parsed.to.is_none());
        assert!(parsed.from.is_none());
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let parsed = HeaderParser.parse("subject: lower case\n\n").unwrap();
        assert_eq!(parsed.subject.as_deref(), Some("lower case"));
    }

    #[test]
    fn body_lines_are_not_headers() {
        let source = "Subject: real\n\nFrom: not-a-header-in-the-body\n";
        let parsed = HeaderParser.parse(source).unwrap();
        assert!(parsed.from.is_none());
    }
}
