//! Marker codec for free-text notes.
//!
//! A notes field carries human-authored prose plus zero or more bracketed
//! markers of the form `[key:value]`, appended after the prose and separated
//! by a blank line. Other tooling scans for the exact marker text, so the
//! persisted format is fixed: `key` is one of the closed set below, `value`
//! is any `]`-free string, trimmed.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKey {
    /// Cockpit board assignment carried on a task
    AssignBoard,
    /// Protocol-level message id of an imported mail
    EmailId,
    /// Mailbox-scoped uid fallback of an imported mail
    EmailUid,
    /// Meeting date carried on a board
    MeetingDate,
}

impl MarkerKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKey::AssignBoard => "assign-board",
            MarkerKey::EmailId => "email-id",
            MarkerKey::EmailUid => "email-uid",
            MarkerKey::MeetingDate => "meeting-date",
        }
    }

    fn prefix(&self) -> String {
        format!("[{}:", self.as_str())
    }
}

/// Renders the exact marker substring for a key/value pair. `]` cannot
/// appear inside a value and is dropped, whatever the caller passes in.
pub fn marker(key: MarkerKey, value: &str) -> String {
    format!("[{}:{}]", key.as_str(), value.trim().replace(']', ""))
}

/// Result of [`extract`]: the prose with the key's marker removed, and the
/// marker's value if one was present.
pub struct Extracted {
    pub clean: String,
    pub value: Option<String>,
}

/// Removes the last complete `[key:...]` marker from `raw`, splicing the
/// text before and after it back together. Returns None if no complete
/// marker for the key exists (an unterminated `[key:` is left untouched).
fn strip_once(raw: &str, key: MarkerKey) -> Option<(String, String)> {
    let prefix = key.prefix();
    let start = raw.rfind(&prefix)?;
    let value_start = start + prefix.len();
    let value_end = value_start + raw[value_start..].find(']')?;

    let value = raw[value_start..value_end].trim().to_string();
    let before = raw[..start].trim_end();
    let after = raw[value_end + 1..].trim_start();

    let clean = if after.is_empty() {
        before.to_string()
    } else if before.is_empty() {
        after.to_string()
    } else {
        format!("{before}\n\n{after}")
    };

    Some((clean, value))
}

/// Decodes the value of `key` out of a notes field.
///
/// Fail-soft: a marker without a closing `]` is treated as plain prose and
/// the text comes back unmodified with no value. Markers of other keys are
/// left in place, so independent keys decode order-independently.
pub fn extract(raw: &str, key: MarkerKey) -> Extracted {
    match strip_once(raw, key) {
        Some((clean, value)) => Extracted {
            clean,
            value: if value.is_empty() { None } else { Some(value) },
        },
        None => Extracted {
            clean: raw.to_string(),
            value: None,
        },
    }
}

/// Encodes `value` into a notes field under `key`.
///
/// Any existing marker for the key is removed first, so repeated calls
/// never accumulate duplicates. With no value the prose comes back alone,
/// trimmed; an empty result becomes None so the field can be stored as
/// absent. `]` cannot appear inside a value and is dropped from it.
pub fn attach(text: &str, key: MarkerKey, value: Option<&str>) -> Option<String> {
    let mut base = text.to_string();
    while let Some((clean, _)) = strip_once(&base, key) {
        base = clean;
    }
    let base = base.trim();

    let value = value.map(|v| v.trim().replace(']', "")).filter(|v| !v.is_empty());
    match value {
        None => {
            if base.is_empty() {
                None
            } else {
                Some(base.to_string())
            }
        }
        Some(value) => {
            let marker = marker(key, &value);
            if base.is_empty() {
                Some(marker)
            } else {
                Some(format!("{base}\n\n{marker}"))
            }
        }
    }
}

/// Convenience for optional fields: treats None as empty prose.
pub fn attach_opt(text: Option<&str>, key: MarkerKey, value: Option<&str>) -> Option<String> {
    attach(text.unwrap_or(""), key, value)
}

/// Convenience for optional fields: treats None as empty prose.
pub fn extract_opt(raw: Option<&str>, key: MarkerKey) -> Extracted {
    extract(raw.unwrap_or(""), key)
}
