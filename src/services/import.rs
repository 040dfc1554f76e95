use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::MailConfig,
    mail::{MailError, MailParser, MailboxClient},
    models::{store::Store, task::Task},
    notes::{self, MarkerKey},
    storage::{Storage, StorageError},
};

/// Work cap per run, to keep a single scheduled invocation bounded.
const MAX_MESSAGES_PER_RUN: usize = 50;

/// Title used when a message has no usable subject.
const NO_SUBJECT: &str = "(no subject)";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Mail import board '{0}' not found")]
    BoardNotFound(String),

    #[error("Mail import column '{0}' not found")]
    ColumnNotFound(String),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub processed: u32,
    pub created: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Converts unseen mailbox messages into tasks on the configured board.
///
/// Idempotent across runs: every created task carries an `[email-id:...]`
/// (or `[email-uid:...]`) marker in its notes, and a message whose marker
/// already exists on the board is skipped and marked seen instead of being
/// created again. A missing board/column or a connection failure aborts the
/// whole run; a message that fails to parse is counted and left unread so a
/// later run retries it. The folder lock and the connection are released on
/// every exit path. Concurrent runs are not supported; the scheduler must
/// serialize invocations.
pub fn run_import(
    store: &mut Store,
    storage: &impl Storage,
    config: &MailConfig,
    client: &mut impl MailboxClient,
    parser: &impl MailParser,
) -> Result<ImportSummary, ImportError> {
    let board_id = store
        .find_board_by_name(&config.board_name)
        .map(|b| b.id)
        .ok_or_else(|| ImportError::BoardNotFound(config.board_name.clone()))?;
    let column_id = store
        .find_column_by_name(board_id, &config.column_name)
        .map(|c| c.id)
        .ok_or_else(|| ImportError::ColumnNotFound(config.column_name.clone()))?;

    client.connect()?;
    if let Err(e) = client.lock_folder(&config.folder) {
        client.logout();
        return Err(e.into());
    }

    let result = import_locked(store, storage, board_id, column_id, client, parser);

    client.release_folder();
    client.logout();

    match &result {
        Ok(summary) => log::info!(
            "mail import done: processed={} created={} skipped={} errors={}",
            summary.processed,
            summary.created,
            summary.skipped,
            summary.errors
        ),
        Err(e) => log::warn!("mail import aborted: {e}"),
    }
    result
}

fn import_locked(
    store: &mut Store,
    storage: &impl Storage,
    board_id: Uuid,
    column_id: Uuid,
    client: &mut impl MailboxClient,
    parser: &impl MailParser,
) -> Result<ImportSummary, ImportError> {
    let mut summary = ImportSummary::default();

    let uids = client.search_unseen()?;
    let start = uids.len().saturating_sub(MAX_MESSAGES_PER_RUN);

    for &uid in &uids[start..] {
        summary.processed += 1;

        let message = match client.fetch(uid) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("fetch of message {uid} failed: {e}");
                summary.errors += 1;
                continue;
            }
        };

        // Stable external identifier: prefer the protocol-level message id,
        // fall back to the mailbox-scoped uid.
        let marker = match &message.message_id {
            Some(id) => notes::marker(MarkerKey::EmailId, id),
            None => notes::marker(MarkerKey::EmailUid, &uid.to_string()),
        };

        if store.find_task_with_marker(board_id, &marker).is_some() {
            summary.skipped += 1;
            client.mark_seen(uid)?;
            continue;
        }

        let parsed = match parser.parse(&message.source) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Left unread so the next run retries it.
                log::warn!("message {uid} could not be parsed: {e}");
                summary.errors += 1;
                continue;
            }
        };

        let title = parsed
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_SUBJECT)
            .to_string();

        let mut notes_parts: Vec<String> = Vec::new();
        if let Some(to) = &parsed.to {
            notes_parts.push(format!("To: {to}"));
        }
        if let Some(from) = &parsed.from {
            notes_parts.push(format!("From: {from}"));
        }
        notes_parts.push(String::new());
        notes_parts.push(marker);
        let task_notes = notes_parts.join("\n").trim().to_string();

        let now = jiff::Timestamp::now();
        let task = Task {
            id: Uuid::new_v4(),
            board_id,
            column_id,
            title,
            notes: Some(task_notes),
            position: store.max_task_position(column_id) + 1,
            created_at: now,
            updated_at: now,
            ..Task::default()
        };
        store.add_task(task);
        storage.save(store)?;

        client.mark_seen(uid)?;
        summary.created += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::mail::{FetchedMessage, ParsedMail};
    use crate::models::{board::Board, column::Column};
    use crate::storage::testing::NullStorage;

    struct StubMessage {
        uid: u32,
        message_id: Option<String>,
        source: String,
        seen: bool,
    }

    #[derive(Default)]
    struct StubMailbox {
        messages: Vec<StubMessage>,
        fail_connect: bool,
        fail_search: bool,
        connected: bool,
        locked: bool,
        released: bool,
        logged_out: bool,
    }

    impl MailboxClient for StubMailbox {
        fn connect(&mut self) -> Result<(), MailError> {
            if self.fail_connect {
                return Err(MailError::Connect(String::from("refused")));
            }
            self.connected = true;
            Ok(())
        }

        fn lock_folder(&mut self, _folder: &str) -> Result<(), MailError> {
            self.locked = true;
            Ok(())
        }

        fn search_unseen(&mut self) -> Result<Vec<u32>, MailError> {
            if self.fail_search {
                return Err(MailError::Folder(String::from("gone")));
            }
            Ok(self.messages.iter().filter(|m| !m.seen).map(|m| m.uid).collect())
        }

        fn fetch(&mut self, uid: u32) -> Result<FetchedMessage, MailError> {
            let message = self
                .messages
                .iter()
                .find(|m| m.uid == uid)
                .ok_or(MailError::Fetch(uid))?;
            Ok(FetchedMessage {
                uid: message.uid,
                message_id: message.message_id.clone(),
                source: message.source.clone(),
            })
        }

        fn mark_seen(&mut self, uid: u32) -> Result<(), MailError> {
            if let Some(message) = self.messages.iter_mut().find(|m| m.uid == uid) {
                message.seen = true;
            }
            Ok(())
        }

        fn release_folder(&mut self) {
            self.released = true;
        }

        fn logout(&mut self) {
            self.logged_out = true;
        }
    }

    struct StubParser;

    impl MailParser for StubParser {
        fn parse(&self, source: &str) -> Result<ParsedMail, MailError> {
            if source == "unparseable" {
                return Err(MailError::Parse(String::from("broken MIME")));
            }
            Ok(ParsedMail {
                subject: Some(source.to_string()).filter(|s| !s.is_empty()),
                to: Some(String::from("team@example.com")),
                from: Some(String::from("jan@example.com")),
            })
        }
    }

    fn config() -> MailConfig {
        MailConfig {
            spool_path: PathBuf::new(),
            folder: String::from("INBOX"),
            board_name: String::from("Mail"),
            column_name: String::from("Inbox"),
            cron_secret: None,
        }
    }

    fn store_with_mail_board() -> Store {
        let mut store = Store::default();
        let board = Board {
            id: Uuid::new_v4(),
            name: String::from("Mail"),
            ..Board::default()
        };
        let board_id = board.id;
        store.add_board(board);
        store.add_column(Column {
            id: Uuid::new_v4(),
            board_id,
            name: String::from("Inbox"),
            ..Column::default()
        });
        store
    }

    fn message(uid: u32, message_id: Option<&str>, source: &str) -> StubMessage {
        StubMessage {
            uid,
            message_id: message_id.map(String::from),
            source: source.to_string(),
            seen: false,
        }
    }

    #[test]
    fn second_run_over_the_same_message_creates_nothing() {
        let mut store = store_with_mail_board();

        let mut first_run = StubMailbox {
            messages: vec![message(7, Some("abc123"), "Rechnung Januar")],
            ..StubMailbox::default()
        };
        let summary =
            run_import(&mut store, &NullStorage, &config(), &mut first_run, &StubParser).unwrap();
        assert_eq!((summary.created, summary.skipped), (1, 0));

        let created: Vec<_> = store.tasks.values().collect();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].title, "Rechnung Januar");
        assert!(created[0].notes.as_deref().unwrap().contains("[email-id:abc123]"));
        assert!(first_run.messages[0].seen);

        // Same message shows up unread again (e.g. flag rollback).
        let mut second_run = StubMailbox {
            messages: vec![message(7, Some("abc123"), "Rechnung Januar")],
            ..StubMailbox::default()
        };
        let summary =
            run_import(&mut store, &NullStorage, &config(), &mut second_run, &StubParser).unwrap();
        assert_eq!((summary.created, summary.skipped), (0, 1));
        assert_eq!(store.tasks.len(), 1);
        assert!(second_run.messages[0].seen, "duplicate is still marked seen");
    }

    #[test]
    fn bracket_in_message_id_still_yields_a_wellformed_marker() {
        let mut store = store_with_mail_board();
        let mut mailbox = StubMailbox {
            messages: vec![message(5, Some("odd]id@example"), "Bracket subject")],
            ..StubMailbox::default()
        };
        run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser).unwrap();

        let notes = store.tasks.values().next().unwrap().notes.clone().unwrap();
        assert!(notes.contains("[email-id:oddid@example]"));
        assert!(!notes.contains("]id"));

        // Dedup keys on the sanitized marker, so reruns still skip.
        let mut rerun = StubMailbox {
            messages: vec![message(5, Some("odd]id@example"), "Bracket subject")],
            ..StubMailbox::default()
        };
        let summary =
            run_import(&mut store, &NullStorage, &config(), &mut rerun, &StubParser).unwrap();
        assert_eq!((summary.created, summary.skipped), (0, 1));
    }

    #[test]
    fn uid_marker_is_used_when_message_id_is_absent() {
        let mut store = store_with_mail_board();
        let mut mailbox = StubMailbox {
            messages: vec![message(42, None, "no id")],
            ..StubMailbox::default()
        };
        run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser).unwrap();

        let task = store.tasks.values().next().unwrap();
        assert!(task.notes.as_deref().unwrap().contains("[email-uid:42]"));
    }

    #[test]
    fn empty_subject_gets_a_placeholder_title() {
        let mut store = store_with_mail_board();
        let mut mailbox = StubMailbox {
            messages: vec![message(1, Some("m1"), "")],
            ..StubMailbox::default()
        };
        run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser).unwrap();
        assert_eq!(store.tasks.values().next().unwrap().title, "(no subject)");
    }

    #[test]
    fn parse_failure_is_counted_and_leaves_the_message_unread() {
        let mut store = store_with_mail_board();
        let mut mailbox = StubMailbox {
            messages: vec![
                message(1, Some("bad"), "unparseable"),
                message(2, Some("good"), "Fine subject"),
            ],
            ..StubMailbox::default()
        };
        let summary =
            run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser).unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.created, 1);
        assert!(!mailbox.messages[0].seen, "failed message is retried later");
        assert!(mailbox.messages[1].seen);
    }

    #[test]
    fn imported_tasks_append_to_the_end_of_the_column() {
        let mut store = store_with_mail_board();
        let mut mailbox = StubMailbox {
            messages: vec![message(1, Some("m1"), "first"), message(2, Some("m2"), "second")],
            ..StubMailbox::default()
        };
        run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser).unwrap();

        let board_id = store.find_board_by_name("Mail").unwrap().id;
        let column_id = store.find_column_by_name(board_id, "Inbox").unwrap().id;
        let positions: Vec<i64> = store
            .tasks_in_column(column_id)
            .iter()
            .map(|t| t.position)
            .collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn missing_board_is_fatal_before_any_connection() {
        let mut store = Store::default();
        let mut mailbox = StubMailbox::default();
        let result =
            run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser);
        assert!(matches!(result, Err(ImportError::BoardNotFound(_))));
        assert!(!mailbox.connected);
    }

    #[test]
    fn connect_failure_is_fatal() {
        let mut store = store_with_mail_board();
        let mut mailbox = StubMailbox {
            fail_connect: true,
            ..StubMailbox::default()
        };
        let result =
            run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser);
        assert!(matches!(result, Err(ImportError::Mail(MailError::Connect(_)))));
    }

    #[test]
    fn mailbox_is_released_even_when_the_run_aborts() {
        let mut store = store_with_mail_board();
        let mut mailbox = StubMailbox {
            fail_search: true,
            ..StubMailbox::default()
        };
        let result =
            run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser);
        assert!(result.is_err());
        assert!(mailbox.released);
        assert!(mailbox.logged_out);
    }

    #[test]
    fn runs_are_capped_at_fifty_most_recent_messages() {
        let mut store = store_with_mail_board();
        let messages: Vec<StubMessage> = (1..=60)
            .map(|uid| message(uid, Some(&format!("m{uid}")), &format!("subject {uid}")))
            .collect();
        let mut mailbox = StubMailbox {
            messages,
            ..StubMailbox::default()
        };
        let summary =
            run_import(&mut store, &NullStorage, &config(), &mut mailbox, &StubParser).unwrap();
        assert_eq!(summary.processed, 50);
        assert_eq!(summary.created, 50);
        // The oldest ten stay unread for a later run.
        assert!(!mailbox.messages[0].seen);
        assert!(mailbox.messages[10].seen);
    }
}
