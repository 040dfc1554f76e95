use thiserror::Error;

pub mod parser;
pub mod spool;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mailbox connection failed: {0}")]
    Connect(String),

    #[error("Mailbox folder '{0}' is not available")]
    Folder(String),

    #[error("Message {0} could not be fetched")]
    Fetch(u32),

    #[error("Message could not be parsed: {0}")]
    Parse(String),

    #[error("Mailbox I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A message as fetched from the mailbox: envelope-level id plus raw source.
pub struct FetchedMessage {
    /// Transport-level sequence number, scoped to the mailbox
    pub uid: u32,
    /// Protocol-level message identifier, if the envelope carries one
    pub message_id: Option<String>,
    /// Raw RFC 822 source
    pub source: String,
}

/// Mailbox collaborator seam. The importer only ever talks to this trait;
/// the bundled implementation is a JSON file spool (see [`spool`]).
pub trait MailboxClient {
    fn connect(&mut self) -> Result<(), MailError>;
    /// Acquires exclusive access to a folder. Must be released on every
    /// exit path of the caller.
    fn lock_folder(&mut self, folder: &str) -> Result<(), MailError>;
    /// Uids of unseen messages in the locked folder, oldest first.
    fn search_unseen(&mut self) -> Result<Vec<u32>, MailError>;
    fn fetch(&mut self, uid: u32) -> Result<FetchedMessage, MailError>;
    fn mark_seen(&mut self, uid: u32) -> Result<(), MailError>;
    fn release_folder(&mut self);
    fn logout(&mut self);
}

/// Best-effort envelope fields of a parsed message. Absent fields are None.
pub struct ParsedMail {
    pub subject: Option<String>,
    pub to: Option<String>,
    pub from: Option<String>,
}

/// Parser collaborator seam over raw message source.
pub trait MailParser {
    fn parse(&self, source: &str) -> Result<ParsedMail, MailError>;
}
