use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mail::{FetchedMessage, MailError, MailboxClient};

/// One message in the spool file.
#[derive(Serialize, Deserialize, Clone)]
pub struct SpoolMessage {
    pub uid: u32,
    pub message_id: Option<String>,
    #[serde(default)]
    pub seen: bool,
    pub source: String,
}

#[derive(Serialize, Deserialize, Default)]
struct SpoolFile {
    folders: HashMap<String, Vec<SpoolMessage>>,
}

/// File-backed mailbox: a JSON spool of folders holding raw messages.
/// Stands in for the IMAP client behind the [`MailboxClient`] seam; seen
/// flags are persisted back to the file as they change.
pub struct SpoolMailbox {
    path: PathBuf,
    spool: Option<SpoolFile>,
    locked_folder: Option<String>,
}

impl SpoolMailbox {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            spool: None,
            locked_folder: None,
        }
    }

    fn persist(&self) -> Result<(), MailError> {
        let spool = self.spool.as_ref().ok_or_else(not_connected)?;
        let json = serde_json::to_string_pretty(spool)
            .map_err(|e| MailError::Connect(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn locked_messages(&mut self) -> Result<&mut Vec<SpoolMessage>, MailError> {
        let folder = self
            .locked_folder
            .clone()
            .ok_or_else(|| MailError::Folder(String::from("<none locked>")))?;
        self.spool
            .as_mut()
            .ok_or_else(not_connected)?
            .folders
            .get_mut(&folder)
            .ok_or(MailError::Folder(folder))
    }
}

fn not_connected() -> MailError {
    MailError::Connect(String::from("not connected"))
}

impl MailboxClient for SpoolMailbox {
    fn connect(&mut self) -> Result<(), MailError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            MailError::Connect(format!("cannot open spool '{}': {e}", self.path.display()))
        })?;
        let spool: SpoolFile = serde_json::from_str(&content)
            .map_err(|e| MailError::Connect(format!("spool is not valid JSON: {e}")))?;
        self.spool = Some(spool);
        Ok(())
    }

    fn lock_folder(&mut self, folder: &str) -> Result<(), MailError> {
        let spool = self.spool.as_ref().ok_or_else(not_connected)?;
        if !spool.folders.contains_key(folder) {
            return Err(MailError::Folder(folder.to_string()));
        }
        self.locked_folder = Some(folder.to_string());
        Ok(())
    }

    fn search_unseen(&mut self) -> Result<Vec<u32>, MailError> {
        let messages = self.locked_messages()?;
        let mut uids: Vec<u32> = messages.iter().filter(|m| !m.seen).map(|m| m.uid).collect();
        uids.sort();
        Ok(uids)
    }

    fn fetch(&mut self, uid: u32) -> Result<FetchedMessage, MailError> {
        let messages = self.locked_messages()?;
        let message = messages
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
        let messages = self.locked_messages()?;
        let message = messages
            .iter_mut()
            .find(|m| m.uid == uid)
            .ok_or(MailError::Fetch(uid))?;
        message.seen = true;
        self.persist()
    }

    fn release_folder(&mut self) {
        self.locked_folder = None;
    }

    fn logout(&mut self) {
        self.spool = None;
    }
}
