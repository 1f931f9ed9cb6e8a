//! Client-side CSV export of the contact list.

use crate::error::{ActionError, ValidationError};
use bridge_client::Contact;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONTACTS_CSV_HEADER: &str = "Phone Number,Name";
pub const CONTACTS_CSV_FILE: &str = "contacts.csv";

/// `phone,"name"` rows, the phone being the JID's local part.
pub fn contacts_csv(contacts: &[Contact]) -> String {
    let mut out = String::from(CONTACTS_CSV_HEADER);
    out.push('\n');
    for contact in contacts {
        let phone = contact.jid.split('@').next().unwrap_or_default();
        let name = contact.name.as_deref().unwrap_or_default().replace('"', "\"\"");
        out.push_str(&format!("{},\"{}\"\n", phone, name));
    }
    out
}

/// Write `contacts.csv` into `dir`, returning the file path.
pub async fn write_contacts_csv(dir: &Path, contacts: &[Contact]) -> Result<PathBuf, ActionError> {
    if contacts.is_empty() {
        return Err(ValidationError::NothingToExport.into());
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(CONTACTS_CSV_FILE);
    tokio::fs::write(&path, contacts_csv(contacts)).await?;

    info!(path = %path.display(), count = contacts.len(), "Exported contacts");
    Ok(path)
}
