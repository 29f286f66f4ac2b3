//! Author credential storage in the OS keychain.

use keyring::Entry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("keychain error: {0}")]
    Backend(#[from] keyring::Error),
}

fn entry(service: &str, account: &str) -> Result<Entry, CredentialError> {
    // The Windows credential manager keys entries by target name rather
    // than service/account, so give it an explicit one.
    if cfg!(windows) {
        let target = format!("{service}/{account}");
        Ok(Entry::new_with_target(&target, service, account)?)
    } else {
        Ok(Entry::new(service, account)?)
    }
}

/// Reads the password stored for `service`/`account`.
pub fn get_password(service: &str, account: &str) -> Result<String, CredentialError> {
    Ok(entry(service, account)?.get_password()?)
}

/// Stores `password` for `service`/`account`, replacing any previous value.
pub fn set_password(service: &str, account: &str, password: &str) -> Result<(), CredentialError> {
    entry(service, account)?.set_password(password)?;
    Ok(())
}
