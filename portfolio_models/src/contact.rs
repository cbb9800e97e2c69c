use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;
use thiserror::Error;

/// Basic `local@domain.tld` shape: no whitespace anywhere, exactly one `@`
/// and at least one `.` after it.
pub static CONTACT_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub author: ContactMessageAuthor,
    pub content: ContactMessageContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessageAuthor {
    pub name: ContactMessageAuthorName,
    pub email: ContactMessageAuthorEmail,
}

#[nutype(
    validate(not_empty),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref)
)]
pub struct ContactMessageAuthorName(String);

#[nutype(
    validate(regex = CONTACT_EMAIL_REGEX),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref)
)]
pub struct ContactMessageAuthorEmail(String);

#[nutype(
    validate(not_empty),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref)
)]
pub struct ContactMessageContent(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactMessageError {
    #[error("Name, email, and message are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
}

impl ContactMessage {
    /// Validates a raw submission.
    ///
    /// The presence of all three fields is checked before the email format,
    /// so a submission with an empty name and a malformed email is reported
    /// as [`ContactMessageError::MissingFields`].
    pub fn new(name: String, email: String, content: String) -> Result<Self, ContactMessageError> {
        if name.is_empty() || email.is_empty() || content.is_empty() {
            return Err(ContactMessageError::MissingFields);
        }

        let email = ContactMessageAuthorEmail::try_new(email)
            .map_err(|_| ContactMessageError::InvalidEmail)?;
        let name = ContactMessageAuthorName::try_new(name)
            .map_err(|_| ContactMessageError::MissingFields)?;
        let content = ContactMessageContent::try_new(content)
            .map_err(|_| ContactMessageError::MissingFields)?;

        Ok(Self {
            author: ContactMessageAuthor { name, email },
            content,
        })
    }
}
