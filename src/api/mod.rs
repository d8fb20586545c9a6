//! Outbound integrations: SMTP delivery and public file storage.

pub mod mailer;
pub mod storage;
