//! Lower-level helpers: candidate pattern generation, domain handling, DNS
//! resolution, and the SMTP probe client.

pub mod dns;
pub mod domain;
pub mod patterns;
pub mod smtp;
