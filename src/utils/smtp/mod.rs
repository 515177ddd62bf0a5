//! SMTP probe session: one connection per domain, decoy recipient first,
//! then the ordered candidate list.

mod client;
mod result;

pub use client::SmtpProber;
pub use result::SessionVerdict;
