//! The SMTP probe client.
//!
//! Speaks the wire protocol defensively: every probe for a domain shares one
//! session (connect, EHLO, MAIL FROM), the decoy recipient is always sent
//! before any real candidate, and candidate probes stay strictly ordered so
//! the first acceptance wins.

use super::result::{RcptProbe, SessionVerdict};
use crate::core::config::{random_delay, Config};
use crate::core::error::{AppError, Result};

use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::commands::{Ehlo, Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::response::{Response, Severity};
use lettre::Address;
use rand::Rng;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::sync::Arc;

/// Phrases mail servers use for "this mailbox does not exist". A 5xx reply
/// carrying one of these rejects the recipient without ending the session.
const REJECTION_PHRASES: &[&str] = &[
    "user unknown",
    "no such user",
    "does not exist",
    "recipient not found",
    "invalid mailbox",
    "mailbox unavailable",
    "address rejected",
    "invalid recipient",
    "relay access denied",
    "recipient address rejected",
];

/// Client for probing a mail server's acceptance behavior.
#[derive(Clone)]
pub struct SmtpProber {
    config: Arc<Config>,
}

impl SmtpProber {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Probes candidate recipients against `mail_host` in a single session.
    ///
    /// Sequence: greeting, EHLO, `MAIL FROM` with the configured sender, a
    /// randomized decoy recipient, then each candidate in order with a
    /// politeness delay between probes. The decoy being accepted means the
    /// domain is a catch-all and short-circuits the session before any
    /// candidate is sent. The first accepted candidate ends the loop.
    ///
    /// Connection, handshake, and mid-session transport failures surface as
    /// errors; the orchestrator maps them to `not_found` with the cause
    /// logged.
    pub async fn probe_candidates(
        &self,
        domain: &str,
        mail_host: &str,
        candidates: &[String],
    ) -> Result<SessionVerdict> {
        let port = self.config.smtp_port;
        tracing::debug!(
            target: "smtp_probe",
            "Opening SMTP session to {}:{} for domain {} ({} candidates)",
            mail_host,
            port,
            domain,
            candidates.len()
        );

        let socket_addr = (mail_host, port)
            .to_socket_addrs()
            .map_err(|e| AppError::SmtpConnect {
                server: mail_host.to_string(),
                detail: format!("address resolution failed: {}", e),
            })?
            .next()
            .ok_or_else(|| AppError::SmtpConnect {
                server: mail_host.to_string(),
                detail: "no resolvable address".to_string(),
            })?;

        let sender = Address::from_str(&self.config.smtp_sender_email)
            .map_err(|e| AppError::Config(format!("Invalid sender email in config: {}", e)))?;
        let helo_name = ClientId::Domain("localhost".to_string());

        let mut conn = SmtpConnection::connect(
            socket_addr,
            Some(self.config.smtp_timeout),
            &helo_name,
            None,
            None,
        )
        .map_err(|e| AppError::SmtpConnect {
            server: mail_host.to_string(),
            detail: e.to_string(),
        })?;

        let verdict = self
            .run_probe_sequence(&mut conn, &helo_name, &sender, domain, mail_host, candidates)
            .await;

        conn.quit().ok();
        verdict
    }

    async fn run_probe_sequence(
        &self,
        conn: &mut SmtpConnection,
        helo_name: &ClientId,
        sender: &Address,
        domain: &str,
        mail_host: &str,
        candidates: &[String],
    ) -> Result<SessionVerdict> {
        if let Err(e) = conn.command(Ehlo::new(helo_name.clone())) {
            return Err(AppError::SmtpSession {
                server: mail_host.to_string(),
                detail: format!("EHLO rejected: {}", e),
            });
        }

        if let Err(e) = conn.command(Mail::new(Some(sender.clone()), vec![])) {
            return Err(AppError::SmtpSession {
                server: mail_host.to_string(),
                detail: format!("MAIL FROM rejected: {}", e),
            });
        }

        // Catch-all detection comes first: if the server takes an address that
        // cannot exist, per-candidate acceptance is meaningless.
        let decoy = decoy_recipient(domain);
        tracing::debug!(target: "smtp_probe", "Decoy probe RCPT TO:<{}> via {}", decoy, mail_host);
        match self.probe_recipient(conn, &decoy) {
            RcptProbe::Accepted => {
                tracing::info!(
                    target: "smtp_probe",
                    "Domain {} is a catch-all (accepted decoy {})",
                    domain,
                    decoy
                );
                return Ok(SessionVerdict::CatchAll);
            }
            RcptProbe::Rejected => {
                tracing::debug!(target: "smtp_probe", "Decoy rejected; {} is not a catch-all", domain);
            }
            RcptProbe::Failed(detail) => {
                return Err(AppError::SmtpSession {
                    server: mail_host.to_string(),
                    detail: format!("decoy probe failed: {}", detail),
                });
            }
        }

        for (index, candidate) in candidates.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(random_delay(self.config.probe_delay)).await;
            }

            tracing::debug!(
                target: "smtp_probe",
                "RCPT TO:<{}> ({}/{}) via {}",
                candidate,
                index + 1,
                candidates.len(),
                mail_host
            );
            match self.probe_recipient(conn, candidate) {
                RcptProbe::Accepted => {
                    tracing::info!(
                        target: "smtp_probe",
                        "Server {} accepted <{}>; skipping {} remaining candidates",
                        mail_host,
                        candidate,
                        candidates.len() - (index + 1)
                    );
                    return Ok(SessionVerdict::Accepted(candidate.clone()));
                }
                RcptProbe::Rejected => continue,
                RcptProbe::Failed(detail) => {
                    return Err(AppError::SmtpSession {
                        server: mail_host.to_string(),
                        detail: format!("probe for <{}> failed: {}", candidate, detail),
                    });
                }
            }
        }

        Ok(SessionVerdict::NoneAccepted)
    }

    /// Sends one RCPT TO and classifies the reply.
    fn probe_recipient(&self, conn: &mut SmtpConnection, recipient: &str) -> RcptProbe {
        let address = match Address::from_str(recipient) {
            Ok(addr) => addr,
            Err(e) => {
                tracing::warn!(
                    target: "smtp_probe",
                    "Skipping unparseable recipient '{}': {}",
                    recipient,
                    e
                );
                return RcptProbe::Rejected;
            }
        };

        classify_rcpt_reply(conn.command(Rcpt::new(address, vec![])))
    }
}

/// Builds a recipient that is overwhelmingly unlikely to exist. Randomized
/// per call so mail servers cannot allow/deny-list a fixed probe string.
fn decoy_recipient(domain: &str) -> String {
    let mut rng = rand::thread_rng();
    format!(
        "no-reply-does-not-exist-{}-{:x}@{}",
        rng.gen_range(10000..99999),
        rng.gen::<u32>(),
        domain
    )
}

/// Maps a RCPT TO reply onto accept/reject/session-failure.
///
/// lettre surfaces negative completions as errors, so a 5xx "user unknown"
/// arrives through the `Err` arm; only replies that do not speak about the
/// recipient at all count as session failures.
fn classify_rcpt_reply(
    reply: std::result::Result<Response, lettre::transport::smtp::Error>,
) -> RcptProbe {
    match reply {
        Ok(response) => {
            if response.code().severity == Severity::PositiveCompletion {
                RcptProbe::Accepted
            } else {
                RcptProbe::Rejected
            }
        }
        Err(e) => {
            let detail = e.to_string();
            let lower = detail.to_lowercase();
            let mentions_recipient = lower.contains("550")
                || lower.contains("551")
                || lower.contains("553")
                || lower.contains("permanent")
                || lower.contains("transient")
                || REJECTION_PHRASES.iter().any(|p| lower.contains(p));
            if mentions_recipient {
                RcptProbe::Rejected
            } else {
                RcptProbe::Failed(detail)
            }
        }
    }
}
