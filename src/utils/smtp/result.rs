//! Result types for one SMTP probe session.

/// What a full probe session against a domain's mail host established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionVerdict {
    /// The decoy recipient was accepted: the domain accepts any recipient,
    /// so per-candidate acceptance carries no signal. No candidates were
    /// probed after this was established.
    CatchAll,
    /// The first candidate (in generator order) the server accepted.
    Accepted(String),
    /// Every candidate was rejected.
    NoneAccepted,
}

/// Classification of a single RCPT TO exchange.
#[derive(Debug)]
pub(crate) enum RcptProbe {
    /// Positive completion: the server claims the recipient exists.
    Accepted,
    /// A rejection that speaks about this recipient only; the session is
    /// still usable for further probes.
    Rejected,
    /// The session itself broke (I/O, unparseable reply, transport error).
    Failed(String),
}
