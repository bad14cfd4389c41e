//! Session state
//!
//! What the client needs to resume a dropped session: the session id from
//! READY, the highest sequence number seen, and the resume endpoint.

/// Resumable session state, owned by the connection state machine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    session_id: Option<String>,
    sequence: Option<u64>,
    resume_url: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the sequence number of a dispatch; never moves backwards
    pub fn observe_sequence(&mut self, sequence: u64) {
        if self.sequence.map_or(true, |current| sequence > current) {
            self.sequence = Some(sequence);
        }
    }

    /// Store the identifiers from READY
    pub fn establish(&mut self, session_id: impl Into<String>, resume_url: Option<String>) {
        self.session_id = Some(session_id.into());
        self.resume_url = resume_url.filter(|url| !url.is_empty());
    }

    /// Forget the session; the next handshake is an identify
    pub fn clear(&mut self) {
        self.session_id = None;
        self.sequence = None;
        self.resume_url = None;
    }

    /// A session id and a sequence number are both known
    #[must_use]
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    /// Session id and sequence to put in a resume payload
    #[must_use]
    pub fn resume_target(&self) -> Option<(&str, u64)> {
        Some((self.session_id.as_deref()?, self.sequence?))
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    #[must_use]
    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_only_increases() {
        let mut session = SessionState::new();
        assert_eq!(session.sequence(), None);

        session.observe_sequence(5);
        session.observe_sequence(3);
        assert_eq!(session.sequence(), Some(5));

        session.observe_sequence(9);
        assert_eq!(session.sequence(), Some(9));
    }

    #[test]
    fn test_can_resume_needs_id_and_sequence() {
        let mut session = SessionState::new();
        assert!(!session.can_resume());

        session.observe_sequence(1);
        assert!(!session.can_resume());

        session.establish("abc", Some("wss://resume.example".to_string()));
        assert!(session.can_resume());
        assert_eq!(session.resume_target(), Some(("abc", 1)));
        assert_eq!(session.resume_url(), Some("wss://resume.example"));
    }

    #[test]
    fn test_clear() {
        let mut session = SessionState::new();
        session.establish("abc", None);
        session.observe_sequence(10);

        session.clear();
        assert_eq!(session, SessionState::new());
        assert!(session.resume_target().is_none());
    }

    #[test]
    fn test_empty_resume_url_ignored() {
        let mut session = SessionState::new();
        session.establish("abc", Some(String::new()));
        assert!(session.resume_url().is_none());
    }
}
