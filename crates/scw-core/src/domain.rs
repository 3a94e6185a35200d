use std::fmt;

/// Opaque credential scoping every request to one conversation or user.
/// The client never inspects its contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token(pub String);

/// Support conversation id. Optional: one deployment variant folds the
/// ticket into the token and omits it from request paths.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TicketId(pub String);

/// Last-seen message boundary, in seconds since the epoch.
///
/// Only ever assigned from server responses (the initial timestamp fetch,
/// then each poll response); the client never computes one from its own
/// clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor(pub f64);

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
