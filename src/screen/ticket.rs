use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// Correlates a response with the request that a screen issued. Tickets are
/// unique for the life of the process, so a response can only ever land on
/// the screen instance, and the request, it was issued for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    fn next() -> Self {
        static TICKET_COUNTER: AtomicU64 = AtomicU64::new(1);
        Ticket(TICKET_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for Ticket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// At most one outstanding request of a given kind. Issuing a new ticket
/// supersedes the previous one.
#[derive(Debug, Default)]
pub(crate) struct Tickets {
    outstanding: Option<Ticket>,
}

impl Tickets {
    pub fn issue(&mut self) -> Ticket {
        let ticket = Ticket::next();
        self.outstanding = Some(ticket);
        ticket
    }

    /// Accept the response for `ticket` if it is the outstanding request.
    pub fn redeem(&mut self, ticket: Ticket) -> bool {
        if self.outstanding == Some(ticket) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }
}
