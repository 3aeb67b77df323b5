//! The screen state machines. Each screen instance owns its state and talks
//! to the service only through an [`ElectionService`](crate::api::ElectionService).

pub mod detail;
pub mod form;
pub mod list;
mod ticket;

pub use detail::ElectionDetail;
pub use form::ElectionForm;
pub use list::ElectionList;
pub use ticket::Ticket;
