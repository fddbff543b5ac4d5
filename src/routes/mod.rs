/// Router Module Index
///
/// Routes are split by the gate that protects them. `lib.rs` attaches the gate
/// middleware to each router, so a handler is never reachable without its check.

/// Unauthenticated routes: health and the account endpoints.
pub mod public;

/// Catalog management, behind the librarian gate.
pub mod librarian;

/// Catalog reads, behind the reader (student-or-librarian) gate.
pub mod reader;
