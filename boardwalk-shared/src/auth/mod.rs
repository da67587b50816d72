/// Identity and authorization for Boardwalk
///
/// Two concerns live here, deliberately separated:
///
/// - `identity`: resolving a request credential (Bearer JWT) to a user id.
///   Token issuance belongs to the external identity provider; this side
///   only validates.
/// - `policy`: the pure access-policy decision function mapping (action,
///   caller role, ownership facts) to allow/deny. It touches no I/O so the
///   whole decision table is unit-testable.
pub mod identity;
pub mod policy;

pub use identity::AuthUser;
