/// Router Module Index
///
/// Routes are split by access level so every authenticated endpoint sits
/// behind the authentication layer applied in `create_router`.

/// Routes reachable without a session: health, sign-up, log-in.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware. User writes are
/// additionally gated by the permission check.
pub mod authenticated;
