//! Identity verification and authorization.
//!
//! Two independent verifiers compose into a single principal resolution:
//! node signatures (public-key identity proven over the request payload)
//! and external access tokens (confirmed against the identity provider).
//! Authorization is a separate, policy-driven gate applied to the
//! resolved principal.

mod identity;
mod policy;

pub use identity::{
    GithubVerifier, IdentityClaims, IdentityError, IdentityVerifier, StaticTokenVerifier,
    TokenVerifier,
};
pub use policy::{PolicyCache, PolicyError, POLICY_OBJECT_KEY};
