use std::fmt;

use serde::Serialize;

/// Handle used when a proof link is too short to carry a profile segment.
pub const UNDEFINED_HANDLE: &str = "undefined";

/// A participant, keyed by the profile handle found in their proof links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ParticipantIdentity(String);

impl ParticipantIdentity {
    /// Derive the identity from a proof link such as
    /// `https://x.com/<handle>/status/<id>`.
    ///
    /// The handle is the fourth `/`-separated component. Links with fewer
    /// components all land in the `@undefined` bucket.
    pub fn from_proof(proof_reference: &str) -> Self {
        let segment = proof_reference.split('/').nth(3).unwrap_or(UNDEFINED_HANDLE);
        Self(format!("@{segment}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn handle(&self) -> &str {
        let value = self.as_str();
        value.strip_prefix('@').unwrap_or(value)
    }

    pub fn is_undefined(&self) -> bool {
        self.handle() == UNDEFINED_HANDLE
    }

    pub fn profile_url(&self) -> String {
        format!("https://twitter.com/{}", self.handle())
    }
}

impl fmt::Display for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}
