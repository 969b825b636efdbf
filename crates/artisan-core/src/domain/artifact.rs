//! Artifact: what a capability produces.
//!
//! Keep this flexible: artifacts carry either inline text/JSON (stories,
//! email copy) or a locator into an artifact store (images, video). Binary
//! payloads are never inlined here.

use serde::{Deserialize, Serialize};

use super::job::ArtifactRef;

/// A payload produced by one capability invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Artifact {
    /// Generated text (story, history, FAQ copy, ...).
    Text(String),

    /// Reference to a stored binary (enhanced image, rendered video, ...).
    Locator(ArtifactRef),

    /// Structured output (multi-field generation results).
    Json(serde_json::Value),
}

impl Artifact {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn locator(l: impl Into<String>) -> Self {
        Self::Locator(ArtifactRef::new(l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_is_tagged_enum() {
        let a = Artifact::text("once upon a time");
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["kind"], "Text");
        assert_eq!(v["value"], "once upon a time");
    }

    #[test]
    fn locator_roundtrip() {
        let a = Artifact::locator("mem://artisan/x");
        let s = serde_json::to_string(&a).unwrap();
        let back: Artifact = serde_json::from_str(&s).unwrap();
        assert_eq!(a, back);
    }
}
