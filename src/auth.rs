use reqwest::RequestBuilder;

/// Project public key sent to the record service as a bearer credential.
///
/// Never printed: `Debug` only shows the key kind, e.g. `PublicKey(pk_live…)`.
pub struct PublicKey(String);

impl PublicKey {
    /// Surrounding whitespace is dropped; a blank key means "no key".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading `pk_<env>` tag, if the key carries one.
    fn kind(&self) -> Option<&str> {
        let mut parts = self.0.splitn(3, '_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("pk"), Some(env), Some(_)) if !env.is_empty() => Some(&self.0[..3 + env.len()]),
            _ => None,
        }
    }

    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "PublicKey({kind}…)"),
            None => write!(f, "PublicKey(<redacted>)"),
        }
    }
}
