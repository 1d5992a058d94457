use vodca::{AsRefln, Fromln};

/// Opaque bearer token presented in the `Authorization` header.
#[derive(Clone, PartialEq, Eq, Hash, Fromln, AsRefln)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
