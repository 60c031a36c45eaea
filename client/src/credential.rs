use shared::protocol::AccessToken;

/// Username and token as entered by the user. Held in memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub token: AccessToken,
}

impl Credential {
    pub fn new(username: impl Into<String>, token: AccessToken) -> Self {
        Credential {
            username: username.into(),
            token,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.token.is_empty()
    }
}
