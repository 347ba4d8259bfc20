/// Authenticated caller of a request, derived from the bearer token.
///
/// Present on every write route; reads and similarity search run without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    subject: String,
    username: Option<String>,
}

impl PrincipalContext {
    pub fn new(subject: impl Into<String>, username: Option<String>) -> Self {
        Self {
            subject: subject.into(),
            username,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}
