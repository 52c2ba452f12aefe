//! Provider to credential input mapping.

use crate::error::{Result, TaskError};
use crate::request::RepoProvider;

/// Task input holding the API token for a supported provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialInput {
    GithubToken,
    AzureReposToken,
}

impl CredentialInput {
    /// Name of the task input carrying the token.
    pub fn input_name(&self) -> &'static str {
        match self {
            CredentialInput::GithubToken => "githubToken",
            CredentialInput::AzureReposToken => "azureReposToken",
        }
    }

    /// Credential input for a provider; unsupported providers are an error.
    pub fn for_provider(provider: &RepoProvider) -> Result<Self> {
        match provider {
            RepoProvider::GitHub => Ok(CredentialInput::GithubToken),
            RepoProvider::AzureRepos => Ok(CredentialInput::AzureReposToken),
            RepoProvider::Other(id) => Err(TaskError::UnsupportedProvider(id.clone())),
        }
    }
}

/// Resolved API token, redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    input: CredentialInput,
    token: String,
}

impl Credential {
    pub fn new(input: CredentialInput, token: impl Into<String>) -> Self {
        Self {
            input,
            token: token.into(),
        }
    }

    pub fn input(&self) -> CredentialInput {
        self.input
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("input", &self.input)
            .field("token", &"***")
            .finish()
    }
}

/// Resolve the credential for `provider` using `lookup` to read task inputs.
///
/// A missing token is an error unless `optional` is set, in which case
/// `Ok(None)` is returned.
pub fn resolve_credential<F>(
    provider: &RepoProvider,
    optional: bool,
    lookup: F,
) -> Result<Option<Credential>>
where
    F: FnOnce(&str) -> Option<String>,
{
    let input = CredentialInput::for_provider(provider)?;
    match lookup(input.input_name()) {
        Some(token) => Ok(Some(Credential::new(input, token))),
        None if optional => Ok(None),
        None => Err(TaskError::MissingInput(input.input_name().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_names() {
        assert_eq!(
            CredentialInput::for_provider(&RepoProvider::GitHub).unwrap(),
            CredentialInput::GithubToken
        );
        assert_eq!(CredentialInput::GithubToken.input_name(), "githubToken");
        assert_eq!(
            CredentialInput::for_provider(&RepoProvider::AzureRepos)
                .unwrap()
                .input_name(),
            "azureReposToken"
        );
    }

    #[test]
    fn test_unknown_provider_fails_fast() {
        let err = resolve_credential(&RepoProvider::Other("Svn".into()), true, |_| {
            Some("token".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, TaskError::UnsupportedProvider(ref id) if id == "Svn"));
    }

    #[test]
    fn test_missing_token() {
        let err = resolve_credential(&RepoProvider::GitHub, false, |_| None).unwrap_err();
        assert_eq!(err.to_string(), "Input required: githubToken");

        let none = resolve_credential(&RepoProvider::GitHub, true, |_| None).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_resolves_token_for_provider() {
        let credential = resolve_credential(&RepoProvider::AzureRepos, false, |name| {
            (name == "azureReposToken").then(|| "secret".to_string())
        })
        .unwrap()
        .unwrap();
        assert_eq!(credential.token(), "secret");
        assert!(!format!("{:?}", credential).contains("secret"));
    }
}
