//! Host credential adaptation

use std::marker::PhantomData;

use crate::error::CredentialError;

/// Builds the credential object a host framework expects from a
/// resolved username, password and role list.
pub trait CredentialBuilder {
    type Credential;

    fn build(
        &self,
        username: &str,
        password: &str,
        roles: &[String],
    ) -> Result<Self::Credential, CredentialError>;
}

/// A [`CredentialBuilder`] backed by a closure
pub struct FnCredentialBuilder<F, C> {
    f: F,
    _credential: PhantomData<fn() -> C>,
}

/// Wrap a closure as a [`CredentialBuilder`]
pub fn credential_fn<F, C>(f: F) -> FnCredentialBuilder<F, C>
where
    F: Fn(&str, &str, &[String]) -> Result<C, CredentialError>,
{
    FnCredentialBuilder {
        f,
        _credential: PhantomData,
    }
}

impl<F, C> CredentialBuilder for FnCredentialBuilder<F, C>
where
    F: Fn(&str, &str, &[String]) -> Result<C, CredentialError>,
{
    type Credential = C;

    fn build(
        &self,
        username: &str,
        password: &str,
        roles: &[String],
    ) -> Result<C, CredentialError> {
        (self.f)(username, password, roles)
    }
}
