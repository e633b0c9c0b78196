use rand::{rngs::OsRng, CryptoRng, Rng, RngCore};
use secrecy::{ExposeSecret, SecretString};

/// Number of characters in every temporary credential.
pub const CREDENTIAL_LENGTH: usize = 12;

/// Alphabet temporary credentials are drawn from (70 symbols, ~73.5 bits for 12 characters).
pub const CREDENTIAL_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// A freshly generated temporary password.
///
/// The value lives inside a [`SecretString`] so `Debug` output is redacted and
/// the memory is zeroized on drop. It is only exposed when handed to the
/// directory update call and when rendering the notification email.
#[derive(Debug)]
pub struct TemporaryCredential(SecretString);

impl TemporaryCredential {
    /// Generate a credential from the operating system CSPRNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a credential from the given cryptographically secure source.
    ///
    /// Each character is drawn independently and uniformly from
    /// [`CREDENTIAL_CHARSET`].
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let value: String = (0..CREDENTIAL_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..CREDENTIAL_CHARSET.len());
                CREDENTIAL_CHARSET[idx] as char
            })
            .collect();

        Self(SecretString::from(value))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.expose().len()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    pub fn charset() -> &'static [u8] {
        CREDENTIAL_CHARSET
    }
}
