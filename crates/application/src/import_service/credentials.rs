use planivo_core::{AppError, AppResult};
use planivo_domain::PASSWORD_SYMBOLS;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;

const LOWERCASE: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";

/// Length of credentials issued to imported accounts.
pub const GENERATED_PASSWORD_LENGTH: usize = 16;

/// Freshly generated initial credential. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedPassword(String);

impl GeneratedPassword {
    /// Returns the plaintext credential.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for GeneratedPassword {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("GeneratedPassword(<redacted>)")
    }
}

/// Generates a random password from the OS CSPRNG.
///
/// Always contains at least one lowercase letter, uppercase letter, digit
/// and symbol. Look-alike characters (`l`, `I`, `O`, `0`, `1`) are excluded.
pub fn generate_password() -> AppResult<GeneratedPassword> {
    let symbols = PASSWORD_SYMBOLS.as_bytes();
    let classes: [&[u8]; 4] = [LOWERCASE, UPPERCASE, DIGITS, symbols];
    let alphabet: Vec<u8> = classes.concat();
    let mut rng = OsRng;

    let mut password = Vec::with_capacity(GENERATED_PASSWORD_LENGTH);
    for class in classes {
        password.push(pick(class, &mut rng)?);
    }
    while password.len() < GENERATED_PASSWORD_LENGTH {
        password.push(pick(&alphabet, &mut rng)?);
    }
    password.shuffle(&mut rng);

    String::from_utf8(password)
        .map(GeneratedPassword)
        .map_err(|error| AppError::Internal(format!("generated password is not UTF-8: {error}")))
}

fn pick(characters: &[u8], rng: &mut OsRng) -> AppResult<u8> {
    characters
        .choose(rng)
        .copied()
        .ok_or_else(|| AppError::Internal("password character class is empty".to_owned()))
}
