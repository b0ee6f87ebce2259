// Random alphanumeric token generation.
use rand::Rng;
use rand::distributions::Alphanumeric;

pub const DEFAULT_TOKEN_LENGTH: usize = 32;

pub fn random_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
