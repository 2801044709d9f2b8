pub mod deck;
pub mod share;
pub mod team;
pub mod user;

use rand::Rng;
use rand::distr::Alphanumeric;

/// Random alphanumeric code for share links and team invites.
pub fn random_code(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
