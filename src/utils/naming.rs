//! Unique file-name tokens for on-disk cache artifacts.
//!
//! Token generation is injected into the cache constructor so tests can pin
//! names deterministically while production code draws random ones.

use rand::Rng;
use std::path::Path;

const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const TOKEN_LEN: usize = 10;

/// Source of candidate file-name tokens.
pub trait TokenSource {
    fn next_token(&mut self) -> String;
}

/// Random uppercase-alphanumeric tokens.
pub struct RandomTokens {
    len: usize,
}

impl RandomTokens {
    pub fn new() -> Self {
        Self { len: TOKEN_LEN }
    }
}

impl Default for RandomTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for RandomTokens {
    fn next_token(&mut self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.len)
            .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
            .collect()
    }
}

/// Fixed token sequence for deterministic tests.
pub struct FixedTokens {
    tokens: Vec<String>,
    next: usize,
}

impl FixedTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }
}

impl TokenSource for FixedTokens {
    fn next_token(&mut self) -> String {
        let token = self.tokens[self.next % self.tokens.len()].clone();
        self.next += 1;
        token
    }
}

/// Draw a token whose derived artifact names do not collide with existing
/// files in `dir`. Concurrent pipeline runs sharing an output directory rely
/// on this for isolation.
pub fn unique_token(dir: &Path, source: &mut dyn TokenSource, extensions: &[&str]) -> String {
    loop {
        let token = source.next_token();
        let taken = extensions
            .iter()
            .any(|ext| dir.join(format!("{}.{}", token, ext)).exists());
        if !taken {
            return token;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_random_token_shape() {
        let mut source = RandomTokens::new();
        let token = source.next_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token
            .bytes()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_unique_token_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("TAKEN.fasta"), b"").unwrap();

        let mut source = FixedTokens::new(["TAKEN", "FREE"]);
        let token = unique_token(dir.path(), &mut source, &["fasta", "dmnd"]);
        assert_eq!(token, "FREE");
    }

    #[test]
    fn test_unique_token_checks_all_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("TAKEN.dmnd"), b"").unwrap();

        let mut source = FixedTokens::new(["TAKEN", "FREE"]);
        let token = unique_token(dir.path(), &mut source, &["fasta", "dmnd"]);
        assert_eq!(token, "FREE");
    }
}
