//! Randomized fixture data
//!
//! Produces users with unique, ASCII-only e-mail addresses so repeated runs
//! against a shared service do not collide.

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::models::{Login, User};

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Daniel", "Eduarda", "Felipe", "Gabriela", "Henrique", "Isabela",
    "João", "Larissa", "Marcos", "Natália", "Otávio", "Paula", "Rafael", "Sofia", "Thiago",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Barbosa", "Cardoso", "Costa", "Ferreira", "Gomes", "Lima", "Martins", "Oliveira",
    "Pereira", "Ribeiro", "Rocha", "Santos", "Silva", "Souza",
];

const EMAIL_DOMAINS: &[&str] = &["qa.com.br", "example.com", "teste.dev"];

/// Generator for valid test data
pub struct DataFactory;

impl DataFactory {
    /// A complete, valid user
    pub fn valid_user(admin: bool) -> User {
        User::new(Self::name(), Self::email(), Self::password(), admin)
    }

    /// Credentials matching `user`
    pub fn valid_login(user: &User) -> Login {
        user.login()
    }

    /// Full name such as "Ana Costa"
    pub fn name() -> String {
        let mut rng = rand::rng();
        let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Ana");
        let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Silva");
        format!("{first} {last}")
    }

    /// Unique, ASCII-only e-mail address
    pub fn email() -> String {
        let mut rng = rand::rng();
        let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("ana");
        let domain = EMAIL_DOMAINS.choose(&mut rng).copied().unwrap_or("example.com");
        let suffix: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();

        format!(
            "{}.{}{}@{}",
            ascii_slug(first),
            Utc::now().timestamp_millis(),
            suffix.to_lowercase(),
            domain
        )
    }

    /// Alphanumeric password of 8 to 16 characters
    pub fn password() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(8..=16);
        (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

/// Lower-case ASCII form of a name
fn ascii_slug(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'a',
            'é' | 'ê' | 'É' | 'Ê' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'o',
            'ú' | 'Ú' => 'u',
            'ç' | 'Ç' => 'c',
            other => other.to_ascii_lowercase(),
        })
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
