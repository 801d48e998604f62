use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use rand::Rng;

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24; // 24 hours for long lifetime

/// Generate JWT access token with 24 hours lifetime.
///
/// `sub` несёт ID сессии анализа: токен и сессия живут и умирают вместе.
pub fn generate_access_token(session_id: &str, username: &str) -> Result<String> {
    let now = Utc::now();
    let exp = (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = TokenClaims {
        sub: session_id.to_string(),
        username: username.to_string(),
        exp,
        iat,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )
    .context("Failed to encode JWT token")?;

    Ok(token)
}

/// Validate JWT token and extract claims
pub fn validate_token(token: &str) -> Result<TokenClaims> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret().as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;

    Ok(token_data.claims)
}

/// Секрет живёт только в памяти процесса: рестарт сервера инвалидирует все
/// выданные токены вместе с их сессиями, что и требуется.
fn jwt_secret() -> &'static str {
    static SECRET: Lazy<String> = Lazy::new(generate_jwt_secret);
    &SECRET
}

/// Generate a cryptographically secure JWT secret (256 bits)
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = generate_access_token("9f3c0c2e-0000-0000-0000-000000000001", "etrading")
            .unwrap();
        let claims = validate_token(&token).unwrap();
        assert_eq!(claims.sub, "9f3c0c2e-0000-0000-0000-000000000001");
        assert_eq!(claims.username, "etrading");
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(validate_token("not.a.token").is_err());
    }
}
