use axum::{extract::Json, http::StatusCode};
use contracts::system::auth::{LoginRequest, LoginResponse, UserInfo};

use crate::domain::a001_analysis_session::store;
use crate::domain::a003_artifact::renderer;
use crate::shared::config;
use crate::system::auth::extractor::CurrentUser;
use crate::system::auth::{jwt, password};

/// Login handler.
///
/// Учётная запись одна, общая, из конфигурации. Успешный вход создаёт
/// новую сессию анализа и возвращает токен, привязанный к ней; прежние
/// сессии не затрагиваются.
pub async fn login(Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, StatusCode> {
    let auth = &config::get_config().auth;

    // 1. Сверка с единственной учётной записью
    if request.username != auth.username {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if !verify_shared_password(&request.password).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)? {
        return Err(StatusCode::UNAUTHORIZED);
    }

    // 2. Сессии живут в памяти: на логине выметаем пережившие свой токен
    renderer::evict(&store::prune_expired());

    // 3. Новая сессия анализа с привязанным файлом датасета
    let file_id = config::get_config().assistant.file_id.clone();
    let session_id = store::create(&request.username, vec![file_id]);
    tracing::info!(user = %request.username, session = %session_id, "login ok");

    // 4. Токен несёт ID сессии
    let access_token = jwt::generate_access_token(&session_id.to_string(), &request.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let response = LoginResponse {
        access_token,
        user: UserInfo {
            username: request.username,
            session_id: session_id.to_string(),
        },
    };

    Ok(Json(response))
}

/// Get current user handler (protected by middleware)
pub async fn current_user(CurrentUser(claims): CurrentUser) -> Result<Json<UserInfo>, StatusCode> {
    Ok(Json(UserInfo {
        username: claims.username,
        session_id: claims.sub,
    }))
}

fn verify_shared_password(candidate: &str) -> anyhow::Result<bool> {
    let auth = &config::get_config().auth;
    if let Some(hash) = &auth.password_hash {
        return password::verify_password(candidate, hash);
    }
    // Dev-режим: открытый пароль из конфигурации
    if let Some(plain) = &auth.password {
        return Ok(candidate == plain);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::{AssistantConfig, AuthConfig, Config, DatasetConfig, ServerConfig};
    use uuid::Uuid;

    // Имя уникально для этого модуля: по нему считаются созданные сессии
    const TEST_USER: &str = "etrading-gatekeeper";

    fn install_test_config() {
        let config = Config {
            server: ServerConfig { port: 0 },
            assistant: AssistantConfig {
                api_key: "sk-test".into(),
                assistant_id: "asst_test".into(),
                file_id: "file-dataset".into(),
                api_base: "http://127.0.0.1:0".into(),
                run_timeout_secs: 5,
            },
            auth: AuthConfig {
                username: TEST_USER.into(),
                password_hash: None,
                password: Some("hello new world".into()),
            },
            dataset: DatasetConfig {
                path: "assets/etrading_synthetic_data.csv".into(),
                preview_rows: 10,
            },
        };
        // Конфиг процессный: второй тест модуля переиспользует первый
        let _ = config::set_config(config);
    }

    fn request(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.into(),
            password: password.into(),
        })
    }

    #[tokio::test]
    async fn test_login_gate_rejects_then_admits() {
        install_test_config();

        // Неверная пара не создаёт никакого состояния сессии
        let by_name = login(request("intruder", "hello new world")).await;
        assert_eq!(by_name.err(), Some(StatusCode::UNAUTHORIZED));

        let by_password = login(request(TEST_USER, "hello old world")).await;
        assert_eq!(by_password.err(), Some(StatusCode::UNAUTHORIZED));

        assert_eq!(store::count_for(TEST_USER), 0);

        // Верная пара выдаёт токен, привязанный к свежей сессии
        let response = login(request(TEST_USER, "hello new world")).await.unwrap();
        let claims = jwt::validate_token(&response.access_token).unwrap();
        assert_eq!(claims.username, TEST_USER);

        let session_id = Uuid::parse_str(&claims.sub).unwrap();
        assert!(store::exists(&session_id));
        assert_eq!(response.user.session_id, claims.sub);
        assert_eq!(store::count_for(TEST_USER), 1);
    }
}
