//! End-to-end router tests over in-memory SurrealDB and a stub identity
//! backend.

use atelier_auth::backend::{BackendError, BackendSession, IdentityBackend};
use atelier_auth::{AuthConfig, LegacyRoleAllowlist};
use atelier_core::models::identity::Identity;
use atelier_core::models::profile::CreateProfile;
use atelier_core::models::role::Role;
use atelier_core::repository::ProfileRepository;
use atelier_db::repository::SurrealProfileRepository;
use atelier_db::{DbConfig, DbManager};
use atelier_server::{AppState, ServerConfig, router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

const SECRET: &str = "routes-test-secret-with-enough-bytes";

fn sign(id: Uuid, email: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": id.to_string(), "email": email, "iat": now, "exp": now + 600 }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// Accepts `pw` for any email, issuing a real signed token so the
/// session cookie works on later requests.
#[derive(Clone)]
struct StubBackend {
    identity: Identity,
}

impl IdentityBackend for StubBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<BackendSession>, BackendError> {
        if password != "pw" || email != self.identity.email {
            return Err(BackendError::Rejected);
        }
        Ok(Some(BackendSession {
            access_token: sign(self.identity.id, email),
            expires_in: 600,
            user: self.identity.clone(),
        }))
    }

    async fn exchange_code(
        &self,
        code: &str,
        _code_verifier: Option<&str>,
    ) -> Result<Option<BackendSession>, BackendError> {
        if code != "good" {
            return Err(BackendError::Provider {
                description: "invalid flow state".into(),
            });
        }
        Ok(Some(BackendSession {
            access_token: sign(self.identity.id, &self.identity.email),
            expires_in: 600,
            user: self.identity.clone(),
        }))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, BackendError> {
        let mut url = Url::parse("https://auth.example.com/authorize")
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge);
        Ok(url)
    }
}

struct TestApp {
    app: Router,
    db: Surreal<Any>,
    identity: Identity,
}

async fn setup() -> TestApp {
    let config = ServerConfig {
        public_url: "https://atelier.example.com".into(),
        secure_cookies: false,
        database: DbConfig {
            url: "mem://".into(),
            ..DbConfig::default()
        },
        auth: AuthConfig {
            session_jwt_secret: SECRET.into(),
            legacy_roles: LegacyRoleAllowlist::new(["root@atelier.io"], Vec::<String>::new()),
            ..AuthConfig::default()
        },
        ..ServerConfig::default()
    };
    let manager = DbManager::connect(&config.database).await.unwrap();
    atelier_db::run_migrations(manager.client()).await.unwrap();
    let db = manager.client().clone();

    let identity = Identity {
        id: Uuid::new_v4(),
        email: "ada@example.com".into(),
        display_name: Some("Ada".into()),
        avatar_url: None,
    };
    let state = AppState::new(
        db.clone(),
        StubBackend {
            identity: identity.clone(),
        },
        &config,
    );
    TestApp {
        app: router(state),
        db,
        identity,
    }
}

impl TestApp {
    async fn profile_with_role(&self, email: &str, role: Role) -> Uuid {
        let profiles = SurrealProfileRepository::new(self.db.clone());
        let id = Uuid::new_v4();
        profiles
            .create(CreateProfile {
                id,
                email: email.into(),
                display_name: None,
                avatar_url: None,
            })
            .await
            .unwrap();
        profiles.set_role(id, role).await.unwrap();
        id
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, header::HeaderMap, Value) {
        let res = self.app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, body)
    }
}

fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn set_cookies(headers: &header::HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn login_sets_session_cookie_and_me_resolves() {
    let t = setup().await;

    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "ada@example.com", "password": "pw", "next": "//evil.com" })
                .to_string(),
        ))
        .unwrap();
    let (status, headers, body) = t.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destination"], "/studio");
    assert_eq!(body["profile"]["role"], "user");

    let cookie = set_cookies(&headers)
        .into_iter()
        .find(|c| c.starts_with("atelier_session="))
        .expect("session cookie set");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    let pair = cookie.split(';').next().unwrap().to_string();

    let req = Request::builder()
        .uri("/auth/me")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = t.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity_id"], t.identity.id.to_string());
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn bad_password_is_unauthorized() {
    let t = setup().await;
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "ada@example.com", "password": "wrong" }).to_string(),
        ))
        .unwrap();
    let (status, headers, body) = t.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
    assert!(set_cookies(&headers).is_empty());
}

#[tokio::test]
async fn me_without_session_is_unauthorized() {
    let t = setup().await;
    let req = Request::builder().uri("/auth/me").body(Body::empty()).unwrap();
    let (status, _, body) = t.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn oauth_start_sets_pkce_cookie_and_redirects() {
    let t = setup().await;
    let req = Request::builder()
        .uri("/auth/oauth/google?next=/studio/brands")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = t.send(req).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let location = headers[header::LOCATION].to_str().unwrap();
    let url = Url::parse(location).unwrap();
    let redirect_to = url
        .query_pairs()
        .find(|(k, _)| k == "redirect_to")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert_eq!(
        redirect_to,
        "https://atelier.example.com/auth/callback?state=%2Fstudio%2Fbrands"
    );
    assert!(
        set_cookies(&headers)
            .iter()
            .any(|c| c.starts_with("atelier_pkce="))
    );
}

#[tokio::test]
async fn callback_success_redirects_to_state() {
    let t = setup().await;
    let req = Request::builder()
        .uri("/auth/callback?code=good&state=%2Fstudio%2Fbrands")
        .header(header::COOKIE, "atelier_pkce=verifier")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = t.send(req).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/studio/brands");
    assert!(
        set_cookies(&headers)
            .iter()
            .any(|c| c.starts_with("atelier_session="))
    );
}

#[tokio::test]
async fn callback_provider_error_redirects_to_login() {
    let t = setup().await;
    let req = Request::builder()
        .uri("/auth/callback?error=access_denied&error_description=User+cancelled")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = t.send(req).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers[header::LOCATION],
        "/login?error=access_denied&message=User+cancelled"
    );
    assert!(
        !set_cookies(&headers)
            .iter()
            .any(|c| c.starts_with("atelier_session=") && !c.contains("Max-Age=0"))
    );
}

#[tokio::test]
async fn brand_lifecycle_is_gated() {
    let t = setup().await;
    let admin_id = t.profile_with_role("admin@atelier.io", Role::Admin).await;
    let owner_id = t.profile_with_role("owner@atelier.io", Role::BrandAdmin).await;
    let user_id = t.profile_with_role("user@atelier.io", Role::User).await;
    let admin = sign(admin_id, "admin@atelier.io");
    let owner = sign(owner_id, "owner@atelier.io");
    let user = sign(user_id, "user@atelier.io");

    let (status, _, brand) = t
        .send(authed(
            "POST",
            "/brands",
            &admin,
            Some(json!({ "name": "Maison Noir", "slug": "maison-noir" })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let brand_id = brand["id"].as_str().unwrap().to_string();

    let (status, _, _) = t
        .send(authed("DELETE", &format!("/brands/{brand_id}"), &owner, None))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = t
        .send(authed(
            "PUT",
            &format!("/brands/{brand_id}/owners/{owner_id}"),
            &admin,
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owned_brands"][0], brand_id);

    let (status, _, body) = t.send(authed("GET", "/brands", &owner, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, _, body) = t.send(authed("GET", "/brands", &user, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let (status, _, _) = t
        .send(authed(
            "PUT",
            &format!("/profiles/{user_id}/role"),
            &owner,
            Some(json!({ "role": "admin" })),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = t
        .send(authed("DELETE", &format!("/brands/{brand_id}"), &owner, None))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, me) = t.send(authed("GET", "/auth/me", &owner, None)).await;
    assert_eq!(me["owned_brands"], json!([]));
}

#[tokio::test]
async fn allowlisted_email_is_promoted_on_first_request() {
    let t = setup().await;
    let root_id = t.profile_with_role("root@atelier.io", Role::User).await;
    let token = sign(root_id, "root@atelier.io");

    let (status, _, body) = t.send(authed("GET", "/auth/me", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "super_admin");
}

#[tokio::test]
async fn logout_clears_cookie() {
    let t = setup().await;
    let token = sign(t.identity.id, &t.identity.email);
    let req = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::COOKIE, format!("atelier_session={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = t.send(req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(
        set_cookies(&headers)
            .iter()
            .any(|c| c.starts_with("atelier_session=") && c.contains("Max-Age=0"))
    );
}
