use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use tollgate_auth::{
    AuthConfig, AuthCore, AuthError, AuthRequest, AuthorizationDecision, DenyReason, Feature,
    InMemoryUserStore, Principal, RegisterRequest, Requirement, Role, Stage, SubscriptionTier,
    TokenError, TokenService, UserStore,
};

const SECRET: &str = "scenario-signing-secret";

fn config() -> AuthConfig {
    let mut config = AuthConfig::subscription_service(SECRET);
    // Cheap hashing keeps the suite fast; production keeps the defaults.
    config.password_work_factor = 1;
    config.password_memory_kib = 8;
    config
}

fn core(config: &AuthConfig) -> (Arc<InMemoryUserStore>, AuthCore<Arc<InMemoryUserStore>>) {
    let store = Arc::new(InMemoryUserStore::new());
    let core = AuthCore::from_config(config, store.clone()).expect("valid config");
    (store, core)
}

fn register(email: &str, role: Option<Role>) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "secret1".to_string(),
        role,
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Seed the root account and resolve its principal through the pipeline.
fn bootstrap_root(core: &AuthCore<Arc<InMemoryUserStore>>, now: DateTime<Utc>) -> Principal {
    let root = core
        .lifecycle
        .bootstrap_root(register("root@x.com", None), now)
        .unwrap();
    let header = bearer(&root.token.token);
    core.pipeline
        .authorize(
            &AuthRequest::from_header(Some(header.as_str())),
            Requirement::Role(Role::SuperAdmin),
            now,
        )
        .unwrap()
}

#[test]
fn self_registration_as_data_entry_yields_matching_claims() {
    let (_, core) = core(&config());
    let now = Utc::now();

    let session = core
        .lifecycle
        .register(register("a@x.com", Some(Role::DataEntry)), None, now)
        .unwrap();

    let claims = TokenService::new(SECRET)
        .verify(&session.token.token, now)
        .unwrap();
    assert_eq!(claims.role, Role::DataEntry);
    assert_eq!(claims.sub, session.account.id);
}

#[test]
fn self_registration_as_root_is_refused() {
    let (store, core) = core(&config());
    let err = core
        .lifecycle
        .register(register("a@x.com", Some(Role::SuperAdmin)), None, Utc::now())
        .unwrap_err();

    assert_eq!(err, AuthError::InsufficientPrivilege);
    assert!(store.find_by_identity("a@x.com").unwrap().is_none());
}

#[test]
fn wrong_password_and_unknown_email_share_one_error() {
    let (_, core) = core(&config());
    let now = Utc::now();
    core.lifecycle
        .register(register("a@x.com", None), None, now)
        .unwrap();

    let wrong = core.lifecycle.login("a@x.com", "secret2", now).unwrap_err();
    let unknown = core.lifecycle.login("ghost@x.com", "secret1", now).unwrap_err();

    assert_eq!(wrong, AuthError::InvalidCredentials);
    assert_eq!(wrong.code(), unknown.code());
    assert_eq!(wrong.rejection(), unknown.rejection());
}

#[test]
fn viewer_requesting_admin_operation_is_insufficient() {
    let (_, core) = core(&config());
    let now = Utc::now();
    let session = core
        .lifecycle
        .register(register("v@x.com", Some(Role::Viewer)), None, now)
        .unwrap();
    let header = bearer(&session.token.token);

    let decision = core
        .pipeline
        .evaluate(
            &AuthRequest::from_header(Some(header.as_str())),
            Requirement::Role(Role::Admin),
            now,
        )
        .unwrap();
    assert_eq!(
        decision,
        AuthorizationDecision::Deny(DenyReason::InsufficientPrivilege)
    );
}

#[test]
fn lapsed_subscription_wins_over_role_check() {
    let (_, core) = core(&config());
    let registered_at = Utc::now() - Duration::days(31);
    let session = core
        .lifecycle
        .register(register("v@x.com", Some(Role::Viewer)), None, registered_at)
        .unwrap();

    // Fresh token, subscription expired yesterday.
    let now = Utc::now();
    let login = core.lifecycle.login("v@x.com", "secret1", now).unwrap();
    assert!(login.account.subscription_expires_at < now);
    let header = bearer(&login.token.token);

    let err = core
        .pipeline
        .authorize(
            &AuthRequest::from_header(Some(header.as_str())),
            Requirement::Role(Role::Admin),
            now,
        )
        .unwrap_err();
    assert_eq!(err, AuthError::SubscriptionExpired);
    assert_eq!(err.code().http_status(), 410);

    // Renewal reopens access.
    core.lifecycle
        .renew(session.account.id, SubscriptionTier::Pro, now)
        .unwrap();
    let principal = core
        .pipeline
        .authorize(
            &AuthRequest::from_header(Some(header.as_str())),
            Requirement::Feature(Feature::HistoricalData),
            now,
        )
        .unwrap();
    assert_eq!(principal.tier(), SubscriptionTier::Pro);
}

#[test]
fn renewing_twice_restarts_from_the_second_call() {
    let (_, core) = core(&config());
    let t0 = Utc::now();
    let session = core
        .lifecycle
        .register(register("r@x.com", None), None, t0)
        .unwrap();

    let t1 = t0 + Duration::days(3);
    let t2 = t0 + Duration::days(10);
    core.lifecycle
        .renew(session.account.id, SubscriptionTier::Standard, t1)
        .unwrap();
    let account = core
        .lifecycle
        .renew(session.account.id, SubscriptionTier::Standard, t2)
        .unwrap();

    assert_eq!(account.subscription_expires_at, t2 + config().renewal_period());
}

#[test]
fn token_expires_after_configured_ttl() {
    let config = config();
    let (_, core) = core(&config);
    let now = Utc::now();
    let session = core
        .lifecycle
        .register(register("t@x.com", None), None, now)
        .unwrap();
    let header = bearer(&session.token.token);
    let request = AuthRequest::from_header(Some(header.as_str()));

    assert!(core.pipeline.authorize(&request, Requirement::Authenticated, now).is_ok());

    let later = now + config.token_ttl() + Duration::seconds(1);
    assert_eq!(
        core.pipeline
            .authorize(&request, Requirement::Authenticated, later)
            .unwrap_err(),
        AuthError::TokenInvalid(TokenError::Expired)
    );
}

#[test]
fn operations_profile_skips_subscription_stage() {
    let mut config = AuthConfig::operations(SECRET);
    config.password_work_factor = 1;
    config.password_memory_kib = 8;
    let (_, core) = core(&config);

    assert!(!core.pipeline.stages().contains(&Stage::SubscriptionCheck));

    let registered_at = Utc::now() - Duration::days(60);
    core.lifecycle
        .register(register("ops@x.com", Some(Role::DataEntry)), None, registered_at)
        .unwrap();

    let now = Utc::now();
    let login = core.lifecycle.login("ops@x.com", "secret1", now).unwrap();
    let header = bearer(&login.token.token);

    let principal = core
        .pipeline
        .authorize(
            &AuthRequest::from_header(Some(header.as_str())),
            Requirement::Role(Role::Viewer),
            now,
        )
        .unwrap();
    assert_eq!(principal.role(), Role::DataEntry);
}

#[test]
fn suspension_blocks_existing_tokens_on_next_request() {
    let (store, core) = core(&config());
    let now = Utc::now();
    let root = bootstrap_root(&core, now);

    let user = core
        .lifecycle
        .register(register("u@x.com", None), None, now)
        .unwrap();
    let user_header = bearer(&user.token.token);
    let user_request = AuthRequest::from_header(Some(user_header.as_str()));
    assert!(core.pipeline.authorize(&user_request, Requirement::Authenticated, now).is_ok());

    core.lifecycle.set_active(&root, user.account.id, false).unwrap();
    assert!(!store.find_by_id(user.account.id).unwrap().unwrap().is_active);

    assert_eq!(
        core.pipeline
            .authorize(&user_request, Requirement::Authenticated, now)
            .unwrap_err(),
        AuthError::AccountSuspended
    );
}

#[test]
fn anonymous_caller_cannot_become_an_administrator() {
    let (store, core) = core(&config());
    let now = Utc::now();
    let root = bootstrap_root(&core, now);
    let admin = core
        .lifecycle
        .register(register("admin@x.com", Some(Role::Admin)), Some(&root), now)
        .unwrap();

    for role in [Role::Admin, Role::SystemAdmin] {
        assert_eq!(
            core.lifecycle
                .register(register("mallory@x.com", Some(role)), None, now)
                .unwrap_err(),
            AuthError::InsufficientPrivilege
        );
    }
    assert!(store.find_by_identity("mallory@x.com").unwrap().is_none());

    // The best an anonymous caller gets cannot touch the admin.
    let mallory = core
        .lifecycle
        .register(register("mallory@x.com", Some(Role::DataEntry)), None, now)
        .unwrap();
    let header = bearer(&mallory.token.token);
    let mallory = core
        .pipeline
        .authorize(
            &AuthRequest::from_header(Some(header.as_str())),
            Requirement::Authenticated,
            now,
        )
        .unwrap();

    assert_eq!(
        core.lifecycle
            .set_active(&mallory, admin.account.id, false)
            .unwrap_err(),
        AuthError::InsufficientPrivilege
    );
    assert!(store.find_by_id(admin.account.id).unwrap().unwrap().is_active);
}

#[test]
fn oversized_durations_fail_setup_instead_of_panicking() {
    let mut oversized = config();
    oversized.token_ttl_secs = i64::MAX;
    assert!(AuthCore::from_config(&oversized, Arc::new(InMemoryUserStore::new())).is_err());

    let mut oversized = config();
    oversized.renewal_period_secs = 9_000_000_000_000;
    assert!(AuthCore::from_config(&oversized, Arc::new(InMemoryUserStore::new())).is_err());
}

#[test]
fn rotated_secret_rejects_tokens_from_before_rotation_without_grace() {
    let (store, core) = core(&config());
    let now = Utc::now();
    let session = core
        .lifecycle
        .register(register("k@x.com", None), None, now)
        .unwrap();

    let mut rotated_config = config();
    rotated_config.signing_secret = "a-completely-new-secret".to_string();
    let rotated = AuthCore::from_config(&rotated_config, store).unwrap();

    let header = bearer(&session.token.token);
    assert_eq!(
        rotated
            .pipeline
            .authorize(
                &AuthRequest::from_header(Some(header.as_str())),
                Requirement::Authenticated,
                now,
            )
            .unwrap_err(),
        AuthError::TokenInvalid(TokenError::SignatureInvalid)
    );
}

#[test]
fn rotated_core_honours_previous_secret_during_grace() {
    let (store, core) = core(&config());
    let now = Utc::now();
    let session = core
        .lifecycle
        .register(register("g@x.com", None), None, now)
        .unwrap();

    let grace_until = now + Duration::hours(1);
    let tokens = TokenService::new(SECRET).rotate("a-completely-new-secret", grace_until);
    let rotated = AuthCore::with_tokens(&config(), store, tokens).unwrap();

    let header = bearer(&session.token.token);
    let request = AuthRequest::from_header(Some(header.as_str()));
    assert!(rotated.pipeline.authorize(&request, Requirement::Authenticated, now).is_ok());
    assert_eq!(
        rotated
            .pipeline
            .authorize(&request, Requirement::Authenticated, grace_until + Duration::seconds(1))
            .unwrap_err(),
        AuthError::TokenInvalid(TokenError::SignatureInvalid)
    );

    // New sessions are signed with the new secret.
    let fresh = rotated.lifecycle.login("g@x.com", "secret1", now).unwrap();
    assert!(
        TokenService::new("a-completely-new-secret")
            .verify(&fresh.token.token, now)
            .is_ok()
    );
}
