//! Login, session persistence and logout against the fake backend.

use little_sun_core::Route;
use little_sun_dashboard::models::session_keys as keys;
use little_sun_dashboard::services::SearchOutcome;
use little_sun_dashboard::storage::KeyValueStore;
use little_sun_dashboard::{Dashboard, ErrorKind};
use little_sun_integration_tests::{FakeBackend, USER_NAME, USER_PICTURE, VALID_CREDENTIAL};
use tempfile::TempDir;

async fn setup() -> (FakeBackend, TempDir) {
    let backend = FakeBackend::start()
        .await
        .expect("Failed to start fake backend");
    let dir = TempDir::new().expect("Failed to create state dir");
    (backend, dir)
}

#[tokio::test]
async fn test_login_persists_session_and_opens_dashboard() {
    let (backend, dir) = setup().await;
    let config = backend.config(dir.path()).expect("Invalid config");
    let (dashboard, store) = Dashboard::open(config).expect("Failed to open dashboard");

    assert_eq!(dashboard.navigate("/login").expect("navigate"), Route::Login);

    let user = dashboard
        .login(VALID_CREDENTIAL)
        .await
        .expect("Login should succeed");

    assert_eq!(user.name, USER_NAME);
    assert!(user.expires_at.is_some());
    assert_eq!(dashboard.current_route(), Route::Dashboard);
    assert!(dashboard.session().is_logged_in());
    assert_eq!(backend.logins(), 1);

    // Durable storage holds the four session keys
    assert_eq!(store.get(keys::IS_LOGGED_IN).as_deref(), Some("true"));
    assert_eq!(store.get(keys::USER_NAME).as_deref(), Some(USER_NAME));
    assert_eq!(store.get(keys::USER_PICTURE).as_deref(), Some(USER_PICTURE));
    assert!(store.get(keys::EXPIRE_AT).is_some());

    let display = dashboard.profile().display();
    assert!(display.is_logged_in);
    assert_eq!(display.user_name, USER_NAME);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let (backend, dir) = setup().await;

    {
        let config = backend.config(dir.path()).expect("Invalid config");
        let (dashboard, _store) = Dashboard::open(config).expect("Failed to open dashboard");
        dashboard
            .login(VALID_CREDENTIAL)
            .await
            .expect("Login should succeed");
    }

    let config = backend.config(dir.path()).expect("Invalid config");
    let (restarted, _store) = Dashboard::open(config).expect("Failed to reopen dashboard");

    assert!(restarted.session().is_logged_in());
    assert_eq!(restarted.navigate("/table").expect("navigate"), Route::Table);
    assert_eq!(restarted.profile().display().user_name, USER_NAME);

    // The backend still recognizes the restored session
    let outcome = restarted
        .search("lin")
        .await
        .expect("Search after restart");
    let SearchOutcome::Results(records) = outcome else {
        panic!("expected results, got {outcome:?}");
    };
    assert_eq!(records.len(), 2);
    assert_eq!(backend.searches(), vec!["lin".to_string()]);
    assert_eq!(restarted.table().len(), 2);
}

#[tokio::test]
async fn test_logout_after_restart_ends_backend_session() {
    let (backend, dir) = setup().await;
    let config = backend.config(dir.path()).expect("Invalid config");
    let cookie_file = config.cookie_file();

    {
        let (dashboard, _store) = Dashboard::open(config.clone()).expect("Failed to open dashboard");
        dashboard
            .login(VALID_CREDENTIAL)
            .await
            .expect("Login should succeed");
    }
    assert!(cookie_file.exists());

    // A fresh process logging out, as the one-shot command does
    let (restarted, store) = Dashboard::open(config).expect("Failed to reopen dashboard");
    restarted.logout().await.expect("Logout should succeed");

    assert_eq!(backend.logouts(), 1);
    assert!(!backend.session_active());
    assert_eq!(store.get(keys::IS_LOGGED_IN), None);
    assert!(!cookie_file.exists());
}

#[tokio::test]
async fn test_backend_session_loss_logs_out_on_search() {
    let (backend, dir) = setup().await;
    let config = backend.config(dir.path()).expect("Invalid config");
    let cookie_file = config.cookie_file();
    let (dashboard, store) = Dashboard::open(config).expect("Failed to open dashboard");
    dashboard
        .login(VALID_CREDENTIAL)
        .await
        .expect("Login should succeed");
    assert_eq!(dashboard.navigate("/table").expect("navigate"), Route::Table);

    backend.end_sessions();
    let err = dashboard
        .search("lin")
        .await
        .expect_err("Backend no longer knows the session");

    assert_eq!(err.kind(), ErrorKind::SessionExpired);
    assert_eq!(err.user_message(), "Session expired, please log in again");
    assert!(!dashboard.session().is_logged_in());
    assert_eq!(dashboard.current_route(), Route::Login);
    assert!(!dashboard.profile().display().is_logged_in);
    for key in keys::ALL {
        assert_eq!(store.get(key), None, "{key} should be removed");
    }
    assert!(!cookie_file.exists());

    // Logging in again restores access
    dashboard
        .login(VALID_CREDENTIAL)
        .await
        .expect("Login should succeed");
    assert!(matches!(
        dashboard.search("lin").await.expect("Search"),
        SearchOutcome::Results(_)
    ));
}

#[tokio::test]
async fn test_rejected_credential_stays_on_login() {
    let (backend, dir) = setup().await;
    let config = backend.config(dir.path()).expect("Invalid config");
    let (dashboard, store) = Dashboard::open(config).expect("Failed to open dashboard");

    let err = dashboard
        .login("forged.credential")
        .await
        .expect_err("Forged credential should be refused");

    assert_eq!(err.kind(), ErrorKind::AuthDenied);
    assert_eq!(dashboard.current_route(), Route::Login);
    assert!(!dashboard.session().is_logged_in());
    assert_eq!(store.get(keys::IS_LOGGED_IN), None);
    assert_eq!(backend.logins(), 0);
}

#[tokio::test]
async fn test_protected_routes_redirect_until_login() {
    let (backend, dir) = setup().await;
    let config = backend.config(dir.path()).expect("Invalid config");
    let (dashboard, _store) = Dashboard::open(config).expect("Failed to open dashboard");

    for path in ["/", "/table", "/dashboard", "/address-form"] {
        assert_eq!(dashboard.navigate(path).expect("navigate"), Route::Login);
    }
    assert_eq!(dashboard.history().count(Route::Table), 0);

    dashboard
        .login(VALID_CREDENTIAL)
        .await
        .expect("Login should succeed");

    assert_eq!(dashboard.navigate("/").expect("navigate"), Route::Table);
    assert_eq!(
        dashboard.navigate("/address-form").expect("navigate"),
        Route::AddressForm
    );
}

#[tokio::test]
async fn test_logout_clears_local_and_remote_session() {
    let (backend, dir) = setup().await;
    let config = backend.config(dir.path()).expect("Invalid config");
    let (dashboard, store) = Dashboard::open(config).expect("Failed to open dashboard");
    dashboard
        .login(VALID_CREDENTIAL)
        .await
        .expect("Login should succeed");

    dashboard.logout().await.expect("Logout should succeed");

    assert_eq!(backend.logouts(), 1);
    assert!(!backend.session_active());
    assert!(dashboard.api().cookies().is_empty());
    assert!(!dashboard.session().is_logged_in());
    assert_eq!(dashboard.current_route(), Route::Login);
    assert!(!dashboard.profile().display().is_logged_in);
    for key in keys::ALL {
        assert_eq!(store.get(key), None, "{key} should be removed");
    }

    // The backend dropped its cookie too
    assert!(dashboard.api().profile().await.is_err());
}

#[tokio::test]
async fn test_remote_profile_uses_session_cookie() {
    let (backend, dir) = setup().await;
    let config = backend.config(dir.path()).expect("Invalid config");
    let (dashboard, _store) = Dashboard::open(config).expect("Failed to open dashboard");

    let err = dashboard
        .api()
        .profile()
        .await
        .expect_err("Profile needs a session");
    assert!(err.is_unauthorized());

    dashboard
        .login(VALID_CREDENTIAL)
        .await
        .expect("Login should succeed");
    let profile = dashboard.api().profile().await.expect("Profile request");
    assert_eq!(profile.name, USER_NAME);
    assert_eq!(profile.active_sessions, 1);
}
