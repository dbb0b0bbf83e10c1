//! Guard scenarios across the verifier, throttle, provider, session and
//! evaluator

mod fixture {
    use std::sync::Arc;

    use kernel::id::{TenantId, UserId};
    use platform::clock::ManualClock;
    use platform::rate_limit::LoginThrottle;

    use crate::application::{AuthConfig, Guard};
    use crate::domain::entity::tenant_membership::TenantMembership;
    use crate::domain::repository::SessionStore;
    use crate::domain::value_object::user_password::RawPassword;
    use crate::infra::{InMemoryUserProvider, MemorySession};

    pub const EMAIL: &str = "ana@example.com";
    pub const SECRET: &str = "Correct-Horse-42";
    pub const START: i64 = 1_700_000_000;

    pub struct Fixture {
        pub provider: Arc<InMemoryUserProvider>,
        pub session: Arc<MemorySession>,
        pub clock: Arc<ManualClock>,
        pub throttle: Arc<LoginThrottle>,
        pub config: Arc<AuthConfig>,
    }

    impl Fixture {
        pub async fn new() -> Self {
            Self::with_config(AuthConfig {
                max_attempts: 3,
                ..AuthConfig::default()
            })
            .await
        }

        pub async fn with_config(config: AuthConfig) -> Self {
            let provider = Arc::new(InMemoryUserProvider::new(config.password_pepper.clone()));
            let raw = RawPassword::new(SECRET.to_string()).unwrap();
            let user = provider.register(UserId::from(1), EMAIL, &raw).await.unwrap();
            provider
                .insert(
                    user.with_role("admin")
                        .with_membership(
                            TenantMembership::new(TenantId::from("acme"))
                                .with_role("manager")
                                .with_permission("read.*")
                                .with_permission("write.invoices"),
                        )
                        .with_membership(
                            TenantMembership::new(TenantId::from("globex"))
                                .with_permission("delete.clients"),
                        ),
                )
                .await;

            Self {
                provider,
                session: Arc::new(MemorySession::new()),
                clock: Arc::new(ManualClock::at_timestamp(START)),
                throttle: Arc::new(LoginThrottle::new(config.rate_limit())),
                config: Arc::new(config),
            }
        }

        /// Guard sharing the fixture's session, clock and throttle
        pub fn guard(&self) -> Guard {
            self.guard_with_session(self.session.clone())
        }

        /// Guard of another client: own session, shared clock and throttle
        pub fn guard_with_session(&self, session: Arc<MemorySession>) -> Guard {
            Guard::new(self.provider.clone(), self.config.clone())
                .with_session(session)
                .with_clock(self.clock.clone())
                .with_throttle(self.throttle.clone())
        }

        pub fn session_user(&self) -> Option<String> {
            self.session.get(&self.config.session_key)
        }
    }
}

mod attempt_tests {
    use std::time::{Duration, Instant};

    use super::fixture::*;
    use crate::domain::value_object::credentials::Credentials;
    use crate::domain::value_object::user_status::UserStatus;
    use crate::error::AuthError;
    use kernel::error::kind::ErrorKind;
    use kernel::id::UserId;

    #[tokio::test]
    async fn test_correct_secret_logs_in_and_persists_session() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        assert!(guard.guest());

        let ok = guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();

        assert!(ok);
        assert!(guard.check());
        assert_eq!(guard.id(), Some(&UserId::from(1)));
        assert!(!guard.via_remember());
        assert!(guard.recaller().is_none());
        assert_eq!(fx.session_user().as_deref(), Some("1"));
        assert!(guard.user().unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_wrong_secret_and_unknown_identifier_look_the_same() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();

        let wrong = guard
            .attempt(&Credentials::password(EMAIL, "Wrong-Horse-42"), false)
            .await
            .unwrap();
        let unknown = guard
            .attempt(&Credentials::password("bo@example.com", SECRET), false)
            .await
            .unwrap();

        assert!(!wrong);
        assert!(!unknown);
        assert!(guard.guest());
        assert_eq!(guard.attempts(EMAIL), 1);
        assert_eq!(guard.attempts("bo@example.com"), 1);
        assert!(fx.session_user().is_none());
    }

    #[tokio::test]
    async fn test_unknown_identifier_costs_a_full_secret_check() {
        let fx = Fixture::new().await;
        let guard = fx.guard();
        let known = Credentials::password(EMAIL, "Wrong-Horse-42");
        let unknown = Credentials::password("bo@example.com", "Wrong-Horse-42");

        // first unknown lookup also builds the decoy hash
        assert!(!guard.validate(&unknown).await.unwrap());

        let mut fastest_known = Duration::MAX;
        let mut fastest_unknown = Duration::MAX;
        for _ in 0..3 {
            let started = Instant::now();
            assert!(!guard.validate(&known).await.unwrap());
            fastest_known = fastest_known.min(started.elapsed());

            let started = Instant::now();
            assert!(!guard.validate(&unknown).await.unwrap());
            fastest_unknown = fastest_unknown.min(started.elapsed());
        }
        assert!(
            fastest_unknown * 4 >= fastest_known,
            "unknown {fastest_unknown:?} vs known {fastest_known:?}"
        );
    }

    #[tokio::test]
    async fn test_validate_does_not_log_in() {
        let fx = Fixture::new().await;
        let guard = fx.guard();

        assert!(guard.validate(&Credentials::password(EMAIL, SECRET)).await.unwrap());
        assert!(!guard.validate(&Credentials::password(EMAIL, "nope")).await.unwrap());
        assert!(guard.guest());
        assert_eq!(guard.attempts(EMAIL), 0);
    }

    #[tokio::test]
    async fn test_once_keeps_session_untouched() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();

        assert!(guard.once(&Credentials::password(EMAIL, SECRET)).await.unwrap());
        assert!(guard.check());
        assert!(fx.session_user().is_none());
        assert!(guard.recaller().is_none());
    }

    #[tokio::test]
    async fn test_disabled_account_is_refused() {
        let fx = Fixture::new().await;
        fx.provider
            .set_status(&UserId::from(1), UserStatus::Disabled)
            .await
            .unwrap();
        let mut guard = fx.guard();

        let err = guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::AccountLocked));
        assert!(guard.guest());
        assert!(fx.session_user().is_none());
    }

    #[tokio::test]
    async fn test_provider_outage_is_an_error_not_a_failure() {
        let fx = Fixture::new().await;
        fx.provider.set_available(false);
        let mut guard = fx.guard();

        let err = guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
        assert!(err.is_fault());
        assert!(guard.guest());
        assert_eq!(guard.attempts(EMAIL), 0);
    }

    #[tokio::test]
    async fn test_login_using_id() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();

        assert!(
            guard
                .login_using_id(&UserId::from(99), false)
                .await
                .unwrap()
                .is_none()
        );
        assert!(guard.guest());

        let user = guard.login_using_id(&UserId::from(1), false).await.unwrap();
        assert_eq!(user.map(|u| u.identifier.as_str()), Some(EMAIL));
        assert_eq!(fx.session_user().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_once_using_id_and_set_user() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();

        assert!(guard.once_using_id(&UserId::from(1)).await.unwrap().is_some());
        assert!(guard.check());
        assert!(fx.session_user().is_none());

        let other = fx.provider.get(&UserId::from(1)).await.unwrap().with_role("auditor");
        guard.set_user(other);
        assert_eq!(guard.user().map(|u| u.role.as_str()), Some("auditor"));
    }
}

mod lockout_tests {
    use super::fixture::*;
    use crate::domain::value_object::credentials::Credentials;
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_lockout_rejects_even_the_correct_secret() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        let wrong = Credentials::password(EMAIL, "Wrong-Horse-42");

        for _ in 0..3 {
            assert!(!guard.attempt(&wrong, false).await.unwrap());
        }

        let err = guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap_err();
        match err {
            AuthError::LockoutExceeded {
                retry_after_secs, ..
            } => assert_eq!(retry_after_secs, 15 * 60),
            other => panic!("expected lockout, got {other:?}"),
        }
        assert!(guard.guest());
        // locked attempts are not counted again
        assert_eq!(guard.attempts(EMAIL), 3);
    }

    #[tokio::test]
    async fn test_lockout_expires_after_window() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        let wrong = Credentials::password(EMAIL, "Wrong-Horse-42");
        for _ in 0..3 {
            guard.attempt(&wrong, false).await.unwrap();
        }

        fx.clock.advance(chrono::Duration::seconds(15 * 60 - 1));
        assert!(matches!(
            guard.attempt(&Credentials::password(EMAIL, SECRET), false).await,
            Err(AuthError::LockoutExceeded { retry_after_secs: 1, .. })
        ));

        fx.clock.advance(chrono::Duration::seconds(1));
        assert!(
            guard
                .attempt(&Credentials::password(EMAIL, SECRET), false)
                .await
                .unwrap()
        );
        assert_eq!(guard.attempts(EMAIL), 0);
    }

    #[tokio::test]
    async fn test_success_resets_the_counter() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();

        guard
            .attempt(&Credentials::password(EMAIL, "Wrong-Horse-42"), false)
            .await
            .unwrap();
        guard
            .attempt(&Credentials::password(EMAIL, "Wrong-Horse-42"), false)
            .await
            .unwrap();
        assert_eq!(guard.attempts(EMAIL), 2);

        assert!(
            guard
                .attempt(&Credentials::password(EMAIL, SECRET), false)
                .await
                .unwrap()
        );
        assert_eq!(guard.attempts(EMAIL), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_wrong_secrets_stop_at_the_threshold() {
        let fx = Fixture::new().await;
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let mut guard = fx.guard_with_session(Default::default());
                tokio::spawn(async move {
                    guard
                        .attempt(&Credentials::password(EMAIL, "Wrong-Horse-42"), false)
                        .await
                })
            })
            .collect();

        let mut verified = 0;
        let mut locked = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(false) => verified += 1,
                Err(AuthError::LockoutExceeded { .. }) => locked += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(verified, 3);
        assert_eq!(locked, 13);
        assert_eq!(fx.guard().attempts(EMAIL), 3);
    }

    #[tokio::test]
    async fn test_lockout_is_shared_between_guards() {
        let fx = Fixture::new().await;
        let wrong = Credentials::password(EMAIL, "Wrong-Horse-42");
        for _ in 0..3 {
            let mut guard = fx.guard_with_session(Default::default());
            guard.attempt(&wrong, false).await.unwrap();
        }

        let mut fresh = fx.guard_with_session(Default::default());
        assert!(matches!(
            fresh.attempt(&Credentials::password(EMAIL, SECRET), false).await,
            Err(AuthError::LockoutExceeded { .. })
        ));
    }
}

mod remember_tests {
    use std::sync::Arc;

    use super::fixture::*;
    use crate::domain::repository::SessionStore;
    use crate::domain::value_object::credentials::Credentials;
    use crate::domain::value_object::user_password::RawPassword;
    use crate::error::AuthError;
    use crate::infra::MemorySession;
    use kernel::id::UserId;

    async fn remembered(fx: &Fixture) -> String {
        let mut guard = fx.guard();
        assert!(
            guard
                .attempt(&Credentials::password(EMAIL, SECRET), true)
                .await
                .unwrap()
        );
        guard.recaller().unwrap().to_value()
    }

    #[tokio::test]
    async fn test_recaller_restores_login() {
        let fx = Fixture::new().await;
        let recaller = remembered(&fx).await;
        assert!(recaller.starts_with("1|"));

        let mut other = fx.guard_with_session(Arc::new(MemorySession::new()));
        assert!(other.login_via_remember(&recaller).await.unwrap());
        assert!(other.check());
        assert!(other.via_remember());
        assert_eq!(other.id(), Some(&UserId::from(1)));
    }

    #[tokio::test]
    async fn test_numeric_looking_string_id_is_remembered() {
        let fx = Fixture::new().await;
        let raw = RawPassword::new(SECRET.to_string()).unwrap();
        fx.provider
            .register(UserId::from(42), "int@example.com", &raw)
            .await
            .unwrap();
        fx.provider
            .register(UserId::from("00042"), "pad@example.com", &raw)
            .await
            .unwrap();

        let mut guard = fx.guard();
        assert!(
            guard
                .attempt(&Credentials::password("pad@example.com", SECRET), true)
                .await
                .unwrap()
        );
        let recaller = guard.recaller().unwrap().to_value();

        let mut other = fx.guard_with_session(Arc::new(MemorySession::new()));
        assert!(other.login_via_remember(&recaller).await.unwrap());
        assert_eq!(other.id(), Some(&UserId::from("00042")));
    }

    #[tokio::test]
    async fn test_remembered_login_rotates_token() {
        let fx = Fixture::new().await;
        let first = remembered(&fx).await;
        let second = remembered(&fx).await;
        assert_ne!(first, second);

        let mut other = fx.guard_with_session(Arc::new(MemorySession::new()));
        assert!(!other.login_via_remember(&first).await.unwrap());
        assert!(other.login_via_remember(&second).await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_invalidates_recaller() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        guard
            .attempt(&Credentials::password(EMAIL, SECRET), true)
            .await
            .unwrap();
        let recaller = guard.recaller().unwrap().to_value();
        let session_id = fx.session.id();

        guard.logout().await.unwrap();

        assert!(guard.guest());
        assert!(guard.recaller().is_none());
        assert!(fx.session_user().is_none());
        assert_ne!(fx.session.id(), session_id);

        let mut other = fx.guard_with_session(Arc::new(MemorySession::new()));
        assert!(!other.login_via_remember(&recaller).await.unwrap());
        assert!(other.guest());
    }

    #[tokio::test]
    async fn test_logout_without_remember_still_rotates() {
        let fx = Fixture::new().await;
        let recaller = remembered(&fx).await;

        // a second device logged in without remember-me logs out
        let mut device = fx.guard_with_session(Arc::new(MemorySession::new()));
        device
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();
        device.logout().await.unwrap();

        let mut other = fx.guard_with_session(Arc::new(MemorySession::new()));
        assert!(!other.login_via_remember(&recaller).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_recallers_are_rejected() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        for value in ["", "1", "1|", "|token", "2|whatever"] {
            assert!(!guard.login_via_remember(value).await.unwrap(), "{value}");
        }
        assert!(guard.guest());
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_state() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();

        fx.provider.set_available(false);
        assert!(matches!(
            guard.logout().await,
            Err(AuthError::ProviderUnavailable(_))
        ));
        assert!(guard.check());

        fx.provider.set_available(true);
        guard.logout().await.unwrap();
        assert!(guard.guest());
    }

    #[tokio::test]
    async fn test_logout_as_guest_is_a_no_op() {
        let fx = Fixture::new().await;
        fx.provider.set_available(false);
        let mut guard = fx.guard();
        guard.logout().await.unwrap();
        assert!(guard.guest());
    }
}

mod resume_tests {
    use std::sync::Arc;

    use super::fixture::*;
    use crate::domain::repository::SessionStore;
    use crate::domain::value_object::credentials::Credentials;
    use crate::domain::value_object::user_password::RawPassword;
    use crate::domain::value_object::user_status::UserStatus;
    use crate::error::AuthError;
    use crate::infra::MemorySession;
    use kernel::id::UserId;

    #[tokio::test]
    async fn test_resume_from_session() {
        let fx = Fixture::new().await;
        fx.guard()
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();

        let mut next_request = fx.guard();
        assert!(next_request.resume(None).await.unwrap());
        assert_eq!(next_request.id(), Some(&UserId::from(1)));
        assert!(!next_request.via_remember());
    }

    #[tokio::test]
    async fn test_resume_keeps_string_ids_apart_from_numeric_ones() {
        let fx = Fixture::new().await;
        let raw = RawPassword::new(SECRET.to_string()).unwrap();
        fx.provider
            .register(UserId::from(42), "int@example.com", &raw)
            .await
            .unwrap();
        fx.provider
            .register(UserId::from("42"), "str@example.com", &raw)
            .await
            .unwrap();
        fx.guard()
            .attempt(&Credentials::password("str@example.com", SECRET), false)
            .await
            .unwrap();

        let mut next_request = fx.guard();
        assert!(next_request.resume(None).await.unwrap());
        assert_eq!(next_request.id(), Some(&UserId::from("42")));
    }

    #[tokio::test]
    async fn test_resume_drops_unreadable_session_entry() {
        let fx = Fixture::new().await;
        fx.session.put(&fx.config.session_key, "usr_1".to_string());

        let mut guard = fx.guard();
        assert!(!guard.resume(None).await.unwrap());
        assert!(fx.session_user().is_none());
    }

    #[tokio::test]
    async fn test_resume_falls_back_to_recaller() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        guard
            .attempt(&Credentials::password(EMAIL, SECRET), true)
            .await
            .unwrap();
        let recaller = guard.recaller().unwrap().to_value();

        let session = Arc::new(MemorySession::new());
        let mut returning = fx.guard_with_session(session);
        assert!(!returning.resume(None).await.unwrap());
        assert!(returning.resume(Some(&recaller)).await.unwrap());
        assert!(returning.via_remember());
    }

    #[tokio::test]
    async fn test_resume_drops_session_of_disabled_user() {
        let fx = Fixture::new().await;
        fx.guard()
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();
        fx.provider
            .set_status(&UserId::from(1), UserStatus::Disabled)
            .await
            .unwrap();

        let mut guard = fx.guard();
        assert!(!guard.resume(None).await.unwrap());
        assert!(fx.session_user().is_none());
    }

    #[tokio::test]
    async fn test_remember_login_of_disabled_user_is_refused() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        guard
            .attempt(&Credentials::password(EMAIL, SECRET), true)
            .await
            .unwrap();
        let recaller = guard.recaller().unwrap().to_value();
        fx.provider
            .set_status(&UserId::from(1), UserStatus::Disabled)
            .await
            .unwrap();

        let mut other = fx.guard_with_session(Arc::new(MemorySession::new()));
        assert!(matches!(
            other.login_via_remember(&recaller).await,
            Err(AuthError::AccountLocked)
        ));
    }
}

mod token_tests {
    use super::fixture::*;
    use crate::application::TokenCodec;
    use platform::clock::Clock;
    use crate::domain::value_object::credentials::Credentials;
    use crate::error::AuthError;
    use kernel::id::UserId;

    #[tokio::test]
    async fn test_issued_token_authenticates_its_subject() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        assert!(guard.issue_token().unwrap().is_none());

        guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();
        let token = guard.issue_token().unwrap().unwrap();

        let mut api = fx.guard_with_session(Default::default());
        let user = api.authenticate_bearer(Some(&token)).await.unwrap();
        assert_eq!(user.id, UserId::from(1));
        assert!(api.check());

        let claims = TokenCodec::from_config(&fx.config)
            .verify(Some(&token), fx.clock.now())
            .unwrap();
        assert_eq!(claims.subject_id, UserId::from(1));
        assert_eq!(claims.email, EMAIL);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.expires_at - claims.issued_at, 3600);
    }

    #[tokio::test]
    async fn test_bearer_token_refusals() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();
        let token = guard.issue_token().unwrap().unwrap();
        let mut api = fx.guard_with_session(Default::default());

        assert!(matches!(
            api.authenticate_bearer(None).await,
            Err(AuthError::TokenMissing)
        ));

        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert!(matches!(
            api.authenticate_bearer(Some(&tampered)).await,
            Err(AuthError::TokenInvalid)
        ));
        assert!(!api.validate(&Credentials::bearer(tampered)).await.unwrap());
        assert!(api.validate(&Credentials::bearer(token.clone())).await.unwrap());

        fx.clock.advance(chrono::Duration::hours(1));
        assert!(matches!(
            api.authenticate_bearer(Some(&token)).await,
            Err(AuthError::SessionExpired)
        ));
        assert!(api.guest());
    }

    #[tokio::test]
    async fn test_token_of_removed_user_is_refused() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();
        let mut ghost = guard.user().unwrap().clone();
        ghost.id = UserId::from(404);
        guard.set_user(ghost);
        let token = guard.issue_token().unwrap().unwrap();

        let mut api = fx.guard_with_session(Default::default());
        assert!(matches!(
            api.authenticate_bearer(Some(&token)).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_bearer_credentials_are_not_throttled() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        for _ in 0..5 {
            assert!(!guard.attempt(&Credentials::bearer("a.b.c"), false).await.unwrap());
        }
        assert!(
            guard
                .attempt(&Credentials::password(EMAIL, SECRET), false)
                .await
                .unwrap()
        );
    }
}

mod authorization_tests {
    use std::sync::Arc;

    use super::fixture::*;
    use crate::domain::value_object::credentials::Credentials;
    use crate::error::AuthError;
    use crate::infra::StaticTenantContext;
    use kernel::id::TenantId;

    #[tokio::test]
    async fn test_guest_has_nothing() {
        let fx = Fixture::new().await;
        let guard = fx
            .guard()
            .with_tenant_context(Arc::new(StaticTenantContext::new("acme")));
        let acme = TenantId::from("acme");

        assert!(!guard.has_role("manager", &acme));
        assert!(!guard.has_permission("read.invoices", &acme));
        assert!(!guard.belongs_to_tenant(&acme));
        assert!(!guard.can("read.invoices"));
        assert!(matches!(
            guard.authorize("read.invoices", &acme),
            Err(AuthError::AuthorizationDenied { .. })
        ));
    }

    #[tokio::test]
    async fn test_permissions_are_tenant_scoped() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();
        let acme = TenantId::from("acme");
        let globex = TenantId::from("globex");

        assert!(guard.has_role("manager", &acme));
        assert!(!guard.has_role("manager", &globex));
        assert!(guard.has_permission("read.reports", &acme));
        assert!(guard.has_permission("write.invoices", &acme));
        assert!(!guard.has_permission("write.clients", &acme));
        assert!(!guard.has_permission("delete.clients", &acme));
        assert!(guard.has_permission("delete.clients", &globex));

        assert!(guard.authorize("read.reports", &acme).is_ok());
        assert!(matches!(
            guard.authorize("delete.clients", &acme),
            Err(AuthError::AuthorizationDenied { .. })
        ));
        assert!(matches!(
            guard.authorize("read.reports", &TenantId::from("initech")),
            Err(AuthError::TenantNotAuthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_can_uses_current_tenant() {
        let fx = Fixture::new().await;
        let mut guard = fx.guard();
        guard
            .attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();

        assert!(guard.current_tenant().is_none());
        assert!(!guard.can("read.reports"));

        let guard = guard.with_tenant_context(Arc::new(StaticTenantContext::new("globex")));
        assert_eq!(guard.current_tenant(), Some(TenantId::from("globex")));
        assert!(guard.can("delete.clients"));
        assert!(!guard.can("read.reports"));
    }
}

mod container_tests {
    use std::sync::Arc;

    use super::fixture::*;
    use crate::application::Guard;
    use crate::domain::repository::{SessionStore, UserProvider};
    use crate::domain::value_object::credentials::Credentials;
    use crate::domain::value_object::user_password::RawPassword;
    use crate::error::AuthError;
    use crate::infra::{InMemoryUserProvider, MemorySession};
    use container::Container;
    use kernel::error::kind::ErrorKind;
    use kernel::id::UserId;
    use platform::clock::Clock;

    struct WebGuard;
    struct ApiGuard;

    async fn api_users() -> Arc<InMemoryUserProvider> {
        let provider = Arc::new(InMemoryUserProvider::default());
        let raw = RawPassword::new("Service-Key-2024".to_string()).unwrap();
        provider
            .register(UserId::from("svc-reporting"), "reporting", &raw)
            .await
            .unwrap();
        provider
    }

    #[tokio::test]
    async fn test_guards_get_their_contextual_provider() {
        let fx = Fixture::new().await;
        let api_users = api_users().await;

        let mut container = Container::new();
        container.instance::<dyn UserProvider>(fx.provider.clone() as Arc<dyn UserProvider>);
        let api = api_users.clone();
        container.bind_contextual::<ApiGuard, dyn UserProvider, _>(move |_| {
            Ok(api.clone() as Arc<dyn UserProvider>)
        });

        let mut web = Guard::named::<WebGuard>(&container, fx.config.clone()).unwrap();
        let mut api = Guard::named::<ApiGuard>(&container, fx.config.clone()).unwrap();
        assert_eq!(web.name(), "WebGuard");
        assert_eq!(api.name(), "ApiGuard");

        assert!(web.attempt(&Credentials::password(EMAIL, SECRET), false).await.unwrap());
        assert!(!api.attempt(&Credentials::password(EMAIL, SECRET), false).await.unwrap());
        assert!(
            api.attempt(&Credentials::password("reporting", "Service-Key-2024"), false)
                .await
                .unwrap()
        );
        assert_eq!(api.id(), Some(&UserId::from("svc-reporting")));
    }

    #[tokio::test]
    async fn test_optional_collaborators_are_picked_up() {
        let fx = Fixture::new().await;
        let session = Arc::new(MemorySession::new());

        let mut container = Container::new();
        container.instance::<dyn UserProvider>(fx.provider.clone() as Arc<dyn UserProvider>);
        container.instance::<dyn Clock>(fx.clock.clone() as Arc<dyn Clock>);
        let web_session = session.clone();
        container.bind_contextual::<WebGuard, dyn SessionStore, _>(move |_| {
            Ok(web_session.clone() as Arc<dyn SessionStore>)
        });

        let mut web = Guard::named::<WebGuard>(&container, fx.config.clone()).unwrap();
        web.attempt(&Credentials::password(EMAIL, SECRET), false)
            .await
            .unwrap();
        assert_eq!(
            session.get(&fx.config.session_key).as_deref(),
            Some("1")
        );

        // api guard has no session bound
        let mut api = Guard::named::<ApiGuard>(&container, fx.config.clone()).unwrap();
        assert!(api.once_using_id(&UserId::from(1)).await.unwrap().is_some());
        api.logout().await.unwrap();
        assert!(api.guest());
        assert_eq!(
            session.get(&fx.config.session_key).as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_missing_provider_is_unresolved() {
        let fx = Fixture::new().await;
        let container = Container::new();

        let err = Guard::named::<WebGuard>(&container, fx.config.clone()).unwrap_err();
        assert!(matches!(err, AuthError::Container(_)));
        assert_eq!(err.kind(), ErrorKind::UnresolvedDependency);
        assert!(err.is_fault());
    }
}
