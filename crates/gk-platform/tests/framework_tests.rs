//! Operation Framework Integration Tests
//!
//! Outcome emission, event bus delivery and the subscriber choreography
//! across aggregates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use gk_platform::auth::{
    AccessTokenIssuer, Argon2Config, JwtIssuer, PasswordPolicy, PasswordService,
    RandomTokenGenerator,
};
use gk_platform::email::templates::token_from_body;
use gk_platform::email::{EmailTemplates, RecordingEmailSender};
use gk_platform::token::operations::CreateTokenOnUserCreation;
use gk_platform::user::operations::{
    CreateUserCommand, CreateUserOutcome, DeleteUserChannel, DeleteUserOutcome, DeleteUserUseCase,
    ForgotPasswordCommand, ForgotPasswordOutcome,
    GetUserChannel, GetUserOutcome, GetUserUseCase, LoginCommand, LoginOutcome, ResetPasswordCommand,
    ResetPasswordOutcome, VerifyAccountCommand, VerifyAccountOutcome,
};
use gk_platform::usecase::OPERATION_PANICKED;
use gk_platform::{
    Bootstrap, BusError, Channel, Collaborators, DomainEvent, DomainEventKind, EventBus,
    EventEnvelope, EventHandler, Gatekeeper, InMemoryTokenRepository, InMemoryUserRepository,
    Operation, OperationHandle, Outcome, PlatformError, Subscriptions, TokenPolicy, User,
    UserRepository,
};
use gk_common::Secret;

const PASSWORD: &str = "SecureP@ss123!";

struct Harness {
    gatekeeper: Gatekeeper,
    users: Arc<InMemoryUserRepository>,
    tokens: Arc<InMemoryTokenRepository>,
    mailbox: Arc<RecordingEmailSender>,
}

fn harness() -> Harness {
    let users = Arc::new(InMemoryUserRepository::new());
    let tokens = Arc::new(InMemoryTokenRepository::new());
    let mailbox = Arc::new(RecordingEmailSender::new());

    let collaborators = Collaborators {
        users: users.clone(),
        tokens: tokens.clone(),
        hasher: Arc::new(PasswordService::new(Argon2Config::testing()).unwrap()),
        token_generator: Arc::new(RandomTokenGenerator),
        access_tokens: Arc::new(JwtIssuer::new_with_secret(
            "integration-secret",
            "gatekeeper",
            "gatekeeper",
            3600,
        )),
        email_sender: mailbox.clone(),
        email_templates: EmailTemplates::new("no-reply@gatekeeper.local", "http://localhost:8080"),
        password_policy: PasswordPolicy::default(),
        token_policy: TokenPolicy::default(),
    };

    Harness {
        gatekeeper: Gatekeeper::assemble(collaborators).unwrap(),
        users,
        tokens,
        mailbox,
    }
}

/// Records the subject of every event it sees; optionally fails or sleeps.
struct Witness {
    name: &'static str,
    seen: Arc<Mutex<Vec<String>>>,
    behaviour: Behaviour,
}

#[derive(Clone, Copy)]
enum Behaviour {
    Record,
    Fail,
    Panic,
    /// Sleep `ms` milliseconds taken from the subject before recording.
    SleepBySubject,
}

impl Witness {
    fn new(name: &'static str, seen: &Arc<Mutex<Vec<String>>>, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            seen: Arc::clone(seen),
            behaviour,
        })
    }
}

#[async_trait]
impl EventHandler for Witness {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
        let subject = envelope.event.subject().to_string();
        match self.behaviour {
            Behaviour::Record => {}
            Behaviour::Fail => anyhow::bail!("{} refused {}", self.name, subject),
            Behaviour::Panic => panic!("{} blew up on {}", self.name, subject),
            Behaviour::SleepBySubject => {
                let ms: u64 = subject.parse()?;
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }
        self.seen.lock().push(format!("{}:{}", self.name, subject));
        Ok(())
    }
}

fn deleted(id: &str) -> DomainEvent {
    DomainEvent::UserDeleted { user_id: id.to_string() }
}

mod emission_tests {
    use super::*;

    #[tokio::test]
    async fn test_exactly_one_channel_fires() {
        let users = Arc::new(InMemoryUserRepository::new());
        let fired = Arc::new(Mutex::new(Vec::new()));

        let mut handle = OperationHandle::new(Arc::new(GetUserUseCase::new(users)));
        for channel in GetUserChannel::ALL.iter().copied() {
            let fired = Arc::clone(&fired);
            handle.on(channel, move |_| fired.lock().push(channel));
        }

        let outcome = handle.execute("missing".to_string()).await;
        assert!(matches!(outcome, GetUserOutcome::UserNotFound(_)));
        assert_eq!(*fired.lock(), vec![GetUserChannel::UserNotFound]);
    }

    #[tokio::test]
    async fn test_undeclared_channel_is_rejected() {
        let users = Arc::new(InMemoryUserRepository::new());
        let mut handle = OperationHandle::new(Arc::new(GetUserUseCase::new(users)));

        let err = handle.on_named("ACCOUNT_NOT_VERIFIED", |_| {}).err().unwrap();
        assert_eq!(err.name, "ACCOUNT_NOT_VERIFIED");
        assert!(handle.on_named("USER_NOT_FOUND", |_| {}).is_ok());
        assert!(handle.on_named("ERROR", |_| {}).is_ok());
    }

    struct FailingUsers;

    #[async_trait]
    impl UserRepository for FailingUsers {
        async fn find_by_id(&self, _id: &str) -> gk_platform::Result<Option<User>> {
            Err(PlatformError::unavailable("connection refused"))
        }
        async fn find_by_email(&self, _email: &str) -> gk_platform::Result<Option<User>> {
            Err(PlatformError::unavailable("connection refused"))
        }
        async fn insert(&self, _user: &User) -> gk_platform::Result<()> {
            Err(PlatformError::unavailable("connection refused"))
        }
        async fn update(&self, _user: &User) -> gk_platform::Result<()> {
            Err(PlatformError::unavailable("connection refused"))
        }
        async fn delete(&self, _id: &str) -> gk_platform::Result<bool> {
            Err(PlatformError::unavailable("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_error_wraps_collaborator_failure() {
        let outcome = OperationHandle::new(Arc::new(GetUserUseCase::new(Arc::new(FailingUsers))))
            .execute("u1".to_string())
            .await;

        let error = outcome.error().unwrap();
        assert_eq!(error.code(), gk_platform::user::operations::get::USER_LOOKUP_FAILED);
        let cause = error
            .details()
            .and_then(|cause| cause.downcast_ref::<PlatformError>())
            .unwrap();
        assert!(matches!(cause, PlatformError::Unavailable { .. }));
        assert!(std::error::Error::source(error).is_some());
    }

    gk_platform::outcome! {
        pub enum ExplodeOutcome via ExplodeChannel {
            Success(()),
        }
    }

    struct Explode;

    #[async_trait]
    impl Operation for Explode {
        type Input = ();
        type Outcome = ExplodeOutcome;

        async fn execute(&self, _input: ()) -> ExplodeOutcome {
            panic!("boom")
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_error_outcome() {
        let errors = Arc::new(Mutex::new(0));
        let mut handle = OperationHandle::new(Arc::new(Explode));
        let counter = Arc::clone(&errors);
        handle.on(ExplodeChannel::Error, move |_| *counter.lock() += 1);

        let outcome = handle.execute(()).await;
        assert_eq!(outcome.error().map(|e| e.code()), Some(OPERATION_PANICKED));
        assert_eq!(*errors.lock(), 1);
    }
}

mod bus_tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_handlers_do_not_stop_later_ones() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscriptions = Subscriptions::new();
        subscriptions
            .subscribe(DomainEventKind::UserDeleted, Witness::new("failing", &seen, Behaviour::Fail))
            .subscribe(DomainEventKind::UserDeleted, Witness::new("panicking", &seen, Behaviour::Panic))
            .subscribe(DomainEventKind::UserDeleted, Witness::new("healthy", &seen, Behaviour::Record));

        let bus = EventBus::new();
        bus.install(subscriptions).unwrap();

        bus.publish(deleted("42"));
        bus.wait_idle().await;

        assert_eq!(*seen.lock(), vec!["healthy:42"]);
    }

    #[tokio::test]
    async fn test_publishing_operation_survives_broken_subscribers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscriptions = Subscriptions::new();
        subscriptions
            .subscribe(DomainEventKind::UserDeleted, Witness::new("failing", &seen, Behaviour::Fail))
            .subscribe(DomainEventKind::UserDeleted, Witness::new("panicking", &seen, Behaviour::Panic))
            .subscribe(DomainEventKind::UserDeleted, Witness::new("healthy", &seen, Behaviour::Record));
        let bus = EventBus::new();
        bus.install(subscriptions).unwrap();

        let users = Arc::new(InMemoryUserRepository::new());
        let user = User::new("ada@example.com", "Ada", "h");
        users.insert(&user).await.unwrap();
        let use_case = Arc::new(DeleteUserUseCase::new(users.clone(), bus.clone()));

        let successes = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&successes);
        let mut handle = OperationHandle::new(use_case);
        handle.on(DeleteUserChannel::Success, move |_| *counter.lock() += 1);
        let outcome = handle.execute(user.id.clone()).await;

        assert!(matches!(outcome, DeleteUserOutcome::Success(ref id) if *id == user.id));
        assert_eq!(*successes.lock(), 1);
        assert!(users.find_by_id(&user.id).await.unwrap().is_none());

        bus.wait_idle().await;
        assert_eq!(*seen.lock(), vec![format!("healthy:{}", user.id)]);
        assert_eq!(bus.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ordering_across_publications() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscriptions = Subscriptions::new();
        subscriptions.subscribe(
            DomainEventKind::UserDeleted,
            Witness::new("sleeper", &seen, Behaviour::SleepBySubject),
        );

        let bus = EventBus::new();
        bus.install(subscriptions).unwrap();

        bus.publish(deleted("300"));
        bus.publish(deleted("10"));
        assert_eq!(bus.in_flight(), 2);
        bus.wait_idle().await;

        assert_eq!(*seen.lock(), vec!["sleeper:10", "sleeper:300"]);
    }

    #[tokio::test]
    async fn test_bootstrap_twice_delivers_twice() {
        let tokens = Arc::new(InMemoryTokenRepository::new());
        let bus = EventBus::new();
        let op = Arc::new(CreateTokenOnUserCreation::new(
            tokens.clone(),
            Arc::new(RandomTokenGenerator),
            TokenPolicy::default(),
            bus.clone(),
        ));

        let mut subscriptions = Subscriptions::new();
        Arc::clone(&op).bootstrap(&mut subscriptions);
        op.bootstrap(&mut subscriptions);
        assert_eq!(subscriptions.count(DomainEventKind::UserCreated), 2);
        bus.install(subscriptions).unwrap();

        let user = User::new("ada@example.com", "Ada", "h");
        bus.publish(DomainEvent::UserCreated { user: user.clone() });
        bus.wait_idle().await;

        assert_eq!(tokens.count_for_user(&user.id), 2);
    }

    #[tokio::test]
    async fn test_assembled_bus_rejects_second_install() {
        let h = harness();
        assert!(h.gatekeeper.bus.is_installed());
        assert_eq!(h.gatekeeper.bus.subscriber_count(DomainEventKind::UserCreated), 1);
        assert_eq!(h.gatekeeper.bus.subscriber_count(DomainEventKind::TokenCreated), 1);
        assert_eq!(h.gatekeeper.bus.subscriber_count(DomainEventKind::ForgotPassword), 1);
        assert_eq!(h.gatekeeper.bus.subscriber_count(DomainEventKind::UserDeleted), 1);
        assert_eq!(
            h.gatekeeper.bus.install(Subscriptions::new()),
            Err(BusError::AlreadyInstalled)
        );
    }
}

mod choreography_tests {
    use super::*;

    async fn register(h: &Harness, email: &str) -> User {
        let outcome = OperationHandle::new(h.gatekeeper.state.create_user.clone())
            .execute(CreateUserCommand {
                email: email.to_string(),
                name: "Ada".to_string(),
                password: Secret::new(PASSWORD),
            })
            .await;
        let CreateUserOutcome::Success(user) = outcome else {
            panic!("registration failed: {:?}", outcome);
        };
        h.gatekeeper.bus.wait_idle().await;
        user
    }

    async fn login(h: &Harness, email: &str, password: &str) -> LoginOutcome {
        OperationHandle::new(h.gatekeeper.state.login.clone())
            .execute(LoginCommand {
                email: email.to_string(),
                password: Secret::new(password),
            })
            .await
    }

    fn last_token_sent_to(h: &Harness, email: &str) -> String {
        let sent = h.mailbox.sent_to(email);
        let message = sent.last().expect("an email was sent");
        token_from_body(&message.body).expect("email carries a token").to_string()
    }

    #[tokio::test]
    async fn test_register_verify_login() {
        let h = harness();
        let user = register(&h, "ada@example.com").await;

        assert_eq!(h.tokens.count_for_user(&user.id), 1);
        assert!(matches!(
            login(&h, "ada@example.com", PASSWORD).await,
            LoginOutcome::AccountNotVerified(_)
        ));

        let token = last_token_sent_to(&h, "ada@example.com");
        let outcome = OperationHandle::new(h.gatekeeper.state.verify_account.clone())
            .execute(VerifyAccountCommand { token: Secret::new(token.clone()) })
            .await;
        assert!(matches!(outcome, VerifyAccountOutcome::Success(ref u) if u.verified));
        assert_eq!(h.tokens.count_for_user(&user.id), 0);

        let outcome = login(&h, "ada@example.com", PASSWORD).await;
        let LoginOutcome::Success(grant) = outcome else {
            panic!("login failed: {:?}", outcome);
        };
        let claims = h
            .gatekeeper
            .state
            .access_tokens
            .validate(grant.access_token.expose())
            .unwrap();
        assert_eq!(claims.sub, user.id);

        let outcome = OperationHandle::new(h.gatekeeper.state.verify_account.clone())
            .execute(VerifyAccountCommand { token: Secret::new(token) })
            .await;
        assert!(matches!(outcome, VerifyAccountOutcome::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_forgot_and_reset_password() {
        let h = harness();
        register(&h, "grace@example.com").await;

        let outcome = OperationHandle::new(h.gatekeeper.state.forgot_password.clone())
            .execute(ForgotPasswordCommand { email: "grace@example.com".to_string() })
            .await;
        assert!(matches!(outcome, ForgotPasswordOutcome::Success(_)));
        h.gatekeeper.bus.wait_idle().await;

        let sent = h.mailbox.sent_to("grace@example.com");
        assert_eq!(sent.len(), 2);
        assert!(sent[1].body.contains("/reset-password?token="));

        let token = last_token_sent_to(&h, "grace@example.com");
        let outcome = OperationHandle::new(h.gatekeeper.state.reset_password.clone())
            .execute(ResetPasswordCommand {
                token: Secret::new(token),
                password: Secret::new("BrandNewP@ss456!"),
            })
            .await;
        assert!(matches!(outcome, ResetPasswordOutcome::Success(ref u) if u.verified));

        assert!(matches!(
            login(&h, "grace@example.com", PASSWORD).await,
            LoginOutcome::InvalidCredentials(_)
        ));
        assert!(login(&h, "grace@example.com", "BrandNewP@ss456!").await.is_success());
    }

    #[tokio::test]
    async fn test_delete_invalidates_tokens() {
        let h = harness();
        let user = register(&h, "linus@example.com").await;
        assert_eq!(h.tokens.count_for_user(&user.id), 1);

        let outcome = OperationHandle::new(h.gatekeeper.state.delete_user.clone())
            .execute(user.id.clone())
            .await;
        assert!(outcome.is_success());
        h.gatekeeper.bus.wait_idle().await;

        assert_eq!(h.tokens.count_for_user(&user.id), 0);
        assert!(h.users.find_by_id(&user.id).await.unwrap().is_none());
    }
}
