//! Portal behaviour around mocked collaborators and store adapters.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{seeded_store, ADMIN_EMAIL, RESPONSIBLE_EMAIL};
use ecole_database::{encode, Filter, Row, StoreAdapter, StoreError, StoreResult, Table};
use ecole_portal::collaborators::{
    Assistant, AssistantError, DeliveryError, DeliveryReceipt, EmailDelivery, OutgoingEmail,
    RewriteStyle,
};
use ecole_portal::entities::{ConversationTurn, NotificationType, ResourceType, Role, TurnRole};
use ecole_portal::test_support::ManualClock;
use ecole_portal::types::{NewClass, ShareRequest};
use ecole_portal::{Portal, PortalError};
use mockall::mock;
use mockall::predicate::*;

mock! {
    pub Store {}

    #[async_trait]
    impl StoreAdapter for Store {
        fn name(&self) -> &'static str;
        async fn select_all(&self, table: Table) -> StoreResult<Vec<Row>>;
        async fn select_where(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Row>>;
        async fn insert(&self, table: Table, row: Row) -> StoreResult<Row>;
        async fn update(&self, table: Table, id: &str, patch: Row) -> StoreResult<Row>;
        async fn delete(&self, table: Table, id: &str) -> StoreResult<()>;
        async fn upsert(&self, table: Table, key: &str, row: Row) -> StoreResult<Row>;
    }
}

mock! {
    pub Mailer {}

    #[async_trait]
    impl EmailDelivery for Mailer {
        async fn deliver(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError>;
    }
}

mock! {
    pub Bot {}

    #[async_trait]
    impl Assistant for Bot {
        async fn converse(
            &self,
            history: &[ConversationTurn],
            message: &str,
        ) -> Result<String, AssistantError>;
        async fn rewrite(&self, text: &str, style: RewriteStyle) -> Result<String, AssistantError>;
    }
}

fn admin_row() -> Row {
    encode(&common::user("a1", "Alice Admin", Role::Admin, ADMIN_EMAIL, None)).unwrap()
}

#[tokio::test]
async fn test_rejected_insert_surfaces_store_message() {
    let mut store = MockStore::new();
    store.expect_name().return_const("mock");
    store
        .expect_select_where()
        .withf(|table, filter| *table == Table::Users && filter.column == "email")
        .returning(|_, _| Ok(vec![admin_row()]));
    store
        .expect_select_where()
        .returning(|_, _| Ok(Vec::new()));
    store.expect_select_all().returning(|_| Ok(Vec::new()));
    store
        .expect_insert()
        .with(eq(Table::Classes), always())
        .times(1)
        .returning(|_, _| {
            Err(StoreError::Rejected {
                status: 400,
                message: "nom déjà utilisé".into(),
            })
        });

    let portal = Portal::builder(Arc::new(store))
        .clock(Arc::new(ManualClock::at_school_start()))
        .build();
    portal.sign_in(ADMIN_EMAIL).await.unwrap();

    let err = portal
        .create_class(NewClass {
            name: "5B".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Store(StoreError::Rejected { .. })));

    let last = &portal.history().await[0];
    assert_eq!(last.notification_type, NotificationType::Error);
    assert_eq!(last.message, "Erreur : nom déjà utilisé");
    assert!(portal.snapshot().await.classes.is_empty());
}

#[tokio::test]
async fn test_delivery_failure_keeps_share_record() {
    let store = seeded_store().await;
    let mut mailer = MockMailer::new();
    mailer
        .expect_deliver()
        .withf(|email| email.recipients == vec!["parent@x.com".to_string()])
        .times(1)
        .returning(|_| {
            Err(DeliveryError::Rejected {
                status: 502,
                message: "bad gateway".into(),
            })
        });

    let portal = Portal::builder(Arc::new(store.clone()))
        .clock(Arc::new(ManualClock::at_school_start()))
        .mailer(Arc::new(mailer))
        .build();
    portal.sign_in(RESPONSIBLE_EMAIL).await.unwrap();

    let err = portal
        .share_resource(ShareRequest {
            resource_type: ResourceType::Exam,
            resource_id: "e1".into(),
            recipient: Some(" Parent@X.com ".into()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Delivery(_)));
    assert_eq!(store.rows(Table::SentEmails).await.len(), 1);
    assert_eq!(
        portal.history().await[0].notification_type,
        NotificationType::Error
    );
}

#[tokio::test]
async fn test_provider_receipt_is_returned() {
    let store = seeded_store().await;
    let mut mailer = MockMailer::new();
    mailer.expect_deliver().times(1).returning(|email| {
        assert!(email.html.contains("<p>"));
        Ok(DeliveryReceipt::Accepted {
            reference: Some("msg-1".into()),
        })
    });

    let portal = Portal::builder(Arc::new(store))
        .mailer(Arc::new(mailer))
        .build();
    portal.sign_in(RESPONSIBLE_EMAIL).await.unwrap();

    let outcome = portal
        .share_resource(ShareRequest {
            resource_type: ResourceType::Poll,
            resource_id: "p1".into(),
            recipient: None,
        })
        .await
        .unwrap();
    assert_eq!(
        outcome.receipt,
        DeliveryReceipt::Accepted {
            reference: Some("msg-1".into())
        }
    );
}

#[tokio::test]
async fn test_assistant_conversation_is_recorded() {
    let store = seeded_store().await;
    let mut bot = MockBot::new();
    bot.expect_converse()
        .withf(|history, message| history.is_empty() && message == "Bonjour")
        .times(1)
        .returning(|_, _| Ok("Bonjour ! Comment puis-je aider ?".into()));
    bot.expect_converse()
        .withf(|history, _| history.len() == 2)
        .times(1)
        .returning(|_, _| Ok("Voici un plan de révision.".into()));

    let portal = Portal::builder(Arc::new(store.clone()))
        .assistant(Arc::new(bot))
        .build();
    portal.sign_in(RESPONSIBLE_EMAIL).await.unwrap();
    let notifications = portal.history().await.len();

    portal.ask_assistant("Bonjour").await.unwrap();
    let answer = portal.ask_assistant("Un plan de révision ?").await.unwrap();
    assert_eq!(answer, "Voici un plan de révision.");

    let conversation = portal.conversation().await.unwrap();
    assert_eq!(conversation.turns.len(), 4);
    assert_eq!(conversation.turns[3].role, TurnRole::Model);
    let stored = store.rows(Table::AiConversations).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["user_id"], "r1");

    // Successful answers raise no notification.
    assert_eq!(portal.history().await.len(), notifications);

    portal.reset_conversation().await.unwrap();
    assert!(portal.conversation().await.is_none());
    assert!(store.rows(Table::AiConversations).await.is_empty());
}

#[tokio::test]
async fn test_assistant_failure_notifies_error() {
    let store = seeded_store().await;
    let mut bot = MockBot::new();
    bot.expect_rewrite()
        .withf(|text, style| text == "salut ca va" && *style == RewriteStyle::FixGrammar)
        .returning(|_, _| Err(AssistantError::Request("quota exceeded".into())));

    let portal = Portal::builder(Arc::new(store)).assistant(Arc::new(bot)).build();
    portal.sign_in(RESPONSIBLE_EMAIL).await.unwrap();

    let err = portal
        .rewrite_text("salut ca va", RewriteStyle::FixGrammar)
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Assistant(_)));
    assert_eq!(
        portal.history().await[0].notification_type,
        NotificationType::Error
    );
}

#[tokio::test]
async fn test_missing_assistant_is_reported() {
    let portal = Portal::builder(Arc::new(seeded_store().await)).build();
    portal.sign_in(RESPONSIBLE_EMAIL).await.unwrap();

    let err = portal.ask_assistant("Bonjour").await.unwrap_err();
    assert!(matches!(err, PortalError::Assistant(_)));
}
