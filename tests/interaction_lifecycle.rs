//! End-to-end registry lifecycle tests against a recording transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use switchboard_core::config::SwitchboardConfig;
use switchboard_core::context::ComponentContext;
use switchboard_core::error::ExecutorError;
use switchboard_core::executor::{ActionColumn, CallbackExecutor, ControlLabel, Modal, TextField};
use switchboard_core::ids::{ApplicationId, InteractionId, MessageId, UserId};
use switchboard_core::platform::{
    ButtonStyle, ComponentInteractionEvent, FieldStyle, ModalInteractionEvent, SubmittedField,
};
use switchboard_core::registry::{
    ComponentRegistry, DispatchOutcome, ModalRegistry, RegisterOptions,
};
use switchboard_core::testing::RecordingTransport;
use switchboard_core::timeout::Timeout;

fn component_event(custom_id: &str) -> ComponentInteractionEvent {
    ComponentInteractionEvent {
        interaction_id: InteractionId(1),
        application_id: ApplicationId(2),
        token: "token".into(),
        custom_id: custom_id.into(),
        message_id: Some(MessageId(3)),
        channel_id: None,
        guild_id: None,
        author_id: UserId(42),
        values: Vec::new(),
    }
}

#[tokio::test]
async fn column_dispatch_carries_metadata_and_selection() {
    let transport = Arc::new(RecordingTransport::default());
    let registry = ComponentRegistry::new(transport.clone());
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let seen_in_callback = seen.clone();
    let column = ActionColumn::new()
        .add_button(
            "btn",
            ButtonStyle::Primary,
            ControlLabel::Text("Go".into()),
            move |mut ctx: ComponentContext| {
                let seen = seen_in_callback.clone();
                async move {
                    seen.lock().unwrap().push(format!(
                        "{}={}",
                        ctx.id_match(),
                        ctx.id_metadata().unwrap_or("-")
                    ));
                    ctx.acknowledge_update().await?;
                    Ok::<(), ExecutorError>(())
                }
            },
        )
        .unwrap();

    registry
        .register(Arc::new(column), RegisterOptions::new())
        .await
        .unwrap();

    let outcome = registry.dispatch(component_event("btn:userid42")).await;
    assert_eq!(outcome, DispatchOutcome::Dispatched);
    assert_eq!(seen.lock().unwrap().as_slice(), &["btn=userid42".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn sliding_expiry_survives_use_and_is_swept_after_window() {
    let transport = Arc::new(RecordingTransport::default());
    let config = SwitchboardConfig {
        sweep_interval: Duration::from_secs(1),
        ..SwitchboardConfig::default()
    };
    let registry = ComponentRegistry::with_config(transport.clone(), &config);
    registry.open();

    let executor = CallbackExecutor::new("session", |mut ctx: ComponentContext| async move {
        ctx.acknowledge_update().await?;
        Ok::<(), ExecutorError>(())
    })
    .unwrap();
    registry
        .register(
            Arc::new(executor),
            RegisterOptions::new().timeout(Timeout::Sliding(Duration::from_secs(30))),
        )
        .await
        .unwrap();

    // Dispatch at t=0 and t=25.
    assert_eq!(
        registry.dispatch(component_event("session")).await,
        DispatchOutcome::Dispatched
    );
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(
        registry.dispatch(component_event("session")).await,
        DispatchOutcome::Dispatched
    );

    // t=40: last use was t=25, the registration must still be live.
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert!(registry.contains("session").await);

    // t=56: expired at t=55 and swept.
    tokio::time::sleep(Duration::from_secs(16)).await;
    assert!(!registry.contains("session").await);
    assert_eq!(
        registry.dispatch(component_event("session")).await,
        DispatchOutcome::ExpiredOrUnknown
    );

    registry.close().await;
    registry.close().await;
    assert!(!registry.is_open());
}

#[tokio::test]
async fn modal_submission_round_trip() {
    let transport = Arc::new(RecordingTransport::default());
    let registry = ModalRegistry::new(transport.clone());
    let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let seen_in_callback = seen.clone();
    let modal = Modal::new(
        "feedback",
        "Feedback",
        move |mut ctx: switchboard_core::context::ModalContext| {
            let seen = seen_in_callback.clone();
            async move {
                *seen.lock().unwrap() = ctx.field("body").map(str::to_owned);
                ctx.respond_ephemeral("received").await?;
                Ok::<(), ExecutorError>(())
            }
        },
    )
    .unwrap()
    .add_field(TextField::new("body", "Your feedback", FieldStyle::Paragraph))
    .unwrap();

    registry
        .register(Arc::new(modal), RegisterOptions::new())
        .await
        .unwrap();

    let event = ModalInteractionEvent {
        interaction_id: InteractionId(1),
        application_id: ApplicationId(2),
        token: "token".into(),
        custom_id: "feedback:fromhelp".into(),
        message_id: None,
        channel_id: None,
        guild_id: None,
        author_id: UserId(42),
        fields: vec![SubmittedField {
            custom_id: "body".into(),
            value: "great library".into(),
        }],
    };

    assert_eq!(registry.dispatch(event).await, DispatchOutcome::Dispatched);
    assert_eq!(seen.lock().unwrap().as_deref(), Some("great library"));
    assert_eq!(
        transport.last_created_content().as_deref(),
        Some("received")
    );
}
