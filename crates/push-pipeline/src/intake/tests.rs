use std::cell::Cell;

use serde_json::{Value, json};

use super::*;
use crate::dispatch::testing::RecordingChannel;

fn raw(value: Value) -> RawNotification {
    match value {
        Value::Object(map) => RawNotification::from(map),
        other => panic!("fixture must be an object, got {other}"),
    }
}

fn tap(intake: &NotificationIntake, payload: &RawNotification) -> IntakeOutcome {
    let acks = Cell::new(0);
    let outcome = intake.did_receive_response(payload, |ack| {
        assert_eq!(ack, Acknowledgment::Completed);
        acks.set(acks.get() + 1);
    });
    assert_eq!(acks.get(), 1);
    outcome
}

fn attached() -> (NotificationIntake, Arc<RecordingChannel>) {
    let intake = NotificationIntake::new(PipelineConfig::default());
    let channel = Arc::new(RecordingChannel::default());
    intake.attach_receiver(channel.clone());
    (intake, channel)
}

#[test]
fn repeated_tap_with_same_id_dispatches_once() {
    let (intake, channel) = attached();
    let payload = raw(json!({"gcm.message_id": "m-1", "data": {"type": "promo"}}));

    assert_eq!(tap(&intake, &payload), IntakeOutcome::Dispatched);
    assert_eq!(tap(&intake, &payload), IntakeOutcome::Suppressed);

    let calls = channel.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "onNotificationTap");
    assert_eq!(calls[0].1, json!({"type": "promo", "wasUserInteraction": true}));
    assert_eq!(intake.stats().suppressed, 1);
}

#[test]
fn taps_without_id_always_dispatch() {
    let (intake, channel) = attached();
    let payload = raw(json!({"campaign": "X", "type": "reminder"}));

    tap(&intake, &payload);
    tap(&intake, &payload);
    tap(&intake, &payload);

    assert_eq!(channel.calls().len(), 3);
    assert_eq!(intake.stats().last_handled_id, None);
}

#[test]
fn foreground_and_background_never_dispatch() {
    let (intake, channel) = attached();
    let payload = raw(json!({"gcm.message_id": "m-1", "data": {"type": "promo"}}));

    let mut present_ack = None;
    let outcome = intake.will_present(&payload, |ack| present_ack = Some(ack));
    assert_eq!(outcome, IntakeOutcome::AcknowledgedOnly);
    assert_eq!(
        present_ack,
        Some(Acknowledgment::Present(PresentationOptions::banner_and_sound()))
    );

    let mut background_ack = None;
    let outcome = intake.did_receive_background(&payload, |ack| background_ack = Some(ack));
    assert_eq!(outcome, IntakeOutcome::AcknowledgedOnly);
    assert_eq!(
        background_ack,
        Some(Acknowledgment::Background(FetchResult::NewData))
    );

    assert!(channel.calls().is_empty());
    assert_eq!(intake.stats().acknowledged_only, 2);
    // Acknowledgment did not consume the delivery id.
    assert_eq!(tap(&intake, &payload), IntakeOutcome::Dispatched);
}

#[test]
fn legacy_alert_presentation() {
    let intake = NotificationIntake::new(PipelineConfig {
        legacy_alert: true,
        ..PipelineConfig::default()
    });
    let mut ack = None;
    intake.will_present(&RawNotification::default(), |a| ack = Some(a));
    assert_eq!(
        ack,
        Some(Acknowledgment::Present(PresentationOptions::alert_and_sound()))
    );
}

#[test]
fn tap_before_attach_is_held_then_flushed() {
    let intake = NotificationIntake::new(PipelineConfig::default());
    let payload = raw(json!({"type": "promo", "id": "1"}));

    assert_eq!(
        tap(&intake, &payload),
        IntakeOutcome::Deferred { replaced: false }
    );
    assert!(!intake.is_ready());
    assert!(intake.stats().pending);

    let channel = Arc::new(RecordingChannel::default());
    intake.attach_receiver(channel.clone());

    let calls = channel.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["id"], json!("1"));
    assert!(intake.is_ready());
    assert!(!intake.stats().pending);
}

#[test]
fn only_latest_held_tap_is_flushed() {
    let intake = NotificationIntake::new(PipelineConfig::default());
    tap(&intake, &raw(json!({"type": "first"})));
    assert_eq!(
        tap(&intake, &raw(json!({"type": "second"}))),
        IntakeOutcome::Deferred { replaced: true }
    );

    let channel = Arc::new(RecordingChannel::default());
    intake.attach_receiver(channel.clone());
    intake.attach_receiver(channel.clone());

    let calls = channel.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["type"], json!("second"));
    assert_eq!(intake.stats().deferred, 2);
}

#[test]
fn launch_notification_is_recorded_by_default() {
    let (intake, channel) = attached();
    let outcome = intake.on_launch(LaunchContext {
        notification: Some(raw(json!({"type": "promo"}))),
        url: Some("payviya://reset-password?token=x".into()),
    });

    assert_eq!(outcome, IntakeOutcome::Recorded);
    assert!(channel.calls().is_empty());

    let record = intake.stats().last_launch.expect("launch recorded");
    assert_eq!(record.url.as_deref(), Some("payviya://reset-password?token=x"));
    assert_eq!(
        serde_json::to_value(&record.notification).unwrap(),
        json!({"type": "promo"})
    );
}

#[test]
fn launch_notification_forwarded_when_configured() {
    let intake = NotificationIntake::new(PipelineConfig {
        launch_policy: LaunchPolicy::Forward,
        ..PipelineConfig::default()
    });
    let payload = raw(json!({"gcm.message_id": "cold-1", "type": "promo"}));

    let outcome = intake.on_launch(LaunchContext {
        notification: Some(payload.clone()),
        url: None,
    });
    assert_eq!(outcome, IntakeOutcome::Deferred { replaced: false });

    let channel = Arc::new(RecordingChannel::default());
    intake.attach_receiver(channel.clone());
    assert_eq!(channel.calls().len(), 1);
    assert_eq!(channel.calls()[0].1["wasUserInteraction"], json!(true));

    // The tap that caused the cold launch arrives afterwards.
    assert_eq!(tap(&intake, &payload), IntakeOutcome::Suppressed);
}

#[test]
fn launch_without_notification_is_recorded() {
    let intake = NotificationIntake::new(PipelineConfig {
        launch_policy: LaunchPolicy::Forward,
        ..PipelineConfig::default()
    });
    assert_eq!(intake.on_launch(LaunchContext::default()), IntakeOutcome::Recorded);
}

#[test]
fn token_refresh_bypasses_pipeline() {
    let (intake, channel) = attached();
    let mut rx = intake.subscribe_tokens();

    assert_eq!(intake.on_token_refresh(Some("abc123")), 1);
    intake.on_token_refresh(None);

    assert_eq!(rx.try_recv().unwrap().payload.token, "abc123");
    assert_eq!(rx.try_recv().unwrap().payload.token, "");
    assert!(rx.try_recv().is_err());
    assert!(channel.calls().is_empty());
}

#[test]
fn shutdown_discards_pending_and_stops_dispatch() {
    let intake = NotificationIntake::new(PipelineConfig::default());
    tap(&intake, &raw(json!({"type": "promo"})));
    intake.shutdown();

    let channel = Arc::new(RecordingChannel::default());
    intake.attach_receiver(channel.clone());
    assert_eq!(tap(&intake, &raw(json!({"type": "later"}))), IntakeOutcome::ShutDown);

    assert!(channel.calls().is_empty());
    let stats = intake.stats();
    assert!(stats.shut_down);
    assert!(!stats.pending);
    assert!(!stats.attached);
}

#[test]
fn closed_receiver_drops_without_panicking() {
    let intake = NotificationIntake::new(PipelineConfig::default());
    intake.attach_receiver(Arc::new(RecordingChannel::closed()));

    assert_eq!(tap(&intake, &raw(json!({"type": "promo"}))), IntakeOutcome::Dropped);
    assert_eq!(intake.stats().dropped, 1);
}

#[test]
fn device_token_is_hex_encoded() {
    let intake = NotificationIntake::new(PipelineConfig::default());
    assert_eq!(intake.device_token_registered(&[0x0a, 0xff, 0x10]), "0aff10");
    assert_eq!(intake.stats().device_token.as_deref(), Some("0aff10"));
}

#[test]
fn registration_failure_is_counted() {
    let intake = NotificationIntake::new(PipelineConfig::default());
    intake.registration_failed("no valid aps-environment entitlement");
    assert_eq!(intake.stats().registration_failures, 1);
}

#[test]
fn inbound_method_calls() {
    let intake = NotificationIntake::new(PipelineConfig::default());
    assert_eq!(
        intake.handle_method_call("splashScreenFinished"),
        MethodReply::Success(Value::Null)
    );
    assert!(intake.stats().splash_finished);
    assert_eq!(intake.handle_method_call("unknown"), MethodReply::NotImplemented);
}

#[test]
fn outcome_serializes_with_status_tag() {
    assert_eq!(
        serde_json::to_value(IntakeOutcome::Deferred { replaced: true }).unwrap(),
        json!({"status": "deferred", "replaced": true})
    );
    assert_eq!(
        serde_json::to_value(Acknowledgment::Background(FetchResult::NewData)).unwrap(),
        json!({"kind": "background", "options": "new_data"})
    );
}

#[test]
fn presentation_options_carry_only_banner_alert_sound() {
    assert_eq!(
        serde_json::to_value(Acknowledgment::Present(PresentationOptions::banner_and_sound()))
            .unwrap(),
        json!({"kind": "present", "options": {"banner": true, "alert": false, "sound": true}})
    );
    assert_eq!(
        serde_json::to_value(PresentationOptions::alert_and_sound()).unwrap(),
        json!({"banner": false, "alert": true, "sound": true})
    );
}

#[test]
fn oversized_token_capacity_does_not_panic_on_construction() {
    let config: PipelineConfig =
        serde_json::from_value(json!({"token_capacity": usize::MAX})).unwrap();
    assert!(config.validate().is_err());

    let intake = NotificationIntake::new(config);
    let mut rx = intake.subscribe_tokens();
    assert_eq!(intake.on_token_refresh(Some("abc123")), 1);
    assert_eq!(rx.try_recv().unwrap().payload.token, "abc123");
}
