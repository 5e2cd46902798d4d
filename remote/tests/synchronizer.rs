mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;

use tower_common::{ActionError, ClientConfig, ClockTime, GlowWindow, Mode, SettingName};
use tower_remote::WriteOutcome;

use common::simulated_panel;

fn window(start: &str, stop: &str) -> GlowWindow {
    GlowWindow {
        start: start.parse::<ClockTime>().unwrap(),
        stop: stop.parse::<ClockTime>().unwrap(),
    }
}

#[tokio::test]
async fn refresh_pulls_every_setting() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    tower.set_setting(SettingName::Mode, 0).await;
    tower.set_setting(SettingName::StartHour, 7).await;
    tower.set_setting(SettingName::StopHour, 21).await;
    tower.set_setting(SettingName::OnDuration, 3).await;

    let report = panel.start().await.expect("base URL is configured");
    assert!(report.is_success());

    let shadow = panel.settings.shadow().await;
    assert_eq!(shadow.mode, Mode::Manual);
    assert_eq!(shadow.window, window("07:00", "21:00"));
    assert_eq!(shadow.duration_minutes, 3);

    let view = panel.board().snapshot().await;
    assert!(!view.refreshing);
    assert!(!view.syncing_mode);
    assert_eq!(view.error, None);
    assert_eq!(view.schedule_error, None);
    assert_eq!(tower.config_reads().await, 4);
}

#[tokio::test]
async fn start_after_stop_is_rejected_locally() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    tower.set_setting(SettingName::OnDuration, 2).await;
    panel.start().await;
    let reads = tower.config_reads().await;

    let shadow = panel.settings.shadow().await;
    assert_eq!(shadow.mode, Mode::Auto);
    assert_eq!(shadow.window.start.to_string(), "08:00");
    assert_eq!(shadow.window.stop.to_string(), "18:00");
    assert_eq!(shadow.duration_minutes, 2);
    assert_eq!(panel.board().snapshot().await.schedule_error, None);

    let err = panel.settings.set_start("19:00").await.unwrap_err();
    assert_eq!(err.to_string(), "From must be earlier than To");

    let err = panel.settings.set_stop("06:00").await.unwrap_err();
    assert_eq!(err.to_string(), "To must be later than From");

    let err = panel.settings.set_start("25:00").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid time value");

    assert_eq!(
        panel.board().snapshot().await.schedule_error.as_deref(),
        Some("Invalid time value")
    );
    assert_eq!(panel.settings.shadow().await.window, window("08:00", "18:00"));
    assert_eq!(tower.config_writes().await, 0);
    assert_eq!(tower.config_reads().await, reads);
}

#[tokio::test]
async fn valid_hours_are_written_as_whole_hours() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    panel.start().await;

    let outcome = panel.settings.set_stop("19:00").await.unwrap();
    assert_eq!(outcome, WriteOutcome::Saved);
    assert_eq!(tower.setting(SettingName::StopHour).await, 19);

    panel.settings.set_start("06:30").await.unwrap();
    assert_eq!(tower.setting(SettingName::StartHour).await, 6);
    assert_eq!(panel.settings.shadow().await.window, window("06:00", "19:00"));

    let view = panel.board().snapshot().await;
    assert_eq!(view.status.as_deref(), Some("Start hour saved (6:00)"));
    assert_eq!(view.schedule_error, None);
}

#[tokio::test]
async fn minutes_cannot_sneak_past_the_ordering_check() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    panel.start().await;

    let err = panel.settings.set_stop("08:30").await.unwrap_err();
    assert_eq!(err.to_string(), "To must be later than From");

    let err = panel.settings.set_start("18:15").await.unwrap_err();
    assert_eq!(err.to_string(), "From must be earlier than To");

    assert_eq!(tower.config_writes().await, 0);
    assert_eq!(tower.setting(SettingName::StopHour).await, 18);
    assert_eq!(panel.settings.shadow().await.window, window("08:00", "18:00"));
}

#[tokio::test]
async fn failed_mode_write_rolls_back() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    panel.start().await;
    assert_eq!(panel.settings.shadow().await.mode, Mode::Auto);

    tower.fail_next(1, 500, "relay stuck").await;
    let err = panel.settings.set_mode(Mode::Manual).await.unwrap_err();

    assert!(matches!(err, ActionError::Request(_)));
    assert_eq!(panel.settings.shadow().await.mode, Mode::Auto);
    assert_eq!(
        panel.board().snapshot().await.error.as_deref(),
        Some("relay stuck")
    );
    assert_eq!(tower.setting(SettingName::Mode).await, 1);
}

#[tokio::test]
async fn failed_duration_write_keeps_the_optimistic_value() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    panel.start().await;

    tower.fail_next(1, 500, "").await;
    panel.settings.set_duration(4).await.unwrap_err();

    assert_eq!(panel.settings.shadow().await.duration_minutes, 4);
    assert_eq!(tower.setting(SettingName::OnDuration).await, 1);
    assert_eq!(
        panel.board().snapshot().await.error.as_deref(),
        Some("Controller returned 500")
    );
}

#[tokio::test]
async fn failed_hour_write_keeps_the_optimistic_value() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    panel.start().await;

    tower.fail_next(1, 500, "").await;
    panel.settings.set_stop("20:00").await.unwrap_err();

    assert_eq!(panel.settings.shadow().await.window, window("08:00", "20:00"));
    assert_eq!(tower.setting(SettingName::StopHour).await, 18);
}

#[tokio::test]
async fn duration_is_clamped_into_range() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;

    panel.settings.set_duration(12).await.unwrap();

    assert_eq!(tower.setting(SettingName::OnDuration).await, 5);
    assert_eq!(
        panel.board().snapshot().await.status.as_deref(),
        Some("Blink duration saved (5 minutes)")
    );
}

#[tokio::test]
async fn overlapping_duration_writes_are_suppressed() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    tower.set_delay(Duration::from_millis(150)).await;

    let (first, second) = tokio::join!(
        panel.settings.set_duration(2),
        panel.settings.set_duration(3)
    );

    assert_eq!(first.unwrap(), WriteOutcome::Saved);
    assert_eq!(second.unwrap(), WriteOutcome::Suppressed);
    assert_eq!(panel.settings.shadow().await.duration_minutes, 3);
    assert_eq!(tower.setting(SettingName::OnDuration).await, 2);
    assert_eq!(tower.config_writes().await, 1);
}

#[tokio::test]
async fn overlapping_mode_writes_are_suppressed() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    tower.set_delay(Duration::from_millis(150)).await;

    let (first, second) = tokio::join!(
        panel.settings.set_mode(Mode::Manual),
        panel.settings.set_mode(Mode::Auto)
    );

    assert_eq!(first.unwrap(), WriteOutcome::Saved);
    assert_eq!(second.unwrap(), WriteOutcome::Suppressed);
    assert_eq!(panel.settings.shadow().await.mode, Mode::Manual);
    assert_eq!(tower.setting(SettingName::Mode).await, 0);
}

#[tokio::test]
async fn inverted_controller_window_is_flagged() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    tower.set_setting(SettingName::StartHour, 20).await;
    tower.set_setting(SettingName::StopHour, 6).await;

    let report = panel.settings.refresh_all().await;
    assert!(report.is_success());

    let view = panel.board().snapshot().await;
    assert_eq!(
        view.schedule_error.as_deref(),
        Some("From must be earlier than To")
    );
    assert_eq!(panel.settings.shadow().await.window, window("20:00", "06:00"));
}

#[tokio::test]
async fn one_bad_schedule_read_drops_the_whole_batch() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    tower.set_setting(SettingName::Mode, 0).await;
    tower.set_setting(SettingName::StartHour, 5).await;
    tower.override_read(SettingName::StopHour, "stop_hour=").await;

    let report = panel.settings.refresh_all().await;

    assert_eq!(report.mode, Ok(Mode::Manual));
    assert!(report.schedule.is_err());

    let shadow = panel.settings.shadow().await;
    assert_eq!(shadow.mode, Mode::Manual);
    assert_eq!(shadow.window, window("08:00", "18:00"));
    assert_eq!(
        panel.board().snapshot().await.error.as_deref(),
        Some("stop_hour response missing value")
    );
}

#[tokio::test]
async fn unconfigured_panel_skips_the_initial_refresh() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    panel.save_base_url("").await;

    assert!(panel.start().await.is_none());
    assert_eq!(tower.config_reads().await, 0);
    assert_eq!(
        panel.board().snapshot().await.status.as_deref(),
        Some("Controller URL is not set")
    );

    let err = panel.settings.set_mode(Mode::Manual).await.unwrap_err();
    assert_eq!(err.to_string(), "Controller URL is not set");
    assert_eq!(panel.settings.shadow().await.mode, Mode::Auto);
}

#[tokio::test]
async fn bad_mode_read_leaves_the_schedule_refresh_alone() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    tower.set_setting(SettingName::StartHour, 6).await;
    tower.set_setting(SettingName::StopHour, 22).await;
    tower.set_setting(SettingName::OnDuration, 4).await;
    tower.override_read(SettingName::Mode, "mode=?").await;

    let report = panel.settings.refresh_all().await;

    assert!(report.mode.is_err());
    assert!(report.schedule.is_ok());

    let shadow = panel.settings.shadow().await;
    assert_eq!(shadow.mode, Mode::Auto);
    assert_eq!(shadow.window, window("06:00", "22:00"));
    assert_eq!(shadow.duration_minutes, 4);
    assert_eq!(
        panel.board().snapshot().await.error.as_deref(),
        Some("mode response missing value")
    );
}

#[tokio::test]
async fn refreshing_holds_until_the_slower_track_settles() {
    let (panel, tower) = simulated_panel(ClientConfig::default()).await;
    tower.set_setting(SettingName::OnDuration, 3).await;
    tower.delay_read(SettingName::Mode, Duration::from_millis(500)).await;

    let (report, mid_flight) = tokio::join!(panel.settings.refresh_all(), async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let view = panel.board().snapshot().await;
        let shadow = panel.settings.shadow().await;
        (view.refreshing, view.syncing_mode, shadow.duration_minutes)
    });

    assert_eq!(mid_flight, (true, true, 3));
    assert!(report.is_success());

    let view = panel.board().snapshot().await;
    assert!(!view.refreshing);
    assert!(!view.syncing_mode);
}

#[tokio::test]
async fn snapshot_serializes_for_json_output() {
    let (panel, _tower) = simulated_panel(ClientConfig::default()).await;
    panel.start().await;

    let json = serde_json::to_value(panel.snapshot().await).unwrap();

    assert!(json["baseUrl"].as_str().unwrap().starts_with("http://127.0.0.1:"));
    assert_eq!(json["settings"]["mode"], "auto");
    assert_eq!(json["settings"]["window"]["start"], 480);
    assert_eq!(json["settings"]["durationMinutes"], 1);
    assert!(json["view"]["error"].is_null());
    assert_eq!(json["view"]["refreshing"], false);
    assert_eq!(json["blinkRemainingSecs"], 0);
}
