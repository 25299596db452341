use lanwake_devkit::test_utils::COMMANDS_TOPIC;
use lanwake_devkit::{MockBrokerLink, TestHarness};
use std::time::Duration;
use tokio::time::advance;

/// Tick every `step` for `total`
async fn run_for(h: &mut TestHarness, total: Duration, step: Duration) {
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        h.tick().await;
        advance(step).await;
        elapsed += step;
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_cycle_connects_and_subscribes() {
    let mut h = TestHarness::new();
    h.tick().await;

    assert!(h.link.connected());
    assert_eq!(h.link.connect_attempts().len(), 1);
    assert_eq!(h.link.subscriptions(), vec![COMMANDS_TOPIC]);
    assert_eq!(h.agent.supervisor().timer().last_failure(), None);
}

#[tokio::test(start_paused = true)]
async fn test_failed_attempts_respect_cooldown() {
    let mut h = TestHarness::with_link(MockBrokerLink::refusing());

    run_for(&mut h, Duration::from_secs(30), Duration::from_millis(250)).await;

    let attempts = h.link.connect_attempts();
    assert_eq!(attempts.len(), 6); // t = 0, 5, 10, 15, 20, 25
    for pair in attempts.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(5000));
    }
    assert!(h.link.published().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_uneven_ticks_never_attempt_early() {
    let mut h = TestHarness::with_link(MockBrokerLink::refusing());

    for step_ms in [1u64, 4998, 1, 1, 3000, 1999, 7, 6000, 4999, 1] {
        h.tick().await;
        advance(Duration::from_millis(step_ms)).await;
    }

    let attempts = h.link.connect_attempts();
    assert!(attempts.len() >= 3);
    for pair in attempts.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(5000));
    }
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_restarts_from_latest_failure() {
    let link = MockBrokerLink::refusing();
    link.script_connects([true]);
    let mut h = TestHarness::with_link(link);

    h.tick().await; // success at t = 0
    advance(Duration::from_secs(1)).await;
    h.link.drop_connection();
    h.tick().await; // immediate attempt, fails at t = 1
    assert_eq!(h.link.connect_attempts().len(), 2);

    advance(Duration::from_millis(4900)).await;
    h.tick().await;
    assert_eq!(h.link.connect_attempts().len(), 2);

    advance(Duration::from_millis(100)).await;
    h.tick().await;
    let attempts = h.link.connect_attempts();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[2] - attempts[1], Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_recovery_after_outage() {
    let mut h = TestHarness::new();
    h.connect().await;

    h.link.drop_connection();
    h.link.set_accepting(false);
    run_for(&mut h, Duration::from_secs(12), Duration::from_secs(1)).await;
    assert!(!h.link.connected());

    h.link.set_accepting(true);
    run_for(&mut h, Duration::from_secs(6), Duration::from_secs(1)).await;

    assert!(h.link.connected());
    assert_eq!(h.link.subscriptions(), vec![COMMANDS_TOPIC, COMMANDS_TOPIC]);

    h.prober.set_online(true);
    h.send_command("ping").await;
    assert_eq!(h.responses(), vec!["ping_ok"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_subscribe_retried_without_reconnect() {
    let link = MockBrokerLink::new();
    link.fail_next_subscribe();
    let mut h = TestHarness::with_link(link);

    h.tick().await;
    assert!(h.link.connected());
    assert!(h.link.subscriptions().is_empty());

    advance(Duration::from_secs(5)).await;
    h.tick().await;

    assert_eq!(h.link.subscriptions(), vec![COMMANDS_TOPIC]);
    assert_eq!(h.link.connect_attempts().len(), 1);
    assert_eq!(h.agent.supervisor().attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_status_produced_while_down_is_dropped() {
    let mut h = TestHarness::new();
    h.connect().await;
    h.send_command("wol").await;

    h.link.drop_connection();
    h.link.set_accepting(false);
    advance(Duration::from_secs(20)).await;
    h.tick().await; // attempt fails, recheck result has nowhere to go

    h.link.set_accepting(true);
    advance(Duration::from_secs(5)).await;
    h.tick().await;
    h.tick().await;

    assert!(h.link.connected());
    assert_eq!(h.responses(), vec!["wol_sent"]);
}
