use lanwake_agent::dispatcher::COMMAND_QUEUE_LIMIT;
use lanwake_agent::wake::WakeState;
use lanwake_devkit::test_utils::{BROADCAST, COMMANDS_TOPIC, TARGET_IP};
use lanwake_devkit::TestHarness;
use std::time::Duration;
use tokio::time::advance;

#[tokio::test(start_paused = true)]
async fn test_already_online_sends_no_packet() {
    let mut h = TestHarness::new();
    h.prober.set_online(true);
    h.connect().await;

    h.send_command("wol").await;
    advance(Duration::from_secs(30)).await;
    h.tick().await;

    assert_eq!(h.responses(), vec!["al_on"]);
    assert!(h.sender.sent().is_empty());
    assert_eq!(h.prober.probe_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wake_confirmed_after_grace() {
    let mut h = TestHarness::new();
    h.connect().await;
    h.prober.script([false, true]);

    h.send_command("wol").await;
    assert_eq!(h.responses(), vec!["wol_sent"]);
    let sent = h.sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, TestHarness::target().mac);
    assert_eq!(sent[0].1, BROADCAST);

    advance(Duration::from_secs(19)).await;
    h.tick().await;
    assert_eq!(h.responses(), vec!["wol_sent"]);
    assert_eq!(h.prober.probe_count(), 1);

    advance(Duration::from_secs(1)).await;
    h.tick().await;
    assert_eq!(h.responses(), vec!["wol_sent", "wol_ok"]);
    assert_eq!(h.prober.probed(), vec![TARGET_IP, TARGET_IP]);
    assert_eq!(h.agent.dispatcher().wake_state(), WakeState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_wake_failed_when_target_stays_down() {
    let mut h = TestHarness::new();
    h.connect().await;

    h.send_command("wol").await;
    advance(Duration::from_secs(20)).await;
    h.tick().await;

    assert_eq!(h.responses(), vec!["wol_sent", "wol_fail"]);
    assert_eq!(h.sender.sent().len(), 1);

    // Nothing more once terminal
    advance(Duration::from_secs(60)).await;
    h.tick().await;
    assert_eq!(h.responses().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_commands_queued_during_grace() {
    let mut h = TestHarness::new();
    h.connect().await;

    h.send_command("wol").await;
    advance(Duration::from_secs(5)).await;
    h.send_command("ping").await;
    h.send_command("status").await;

    assert_eq!(h.responses(), vec!["wol_sent"]);
    assert_eq!(h.agent.dispatcher().pending(), 2);
    assert!(matches!(
        h.agent.dispatcher().wake_state(),
        WakeState::AwaitingBoot { .. }
    ));

    advance(Duration::from_secs(15)).await;
    h.tick().await;

    let responses = h.responses();
    assert_eq!(&responses[..3], &["wol_sent", "wol_fail", "ping_fail"]);
    assert!(responses[3].starts_with("stat_info "));
    assert_eq!(h.agent.dispatcher().pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_burst_during_grace_is_capped() {
    let mut h = TestHarness::new();
    h.connect().await;

    h.send_command("wol").await;
    for _ in 0..COMMAND_QUEUE_LIMIT + 8 {
        h.link.simulate_incoming(COMMANDS_TOPIC, "ping");
    }
    h.tick().await;
    assert_eq!(h.agent.dispatcher().pending(), COMMAND_QUEUE_LIMIT);

    advance(Duration::from_secs(20)).await;
    h.tick().await;

    let responses = h.responses();
    assert_eq!(responses.len(), 2 + COMMAND_QUEUE_LIMIT);
    assert_eq!(&responses[..2], &["wol_sent", "wol_fail"]);
    assert!(responses[2..].iter().all(|r| r == "ping_fail"));
    assert_eq!(h.agent.dispatcher().pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_wol_runs_after_first() {
    let mut h = TestHarness::new();
    h.connect().await;
    // check, recheck, second check
    h.prober.script([false, true, true]);

    h.send_command("wol").await;
    h.send_command("wol").await;
    assert_eq!(h.responses(), vec!["wol_sent"]);

    advance(Duration::from_secs(20)).await;
    h.tick().await;

    assert_eq!(h.responses(), vec!["wol_sent", "wol_ok", "al_on"]);
    assert_eq!(h.sender.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_link_supervised_during_grace() {
    let mut h = TestHarness::new();
    h.connect().await;
    h.send_command("wol").await;

    h.link.drop_connection();
    advance(Duration::from_secs(2)).await;
    h.tick().await;

    // Reconnected and resubscribed while the wake sequence is still waiting
    assert!(h.link.connected());
    assert_eq!(h.link.connect_attempts().len(), 2);
    assert_eq!(h.link.subscriptions().len(), 2);
    assert!(matches!(
        h.agent.dispatcher().wake_state(),
        WakeState::AwaitingBoot { .. }
    ));

    advance(Duration::from_secs(18)).await;
    h.tick().await;
    assert_eq!(h.responses(), vec!["wol_sent", "wol_fail"]);
}

#[tokio::test(start_paused = true)]
async fn test_socket_failure_reports_wol_fail() {
    let mut h = TestHarness::new();
    h.connect().await;
    h.sender.set_failing(true);

    h.send_command("wol").await;

    assert_eq!(h.responses(), vec!["wol_fail"]);
    assert!(h.sender.sent().is_empty());
    assert_eq!(h.agent.dispatcher().wake_state(), WakeState::Idle);
}
