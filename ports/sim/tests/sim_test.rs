//! Whole-firmware runs driven by scripted scenarios.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use irqflow_app::AppConfig;
use irqflow_core::{Instant, Ticks};
use irqflow_hal::Level;
use irqflow_kernel::{Kernel, KernelConfig};
use irqflow_queue::ChannelStats;
use irqflow_sim::{Scenario, SimTransport, Simulator, DEMO_SCENARIO};

fn simulator(config: AppConfig, events: &str) -> Simulator {
    let scenario: Scenario = events.parse().unwrap();
    Simulator::new(
        Kernel::new(KernelConfig::default()),
        config,
        scenario,
        SimTransport::new(),
    )
}

#[test]
fn presses_bounces_and_commands_end_to_end() {
    let mut sim = simulator(
        AppConfig::default(),
        "press@10, bounce@20, press@30, cmd@40:help, timer@50",
    );

    let report = sim.run().unwrap();

    assert_eq!(report.now, Instant::from_ticks(50));
    assert_eq!(report.button_presses, 2);
    assert_eq!(report.wakes, 5);
    assert_eq!(report.timer_ticks, 0);
    assert_eq!(report.sleeps, 5);
    assert_eq!(report.leds, 0);
    assert_eq!(
        report.channel,
        ChannelStats {
            accepted: 7,
            dropped: 0
        }
    );
    assert_eq!(report.busy_wait_ns, 46_000_000);
    assert_eq!(report.console.len(), 2);
    assert!(report.console[0].starts_with("gpio"));
    assert!(report.console[1].starts_with("iom"));
    assert_eq!(sim.indicator(), Level::High);
}

#[test]
fn single_press_leaves_application_led_on() {
    let mut sim = simulator(AppConfig::default(), "press@3");

    let report = sim.run().unwrap();

    assert_eq!(report.leds, 1 << 1);
    assert_eq!(report.button_presses, 1);
}

#[test]
fn periodic_timer_reaches_application() {
    let config = AppConfig::builder().periodic_timer(true).build();
    let mut sim = simulator(config, "timer@5, timer@6");

    let report = sim.run().unwrap();

    assert_eq!(report.timer_ticks, 2);
    assert_eq!(report.wakes, 2);
}

#[test]
fn empty_scenario_only_runs_startup() {
    let mut sim = simulator(AppConfig::default(), "");

    let report = sim.run().unwrap();

    assert_eq!(report.now, Instant::ZERO);
    assert_eq!(report.sleeps, 0);
    assert!(sim.system().registry().is_sealed());
    assert_eq!(sim.system().registry().names(), vec!["gpio", "iom"]);
}

#[test]
fn spawning_twice_reuses_the_tasks() {
    let mut sim = simulator(AppConfig::default(), "");

    let first = sim.spawn().unwrap();
    let second = sim.spawn().unwrap();

    assert_eq!(first, second);
    assert_eq!(sim.system().kernel().task_count(), 4);
}

#[test]
fn gpio_command_reads_board_state() {
    let mut sim = simulator(AppConfig::default(), "cmd@1:gpio write 4 1, cmd@2:gpio read 4, cmd@3:gpio");

    let report = sim.run().unwrap();

    assert_eq!(
        report.console,
        vec![
            "pin 4 <- 1".to_string(),
            "pin 4 = 1".to_string(),
            "error: usage: gpio read <pin> | gpio write <pin> <0|1>".to_string(),
        ]
    );
}

#[test]
fn demo_scenario_parses_and_runs() {
    let mut sim = simulator(AppConfig::default(), DEMO_SCENARIO);

    let report = sim.run().unwrap();

    assert_eq!(report.button_presses, 2);
    assert!(report.console.iter().any(|line| line == "pin 16 = 0"));
    assert!(report.console.iter().any(|line| line.starts_with("iom0:")));
}

#[test]
fn bounded_wait_without_events_advances_to_the_limit() {
    let sim = simulator(AppConfig::default(), "");

    assert!(!sim.hardware().wait(Ticks(5)));
    assert_eq!(sim.system().kernel().now(), Instant::from_ticks(5));
}

#[test]
fn running_forever_parks_once_the_scenario_is_exhausted() {
    let sim = simulator(AppConfig::default(), "press@3");
    let board = Arc::clone(sim.board());
    let kernel = Arc::clone(sim.system().kernel());

    thread::spawn(move || {
        let _ = sim.run_forever();
    });
    thread::sleep(Duration::from_millis(200));
    let settled = (board.sleep_count(), kernel.now(), board.ops().len());
    thread::sleep(Duration::from_millis(100));

    assert_eq!(settled.0, 2);
    assert_eq!(settled.1, Instant::from_ticks(3));
    assert_eq!((board.sleep_count(), kernel.now(), board.ops().len()), settled);
    assert_eq!(board.leds(), 1 << 1);
}
