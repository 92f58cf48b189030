use std::error::Error;

use clap::Parser;
use irqflow_app::AppConfig;
use irqflow_kernel::{Kernel, KernelConfig};
use irqflow_sim::{log_trace_hook, ExitHalt, Scenario, SimTransport, Simulator, DEMO_SCENARIO};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the irqflow firmware against a simulated board")]
struct Opts {
    /// Comma-separated `kind@tick` events (press, bounce, timer, cmd:<line>)
    #[arg(long, default_value = DEMO_SCENARIO, value_name = "EVENTS")]
    events: String,

    /// Heap available to task and queue creation
    #[arg(long, default_value_t = 16 * 1024, value_name = "BYTES")]
    heap_bytes: usize,

    /// Request a reschedule when a button press wakes the application
    #[arg(long)]
    yield_from_isr: bool,

    /// Leave the indicator LED alone in the sleep/wake hooks
    #[arg(long)]
    no_indicator: bool,

    /// Enable the periodic counter/timer interrupt
    #[arg(long)]
    periodic_timer: bool,

    /// Forward kernel trace records to the log
    #[arg(long)]
    trace: bool,

    /// Keep the scheduler running after the scenario ends
    #[arg(long)]
    forever: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let opts = Opts::parse();

    let scenario: Scenario = opts.events.parse()?;
    let kernel_config = KernelConfig::builder()
        .name("irqflow-sim")
        .heap_bytes(opts.heap_bytes)
        .build();
    let mut builder = Kernel::builder(kernel_config).with_halt_strategy(ExitHalt::default());
    if opts.trace {
        builder = builder.with_trace_hook(log_trace_hook());
    }

    let config = AppConfig::builder()
        .yield_from_isr(opts.yield_from_isr)
        .indicator_in_power_hooks(!opts.no_indicator)
        .periodic_timer(opts.periodic_timer)
        .build();

    let mut simulator = Simulator::new(builder.build(), config, scenario, SimTransport::with_echo());
    if opts.forever {
        return Ok(simulator.run_forever()?);
    }

    let report = simulator.run()?;
    println!("ran until tick {}", report.now.raw());
    println!(
        "buttons={} wakes={} timer={}",
        report.button_presses, report.wakes, report.timer_ticks
    );
    println!("channel: {}", report.channel);
    println!(
        "leds={:#07b} sleeps={} debounce busy-wait={}us",
        report.leds,
        report.sleeps,
        report.busy_wait_ns / 1_000
    );
    Ok(())
}
