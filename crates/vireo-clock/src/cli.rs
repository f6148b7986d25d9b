use std::rc::Rc;

use clap::Parser;
use vireo_core::{Document, Duration, OutputTarget, Scheduler};
use vireo_runtime::Mounted;

use crate::clock::{Clock, DEFAULT_SELECTOR, WallClock, Zone, system_clock};
use crate::error::{ClockError, Result};
use crate::logging;
use crate::terminal::TerminalTarget;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "vireo-clock",
    about = "Analog clock driven by the Vireo reactive runtime, rendered to stdout",
    version
)]
pub struct Cli {
    /// Selector the clock renders into.
    #[arg(long, default_value = DEFAULT_SELECTOR)]
    pub selector: String,

    /// Milliseconds between timestamp refreshes.
    #[arg(long = "tick-ms", default_value_t = 1000)]
    pub tick_ms: u64,

    /// Stop after this many refreshes; 0 runs forever.
    #[arg(long, default_value_t = 0)]
    pub ticks: u64,

    /// Emit logs as JSON lines.
    #[arg(long = "log-json")]
    pub log_json: bool,
}

impl Cli {
    fn tick(&self) -> Result<Duration> {
        if self.tick_ms == 0 {
            return Err(ClockError::invalid("--tick-ms must be positive"));
        }
        Ok(Duration::from_millis(self.tick_ms))
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_json)?;
    let scheduler = Scheduler::new();
    let publishes = run_on(
        &cli,
        &scheduler,
        Rc::new(TerminalTarget::stdout()),
        system_clock(),
    )?;
    tracing::info!(publishes, "clock stopped");
    Ok(())
}

/// Mount a clock publishing into `target` and drive `scheduler` for the
/// requested number of ticks. Returns the number of publishes.
///
/// With `ticks == 0` this only returns if the interval goes away.
///
/// # Errors
///
/// [`ClockError::InvalidArgument`] for a zero tick, or a runtime error from
/// mounting or starting the component.
pub fn run_on(
    cli: &Cli,
    scheduler: &Scheduler,
    target: Rc<dyn OutputTarget>,
    now: WallClock,
) -> Result<u64> {
    let tick = cli.tick()?;
    let doc = Document::new();
    doc.attach(cli.selector.clone(), target);

    let clock = Clock::with_wall_clock(now)
        .zone(Zone::Local)
        .selector(cli.selector.clone())
        .tick(tick);
    let mounted = Mounted::mount(clock, scheduler, Rc::new(doc))?;
    mounted.start_deferred()?;
    tracing::info!(
        selector = %cli.selector,
        tick_ms = cli.tick_ms,
        ticks = cli.ticks,
        "clock started"
    );

    if cli.ticks == 0 {
        scheduler.run();
    } else {
        let span = tick.saturating_mul(u32::try_from(cli.ticks).unwrap_or(u32::MAX));
        scheduler.run_for(span);
    }
    Ok(mounted.render_scheduler().publishes())
}
