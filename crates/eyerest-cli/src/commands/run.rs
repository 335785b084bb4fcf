use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use eyerest_core::error::ThresholdError;
use eyerest_core::{
    CancellableTimer, ClockSettings, Collaborators, Config, Event, LoopObserver, ReminderClock,
    ReminderWindowScheduler, TaskDispatcher, WindowPresenter, WindowSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::console::{ConsolePresenter, LogAnnouncer, SimulatedMixer};

/// Channel-A level the simulated mixer starts at.
const SIMULATED_LEVEL: f64 = 0.5;

#[derive(Args)]
pub struct RunArgs {
    /// Start the clock immediately
    #[arg(long)]
    pub start: bool,
    /// Override clock.test_time (seconds)
    #[arg(long)]
    pub test_time: Option<u64>,
}

/// A line read from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand {
    Start,
    Pause,
    Reset,
    Close,
    Show,
    Status,
    Quit,
}

impl FromStr for HostCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "reset" => Ok(Self::Reset),
            "close" => Ok(Self::Close),
            "show" => Ok(Self::Show),
            "status" => Ok(Self::Status),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(drive(&config, args))
}

struct Host {
    clock: ReminderClock,
    scheduler: Arc<ReminderWindowScheduler>,
    presenter: Arc<dyn WindowPresenter>,
}

/// Wire the clock and the window scheduler to the console collaborators.
/// Must be called inside a tokio runtime.
fn assemble(config: &Config, test_time: Option<u64>) -> Result<Host, ThresholdError> {
    let mut settings = ClockSettings::from(config);
    if let Some(test_time) = test_time {
        settings.test_time = test_time;
    }

    let table = config.clock.threshold_table()?;
    let presenter: Arc<dyn WindowPresenter> = Arc::new(ConsolePresenter::default());
    let collaborators = Collaborators {
        mixer: Arc::new(SimulatedMixer::new(SIMULATED_LEVEL)),
        announcer: Arc::new(LogAnnouncer),
        presenter: Arc::clone(&presenter),
    };

    let mut clock =
        ReminderClock::new(settings, collaborators, TaskDispatcher::current()).with_table(table);
    let scheduler = ReminderWindowScheduler::new(
        WindowSettings::from(&config.window),
        CancellableTimer::current(),
        clock.subscribe(),
        Arc::clone(&presenter),
    );
    clock.set_loop_observer(Arc::clone(&scheduler) as Arc<dyn LoopObserver>);

    Ok(Host {
        clock,
        scheduler,
        presenter,
    })
}

impl Host {
    fn apply(&mut self, command: HostCommand) -> Vec<Event> {
        match command {
            HostCommand::Start => self.clock.start().into_iter().collect(),
            HostCommand::Pause => self.clock.pause().into_iter().collect(),
            HostCommand::Reset => self.clock.reset().into_iter().collect(),
            HostCommand::Close => {
                self.presenter.hide_window();
                self.scheduler.on_close();
                Vec::new()
            }
            HostCommand::Show => {
                self.scheduler.toggle_window();
                Vec::new()
            }
            HostCommand::Status => vec![self.clock.snapshot()],
            HostCommand::Quit => Vec::new(),
        }
    }
}

async fn drive(config: &Config, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut host = assemble(config, args.test_time)?;
    if args.start {
        emit(host.apply(HostCommand::Start))?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => emit(host.clock.tick())?,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<HostCommand>() {
                    Ok(HostCommand::Quit) => break,
                    Ok(command) => emit(host.apply(command))?,
                    Err(err) => tracing::warn!("{err}"),
                }
            }
        }
    }

    host.scheduler.cancel_all();
    tracing::info!(elapsed = host.clock.elapsed_seconds(), "driver stopped");
    Ok(())
}

fn emit(events: Vec<Event>) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
