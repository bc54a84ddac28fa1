pub mod render;
pub mod shutdown;

use std::{io::Write, path::PathBuf, pin::pin};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    intake::{IntakeConfig, IntakeStore},
    notification::{
        console::ConsoleNotifier, desktop::DesktopNotifier, NotificationSink, Notifier, Permission,
    },
    reminder::{scheduler::ReminderScheduler, IntervalMinutes, TimerSnapshot},
    storage::{file_store::FileKeyValueStore, KeyValueStore},
    utils::{
        clock::DefaultClock,
        dir::{application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
        runtime::single_thread_runtime,
    },
};

/// Name of the file holding persisted intake inside the application directory.
pub const STATE_FILE: &str = "state.json";

#[derive(Parser, Debug)]
#[command(name = "waterminder", version, long_about = None)]
#[command(about = "Track your daily water intake and get reminded to drink", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME/waterminder or $HOME/.local/state/waterminder"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Print trace logs to the console")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Show today's progress")]
    Status,
    #[command(about = "Drink a glass")]
    Add,
    #[command(about = "Take back the last glass")]
    Remove,
    #[command(about = "Start today over from zero")]
    Reset,
    #[command(about = "Run the reminder with a live countdown until Ctrl-C")]
    Remind {
        #[arg(
            long,
            short,
            default_value_t = IntervalMinutes::default(),
            help = "Time between reminders. 15 to 120 minutes in steps of 15, e.g. 45 or 45min"
        )]
        interval: IntervalMinutes,
        #[arg(long, value_enum, default_value_t = NotifierKind::Console)]
        notifier: NotifierKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum NotifierKind {
    /// Bell and a line in this terminal.
    Console,
    /// Desktop notification through notify-send or osascript.
    Desktop,
}

impl NotifierKind {
    fn sink(self) -> Box<dyn NotificationSink> {
        match self {
            NotifierKind::Console => Box::new(ConsoleNotifier),
            NotifierKind::Desktop => Box::new(DesktopNotifier),
        }
    }
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = ensure_dir(args.dir.map_or_else(application_default_path, Ok)?)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    single_thread_runtime()?.block_on(run_command(args.commands, app_dir))
}

async fn run_command(command: Commands, app_dir: PathBuf) -> Result<()> {
    let storage = FileKeyValueStore::new(app_dir.join(STATE_FILE));
    debug!("Using state file {:?}", storage.path());
    let mut store =
        IntakeStore::load(storage, Box::new(DefaultClock), IntakeConfig::default()).await;

    match command {
        Commands::Status => {}
        Commands::Add => {
            if store.is_at_goal() {
                println!("Already at the daily goal, nothing added.");
            }
            store.add_glass().await;
        }
        Commands::Remove => {
            if store.is_empty() {
                println!("Nothing to remove yet.");
            }
            store.remove_glass().await;
        }
        Commands::Reset => {
            store.reset().await;
        }
        Commands::Remind { interval, notifier } => {
            return remind(&store, interval, notifier).await;
        }
    }

    print!("{}", render::status(&store.state(), &store.config()));
    Ok(())
}

async fn remind(
    store: &IntakeStore<impl KeyValueStore>,
    interval: IntervalMinutes,
    notifier: NotifierKind,
) -> Result<()> {
    println!("{}", render::status(&store.state(), &store.config()));

    let shutdown = CancellationToken::new();
    let mut scheduler = ReminderScheduler::new(
        interval,
        Notifier::new(notifier.sink()),
        Box::new(DefaultClock),
        shutdown.clone(),
    );
    let countdown = WatchStream::new(scheduler.subscribe());

    scheduler.start().await;
    match scheduler.notification_permission() {
        Some(Permission::Granted) => {}
        permission => println!(
            "Notifications are unavailable ({permission:?}), only the countdown will be shown."
        ),
    }

    tokio::join!(
        shutdown::detect_shutdown(shutdown.clone()),
        show_countdown(countdown, shutdown.clone(), std::io::stdout()),
    );

    scheduler.stop();
    println!();
    Ok(())
}

async fn show_countdown(
    countdown: impl Stream<Item = TimerSnapshot>,
    shutdown: CancellationToken,
    mut output: impl Write,
) {
    let mut countdown = pin!(countdown.take_until(shutdown.cancelled_owned()));
    while let Some(snapshot) = countdown.next().await {
        // Trailing spaces wipe leftovers of a longer previous line.
        let written = write!(output, "\r{}   ", render::countdown_line(&snapshot))
            .and_then(|_| output.flush());
        if let Err(e) = written {
            // Nowhere left to draw. Reminders keep firing until Ctrl-C.
            debug!("Stopping countdown display, output failed: {e}");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io, time::Duration};

    use futures::stream;
    use tokio_util::sync::CancellationToken;

    use crate::reminder::{IntervalMinutes, TimerSnapshot};

    use super::show_countdown;

    /// Accepts nothing, like a closed terminal.
    struct ClosedOutput;

    impl io::Write for ClosedOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    fn snapshot(seconds_remaining: u32) -> TimerSnapshot {
        TimerSnapshot {
            is_active: true,
            seconds_remaining,
            interval: IntervalMinutes::default(),
        }
    }

    #[tokio::test]
    async fn test_countdown_draws_every_snapshot() {
        let mut output = Vec::new();
        let snapshots = stream::iter([snapshot(1800), snapshot(1799)]);

        show_countdown(snapshots, CancellationToken::new(), &mut output).await;

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("\rNext reminder in 30:00"));
        assert!(text.contains("\rNext reminder in 29:59"));
    }

    #[tokio::test]
    async fn test_countdown_ends_when_output_fails() {
        // Neither the stream nor the token ever ends, only the failing output can stop it.
        let snapshots = stream::repeat(snapshot(1800));

        tokio::time::timeout(
            Duration::from_secs(5),
            show_countdown(snapshots, CancellationToken::new(), ClosedOutput),
        )
        .await
        .expect("countdown should stop once the output fails");
    }

    #[tokio::test]
    async fn test_countdown_ends_on_shutdown() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(
            Duration::from_secs(5),
            show_countdown(stream::pending(), shutdown, Vec::new()),
        )
        .await
        .expect("countdown should stop once shutdown is requested");
    }
}
