use std::io::Write;

use clap::Subcommand;
use focusroom_core::{AppConfig, Clock, Event, FocusTimer, RunState, Stores, TimerMode, TimerState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use super::format_clock;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in the foreground (s start, p pause, k skip, r reset, q quit)
    Run {
        /// Start the first Work interval right away
        #[arg(long)]
        start: bool,
    },
    /// Print current timer state as JSON
    Status,
}

pub async fn run(action: TimerAction, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::open(config)?;
    let timer = FocusTimer::open(
        &stores,
        Clock::new(config.clock.tick_interval()),
        config.stats.streak_lookback_days,
    )
    .await?;

    match action {
        TimerAction::Status => {
            println!("{}", serde_json::to_string_pretty(&timer.snapshot())?);
            timer.shutdown();
            Ok(())
        }
        TimerAction::Run { start } => {
            let result = interactive(&timer, start, config).await;
            timer.drain().await;
            timer.shutdown();
            println!();
            result
        }
    }
}

async fn interactive(
    timer: &FocusTimer,
    autostart: bool,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = timer.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut redraw = tokio::time::interval(config.clock.tick_interval());

    eprintln!("s start/resume, p pause, k skip, r reset, q quit");
    if autostart {
        timer.start()?;
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "s" | "start" => {
                        timer.start()?;
                    }
                    "p" | "pause" => {
                        timer.pause();
                    }
                    "k" | "skip" => {
                        timer.skip()?;
                    }
                    "r" | "reset" => {
                        timer.reset();
                    }
                    "q" | "quit" => break,
                    "" => {}
                    other => eprintln!("unknown command: {other}"),
                }
            }
            event = events.recv() => match event {
                Ok(event) => report(timer, &event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "timer events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = redraw.tick() => draw(&timer.state(), timer.recorder().today_count()),
        }
    }
    Ok(())
}

fn mode_label(mode: TimerMode, long_break: bool) -> &'static str {
    match mode {
        TimerMode::Work => "Focus",
        TimerMode::Break if long_break => "Long break",
        TimerMode::Break => "Break",
    }
}

fn draw(state: &TimerState, today_count: u32) {
    let run = match state.run_state {
        RunState::Idle => "idle",
        RunState::Running => "running",
        RunState::Paused => "paused",
    };
    let mut out = std::io::stdout();
    let _ = write!(
        out,
        "\r{:<10} {}  [{run:<7}]  today: {today_count}  ",
        mode_label(state.mode, state.long_break),
        format_clock(state.remaining_seconds),
    );
    let _ = out.flush();
}

fn report(timer: &FocusTimer, event: &Event) {
    if timer.cue_for(event).is_some() {
        print!("\x07");
    }
    match event {
        Event::ModeCompleted {
            finished,
            next,
            long_break,
            skipped,
            ..
        } => {
            let how = if *skipped { "skipped" } else { "finished" };
            println!(
                "\r{} {how}, {} started",
                mode_label(*finished, false),
                mode_label(*next, *long_break).to_lowercase()
            );
        }
        Event::SessionRecorded { session, .. } => {
            println!("\rsaved {} min focus session", session.duration_minutes);
        }
        Event::SessionRecordFailed {
            duration_minutes,
            message,
            ..
        } => {
            eprintln!("\rwarning: could not save {duration_minutes} min session: {message}");
        }
        _ => {}
    }
    draw(&timer.state(), timer.recorder().today_count());
}
