use chrono::{Local, NaiveDate};
use clap::Subcommand;
use focusroom_core::session::stats::week_bounds;
use focusroom_core::{AppConfig, SessionKind, SessionRecorder, Stores};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List logged sessions (defaults to the current week)
    List {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Log a completed session by hand
    Add {
        minutes: u32,
        /// work or break
        #[arg(long, default_value = "work", value_parser = parse_kind)]
        kind: SessionKind,
    },
}

fn parse_kind(raw: &str) -> Result<SessionKind, String> {
    SessionKind::parse(raw).ok_or_else(|| format!("'{raw}' is not one of: work, break"))
}

pub async fn run(action: SessionsAction, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::open(config)?;

    match action {
        SessionsAction::List { from, to, json } => {
            let today = Local::now().date_naive();
            let from = from.unwrap_or_else(|| week_bounds(today).0);
            let to = to.unwrap_or(today);
            let sessions = stores.sessions.list_for_window(from, to).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else if sessions.is_empty() {
                println!("no sessions between {from} and {to}");
            } else {
                for s in &sessions {
                    println!(
                        "{}  {:<5}  {:>3} min  {}",
                        s.date,
                        s.kind.as_str(),
                        s.duration_minutes,
                        s.completed_at.with_timezone(&Local).format("%H:%M")
                    );
                }
            }
        }
        SessionsAction::Add { minutes, kind } => {
            let recorder = SessionRecorder::new(stores.sessions, config.stats.streak_lookback_days);
            let session = recorder.record(kind, minutes).await?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
    }
    Ok(())
}
