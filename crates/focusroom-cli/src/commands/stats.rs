use clap::Subcommand;
use focusroom_core::{AppConfig, SessionRecorder, Stores};
use serde_json::json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's sessions and minutes
    Today {
        #[arg(long)]
        json: bool,
    },
    /// Minutes per day for the current Sunday-Saturday week
    Week {
        #[arg(long)]
        json: bool,
    },
    /// All-time focus minutes
    All {
        #[arg(long)]
        json: bool,
    },
    /// Consecutive days with at least one focus session
    Streak {
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: StatsAction, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::open(config)?;
    let recorder = SessionRecorder::new(stores.sessions, config.stats.streak_lookback_days);
    recorder.refresh().await?;

    match action {
        StatsAction::Today { json } => {
            let stats = recorder.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "today: {} sessions, {} min (week {} min, streak {} days)",
                    stats.today_count, stats.today_minutes, stats.week_minutes, stats.streak_days
                );
            }
        }
        StatsAction::Week { json } => {
            let week = recorder.weekly_by_day();
            if json {
                println!("{}", serde_json::to_string_pretty(&week)?);
            } else {
                for (day, minutes) in &week {
                    println!("{}  {minutes:>4} min", day.format("%a %Y-%m-%d"));
                }
                println!("total      {:>4} min", recorder.week_total());
            }
        }
        StatsAction::All { json } => {
            let total = recorder.all_time_total().await?;
            if json {
                println!("{}", json!({ "total_minutes": total }));
            } else {
                println!("all time: {total} min");
            }
        }
        StatsAction::Streak { json } => {
            let streak = recorder.current_streak();
            if json {
                println!("{}", json!({ "streak_days": streak }));
            } else {
                println!("streak: {streak} days");
            }
        }
    }
    Ok(())
}
