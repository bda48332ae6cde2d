//! heatquiz interactive front end
//!
//! A line-oriented stand-in for the quiz page: pick conditions, run the
//! simulation, review the recent history, submit an answer, list stored
//! submissions.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use heatquiz::{
    EnvironmentalInput, HazardAnswer, PersistedSubmission, QuizConfig, QuizSession, RecordGateway,
    SimulationResult, StoreBackend, SCENARIO_PROMPT,
};

const HELP: &str = "\
COMMANDS:
    scenario                         Show the question
    run <temp> <humidity> <yes|no>   Simulate a run (temp 20-40 °C, humidity 10-90 %, drinking water?)
    history                          Show the most recent runs
    submit <answer> <name...>        Submit an answer (NoRisk, Dehydration, HeatStroke, HeatExhaustion, Hypothermia)
    records                          List stored submissions, newest first
    help                             Show this help
    quit                             Leave";

fn usage() {
    println!("heatquiz - heat-stress running quiz");
    println!();
    println!("USAGE:");
    println!("    heatquiz [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -d, --data-dir <DIR>      Store submissions in DIR [env: HEATQUIZ_DATA_DIR]");
    println!("    -m, --memory              Keep submissions in memory only");
    println!("    -v, --view <K>            Rows shown by `history` [default: 5]");
    println!("    -h, --help                Print help information");
    println!();
    println!("{HELP}");
}

fn parse_args(mut config: QuizConfig) -> Result<QuizConfig, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                let dir = args.get(i + 1).ok_or("--data-dir requires a value")?;
                config.store.backend = StoreBackend::Persistent {
                    dir: PathBuf::from(dir),
                };
                i += 2;
            }
            "--memory" | "-m" => {
                config.store.backend = StoreBackend::Memory;
                i += 1;
            }
            "--view" | "-v" => {
                let view = args.get(i + 1).ok_or("--view requires a value")?;
                config.history_view_len = view
                    .parse()
                    .map_err(|_| format!("invalid view length: {view}"))?;
                i += 2;
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            arg => return Err(format!("unknown argument: {arg}")),
        }
    }

    config.validate().map_err(|e| e.to_string())
}

fn print_result(result: &SimulationResult) {
    println!("  {:<18}{:>8}", "indicator", "value");
    for (name, value) in result.metrics() {
        println!("  {name:<18}{value:>8.1}");
    }
}

fn print_history(session: &QuizSession) {
    let rows = session.recent_history();
    if rows.is_empty() {
        println!("no runs yet");
        return;
    }
    println!(
        "  {:>5} {:>9} {:>6} {:>7} {:>11} {:>10}",
        "temp", "humidity", "water", "sweat", "water_loss", "body_temp"
    );
    for r in rows {
        println!(
            "  {:>5} {:>9} {:>6} {:>7.1} {:>11.1} {:>10.1}",
            r.temperature,
            r.humidity,
            if r.hydrated { "yes" } else { "no" },
            r.sweat_volume,
            r.water_loss,
            r.body_temperature
        );
    }
}

fn parse_hydrated(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "是" => Some(true),
        "no" | "n" | "false" | "否" => Some(false),
        _ => None,
    }
}

fn run_command(words: &[&str], session: &mut QuizSession) -> Result<(), String> {
    let [temp, humidity, water] = words else {
        return Err("usage: run <temp> <humidity> <yes|no>".to_string());
    };
    let temperature: i32 = temp.parse().map_err(|_| format!("invalid temperature: {temp}"))?;
    let humidity: u8 = humidity
        .parse()
        .map_err(|_| format!("invalid humidity: {humidity}"))?;
    let hydrated = parse_hydrated(water).ok_or_else(|| format!("expected yes or no, got {water}"))?;

    let input = EnvironmentalInput::checked(temperature, humidity, hydrated).map_err(|e| e.to_string())?;
    let result = session.run_simulation(input);
    print_result(&result);
    Ok(())
}

fn submit_command(words: &[&str], session: &QuizSession, gateway: &RecordGateway) -> Result<(), String> {
    let Some((answer, name)) = words.split_first() else {
        return Err("usage: submit <answer> <name...>".to_string());
    };
    let name = name.join(" ");
    let id = session
        .submit(&name, *answer, gateway)
        .map_err(|e| e.to_string())?;
    println!("saved submission {id}");
    Ok(())
}

/// Display label for a stored answer, falling back to the raw text.
fn answer_label(record: &PersistedSubmission) -> &str {
    record
        .hazard()
        .map_or(record.answer.as_str(), |hazard| hazard.display_label())
}

fn records_command(gateway: &RecordGateway) -> Result<(), String> {
    let records = gateway.fetch_all().map_err(|e| e.to_string())?;
    if records.is_empty() {
        println!("no submissions stored");
    }
    for record in records {
        let answer = answer_label(&record);
        println!(
            "{}  {}  {:<16} {}  ({} runs)",
            record.submit_time.format("%Y-%m-%d %H:%M:%S"),
            record.id,
            record.user_name,
            answer,
            record.history.len()
        );
        if let Some(err) = record.decode_error {
            println!("    ! {err}");
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = match QuizConfig::from_env().map_err(|e| e.to_string()).and_then(parse_args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let gateway = match config.gateway() {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let mut session = config.new_session();

    println!("{SCENARIO_PROMPT}");
    println!("type `help` for commands");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            continue;
        };

        let outcome = match command {
            "scenario" => {
                println!("{SCENARIO_PROMPT}");
                for answer in HazardAnswer::ALL {
                    println!("  {:<16} {}", answer.as_str(), answer.display_label());
                }
                Ok(())
            }
            "run" => run_command(rest, &mut session),
            "history" => {
                print_history(&session);
                Ok(())
            }
            "submit" => submit_command(rest, &session, &gateway),
            "records" => records_command(&gateway),
            "help" => {
                println!("{HELP}");
                Ok(())
            }
            "quit" | "exit" => break,
            other => Err(format!("unknown command: {other} (try `help`)")),
        };

        if let Err(e) = outcome {
            println!("error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use heatquiz::storage::RecordRow;
    use heatquiz::SubmissionId;

    fn stored(answer: &str) -> PersistedSubmission {
        PersistedSubmission::from_row(RecordRow {
            id: SubmissionId::new(),
            user_name: "Lin".to_string(),
            answer: answer.to_string(),
            history_data: None,
            submit_time: Utc::now(),
        })
    }

    #[test]
    fn test_answer_label() {
        assert_eq!(answer_label(&stored("HeatStroke")), "中暑 (Heat Stroke)");
        assert_eq!(answer_label(&stored("脱水 (Dehydration)")), "脱水 (Dehydration)");
        assert_eq!(answer_label(&stored("sunburn")), "sunburn");
    }

    #[test]
    fn test_parse_hydrated() {
        assert_eq!(parse_hydrated("YES"), Some(true));
        assert_eq!(parse_hydrated("否"), Some(false));
        assert_eq!(parse_hydrated("maybe"), None);
    }
}
