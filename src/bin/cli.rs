use chrono::NaiveDate;
use school_days::{
    Calendar, CalendarEvent, Classroom, ClassroomDirectory, CoverageKind, DayScope, DecisionReason,
    EventDraft, EventType, SchoolDayDecision, Step, export_events_to_csv, import_events_from_csv,
    load_calendar_from_json, save_calendar_to_json,
};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `-` stands for "not given".
fn parse_optional_i32(s: Option<&str>) -> Result<Option<i32>, String> {
    match s {
        None | Some("-") => Ok(None),
        Some(value) => value
            .parse::<i32>()
            .map(Some)
            .map_err(|_| format!("Invalid number '{value}'")),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  new <id> <year> <unity_id>         Start an empty calendar\n  load <json_path>                   Load calendar snapshot\n  save <json_path>                   Save calendar snapshot\n  import <csv_path>                  Create events from CSV rows\n  export <csv_path>                  Write events to CSV\n  info                               Show calendar attributes\n  steps                              List steps\n  step add <n> <start> <end>         Add a step (YYYY-MM-DD)\n  classroom <id> <grade_id> <period> Register a classroom for checks\n  events [YYYY-MM-DD]                List events (optionally of one date)\n  event add <type> <coverage> <date> <legend|-> <grade|-> <classroom|-> <periods|-> <description...>\n                                     Create an event\n  event remove <id>                  Remove an event\n  check <date> [grade|-] [classroom|-]\n                                     Decide one date\n  range <start> <end> [grade|-] [classroom|-]\n                                     List school days in a range\n  quit|exit                          Exit"
    );
}

fn print_info(calendar: &Calendar) {
    let weekdays = calendar
        .school_week()
        .weekdays()
        .iter()
        .map(|wd| wd.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!("Calendar id        : {}", calendar.id());
    println!("Year               : {}", calendar.year());
    println!("Unity              : {}", calendar.unity_id());
    println!("Classes per day    : {}", calendar.number_of_classes());
    println!("School week        : {}", weekdays);
    println!("Steps              : {}", calendar.steps().len());
    println!("Events             : {}", calendar.event_count());
}

fn print_steps(calendar: &Calendar) {
    if calendar.steps().is_empty() {
        println!("No steps configured.");
    }
    for step in calendar.steps() {
        println!(
            "  step {:<3} {} .. {}  posting {} .. {}",
            step.step_number,
            step.start_at,
            step.end_at,
            step.start_date_for_posting,
            step.end_date_for_posting
        );
    }
}

fn print_event(event: &CalendarEvent) {
    let periods = event
        .periods()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    println!(
        "  #{:<4} {} {:<32} {:<12} grade={} classroom={} periods=[{}] legend={} {}",
        event.id(),
        event.event_date(),
        event.event_type().as_str(),
        event.coverage().kind().as_str(),
        event.grade_id().map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
        event
            .classroom_id()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into()),
        periods,
        event.legend().unwrap_or("-"),
        event.description()
    );
}

fn describe(decision: &SchoolDayDecision) -> String {
    let verdict = if decision.is_school_day {
        "school day"
    } else {
        "no school"
    };
    let reason = match decision.reason {
        DecisionReason::Event {
            event_id,
            event_type,
            tier,
        } => format!("event #{event_id} ({event_type}, {tier:?} tier)"),
        DecisionReason::OutsideCalendar => "outside every step".to_string(),
        DecisionReason::SchoolWeekday => "regular school weekday".to_string(),
        DecisionReason::RestDay => "rest day".to_string(),
    };
    format!("{}: {} - {}", decision.date, verdict, reason)
}

/// Resolves the optional grade/classroom arguments shared by `check` and `range`.
fn scope_args(
    directory: &BTreeMap<i32, Classroom>,
    grade_s: Option<&str>,
    classroom_s: Option<&str>,
) -> Result<(Option<i32>, Option<Classroom>), String> {
    let grade_id = parse_optional_i32(grade_s)?;
    let classroom = match parse_optional_i32(classroom_s)? {
        Some(id) => Some(
            directory
                .classroom(id)
                .ok_or_else(|| format!("Classroom {id} not registered"))?,
        ),
        None => None,
    };
    Ok((grade_id, classroom))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SCHOOL_DAYS_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut calendar = Calendar::new(1, 2021, 1);
    let mut classrooms: BTreeMap<i32, Classroom> = BTreeMap::new();

    println!("School Days (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "info" => print_info(&calendar),
            "new" => {
                let args: Vec<&str> = parts.collect();
                match args.as_slice() {
                    [id, year, unity] => {
                        match (id.parse(), year.parse(), unity.parse()) {
                            (Ok(id), Ok(year), Ok(unity)) => {
                                calendar = Calendar::new(id, year, unity);
                                println!("Started calendar {id} for {year}.");
                            }
                            _ => println!("Invalid number"),
                        }
                    }
                    _ => println!("Usage: new <id> <year> <unity_id>"),
                }
            }
            "load" => match parts.next() {
                Some(path) => match load_calendar_from_json(path) {
                    Ok(loaded) => {
                        calendar = loaded;
                        println!("Calendar loaded from {path}.");
                    }
                    Err(e) => println!("Error loading calendar: {}", e),
                },
                None => println!("Usage: load <json_path>"),
            },
            "save" => match parts.next() {
                Some(path) => match save_calendar_to_json(&calendar, path) {
                    Ok(_) => println!("Calendar saved to {path}."),
                    Err(e) => println!("Error saving calendar: {}", e),
                },
                None => println!("Usage: save <json_path>"),
            },
            "import" => match parts.next() {
                Some(path) => match import_events_from_csv(&mut calendar, path) {
                    Ok(created) => println!("Imported {created} events."),
                    Err(e) => println!("Import rejected: {}", e),
                },
                None => println!("Usage: import <csv_path>"),
            },
            "export" => match parts.next() {
                Some(path) => match export_events_to_csv(&calendar, path) {
                    Ok(_) => println!("Events exported to {path}."),
                    Err(e) => println!("Error exporting events: {}", e),
                },
                None => println!("Usage: export <csv_path>"),
            },
            "steps" => print_steps(&calendar),
            "step" => {
                let args: Vec<&str> = parts.collect();
                match args.as_slice() {
                    ["add", number, start, end] => {
                        let number: u32 = match number.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid step number");
                                continue;
                            }
                        };
                        let (Some(start), Some(end)) = (parse_date(start), parse_date(end)) else {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        };
                        let mut steps = calendar.steps().to_vec();
                        steps.push(Step::new(number, start, end));
                        match calendar.set_steps(steps) {
                            Ok(_) => println!("Step {number} added."),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: step add <n> <start> <end>"),
                }
            }
            "classroom" => {
                let args: Vec<&str> = parts.collect();
                match args.as_slice() {
                    [id, grade, period] => match (id.parse(), grade.parse(), period.parse()) {
                        (Ok(id), Ok(grade), Ok(period)) => {
                            classrooms.insert(id, Classroom::new(id, grade, period));
                            println!("Classroom {id} registered.");
                        }
                        _ => println!("Invalid number"),
                    },
                    _ => println!("Usage: classroom <id> <grade_id> <period>"),
                }
            }
            "events" => match parts.next() {
                Some(date_s) => match parse_date(date_s) {
                    Some(date) => calendar.events_on(date).iter().for_each(print_event),
                    None => println!("Invalid date (YYYY-MM-DD)"),
                },
                None => calendar.events().for_each(print_event),
            },
            "event" => match parts.next() {
                Some("add") => {
                    let args: Vec<&str> = parts.collect();
                    if args.len() < 8 {
                        println!(
                            "Usage: event add <type> <coverage> <date> <legend|-> <grade|-> <classroom|-> <periods|-> <description...>"
                        );
                        continue;
                    }
                    let event_type = match EventType::from_str(args[0]) {
                        Ok(v) => v,
                        Err(e) => {
                            println!("{e}");
                            continue;
                        }
                    };
                    let coverage = match CoverageKind::from_str(args[1]) {
                        Ok(v) => v,
                        Err(e) => {
                            println!("{e}");
                            continue;
                        }
                    };
                    let Some(date) = parse_date(args[2]) else {
                        println!("Invalid date (YYYY-MM-DD)");
                        continue;
                    };
                    let (grade_id, classroom_id) = match (
                        parse_optional_i32(Some(args[4])),
                        parse_optional_i32(Some(args[5])),
                    ) {
                        (Ok(grade), Ok(classroom)) => (grade, classroom),
                        (Err(e), _) | (_, Err(e)) => {
                            println!("{e}");
                            continue;
                        }
                    };
                    let mut draft =
                        EventDraft::new(args[7..].join(" "), event_type, date, coverage);
                    draft.grade_id = grade_id;
                    draft.classroom_id = classroom_id;
                    if args[3] != "-" {
                        draft.legend = Some(args[3].to_string());
                    }
                    if args[6] != "-" {
                        if let Err(e) = draft.set_periods_csv(args[6]) {
                            println!("{e}");
                            continue;
                        }
                    }
                    match calendar.add_event(&draft) {
                        Ok(event) => println!("Event #{} created.", event.id()),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                Some("remove") => match parse_optional_i32(parts.next()) {
                    Ok(Some(id)) => match calendar.remove_event(id) {
                        Ok(_) => println!("Event #{id} removed."),
                        Err(e) => println!("Error: {}", e),
                    },
                    Ok(None) => println!("Usage: event remove <id>"),
                    Err(e) => println!("{e}"),
                },
                _ => println!("Usage: event <add|remove> ..."),
            },
            "check" => {
                let Some(date) = parts.next().and_then(parse_date) else {
                    println!("Usage: check <date> [grade|-] [classroom|-]");
                    continue;
                };
                match scope_args(&classrooms, parts.next(), parts.next()) {
                    Ok((grade_id, classroom)) => {
                        let scope = DayScope {
                            grade_id,
                            classroom: classroom.as_ref(),
                        };
                        println!("{}", describe(&calendar.decide(date, scope)));
                    }
                    Err(e) => println!("{e}"),
                }
            }
            "range" => {
                let start = parts.next().and_then(parse_date);
                let end = parts.next().and_then(parse_date);
                let (Some(start), Some(end)) = (start, end) else {
                    println!("Usage: range <start> <end> [grade|-] [classroom|-]");
                    continue;
                };
                match scope_args(&classrooms, parts.next(), parts.next()) {
                    Ok((grade_id, classroom)) => {
                        let scope = DayScope {
                            grade_id,
                            classroom: classroom.as_ref(),
                        };
                        let days = calendar.school_days_in_range(scope, start, end);
                        println!("{} school days", days.len());
                        for day in days {
                            println!("  {day}");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
