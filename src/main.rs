/*!
# Devotions

A daily Psalm devotional with a private mood and prayer journal.

This file contains the main application flow, coordinating the various components
behind each subcommand.

## Usage

```text
devotions [--log-format text|json] [-v] <COMMAND>

Commands:
  pin set     Set the PIN, or replace it while unlocked
  unlock      Enter the PIN for this session
  lock        Lock the journal again
  today       Today's Psalm, mood, and streak
  step        Show what a step of the devotional displays
  mood        Record how you feel
  vent        Write freely; reads stdin when no text is given
  psalm       Read a Psalm and your response to it
  respond     Record a prayer or reflection for a Psalm
  journal     List journal entries, newest first
  streak      Consecutive days with an entry, ending today
  export      Write every journal entry to a JSON file
  import      Merge entries from an export file
```

Configuration comes from the environment; see [`devotions::config`].
*/

use clap::Parser;
use devotions::autosave::FieldAutosave;
use devotions::calendar::{
    date_for_step, psalm_index_for_date, Clock, DateKey, FixedClock, PsalmIndex, Step, StepCursor,
};
use devotions::cli::{CliArgs, Commands, PinCommand};
use devotions::constants::{
    DEFAULT_LOG_LEVEL, JOURNAL_DATE_DISPLAY_FORMAT, SAVE_DEBOUNCE_MS, TOTAL_STEPS,
    TRACING_ROOT_SPAN_NAME, TRACING_SERVICE_NAME,
};
use devotions::db::Database;
use devotions::editor::{Editor, SystemEditor};
use devotions::errors::{AppError, AppResult, GateError, TransferError};
use devotions::gate::{read_pin, Gate};
use devotions::journal::{Journal, PsalmResponse};
use devotions::ops::{export_all, import_file, write_export};
use devotions::psalms::{styled, PsalmLibrary};
use devotions::store::SessionFile;
use devotions::Config;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Installs the global subscriber: stderr, text or JSON, filtered by `RUST_LOG`.
fn init_tracing(args: &CliArgs) {
    let default_level = if args.verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);

    if args.is_json_logging() {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args);

    let correlation_id = Uuid::new_v4();
    let root_span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        service = TRACING_SERVICE_NAME,
        correlation_id = %correlation_id
    );
    let _guard = root_span.enter();

    debug!("CLI arguments: {:?}", args);

    // Errors are logged once here and nowhere below.
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> AppResult<()> {
    let config = Config::load()?;
    config.ensure_data_dir()?;
    let clock = config.clock();

    let db = Database::open(&config.db_path)?;
    let session =
        SessionFile::for_store(&config.session_dir, &config.db_path, config.session_timeout());
    let gate = Gate::new(&db, &session);

    if !args.command.runs_locked() {
        gate.require_unlocked()?;
    }

    let journal = Journal::with_lookback(&db, config.lookback_days);
    let today = DateKey::new(clock.today());

    match args.command {
        Commands::Pin {
            action: PinCommand::Set,
        } => {
            if gate.has_pin_set() && !gate.is_unlocked() {
                return Err(GateError::Locked.into());
            }
            let pin = read_pin("New PIN (6 digits): ")?;
            gate.set_pin(&pin)?;
            println!("PIN set. Devotions unlocked.");
        }

        Commands::Unlock => {
            if !gate.has_pin_set() {
                return Err(GateError::NoPinSet.into());
            }
            let pin = read_pin("PIN: ")?;
            gate.unlock(&pin)?;
            println!("Unlocked");
        }

        Commands::Lock => {
            gate.lock();
            println!("Locked");
        }

        Commands::Today => show_today(&journal, &clock),

        Commands::Step { index } => {
            let step = Step::from_index(index).ok_or_else(|| {
                AppError::Journal(format!("Step must be between 0 and {}", TOTAL_STEPS - 1))
            })?;
            println!("Step {}: {}", index, step);
            if let Step::Psalm(psalm) = step {
                let psalm_step = usize::from(psalm.get()) - 1;
                println!(
                    "Read on: {}",
                    DateKey::new(date_for_step(psalm_step, clock.today()))
                );
            }
        }

        Commands::Mood { mood, date } => {
            let date = date.unwrap_or(today);
            journal.set_mood(date, mood);
            info!("Recorded mood for {}", date);
            println!("Mood for {}: {}", date, mood.label());
        }

        Commands::Vent { text, date, editor } => {
            let date = date.unwrap_or(today);
            if let Some(text) = text {
                journal.set_vent(date, &text);
                println!("Vent saved for {}", date);
            } else if editor {
                let edited = SystemEditor::new(&config.editor).edit_text(&journal.get_vent(date))?;
                journal.set_vent(date, &edited);
                println!("Vent saved for {}", date);
            } else {
                vent_from_stdin(&journal, date)?;
            }
        }

        Commands::Psalm { number, plain } => {
            let psalm = match number {
                Some(n) => psalm_index(n)?,
                None => psalm_index_for_date(clock.today()),
            };
            show_psalm(&config, &journal, psalm, plain);
        }

        Commands::Respond {
            number,
            prayer,
            reflection,
        } => {
            if prayer.is_none() && reflection.is_none() {
                return Err(AppError::Journal(
                    "Nothing to save: pass --prayer or --reflection".to_string(),
                ));
            }
            let psalm = psalm_index(number)?;
            let mut response = journal.get_psalm_response(psalm);
            if let Some(prayer) = prayer {
                response.prayer = prayer;
            }
            if let Some(reflection) = reflection {
                response.reflection = reflection;
            }
            journal.set_psalm_response(psalm, &response);
            println!("Saved response to Psalm {}", psalm);
        }

        Commands::Journal => {
            let entries = journal.entries(clock.today());
            if entries.is_empty() {
                println!("No entries yet");
            }
            for entry in entries {
                let mood = entry.mood.map(|m| m.label()).unwrap_or("-");
                println!(
                    "{}  {}",
                    entry.date.date().format(JOURNAL_DATE_DISPLAY_FORMAT),
                    mood
                );
                if entry.has_vent() {
                    for line in entry.vent.lines() {
                        println!("    {}", line);
                    }
                }
            }
        }

        Commands::Streak => println!("Streak: {}", journal.streak(clock.today())),

        Commands::Export { output } => {
            let document = export_all(&db, &clock).ok_or(TransferError::StoreUnavailable)?;
            let dir = output.unwrap_or_else(|| PathBuf::from("."));
            let path = write_export(&document, &dir, today)?;
            println!(
                "Exported {} entries to {}",
                document.data.len(),
                path.display()
            );
        }

        Commands::Import { file } => {
            let outcome = import_file(&db, &file)?;
            info!("Import finished: {}", outcome);
            println!("{}", outcome);
        }
    }

    Ok(())
}

fn psalm_index(number: u16) -> AppResult<PsalmIndex> {
    PsalmIndex::new(number)
        .ok_or_else(|| AppError::Journal(format!("Psalm {} does not exist", number)))
}

fn show_today(journal: &Journal<&Database>, clock: &FixedClock) {
    let today = clock.today();
    let entry = journal.entry_for(DateKey::new(today));

    println!("{}", today.format(JOURNAL_DATE_DISPLAY_FORMAT));
    let mut cursor = StepCursor::new();
    cursor.go_to_todays_psalm(today);
    println!("{} (step {})", cursor.current(), cursor.step());
    println!(
        "Mood: {}",
        entry.mood.map(|m| m.label()).unwrap_or("not recorded")
    );
    println!(
        "Vent: {}",
        if entry.has_vent() { "written" } else { "empty" }
    );
    println!("Streak: {}", journal.streak(today));
}

fn show_psalm(config: &Config, journal: &Journal<&Database>, psalm: PsalmIndex, plain: bool) {
    let styled_output = !plain && io::stdout().is_terminal();

    println!("Psalm {}", psalm);
    match PsalmLibrary::load(&config.psalms_path) {
        Ok(library) => match library.get(psalm) {
            Some(found) => {
                for verse in &found.verses {
                    let segments = styled::parse(&verse.text);
                    let text = if styled_output {
                        styled::render_ansi(&segments)
                    } else {
                        styled::render_plain(&segments)
                    };
                    println!("{:>3} {}", verse.verse_number, text);
                }
            }
            None => println!("(Psalm {} is missing from the dataset)", psalm),
        },
        Err(e) => {
            warn!("Psalm dataset unavailable: {}", e);
            println!("(Psalm text not installed)");
        }
    }

    let PsalmResponse { prayer, reflection } = journal.get_psalm_response(psalm);
    if !prayer.trim().is_empty() {
        println!("\nPrayer: {}", prayer);
    }
    if !reflection.trim().is_empty() {
        println!("\nReflection: {}", reflection);
    }
}

/// Streams vent text from stdin, saving through the same debounce as a text field.
fn vent_from_stdin(journal: &Journal<&Database>, date: DateKey) -> AppResult<()> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("Write freely. Finish with Ctrl-D.");
    }

    let mut saves = 0;
    let mut text = String::new();
    {
        let mut field = FieldAutosave::new(Duration::from_millis(SAVE_DEBOUNCE_MS), |value: &str| {
            journal.set_vent(date, value)
        });
        for line in stdin.lock().lines() {
            let line = line?;
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&line);

            // A pause longer than the debounce saves the text typed before it.
            let now = Instant::now();
            if field.tick(now) {
                saves += 1;
            }
            field.edit(text.clone(), now);
        }
        if field.flush() {
            saves += 1;
        }
    }

    if saves > 0 {
        println!("Vent saved for {}", date);
    } else {
        println!("Nothing written");
    }
    Ok(())
}
