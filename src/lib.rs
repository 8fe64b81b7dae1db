/*!
# Devotions

Devotions is a daily Psalm devotional for the terminal with a small private
journal attached. Each calendar day maps to one of the 150 Psalms; around it
the user records a mood, free "vent" text, and a prayer and reflection per
Psalm. A six-digit PIN keeps casual eyes off the journal.

## Architecture

- `calendar`: Date to Psalm mapping, slideshow steps, and the injected clock
- `store`: Key-value store trait, in-memory store, and the session file
- `db`: SQLite-backed durable store
- `journal`: Mood, vent, and Psalm response operations, entry list, and streak
- `gate`: PIN screen over the durable and session stores
- `ops`: Export and import of the whole journal
- `autosave`: Debounced saving for text fields
- `psalms`: Psalm dataset and inline styled text
- `editor`: External editor for vent text
- `cli`, `config`, `constants`, `errors`: The command-line surface and ambient plumbing

## Usage Example

```rust,no_run
use devotions::calendar::{psalm_index_for_date, Clock, DateKey};
use devotions::db::Database;
use devotions::journal::{Journal, Mood};
use devotions::Config;

fn main() -> devotions::AppResult<()> {
    let config = Config::load()?;
    config.ensure_data_dir()?;
    let clock = config.clock();

    let db = Database::open(&config.db_path)?;
    let journal = Journal::with_lookback(&db, config.lookback_days);

    let today = clock.today();
    journal.set_mood(DateKey::new(today), Mood::Baseline);
    println!("Psalm {} · streak {}", psalm_index_for_date(today), journal.streak(today));
    Ok(())
}
```
*/

pub mod autosave;
pub mod calendar;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
pub mod constants;
pub mod db;
pub mod editor;
/// Error types and utilities for error handling
pub mod errors;
pub mod gate;
pub mod journal;
pub mod ops;
pub mod psalms;
pub mod store;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use errors::{AppError, AppResult};
