use chrono::{Local, Utc};
use parkmeter::billing::{
    calculate_fee, compute_reminders_with, current_period_label, format_elapsed, DefaultStyle,
    ReminderEvent, TariffCatalog, TariffDefinition,
};
use parkmeter::cli::Cli;
use parkmeter::config::Config;
use parkmeter::notify::{NotificationSink, ShortcutsSink};
use parkmeter::session::{parse_time_input, ParkingSession, SessionStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    // Handle configuration commands
    if cli.init {
        Config::init()?;
        return Ok(());
    }

    if cli.print {
        let config = Config::load().unwrap_or_else(|_| Config::default());
        config.print()?;
        return Ok(());
    }

    if cli.check {
        let config = Config::load()?;
        config.check()?;
        println!("✓ Configuration valid");
        return Ok(());
    }

    // Load configuration and compose the catalog
    let config = Config::load().unwrap_or_else(|_| Config::default());
    let catalog = config.catalog()?;

    if cli.list {
        handle_list(&catalog);
        return Ok(());
    }

    if let Some(lot_id) = cli.rules {
        handle_rules(&catalog, lot_id);
        return Ok(());
    }

    let store = SessionStore::new()?;

    if let Some(lot_id) = cli.start {
        handle_start(&store, &catalog, &config, lot_id)?;
        return Ok(());
    }

    if let Some(time_input) = &cli.adjust {
        handle_adjust(&store, &catalog, &config, time_input)?;
        return Ok(());
    }

    if cli.remind {
        handle_remind(&store, &catalog, &config)?;
        return Ok(());
    }

    if cli.finish {
        handle_finish(&store, &catalog)?;
        return Ok(());
    }

    // Default action (also --status): show the active session
    handle_status(&store, &catalog, &config)
}

fn handle_list(catalog: &TariffCatalog) {
    for lot in catalog.lots() {
        println!("{:>3}  {} - {}", lot.id, lot.name, lot.description);
    }
}

fn handle_rules(catalog: &TariffCatalog, lot_id: u32) {
    let lot = require_lot(catalog, lot_id);
    println!("{} - {}", lot.name, lot.description);
    for line in lot.rule_lines() {
        println!("  {}", line);
    }
}

fn handle_start(
    store: &SessionStore,
    catalog: &TariffCatalog,
    config: &Config,
    lot_id: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(session) = store.load()? {
        eprintln!(
            "Error: a session is already active (lot {} since {})",
            session.lot_id,
            session
                .start_time
                .with_timezone(&Local)
                .format("%H:%M")
        );
        eprintln!("Finish it first with --finish");
        std::process::exit(1);
    }

    let lot = require_lot(catalog, lot_id);
    let session = ParkingSession::begin(lot_id, Utc::now());
    store.save(&session)?;

    println!("✓ Started parking at {}", lot.name);
    print_reminder_plan(lot, &session, config);

    Ok(())
}

fn handle_status(
    store: &SessionStore,
    catalog: &TariffCatalog,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = match store.load()? {
        Some(session) => session,
        None => {
            println!("ℹ No active parking session (start one with --start <LOT_ID>)");
            return Ok(());
        }
    };

    let lot = require_lot(catalog, session.lot_id);
    let now = Utc::now();
    let elapsed = session.elapsed_minutes(now);

    println!("Parking at {}", lot.name);
    println!("  Elapsed: {}", format_elapsed(elapsed));
    println!("  Current fee: {}元", calculate_fee(lot, elapsed));
    println!("  Period: {}", current_period_label(lot, elapsed));

    let reminders = session_reminders(lot, &session, config);
    match reminders.get(session.reminders_sent as usize) {
        Some(next) => {
            let minutes_to_fire = (next.fire_time - now).num_minutes();
            if minutes_to_fire > 0 {
                println!("  Next reminder: in {}", format_elapsed(minutes_to_fire));
            } else {
                println!("  Next reminder: due now");
            }
        }
        None => println!("  Next reminder: none left"),
    }

    Ok(())
}

fn handle_adjust(
    store: &SessionStore,
    catalog: &TariffCatalog,
    config: &Config,
    time_input: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = require_session(store)?;

    match parse_time_input(time_input, session.start_time) {
        Ok(adjusted) => {
            session.adjusted_start_time = Some(adjusted);
            store.save(&session)?;
            println!(
                "✓ Start time adjusted to {}",
                adjusted.with_timezone(&Local).format("%H:%M")
            );

            // The reminder sequence is recomputed whole from the new start.
            let lot = require_lot(catalog, session.lot_id);
            print_reminder_plan(lot, &session, config);
        }
        Err(e) => {
            eprintln!("Error: invalid time: {}", e);
            eprintln!("Valid formats: single hour (0-23), HH:MM, or ISO timestamp (YYYY-MM-DDTHH:MM:SSZ)");
            eprintln!(
                "Times are interpreted as local time (current: {})",
                Local::now().format("%H:%M")
            );
            std::process::exit(1);
        }
    }

    Ok(())
}

fn handle_remind(
    store: &SessionStore,
    catalog: &TariffCatalog,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = require_session(store)?;
    let lot = require_lot(catalog, session.lot_id);

    let reminders = session_reminders(lot, &session, config);
    match reminders.get(session.reminders_sent as usize) {
        None => println!("ℹ All reminders have been dispatched"),
        Some(reminder) => {
            let sink = ShortcutsSink::new(config.shortcut_name.clone());
            sink.dispatch(reminder);

            session.reminders_sent += 1;
            store.save(&session)?;
        }
    }

    Ok(())
}

fn handle_finish(
    store: &SessionStore,
    catalog: &TariffCatalog,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = require_session(store)?;
    let lot = require_lot(catalog, session.lot_id);

    let elapsed = session.elapsed_minutes(Utc::now());
    let fee = calculate_fee(lot, elapsed);

    println!("Parked {} at {}", format_elapsed(elapsed), lot.name);
    println!("  Fee due: {}元", fee);
    if fee == 0 {
        println!("  Still within the free period!");
    }

    store.clear()?;
    println!("✓ Session closed");

    Ok(())
}

/// Recompute the full reminder sequence for the session's effective start.
fn session_reminders(
    lot: &TariffDefinition,
    session: &ParkingSession,
    config: &Config,
) -> Vec<ReminderEvent> {
    compute_reminders_with(
        lot,
        session.effective_start_time(),
        &config.tuning,
        &DefaultStyle,
    )
}

fn print_reminder_plan(lot: &TariffDefinition, session: &ParkingSession, config: &Config) {
    let reminders = session_reminders(lot, session, config);
    if reminders.is_empty() {
        println!("  No reminders planned");
        return;
    }

    println!("  Planned reminders:");
    for reminder in &reminders {
        println!(
            "    {}  {}",
            reminder.fire_time.with_timezone(&Local).format("%H:%M"),
            reminder.message
        );
    }
}

fn require_lot(catalog: &TariffCatalog, lot_id: u32) -> &TariffDefinition {
    match catalog.by_id(lot_id) {
        Some(lot) => lot,
        None => {
            eprintln!("Error: unknown parking lot id: {}", lot_id);
            eprintln!("Use --list to see the available lots");
            std::process::exit(1);
        }
    }
}

fn require_session(store: &SessionStore) -> Result<ParkingSession, Box<dyn std::error::Error>> {
    match store.load()? {
        Some(session) => Ok(session),
        None => {
            eprintln!("Error: no active parking session (start one with --start <LOT_ID>)");
            std::process::exit(1);
        }
    }
}
