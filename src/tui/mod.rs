pub mod app;
pub mod ui;

use std::{error::Error, io, time::{Duration, Instant}};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::subscriber::NoSubscriber;
use app::{App, InputField, InputMode};
use ui::ui;

use crate::config::Config;
use crate::models::Priority;
use crate::storage::Store;

const TICK_RATE: Duration = Duration::from_secs(1);

pub fn run_tui(store: Store, config: Config) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(store, config);

    // Log lines would corrupt the screen while the dashboard owns it
    let res = tracing::subscriber::with_default(NoSubscriber::default(), || {
        run_app(&mut terminal, &mut app)
    });

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

/// Draws and handles keys until the user quits. The one-second timer tick and
/// the reminder scan run from here, so both stop when the loop returns.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    app.deliver_reminders();
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(app, key.code) {
                    return Ok(());
                }
            }
        }
        if last_tick.elapsed() >= TICK_RATE {
            app.on_tick();
            app.poll_reminders();
            last_tick = Instant::now();
        }
    }
}

/// Applies a key press. Returns `true` when the user asked to quit.
fn handle_key(app: &mut App, code: KeyCode) -> bool {
    match app.input_mode {
        InputMode::Normal => match code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Char(' ') => app.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
            KeyCode::Char('a') => app.start_add(),
            KeyCode::Char('e') => app.start_edit(InputField::Text),
            KeyCode::Char('t') => app.start_edit(InputField::Tags),
            KeyCode::Char('r') => app.start_edit(InputField::Reminder),
            KeyCode::Char('n') => app.start_edit(InputField::TimerName),
            KeyCode::Char('M') => app.start_edit(InputField::TimerMinutes),
            KeyCode::Char('1') => app.set_priority(Priority::A),
            KeyCode::Char('2') => app.set_priority(Priority::B),
            KeyCode::Char('3') => app.set_priority(Priority::C),
            KeyCode::Char('f') => app.cycle_priority_filter(),
            KeyCode::Char('g') => app.cycle_tag_filter(),
            KeyCode::Char('/') => app.start_search(),
            KeyCode::Char('s') => app.cycle_sort(),
            KeyCode::Char('o') => app.flip_order(),
            KeyCode::Char('m') => app.pick_or_drop(),
            KeyCode::Char('T') => app.toggle_timer(),
            KeyCode::Char('R') => app.reset_timer(),
            KeyCode::Char('P') => app.switch_timer_mode(),
            KeyCode::Esc => {
                app.picked = None;
                app.notice = None;
            }
            _ => {}
        },
        InputMode::ConfirmDelete => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm_delete(false),
            _ => {}
        },
        InputMode::Editing | InputMode::Adding | InputMode::Searching => match code {
            KeyCode::Enter => app.handle_input(),
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Char(c) => {
                app.input_buffer.push(c);
                if app.input_mode == InputMode::Searching {
                    app.update_search();
                }
            }
            KeyCode::Backspace => {
                app.input_buffer.pop();
                if app.input_mode == InputMode::Searching {
                    app.update_search();
                }
            }
            _ => {}
        },
    }
    false
}
