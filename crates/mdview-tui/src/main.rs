//! mdview: a terminal markdown viewer with a live directory tree.
//!
//! This binary initialises the terminal, runs the main event loop,
//! and restores the terminal on exit or panic.

mod app;
mod input;
mod render;
mod ui;

use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as TermEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mdview_core::config::settings::LogConfig;
use mdview_core::{
    ClickDispatcher, Command, Config, CoreError, DirWatcher, Entry, Event, Keymap, LocalFs,
    Session, SystemClock, TreeRow, UiAction, WatchMessage,
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use crate::app::{App, AppMode};
use crate::input::{handle_key, InputAction, InputState};
use crate::render::{layout, render, Areas, View};
use crate::ui::tree::{hit_test, Hit};

/// Longest the loop sleeps waiting for input.
const TICK: Duration = Duration::from_millis(100);

/// Mouse button state between press and release.
#[derive(Debug, Default)]
struct Pointer {
    pressed: Option<Entry>,
    dragging: bool,
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before printing the panic.
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Returns the config directory: `./config` when present, else `~/.config/mdview`.
fn config_dir() -> PathBuf {
    let local = PathBuf::from("config");
    if local.exists() {
        return local;
    }
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
        .join(".config")
        .join("mdview")
}

/// Logs to a file so the terminal is left alone.
fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let level = log.level.parse().unwrap_or(tracing::Level::DEBUG);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log.file)
        .with_context(|| format!("cannot open log file {}", log.file.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

fn load_keymap(dir: &Path) -> Keymap {
    let defaults = Keymap::default();
    match defaults.with_overrides(&dir.join("keymap.toml")) {
        Ok(keymap) => keymap,
        Err(CoreError::NotFound(_)) => defaults,
        Err(e) => {
            tracing::warn!("ignoring keymap.toml: {e}");
            defaults
        }
    }
}

/// Starts live refresh of `root`. Failing to watch is not fatal.
fn start_watcher(
    config: &Config,
    root: &Path,
    tx: std_mpsc::Sender<WatchMessage>,
) -> Option<DirWatcher> {
    if !config.watch.enabled {
        return None;
    }
    let mut watcher = match DirWatcher::new(tx, config.watch.debounce()) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!("live refresh disabled: {e}");
            return None;
        }
    };
    if let Err(e) = watcher.watch(root) {
        tracing::warn!("live refresh disabled: {e}");
        return None;
    }
    Some(watcher)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let start = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => std::env::current_dir()?,
    };
    let root = tokio::fs::canonicalize(&start)
        .await
        .with_context(|| format!("cannot open {}", start.display()))?;

    let cfg_dir = config_dir();
    let (config, config_error) = match Config::load(&cfg_dir.join("default.toml")) {
        Ok(config) => (config, None),
        Err(CoreError::NotFound(_)) => (Config::default(), None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_tracing(&config.log)?;
    if let Some(e) = config_error {
        tracing::warn!("ignoring default.toml: {e}");
    }
    let keymap = load_keymap(&cfg_dir);

    let session = Session::open(Arc::new(LocalFs::new()), root)
        .await
        .with_context(|| format!("cannot list {}", start.display()))?;
    let app = App::new(config, keymap);

    install_panic_hook();
    let mut terminal = setup_terminal()?;

    let result = run_app(&mut terminal, session, app).await;

    restore_terminal(&mut terminal)?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut session: Session<LocalFs>,
    mut app: App,
) -> anyhow::Result<()> {
    let (watch_tx, watch_rx) = std_mpsc::channel::<WatchMessage>();
    let _watcher = start_watcher(app.config(), session.root(), watch_tx);

    let mut click = ClickDispatcher::with_delay(app.config().explorer.double_click());
    let mut input_state = InputState::new();
    let mut pointer = Pointer::default();

    loop {
        while let Ok(msg) = watch_rx.try_recv() {
            app = match msg {
                WatchMessage::Changed(paths) => {
                    run_commands(&mut session, app, vec![Command::ExternalChange(paths)]).await
                }
                WatchMessage::Error(e) => {
                    tracing::warn!("watch error: {e}");
                    app.with_status(format!("watch error: {e}"))
                }
            };
        }

        if let Some(action) = click.tick() {
            app = run_ui_actions(&mut session, app, vec![action]).await;
        }

        let rows = session.rows(app.filter());
        app = app.settle(&rows);

        let mut screen = Rect::default();
        {
            let view = View {
                root: session.root(),
                current_dir: session.current_dir(),
                rows: &rows,
                history: session.history(),
                drag: session.drag(),
                open_file: session.open_file(),
            };
            terminal.draw(|f| {
                screen = f.area();
                render(f, &app, &view);
            })?;
        }
        let areas = layout(screen, app.show_preview());

        if app.should_quit() {
            break;
        }

        let timeout = click.time_until_deadline().map_or(TICK, |due| due.min(TICK));
        if !event::poll(timeout)? {
            continue;
        }

        match event::read()? {
            TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                let (action, new_state) = handle_key(key, app.mode(), &input_state, app.keymap());
                input_state = new_state;
                app = handle_input(&mut session, app, action, &rows).await;
            }
            TermEvent::Mouse(mouse) => {
                app = handle_mouse(
                    &mut session,
                    &mut click,
                    &mut pointer,
                    app,
                    mouse,
                    &rows,
                    &areas,
                )
                .await;
            }
            _ => {}
        }
    }

    Ok(())
}

async fn handle_input(
    session: &mut Session<LocalFs>,
    app: App,
    action: InputAction,
    rows: &[TreeRow],
) -> App {
    match action {
        InputAction::Run(action) => {
            let (app, commands) = app.run(action, rows, session.current_dir());
            run_commands(session, app, commands).await
        }
        InputAction::EnterMode(mode) => app.with_mode(mode),
        InputAction::InputChar(c) => app.input_char(c),
        InputAction::InputBackspace => app.input_backspace(),
        InputAction::InputConfirm => {
            let (app, commands) = app.confirm_input(rows, session.current_dir());
            run_commands(session, app, commands).await
        }
        InputAction::ConfirmApproved => {
            let (app, commands) = app.confirm_approved();
            run_commands(session, app, commands).await
        }
        InputAction::MenuDown => app.context_menu_move(true),
        InputAction::MenuUp => app.context_menu_move(false),
        InputAction::MenuConfirm => {
            let (app, commands) = app.context_menu_confirm(rows, session.current_dir());
            run_commands(session, app, commands).await
        }
        InputAction::Quit => app.with_quit(),
        InputAction::None => app,
    }
}

async fn handle_mouse(
    session: &mut Session<LocalFs>,
    click: &mut ClickDispatcher<SystemClock>,
    pointer: &mut Pointer,
    app: App,
    mouse: MouseEvent,
    rows: &[TreeRow],
    areas: &Areas,
) -> App {
    // Popups take the keyboard; a click outside a context menu closes it.
    if *app.mode() != AppMode::Normal {
        let closes_menu = matches!(app.mode(), AppMode::ContextMenu { .. })
            && matches!(mouse.kind, MouseEventKind::Down(_));
        return if closes_menu {
            app.with_mode(AppMode::Normal)
        } else {
            app
        };
    }

    let hit = hit_test(areas.tree, app.selected(), rows.len(), mouse.column, mouse.row);
    let in_preview = areas.preview.is_some_and(|area| {
        mouse.column >= area.x
            && mouse.column < area.x + area.width
            && mouse.row >= area.y
            && mouse.row < area.y + area.height
    });

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => match hit {
            Some(Hit::Row(index)) => {
                let entry = rows[index].entry.clone();
                pointer.pressed = Some(entry.clone());
                pointer.dragging = false;
                let actions = click.click(&entry);
                run_ui_actions(session, app.with_selected(index), actions).await
            }
            _ => app,
        },
        MouseEventKind::Drag(MouseButton::Left) => {
            let Some(source) = pointer.pressed.clone() else {
                return app;
            };
            if !pointer.dragging {
                pointer.dragging = true;
                click.cancel();
                session.drag_start(source);
            }
            match hit {
                Some(Hit::Row(index)) => {
                    session.drag_hover(&rows[index].entry);
                }
                Some(Hit::Background) => {
                    session.drag_hover_background();
                }
                None => {
                    if let Some(target) = session.drag().drop_target().map(Path::to_path_buf) {
                        session.drag_leave(&target);
                    }
                }
            }
            app
        }
        MouseEventKind::Up(MouseButton::Left) => {
            pointer.pressed = None;
            if !std::mem::take(&mut pointer.dragging) {
                return app;
            }
            match session.drag_drop().await {
                Ok(events) => {
                    let follow_up = events.iter().find_map(|event| match event {
                        Event::EntryMoved { to, .. } => to.parent().map(Path::to_path_buf),
                        _ => None,
                    });
                    let app = app.apply_events(&events);
                    match follow_up {
                        Some(dir) => run_commands(session, app, vec![Command::Expand(dir)]).await,
                        None => app,
                    }
                }
                Err(e) => app.with_status(format!("move failed: {e}")),
            }
        }
        MouseEventKind::Down(MouseButton::Right) => match hit {
            Some(Hit::Row(index)) => {
                let entry = rows[index].entry.clone();
                let actions = click.context_menu(&entry, mouse.column, mouse.row);
                run_ui_actions(session, app.with_selected(index), actions).await
            }
            _ => app,
        },
        MouseEventKind::ScrollDown if in_preview => app.with_preview_scroll(true),
        MouseEventKind::ScrollUp if in_preview => app.with_preview_scroll(false),
        MouseEventKind::ScrollDown if hit.is_some() => app.with_cursor_down(rows.len()),
        MouseEventKind::ScrollUp if hit.is_some() => app.with_cursor_up(),
        _ => app,
    }
}

/// Carries resolved pointer gestures out against the session.
async fn run_ui_actions(
    session: &mut Session<LocalFs>,
    mut app: App,
    actions: Vec<UiAction>,
) -> App {
    for action in actions {
        app = match action {
            UiAction::ContextMenu { x, y, .. } => app.open_context_menu(x, y),
            other => match Command::from_ui(&other) {
                Some(command) => run_commands(session, app, vec![command]).await,
                None => app,
            },
        };
    }
    app
}

/// Dispatches `commands` in order, stopping after the first failure.
async fn run_commands(session: &mut Session<LocalFs>, mut app: App, commands: Vec<Command>) -> App {
    for command in commands {
        let events = session.dispatch(command).await;
        let failed = events
            .iter()
            .any(|event| matches!(event, Event::OperationFailed { .. }));
        app = app.apply_events(&events);
        if failed {
            break;
        }
    }
    app
}
