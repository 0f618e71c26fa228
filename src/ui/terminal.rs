use {
    crate::{access::Signer, dashboard::Dashboard},
    crossterm::event::{Event as TermEvent, KeyCode, KeyEventKind},
    ratatui::{backend::CrosstermBackend, Terminal},
    std::time::Duration,
};

const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Run the TUI event loop until the user quits
///
/// Keys: `u` unlock, `s` start streaming, `d` disconnect, `c` clear,
/// `e` export, `q`/Esc quit.
pub async fn run_ui(
    dashboard: &mut Dashboard,
    signer: Option<&dyn Signer>,
    filter: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    crossterm::terminal::enable_raw_mode()?;

    // Alternate screen keeps stderr logs off the dashboard
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, dashboard, signer, filter.as_deref()).await;

    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    crossterm::terminal::disable_raw_mode()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    dashboard: &mut Dashboard,
    signer: Option<&dyn Signer>,
    filter: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut message: Option<String> = None;

    loop {
        let snapshot = dashboard.snapshot().await;
        let status = dashboard.connection_status();
        let unlocked = dashboard.is_unlocked();
        let area = terminal.size()?;
        terminal.draw(|f| {
            let view = super::layout::View {
                identity: dashboard.identity(),
                endpoint: dashboard.endpoint(),
                unlocked,
                snapshot: &snapshot,
                status: &status,
                message: message.as_deref(),
            };
            super::layout::render_layout(f, area, &view);
        })?;

        if !crossterm::event::poll(REFRESH_INTERVAL)? {
            continue;
        }
        let TermEvent::Key(key) = crossterm::event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('u') => {
                message = match signer {
                    Some(signer) => match dashboard.unlock(signer).await {
                        Ok(()) => Some("Access unlocked".to_string()),
                        Err(e) => Some(e.to_string()),
                    },
                    None => Some("No signer configured (set LIGHTOMBO_SIGNER_CMD)".to_string()),
                };
            }
            KeyCode::Char('s') => {
                message = dashboard.start_streaming(filter).err().map(|e| e.to_string());
            }
            KeyCode::Char('d') => {
                dashboard.stop_streaming();
                message = None;
            }
            KeyCode::Char('c') => {
                message = dashboard.clear().await.err().map(|e| e.to_string());
            }
            KeyCode::Char('e') => {
                message = Some(match dashboard.export().await {
                    Ok(Some(path)) => format!("Exported to {}", path.display()),
                    Ok(None) => "Nothing to export".to_string(),
                    Err(e) => e.to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(())
}
