use {
    super::renderer::{format_move, short_type_name, shorten_address},
    crate::{
        event::{Category, Event},
        state::DashboardSnapshot,
        stream::{ConnectionState, ConnectionStatus},
    },
    ratatui::{
        layout::{Constraint, Direction, Layout as RatLayout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Paragraph, Row, Table},
        Frame,
    },
};

/// Everything one frame needs, captured before drawing
pub struct View<'a> {
    pub identity: &'a str,
    pub endpoint: &'a str,
    pub unlocked: bool,
    pub snapshot: &'a DashboardSnapshot,
    pub status: &'a ConnectionStatus,
    pub message: Option<&'a str>,
}

/// Render the main UI layout
pub fn render_layout(f: &mut Frame, area: Rect, view: &View) {
    let chunks = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Length(4), // Metric cards
            Constraint::Min(0),    // Events table
            Constraint::Length(4), // Footer/Status
        ])
        .split(area);

    render_header(f, chunks[0], view);
    render_metrics(f, chunks[1], view.snapshot);
    if view.unlocked {
        render_events_table(f, chunks[2], view);
    } else {
        render_locked(f, chunks[2]);
    }
    render_footer(f, chunks[3], view);
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Swap => Color::Magenta,
        Category::Transfer => Color::Green,
        Category::Mint => Color::Blue,
        Category::Burn => Color::Red,
        Category::Other => Color::Gray,
    }
}

fn category_icon(category: Category) -> &'static str {
    match category {
        Category::Swap => "↔",
        Category::Transfer => "→",
        Category::Mint => "+",
        Category::Burn => "−",
        Category::Other => "•",
    }
}

fn state_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Disconnected => Color::Gray,
    }
}

fn render_header(f: &mut Frame, area: Rect, view: &View) {
    let status = view.status;
    let mut status_line = vec![
        Span::styled("● ", Style::default().fg(state_color(status.state))),
        Span::raw(status.state.as_str()),
    ];
    if let Some(filter) = &status.filter {
        status_line.push(Span::raw(format!(" | contract {}", shorten_address(Some(filter)))));
    }
    if let Some(started) = status.session_start {
        status_line.push(Span::raw(format!(
            " | session started {}",
            started.with_timezone(&chrono::Local).format("%H:%M:%S")
        )));
    }

    let text = vec![
        Line::from(vec![
            Span::styled("Lightombo", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" - Event Stream Dashboard  "),
            Span::styled(
                format!("as {}", shorten_address(Some(view.identity))),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(status_line),
    ];

    let header = Block::default()
        .borders(Borders::ALL)
        .title(format!("Feed: {}", view.endpoint));
    f.render_widget(Paragraph::new(text).block(header), area);
}

fn render_metrics(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let m = &snapshot.metrics;

    let mut cards = vec![Span::styled(
        format!("Total {}  ", m.total),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for category in [Category::Swap, Category::Transfer, Category::Mint, Category::Burn] {
        cards.push(Span::styled(
            format!("{}s {} ({:.1}%)  ", capitalize(category.as_str()), m.count(category), m.share(category)),
            Style::default().fg(category_color(category)),
        ));
    }
    cards.push(Span::styled(
        format!("Unique Accounts {}", m.unique_participants),
        Style::default().fg(Color::Yellow),
    ));

    let volume = Line::from(vec![
        Span::raw("Total Volume: "),
        Span::styled(
            format!("{} MOVE", format_move(Some(m.total_volume), 2)),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ]);

    let block = Block::default().borders(Borders::ALL).title("Metrics");
    f.render_widget(Paragraph::new(vec![Line::from(cards), volume]).block(block), area);
}

fn describe(event: &Event) -> String {
    let data = &event.data;
    match event.category {
        Category::Swap => {
            let mut text = format!(
                "{} → {}",
                format_move(data.amount_in, 4),
                format_move(data.amount_out, 4)
            );
            if let Some(token) = &data.token_in {
                text.push_str(&format!(" {}", short_type_name(token)));
            }
            text.push_str(&format!(" by {}", shorten_address(data.account.as_deref())));
            text
        }
        Category::Transfer => format!(
            "{} {} → {}",
            format_move(data.amount, 4),
            shorten_address(data.from.as_deref()),
            shorten_address(data.to.as_deref())
        ),
        Category::Mint | Category::Burn => format!(
            "{} {}",
            format_move(data.amount, 4),
            shorten_address(data.account.as_deref())
        ),
        Category::Other => data
            .activity_type
            .as_deref()
            .map(short_type_name)
            .unwrap_or(event.kind.as_str())
            .to_string(),
    }
}

fn render_events_table(f: &mut Frame, area: Rect, view: &View) {
    let snapshot = view.snapshot;
    let title = format!("Live Events ({} / {} events)", snapshot.events.len(), snapshot.capacity);

    if snapshot.events.is_empty() {
        let hint = if view.status.state == ConnectionState::Connected {
            "Waiting for events..."
        } else {
            "Press 's' to start receiving events"
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        f.render_widget(Paragraph::new(hint).block(block), area);
        return;
    }

    let header = Row::new(vec!["", "Type", "Version", "Details", "Tx"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = snapshot
        .events
        .iter()
        .map(|event| {
            Row::new(vec![
                category_icon(event.category).to_string(),
                event.kind.clone(),
                format!("v{}", event.sequence),
                describe(event),
                event
                    .data
                    .hash
                    .as_deref()
                    .map(|h| shorten_address(Some(h)))
                    .unwrap_or_default(),
            ])
            .style(Style::default().fg(category_color(event.category)))
        })
        .collect();

    let widths = [
        Constraint::Length(2),  // Icon
        Constraint::Length(18), // Type
        Constraint::Length(12), // Version
        Constraint::Min(30),    // Details
        Constraint::Length(14), // Tx
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn render_locked(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "Unlock Event Streaming",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from("Sign a message to verify your wallet and access real-time"),
        Line::from("transaction event streaming for any contract address."),
        Line::from(""),
        Line::from("Press 'u' to sign."),
    ];
    let block = Block::default().borders(Borders::ALL).title("Locked");
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_footer(f: &mut Frame, area: Rect, view: &View) {
    let keys = if view.unlocked {
        "s start | d disconnect | c clear | e export | q quit"
    } else {
        "u sign to unlock | q quit"
    };

    let message = view
        .message
        .map(str::to_string)
        .or_else(|| view.status.error.as_ref().map(|e| e.to_string()));

    let mut text = vec![Line::from(Span::styled(keys, Style::default().fg(Color::Cyan)))];
    if let Some(message) = message {
        text.push(Line::from(Span::styled(message, Style::default().fg(Color::Red))));
    }

    let footer = Block::default().borders(Borders::ALL).title("Status");
    f.render_widget(Paragraph::new(text).block(footer), area);
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
