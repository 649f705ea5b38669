use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use receipt_splitter::{list_receipts, load_receipt, parse_cost, Config, LedgerSummary, Purchase, Receipt};
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Open,
    Receipt,
    Tables,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Open => Page::Receipt,
            Page::Receipt => Page::Tables,
            Page::Tables => Page::Open,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Open => Page::Tables,
            Page::Receipt => Page::Open,
            Page::Tables => Page::Receipt,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Open => "Open",
            Page::Receipt => "Receipt",
            Page::Tables => "Tables",
        }
    }
}

/// Field being edited in a text prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Item,
    Cost,
    TaxRate,
}

impl Field {
    fn label(&self) -> &str {
        match self {
            Field::Item => "Item",
            Field::Cost => "Cost",
            Field::TaxRate => "Tax",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Editing {
    pub field: Field,
    pub buffer: String,
}

pub struct App {
    pub config: Config,
    pub receipts: Vec<PathBuf>,
    pub receipt: Option<Receipt>,
    pub current_page: Page,
    pub open_state: TableState,
    pub purchase_state: TableState,
    pub tables_scroll: u16,
    pub editing: Option<Editing>,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, receipts: Vec<PathBuf>) -> Self {
        let mut open_state = TableState::default();
        if !receipts.is_empty() {
            open_state.select(Some(0));
        }

        Self {
            config,
            receipts,
            receipt: None,
            current_page: Page::Open,
            open_state,
            purchase_state: TableState::default(),
            tables_scroll: 0,
            editing: None,
            status: None,
            should_quit: false,
        }
    }

    pub fn refresh_receipts(&mut self) {
        match list_receipts(&self.config.receipts_dir) {
            Ok(receipts) => {
                self.receipts = receipts;
                let selected = if self.receipts.is_empty() { None } else { Some(0) };
                self.open_state.select(selected);
            }
            Err(err) => self.status = Some(format!("{:#}", err)),
        }
    }

    /// Load the highlighted receipt into a fresh ledger
    pub fn open_selected(&mut self) {
        let Some(path) = self
            .open_state
            .selected()
            .and_then(|i| self.receipts.get(i))
            .cloned()
        else {
            return;
        };

        match load_receipt(&path, &self.config) {
            Ok(receipt) => {
                self.status = Some(format!(
                    "Opened {} ({} purchases)",
                    receipt.name,
                    receipt.ledger.len()
                ));
                let selected = if receipt.ledger.is_empty() { None } else { Some(0) };
                self.purchase_state.select(selected);
                self.receipt = Some(receipt);
                self.tables_scroll = 0;
                self.current_page = Page::Receipt;
            }
            Err(err) => {
                let message = format!("{:#}", err);
                warn!(path = %path.display(), error = %message, "failed to open receipt");
                self.status = Some(message);
            }
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn purchase_count(&self) -> usize {
        self.receipt.as_ref().map_or(0, |r| r.ledger.len())
    }

    pub fn selected_purchase(&self) -> Option<&Purchase> {
        let index = self.purchase_state.selected()?;
        self.receipt.as_ref()?.ledger.purchase(index)
    }

    fn selected_purchase_mut(&mut self) -> Option<&mut Purchase> {
        let index = self.purchase_state.selected()?;
        self.receipt.as_mut()?.ledger.purchase_mut(index)
    }

    pub fn next(&mut self) {
        match self.current_page {
            Page::Open => step(&mut self.open_state, self.receipts.len(), true),
            Page::Receipt => {
                let len = self.purchase_count();
                step(&mut self.purchase_state, len, true);
            }
            Page::Tables => self.tables_scroll = self.tables_scroll.saturating_add(1),
        }
    }

    pub fn previous(&mut self) {
        match self.current_page {
            Page::Open => step(&mut self.open_state, self.receipts.len(), false),
            Page::Receipt => {
                let len = self.purchase_count();
                step(&mut self.purchase_state, len, false);
            }
            Page::Tables => self.tables_scroll = self.tables_scroll.saturating_sub(1),
        }
    }

    // ========================================================================
    // PURCHASE EDITING
    // ========================================================================

    /// Toggle the n-th default actor (0-based) on the selected purchase
    pub fn toggle_actor(&mut self, n: usize) {
        let Some(actor) = self.config.default_actors.get(n).cloned() else {
            return;
        };
        let Some(index) = self.purchase_state.selected() else {
            return;
        };
        if let Some(division) = self
            .receipt
            .as_mut()
            .and_then(|r| r.ledger.division_at_mut(index))
        {
            division.toggle(&actor);
        }
    }

    pub fn toggle_taxed(&mut self) {
        if let Some(purchase) = self.selected_purchase_mut() {
            purchase.taxed = !purchase.taxed;
        }
    }

    pub fn increment_quantity(&mut self) {
        if let Some(purchase) = self.selected_purchase_mut() {
            purchase.increment_quantity();
        }
    }

    pub fn decrement_quantity(&mut self) {
        if let Some(purchase) = self.selected_purchase_mut() {
            purchase.decrement_quantity();
        }
    }

    /// Append a blank purchase and select it
    pub fn add_purchase(&mut self) {
        let Some(receipt) = self.receipt.as_mut() else {
            return;
        };
        receipt.ledger.add_purchase(Purchase::blank());
        self.purchase_state.select(Some(receipt.ledger.len() - 1));
    }

    pub fn remove_selected(&mut self) {
        let Some(index) = self.purchase_state.selected() else {
            return;
        };
        let Some(receipt) = self.receipt.as_mut() else {
            return;
        };
        if let Some(removed) = receipt.ledger.remove_purchase(index) {
            info!(item = %removed.item, receipt = %receipt.name, "purchase removed");
        }
        let len = receipt.ledger.len();
        self.purchase_state
            .select(if len == 0 { None } else { Some(index.min(len - 1)) });
    }

    pub fn apply_sales_tax(&mut self) {
        let rate = self.config.sales_tax;
        if let Some(receipt) = self.receipt.as_mut() {
            receipt.ledger.set_tax_rate(rate);
        }
    }

    // ========================================================================
    // TEXT PROMPTS
    // ========================================================================

    pub fn begin_edit(&mut self, field: Field) {
        let buffer = match field {
            Field::Item => match self.selected_purchase() {
                Some(p) => p.item.clone(),
                None => return,
            },
            Field::Cost => match self.selected_purchase() {
                Some(p) => format!("{:.2}", p.cost),
                None => return,
            },
            Field::TaxRate => match self.receipt.as_ref() {
                Some(r) => format!("{}", r.ledger.tax_rate()),
                None => return,
            },
        };
        self.editing = Some(Editing { field, buffer });
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Apply the prompt; unparsable numbers leave the value unchanged
    pub fn commit_edit(&mut self) {
        let Some(editing) = self.editing.take() else {
            return;
        };

        match editing.field {
            Field::Item => {
                if let Some(purchase) = self.selected_purchase_mut() {
                    purchase.item = editing.buffer.trim().to_string();
                }
            }
            Field::Cost => match parse_cost(&editing.buffer) {
                Ok(cost) => {
                    if let Some(purchase) = self.selected_purchase_mut() {
                        purchase.cost = cost;
                    }
                }
                Err(err) => self.status = Some(format!("{:#}", err)),
            },
            Field::TaxRate => match parse_rate(&editing.buffer) {
                Some(rate) => {
                    if let Some(receipt) = self.receipt.as_mut() {
                        receipt.ledger.set_tax_rate(rate);
                    }
                }
                None => self.status = Some(format!("Invalid tax rate: {:?}", editing.buffer)),
            },
        }
    }

    // ========================================================================
    // INPUT
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.editing.is_some() {
            match key.code {
                KeyCode::Enter => self.commit_edit(),
                KeyCode::Esc => self.cancel_edit(),
                KeyCode::Backspace => {
                    if let Some(editing) = self.editing.as_mut() {
                        editing.buffer.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(editing) = self.editing.as_mut() {
                        editing.buffer.push(c);
                    }
                }
                _ => {}
            }
            return;
        }

        let has_receipt = self.receipt.is_some();
        self.status = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
            }
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Enter if self.current_page == Page::Open => self.open_selected(),
            KeyCode::Char('r') if self.current_page == Page::Open => self.refresh_receipts(),
            _ if !has_receipt || self.current_page != Page::Receipt => {}
            KeyCode::Char(c @ '1'..='9') => self.toggle_actor(c as usize - '1' as usize),
            KeyCode::Char('t') => self.toggle_taxed(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.increment_quantity(),
            KeyCode::Char('-') => self.decrement_quantity(),
            KeyCode::Char('e') => self.begin_edit(Field::Item),
            KeyCode::Char('c') => self.begin_edit(Field::Cost),
            KeyCode::Char('r') => self.begin_edit(Field::TaxRate),
            KeyCode::Char('s') => self.apply_sales_tax(),
            KeyCode::Char('a') => self.add_purchase(),
            KeyCode::Char('x') | KeyCode::Delete => self.remove_selected(),
            _ => {}
        }
    }
}

/// Move a table selection with wrap-around
fn step(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    state.select(Some(i));
}

/// Tax rate as a fraction; "8.25%" is accepted too
fn parse_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let rate = match raw.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
        None => raw.parse::<f64>().ok()?,
    };
    (rate.is_finite() && rate >= 0.0).then_some(rate)
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            app.handle_key(key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Open => render_open(f, chunks[1], app),
        Page::Receipt if app.receipt.is_some() => render_receipt(f, chunks[1], app),
        Page::Tables if app.receipt.is_some() => render_tables(f, chunks[1], app),
        _ => render_placeholder(f, chunks[1]),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Open, Page::Receipt, Page::Tables];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    if let Some(receipt) = &app.receipt {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            receipt.name.as_str(),
            Style::default().fg(Color::White),
        ));
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("Tax: {:.4}", receipt.ledger.tax_rate()),
            Style::default().fg(Color::Cyan),
        ));
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("% paid: {}%", receipt.ledger.percent_paid() as u32),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)).title(" Ledger "));

    f.render_widget(header, area);
}

fn render_placeholder(f: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Please open a .csv receipt",
            Style::default().fg(Color::Yellow),
        )),
    ])
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(paragraph, area);
}

fn header_row<'a>(titles: impl IntoIterator<Item = String>) -> Row<'a> {
    let cells = titles.into_iter().map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_open(f: &mut Frame, area: Rect, app: &mut App) {
    let title = format!(" Receipts in {} ", app.config.receipts_dir.display());

    if app.receipts.is_empty() {
        let empty = Paragraph::new(format!(
            "  No .csv receipts found in {}",
            app.config.receipts_dir.display()
        ))
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(empty, area);
        return;
    }

    let rows = app.receipts.iter().map(|path| {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?")
            .to_string();
        let is_open = app.receipt.as_ref().map_or(false, |r| &r.path == path);
        let style = if is_open {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        Row::new(vec![Cell::from(name).style(style)]).height(1)
    });

    let table = Table::new(rows, [Constraint::Min(20)])
        .header(header_row(["File".to_string()]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.open_state);
}

fn render_receipt(f: &mut Frame, area: Rect, app: &mut App) {
    let App {
        config,
        receipt,
        purchase_state,
        ..
    } = app;
    let Some(receipt) = receipt.as_ref() else {
        return;
    };
    let ledger = &receipt.ledger;

    let mut titles = vec![
        "Item".to_string(),
        "Cost".to_string(),
        "Qty".to_string(),
        "Taxed".to_string(),
    ];
    titles.extend(
        config
            .default_actors
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{} {}", i + 1, a)),
    );

    let rows = ledger.purchases().iter().enumerate().map(|(i, p)| {
        let mut cells = vec![
            Cell::from(truncate(&p.item, 30)),
            Cell::from(format!("${:.2}", p.cost)),
            Cell::from(format!("{}", p.quantity)),
            Cell::from(checkbox(p.taxed)),
        ];

        for actor in &config.default_actors {
            let subscribed = ledger
                .division_at(i)
                .map_or(false, |d| d.is_subscribed(actor));
            let style = if subscribed {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            cells.push(Cell::from(checkbox(subscribed)).style(style));
        }

        let style = if ledger.division_at(i).map_or(true, |d| d.is_empty()) {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };

        Row::new(cells).style(style).height(1)
    });

    let mut widths = vec![
        Constraint::Length(32),
        Constraint::Length(10),
        Constraint::Length(5),
        Constraint::Length(6),
    ];
    widths.extend(
        config
            .default_actors
            .iter()
            .map(|a| Constraint::Length(a.len().max(3) as u16 + 3)),
    );

    let table = Table::new(rows, widths)
        .header(header_row(titles))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Purchases "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, purchase_state);
}

fn render_tables(f: &mut Frame, area: Rect, app: &App) {
    let Some(receipt) = app.receipt.as_ref() else {
        return;
    };
    let summary = LedgerSummary::build(&receipt.ledger, &app.config.default_actors);

    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let column = Style::default().fg(Color::Yellow);

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled("  Receipt", heading)),
        Line::from(Span::styled(
            format!("  {:<30} {:>10} {:>8}", "Item", "Cost", "Quantity"),
            column,
        )),
    ];
    for p in receipt.ledger.purchases() {
        content.push(Line::from(format!(
            "  {:<30} {:>10} {:>8}",
            truncate(&p.item, 30),
            format!("${:.2}", p.cost),
            p.quantity
        )));
    }
    content.extend(totals_lines(summary.untaxed_total, summary.tax, summary.total));

    for actor in &summary.actors {
        content.push(Line::from("  ─────────────────────────────────────────────────────────"));
        content.push(Line::from(Span::styled(format!("  {}", actor.actor), heading)));
        content.push(Line::from(Span::styled(
            format!(
                "  {:<30} {:>10} {:>8} {:>10}",
                "Item", "Cost", "Quantity", "Partial"
            ),
            column,
        )));
        for line in &actor.lines {
            content.push(Line::from(format!(
                "  {:<30} {:>10} {:>8} {:>10}",
                truncate(&line.item, 30),
                format!("${:.2}", line.cost),
                line.quantity,
                format!("${:.2}", line.partial)
            )));
        }
        content.extend(totals_lines(actor.untaxed_total, actor.tax, actor.total));
    }

    content.push(Line::from("  ─────────────────────────────────────────────────────────"));
    if summary.unassigned_total > 0.0 {
        content.push(Line::from(Span::styled(
            format!("  Unassigned: ${:.2}", summary.unassigned_total),
            Style::default().fg(Color::Red),
        )));
    }
    content.push(Line::from(Span::styled(
        format!("  % paid: {}%", summary.percent_paid as u32),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )));

    let paragraph = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Tables "),
        )
        .scroll((app.tables_scroll, 0));

    f.render_widget(paragraph, area);
}

fn totals_lines(untaxed: f64, tax: f64, total: f64) -> Vec<Line<'static>> {
    vec![
        Line::from(format!("  Untaxed total: ${:.2}", untaxed)),
        Line::from(format!("  Tax: ${:.2}", tax)),
        Line::from(Span::styled(
            format!("  Total: ${:.2}", total),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ]
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);

    let status_spans = if let Some(editing) = &app.editing {
        vec![
            Span::styled(
                format!(" {}: ", editing.field.label()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(format!("{}_", editing.buffer)),
            Span::raw("  | "),
            Span::styled("Enter", key),
            Span::raw(" Save | "),
            Span::styled("Esc", key),
            Span::raw(" Cancel"),
        ]
    } else if let Some(message) = &app.status {
        vec![Span::styled(
            format!(" {}", message),
            Style::default().fg(Color::Magenta),
        )]
    } else {
        let mut spans = vec![];
        match app.current_page {
            Page::Open => {
                spans.push(Span::styled(" Enter", key));
                spans.push(Span::raw(" Open | "));
                spans.push(Span::styled("r", key));
                spans.push(Span::raw(" Refresh | "));
            }
            Page::Receipt => {
                spans.push(Span::styled(" 1-9", key));
                spans.push(Span::raw(" Split | "));
                spans.push(Span::styled("t", key));
                spans.push(Span::raw(" Taxed | "));
                spans.push(Span::styled("+/-", key));
                spans.push(Span::raw(" Qty | "));
                spans.push(Span::styled("e/c", key));
                spans.push(Span::raw(" Item/Cost | "));
                spans.push(Span::styled("r/s", key));
                spans.push(Span::raw(" Tax/Sales tax | "));
                spans.push(Span::styled("a/x", key));
                spans.push(Span::raw(" Add/Remove | "));
            }
            Page::Tables => {
                spans.push(Span::styled(" ↑/↓", key));
                spans.push(Span::raw(" Scroll | "));
            }
        }
        spans.push(Span::styled("Tab", key));
        spans.push(Span::raw(" Page | "));
        spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        spans.push(Span::raw(" Quit"));
        spans
    };

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
