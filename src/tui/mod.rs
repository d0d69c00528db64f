//! Ratatui-based terminal UI.
//!
//! The TUI is a single prediction form: street and block are picked from the
//! reference dataset, the numeric fields and storey range are typed in, and
//! the result panel shows the predicted price or the error plus a retry
//! prompt. All computation goes through `app::pipeline::Services`.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::pipeline::{PredictionOutput, Services};
use crate::domain::PredictionRequest;
use crate::error::AppError;
use crate::report::{format_currency, format_failure};

mod form;

use form::{Field, Form};

/// Start the TUI.
pub fn run(services: Services) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(services);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

enum Outcome {
    Idle,
    Success(Box<PredictionOutput>),
    Failure(AppError),
}

struct App {
    services: Services,
    form: Form,
    status: String,
    outcome: Outcome,
}

impl App {
    fn new(services: Services) -> Self {
        let addresses = services.store.list_unique_addresses().into_iter().collect();
        let blocks = services.store.list_unique_blocks().into_iter().collect();
        let form = Form::new(addresses, blocks, services.settings.lease_baseline_year);

        let status = match &services.predictor {
            Ok(_) => "Fill in the form and press p to predict.".to_string(),
            Err(err) => format!("Model unavailable: {err}"),
        };

        Self {
            services,
            form,
            status,
            outcome: Outcome::Idle,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.form.is_editing() {
            self.handle_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.form.select_prev(),
            KeyCode::Down => self.form.select_next(),
            KeyCode::Left => self.form.adjust(-1),
            KeyCode::Right => self.form.adjust(1),
            KeyCode::PageUp => self.form.adjust(-10),
            KeyCode::PageDown => self.form.adjust(10),
            KeyCode::Enter => {
                if self.form.selected() == Field::Submit {
                    self.submit();
                } else if self.form.begin_edit() {
                    self.status = format!("Editing {}. Enter to apply, Esc to cancel.", self.form.selected().label());
                }
            }
            KeyCode::Char('p') => self.submit(),
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }
        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.form.cancel_edit();
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.form.commit_edit();
                self.status = format!("{} updated.", self.form.selected().label());
            }
            KeyCode::Backspace => self.form.pop_char(),
            KeyCode::Char(c) => self.form.push_char(c),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let request: PredictionRequest = match self.form.to_request() {
            Ok(req) => req,
            Err(err) => {
                self.status = "Invalid form values.".to_string();
                self.outcome = Outcome::Failure(err);
                return;
            }
        };

        self.outcome = match self.services.predict(&request) {
            Ok(output) => {
                self.status = format!("Predicted {}.", request.query_address());
                Outcome::Success(Box::new(output))
            }
            Err(err) => {
                self.status = format!("Prediction failed ({}).", err.kind().label());
                Outcome::Failure(err)
            }
        };
    }

    fn write_debug(&mut self) {
        let Outcome::Success(output) = &self.outcome else {
            self.status = "No successful prediction to write.".to_string();
            return;
        };
        match crate::debug::write_debug_bundle(output, &self.services.settings) {
            Ok(path) => self.status = format!("Wrote debug bundle: {}", path.display()),
            Err(err) => self.status = format!("Debug write failed: {err}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let store = &self.services.store;
        let model = match &self.services.predictor {
            Ok(_) => Span::styled("model: loaded", Style::default().fg(Color::Green)),
            Err(_) => Span::styled("model: unavailable", Style::default().fg(Color::Red)),
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("resale", Style::default().fg(Color::Cyan)),
                Span::raw(": resale flat price prediction"),
            ]),
            Line::from(vec![
                Span::styled(
                    format!(
                        "locations: {} | stations: {} | lease baseline: {} | ",
                        store.records().len(),
                        store.all_transit_station_coordinates().len(),
                        self.services.settings.lease_baseline_year,
                    ),
                    Style::default().fg(Color::Gray),
                ),
                model,
            ]),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        self.draw_form(frame, chunks[0]);
        self.draw_result(frame, chunks[1]);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = Field::ALL
            .iter()
            .map(|&field| {
                let value = self.form.display_value(field);
                let line = if field == Field::Submit {
                    Line::from(Span::styled(
                        "[ PREDICT RESALE PRICE ]",
                        Style::default().add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(vec![
                        Span::styled(format!("{:<18}", field.label()), Style::default().fg(Color::Gray)),
                        Span::raw(value),
                    ])
                };
                ListItem::new(line)
            })
            .collect();

        let title = if self.form.is_editing() { "Form (editing)" } else { "Form" };
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.form.selected_index()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Result").borders(Borders::ALL);

        let text = match &self.outcome {
            Outcome::Idle => Text::from(Span::styled(
                "No prediction yet.",
                Style::default().fg(Color::Yellow),
            )),
            Outcome::Success(output) => {
                let d = &output.derivation;
                let f = d.features;
                Text::from(vec![
                    Line::from(Span::styled(
                        format!("Predicted resale price: {}", format_currency(output.price)),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from(format!("address: {}", d.query_address)),
                    Line::from(format!("postal: {}", d.matched_postal.as_deref().unwrap_or("-"))),
                    Line::from(format!("origin: ({:.5}, {:.5})", d.origin.latitude, d.origin.longitude)),
                    Line::from(format!("cbd distance: {:.0} m", f.cbd_distance_m)),
                    Line::from(format!("nearest mrt: {:.0} m", f.nearest_transit_distance_m)),
                    Line::from(format!("lease remaining: {} years", d.lease_remaining_years)),
                    Line::from(format!("storey median: {}", d.storey_median)),
                    Line::from(format!("log-price: {:.4}", output.log_price)),
                ])
            }
            Outcome::Failure(err) => Text::from(
                format_failure(err)
                    .lines()
                    .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Red))))
                    .collect::<Vec<_>>(),
            ),
        };

        let p = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter edit  p predict  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}
