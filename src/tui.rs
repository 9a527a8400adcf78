use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::config::AppPaths;
use crate::errors::CatalogError;
use crate::storage::MovieStore;
use crate::storage::models::{Movie, MovieFilter, SortKey};
use crate::storage::sqlite::SqliteStorage;
use crate::transfer;

#[derive(PartialEq)]
enum Mode {
    Normal,
    Search,
    ConfirmDelete(i64),
}

struct App {
    movies: Vec<Movie>,
    list_state: ListState,
    mode: Mode,
    search_query: String,
    sort: Option<SortKey>,
    status: String,
    status_time: Option<Instant>,
    detail_scroll: u16,
    should_quit: bool,
}

impl App {
    fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            movies: Vec::new(),
            list_state,
            mode: Mode::Normal,
            search_query: String::new(),
            sort: Some(SortKey::CreatedDesc),
            status: String::new(),
            status_time: None,
            detail_scroll: 0,
            should_quit: false,
        }
    }

    fn set_status(&mut self, msg: String) {
        self.status = msg;
        self.status_time = Some(Instant::now());
    }

    fn selected_movie_id(&self) -> Option<i64> {
        self.list_state
            .selected()
            .and_then(|i| self.movies.get(i))
            .map(|m| m.id)
    }

    fn select_next(&mut self) {
        if self.movies.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.movies.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.detail_scroll = 0;
    }

    fn select_prev(&mut self) {
        if self.movies.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.detail_scroll = 0;
    }

    fn select_by(&mut self, delta: isize) {
        if self.movies.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let new = (current + delta).clamp(0, self.movies.len() as isize - 1) as usize;
        self.list_state.select(Some(new));
        self.detail_scroll = 0;
    }

    fn select_first(&mut self) {
        if !self.movies.is_empty() {
            self.list_state.select(Some(0));
            self.detail_scroll = 0;
        }
    }

    fn select_last(&mut self) {
        if !self.movies.is_empty() {
            self.list_state.select(Some(self.movies.len() - 1));
            self.detail_scroll = 0;
        }
    }

    /// Rebuilds the grid from a fresh store query; displayed state is never
    /// patched in place.
    fn refresh(&mut self, storage: &SqliteStorage) {
        let filter = MovieFilter {
            search: if self.search_query.is_empty() {
                None
            } else {
                Some(self.search_query.clone())
            },
            sort: self.sort,
            ..Default::default()
        };

        match storage.query(&filter) {
            Ok(movies) => self.movies = movies,
            Err(e) => self.set_status(format!("Error: {e}")),
        }

        // Clamp selection
        if self.movies.is_empty() {
            self.list_state.select(None);
        } else if let Some(i) = self.list_state.selected() {
            if i >= self.movies.len() {
                self.list_state.select(Some(self.movies.len() - 1));
            }
        } else {
            self.list_state.select(Some(0));
        }
    }

    fn cycle_sort(&mut self, storage: &SqliteStorage) {
        self.sort = match self.sort {
            Some(SortKey::CreatedDesc) => Some(SortKey::CreatedAsc),
            Some(SortKey::CreatedAsc) => Some(SortKey::TitleAsc),
            Some(SortKey::TitleAsc) => Some(SortKey::TitleDesc),
            Some(SortKey::TitleDesc) => Some(SortKey::YearAsc),
            Some(SortKey::YearAsc) => Some(SortKey::YearDesc),
            Some(SortKey::YearDesc) | None => Some(SortKey::CreatedDesc),
        };
        let name = self.sort.map(|s| s.as_str()).unwrap_or("none");
        self.set_status(format!("Sort: {name}"));
        self.refresh(storage);
    }

    fn request_delete(&mut self) {
        let Some(id) = self.selected_movie_id() else {
            return;
        };
        self.mode = Mode::ConfirmDelete(id);
        self.set_status(format!("Delete #{id}? [y/n]"));
    }

    fn confirm_delete(&mut self, storage: &SqliteStorage, id: i64) {
        match storage.remove(id) {
            Ok(true) => {
                self.set_status(format!("Deleted #{id}"));
                self.refresh(storage);
            }
            Ok(false) => self.set_status(format!("#{id} not found")),
            Err(e) => self.set_status(format!("Delete error: {e}")),
        }
    }
}

fn format_age(dt: chrono::DateTime<chrono::Utc>) -> String {
    let dur = chrono::Utc::now() - dt;
    if dur.num_seconds() < 60 {
        "now".to_string()
    } else if dur.num_minutes() < 60 {
        format!("{}m", dur.num_minutes())
    } else if dur.num_hours() < 24 {
        format!("{}h", dur.num_hours())
    } else {
        format!("{}d", dur.num_days())
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{truncated}…")
    } else {
        truncated
    }
}

// ── UI rendering ───────────────────────────────────────────────────

fn draw(frame: &mut Frame, app: &mut App) {
    let [title_area, body_area, help_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    // Title bar
    let sort_name = app.sort.map(|s| s.as_str()).unwrap_or("none");
    let title = format!(
        " CINELOG — {} movie(s) — sort: {sort_name} ",
        app.movies.len()
    );
    frame.render_widget(
        Paragraph::new(title).style(Style::new().fg(Color::Black).bg(Color::Cyan)),
        title_area,
    );

    // Body: two-pane split
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(body_area);

    // Left pane: movie grid
    let items: Vec<ListItem> = app
        .movies
        .iter()
        .map(|movie| {
            let age = format_age(movie.updated_at);
            ListItem::new(format!(
                "{:4}  {:<28} {:<18} {:>4}",
                movie.year,
                truncate_chars(&movie.title, 28),
                truncate_chars(&movie.director, 18),
                age
            ))
        })
        .collect();

    let list_title = if app.mode == Mode::Search {
        format!("Search: {}_", app.search_query)
    } else {
        "Movies".to_string()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(
            Style::new()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, list_area, &mut app.list_state);

    // Right pane: movie detail
    let detail_content = if let Some(idx) = app.list_state.selected() {
        if let Some(movie) = app.movies.get(idx) {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("ID:       ", Style::new().fg(Color::DarkGray)),
                    Span::raw(movie.id.to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Title:    ", Style::new().fg(Color::DarkGray)),
                    Span::raw(movie.title.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Year:     ", Style::new().fg(Color::DarkGray)),
                    Span::raw(movie.year.to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Genre:    ", Style::new().fg(Color::DarkGray)),
                    Span::raw(movie.genre.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Director: ", Style::new().fg(Color::DarkGray)),
                    Span::raw(movie.director.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Created:  ", Style::new().fg(Color::DarkGray)),
                    Span::raw(movie.created_at.format("%Y-%m-%d %H:%M").to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Updated:  ", Style::new().fg(Color::DarkGray)),
                    Span::raw(movie.updated_at.format("%Y-%m-%d %H:%M").to_string()),
                ]),
            ];
            if let Some(ref poster) = movie.poster {
                lines.push(Line::from(vec![
                    Span::styled("Poster:   ", Style::new().fg(Color::DarkGray)),
                    Span::raw(poster.clone()),
                ]));
            }
            lines
        } else {
            vec![Line::raw("No movie selected")]
        }
    } else {
        vec![Line::raw("No movies")]
    };

    let detail_title = if app.detail_scroll > 0 {
        format!("Detail [scroll: {}]", app.detail_scroll)
    } else {
        "Detail".to_string()
    };

    let detail = Paragraph::new(detail_content)
        .block(Block::default().borders(Borders::ALL).title(detail_title))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));

    frame.render_widget(detail, detail_area);

    // Auto-clear status after 3 seconds
    if let Some(t) = app.status_time
        && t.elapsed() > Duration::from_secs(3)
    {
        app.status.clear();
        app.status_time = None;
    }

    // Help bar
    let help_text = match app.mode {
        Mode::Normal | Mode::ConfirmDelete(_) => {
            if app.status.is_empty() {
                " [q]uit [/]search [s]ort [d]elete [r]efresh [g/G]top/bottom [J/K]scroll".to_string()
            } else {
                format!(" {} ", app.status)
            }
        }
        Mode::Search => " Type to filter (live) · [Enter] done · [Esc] cancel".to_string(),
    };

    frame.render_widget(
        Paragraph::new(help_text).style(Style::new().fg(Color::Black).bg(Color::White)),
        help_area,
    );
}

// ── Event handling ─────────────────────────────────────────────────

fn handle_event(app: &mut App, storage: &SqliteStorage) -> std::io::Result<()> {
    if !event::poll(Duration::from_millis(250))? {
        return Ok(());
    }

    let Event::Key(key) = event::read()? else {
        return Ok(());
    };
    if key.kind != KeyEventKind::Press {
        return Ok(());
    }

    match app.mode {
        Mode::Normal => {
            let shifted = key.modifiers.contains(KeyModifiers::SHIFT);
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                KeyCode::Char('J') if shifted => {
                    app.detail_scroll = app.detail_scroll.saturating_add(1);
                }
                KeyCode::Char('K') if shifted => {
                    app.detail_scroll = app.detail_scroll.saturating_sub(1);
                }
                KeyCode::Char('j') | KeyCode::Down => app.select_next(),
                KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
                KeyCode::PageDown => app.select_by(10),
                KeyCode::PageUp => app.select_by(-10),
                KeyCode::Char('g') | KeyCode::Home => app.select_first(),
                KeyCode::Char('G') | KeyCode::End => app.select_last(),
                KeyCode::Char('d') => app.request_delete(),
                KeyCode::Char('s') => app.cycle_sort(storage),
                KeyCode::Char('/') => {
                    app.mode = Mode::Search;
                    app.search_query.clear();
                    app.status.clear();
                    app.status_time = None;
                }
                KeyCode::Char('r') => {
                    app.refresh(storage);
                    app.set_status("Refreshed".to_string());
                }
                _ => {}
            }
        }
        Mode::ConfirmDelete(id) => match key.code {
            KeyCode::Char('y') => {
                app.mode = Mode::Normal;
                app.confirm_delete(storage, id);
            }
            _ => {
                app.mode = Mode::Normal;
                app.set_status("Delete cancelled".to_string());
            }
        },
        Mode::Search => match key.code {
            KeyCode::Esc => {
                app.mode = Mode::Normal;
                app.search_query.clear();
                app.refresh(storage);
            }
            KeyCode::Enter => {
                app.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                app.search_query.pop();
                app.refresh(storage);
            }
            KeyCode::Char(c) => {
                app.search_query.push(c);
                app.refresh(storage);
            }
            _ => {}
        },
    }

    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────

pub fn run(paths: &AppPaths) -> crate::errors::Result<()> {
    std::fs::create_dir_all(&paths.base_dir)?;
    let storage = SqliteStorage::open(&paths.db_path)?;

    if let Some(count) = transfer::migrate_legacy(&storage, &paths.legacy_path)? {
        eprintln!("Migrated {count} movie(s) from the legacy store.");
    }

    let mut app = App::new();
    app.refresh(&storage);

    let mut terminal = ratatui::init();

    let result = (|| {
        loop {
            terminal.draw(|frame| draw(frame, &mut app))?;
            handle_event(&mut app, &storage)?;
            if app.should_quit {
                break;
            }
        }
        Ok::<(), std::io::Error>(())
    })();

    ratatui::restore();

    result.map_err(CatalogError::from)
}
