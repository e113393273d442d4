use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::clock::Scheduler;
use crate::records::RecordLog;
use crate::session::Phase;
use crate::storage::KeyValueStore;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl<S: Scheduler, K: KeyValueStore> Widget for &App<S, K> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // score / time
                Constraint::Length(1), // padding
                Constraint::Length(1), // word
                Constraint::Length(1), // input
                Constraint::Length(1), // padding
                Constraint::Min(3),    // history
                Constraint::Length(1), // legend
            ])
            .split(area);

        let status = Paragraph::new(Span::styled(
            format!(
                "score {}   time {}s",
                session.score(),
                session.time_remaining()
            ),
            dim_bold_style,
        ))
        .alignment(Alignment::Center);
        status.render(chunks[0], buf);

        let input = session.input();
        let word_line = match (session.phase(), session.current_word()) {
            (Phase::Active, Some(word)) => Line::from(word_spans(
                word,
                input,
                green_bold_style,
                red_bold_style,
                dim_bold_style,
            )),
            (Phase::Active, None) => Line::from(Span::styled("loading words…", italic_style)),
            (Phase::Idle, _) if self.awaiting_pool() => {
                Line::from(Span::styled("loading words…", italic_style))
            }
            (Phase::Ended, _) => Line::from(Span::styled(
                "Game Over!",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            (Phase::Idle, _) => Line::from(Span::styled("press enter to start", italic_style)),
        };
        Paragraph::new(word_line)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        if session.phase() == Phase::Active {
            let on_track = session
                .current_word()
                .is_some_and(|word| word.starts_with(input));
            let input_style = if on_track {
                green_bold_style
            } else {
                red_bold_style
            };
            Paragraph::new(Line::from(vec![
                Span::styled(input.to_string(), input_style),
                Span::styled("_", dim_bold_style),
            ]))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        } else if let Some(score) = self.last_score() {
            let summary = match self.history().best_score() {
                Some(best) if best > score => format!("final score {score}   best {best}"),
                _ => format!("final score {score}"),
            };
            Paragraph::new(Span::styled(summary, bold_style))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        render_history(self.history(), chunks[5], buf);

        let legend = Paragraph::new(Span::styled(
            match session.phase() {
                Phase::Active => "(esc)ape",
                Phase::Idle if self.awaiting_pool() => "(esc)ape",
                Phase::Idle | Phase::Ended => "(r)estart / (esc)ape",
            },
            italic_style,
        ));
        legend.render(chunks[6], buf);
    }
}

/// Typed prefix in green, first wrong character onward in red, the rest dim
fn word_spans<'a>(
    word: &'a str,
    input: &str,
    correct: Style,
    wrong: Style,
    pending: Style,
) -> Vec<Span<'a>> {
    let mut typed = input.chars();
    let mut spans = Vec::new();
    let mut diverged = false;

    for (idx, expected) in word.char_indices() {
        let style = match typed.next() {
            Some(c) if c == expected && !diverged => correct,
            Some(_) => {
                diverged = true;
                wrong
            }
            None => pending,
        };
        let end = idx + expected.len_utf8();
        spans.push(Span::styled(&word[idx..end], style));
    }
    spans
}

/// Most recent first, as many as fit
fn render_history(history: &RecordLog, area: Rect, buf: &mut Buffer) {
    let rows = area.height.saturating_sub(2) as usize;
    let lines: Vec<String> = history
        .iter()
        .rev()
        .take(rows)
        .map(|entry| entry.to_record_string())
        .collect();

    let text: Vec<Line> = if lines.is_empty() {
        vec![Line::from(Span::styled(
            "no games yet",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        lines.iter().map(|l| Line::from(l.as_str())).collect()
    };

    // keep the block snug around the widest record
    let widest = lines.iter().map(|l| l.width()).max().unwrap_or(12) as u16 + 4;
    let width = widest.clamp(16, area.width.max(16)).min(area.width);
    let x = area.x + (area.width - width) / 2;
    let inner = Rect::new(x, area.y, width, area.height);

    Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("history ({})", history.len())),
        )
        .alignment(Alignment::Left)
        .render(inner, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualScheduler, SessionClock};
    use crate::records::{RecordEntry, RecordStore};
    use crate::runtime::AppEvent;
    use crate::session::{GameSession, SessionConfig};
    use crate::storage::MemoryStore;
    use crate::word_source::{WordPool, WordSource};
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::{mpsc, Arc};

    fn render_to_string(app: &App<ManualScheduler, MemoryStore>) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    fn test_app(store: MemoryStore) -> (App<ManualScheduler, MemoryStore>, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        let session = GameSession::new(
            SessionConfig::default(),
            SessionClock::new(scheduler.clone()),
            RecordStore::new(store),
        )
        .with_rng(StdRng::seed_from_u64(5));
        let (tx, _rx) = mpsc::channel();
        (
            App::new(session, Arc::new(WordSource::offline()), tx),
            scheduler,
        )
    }

    #[test]
    fn renders_loading_before_pool() {
        let (mut app, _) = test_app(MemoryStore::new());
        app.boot();
        let content = render_to_string(&app);
        assert!(content.contains("loading words"));
        assert!(!content.contains("press enter"));
        assert!(content.contains("score 0"));
        assert!(content.contains("time 60s"));
        assert!(content.contains("no games yet"));
    }

    #[test]
    fn renders_current_word_and_input() {
        let (mut app, _) = test_app(MemoryStore::new());
        app.boot();
        app.handle_event(AppEvent::PoolReady(
            WordPool::new(vec!["joystick".into()]).unwrap(),
        ));
        app.user_input("joy");

        let content = render_to_string(&app);
        assert!(content.contains("joystick"));
        assert!(content.contains("joy_"));
        assert!(content.contains("(esc)ape"));
    }

    #[test]
    fn renders_game_over_with_history() {
        let mut seeded = RecordStore::new(MemoryStore::new());
        seeded.append(&RecordEntry::now(8)).unwrap();
        let (mut app, scheduler) = test_app(seeded.storage().clone());
        app.boot();
        app.handle_event(AppEvent::PoolReady(WordPool::fallback()));
        let clock = scheduler.live()[0];
        for _ in 0..60 {
            app.handle_event(AppEvent::Tick(clock));
        }

        let content = render_to_string(&app);
        assert!(content.contains("Game Over!"));
        assert!(content.contains("final score 0"));
        assert!(content.contains("best 8"));
        assert!(content.contains("history (2)"));
        assert!(content.contains("Score: 8"));
        assert!(content.contains("(r)estart"));
    }

    #[test]
    fn word_spans_mark_divergence() {
        let plain = Style::default();
        let green = plain.fg(Color::Green);
        let red = plain.fg(Color::Red);
        let spans = word_spans("game", "gx", green, red, plain);

        let styles: Vec<Style> = spans.iter().map(|s| s.style).collect();
        assert_eq!(styles, vec![green, red, plain, plain]);

        // once wrong, later coincidental matches stay red
        let spans = word_spans("game", "xame", green, red, plain);
        assert!(spans.iter().all(|s| s.style == red));
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let (mut app, _) = test_app(MemoryStore::new());
        app.boot();
        let area = Rect::new(0, 0, 10, 4);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);
    }
}
