//! End-of-run plot of every episode reward and its trailing average.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame, Terminal,
};

use super::training_view::{x_bounds, y_bounds};
use crate::training::metrics::{RewardHistory, AVERAGE_WINDOW};

/// Plot points for the raw rewards and the moving average, x = episode (1-based).
pub fn chart_series(history: &RewardHistory) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let to_points = |values: &[f32]| {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| ((i + 1) as f64, v as f64))
            .collect::<Vec<_>>()
    };
    (to_points(history.rewards()), to_points(&history.moving_average()))
}

pub fn render(frame: &mut Frame, history: &RewardHistory) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(3)])
        .split(frame.area());

    let (rewards, average) = chart_series(history);
    let (x_min, x_max) = x_bounds(&rewards, 1);
    let (y_min, y_max) = y_bounds(rewards.iter().chain(average.iter()));

    let datasets = vec![
        Dataset::default()
            .name("Reward")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Blue))
            .data(&rewards),
        Dataset::default()
            .name(format!("Average ({})", AVERAGE_WINDOW))
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&average),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Rewards over {} episodes", history.len())),
        )
        .x_axis(
            Axis::default()
                .title("Episode")
                .labels(vec![
                    Span::raw(format!("{}", x_min as usize)),
                    Span::raw(format!("{}", x_max as usize)),
                ])
                .bounds([x_min, x_max]),
        )
        .y_axis(
            Axis::default()
                .title("Reward")
                .labels(vec![
                    Span::raw(format!("{:.1}", y_min)),
                    Span::raw(format!("{:.1}", y_max)),
                ])
                .bounds([y_min, y_max]),
        );
    frame.render_widget(chart, chunks[0]);

    let footer = Paragraph::new(format!(
        "Final average: {:+.3}  |  Q: Close",
        history.average()
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[1]);
}

/// Draw the chart until the user presses q or Esc.
pub fn run<B: Backend>(terminal: &mut Terminal<B>, history: &RewardHistory) -> io::Result<()> {
    loop {
        terminal
            .draw(|f| render(f, history))
            .map_err(|e| io::Error::other(e.to_string()))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
                    return Ok(());
                }
            }
        }
    }
}
