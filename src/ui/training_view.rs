use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Sparkline},
    Frame,
};

use super::court_widget;
use super::training_dashboard::{DashboardState, TrainingStatus};

/// Render the full training dashboard.
pub fn render(frame: &mut Frame, dashboard: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(frame, dashboard, chunks[0]);
    render_main(frame, dashboard, chunks[1]);
    render_footer(frame, chunks[2]);
}

fn render_header(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let (status_str, status_color) = match dashboard.status {
        TrainingStatus::Running => ("RUNNING", Color::Green),
        TrainingStatus::Paused => ("PAUSED", Color::Yellow),
        TrainingStatus::Finished => ("FINISHED", Color::Cyan),
        TrainingStatus::Failed => ("FAILED", Color::Red),
    };

    let header_text = Line::from(vec![
        Span::styled(
            "Pong Actor-Critic",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::raw(format!(
            "Episode: {}/{}",
            dashboard.episode, dashboard.total_episodes
        )),
        Span::raw("  |  ["),
        Span::styled(status_str, Style::default().fg(status_color).add_modifier(Modifier::BOLD)),
        Span::raw("]"),
    ]);

    let header = Paragraph::new(header_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn render_main(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let main_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_left_panel(frame, dashboard, main_cols[0]);
    render_right_panel(frame, dashboard, main_cols[1]);
}

fn render_left_panel(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let left_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(35),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    render_reward_chart(frame, dashboard, left_rows[0]);
    render_loss_chart(frame, dashboard, left_rows[1]);
    render_length_sparkline(frame, dashboard, left_rows[2]);
    render_progress_gauge(frame, dashboard, left_rows[3]);
}

fn render_right_panel(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let right_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_live_court(frame, dashboard, right_rows[0]);
    render_stats_panel(frame, dashboard, right_rows[1]);
}

fn render_reward_chart(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let reward_data: Vec<(f64, f64)> = dashboard.reward_history.iter().copied().collect();
    let average_data: Vec<(f64, f64)> = dashboard.average_history.iter().copied().collect();

    let (x_min, x_max) = x_bounds(&reward_data, dashboard.total_episodes);
    let (y_min, y_max) = y_bounds(reward_data.iter().chain(average_data.iter()));

    let mut datasets = vec![];
    if !reward_data.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Reward")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::DarkGray))
                .data(&reward_data),
        );
    }
    if !average_data.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Average")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Green))
                .data(&average_data),
        );
    }

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Episode Reward"))
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

    frame.render_widget(chart, area);
}

fn render_loss_chart(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let loss_data: Vec<(f64, f64)> = dashboard.loss_history.iter().copied().collect();

    let (x_min, x_max) = x_bounds(&loss_data, dashboard.total_episodes);
    let (y_min, y_max) = y_bounds(loss_data.iter());

    let mut datasets = vec![];
    if !loss_data.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Loss")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(&loss_data),
        );
    }

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Loss"))
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
                .title("Loss")
                .labels(vec![
                    Span::raw(format!("{:.2}", y_min)),
                    Span::raw(format!("{:.2}", y_max)),
                ])
                .bounds([y_min, y_max]),
        );

    frame.render_widget(chart, area);
}

fn render_length_sparkline(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let data: Vec<u64> = dashboard.length_history.iter().copied().collect();

    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Episode Length (last: {})", dashboard.episode_length)),
        )
        .data(&data)
        .style(Style::default().fg(Color::Magenta));

    frame.render_widget(sparkline, area);
}

fn render_progress_gauge(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let progress = dashboard.progress();
    let label = format!(
        "{}/{} ({:.1}%)",
        dashboard.episode,
        dashboard.total_episodes,
        progress * 100.0
    );

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio(progress.clamp(0.0, 1.0))
        .label(label);

    frame.render_widget(gauge, area);
}

fn render_live_court(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Live Game (step {})", dashboard.live_step));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(ref court) = dashboard.live_frame {
        court_widget::render_court(frame, court, inner);
    } else {
        let placeholder = Paragraph::new("Waiting for first episode...")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(placeholder, inner);
    }
}

fn stat_line(label: &'static str, value: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::White)),
        Span::styled(value, style),
    ])
}

fn render_stats_panel(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let plain = Style::default();
    let optional = |v: Option<f32>, precision: usize| match v {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    };

    let mut lines = vec![
        stat_line(
            "Reward:      ",
            format!("{:+.3}", dashboard.reward),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        stat_line("Avg (100):   ", format!("{:+.3}", dashboard.average_reward), plain),
        stat_line(
            "Win Rate:    ",
            format!("{:.1}%", dashboard.win_rate * 100.0),
            Style::default().fg(Color::Yellow),
        ),
        Line::from(""),
        stat_line("Loss:        ", optional(dashboard.loss, 6), plain),
        stat_line("Entropy:     ", optional(dashboard.entropy, 4), plain),
        stat_line("Skipped:     ", format!("{}", dashboard.skipped_updates), plain),
    ];

    if dashboard.episodes_per_sec > 0.0 {
        lines.push(stat_line(
            "Ep/sec:      ",
            format!("{:.2}", dashboard.episodes_per_sec),
            plain,
        ));
    }

    if let Some(ref skip) = dashboard.last_skip {
        lines.push(stat_line(
            "Last skip: ",
            skip.clone(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(ref failure) = dashboard.failure {
        lines.push(Line::from(""));
        lines.push(stat_line("Error: ", failure.clone(), Style::default().fg(Color::Red)));
    }

    let stats = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Stats"));

    frame.render_widget(stats, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new("P: Pause/Resume  |  Q: Quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));

    frame.render_widget(footer, area);
}

/// Compute x-axis bounds from data points.
pub(crate) fn x_bounds(data: &[(f64, f64)], total_episodes: usize) -> (f64, f64) {
    match (data.first(), data.last()) {
        (Some(first), Some(last)) => (first.0, last.0.max(first.0 + 1.0)),
        _ => (0.0, total_episodes.max(1) as f64),
    }
}

/// Compute y-axis bounds with a small margin, never collapsing to a point.
pub(crate) fn y_bounds<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> (f64, f64) {
    let (lo, hi) = points.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
        (lo.min(y), hi.max(y))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let margin = ((hi - lo) * 0.1).max(0.1);
    (lo - margin, hi + margin)
}
