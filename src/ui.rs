use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::{
    app::App,
    clock::Clock,
    direction::format_arrows,
    drill::Phase,
    effects::Effects,
    evaluation::{EvaluationInput, EvaluationResult, EvaluationStatus, Grade},
    stats::SessionStatistics,
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const REPORT_WIDTH: u16 = 60;
const REPORT_HEIGHT: u16 = 16;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Best and last times are shown in seconds with two decimals
pub fn format_ms(ms: Option<u64>) -> String {
    match ms {
        Some(ms) => format!("{:.2}s", ms as f64 / 1000.0),
        None => "--".to_string(),
    }
}

fn grade_color(grade: Grade) -> Color {
    match grade {
        Grade::S => Color::Yellow,
        Grade::A => Color::Green,
        Grade::B => Color::Cyan,
        Grade::C => Color::Blue,
        Grade::D => Color::Magenta,
        Grade::F => Color::Red,
    }
}

impl<C: Clock, E: Effects> Widget for &App<C, E> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(1), // live stats
                Constraint::Min(5),    // target
                Constraint::Length(1), // best / last
                Constraint::Length(1), // selection
                Constraint::Length(1), // help
            ])
            .split(area);

        render_title(self, chunks[0], buf);
        render_live_stats(self, chunks[1], buf);
        render_target(self, chunks[2], buf);
        render_times(self, chunks[3], buf);
        render_selector(self, chunks[4], buf);
        render_help(self, chunks[5], buf);

        if let Some(stats) = self.report() {
            render_report(self, stats, area, buf);
        }
    }
}

fn render_title<C: Clock, E: Effects>(app: &App<C, E>, area: Rect, buf: &mut Buffer) {
    let mut spans = vec![Span::styled(
        "STRATAGEM HERO",
        bold().fg(Color::Yellow),
    )];
    if app.drill().random_mode() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "[RANDOM MODE]",
            bold().fg(Color::Magenta),
        ));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_live_stats<C: Clock, E: Effects>(app: &App<C, E>, area: Rect, buf: &mut Buffer) {
    let drill = app.drill();
    let stats = drill.stats();
    let elapsed = stats.elapsed_secs(drill.clock().now());
    let line = Line::from(vec![
        Span::styled("ACC ", dim()),
        Span::styled(format!("{:.0}%", stats.accuracy()), bold()),
        Span::styled("  RATE ", dim()),
        Span::styled(format!("{:.1}/min", drill.throughput_per_minute()), bold()),
        Span::styled("  DONE ", dim()),
        Span::styled(stats.completed_stratagems.to_string(), bold().fg(Color::Green)),
        Span::styled("  FAILED ", dim()),
        Span::styled(stats.failed_stratagems.to_string(), bold().fg(Color::Red)),
        Span::styled("  TIME ", dim()),
        Span::styled(format!("{:.1}s", elapsed), bold()),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_target<C: Clock, E: Effects>(app: &App<C, E>, area: Rect, buf: &mut Buffer) {
    let drill = app.drill();

    let Some(target) = drill.active() else {
        let message = if !drill.is_session_active() {
            Span::styled(
                "Press ENTER to start",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            )
        } else {
            Span::styled(
                "Nothing to practice: select at least one stratagem",
                bold().fg(Color::Red),
            )
        };
        centered_paragraph(vec![Line::from(message)], area, buf);
        return;
    };

    let phase = drill.phase();
    let name_style = match phase {
        Phase::Succeeded => bold().fg(Color::Green),
        Phase::Failed => bold().fg(Color::Red),
        _ => bold(),
    };

    let done = drill.progress().len();
    let arrows = target
        .code
        .iter()
        .enumerate()
        .flat_map(|(idx, dir)| {
            let style = if idx < done {
                bold().fg(Color::Green)
            } else if idx == done && phase != Phase::Succeeded {
                bold().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED)
            } else {
                dim()
            };
            [Span::styled(dir.arrow(), style), Span::raw(" ")]
        })
        .collect::<Vec<_>>();

    let status = match phase {
        Phase::Succeeded => Span::styled("COMPLETE", bold().fg(Color::Green)),
        Phase::Failed => Span::styled("MISS", bold().fg(Color::Red)),
        _ => Span::styled(
            format!("{:.1}s", drill.attempt_elapsed_ms().unwrap_or(0) as f64 / 1000.0),
            dim(),
        ),
    };

    let lines = vec![
        Line::from(Span::styled(target.name.clone(), name_style)),
        Line::from(Span::styled(
            target.category.to_string().to_uppercase(),
            dim().add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
        Line::from(arrows),
        Line::from(""),
        Line::from(status),
    ];
    centered_paragraph(lines, area, buf);
}

fn centered_paragraph(lines: Vec<Line<'_>>, area: Rect, buf: &mut Buffer) {
    let height = (lines.len() as u16).min(area.height);
    let top = area.y + (area.height - height) / 2;
    let inner = Rect::new(area.x, top, area.width, height);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(inner, buf);
}

fn render_times<C: Clock, E: Effects>(app: &App<C, E>, area: Rect, buf: &mut Buffer) {
    let drill = app.drill();
    let best = if drill.active().is_some_and(|t| t.is_synthetic()) {
        "n/a".to_string()
    } else {
        format_ms(drill.best_time_for_active())
    };
    let line = Line::from(vec![
        Span::styled("BEST ", dim()),
        Span::styled(best, bold().fg(Color::Yellow)),
        Span::styled("   LAST ", dim()),
        Span::styled(format_ms(drill.last_time_ms()), bold()),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_selector<C: Clock, E: Effects>(app: &App<C, E>, area: Rect, buf: &mut Buffer) {
    let Some(entry) = app.cursor_entry() else {
        return;
    };
    let (mark, mark_style) = if app.selection().contains(&entry.id) {
        ("[x]", bold().fg(Color::Green))
    } else {
        ("[ ]", dim())
    };
    let line = Line::from(vec![
        Span::styled("< ", dim()),
        Span::styled(mark, mark_style),
        Span::raw(" "),
        Span::styled(entry.name.clone(), bold()),
        Span::raw(" "),
        Span::styled(format_arrows(&entry.code), dim()),
        Span::styled(" >", dim()),
        Span::styled(format!("  {} selected", app.selection().len()), dim()),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_help<C: Clock, E: Effects>(app: &App<C, E>, area: Rect, buf: &mut Buffer) {
    let text = if app.report().is_some() {
        "(enter/esc) close report   (q) quit"
    } else if app.drill().is_session_active() {
        "(wasd/arrows) input  (enter) stop  (r) random  (tab/x) select  (esc) quit"
    } else {
        "(enter) start   (r) random mode   (tab/x) select   (esc) quit"
    };
    Paragraph::new(Span::styled(text, Style::default().add_modifier(Modifier::ITALIC)))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_report<C: Clock, E: Effects>(
    app: &App<C, E>,
    stats: &SessionStatistics,
    area: Rect,
    buf: &mut Buffer,
) {
    let popup = centered_rect(REPORT_WIDTH, REPORT_HEIGHT, area);
    Clear.render(popup, buf);

    let mut lines = match app.evaluation_status() {
        EvaluationStatus::Ready(result) => verdict_lines(result),
        EvaluationStatus::Pending | EvaluationStatus::Idle => {
            let source = if app.is_remote_evaluation() {
                "Contacting command..."
            } else {
                "Analyzing performance..."
            };
            vec![
                Line::from(""),
                Line::from(Span::styled(source, bold().add_modifier(Modifier::ITALIC))),
                Line::from(""),
            ]
        }
    };

    let input = EvaluationInput::from_stats(stats);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("TIME ", dim()),
        Span::styled(format!("{:.1}s", input.elapsed_secs), bold()),
        Span::styled("  DONE ", dim()),
        Span::styled(input.completed.to_string(), bold().fg(Color::Green)),
        Span::styled("  FAILED ", dim()),
        Span::styled(input.failed.to_string(), bold().fg(Color::Red)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("RATE ", dim()),
        Span::styled(format!("{:.0}/min", input.throughput_per_minute), bold()),
        Span::styled("  ACC ", dim()),
        Span::styled(format!("{:.0}%", stats.accuracy()), bold()),
    ]));

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" MISSION REPORT "),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(popup, buf);
}

fn verdict_lines(result: &EvaluationResult) -> Vec<Line<'static>> {
    let mut grade_line = vec![Span::styled(
        format!("GRADE {}", result.grade),
        bold().fg(grade_color(result.grade)),
    )];
    if result.is_offline {
        grade_line.push(Span::raw("  "));
        grade_line.push(Span::styled("[OFFLINE]", dim()));
    }
    vec![
        Line::from(grade_line),
        Line::from(Span::styled(result.title.clone(), bold())),
        Line::from(Span::styled(
            result.comment.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ]
}
