use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use fingertap::trial::{BlockRun, MarkerTrack, TrialPhase, TrialTiming};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const REST_COLOR: Color = Color::Rgb(0xff, 0x00, 0x00);
const TAP_COLOR: Color = Color::Rgb(0x89, 0xba, 0x00);

const END_MESSAGE: &str =
    "Thank you. That is the end of this section. Please inform the researcher you have finished.";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match (self.state, self.experiment.current()) {
            (AppState::Running, Some(run)) => match run.phase() {
                TrialPhase::Intro => render_intro(run, area, buf),
                TrialPhase::Rest { remaining } => {
                    let countdown = format!("Rest: {}", remaining.as_secs_f64().ceil() as u64);
                    render_trial_screen(run, REST_COLOR, &countdown, None, area, buf);
                }
                TrialPhase::Tap { .. } => render_trial_screen(
                    run,
                    TAP_COLOR,
                    "Tap as fast as you can!",
                    Some(run.markers()),
                    area,
                    buf,
                ),
                // Only seen for the instant between a block finishing and the next one loading
                TrialPhase::Complete => Block::default()
                    .style(Style::default().bg(REST_COLOR))
                    .render(area, buf),
            },
            _ => render_message(END_MESSAGE, area, buf),
        }
    }
}

fn instructions(sequence: &str, timing: &TrialTiming) -> String {
    let tap = timing.tap.as_secs();
    let rest = timing.rest.as_secs();
    format!(
        "Place the fingers of your LEFT hand on the keys 1, 2, 3, and 4. You will be shown a string of 5 digits {sequence}, and the computer will start counting down until you start.\n\n\
         Once the countdown has completed and the screen turns green, type {sequence} over and over as quickly as you can. Try not to make errors, but overall you should emphasise speed over accuracy.\n\n\
         You will have {tap} seconds to type {sequence} as many times as possible. Stop when the screen turns red again. You will get {rest} seconds to rest before the next trial.\n\n\
         Press the spacebar when you are ready for the countdown to begin."
    )
}

fn render_intro(run: &BlockRun, area: Rect, buf: &mut Buffer) {
    render_message(
        &instructions(&run.block.target.to_string(), run.timing()),
        area,
        buf,
    );
}

fn render_message(text: &str, area: Rect, buf: &mut Buffer) {
    Block::default()
        .style(Style::default().bg(Color::Black))
        .render(area, buf);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1)])
        .split(area);

    Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::White).bg(Color::Black))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);
}

fn marker_line(markers: &MarkerTrack) -> Line<'static> {
    let lit = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let unlit = Style::default().fg(Color::DarkGray);
    Line::from(
        (0..markers.len())
            .map(|i| {
                if i < markers.lit() {
                    Span::styled("●", lit)
                } else {
                    Span::styled("·", unlit)
                }
            })
            .collect::<Vec<Span>>(),
    )
}

fn render_trial_screen(
    run: &BlockRun,
    background: Color,
    status: &str,
    markers: Option<&MarkerTrack>,
    area: Rect,
    buf: &mut Buffer,
) {
    let base = Style::default().bg(background).fg(Color::White);
    Block::default().style(base).render(area, buf);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(1), // sequence
            Constraint::Length(2),
            Constraint::Length(1), // markers
            Constraint::Length(2),
            Constraint::Length(1), // countdown / prompt
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        run.block.target.to_string(),
        base.add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    if let Some(markers) = markers {
        Paragraph::new(marker_line(markers))
            .style(base)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    Paragraph::new(Span::styled(status.to_string(), base))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
}
