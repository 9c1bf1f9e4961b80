//! Layout and drawing: start screen, board, sidebar, pause, quit menu, results.

use crate::app::{GameRound, Hud, POPUP_TTL, QuitOption, Screen};
use crate::theme::Theme;
use emoji_smash::field::PuzzleField;
use emoji_smash::grid::{COLS, Coord, FieldLayout, Grid, ROWS, Tile, Variant};
use emoji_smash::items::PowerItem;
use emoji_smash::pipeline::Phase;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{CellFilter, Duration as TfxDuration, EffectRenderer, Interpolation, fx, ref_count};

/// Terminal cells per board cell: the emoji on top, a colour bar below.
const CELL_WIDTH: u16 = 5;
const CELL_HEIGHT: u16 = 2;
const SIDEBAR_WIDTH: u16 = 26;
const SIDEBAR_HEIGHT: u16 = 23;
/// Combo colour steps.
const COMBO_HOT: u32 = 10;
const COMBO_WARM: u32 = 5;

/// Board outline size including the border.
fn board_size() -> (u16, u16) {
    (
        COLS as u16 * CELL_WIDTH + 2,
        ROWS as u16 * CELL_HEIGHT + 2,
    )
}

/// Board and sidebar, centred in `area`.
fn game_rects(area: Rect) -> (Rect, Rect) {
    let (bw, bh) = board_size();
    let total_w = bw + SIDEBAR_WIDTH;
    let total_h = bh.max(SIDEBAR_HEIGHT);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let board = Rect {
        height: bh.min(inner[0].height),
        ..inner[0]
    };
    (board, inner[1])
}

/// Where the cells land on screen for a frame of size `area`.
pub fn field_layout(area: Rect) -> FieldLayout {
    let (board, _) = game_rects(area);
    FieldLayout {
        x: board.x + 1,
        y: board.y + 1,
        cell_width: CELL_WIDTH,
        cell_height: CELL_HEIGHT,
    }
}

/// Screen rect of the cell at `(x, y)` when it fits whole inside `inner`.
/// Clipped cells are neither drawn nor clickable.
fn whole_cell(x: u16, y: u16, inner: Rect) -> Option<Rect> {
    let cell = Rect::new(x, y, CELL_WIDTH, CELL_HEIGHT);
    (cell.width == CELL_WIDTH && cell.height == CELL_HEIGHT && cell.intersection(inner) == cell)
        .then_some(cell)
}

/// Cell under a click at `(x, y)`, if that cell is drawn on screen.
pub fn cell_under(area: Rect, x: u16, y: u16) -> Option<Coord> {
    let (board, _) = game_rects(area);
    let inner = Block::default().borders(Borders::ALL).inner(board);
    let layout = field_layout(area);
    let at = layout.cell_at(x, y)?;
    let (cx, cy) = layout.origin_of(at);
    whole_cell(cx, cy, inner).map(|_| at)
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn fill_bg(buf: &mut Buffer, rect: Rect, bg: Color) {
    let rect = rect.intersection(buf.area);
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(bg));
        }
    }
}

fn combo_color(streak: u32, theme: &Theme) -> Color {
    if streak >= COMBO_HOT {
        Color::Red
    } else if streak >= COMBO_WARM {
        Color::Yellow
    } else {
        theme.main_fg
    }
}

fn glyph_row(variant: Variant) -> String {
    variant.tiles().map(Tile::glyph).collect::<Vec<_>>().join(" ")
}

/// Draw the current screen. Playing and quit menu share the board; the
/// destroy fade runs while the field is in its destroying phase.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    round: &GameRound,
    hud: &mut Hud,
    theme: &Theme,
    best_combo: u32,
    start_variant: Variant,
    paused: bool,
    quit_selected: Option<QuitOption>,
    no_animation: bool,
    now: Instant,
) {
    let area = frame.area();
    fill_bg(frame.buffer_mut(), area, theme.bg);
    match screen {
        Screen::Start => draw_start(frame, theme, best_combo, start_variant, area),
        Screen::Playing | Screen::QuitMenu => {
            draw_game(frame, round, hud, theme, best_combo, area, screen == Screen::Playing);
            let field = round.field();
            if field.phase() == Phase::Destroying && !no_animation {
                let (board, _) = game_rects(area);
                apply_destroy_fade(frame, field, hud, theme, board, now);
            } else {
                hud.fade = None;
                hud.fade_clock = None;
            }
            if paused && screen == Screen::Playing {
                draw_pause_overlay(frame, theme, area);
            }
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, theme, opt);
            }
        }
        Screen::Results => draw_results(frame, round, hud, theme, area),
    }
}

/// Fade the destroy-set to the background over the destroying window.
fn apply_destroy_fade(
    frame: &mut Frame,
    field: &PuzzleField,
    hud: &mut Hud,
    theme: &Theme,
    board: Rect,
    now: Instant,
) {
    let delta = hud
        .fade_clock
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    hud.fade_clock = Some(now);

    if hud.fade.is_none() {
        let layout = field_layout(frame.area());
        let cells: HashSet<(u16, u16)> = field
            .destroying()
            .iter()
            .flat_map(|&at| {
                let (x, y) = layout.origin_of(at);
                (0..CELL_HEIGHT).flat_map(move |dy| (0..CELL_WIDTH).map(move |dx| (x + dx, y + dy)))
            })
            .collect();
        let window = field.timing().destroy_window(field.destroying().len());
        let window_ms = window.as_millis().min(u32::MAX as u128) as u32;
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            cells.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(theme.bg, theme.bg, (window_ms, Interpolation::QuadOut))
            .with_filter(filter)
            .with_area(board);
        hud.fade = Some(effect);
    }

    if let Some(effect) = &mut hud.fade {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_start(frame: &mut Frame, theme: &Theme, best_combo: u32, variant: Variant, area: Rect) {
    let popup = centered(area, 56, 22);
    let fg = Style::default().fg(theme.main_fg);
    let dim = Style::default().fg(theme.inactive_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " 😀 Emoji Smash 😍 ",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Tap a group of 2 or more matching emoji.", fg)),
        Line::from(Span::styled("Bigger groups score more: tiles² × 10.", fg)),
        Line::from(Span::styled("Smash group after group to build a combo.", fg)),
        Line::from(Span::styled("A combo of 4+ earns a power item:", fg)),
    ];
    for item in PowerItem::ALL {
        lines.push(Line::from(vec![
            Span::styled(format!("{} {}", item.icon(), item.name()), Style::default().fg(theme.title)),
            Span::styled(format!(": {}", item.description()), fg),
        ]));
    }
    let variant_label = match variant {
        Variant::A => "A",
        Variant::B => "B",
    };
    lines.extend([
        Line::from(""),
        Line::from(vec![
            Span::styled("Icon set ", Style::default().fg(theme.title)),
            Span::styled(format!("◀ {} ▶  ", variant_label), fg.add_modifier(Modifier::BOLD)),
            Span::raw(glyph_row(variant)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Best combo: ", Style::default().fg(theme.title)),
            Span::styled(best_combo.to_string(), fg),
        ]),
        Line::from(""),
        Line::from(Span::styled(" Enter — Start   ←/→ — Icon set   Q — Quit ", dim)),
    ]);
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Board + sidebar.
fn draw_game(
    frame: &mut Frame,
    round: &GameRound,
    hud: &Hud,
    theme: &Theme,
    best_combo: u32,
    area: Rect,
    show_cursor: bool,
) {
    let (board, sidebar) = game_rects(area);
    draw_board(frame, round, hud, theme, board, show_cursor);
    draw_sidebar(frame, round, theme, best_combo, sidebar);
}

fn draw_board(frame: &mut Frame, round: &GameRound, hud: &Hud, theme: &Theme, area: Rect, show_cursor: bool) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Emoji Smash ", Style::default().fg(theme.title)));
    if let Some(banner) = &hud.banner {
        let color = if banner.big { Color::Magenta } else { theme.title };
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" {} ", banner.text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .centered(),
        );
    }
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let layout = FieldLayout {
        x: inner.x,
        y: inner.y,
        cell_width: CELL_WIDTH,
        cell_height: CELL_HEIGHT,
    };
    let grid = round.field().grid();
    let buf = frame.buffer_mut();
    for at in Grid::coords() {
        let (x, y) = layout.origin_of(at);
        let Some(cell) = whole_cell(x, y, inner) else {
            continue;
        };
        let bg = if show_cursor && at == hud.cursor {
            theme.selected_bg
        } else {
            theme.bg
        };
        fill_bg(buf, cell, bg);
        if let Some(tile) = grid.tile_at(at) {
            buf.set_string(x + 1, y, tile.glyph(), Style::default().bg(bg));
            buf.set_string(
                x + 1,
                y + 1,
                "▔▔▔",
                Style::default().fg(theme.tile_color(tile.index())).bg(bg),
            );
        }
    }

    for popup in &hud.popups {
        let (x, y) = layout.origin_of(popup.at);
        let rise = (popup.age.as_millis() * 3 / POPUP_TTL.as_millis().max(1)) as u16;
        let y = y.saturating_sub(rise).max(inner.y);
        if inner.contains(Position::new(x, y)) {
            let max_width = (inner.right() - x) as usize;
            let style = Style::default()
                .fg(theme.title)
                .bg(theme.bg)
                .add_modifier(Modifier::BOLD);
            buf.set_stringn(x, y, &popup.text, max_width, style);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, round: &GameRound, theme: &Theme, best_combo: u32, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let combo = round.combo();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Score, best, longest
            Constraint::Length(4), // Time label + gauge
            Constraint::Length(3), // Combo
            Constraint::Min(3),    // Item tray
        ])
        .split(area);

    // --- Stats ---
    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stats = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(round.score().to_string(), fg_style.add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("Best combo: ", title_style),
            Span::styled(best_combo.max(combo.all_time()).to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Longest: ", title_style),
            Span::styled(combo.longest().to_string(), fg_style),
        ]),
    ];
    Paragraph::new(Text::from(stats)).render(stats_inner, frame.buffer_mut());

    // --- Time ---
    let time_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let time_inner = time_block.inner(chunks[1]);
    time_block.render(chunks[1], frame.buffer_mut());
    let time_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(time_inner);
    let total = f64::from(round.config().round_secs.max(1));
    let left = round.time_left().as_secs_f64();
    let ratio = (left / total).clamp(0.0, 1.0);
    Paragraph::new(Line::from(vec![
        Span::styled("Time ", title_style),
        Span::styled(format!("{}s", left.ceil() as u64), fg_style),
    ]))
    .render(time_layout[0], frame.buffer_mut());
    let bar_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color).bg(theme.bg))
        .render(time_layout[1], frame.buffer_mut());

    // --- Combo ---
    let combo_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let combo_inner = combo_block.inner(chunks[2]);
    combo_block.render(chunks[2], frame.buffer_mut());
    let streak = combo.current();
    let combo_label = if streak > 0 {
        format!("x{}", streak)
    } else {
        "-".to_string()
    };
    Paragraph::new(Line::from(vec![
        Span::styled("Combo ", title_style),
        Span::styled(
            combo_label,
            Style::default()
                .fg(combo_color(streak, theme))
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .render(combo_inner, frame.buffer_mut());

    // --- Items ---
    let items_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Items ", title_style));
    let items_inner = items_block.inner(chunks[3]);
    items_block.render(chunks[3], frame.buffer_mut());
    let tray = round.tray();
    let lines: Vec<Line> = if tray.is_empty() {
        vec![Line::from(Span::styled(
            "combo 4+ to earn one",
            Style::default().fg(theme.inactive_fg),
        ))]
    } else {
        tray.iter()
            .enumerate()
            .map(|(i, t)| {
                Line::from(vec![
                    Span::styled(format!("{} ", i + 1), title_style),
                    Span::raw(format!("{} ", t.item.icon())),
                    Span::styled(format!("{:<10}", t.item.name()), fg_style),
                    Span::styled(
                        format!("{:>2}s", t.expires_in.as_secs_f64().ceil() as u64),
                        Style::default().fg(theme.inactive_fg),
                    ),
                ])
            })
            .collect()
    };
    Paragraph::new(Text::from(lines)).render(items_inner, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    fill_bg(frame.buffer_mut(), popup, theme.bg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_results(frame: &mut Frame, round: &GameRound, hud: &Hud, theme: &Theme, area: Rect) {
    let popup = centered(area, 44, 16);
    let fg = Style::default().fg(theme.main_fg);
    let Some(results) = hud.results.or_else(|| round.results()) else {
        return;
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Time's up! ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", results.score),
            fg.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!(" Longest combo: {} ", results.longest_combo), fg)),
        Line::from(Span::styled(format!(" All-time best: {} ", results.all_time_combo), fg)),
    ];
    if results.new_record {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(results.rank.message(), Style::default().fg(theme.title))),
        Line::from(results.rank.celebration().join(" ")),
        Line::from(""),
        Line::from(Span::styled(
            " R — Restart   Enter — Start screen   Q — Quit ",
            Style::default().fg(theme.inactive_fg),
        )),
    ]);
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Emoji Smash ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    fill_bg(frame.buffer_mut(), quit_rect, theme.bg);
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::StartScreen, " Start screen "),
        (QuitOption::Exit, " Exit "),
    ];
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_round_trips_every_cell() {
        let layout = field_layout(Rect::new(0, 0, 100, 30));
        for at in Grid::coords() {
            let (x, y) = layout.origin_of(at);
            assert_eq!(layout.cell_at(x, y), Some(at));
            assert_eq!(layout.cell_at(x + CELL_WIDTH - 1, y + CELL_HEIGHT - 1), Some(at));
        }
        assert_eq!(layout.cell_at(layout.x - 1, layout.y), None);
        let (x, y) = layout.origin_of(Coord::new(ROWS - 1, COLS - 1));
        assert_eq!(layout.cell_at(x + CELL_WIDTH, y), None);
        assert_eq!(layout.cell_at(x, y + CELL_HEIGHT), None);
    }

    #[test]
    fn clicks_only_reach_cells_that_were_drawn() {
        let area = Rect::new(0, 0, 100, 12);
        let (board, _) = game_rects(area);
        assert!(board.height < board_size().1);
        let layout = field_layout(area);

        let (x, y) = layout.origin_of(Coord::new(0, 0));
        assert_eq!(cell_under(area, x, y), Some(Coord::new(0, 0)));

        // The bottom border sits where a lower row would be on a taller screen.
        let border_y = board.y + board.height - 1;
        assert!(layout.cell_at(x, border_y).is_some());
        assert_eq!(cell_under(area, x, border_y), None);

        let clickable_rows = (0..ROWS)
            .filter(|&row| {
                let (x, y) = layout.origin_of(Coord::new(row, 0));
                cell_under(area, x, y).is_some()
            })
            .count();
        assert!(clickable_rows < ROWS);

        let full = Rect::new(0, 0, 100, 30);
        let layout = field_layout(full);
        for at in Grid::coords() {
            let (x, y) = layout.origin_of(at);
            assert_eq!(cell_under(full, x, y), Some(at));
        }
    }

    #[test]
    fn board_is_centred() {
        let (board, sidebar) = game_rects(Rect::new(0, 0, 100, 30));
        let (bw, bh) = board_size();
        assert_eq!((board.width, board.height), (bw, bh));
        assert_eq!(sidebar.x, board.x + bw);
        assert_eq!(board.x, (100 - bw - SIDEBAR_WIDTH) / 2);
    }

    #[test]
    fn combo_colour_steps() {
        let theme = Theme::default();
        assert_eq!(combo_color(0, &theme), theme.main_fg);
        assert_eq!(combo_color(5, &theme), Color::Yellow);
        assert_eq!(combo_color(12, &theme), Color::Red);
    }

    #[test]
    fn variant_rows_list_their_icons() {
        assert_eq!(glyph_row(Variant::A).split(' ').count(), 5);
        assert!(glyph_row(Variant::B).ends_with("🤖"));
    }
}
