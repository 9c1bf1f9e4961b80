//! App: terminal init, main loop, round clock and input handling.

use crate::GameConfig;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use emoji_smash::combo::{ComboEvent, ComboTier};
use emoji_smash::field::{ItemOutcome, TapOutcome};
use emoji_smash::grid::{COLS, Coord, ROWS, Variant};
use emoji_smash::round::{Round, RoundEvent, RoundResults};
use emoji_smash::session::Session;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

pub type GameRound = Round<SmallRng>;

/// How long a score popup floats above the board.
pub const POPUP_TTL: Duration = Duration::from_millis(900);
const BANNER_TTL: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    Playing,
    Results,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    StartScreen,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub text: String,
    pub at: Coord,
    pub age: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    pub big: bool,
    pub age: Duration,
}

/// Presentation state that lives between frames.
#[derive(Default)]
pub struct Hud {
    pub cursor: Coord,
    /// Where the last cycle started; popups rise from here.
    pub anchor: Coord,
    pub popups: Vec<Popup>,
    pub banner: Option<Banner>,
    pub results: Option<RoundResults>,
    /// Fade over the destroy-set (created when the destroying phase starts).
    pub fade: Option<Effect>,
    pub fade_clock: Option<Instant>,
}

impl Hud {
    fn tick(&mut self, dt: Duration) {
        self.popups.retain_mut(|p| {
            p.age += dt;
            p.age < POPUP_TTL
        });
        if let Some(b) = &mut self.banner {
            b.age += dt;
            if b.age >= BANNER_TTL {
                self.banner = None;
            }
        }
    }

    fn move_cursor(&mut self, action: Action) {
        let Coord { row, col } = self.cursor;
        self.cursor = match action {
            Action::Up => Coord::new(row.saturating_sub(1), col),
            Action::Down => Coord::new((row + 1).min(ROWS - 1), col),
            Action::Left => Coord::new(row, col.saturating_sub(1)),
            Action::Right => Coord::new(row, (col + 1).min(COLS - 1)),
            _ => self.cursor,
        };
    }

    /// Fold round events into popups, banners and results.
    fn absorb(&mut self, events: &[RoundEvent]) {
        for event in events {
            match event {
                RoundEvent::ScoreAdded { points, .. } => self.popups.push(Popup {
                    text: format!("+{}", points),
                    at: self.anchor,
                    age: Duration::ZERO,
                }),
                RoundEvent::Combo(ComboEvent::TierReached { tier, streak }) => {
                    let text = match tier {
                        ComboTier::Huge => format!("💥 HUGE COMBO x{}! 💥", streak),
                        ComboTier::Big => format!("🔥 BIG COMBO x{}! 🔥", streak),
                    };
                    // Huge outranks big when both fire on the same update.
                    if *tier == ComboTier::Huge || !self.banner.as_ref().is_some_and(|b| b.big && b.age.is_zero()) {
                        self.banner = Some(Banner {
                            text,
                            big: *tier == ComboTier::Huge,
                            age: Duration::ZERO,
                        });
                    }
                }
                RoundEvent::ItemAwarded(item) => {
                    if self.banner.is_none() {
                        self.banner = Some(Banner {
                            text: format!("{} {}!", item.icon(), item.name()),
                            big: false,
                            age: Duration::ZERO,
                        });
                    }
                }
                RoundEvent::RoundOver(results) => self.results = Some(*results),
                _ => {}
            }
        }
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    session: Session,
    round: GameRound,
    screen: Screen,
    user_paused: bool,
    quit_selected: QuitOption,
    start_variant: Variant,
    hud: Hud,
    /// Rounds started this session; offsets `--seed` so each round gets a new board.
    rounds_started: u64,
    /// Frame size from the last draw, for mouse taps.
    area: Rect,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, session: Session) -> Self {
        let start_variant = config.round.variant;
        let round = Self::fresh_round(&config, &session, start_variant, 0);
        let screen = if config.start_screen {
            Screen::Start
        } else {
            Screen::Playing
        };
        Self {
            config,
            theme,
            session,
            round,
            screen,
            user_paused: false,
            quit_selected: QuitOption::Resume,
            start_variant,
            hud: Hud::default(),
            rounds_started: 1,
            area: Rect::default(),
        }
    }

    fn fresh_round(config: &GameConfig, session: &Session, variant: Variant, index: u64) -> GameRound {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(index)),
            None => SmallRng::from_entropy(),
        };
        let round_config = emoji_smash::round::RoundConfig {
            variant,
            ..config.round
        };
        Round::new(round_config, session.all_time_combo(), rng)
    }

    fn start_round(&mut self) {
        self.close_round();
        self.round = Self::fresh_round(&self.config, &self.session, self.start_variant, self.rounds_started);
        self.rounds_started += 1;
        self.hud = Hud::default();
        self.user_paused = false;
        self.screen = Screen::Playing;
    }

    /// Carry an unfinished round's streak record into the session. Finished
    /// rounds were folded in on `RoundOver`.
    fn close_round(&mut self) {
        if self.round.is_over() {
            return;
        }
        let all_time = self.round.combo().all_time();
        if self.session.fold_record(all_time) {
            log::info!("new all-time combo record {} from an unfinished round", all_time);
        }
    }

    fn sync_pause(&mut self) {
        self.round
            .set_paused(self.user_paused || self.screen == Screen::QuitMenu);
    }

    fn after_input(&mut self) {
        let events = self.round.drain_events();
        self.handle_events(&events);
    }

    fn handle_events(&mut self, events: &[RoundEvent]) {
        self.hud.absorb(events);
        for event in events {
            if let RoundEvent::RoundOver(results) = event {
                if self.session.finish_round(results.all_time_combo) {
                    log::info!("new all-time combo record {}", results.all_time_combo);
                }
                self.screen = Screen::Results;
            }
        }
    }

    fn tap(&mut self, at: Coord) {
        self.hud.cursor = at;
        if let TapOutcome::Started(n) = self.round.tap(at) {
            log::debug!("tap at {:?} destroys {}", at, n);
            self.hud.anchor = at;
        }
        self.after_input();
    }

    fn use_item(&mut self, slot: usize) {
        match self.round.use_item(slot) {
            Some(ItemOutcome::Started { .. }) => {
                let field = self.round.field();
                self.hud.anchor = field.destroying().first().copied().unwrap_or(self.hud.cursor);
            }
            Some(ItemOutcome::Fizzled(_)) => self.hud.anchor = self.hud.cursor,
            Some(ItemOutcome::Busy) | None => {}
        }
        self.after_input();
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing || self.user_paused {
            return;
        }
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            if let Some(at) = crate::ui::cell_under(self.area, mouse.column, mouse.row) {
                self.tap(at);
            }
        }
    }

    /// Returns false when the app should exit.
    fn on_action(&mut self, action: Action) -> bool {
        match self.screen {
            Screen::Start => match action {
                Action::Quit => return false,
                Action::Left | Action::Right | Action::Up | Action::Down => {
                    self.start_variant = match self.start_variant {
                        Variant::A => Variant::B,
                        Variant::B => Variant::A,
                    };
                }
                Action::Tap => self.start_round(),
                _ => {}
            },
            Screen::Playing => match action {
                Action::Pause => {
                    self.user_paused = !self.user_paused;
                    self.sync_pause();
                }
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                    self.sync_pause();
                }
                _ if self.user_paused => {}
                Action::Up | Action::Down | Action::Left | Action::Right => self.hud.move_cursor(action),
                Action::Tap => self.tap(self.hud.cursor),
                Action::Item(slot) => self.use_item(slot),
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::StartScreen,
                        QuitOption::StartScreen => QuitOption::Exit,
                        QuitOption::Exit => QuitOption::Resume,
                    };
                }
                Action::Up | Action::Left => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Exit,
                        QuitOption::StartScreen => QuitOption::Resume,
                        QuitOption::Exit => QuitOption::StartScreen,
                    };
                }
                Action::Tap => match self.quit_selected {
                    QuitOption::Resume => {
                        self.screen = Screen::Playing;
                        self.sync_pause();
                    }
                    QuitOption::StartScreen => {
                        log::info!("round abandoned at score {}", self.round.score());
                        self.close_round();
                        self.screen = Screen::Start;
                    }
                    QuitOption::Exit => {
                        self.close_round();
                        return false;
                    }
                },
                Action::Pause | Action::Quit => {
                    self.screen = Screen::Playing;
                    self.sync_pause();
                }
                _ => {}
            },
            Screen::Results => match action {
                Action::Quit => return false,
                Action::Restart => self.start_round(),
                Action::Tap => self.screen = Screen::Start,
                _ => {}
            },
        }
        true
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        let mut last_frame = Instant::now();
        loop {
            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame);
            last_frame = now;

            if self.screen == Screen::Playing {
                self.round.advance(dt);
                let events = self.round.drain_events();
                self.handle_events(&events);
            }
            if !self.round.is_paused() {
                self.hud.tick(dt);
            }

            let mut area = Rect::default();
            terminal.draw(|f| {
                area = f.area();
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.round,
                    &mut self.hud,
                    &self.theme,
                    self.session.all_time_combo(),
                    self.start_variant,
                    self.user_paused,
                    (self.screen == Screen::QuitMenu).then_some(self.quit_selected),
                    self.config.no_animation,
                    now,
                );
            })?;
            self.area = area;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if !self.on_action(key_to_action(key)) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.on_mouse(mouse),
                        _ => {}
                    }
                }
            }
        }
    }
}
