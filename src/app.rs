use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use eframe::egui::{
    Align2, Color32, FontData, FontDefinitions, FontFamily, FontId, Key, RichText, TextureHandle,
    TextureOptions,
};
use image::RgbaImage;
use rand::seq::SliceRandom;

use crate::audio::AudioPlayer;
use crate::fetch::{SpeciesEntry, SpeciesSource};
use crate::game::{GameSummary, Outcome, Phase, Session, SessionEvent};
use crate::signal::{Signal, SignalLink};
use crate::silhouette::SilhouetteRenderer;

const WINDOW_TITLE: &str = "Sombra";
const INPUT_LIMIT: usize = 20;

/// Session parameters resolved from the command line.
#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    pub rounds: u32,
    pub guess_time: Duration,
}

/// What the shell hands back to `main` once the window closes.
#[derive(Default)]
struct ShellOutcome {
    summary: Option<GameSummary>,
    fatal: Option<anyhow::Error>,
}

/// Run the window shell to completion.
///
/// Blocks until the window closes, then returns the last finished (or
/// aborted) session's summary, or `None` when the window was closed from
/// the title screen. Fatal round errors (network, markup) close the
/// window and propagate from here.
pub fn run(
    config: AppConfig,
    background_frames: Vec<RgbaImage>,
    font: Vec<u8>,
    audio: AudioPlayer,
    link: SignalLink,
    source: Box<dyn SpeciesSource>,
) -> Result<Option<GameSummary>> {
    let (width, height) = background_frames
        .first()
        .map(|frame| frame.dimensions())
        .context("Background animation has no frames")?;

    let outcome = Arc::new(Mutex::new(ShellOutcome::default()));
    let outcome_in = outcome.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width as f32, height as f32])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| {
            install_display_font(&cc.egui_ctx, font);
            Ok(Box::new(QuizApp::new(
                config,
                background_frames,
                audio,
                link,
                source,
                outcome_in,
            )))
        }),
    )
    .map_err(|err| anyhow!("Window shell failed: {err}"))?;

    let mut outcome = outcome.lock().unwrap_or_else(|poison| poison.into_inner());
    if let Some(err) = outcome.fatal.take() {
        return Err(err);
    }
    Ok(outcome.summary.take())
}

enum Screen {
    Title,
    Playing(Box<PlayState>),
    GameOver(GameSummary),
}

struct PlayState {
    session: Session,
    silhouette: TextureHandle,
    sprite: TextureHandle,
    input: String,
    result_text: String,
}

struct LoadedRound {
    entry: SpeciesEntry,
    silhouette: TextureHandle,
    sprite: TextureHandle,
}

struct QuizApp {
    config: AppConfig,
    audio: AudioPlayer,
    link: SignalLink,
    source: Box<dyn SpeciesSource>,
    renderer: SilhouetteRenderer,
    species: Vec<SpeciesEntry>,
    background: BackgroundAnimation,
    screen: Screen,
    outcome: Arc<Mutex<ShellOutcome>>,
}

impl QuizApp {
    fn new(
        config: AppConfig,
        background_frames: Vec<RgbaImage>,
        audio: AudioPlayer,
        link: SignalLink,
        source: Box<dyn SpeciesSource>,
        outcome: Arc<Mutex<ShellOutcome>>,
    ) -> Self {
        Self {
            config,
            audio,
            link,
            source,
            renderer: SilhouetteRenderer::new(),
            species: Vec::new(),
            background: BackgroundAnimation::new(background_frames),
            screen: Screen::Title,
            outcome,
        }
    }

    fn title_screen(&mut self, ctx: &egui::Context) -> Screen {
        egui::Area::new(egui::Id::new("title"))
            .anchor(Align2::CENTER_CENTER, [0.0, -40.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new(WINDOW_TITLE)
                            .font(display_font(44.0))
                            .color(Color32::BLACK),
                    );
                    ui.add_space(8.0);
                    ui.label(
                        RichText::new("Name the species hiding in the silhouette")
                            .size(20.0)
                            .color(Color32::BLACK),
                    );
                    ui.add_space(40.0);
                    ui.label(
                        RichText::new("Press Enter to start")
                            .size(18.0)
                            .color(Color32::DARK_GRAY),
                    );
                });
            });

        egui::Area::new(egui::Id::new("peripheral-status"))
            .anchor(Align2::RIGHT_BOTTOM, [-20.0, -20.0])
            .show(ctx, |ui| {
                let label = if self.link.is_connected() {
                    "Peripheral: connected"
                } else {
                    "Peripheral: not connected"
                };
                ui.label(RichText::new(label).size(14.0).color(Color32::DARK_GRAY));
            });

        if ctx.input(|i| i.key_pressed(Key::Enter)) {
            return match self.start_session(ctx) {
                Ok(state) => Screen::Playing(state),
                Err(err) => self.fail(ctx, err),
            };
        }

        Screen::Title
    }

    fn start_session(&mut self, ctx: &egui::Context) -> Result<Box<PlayState>> {
        if self.species.is_empty() {
            self.species = self.source.fetch_index()?;
        }

        let round = self.load_round(ctx)?;
        let session = Session::new(
            round.entry.name.clone(),
            self.config.rounds,
            self.config.guess_time,
            Instant::now(),
        );
        tracing::info!("Session started: {} rounds", self.config.rounds);

        Ok(Box::new(PlayState {
            session,
            silhouette: round.silhouette,
            sprite: round.sprite,
            input: String::new(),
            result_text: String::new(),
        }))
    }

    /// Pick the next species, download its sprite and prepare both stage
    /// textures. Blocks the frame loop for the duration of the fetch.
    fn load_round(&mut self, ctx: &egui::Context) -> Result<LoadedRound> {
        let entry = self
            .species
            .choose(&mut rand::thread_rng())
            .context("Species index is empty")?
            .clone();
        tracing::debug!("Round target: {}", entry.name);

        let started = Instant::now();
        let sprite = self.source.fetch_sprite(&entry)?;
        let silhouette = self.renderer.render(&sprite);
        tracing::debug!(
            "Prepared {}x{} round image in {:.1}ms",
            sprite.width(),
            sprite.height(),
            started.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(LoadedRound {
            entry,
            silhouette: upload_texture(ctx, "silhouette", &silhouette),
            sprite: upload_texture(ctx, "sprite", &sprite),
        })
    }

    fn playing_screen(
        &mut self,
        ctx: &egui::Context,
        mut state: Box<PlayState>,
        now: Instant,
    ) -> Screen {
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            return self.finish(state.session.summary());
        }

        for event in state.session.tick(now) {
            match event {
                SessionEvent::TimeExpired => {
                    state.result_text =
                        format!("Time's Up! It was {}", title_case(state.session.target()));
                    state.input.clear();
                    self.audio.play_incorrect();
                }
                SessionEvent::RaiseSignal => self.link.send(Signal::Raise),
                SessionEvent::LowerSignal => self.link.send(Signal::Lower),
                SessionEvent::AdvanceRound => match self.load_round(ctx) {
                    Ok(round) => {
                        state
                            .session
                            .begin_round(round.entry.name.clone(), Instant::now());
                        state.silhouette = round.silhouette;
                        state.sprite = round.sprite;
                        state.result_text.clear();
                        state.input.clear();
                    }
                    Err(err) => return self.fail(ctx, err),
                },
                SessionEvent::Finished(summary) => return self.finish(summary),
            }
        }

        match state.session.phase() {
            Phase::Guessing { .. } => {
                draw_stage(ctx, &state.silhouette);
                self.guess_box(ctx, &mut state, now);
                draw_countdown(ctx, state.session.remaining(now));
            }
            Phase::ShowingResult { .. } | Phase::Transitioning { .. } => {
                draw_stage(ctx, &state.sprite);
                draw_species_name(ctx, state.session.target());
            }
            Phase::Finished => {}
        }

        if !state.result_text.is_empty() {
            draw_result_banner(ctx, &state.result_text);
        }
        draw_hud(ctx, &state.session);

        Screen::Playing(state)
    }

    fn guess_box(&mut self, ctx: &egui::Context, state: &mut PlayState, now: Instant) {
        egui::Area::new(egui::Id::new("guess-box"))
            .anchor(Align2::CENTER_BOTTOM, [0.0, -60.0])
            .show(ctx, |ui| {
                let edit = egui::TextEdit::singleline(&mut state.input)
                    .char_limit(INPUT_LIMIT)
                    .desired_width(300.0)
                    .font(egui::TextStyle::Heading);
                let response = ui.add(edit);
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
                response.request_focus();
                if submitted {
                    self.submit_guess(state, now);
                }
            });
    }

    fn submit_guess(&mut self, state: &mut PlayState, now: Instant) {
        let Some(outcome) = state.session.submit(&state.input, now) else {
            return;
        };
        match outcome {
            Outcome::Correct => {
                state.result_text = "Correct!".to_string();
                self.audio.play_correct();
            }
            Outcome::Incorrect | Outcome::TimedOut => {
                state.result_text = format!("It was {}", title_case(state.session.target()));
                state.input.clear();
                self.audio.play_incorrect();
            }
        }
    }

    fn game_over_screen(&mut self, ctx: &egui::Context, summary: GameSummary) -> Screen {
        egui::Area::new(egui::Id::new("game-over"))
            .anchor(Align2::CENTER_CENTER, [0.0, -40.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("Game Over!")
                            .font(display_font(44.0))
                            .color(Color32::BLACK),
                    );
                    ui.add_space(16.0);
                    ui.label(
                        RichText::new(format!("Score: {summary}"))
                            .font(display_font(32.0))
                            .color(Color32::BLACK),
                    );
                    ui.add_space(40.0);
                    ui.label(
                        RichText::new("Press Enter to return to title, Escape to quit")
                            .size(18.0)
                            .color(Color32::DARK_GRAY),
                    );
                });
            });

        if ctx.input(|i| i.key_pressed(Key::Enter)) {
            return Screen::Title;
        }
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        Screen::GameOver(summary)
    }

    fn finish(&mut self, summary: GameSummary) -> Screen {
        tracing::info!(
            "Session over after {} rounds: {summary}",
            summary.rounds_played
        );
        if let Ok(mut outcome) = self.outcome.lock() {
            outcome.summary = Some(summary);
        }
        Screen::GameOver(summary)
    }

    /// Record a fatal error for `run` to propagate and close the window.
    fn fail(&mut self, ctx: &egui::Context, err: anyhow::Error) -> Screen {
        tracing::error!("Fatal error: {err:#}");
        if let Ok(mut outcome) = self.outcome.lock() {
            outcome.fatal = Some(err);
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        Screen::Title
    }
}

impl eframe::App for QuizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                if matches!(self.screen, Screen::Playing(_)) {
                    self.background.paint(ctx, ui.painter(), rect);
                } else {
                    ui.painter().rect_filled(rect, 0.0, Color32::WHITE);
                }
            });

        let screen = std::mem::replace(&mut self.screen, Screen::Title);
        self.screen = match screen {
            Screen::Title => self.title_screen(ctx),
            Screen::Playing(state) => self.playing_screen(ctx, state, now),
            Screen::GameOver(summary) => self.game_over_screen(ctx, summary),
        };

        // Keep the countdown and the animation moving without input.
        ctx.request_repaint();
    }
}

/// Looping animation painted behind the play screen, advancing one frame
/// per repaint. Textures are uploaded on first use.
struct BackgroundAnimation {
    frames: Vec<RgbaImage>,
    textures: Vec<TextureHandle>,
    index: usize,
}

impl BackgroundAnimation {
    fn new(frames: Vec<RgbaImage>) -> Self {
        Self {
            frames,
            textures: Vec::new(),
            index: 0,
        }
    }

    fn paint(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: egui::Rect) {
        if self.textures.is_empty() {
            self.textures = self
                .frames
                .iter()
                .enumerate()
                .map(|(i, frame)| upload_texture(ctx, &format!("background-{i}"), frame))
                .collect();
        }
        let Some(texture) = self.textures.get(self.index) else {
            return;
        };
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(texture.id(), rect, uv, Color32::WHITE);
        self.index = (self.index + 1) % self.textures.len();
    }
}

fn draw_stage(ctx: &egui::Context, texture: &TextureHandle) {
    egui::Area::new(egui::Id::new("stage"))
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.image(texture);
        });
}

fn draw_species_name(ctx: &egui::Context, name: &str) {
    egui::Area::new(egui::Id::new("species-name"))
        .anchor(Align2::CENTER_TOP, [0.0, 80.0])
        .show(ctx, |ui| {
            ui.label(
                RichText::new(title_case(name))
                    .font(display_font(36.0))
                    .color(Color32::BLACK),
            );
        });
}

fn draw_result_banner(ctx: &egui::Context, text: &str) {
    egui::Area::new(egui::Id::new("result"))
        .anchor(Align2::CENTER_TOP, [0.0, 150.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(text).size(22.0).color(Color32::BLACK));
        });
}

fn draw_hud(ctx: &egui::Context, session: &Session) {
    egui::Area::new(egui::Id::new("points"))
        .anchor(Align2::LEFT_TOP, [40.0, 40.0])
        .show(ctx, |ui| {
            ui.label(hud_text(format!("Points: {}", session.score())));
        });

    egui::Area::new(egui::Id::new("round"))
        .anchor(Align2::RIGHT_TOP, [-40.0, 40.0])
        .show(ctx, |ui| {
            ui.label(hud_text(format!(
                "Round: {} / {}",
                session.round(),
                session.total_rounds()
            )));
        });
}

fn draw_countdown(ctx: &egui::Context, remaining: Duration) {
    egui::Area::new(egui::Id::new("countdown"))
        .anchor(Align2::LEFT_BOTTOM, [20.0, -30.0])
        .show(ctx, |ui| {
            ui.label(hud_text(format!("Time: {:.1}s", remaining.as_secs_f32())));
        });
}

fn hud_text(text: String) -> RichText {
    RichText::new(text).size(20.0).color(Color32::BLACK)
}

/// Uppercase the first letter of each word for display.
fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn upload_texture(ctx: &egui::Context, name: &str, image: &RgbaImage) -> TextureHandle {
    let size = [image.width() as usize, image.height() as usize];
    let pixels = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
    ctx.load_texture(name, pixels, TextureOptions::NEAREST)
}

fn install_display_font(ctx: &egui::Context, bytes: Vec<u8>) {
    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert("display".to_owned(), FontData::from_owned(bytes));
    fonts
        .families
        .insert(FontFamily::Name("display".into()), vec!["display".to_owned()]);
    ctx.set_fonts(fonts);
}

fn display_font(size: f32) -> FontId {
    FontId::new(size, FontFamily::Name("display".into()))
}

#[cfg(test)]
mod tests {
    use super::title_case;

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("pikachu"), "Pikachu");
        assert_eq!(title_case("mr. mime"), "Mr. Mime");
        assert_eq!(title_case(""), "");
    }
}
