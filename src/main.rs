use anyhow::Result;
use clap::Parser;
use game_alarm_clock::{
    config::Args,
    controllers::{Field, FormAction, SettingsForm, button_pressed},
    output::{AudioEngine, ToneGraph},
    screen::ViewState,
    session::AlarmSession,
};
use macroquad::{prelude::*, text::measure_text};
use tokio::runtime::{Handle, Runtime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PANEL_WIDTH: f32 = 520.0;
const PANEL_HEIGHT: f32 = 380.0;
const TITLE_FONT_SIZE: u16 = 36;
const FIELD_FONT_SIZE: u16 = 40;
const COUNTDOWN_FONT_SIZE: u16 = 96;
const BODY_FONT_SIZE: u16 = 22;

const AMBER: Color = Color {
    r: 0.98,
    g: 0.66,
    b: 0.12,
    a: 1.0,
};
const AMBER_DIM: Color = Color {
    r: 0.78,
    g: 0.52,
    b: 0.08,
    a: 0.4,
};
const BACKGROUND: Color = Color {
    r: 0.02,
    g: 0.02,
    b: 0.02,
    a: 1.0,
};
const ALARM_RED: Color = Color {
    r: 0.72,
    g: 0.04,
    b: 0.04,
    a: 1.0,
};
const PANEL_FILL: Color = Color {
    r: 0.05,
    g: 0.03,
    b: 0.02,
    a: 0.85,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let runtime = Runtime::new()?;
    let handle = runtime.handle().clone();
    macroquad::Window::from_config(window_conf(&args), run(args, handle));
    Ok(())
}

fn window_conf(args: &Args) -> Conf {
    Conf {
        window_title: "Game Alarm Clock".into(),
        fullscreen: false,
        sample_count: 1,
        window_width: args.width as i32,
        window_height: args.height as i32,
        window_resizable: true,
        high_dpi: false,
        ..Default::default()
    }
}

async fn run(args: Args, runtime: Handle) {
    let graph = ToneGraph::new(args.waveform, args.base_volume()).shared();
    let _audio = match AudioEngine::start(graph.clone()) {
        Ok(engine) => Some(engine),
        Err(err) => {
            warn!("audio output unavailable: {err:#}");
            if let Ok(mut guard) = graph.lock() {
                guard.close();
            }
            None
        }
    };

    let (mut session, mut timer_events) =
        AlarmSession::new(runtime, graph, args.session_settings());
    let mut form = SettingsForm::new(args.preset());
    info!(waveform = args.waveform.label(), "ready");

    loop {
        let mouse = mouse_position_vec();
        let clicked = is_mouse_button_pressed(MouseButton::Left);
        if clicked || get_last_key_pressed().is_some() {
            session.user_gesture();
        }
        session.set_viewport(screen_width(), screen_height());
        session.pump(&mut timer_events);

        let layout = SettingsLayout::compute();
        match session.view() {
            ViewState::Settings => handle_settings(&mut session, &mut form, &layout, mouse, clicked),
            ViewState::Countdown => {}
            ViewState::Alarming => {
                if button_pressed(
                    session.button_position(),
                    session.button_size(),
                    mouse,
                    clicked,
                ) {
                    session.tap();
                }
            }
        }

        draw_scene(&session, &form, &layout);
        next_frame().await;
    }
}

fn mouse_position_vec() -> Vec2 {
    let (x, y) = mouse_position();
    vec2(x, y)
}

struct SettingsLayout {
    panel: Rect,
    hours: Rect,
    minutes: Rect,
    arm_button: Rect,
    notice: Rect,
    notice_ok: Rect,
}

impl SettingsLayout {
    fn compute() -> Self {
        let panel = centered_rect(PANEL_WIDTH, PANEL_HEIGHT);
        let field_w = 180.0;
        let field_h = 70.0;
        let gap = 40.0;
        let fields_x = panel.x + (panel.w - field_w * 2.0 - gap) * 0.5;
        let fields_y = panel.y + 110.0;
        let hours = Rect::new(fields_x, fields_y, field_w, field_h);
        let minutes = Rect::new(fields_x + field_w + gap, fields_y, field_w, field_h);
        let arm_button = Rect::new(panel.x + panel.w * 0.5 - 120.0, fields_y + 120.0, 240.0, 56.0);
        let notice = centered_rect(460.0, 180.0);
        let notice_ok = Rect::new(notice.x + notice.w * 0.5 - 60.0, notice.y + 110.0, 120.0, 44.0);
        Self {
            panel,
            hours,
            minutes,
            arm_button,
            notice,
            notice_ok,
        }
    }
}

fn centered_rect(w: f32, h: f32) -> Rect {
    Rect::new(
        (screen_width() - w) * 0.5,
        (screen_height() - h) * 0.5,
        w,
        h,
    )
}

fn handle_settings(
    session: &mut AlarmSession,
    form: &mut SettingsForm,
    layout: &SettingsLayout,
    mouse: Vec2,
    clicked: bool,
) {
    if session.notice().is_some() {
        let confirmed = clicked && layout.notice_ok.contains(mouse);
        if confirmed || is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::Escape) {
            session.dismiss_notice();
        }
        // Swallow typed characters so they do not leak into a field.
        while get_char_pressed().is_some() {}
        return;
    }

    if clicked {
        if layout.hours.contains(mouse) {
            form.set_focus(Field::Hours);
        } else if layout.minutes.contains(mouse) {
            form.set_focus(Field::Minutes);
        }
    }
    let submitted = form.poll() == FormAction::Submit;
    if submitted || (clicked && layout.arm_button.contains(mouse)) {
        // Rejections only change the status line.
        let _ = session.arm(form.config());
    }
}

fn draw_scene(session: &AlarmSession, form: &SettingsForm, layout: &SettingsLayout) {
    let background = if session.screen().alarm_background() {
        ALARM_RED
    } else {
        BACKGROUND
    };
    clear_background(background);

    match session.view() {
        ViewState::Settings => draw_settings(session, form, layout),
        ViewState::Countdown => draw_countdown(session),
        ViewState::Alarming => draw_alarm(session),
    }

    if let Some(message) = session.notice() {
        draw_notice(message, layout);
    }
}

fn draw_settings(session: &AlarmSession, form: &SettingsForm, layout: &SettingsLayout) {
    draw_section(&layout.panel, ViewState::Settings.title());
    for (field, rect) in [(Field::Hours, layout.hours), (Field::Minutes, layout.minutes)] {
        let focused = form.focus() == field;
        draw_rounded_rect(rect, 8.0, Color::new(0.02, 0.02, 0.02, 1.0));
        draw_rounded_rect_lines(rect, 8.0, if focused { AMBER } else { AMBER_DIM });
        let text = form.text(field);
        let shown = if text.is_empty() { "0" } else { text };
        draw_centered_text(shown, rect, FIELD_FONT_SIZE, AMBER);
        draw_text_ex(
            field.label(),
            rect.x,
            rect.y - 8.0,
            TextParams {
                font_size: 16,
                color: AMBER_DIM,
                ..Default::default()
            },
        );
    }

    draw_rounded_rect(layout.arm_button, 10.0, AMBER);
    draw_centered_text("SET ALARM", layout.arm_button, 28, BACKGROUND);

    let status_rect = Rect::new(
        layout.panel.x,
        layout.arm_button.y + layout.arm_button.h + 16.0,
        layout.panel.w,
        30.0,
    );
    draw_centered_text(session.status(), status_rect, BODY_FONT_SIZE, AMBER);
}

fn draw_countdown(session: &AlarmSession) {
    let panel = centered_rect(PANEL_WIDTH, 260.0);
    draw_section(&panel, ViewState::Countdown.title());
    let digits = Rect::new(panel.x, panel.y + 30.0, panel.w, 120.0);
    draw_centered_text(session.countdown_text(), digits, COUNTDOWN_FONT_SIZE, AMBER);
    let scheduled = Rect::new(panel.x, panel.y + 150.0, panel.w, 30.0);
    draw_centered_text(session.scheduled_text(), scheduled, BODY_FONT_SIZE, AMBER_DIM);
    let status = Rect::new(panel.x, panel.y + 200.0, panel.w, 30.0);
    draw_centered_text(session.status(), status, BODY_FONT_SIZE, AMBER);
}

fn draw_alarm(session: &AlarmSession) {
    let header = Rect::new(0.0, 20.0, screen_width(), 50.0);
    draw_centered_text(ViewState::Alarming.title(), header, TITLE_FONT_SIZE, WHITE);
    let counter = Rect::new(0.0, 70.0, screen_width(), 40.0);
    draw_centered_text(&session.tap_indicator(), counter, 30, WHITE);

    let position = session.button_position();
    let size = session.button_size();
    let rect = Rect::new(position.x, position.y, size, size);
    draw_rounded_rect(rect, 14.0, AMBER);
    draw_rounded_rect_lines(rect, 14.0, WHITE);
    draw_centered_text("STOP", rect, 32, BACKGROUND);
}

fn draw_notice(message: &str, layout: &SettingsLayout) {
    draw_rectangle(
        0.0,
        0.0,
        screen_width(),
        screen_height(),
        Color::new(0.0, 0.0, 0.0, 0.6),
    );
    let rect = layout.notice;
    draw_rounded_rect(rect, 12.0, PANEL_FILL);
    draw_rounded_rect_lines(rect, 12.0, AMBER);
    let text_rect = Rect::new(rect.x, rect.y + 30.0, rect.w, 50.0);
    draw_centered_text(message, text_rect, 24, AMBER);
    draw_rounded_rect(layout.notice_ok, 8.0, AMBER);
    draw_centered_text("OK", layout.notice_ok, 24, BACKGROUND);
}

fn draw_section(rect: &Rect, label: &str) {
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, PANEL_FILL);
    draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, AMBER);
    draw_text_ex(
        label,
        rect.x + 6.0,
        rect.y - 8.0,
        TextParams {
            font_size: 22,
            color: AMBER,
            ..Default::default()
        },
    );
}

/// Corner arc centers, clockwise from the top left.
fn corner_centers(rect: Rect, radius: f32) -> [Vec2; 4] {
    let inner = Rect::new(
        rect.x + radius,
        rect.y + radius,
        rect.w - 2.0 * radius,
        rect.h - 2.0 * radius,
    );
    [
        inner.point(),
        vec2(inner.right(), inner.top()),
        vec2(inner.right(), inner.bottom()),
        vec2(inner.left(), inner.bottom()),
    ]
}

fn draw_rounded_rect(rect: Rect, radius: f32, color: Color) {
    let radius = radius.min(rect.w.min(rect.h) * 0.5);
    let span = 2.0 * radius;
    draw_rectangle(rect.x + radius, rect.y, rect.w - span, rect.h, color);
    draw_rectangle(rect.x, rect.y + radius, rect.w, rect.h - span, color);
    for center in corner_centers(rect, radius) {
        draw_circle(center.x, center.y, radius, color);
    }
}

fn draw_rounded_rect_lines(rect: Rect, radius: f32, color: Color) {
    let radius = radius.min(rect.w.min(rect.h) * 0.5);
    let [top_left, top_right, bottom_right, bottom_left] = corner_centers(rect, radius);
    let bottom = rect.y + rect.h;
    let right = rect.x + rect.w;

    draw_line(top_left.x, rect.y, top_right.x, rect.y, 1.0, color);
    draw_line(bottom_left.x, bottom, bottom_right.x, bottom, 1.0, color);
    draw_line(rect.x, top_left.y, rect.x, bottom_left.y, 1.0, color);
    draw_line(right, top_right.y, right, bottom_right.y, 1.0, color);

    let pi = std::f32::consts::PI;
    draw_corner_arc(top_left, pi, 1.5 * pi, radius, color);
    draw_corner_arc(top_right, 1.5 * pi, 2.0 * pi, radius, color);
    draw_corner_arc(bottom_right, 0.0, 0.5 * pi, radius, color);
    draw_corner_arc(bottom_left, 0.5 * pi, pi, radius, color);
}

fn draw_corner_arc(center: Vec2, start: f32, end: f32, radius: f32, color: Color) {
    let steps = 10;
    let point = |angle: f32| center + vec2(angle.cos(), angle.sin()) * radius;
    let mut prev = point(start);
    for idx in 1..=steps {
        let next = point(start + (end - start) * (idx as f32 / steps as f32));
        draw_line(prev.x, prev.y, next.x, next.y, 1.0, color);
        prev = next;
    }
}

fn draw_centered_text(text: &str, rect: Rect, size: u16, color: Color) {
    let measure = measure_text(text, None, size, 1.0);
    let x = rect.x + rect.w * 0.5 - measure.width * 0.5;
    let y = rect.y + rect.h * 0.5 + measure.height * 0.5;
    draw_text_ex(
        text,
        x,
        y,
        TextParams {
            font_size: size,
            color,
            ..Default::default()
        },
    );
}
