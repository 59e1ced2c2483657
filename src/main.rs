use arboard::Clipboard;
use gridnav::{ActionLog, Command, Config, Position, Session};
use log::{error, info, warn};
use macroquad::prelude::*;
use std::sync::OnceLock;

const PANEL_WIDTH: f32 = 280.0;

static CONFIG: OnceLock<Config> = OnceLock::new();

fn config() -> &'static Config {
    CONFIG.get_or_init(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        Config::load()
    })
}

fn window_conf() -> Conf {
    let config = config();
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: (config.grid.cols as f32 * config.grid.cell_size + PANEL_WIDTH) as i32,
        window_height: (config.grid.rows as f32 * config.grid.cell_size).max(420.0) as i32,
        ..Default::default()
    }
}

/// Front-end state: the session plus input/recording plumbing
struct App {
    session: Session,
    log: ActionLog,
    cell_size: f32,
    /// Sub-millisecond remainder of frame time not yet handed to the session
    pending_ms: f32,
}

impl App {
    fn new(session: Session, cell_size: f32) -> Self {
        App {
            session,
            log: ActionLog::new(),
            cell_size,
            pending_ms: 0.0,
        }
    }

    fn run(&mut self, command: Command) {
        if let Err(e) = self.log.execute(&mut self.session, command) {
            warn!("{}", e);
        }
    }

    /// Click: move agent. Shift+click: set target. Ctrl/Cmd+click: toggle obstacle.
    fn handle_click(&mut self, mouse_x: f32, mouse_y: f32) {
        let x = (mouse_x / self.cell_size).floor() as i32;
        let y = (mouse_y / self.cell_size).floor() as i32;
        if !self.session.grid().in_bounds(Position::new(x, y)) {
            return;
        }

        let shift = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
        let ctrl = is_key_down(KeyCode::LeftControl)
            || is_key_down(KeyCode::RightControl)
            || is_key_down(KeyCode::LeftSuper)
            || is_key_down(KeyCode::RightSuper);

        let command = if shift {
            Command::SetTarget { x, y }
        } else if ctrl {
            Command::ToggleObstacle { x, y }
        } else {
            Command::SetAgent { x, y }
        };
        self.run(command);
    }

    fn handle_keys(&mut self) {
        let sensor = self.session.config().sensor.clone();
        let playback = self.session.config().playback.clone();

        if is_key_pressed(KeyCode::Space) {
            if self.session.state().is_running() {
                self.run(Command::Pause);
            } else {
                self.run(Command::Start);
            }
        }
        if is_key_pressed(KeyCode::R) {
            self.run(Command::Reset);
        }
        if is_key_pressed(KeyCode::P) {
            self.run(Command::RecalculatePath);
        }
        if is_key_pressed(KeyCode::Up) {
            let range = self.session.sensor_range() + 1;
            if range <= sensor.max_range {
                self.run(Command::SetSensorRange { range });
            }
        }
        if is_key_pressed(KeyCode::Down) {
            let range = self.session.sensor_range() - 1;
            if range >= sensor.min_range {
                self.run(Command::SetSensorRange { range });
            }
        }
        if is_key_pressed(KeyCode::Right) {
            let delay_ms = self.session.step_delay_ms() + playback.delay_step_ms;
            if delay_ms <= playback.max_step_delay_ms {
                self.run(Command::SetStepDelay { delay_ms });
            }
        }
        if is_key_pressed(KeyCode::Left) {
            let delay_ms = self
                .session
                .step_delay_ms()
                .saturating_sub(playback.delay_step_ms);
            if delay_ms >= playback.min_step_delay_ms {
                self.run(Command::SetStepDelay { delay_ms });
            }
        }
        if is_key_pressed(KeyCode::C) {
            self.copy_to_clipboard();
        }
        if is_key_pressed(KeyCode::S) {
            self.save_log();
        }
    }

    /// Hand elapsed frame time to the session. Only logged while running,
    /// since idle time changes nothing.
    fn tick(&mut self, frame_secs: f32) {
        self.pending_ms += frame_secs * 1000.0;
        let elapsed_ms = self.pending_ms.floor();
        self.pending_ms -= elapsed_ms;
        if elapsed_ms < 1.0 {
            return;
        }

        let elapsed_ms = elapsed_ms as u64;
        if self.session.state().is_running() {
            self.run(Command::Advance { elapsed_ms });
        } else {
            self.session.advance(elapsed_ms);
        }
    }

    fn copy_to_clipboard(&self) {
        let layout = self.session.grid().to_layout_string();
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(layout) {
                    warn!("Failed to copy to clipboard: {}", e);
                } else {
                    info!("Grid layout copied to clipboard");
                    // Keep clipboard alive for a moment so clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => warn!("Failed to access clipboard: {}", e),
        }
    }

    fn save_log(&self) {
        let path = &self.session.config().logging.action_log_path;
        match self.log.save_to_file(path) {
            Ok(()) => info!("Action log saved to {} ({} commands)", path, self.log.len()),
            Err(e) => error!("Failed to save action log: {}", e),
        }
    }

    fn cell_center(&self, pos: Position) -> (f32, f32) {
        (
            (pos.x as f32 + 0.5) * self.cell_size,
            (pos.y as f32 + 0.5) * self.cell_size,
        )
    }

    fn draw(&self) {
        let visual = &self.session.config().visual;
        clear_background(Color::from_rgba(
            visual.background_r,
            visual.background_g,
            visual.background_b,
            255,
        ));

        let grid = self.session.grid();
        let size = self.cell_size;

        // Cells
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let px = x as f32 * size;
                let py = y as f32 * size;
                let color = if grid.is_obstacle(Position::new(x, y)) {
                    Color::from_rgba(220, 53, 69, 255)
                } else {
                    Color::from_rgba(248, 249, 250, 255)
                };
                draw_rectangle(px, py, size, size, color);
                if visual.show_grid_lines {
                    draw_rectangle_lines(px, py, size, size, 0.5, Color::from_rgba(233, 236, 239, 255));
                }
            }
        }

        // Sensor range
        let agent = self.session.agent_position();
        let (ax, ay) = self.cell_center(agent);
        draw_circle(
            ax,
            ay,
            self.session.sensor_range() as f32 * size,
            Color::from_rgba(0, 123, 255, 25),
        );

        // Path
        let path = self.session.path();
        for pair in path.windows(2) {
            let (x1, y1) = self.cell_center(pair[0]);
            let (x2, y2) = self.cell_center(pair[1]);
            draw_line(x1, y1, x2, y2, 3.0, Color::from_rgba(40, 167, 69, 255));
        }

        // Detected obstacles
        for detection in &self.session.reading().detections {
            draw_rectangle(
                detection.position.x as f32 * size,
                detection.position.y as f32 * size,
                size,
                size,
                Color::from_rgba(255, 193, 7, 153),
            );
        }

        // Target
        let (tx, ty) = self.cell_center(self.session.target());
        draw_circle(tx, ty, size * 0.4, Color::from_rgba(220, 53, 69, 255));

        // Agent and heading towards the next waypoint
        draw_circle(ax, ay, size * 0.4, Color::from_rgba(0, 123, 255, 255));
        if let Some(next) = self.session.next_waypoint() {
            let angle = ((next.y - agent.y) as f32).atan2((next.x - agent.x) as f32);
            draw_line(
                ax,
                ay,
                ax + angle.cos() * size * 0.3,
                ay + angle.sin() * size * 0.3,
                2.0,
                WHITE,
            );
        }

        self.draw_panel(grid.width() as f32 * size + 12.0);
    }

    fn draw_panel(&self, left: f32) {
        let stats = self.session.stats();
        let lines = [
            format!("State: {}", self.session.state().as_str()),
            format!("Path Length: {} steps", stats.path_length),
            format!("Obstacles Detected: {}", stats.obstacles_detected),
            format!("Time Elapsed: {:.1}s", stats.elapsed_secs()),
            format!("Path Efficiency: {}%", stats.efficiency),
            format!("Nodes Expanded: {}", stats.nodes_expanded),
            String::new(),
            format!("Sensor Range: {} cells", self.session.sensor_range()),
            format!("Speed: {}ms per step", self.session.step_delay_ms()),
            String::new(),
            "Click: move agent".to_string(),
            "Shift+Click: set target".to_string(),
            "Ctrl+Click: toggle obstacle".to_string(),
            "Space: start/pause".to_string(),
            "R: reset   P: recalculate".to_string(),
            "Up/Down: sensor range".to_string(),
            "Left/Right: speed".to_string(),
            "C: copy layout   S: save log".to_string(),
            "Esc: quit".to_string(),
        ];

        for (i, line) in lines.iter().enumerate() {
            draw_text(line, left, 24.0 + i as f32 * 20.0, 20.0, DARKGRAY);
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = config().clone();
    let cell_size = config.grid.cell_size;
    let enable_action_log = config.logging.enable_action_log;

    let session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!("Cannot start session: {}", e);
            return;
        }
    };
    let mut app = App::new(session, cell_size);

    loop {
        if is_mouse_button_pressed(MouseButton::Left) {
            let (mouse_x, mouse_y) = mouse_position();
            app.handle_click(mouse_x, mouse_y);
        }

        app.handle_keys();

        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        app.tick(get_frame_time());
        app.draw();

        next_frame().await
    }

    app.session.shutdown();
    if enable_action_log && !app.log.is_empty() {
        app.save_log();
        info!("{}", app.log.summary());
    }
}
