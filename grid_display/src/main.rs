// main.rs - Desktop viewer for the distributed Game of Life
//
// Runs a ring with every generation aggregated and replays the frames.
// All simulation happens in conway_ring; this is only an observer.

use eframe::egui;
use egui::{Color32, Rect, Stroke, Vec2};
use std::time::{Duration, Instant};

use conway_ring::{Aggregation, GlobalGrid, SimConfig, Simulation, Trajectory, patterns};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("conway_ring=info")),
        )
        .init();

    let runtime = tokio::runtime::Runtime::new()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 950.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ring Game of Life",
        options,
        Box::new(move |_cc| Box::new(RingViewer::new(runtime))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

struct RingViewer {
    config: SimConfig,
    frames: Vec<(u64, GlobalGrid)>,
    rows_per_rank: usize,
    current: usize,
    is_running: bool,
    last_update: Instant,
    update_interval: Duration,
    live_color: Color32,
    dead_color: Color32,
    shade_slabs: bool,
    selected_pattern: usize,
    status: String,
    runtime: tokio::runtime::Runtime,
}

impl RingViewer {
    fn new(runtime: tokio::runtime::Runtime) -> Self {
        let mut viewer = Self {
            config: SimConfig::default(),
            frames: Vec::new(),
            rows_per_rank: 1,
            current: 0,
            is_running: false,
            last_update: Instant::now(),
            update_interval: Duration::from_millis(200),
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
            shade_slabs: true,
            selected_pattern: 0,
            status: String::new(),
            runtime,
        };
        viewer.simulate();
        viewer
    }

    /// Reruns the whole ring with the current settings.
    fn simulate(&mut self) {
        self.is_running = false;
        self.current = 0;
        self.config.aggregation = Aggregation::EveryGeneration;
        self.config.pattern = patterns::PATTERNS[self.selected_pattern].name.to_string();

        let outcome: conway_ring::Result<Trajectory> =
            self.config.validate().map_err(Into::into).and_then(|()| {
                let seed = self.config.build_seed()?;
                let mut trajectory = Trajectory::new();
                let simulation = Simulation::from_config(&self.config);
                self.runtime.block_on(simulation.run(&seed, &mut trajectory))?;
                Ok(trajectory)
            });

        match outcome {
            Ok(trajectory) => {
                self.frames = trajectory.into_frames();
                self.rows_per_rank = self.config.dimension / self.config.processes;
                self.status = format!(
                    "{} ranks x {} rows, {} generations",
                    self.config.processes,
                    self.config.dimension / self.config.processes,
                    self.config.iterations
                );
            }
            Err(error) => {
                tracing::warn!(%error, "simulation rejected");
                self.frames.clear();
                self.status = error.to_string();
            }
        }
    }

    fn frame(&self) -> Option<&(u64, GlobalGrid)> {
        self.frames.get(self.current)
    }
}

impl eframe::App for RingViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Auto-advance if running
        if self.is_running && self.last_update.elapsed() >= self.update_interval {
            if self.current + 1 < self.frames.len() {
                self.current += 1;
            } else {
                self.is_running = false;
            }
            self.last_update = Instant::now();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Ring Game of Life (Row Slabs per Rank)");

            // Ring parameters
            ui.horizontal(|ui| {
                ui.label("Dimension:");
                ui.add(egui::DragValue::new(&mut self.config.dimension).clamp_range(1..=128));
                ui.label("Ranks:");
                ui.add(egui::DragValue::new(&mut self.config.processes).clamp_range(1..=128));
                ui.label("Generations:");
                ui.add(egui::DragValue::new(&mut self.config.iterations).clamp_range(1..=1000));

                ui.separator();

                ui.label("Pattern:");
                egui::ComboBox::from_id_source("pattern_selector")
                    .selected_text(patterns::PATTERNS[self.selected_pattern].name)
                    .show_ui(ui, |ui| {
                        for (i, pattern) in patterns::PATTERNS.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_pattern, i, pattern.name);
                        }
                    });

                if ui.button("Run Ring").clicked() {
                    self.simulate();
                }
            });

            ui.separator();

            // Playback controls
            ui.horizontal(|ui| {
                let button_text = if self.is_running { "⏸ Pause" } else { "▶ Play" };
                if ui.button(button_text).clicked() {
                    self.is_running = !self.is_running;
                    if self.is_running {
                        self.last_update = Instant::now();
                    }
                }

                if ui.button("⏮ Seed").clicked() {
                    self.is_running = false;
                    self.current = 0;
                }

                let last = self.frames.len().saturating_sub(1);
                ui.add(egui::Slider::new(&mut self.current, 0..=last).text("frame"));

                ui.separator();

                let mut speed = 1000.0 / self.update_interval.as_millis() as f32;
                if ui.add(egui::Slider::new(&mut speed, 0.5..=60.0).suffix(" gen/sec")).changed() {
                    self.update_interval = Duration::from_millis((1000.0 / speed) as u64);
                }
            });

            ui.horizontal(|ui| {
                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);
                ui.checkbox(&mut self.shade_slabs, "Shade rank slabs");
            });

            ui.separator();
            ui.label(self.status.as_str());

            let Some((generation, grid)) = self.frame() else {
                return;
            };

            ui.label(format!("Generation: {generation}"));
            ui.separator();

            // Draw the grid
            let dimension = grid.dimension();
            let spacing = 0.5;
            let box_size = (750.0 / dimension as f32 - spacing).clamp(2.0, 24.0);

            let start_pos = ui.cursor().min;
            let total_size = Vec2::splat((box_size + spacing) * dimension as f32 - spacing);
            let (_response, painter) = ui.allocate_painter(total_size, egui::Sense::hover());

            painter.rect_filled(
                Rect::from_min_size(start_pos, total_size),
                0.0,
                Color32::BLACK,
            );

            for row in 0..dimension {
                let odd_rank = (row / self.rows_per_rank) % 2 == 1;
                for col in 0..dimension {
                    let x = start_pos.x + col as f32 * (box_size + spacing);
                    let y = start_pos.y + row as f32 * (box_size + spacing);
                    let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));

                    let cell_color = if grid.get(row, col) {
                        self.live_color
                    } else if self.shade_slabs && odd_rank {
                        lighten(self.dead_color)
                    } else {
                        self.dead_color
                    };

                    painter.rect_filled(rect, 1.0, cell_color);
                    painter.rect_stroke(rect, 1.0, Stroke::new(0.2, Color32::from_gray(60)));
                }
            }

            ui.separator();

            let live_cells = grid.live_count();
            let total = dimension * dimension;
            ui.horizontal(|ui| {
                ui.label(format!("Live cells: {live_cells}"));
                ui.label(format!("Dead cells: {}", total - live_cells));
                ui.label(format!("Population: {:.1}%", live_cells as f32 / total as f32 * 100.0));
            });
        });

        if self.is_running {
            ctx.request_repaint();
        }
    }
}

/// Slightly brighter shade for alternate rank slabs.
fn lighten(color: Color32) -> Color32 {
    let [r, g, b, _] = color.to_array();
    Color32::from_rgb(r.saturating_add(25), g.saturating_add(25), b.saturating_add(25))
}
