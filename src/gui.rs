// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! eframe window: renders [`MainView`] and turns widget events into [`Action`]s.
//!
//! Nothing here mutates the model directly. Each frame collects actions and dispatches them
//! after drawing. A dialog or message box disables the main view until it is closed.

use crate::controller::{Action, MainView, Notice, NoticeKind, TrackingState};
use crate::datetime::{beautify_tags, format_day, format_duration, format_time};
use crate::dialog::{DialogResult, FrameForm};
use crate::frame::FrameSource;
use crate::timer::RecurringTimer;
use crate::tree::NodeRef;
use chrono::Local;
use eframe::egui;
use std::time::{Duration, Instant};
use tracing::info;

/// Choices offered by the span selector.
const SPAN_CHOICES: [u32; 4] = [1, 7, 14, 30];

/// How many completion buttons to show under an entry.
const MAX_SUGGESTIONS: usize = 6;

fn span_label(days: u32) -> String {
    match days {
        1 => "Today".to_string(),
        n => format!("Last {} days", n),
    }
}

fn error_label(ui: &mut egui::Ui, message: impl Into<String>) {
    ui.colored_label(ui.visuals().error_fg_color, message.into());
}

pub struct FlubberApp<S: FrameSource> {
    view: MainView<S>,
    timer: RecurringTimer,
    dialog: Option<FrameForm>,
    maximized: bool,
}

impl<S: FrameSource> FlubberApp<S> {
    pub fn new(view: MainView<S>, poll_interval: Duration) -> Self {
        FlubberApp {
            view,
            timer: RecurringTimer::new(poll_interval, Instant::now()),
            dialog: None,
            maximized: false,
        }
    }

    fn status_text(&self) -> String {
        match self.view.state() {
            TrackingState::Idle => "Not tracking".to_string(),
            TrackingState::Tracking(c) => format!(
                "Tracking {}{} since {} ({})",
                c.project,
                beautify_tags(&c.tags),
                format_time(&c.start),
                format_duration(Local::now() - c.start)
            ),
        }
    }

    fn is_modal(&self) -> bool {
        self.dialog.is_some() || self.view.notice().is_some()
    }

    /// Keyboard shortcuts and window state.
    fn handle_window(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        if let Some(maximized) = ctx.input(|i| i.viewport().maximized) {
            self.maximized = maximized;
        }
        let quit = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Q);
        if ctx.input_mut(|i| i.consume_shortcut(&quit)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::F11)) {
            self.maximized = !self.maximized;
            ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(self.maximized));
        }
        if !self.is_modal() && ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            actions.push(Action::Reload);
        }
    }

    fn menu(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("Flubber", |ui| {
                if ui.button("Refresh").clicked() {
                    actions.push(Action::Reload);
                    ui.close_menu();
                }
                let mut maximized = self.maximized;
                if ui.checkbox(&mut maximized, "Maximize").changed() {
                    self.maximized = maximized;
                    ui.ctx()
                        .send_viewport_cmd(egui::ViewportCommand::Maximized(maximized));
                    ui.close_menu();
                }
                if ui.button("About").clicked() {
                    self.view.push_notice(Notice::info(
                        "About Flubber",
                        format!(
                            "Flubber {}\nA desktop front-end for the Watson time tracker.",
                            env!("CARGO_PKG_VERSION")
                        ),
                    ));
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn header(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            ui.strong(self.status_text());
        });
        ui.horizontal(|ui| {
            if self.view.is_tracking() {
                if ui.button("Stop").clicked() {
                    actions.push(Action::Stop);
                }
            } else if ui.button("Start…").clicked() {
                self.dialog = Some(self.view.start_form());
            }
            if ui.button("Add…").clicked() {
                self.dialog = Some(self.view.add_form(Local::now()));
            }
            let selected = self.view.tree().selected_count();
            let delete = egui::Button::new(format!("Delete selected ({})", selected));
            if ui.add_enabled(selected > 0, delete).clicked() {
                actions.push(Action::DeleteSelected);
            }
            if ui.button("Refresh").clicked() {
                actions.push(Action::Reload);
            }
            ui.separator();
            let current = self.view.span_days();
            egui::ComboBox::from_id_salt("span_days")
                .selected_text(span_label(current))
                .show_ui(ui, |ui| {
                    for days in SPAN_CHOICES {
                        if ui.selectable_label(current == days, span_label(days)).clicked()
                            && current != days
                        {
                            actions.push(Action::SetSpanDays(days));
                        }
                    }
                });
        });
    }

    fn tree(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let tree = self.view.tree();
        if tree.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label("No frames in this period.");
            });
            return;
        }
        let mut edit: Option<NodeRef> = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (d, day) in tree.days().iter().enumerate() {
                    let id = ui.make_persistent_id(("day", day.day));
                    egui::collapsing_header::CollapsingState::load_with_default_open(
                        ui.ctx(),
                        id,
                        true,
                    )
                    .show_header(ui, |ui| {
                        let mut checked = day.selected;
                        if ui.checkbox(&mut checked, "").changed() {
                            actions.push(Action::Toggle(NodeRef::Day(d)));
                        }
                        ui.strong(format_day(&day.day));
                        ui.label(format!("({})", format_duration(day.total)));
                    })
                    .body(|ui| {
                        egui::Grid::new(("frames", day.day))
                            .striped(true)
                            .num_columns(7)
                            .show(ui, |ui| {
                                for (i, node) in day.frames.iter().enumerate() {
                                    let mut checked = node.selected;
                                    if ui.checkbox(&mut checked, "").changed() {
                                        actions.push(Action::Toggle(NodeRef::Frame(d, i)));
                                    }
                                    ui.monospace(node.short_id.as_str());
                                    ui.label(node.frame.project.as_str());
                                    ui.label(beautify_tags(&node.frame.tags).trim_start().to_string());
                                    ui.label(format!(
                                        "{} – {}",
                                        format_time(&node.frame.start),
                                        format_time(&node.frame.stop)
                                    ));
                                    ui.label(format_duration(node.frame.duration()));
                                    if ui.small_button("Edit…").clicked() {
                                        edit = Some(NodeRef::Frame(d, i));
                                    }
                                    ui.end_row();
                                }
                            });
                    });
                }
            });
        if let Some(node) = edit {
            self.dialog = self.view.edit_form(node);
        }
    }

    fn dialog_window(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let Some(form) = self.dialog.as_mut() else {
            return;
        };
        let mut result = None;
        egui::Window::new(form.kind().title())
            .id(egui::Id::new("frame_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                result = form_ui(ui, form);
            });
        if let Some(result) = result {
            if let Some(form) = self.dialog.take() {
                if let Some(action) = Action::from_dialog(form.kind(), result) {
                    actions.push(action);
                }
            }
        }
    }

    fn notice_window(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.view.notice() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(notice.title.as_str())
            .id(egui::Id::new("notice"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let (label, color, button) = match notice.kind {
                    NoticeKind::Error => ("Error", ui.visuals().error_fg_color, "Close"),
                    NoticeKind::Info => ("Info", ui.visuals().text_color(), "OK"),
                };
                ui.colored_label(color, label);
                ui.label(notice.message.as_str());
                ui.add_space(8.0);
                let enter = ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));
                if ui.button(button).clicked() || enter {
                    dismissed = true;
                }
            });
        if dismissed {
            self.view.dismiss_notice();
        }
    }

    /// Draws one frame and dispatches whatever the user did.
    fn draw(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();
        if let Some(remaining) = self.timer.remaining(Instant::now()) {
            ctx.request_repaint_after(remaining);
        }
        if self.view.is_tracking() {
            ctx.request_repaint_after(Duration::from_secs(1));
        }
        self.handle_window(ctx, &mut actions);

        let enabled = !self.is_modal();
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| {
                self.menu(ui, &mut actions);
                self.header(ui, &mut actions);
            });
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| self.tree(ui, &mut actions));
        });
        if self.view.notice().is_some() {
            self.notice_window(ctx);
        } else {
            self.dialog_window(ctx, &mut actions);
        }

        self.dispatch_pass(actions, Instant::now());
    }

    /// Dispatches the actions collected in one pass. A due poll waits for a pass without
    /// actions: it may rebuild the tree that the actions' node positions point into.
    fn dispatch_pass(&mut self, actions: Vec<Action>, now: Instant) {
        if actions.is_empty() {
            if self.timer.fire_if_due(now) {
                let _ = self.view.dispatch(Action::Poll);
            }
            return;
        }
        for action in actions {
            let _ = self.view.dispatch(action);
        }
    }
}

/// Dialog body. Returns a result once OK or Cancel is pressed.
fn form_ui(ui: &mut egui::Ui, form: &mut FrameForm) -> Option<DialogResult> {
    let mut result = None;
    egui::Grid::new("frame_form")
        .num_columns(2)
        .spacing([10.0, 8.0])
        .show(ui, |ui| {
            ui.label("Project");
            let mut project = form.project().to_string();
            if ui.text_edit_singleline(&mut project).changed() {
                form.set_project(&project);
            }
            ui.end_row();

            let picks: Vec<String> = form
                .project_suggestions()
                .into_iter()
                .take(MAX_SUGGESTIONS)
                .map(str::to_string)
                .collect();
            if !picks.is_empty() {
                ui.label("");
                ui.horizontal_wrapped(|ui| {
                    for p in &picks {
                        if ui.small_button(p.as_str()).clicked() {
                            form.set_project(p);
                        }
                    }
                });
                ui.end_row();
            }
            // Blank until typed into; OK stays disabled either way.
            if let Some(e) = form.project_error().filter(|_| !form.project().is_empty()) {
                ui.label("");
                error_label(ui, e.to_string());
                ui.end_row();
            }

            if form.kind().has_times() {
                ui.label("Start date and time");
                let mut start = form.start_text().to_string();
                if ui.text_edit_singleline(&mut start).changed() {
                    form.set_start_text(&start);
                }
                ui.end_row();
                if let Some(e) = form.start_error() {
                    ui.label("");
                    error_label(ui, e.to_string());
                    ui.end_row();
                }

                ui.label("End date and time");
                let mut end = form.end_text().to_string();
                if ui.text_edit_singleline(&mut end).changed() {
                    form.set_end_text(&end);
                }
                ui.end_row();
                if let Some(e) = form.end_error() {
                    ui.label("");
                    error_label(ui, e.to_string());
                    ui.end_row();
                }
            }

            ui.label("Tag");
            ui.horizontal(|ui| {
                let response = ui.text_edit_singleline(&mut form.tag_input);
                let entered =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("+").clicked() || entered {
                    let _ = form.add_tag();
                }
            });
            ui.end_row();

            let picks: Vec<String> = form
                .tag_suggestions()
                .into_iter()
                .take(MAX_SUGGESTIONS)
                .map(str::to_string)
                .collect();
            if !form.tag_input.is_empty() && !picks.is_empty() {
                ui.label("");
                ui.horizontal_wrapped(|ui| {
                    for t in &picks {
                        if ui.small_button(t.as_str()).clicked() {
                            form.tag_input = t.clone();
                            let _ = form.add_tag();
                        }
                    }
                });
                ui.end_row();
            }
            if let Some(e) = form.tag_error() {
                ui.label("");
                error_label(ui, e.to_string());
                ui.end_row();
            }

            ui.label("Selected tags");
            let mut remove = None;
            ui.vertical(|ui| {
                if form.tags().is_empty() {
                    ui.weak("none");
                }
                for (i, tag) in form.tags().iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(tag.as_str());
                        if ui.small_button("−").clicked() {
                            remove = Some(i);
                        }
                    });
                }
            });
            if let Some(i) = remove {
                form.remove_tag(i);
            }
            ui.end_row();
        });

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Cancel").clicked() {
            result = Some(DialogResult::Cancelled);
        }
        if ui.add_enabled(form.can_confirm(), egui::Button::new("OK")).clicked() {
            if let Some(draft) = form.confirm() {
                result = Some(DialogResult::Confirmed(draft));
            }
        }
    });
    if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
        result = Some(DialogResult::Cancelled);
    }
    result
}

impl<S: FrameSource> eframe::App for FlubberApp<S> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.draw(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.timer.cancel();
        info!("window closed; status poll cancelled");
    }
}

/// Opens the main window and runs the UI loop until it is closed.
pub fn run<S: FrameSource + 'static>(view: MainView<S>, poll_interval: Duration) -> eframe::Result<()> {
    let viewport = egui::ViewportBuilder::default()
        .with_title("Flubber")
        .with_app_id("flubber")
        .with_inner_size([760.0, 520.0])
        .with_min_inner_size([520.0, 360.0]);
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Flubber",
        options,
        Box::new(move |_cc| Ok(Box::new(FlubberApp::new(view, poll_interval)))),
    )
}
