use iced::mouse::Cursor;
use iced::widget::canvas::{self, Canvas, Geometry, Program, Stroke};
use iced::widget::{button, column, container, row, scrollable, stack, text};
use iced::{Color, Element, Font, Length, Point, Rectangle, Size, Task, Theme, font, window};
use std::path::PathBuf;

use crate::client::PanelClient;
use crate::config::PanelConfig;
use crate::error::{PanelError, Workflow};
use crate::frame::Frame;
use crate::overlay::{LABEL_SIZE, OverlayBox, STROKE_WIDTH, overlay_boxes};
use crate::panel::Panel;
use crate::report::{
    DOWNLOAD_LABEL, ExtractReport, NO_ANALYSIS, NORMALIZATION_NOTE, ResultRow, Tone,
};
use crate::roi::{H, Nudge, SCALE, Target, W};

const VIEW_WIDTH: f32 = (W * SCALE) as f32;
const VIEW_HEIGHT: f32 = (H * SCALE) as f32;
const ARROW_CELL: f32 = 32.0;

const BOLD: Font = Font {
    weight: font::Weight::Bold,
    ..Font::DEFAULT
};

pub fn run(config: PanelConfig, client: PanelClient) -> iced::Result {
    iced::application(
        move || PanelApp::new(&config, client.clone()),
        PanelApp::update,
        PanelApp::view,
    )
    .title(|_state: &PanelApp| "ROI Panel".to_string())
    .theme(|_state: &PanelApp| Theme::Dark)
    .window(window::Settings {
        size: Size::new(940.0, 660.0),
        ..Default::default()
    })
    .run()
}

pub struct PanelApp {
    panel: Panel,
    client: PanelClient,
    frame_handle: Option<iced::widget::image::Handle>,
    status_text: String,
}

#[derive(Debug, Clone)]
pub enum Message {
    RunPressed,
    OpenCsvPressed,
    CsvPicked(Option<PathBuf>),
    FrameFinished(Result<Frame, PanelError>),
    ExtractPressed,
    ExtractFinished(Result<ExtractReport, PanelError>),
    Nudge(Target, Nudge),
    ResetRois,
    DownloadPressed,
    DownloadTarget(String, Option<PathBuf>),
    DownloadFinished(Result<PathBuf, PanelError>),
    AlertClosed,
}

impl PanelApp {
    pub fn new(config: &PanelConfig, client: PanelClient) -> (Self, Task<Message>) {
        (
            PanelApp {
                panel: Panel::new(config),
                client,
                frame_handle: None,
                status_text: "Press Run to capture a frame".to_string(),
            },
            Task::none(),
        )
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::RunPressed => {
                if !self.panel.begin_capture() {
                    return Task::none();
                }
                self.status_text = "Capturing...".to_string();
                let client = self.client.clone();
                Task::perform(
                    async move { client.capture().await },
                    Message::FrameFinished,
                )
            }
            Message::OpenCsvPressed => {
                if !self.panel.can_import_csv() {
                    return Task::none();
                }
                let dialog = rfd::AsyncFileDialog::new()
                    .add_filter("CSV frame", &["csv"])
                    .pick_file();
                Task::perform(dialog, |result| {
                    Message::CsvPicked(result.map(|file| file.path().to_path_buf()))
                })
            }
            Message::CsvPicked(Some(path)) => {
                if !self.panel.begin_csv_import() {
                    return Task::none();
                }
                self.status_text = format!("Loading {}", path.display());
                let client = self.client.clone();
                Task::perform(
                    async move { client.open_csv(path).await },
                    Message::FrameFinished,
                )
            }
            Message::CsvPicked(None) => Task::none(),
            Message::FrameFinished(outcome) => {
                let handle = outcome.as_ref().ok().map(|frame| {
                    iced::widget::image::Handle::from_rgba(
                        frame.width,
                        frame.height,
                        frame.rgba.clone(),
                    )
                });
                match self.panel.finish_frame(outcome) {
                    None => {
                        self.frame_handle = handle;
                        self.status_text = "Frame loaded".to_string();
                        Task::none()
                    }
                    Some(alert) => self.alert(alert),
                }
            }
            Message::ExtractPressed => {
                let Some(request) = self.panel.begin_extract() else {
                    return Task::none();
                };
                self.status_text = "Extracting...".to_string();
                let client = self.client.clone();
                Task::perform(
                    async move { client.extract(request).await },
                    Message::ExtractFinished,
                )
            }
            Message::ExtractFinished(outcome) => match self.panel.finish_extract(outcome) {
                None => {
                    self.status_text = "Extraction complete".to_string();
                    Task::none()
                }
                Some(alert) => self.alert(alert),
            },
            Message::Nudge(target, nudge) => {
                self.panel.nudge(target, nudge);
                Task::none()
            }
            Message::ResetRois => {
                self.panel.reset_rois();
                Task::none()
            }
            Message::DownloadPressed => {
                let Some(csv) = self.panel.begin_download() else {
                    return Task::none();
                };
                let file_name = self
                    .panel
                    .report()
                    .map(|report| report.csv_file_name().to_string())
                    .unwrap_or_default();
                let dialog = rfd::AsyncFileDialog::new()
                    .set_file_name(file_name)
                    .add_filter("CSV", &["csv"])
                    .save_file();
                Task::perform(dialog, move |result| {
                    Message::DownloadTarget(csv.clone(), result.map(|file| file.path().to_path_buf()))
                })
            }
            Message::DownloadTarget(csv, Some(dest)) => {
                self.status_text = format!("Downloading {csv}");
                let client = self.client.clone();
                Task::perform(
                    async move { client.download(csv, dest).await },
                    Message::DownloadFinished,
                )
            }
            Message::DownloadTarget(_, None) => {
                self.panel.cancel_download();
                Task::none()
            }
            Message::DownloadFinished(outcome) => {
                if let Ok(path) = &outcome {
                    self.status_text = format!("Saved {}", path.display());
                }
                match self.panel.finish_download(outcome) {
                    None => Task::none(),
                    Some(alert) => self.alert(alert),
                }
            }
            Message::AlertClosed => Task::none(),
        }
    }

    /// Blocking error dialog; the text also stays in the status line.
    fn alert(&mut self, message: String) -> Task<Message> {
        self.status_text = message.clone();
        let dialog = rfd::AsyncMessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("ROI Panel")
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
        Task::perform(dialog, |_| Message::AlertClosed)
    }

    pub fn view(&self) -> Element<'_, Message> {
        let layout = row![self.frame_section(), self.side_section()]
            .spacing(20)
            .padding(20);

        container(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_| container::Style {
                background: Some(Color::from_rgb8(32, 32, 32).into()),
                ..Default::default()
            })
            .into()
    }

    fn frame_section(&self) -> Element<'_, Message> {
        let base: Element<'_, Message> = match (&self.frame_handle, self.panel.showing_placeholder()) {
            (Some(handle), false) => iced::widget::image(handle.clone())
                .width(Length::Fixed(VIEW_WIDTH))
                .height(Length::Fixed(VIEW_HEIGHT))
                .filter_method(iced::widget::image::FilterMethod::Nearest)
                .into(),
            _ => container(text(self.placeholder_text()).size(14))
                .center_x(Length::Fixed(VIEW_WIDTH))
                .center_y(Length::Fixed(VIEW_HEIGHT))
                .style(|_| container::Style {
                    background: Some(Color::from_rgb8(18, 18, 18).into()),
                    ..Default::default()
                })
                .into(),
        };

        let boxes = if self.panel.overlay_visible() {
            overlay_boxes(self.panel.rois(), SCALE as f32)
        } else {
            Vec::new()
        };
        let overlay = Canvas::new(RoiOverlay { boxes })
            .width(Length::Fixed(VIEW_WIDTH))
            .height(Length::Fixed(VIEW_HEIGHT));

        legend(" Frame ", stack![base, overlay])
    }

    fn placeholder_text(&self) -> &'static str {
        match self.panel.frame_request() {
            Some(Workflow::CsvImport) => "Loading CSV frame...",
            Some(_) => "Capturing...",
            None => "No frame yet. Press Run to capture.",
        }
    }

    fn side_section(&self) -> Element<'_, Message> {
        let capturing = self.panel.frame_request() == Some(Workflow::Capture);
        let run_button = button(text(if capturing { "Capturing..." } else { "Run" }))
            .on_press_maybe(self.panel.can_capture().then_some(Message::RunPressed));
        let extract_button = button(text("Extract"))
            .on_press_maybe(self.panel.can_extract().then_some(Message::ExtractPressed));
        let reset_button = button(text("Reset ROI")).on_press(Message::ResetRois);

        let mut actions = row![run_button, extract_button, reset_button].spacing(8);
        if self.panel.csv_import_enabled() {
            actions = actions.push(
                button(text("Open CSV"))
                    .on_press_maybe(self.panel.can_import_csv().then_some(Message::OpenCsvPressed)),
            );
        }

        let status = container(text(&self.status_text).size(12))
            .padding(8)
            .width(Length::Fill)
            .style(legend_style);

        let content = column![
            legend(" Controls ", actions),
            legend(" ROI ", self.roi_grid()),
            legend(" Results ", self.results_section()),
            status,
        ]
        .spacing(16)
        .width(Length::Fill);

        scrollable(content).width(Length::Fill).into()
    }

    fn roi_grid(&self) -> Element<'_, Message> {
        let rows = Target::DISPLAY_ROWS.iter().map(|pair| {
            Element::from(row(pair.iter().map(|&target| self.roi_box(target))).spacing(12))
        });
        column(rows).spacing(12).into()
    }

    fn roi_box(&self, target: Target) -> Element<'_, Message> {
        let roi = self.panel.rois().get(target);
        let [r, g, b] = target.color();

        let arrows = column![
            row![blank_cell(), arrow_button(target, Nudge::Up), blank_cell()].spacing(2),
            row![
                arrow_button(target, Nudge::Left),
                blank_cell(),
                arrow_button(target, Nudge::Right)
            ]
            .spacing(2),
            row![blank_cell(), arrow_button(target, Nudge::Down), blank_cell()].spacing(2),
        ]
        .spacing(2);

        let content = column![
            text(target.name())
                .size(14)
                .font(BOLD)
                .color(Color::from_rgb8(r, g, b)),
            text(format!("cx={}, cy={}", roi.cx, roi.cy)).size(12),
            arrows,
        ]
        .spacing(6);

        container(content).padding(8).style(legend_style).into()
    }

    fn results_section(&self) -> Element<'_, Message> {
        let (Some(report), Some(rows)) = (self.panel.report(), self.panel.result_rows()) else {
            return text(NO_ANALYSIS).size(12).into();
        };

        let download = button(text(DOWNLOAD_LABEL).size(12))
            .on_press_maybe(self.panel.can_download().then_some(Message::DownloadPressed));

        let mut body = column![download].spacing(8);
        for result in rows {
            body = body.push(result_line(result));
        }
        if let Some(range) = report.normalization_range() {
            body = body.push(text(range).size(11).color(Color::from_rgb8(150, 150, 150)));
        }
        body.push(text(NORMALIZATION_NOTE).size(11).color(Color::from_rgb8(150, 150, 150)))
            .into()
    }
}

fn legend_style(_: &Theme) -> container::Style {
    container::Style {
        background: None,
        border: iced::Border {
            color: Color::from_rgb8(100, 100, 100),
            width: 1.0,
            radius: 4.0.into(),
        },
        ..Default::default()
    }
}

fn legend<'a>(title: &'a str, content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    column![
        container(text(title).size(12)).style(|_| container::Style {
            background: Some(Color::from_rgb8(32, 32, 32).into()),
            ..Default::default()
        }),
        container(content).padding(10).style(legend_style),
    ]
    .spacing(0)
    .into()
}

fn arrow_button<'a>(target: Target, nudge: Nudge) -> Element<'a, Message> {
    button(text(nudge.arrow()).size(14))
        .width(Length::Fixed(ARROW_CELL))
        .on_press(Message::Nudge(target, nudge))
        .into()
}

fn blank_cell<'a>() -> Element<'a, Message> {
    container(text("")).width(Length::Fixed(ARROW_CELL)).into()
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Red => Color::from_rgb8(0xe5, 0x48, 0x4d),
        Tone::Green => Color::from_rgb8(0x2f, 0xb3, 0x4f),
    }
}

fn result_line<'a>(result: ResultRow) -> Element<'a, Message> {
    let label = text(format!("{}:", result.label)).size(13).font(BOLD);
    let value = match result.tone {
        Some(tone) => text(result.value).size(18).color(tone_color(tone)),
        None => text(result.value).size(13),
    };
    let line = row![label, value].spacing(8);

    match result.detail {
        Some(detail) => column![
            line,
            text(detail).size(13).color(Color::from_rgb8(170, 170, 170))
        ]
        .spacing(2)
        .into(),
        None => line.into(),
    }
}

/// Canvas layer stacked over the frame: one stroked box and caption per ROI.
struct RoiOverlay {
    boxes: Vec<OverlayBox>,
}

impl Program<Message> for RoiOverlay {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        for item in &self.boxes {
            let [r, g, b] = item.color;
            let color = Color::from_rgb8(r, g, b);
            frame.stroke_rectangle(
                Point::new(item.x, item.y),
                Size::new(item.size, item.size),
                Stroke::default().with_width(STROKE_WIDTH).with_color(color),
            );
            // Anchor is an SVG baseline; canvas text is positioned by its top edge.
            let (x, baseline) = item.label_anchor();
            frame.fill_text(canvas::Text {
                content: item.label.clone(),
                position: Point::new(x, baseline - LABEL_SIZE),
                color,
                size: LABEL_SIZE.into(),
                font: BOLD,
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
