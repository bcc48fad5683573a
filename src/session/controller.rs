//! Capture session
//!
//! `CaptureSession` owns every piece of mutable session state and is the only
//! writer. The UI feeds it `Msg`s, either directly through `update` or queued
//! on the channel from `sender` and drained by `pump`. Notifications go out on
//! the `events` channel.

use std::path::PathBuf;

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use image::RgbaImage;
use tiny_skia::Pixmap;

use crate::annotations::mover::{self, CursorHint, Grab};
use crate::annotations::{Gesture, ToolStateMachine};
use crate::capture::CaptureBuffer;
use crate::config::{SnapConfig, clamp_stroke_width};
use crate::domain::{
    Point, Rect, SelectionController, SelectionRelease, Shape, ShapeColor, ShapeModel, Tool,
};
use crate::host::{ImageSink, ScreenCapturer, TextEditor, WindowLocator};
use crate::render::export::{self, ExportError};
use crate::render::frame::{RenderScene, render_frame};
use crate::render::text::FontBook;
use crate::session::messages::{
    CaptureMsg, DrawMsg, ExportTarget, Msg, PointerMsg, SessionEvent, SettingsMsg, TextMsg,
    ToolMsg,
};
use crate::session::state::{Interaction, ToolSettings};

/// External collaborators a session calls out to
pub struct Host {
    pub windows: Box<dyn WindowLocator>,
    pub editor: Box<dyn TextEditor>,
    pub sink: Box<dyn ImageSink>,
}

pub struct CaptureSession {
    capture: CaptureBuffer,
    selection: SelectionController,
    model: ShapeModel,
    tools: ToolStateMachine,
    interaction: Interaction,
    settings: ToolSettings,
    magnifier: bool,
    pointer: Option<Point>,
    cursor: CursorHint,
    closed: bool,

    fonts: FontBook,
    config: SnapConfig,
    config_path: Option<PathBuf>,
    host: Host,

    msg_tx: Sender<Msg>,
    msg_rx: Receiver<Msg>,
    event_tx: Sender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,
}

impl CaptureSession {
    /// Grab the screen once and open a session over it
    pub fn start(
        capturer: &dyn ScreenCapturer,
        bounds: Option<Rect>,
        host: Host,
        config: SnapConfig,
    ) -> Result<Self> {
        let image = capturer.capture_screen(bounds)?;
        let fonts = FontBook::load(&config);
        Ok(Self::new(CaptureBuffer::new(image), host, config).with_fonts(fonts))
    }

    /// Open a session over an existing capture
    ///
    /// No font is loaded; call [`with_fonts`](Self::with_fonts) to rasterize
    /// text.
    pub fn new(capture: CaptureBuffer, host: Host, config: SnapConfig) -> Self {
        log::debug!(
            "Session started on {}x{} capture",
            capture.width(),
            capture.height()
        );
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        Self {
            selection: SelectionController::new(capture.bounds()),
            model: ShapeModel::new(),
            tools: ToolStateMachine::new(capture.clone()),
            interaction: Interaction::Idle,
            settings: ToolSettings::from_config(&config),
            magnifier: config.magnifier_enabled,
            pointer: None,
            cursor: CursorHint::Default,
            closed: false,
            capture,
            fonts: FontBook::empty(),
            config,
            config_path: None,
            host,
            msg_tx,
            msg_rx,
            event_tx,
            event_rx,
        }
    }

    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    /// Persist tool settings to this file when the session closes
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn capture(&self) -> &CaptureBuffer {
        &self.capture
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn shapes(&self) -> &ShapeModel {
        &self.model
    }

    pub fn tool(&self) -> Tool {
        self.tools.tool()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn magnifier_enabled(&self) -> bool {
        self.magnifier
    }

    /// Cursor to show for the last pointer position
    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ========================================================================
    // Channels
    // ========================================================================

    /// Queue for messages from toolbar and input handlers
    pub fn sender(&self) -> Sender<Msg> {
        self.msg_tx.clone()
    }

    pub fn events(&self) -> Receiver<SessionEvent> {
        self.event_rx.clone()
    }

    /// Process every queued message in arrival order
    ///
    /// Returns true when any of them requires a redraw.
    pub fn pump(&mut self) -> bool {
        let mut redraw = false;
        while let Ok(msg) = self.msg_rx.try_recv() {
            redraw |= self.update(msg);
        }
        redraw
    }

    fn emit(&self, event: SessionEvent) {
        // The session holds a receiver itself, so sending cannot fail
        let _ = self.event_tx.send(event);
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Process one message; returns true when the frame needs a redraw
    pub fn update(&mut self, msg: Msg) -> bool {
        if self.closed {
            log::debug!("Ignoring {:?} after close", msg);
            return false;
        }
        match msg {
            Msg::Pointer(PointerMsg::Down(p)) => self.pointer_down(p),
            Msg::Pointer(PointerMsg::Move(p)) => self.pointer_move(p),
            Msg::Pointer(PointerMsg::Up(p)) => self.pointer_up(p),
            Msg::Tool(msg) => self.handle_tool(msg),
            Msg::Draw(DrawMsg::Undo) => self.undo(),
            Msg::Text(msg) => self.handle_text(msg),
            Msg::Capture(msg) => self.handle_capture(msg),
            Msg::Settings(msg) => self.handle_settings(msg),
        }
    }

    fn pointer_down(&mut self, p: Point) -> bool {
        self.pointer = Some(p);
        if !matches!(self.interaction, Interaction::Idle) {
            return false;
        }

        let Some(sel) = self.selection.finalized() else {
            if self.selection.pointer_down(p) {
                self.interaction = Interaction::Selecting;
                return true;
            }
            return false;
        };
        // Drawing tools stay inside the selection; pointer mode can still
        // pick up text that was dragged out of it
        if self.tools.tool() != Tool::None && !sel.contains_point(p) {
            return false;
        }

        match self.tools.begin(p, &self.settings) {
            Gesture::Drawing(shape) => {
                self.interaction = Interaction::Drawing { shape, anchor: p };
                true
            }
            Gesture::Committed(shape) => {
                self.commit(shape);
                true
            }
            Gesture::TextEdit(anchor) => {
                self.host
                    .editor
                    .begin_edit(anchor, self.settings.color, &self.settings.font());
                self.interaction = Interaction::TextEditing { anchor };
                false
            }
            Gesture::Pick => match mover::grab(&mut self.model, p) {
                Some(Grab { index, offset }) => {
                    self.interaction = Interaction::Moving { index, offset };
                    true
                }
                None => false,
            },
        }
    }

    fn pointer_move(&mut self, p: Point) -> bool {
        let moved = self.pointer != Some(p);
        self.pointer = Some(p);

        match &mut self.interaction {
            Interaction::Selecting => self.selection.pointer_move(p),
            Interaction::Drawing { shape, anchor } => ToolStateMachine::update(shape, *anchor, p),
            Interaction::Moving { index, offset } => {
                let grab = Grab {
                    index: *index,
                    offset: *offset,
                };
                mover::drag(&mut self.model, grab, p)
            }
            Interaction::TextEditing { .. } => false,
            Interaction::Idle => {
                if self.selection.is_finalized() {
                    self.cursor = if self.tools.tool() == Tool::None {
                        mover::hover_cursor(self.model.shapes(), p)
                    } else {
                        CursorHint::Default
                    };
                    false
                } else {
                    let hover_changed = self.selection.update_hover(p, self.host.windows.as_ref());
                    hover_changed || (self.magnifier && moved)
                }
            }
        }
    }

    fn pointer_up(&mut self, p: Point) -> bool {
        self.pointer = Some(p);
        match std::mem::take(&mut self.interaction) {
            Interaction::Selecting => {
                if let SelectionRelease::Finalized(rect) = self.selection.pointer_up(p) {
                    self.magnifier = false;
                    self.emit(SessionEvent::SelectionFinalized(rect));
                }
                true
            }
            Interaction::Drawing { mut shape, anchor } => {
                ToolStateMachine::update(&mut shape, anchor, p);
                self.commit(shape);
                true
            }
            Interaction::Moving { .. } => true,
            other => {
                self.interaction = other;
                false
            }
        }
    }

    fn commit(&mut self, shape: Shape) {
        log::debug!("Committed {:?} at {:?}", self.tools.tool(), shape.bounds());
        self.model.push(shape);
        self.emit(SessionEvent::ShapeCountChanged(self.model.len()));
    }

    fn undo(&mut self) -> bool {
        match self.model.undo() {
            Some(_) => {
                log::debug!("Undo, {} shapes left", self.model.len());
                self.emit(SessionEvent::ShapeCountChanged(self.model.len()));
                true
            }
            None => false,
        }
    }

    fn handle_tool(&mut self, msg: ToolMsg) -> bool {
        match msg {
            ToolMsg::Set(tool) => {
                let changed = self.tools.set_tool(tool);
                changed && self.abandon_gesture()
            }
            ToolMsg::Toggle(tool) => {
                self.tools.toggle_tool(tool);
                self.abandon_gesture()
            }
            ToolMsg::SetColor(color) => {
                self.settings.color = color;
                self.restyle_edit(color);
                false
            }
            ToolMsg::SetStrokeWidth(width) => {
                if width.is_finite() && width > 0.0 {
                    self.settings.stroke_width = clamp_stroke_width(width);
                }
                false
            }
            ToolMsg::StepFontSize(steps) => {
                let size = self.settings.step_font_size(steps);
                log::debug!("Font size now {}", size);
                self.restyle_edit(self.settings.color);
                false
            }
        }
    }

    /// Drop whatever gesture was running when the tool changed
    fn abandon_gesture(&mut self) -> bool {
        match std::mem::take(&mut self.interaction) {
            Interaction::Drawing { .. } => {
                log::debug!("Tool switched mid-gesture, in-progress shape discarded");
                true
            }
            Interaction::TextEditing { .. } => {
                self.host.editor.end_edit();
                false
            }
            Interaction::Moving { .. } => true,
            other => {
                self.interaction = other;
                false
            }
        }
    }

    fn restyle_edit(&mut self, color: ShapeColor) {
        if self.interaction.is_text_editing() {
            self.host.editor.restyle(color, &self.settings.font());
        }
    }

    fn handle_text(&mut self, msg: TextMsg) -> bool {
        let Interaction::TextEditing { anchor } = self.interaction else {
            log::debug!("Text result without an open editor");
            return false;
        };
        self.interaction = Interaction::Idle;

        match msg {
            TextMsg::Commit { text, font, size } => {
                match ToolStateMachine::text_shape(anchor, &text, font, size, self.settings.color) {
                    Some(shape) => {
                        self.commit(shape);
                        true
                    }
                    None => false,
                }
            }
            TextMsg::Cancel => false,
        }
    }

    fn handle_settings(&mut self, msg: SettingsMsg) -> bool {
        if self.selection.is_finalized() {
            return false;
        }
        let next = match msg {
            SettingsMsg::ToggleMagnifier => !self.magnifier,
            SettingsMsg::SetMagnifier(on) => on,
        };
        let changed = next != self.magnifier;
        self.magnifier = next;
        self.config.magnifier_enabled = next;
        changed
    }

    // ========================================================================
    // Export and close
    // ========================================================================

    /// Composite the finalized selection with all committed shapes
    pub fn export(&self) -> Result<RgbaImage, ExportError> {
        export::compose_export(
            &self.capture,
            self.selection.state(),
            self.model.shapes(),
            &self.fonts,
        )
    }

    fn handle_capture(&mut self, msg: CaptureMsg) -> bool {
        let result = match msg {
            CaptureMsg::Close => {
                self.close();
                return true;
            }
            CaptureMsg::Copy => self.export_to(ExportTarget::Clipboard),
            CaptureMsg::Save(path) => {
                let path = path.unwrap_or_else(|| {
                    export::default_save_path(&self.config.save_location, self.config.image_format)
                });
                self.export_to(ExportTarget::File(path))
            }
        };

        match result {
            Ok(target) => {
                self.emit(SessionEvent::Exported(target));
                self.close();
                true
            }
            Err(err) => {
                log::error!("Export failed: {:?}", err);
                self.emit(SessionEvent::ExportFailed(format!("{:#}", err)));
                false
            }
        }
    }

    fn export_to(&mut self, target: ExportTarget) -> Result<ExportTarget> {
        let image = self.export()?;
        match &target {
            ExportTarget::Clipboard => self.host.sink.set_clipboard_image(&image)?,
            ExportTarget::File(path) => self.host.sink.save_image(&image, path)?,
        }
        log::info!("Exported {}x{} to {:?}", image.width(), image.height(), target);
        Ok(target)
    }

    fn close(&mut self) {
        if self.interaction.is_text_editing() {
            self.host.editor.end_edit();
        }
        self.interaction = Interaction::Idle;
        self.closed = true;

        if let Some(path) = &self.config_path {
            let mut config = self.config.clone();
            self.settings.apply_to(&mut config);
            if let Err(err) = config.save_to(path) {
                log::error!("Failed to save config: {:?}", err);
            }
        }
        self.emit(SessionEvent::Closed);
    }

    // ========================================================================
    // Render
    // ========================================================================

    /// Render the current frame
    pub fn render(&self) -> Option<Pixmap> {
        let scene = RenderScene {
            capture: &self.capture,
            selection: self.selection.state(),
            shapes: self.model.shapes(),
            in_progress: self.interaction.in_progress(),
            hover: self.selection.hover(),
            magnifier: self.magnifier,
            pointer: self.pointer,
        };
        render_frame(&scene, &self.fonts)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    use super::*;
    use crate::capture::image::gradient;
    use crate::domain::FontSpec;
    use crate::config::MAX_STROKE_WIDTH;
    use crate::host::StaticWindows;

    #[derive(Default)]
    struct Recorded {
        edits: Vec<(Point, ShapeColor, f32)>,
        restyles: Vec<(ShapeColor, f32)>,
        clipboard: Vec<(u32, u32)>,
        saved: Vec<PathBuf>,
        fail: bool,
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Recorded>>);

    impl TextEditor for Recorder {
        fn begin_edit(&mut self, anchor: Point, color: ShapeColor, font: &FontSpec) {
            self.0.borrow_mut().edits.push((anchor, color, font.size));
        }
        fn restyle(&mut self, color: ShapeColor, font: &FontSpec) {
            self.0.borrow_mut().restyles.push((color, font.size));
        }
    }

    impl ImageSink for Recorder {
        fn set_clipboard_image(&mut self, image: &RgbaImage) -> Result<()> {
            if self.0.borrow().fail {
                anyhow::bail!("clipboard unavailable");
            }
            self.0.borrow_mut().clipboard.push(image.dimensions());
            Ok(())
        }
        fn save_image(&mut self, _image: &RgbaImage, path: &Path) -> Result<()> {
            self.0.borrow_mut().saved.push(path.to_path_buf());
            Ok(())
        }
    }

    fn session_with(windows: Vec<Rect>) -> (CaptureSession, Recorder) {
        let recorder = Recorder::default();
        let host = Host {
            windows: Box::new(StaticWindows::new(windows)),
            editor: Box::new(recorder.clone()),
            sink: Box::new(recorder.clone()),
        };
        let session = CaptureSession::new(gradient(400, 300), host, SnapConfig::default());
        (session, recorder)
    }

    fn session() -> (CaptureSession, Recorder) {
        session_with(Vec::new())
    }

    fn drag(session: &mut CaptureSession, from: (i32, i32), path: &[(i32, i32)]) {
        session.update(Msg::pointer_down(from.0, from.1));
        for &(x, y) in path {
            session.update(Msg::pointer_move(x, y));
        }
        let (x, y) = path.last().copied().unwrap_or(from);
        session.update(Msg::pointer_up(x, y));
    }

    fn selected() -> (CaptureSession, Recorder) {
        let (mut s, r) = session();
        drag(&mut s, (100, 100), &[(300, 200)]);
        (s, r)
    }

    fn drain(rx: &Receiver<SessionEvent>) -> Vec<SessionEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn drag_finalizes_selection() {
        let (mut s, _) = session();
        let events = s.events();
        drag(&mut s, (100, 100), &[(200, 150), (300, 200)]);
        assert_eq!(s.selection().finalized(), Some(Rect::new(100, 100, 200, 100)));
        assert_eq!(
            drain(&events),
            vec![SessionEvent::SelectionFinalized(Rect::new(100, 100, 200, 100))]
        );
        assert!(!s.magnifier_enabled());
    }

    #[test]
    fn click_selects_hovered_window() {
        let (mut s, _) = session_with(vec![Rect::new(20, 30, 120, 80)]);
        s.update(Msg::pointer_move(50, 50));
        assert_eq!(s.selection().hover(), Some(Rect::new(20, 30, 120, 80)));
        drag(&mut s, (50, 50), &[]);
        assert_eq!(s.selection().finalized(), Some(Rect::new(20, 30, 120, 80)));
    }

    #[test]
    fn click_without_hover_discards() {
        let (mut s, _) = session();
        drag(&mut s, (50, 50), &[]);
        assert!(!s.selection().is_finalized());
        assert_eq!(s.interaction(), &Interaction::Idle);
    }

    #[test]
    fn pen_stroke_commits_points() {
        let (mut s, _) = selected();
        s.update(Msg::set_tool(Tool::Pen));
        drag(&mut s, (150, 150), &[(160, 160), (170, 150)]);
        let shapes = s.shapes().shapes();
        assert_eq!(shapes.len(), 1);
        match &shapes[0] {
            Shape::Freehand(f) => assert_eq!(
                f.points,
                vec![Point::new(150, 150), Point::new(160, 160), Point::new(170, 150)]
            ),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn rectangle_is_normalized() {
        let (mut s, _) = selected();
        s.update(Msg::set_tool(Tool::Rectangle));
        drag(&mut s, (250, 180), &[(110, 120)]);
        assert_eq!(s.shapes().shapes()[0].bounds(), Rect::new(110, 120, 140, 60));
    }

    #[test]
    fn tools_are_inert_outside_selection() {
        let (mut s, _) = selected();
        s.update(Msg::set_tool(Tool::Rectangle));
        drag(&mut s, (10, 10), &[(50, 50)]);
        assert!(s.shapes().is_empty());

        let (mut s, _) = session();
        s.update(Msg::set_tool(Tool::Number));
        s.update(Msg::pointer_down(10, 10));
        assert!(s.shapes().is_empty());
    }

    #[test]
    fn undo_on_empty_is_noop() {
        let (mut s, _) = selected();
        let events = s.events();
        drain(&events);
        assert!(!s.update(Msg::undo()));
        assert!(s.shapes().is_empty());
        assert!(drain(&events).is_empty());
    }

    #[test]
    fn numbers_count_up_and_undo_reports_count() {
        let (mut s, _) = selected();
        let events = s.events();
        drain(&events);
        s.update(Msg::set_tool(Tool::Number));
        for x in [120, 160, 200] {
            s.update(Msg::pointer_down(x, 150));
            s.update(Msg::pointer_up(x, 150));
        }
        let labels: Vec<u32> = s
            .shapes()
            .shapes()
            .iter()
            .filter_map(|shape| match shape {
                Shape::Number(n) => Some(n.number),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec![1, 2, 3]);

        s.update(Msg::undo());
        assert_eq!(
            drain(&events),
            vec![
                SessionEvent::ShapeCountChanged(1),
                SessionEvent::ShapeCountChanged(2),
                SessionEvent::ShapeCountChanged(3),
                SessionEvent::ShapeCountChanged(2),
            ]
        );
    }

    #[test]
    fn tool_switch_discards_in_progress_shape() {
        let (mut s, _) = selected();
        s.update(Msg::set_tool(Tool::Line));
        s.update(Msg::pointer_down(120, 120));
        s.update(Msg::pointer_move(180, 180));
        assert!(s.interaction().in_progress().is_some());

        s.update(Msg::set_tool(Tool::Arrow));
        assert_eq!(s.interaction(), &Interaction::Idle);
        s.update(Msg::pointer_up(180, 180));
        assert!(s.shapes().is_empty());
    }

    #[test]
    fn text_edit_commits_with_current_style() {
        let (mut s, recorder) = selected();
        s.update(Msg::set_tool(Tool::Text));
        s.update(Msg::pointer_down(150, 130));
        assert!(s.interaction().is_text_editing());

        // Pointer input is suspended while editing
        drag(&mut s, (200, 160), &[(220, 180)]);
        assert!(s.interaction().is_text_editing());

        s.update(Msg::set_color(ShapeColor::BLUE));
        s.update(Msg::font_size_up());
        {
            let rec = recorder.0.borrow();
            assert_eq!(rec.edits, vec![(Point::new(150, 130), ShapeColor::RED, 12.0)]);
            assert_eq!(
                rec.restyles,
                vec![(ShapeColor::BLUE, 12.0), (ShapeColor::BLUE, 14.0)]
            );
        }

        s.update(Msg::text_commit("hello", FontSpec::new("Sans", 14.0), (40, 17)));
        assert_eq!(s.interaction(), &Interaction::Idle);
        match &s.shapes().shapes()[0] {
            Shape::Text(t) => {
                assert_eq!(t.anchor, Point::new(150, 130));
                assert_eq!(t.color, ShapeColor::BLUE);
                assert_eq!(t.size, (40, 17));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn blank_or_cancelled_text_is_discarded() {
        let (mut s, _) = selected();
        s.update(Msg::set_tool(Tool::Text));
        s.update(Msg::pointer_down(150, 130));
        s.update(Msg::text_commit("   ", FontSpec::new("Sans", 12.0), (10, 10)));
        assert!(s.shapes().is_empty());

        s.update(Msg::pointer_down(150, 130));
        s.update(Msg::text_cancel());
        assert!(s.shapes().is_empty());
        assert_eq!(s.interaction(), &Interaction::Idle);
    }

    #[test]
    fn text_can_be_moved_in_pointer_mode() {
        let (mut s, _) = selected();
        s.update(Msg::set_tool(Tool::Text));
        s.update(Msg::pointer_down(150, 130));
        s.update(Msg::text_commit("a", FontSpec::new("Sans", 12.0), (30, 20)));
        s.update(Msg::set_tool(Tool::Rectangle));
        drag(&mut s, (110, 110), &[(200, 190)]);

        s.update(Msg::set_tool(Tool::None));
        s.update(Msg::pointer_move(160, 140));
        assert_eq!(s.cursor(), CursorHint::Move);

        drag(&mut s, (160, 140), &[(180, 150), (190, 170)]);
        let shapes = s.shapes().shapes();
        // Grabbed text is brought to front
        match &shapes[1] {
            Shape::Text(t) => assert_eq!(t.anchor, Point::new(180, 160)),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn text_moved_outside_selection_can_be_grabbed_again() {
        let (mut s, _) = selected();
        s.update(Msg::set_tool(Tool::Text));
        s.update(Msg::pointer_down(150, 130));
        s.update(Msg::text_commit("a", FontSpec::new("Sans", 12.0), (30, 20)));
        s.update(Msg::set_tool(Tool::None));

        drag(&mut s, (160, 140), &[(360, 250)]);
        match &s.shapes().shapes()[0] {
            Shape::Text(t) => assert_eq!(t.anchor, Point::new(350, 240)),
            other => panic!("unexpected shape {:?}", other),
        }

        s.update(Msg::pointer_move(355, 245));
        assert_eq!(s.cursor(), CursorHint::Move);
        s.update(Msg::pointer_down(355, 245));
        assert!(matches!(s.interaction(), Interaction::Moving { index: 0, .. }));
        s.update(Msg::pointer_move(205, 145));
        s.update(Msg::pointer_up(205, 145));
        match &s.shapes().shapes()[0] {
            Shape::Text(t) => assert_eq!(t.anchor, Point::new(200, 140)),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn pointer_mode_outside_selection_without_text_is_inert() {
        let (mut s, _) = selected();
        s.update(Msg::set_tool(Tool::None));
        s.update(Msg::pointer_down(10, 10));
        assert_eq!(s.interaction(), &Interaction::Idle);
        s.update(Msg::pointer_up(10, 10));
        assert!(s.shapes().is_empty());
    }

    #[test]
    fn huge_stroke_width_is_clamped_and_renders() {
        let (mut s, _) = selected();
        s.update(Msg::set_stroke_width(40000.0));
        assert_eq!(s.settings().stroke_width, MAX_STROKE_WIDTH);

        s.update(Msg::set_tool(Tool::Blur));
        drag(&mut s, (120, 120), &[(125, 125)]);
        s.update(Msg::set_tool(Tool::Mosaic));
        drag(&mut s, (130, 130), &[(190, 170)]);
        assert_eq!(s.shapes().len(), 2);
        assert!(s.render().is_some());
        assert_eq!(s.export().unwrap().dimensions(), (200, 100));
    }

    #[test]
    fn copy_exports_and_closes() {
        let (mut s, recorder) = selected();
        let events = s.events();
        drain(&events);
        assert!(s.update(Msg::copy()));
        assert_eq!(recorder.0.borrow().clipboard, vec![(200, 100)]);
        assert_eq!(
            drain(&events),
            vec![
                SessionEvent::Exported(ExportTarget::Clipboard),
                SessionEvent::Closed
            ]
        );
        assert!(s.is_closed());
        assert!(!s.update(Msg::pointer_down(150, 150)));
    }

    #[test]
    fn failed_copy_keeps_session_open() {
        let (mut s, recorder) = selected();
        recorder.0.borrow_mut().fail = true;
        let events = s.events();
        drain(&events);
        s.update(Msg::copy());
        assert!(!s.is_closed());
        assert!(matches!(
            drain(&events).as_slice(),
            [SessionEvent::ExportFailed(_)]
        ));
    }

    #[test]
    fn copy_without_selection_fails() {
        let (mut s, _) = session();
        let events = s.events();
        s.update(Msg::copy());
        assert!(matches!(
            drain(&events).as_slice(),
            [SessionEvent::ExportFailed(_)]
        ));
    }

    #[test]
    fn save_uses_requested_path() {
        let (mut s, recorder) = selected();
        s.update(Msg::save_to("/tmp/out.png"));
        assert_eq!(recorder.0.borrow().saved, vec![PathBuf::from("/tmp/out.png")]);
        assert!(s.is_closed());
    }

    #[test]
    fn export_of_empty_model_matches_capture() {
        let (mut s, _) = session();
        drag(&mut s, (0, 0), &[(100, 100)]);
        let out = s.export().unwrap();
        assert_eq!(out, s.capture().crop(Rect::new(0, 0, 100, 100)).unwrap());
    }

    #[test]
    fn pump_processes_in_order() {
        let (mut s, _) = session();
        let tx = s.sender();
        tx.send(Msg::pointer_down(100, 100)).unwrap();
        tx.send(Msg::pointer_move(300, 200)).unwrap();
        tx.send(Msg::pointer_up(300, 200)).unwrap();
        tx.send(Msg::set_tool(Tool::Number)).unwrap();
        tx.send(Msg::pointer_down(150, 150)).unwrap();
        tx.send(Msg::pointer_up(150, 150)).unwrap();
        assert!(s.pump());
        assert_eq!(s.selection().finalized(), Some(Rect::new(100, 100, 200, 100)));
        assert_eq!(s.shapes().len(), 1);
        assert!(!s.pump());
    }

    #[test]
    fn magnifier_toggle_only_before_finalize() {
        let (mut s, _) = session();
        assert!(s.magnifier_enabled());
        assert!(s.update(Msg::toggle_magnifier()));
        assert!(!s.magnifier_enabled());
        s.update(Msg::toggle_magnifier());
        drag(&mut s, (10, 10), &[(50, 50)]);
        assert!(!s.magnifier_enabled());
        assert!(!s.update(Msg::toggle_magnifier()));
        assert!(!s.magnifier_enabled());
    }

    #[test]
    fn close_persists_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let (s, _) = session();
        let mut s = s.with_config_path(&path);
        s.update(Msg::set_stroke_width(8.0));
        s.update(Msg::close());
        assert_eq!(SnapConfig::load_from(&path).stroke_width, 8.0);
    }

    #[test]
    fn render_has_capture_size() {
        let (s, _) = selected();
        let frame = s.render().unwrap();
        assert_eq!((frame.width(), frame.height()), (400, 300));
    }
}
