use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};

use snapink::config::{MAX_STROKE_WIDTH, STROKE_PRESETS, SnapConfig};
use snapink::domain::{Point, Rect, ShapeColor, Tool};
use snapink::host::{FileCapture, FileSink, NoTextEditor, StaticWindows};
use snapink::session::{CaptureSession, Host, Msg, SessionEvent};

#[derive(Parser, Debug)]
#[command(name = "snapink")]
#[command(version, about = "Crop and annotate a region of a screenshot")]
struct Cli {
    /// Image used as the captured screen
    input: PathBuf,

    /// Region to select as x,y,w,h (drag from corner to corner)
    #[arg(long, short = 'r', value_name = "X,Y,W,H", value_parser = parse_rect, conflicts_with = "click")]
    region: Option<Rect>,

    /// Window rectangle available for click selection, topmost first
    #[arg(long = "window", value_name = "X,Y,W,H", value_parser = parse_rect)]
    windows: Vec<Rect>,

    /// Select the window under this point instead of dragging a region
    #[arg(long, value_name = "X,Y", value_parser = parse_point)]
    click: Option<Point>,

    /// Annotation color (red, green, blue, yellow, white, black or #rrggbb)
    #[arg(long, short = 'c', value_parser = parse_color)]
    color: Option<ShapeColor>,

    /// Stroke width for new annotations (1 to 64, presets 1, 3, 5, 8)
    #[arg(long, short = 's', value_parser = parse_stroke)]
    stroke: Option<f32>,

    /// Rectangle outline x,y,w,h
    #[arg(long = "rect", value_name = "X,Y,W,H", value_parser = parse_rect)]
    rects: Vec<Rect>,

    /// Highlighted area x,y,w,h
    #[arg(long = "highlight", value_name = "X,Y,W,H", value_parser = parse_rect)]
    highlights: Vec<Rect>,

    /// Blurred area x,y,w,h
    #[arg(long = "blur", value_name = "X,Y,W,H", value_parser = parse_rect)]
    blurs: Vec<Rect>,

    /// Pixelated area x,y,w,h
    #[arg(long = "mosaic", value_name = "X,Y,W,H", value_parser = parse_rect)]
    mosaics: Vec<Rect>,

    /// Arrow x1,y1,x2,y2 pointing at the second point
    #[arg(long = "arrow", value_name = "X1,Y1,X2,Y2", value_parser = parse_segment)]
    arrows: Vec<(Point, Point)>,

    /// Numbered marker at x,y
    #[arg(long = "number", value_name = "X,Y", value_parser = parse_point)]
    numbers: Vec<Point>,

    /// Output file (default: timestamped file in the configured folder)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Also write the result to this file as the "clipboard" copy
    #[arg(long, value_name = "FILE", conflicts_with = "output")]
    copy_to: Option<PathBuf>,

    /// Remember color and stroke width for the next run
    #[arg(long, action = ArgAction::SetTrue)]
    remember: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = SnapConfig::load();

    let mut sink = FileSink::new(config.image_format, config.jpeg_quality);
    if let Some(path) = &cli.copy_to {
        sink = sink.with_clipboard_file(path);
    }
    let host = Host {
        windows: Box::new(StaticWindows::new(cli.windows.clone())),
        editor: Box::new(NoTextEditor),
        sink: Box::new(sink),
    };

    let capture = FileCapture::new(&cli.input);
    let mut session = CaptureSession::start(&capture, None, host, config)?;
    if cli.remember {
        session = session.with_config_path(SnapConfig::config_path()?);
    }
    let events = session.events();
    let tx = session.sender();
    let send = |msg: Msg| tx.send(msg).context("Session channel closed");

    // Selection
    match (cli.region, cli.click) {
        (Some(region), _) => {
            drag(&send, Point::new(region.x, region.y), Point::new(region.right(), region.bottom()))?;
        }
        (None, Some(point)) => {
            send(Msg::pointer_move(point.x, point.y))?;
            drag(&send, point, point)?;
        }
        (None, None) => {
            let bounds = session.capture().bounds();
            drag(&send, Point::new(0, 0), Point::new(bounds.right(), bounds.bottom()))?;
        }
    }

    // Style
    if let Some(color) = cli.color {
        send(Msg::set_color(color))?;
    }
    if let Some(stroke) = cli.stroke {
        send(Msg::set_stroke_width(stroke))?;
    }

    // Annotations, painted in this order
    let areas = [
        (Tool::Blur, &cli.blurs),
        (Tool::Mosaic, &cli.mosaics),
        (Tool::Highlight, &cli.highlights),
        (Tool::Rectangle, &cli.rects),
    ];
    for (tool, rects) in areas {
        send(Msg::set_tool(tool))?;
        for r in rects {
            drag(&send, Point::new(r.x, r.y), Point::new(r.right(), r.bottom()))?;
        }
    }
    send(Msg::set_tool(Tool::Arrow))?;
    for &(start, end) in &cli.arrows {
        drag(&send, start, end)?;
    }
    send(Msg::set_tool(Tool::Number))?;
    for &point in &cli.numbers {
        drag(&send, point, point)?;
    }

    let finish = match (&cli.copy_to, &cli.output) {
        (Some(_), _) => Msg::copy(),
        (None, Some(path)) => Msg::save_to(path),
        (None, None) => Msg::save(),
    };
    send(finish)?;

    session.pump();

    for event in events.try_iter() {
        match event {
            SessionEvent::SelectionFinalized(rect) => {
                log::info!("Selected {}x{} at ({}, {})", rect.width, rect.height, rect.x, rect.y);
            }
            SessionEvent::Exported(target) => log::info!("Exported to {:?}", target),
            SessionEvent::ExportFailed(reason) => bail!("Export failed: {}", reason),
            SessionEvent::ShapeCountChanged(_) | SessionEvent::Closed => {}
        }
    }
    if !session.is_closed() {
        bail!("Nothing was exported");
    }

    Ok(())
}

fn drag(send: &impl Fn(Msg) -> anyhow::Result<()>, from: Point, to: Point) -> anyhow::Result<()> {
    send(Msg::pointer_down(from.x, from.y))?;
    send(Msg::pointer_move(to.x, to.y))?;
    send(Msg::pointer_up(to.x, to.y))
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[i32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {} comma-separated numbers, got '{}'", N, s));
    }
    let mut out = [0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{}' is not a whole number", part))?;
    }
    Ok(out)
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let [x, y, w, h] = parse_numbers::<4>(s)?;
    if w <= 0 || h <= 0 {
        return Err(format!("'{}' has no area", s));
    }
    Ok(Rect::new(x, y, w, h))
}

fn parse_point(s: &str) -> Result<Point, String> {
    let [x, y] = parse_numbers::<2>(s)?;
    Ok(Point::new(x, y))
}

fn parse_segment(s: &str) -> Result<(Point, Point), String> {
    let [x1, y1, x2, y2] = parse_numbers::<4>(s)?;
    Ok((Point::new(x1, y1), Point::new(x2, y2)))
}

fn parse_stroke(s: &str) -> Result<f32, String> {
    let width: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !width.is_finite() || width < STROKE_PRESETS[0] || width > MAX_STROKE_WIDTH {
        return Err(format!(
            "stroke width must be between {} and {}, got '{}'",
            STROKE_PRESETS[0], MAX_STROKE_WIDTH, s
        ));
    }
    Ok(width)
}

fn parse_color(s: &str) -> Result<ShapeColor, String> {
    let named = match s.to_ascii_lowercase().as_str() {
        "red" => Some(ShapeColor::RED),
        "green" => Some(ShapeColor::GREEN),
        "blue" => Some(ShapeColor::BLUE),
        "yellow" => Some(ShapeColor::YELLOW),
        "white" => Some(ShapeColor::WHITE),
        "black" => Some(ShapeColor::BLACK),
        _ => None,
    };
    if let Some(color) = named {
        return Ok(color);
    }

    let hex = s
        .strip_prefix('#')
        .filter(|h| h.len() == 6 && h.is_ascii())
        .ok_or_else(|| format!("unknown color '{}'", s))?;
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| format!("bad hex color '{}'", s))
    };
    Ok(ShapeColor::new(channel(0)?, channel(2)?, channel(4)?))
}
