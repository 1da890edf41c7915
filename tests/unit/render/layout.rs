use super::*;
use crate::foundation::core::{Fps, Rgb8};
use crate::timeline::window::{FrameClock, WindowExtents};
use crate::view::config::{NoteTrim, Palette};

pub(crate) fn view(canvas: Canvas, pitch_min: u8, pitch_max: u8) -> ResolvedView {
    ResolvedView {
        clock: FrameClock::new(0.0, 2.0, Fps::new(30, 1).unwrap()).unwrap(),
        start_time: 0.0,
        end_time: 2.0,
        extents: WindowExtents::new(1.0, 1.0).unwrap(),
        pitch_min,
        pitch_max,
        canvas,
        margin_y: 10,
        palette: Palette {
            active: Rgb8::new(255, 0, 0),
            silent: Rgb8::new(0, 0, 255),
            background: Rgb8::new(0, 0, 0),
        },
        trim: NoteTrim { x: 2.0, y: 2.0 },
    }
}

fn note(pitch: u8, start: f64, end: f64) -> NoteInterval {
    let mut n = NoteInterval::open(0, pitch, 100, 0);
    n.close(0);
    n.start_time = start;
    n.end_time = end;
    n
}

fn layout() -> RollLayout {
    RollLayout::new(&view(
        Canvas {
            width: 200,
            height: 100,
        },
        60,
        64,
    ))
}

#[test]
fn scales_follow_canvas_and_window() {
    let l = layout();
    assert_eq!(l.row_height(), 16.0);
    assert_eq!(l.pixels_per_second(), 100.0);
}

#[test]
fn note_geometry_matches_row_and_time() {
    let l = layout();
    let low = l.note_rect(&note(60, 0.5, 1.0), -1.0).unwrap();
    assert_eq!(
        low,
        PixelRect {
            x0: 150,
            y0: 75,
            x1: 198,
            y1: 89
        }
    );
    assert_eq!(low.height(), 14);

    let high = l.note_rect(&note(64, 0.5, 1.0), -1.0).unwrap();
    assert_eq!((high.y0, high.y1), (11, 25));
    assert_eq!(high.width(), 48);
}

#[test]
fn notes_are_clipped_to_canvas() {
    let l = layout();
    let r = l.note_rect(&note(62, -2.0, 0.2), -1.0).unwrap();
    assert_eq!((r.x0, r.x1), (0, 118));

    let r = l.note_rect(&note(62, 0.5, 9.0), -1.0).unwrap();
    assert_eq!((r.x0, r.x1), (150, 200));
}

#[test]
fn off_canvas_and_out_of_range_notes_are_skipped() {
    let l = layout();
    assert_eq!(l.note_rect(&note(62, 5.0, 6.0), -1.0), None);
    assert_eq!(l.note_rect(&note(59, 0.0, 1.0), -1.0), None);
    assert_eq!(l.note_rect(&note(65, 0.0, 1.0), -1.0), None);
}

#[test]
fn very_short_notes_keep_one_pixel() {
    let l = layout();
    let r = l.note_rect(&note(61, 0.0, 0.001), -1.0).unwrap();
    assert_eq!(r.width(), 1);
}

#[test]
fn single_pitch_fills_available_height() {
    let l = RollLayout::new(&view(
        Canvas {
            width: 64,
            height: 40,
        },
        60,
        60,
    ));
    assert_eq!(l.row_height(), 20.0);
    let r = l.note_rect(&note(60, -1.0, 1.0), -1.0).unwrap();
    assert_eq!((r.y0, r.y1), (11, 29));
    assert_eq!((r.x0, r.x1), (0, 62));
}
