// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic input driving gesture filters: drag a window around a 400x300 surface.
//!
//! This example shows how to combine:
//! - `understory_inject` to script touch and mouse input on a virtual clock,
//! - `understory_event_state` to turn the recorded events into drag gestures.
//!
//! Run:
//! - `cargo run -p understory_demos --example window_drag`
//! - `cargo run -p understory_demos --example window_drag -- trace` to see filter state.

use std::error::Error;

use kurbo::{Point, Rect, Size, Vec2};
use understory_event_state::GestureFilter;
use understory_event_state::adapters::inject::InjectAdapter;
use understory_event_state::config::GestureConfig;
use understory_event_state::drag::{DragGestureFilter, LongPressDragEvent, LongPressDragGestureFilter};
use understory_event_state::pass::GestureDetector;
use understory_event_state::raw_drag::DragEvent;
use understory_inject::dispatcher::InputDispatcher;
use understory_inject::event::InjectedEvent;
use understory_inject::sink::{FixedRoot, RecordingSink};
use understory_inject::types::{MouseButton, PointerId};

const SURFACE: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

fn init_logging(filter: Option<&str>) {
    let mut builder = env_logger::Builder::new();
    if let Some(filter) = filter {
        builder.parse_filters(filter);
    } else if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
    log::debug!("logging initialized");
}

fn dispatcher() -> InputDispatcher<FixedRoot, RecordingSink> {
    InputDispatcher::new(FixedRoot(SURFACE), RecordingSink::new())
}

/// Feed every recorded event through `chain`, then flush timers up to `until`.
fn replay(
    events: &[InjectedEvent],
    chain: &mut [&mut dyn GestureFilter],
    until: u64,
) -> Result<(), Box<dyn Error>> {
    let mut detector = GestureDetector::new(SURFACE.size());
    let mut adapter = InjectAdapter::new();
    for event in events {
        adapter.feed(event, &mut detector, chain)?;
    }
    detector.advance_time(chain, until)?;
    Ok(())
}

fn touch_slop_drag() -> Result<(), Box<dyn Error>> {
    println!("\n== Touch drag past the slop ==");
    let mut d = dispatcher();
    d.swipe(
        PointerId(0),
        Point::new(50.0, 50.0),
        Point::new(250.0, 120.0),
        200,
    )?;
    d.send()?;

    let mut window = Point::new(20.0, 20.0);
    let mut drag = DragGestureFilter::new(GestureConfig::default(), |event| {
        println!("  {event:?}");
        match event {
            DragEvent::Drag(delta) => {
                window += delta;
                delta
            }
            _ => Vec2::ZERO,
        }
    });
    replay(d.sink().events(), &mut [&mut drag], d.now())?;
    drop(drag);
    // The slop is eaten before the first Drag, so the window trails the finger.
    println!("window moved to ({:.1}, {:.1})", window.x, window.y);
    Ok(())
}

fn long_press_drag() -> Result<(), Box<dyn Error>> {
    println!("\n== Touch long press, then drag ==");
    let id = PointerId(3);
    let mut d = dispatcher();
    d.enqueue_touch_down(id, Point::new(100.0, 100.0))?;
    d.advance_event_time(600)?;
    for step in 1..=4 {
        d.advance_by_period()?;
        d.update_touch_pointer(id, Point::new(100.0 + 15.0 * f64::from(step), 100.0))?;
        d.enqueue_touch_move()?;
    }
    d.advance_by_period()?;
    d.enqueue_touch_up(id)?;
    d.send()?;

    let mut lifted = false;
    let mut drag = LongPressDragGestureFilter::new(GestureConfig::default(), |event| {
        println!("  {event:?}");
        match event {
            LongPressDragEvent::LongPress(at) => {
                println!("  window picked up at ({:.1}, {:.1})", at.x, at.y);
                lifted = true;
                Vec2::ZERO
            }
            LongPressDragEvent::Drag(delta) => delta,
            LongPressDragEvent::Stop(_) | LongPressDragEvent::Cancel => {
                lifted = false;
                Vec2::ZERO
            }
            LongPressDragEvent::DragStart => Vec2::ZERO,
        }
    });
    replay(d.sink().events(), &mut [&mut drag], d.now())?;
    drop(drag);
    println!("window still lifted: {lifted}");
    Ok(())
}

fn mouse_drag() -> Result<(), Box<dyn Error>> {
    println!("\n== Mouse drag, starting immediately ==");
    let mut d = dispatcher();
    d.enqueue_mouse_move(Point::new(300.0, 200.0))?;
    d.enqueue_mouse_press(MouseButton::Primary)?;
    for step in 1..=3 {
        d.advance_by_period()?;
        d.enqueue_mouse_move(Point::new(300.0 - 10.0 * f64::from(step), 200.0))?;
    }
    d.enqueue_mouse_release(MouseButton::Primary)?;
    d.send()?;

    let mut travelled = Vec2::ZERO;
    let mut drag = DragGestureFilter::new(GestureConfig::default(), |event| {
        println!("  {event:?}");
        if let DragEvent::Drag(delta) = event {
            travelled += delta;
            return delta;
        }
        Vec2::ZERO
    })
    .start_immediately(true);
    replay(d.sink().events(), &mut [&mut drag], d.now())?;
    drop(drag);
    println!("travelled ({:.1}, {:.1})", travelled.x, travelled.y);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // An optional first argument overrides `RUST_LOG`, e.g. `understory_event_state=trace`.
    let filter = std::env::args().nth(1);
    init_logging(filter.as_deref());
    log::info!(
        "surface {:?}, slop {}",
        Size::new(SURFACE.width(), SURFACE.height()),
        GestureConfig::default().touch_slop
    );
    touch_slop_drag()?;
    long_press_drag()?;
    mouse_drag()?;
    Ok(())
}
