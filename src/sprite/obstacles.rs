//! Obstacle silhouettes. Offsets are laid out for the default template
//! sizes and scale with the box so custom sizes still look right.
use crate::engine::{Canvas, Color, Point, Rect, Size};

fn at(rect: &Rect, fx: f64, fy: f64) -> Point {
    Point {
        x: rect.x() + rect.width() * fx,
        y: rect.y() + rect.height() * fy,
    }
}

pub fn pterodactyl(canvas: &dyn Canvas, rect: &Rect, color: Color) {
    let (w, h) = (rect.width(), rect.height());
    // body
    canvas.fill_rect(
        &Rect::new_from_x_y(rect.x() + w / 3.0, rect.y() + h * 0.375, w / 3.0, h * 0.375),
        color,
    );
    // wings
    let shoulder = at(rect, 0.5, 0.375);
    canvas.fill_polygon(&[shoulder, at(rect, 0.0, 0.0), at(rect, 0.0, 0.5)], color);
    canvas.fill_polygon(&[shoulder, at(rect, 1.0, 0.0), at(rect, 1.0, 0.5)], color);
    // head and beak
    canvas.fill_circle(at(rect, 5.0 / 6.0, 0.375), h / 5.0, color);
    canvas.fill_polygon(
        &[at(rect, 11.0 / 12.0, 0.375), at(rect, 13.0 / 12.0, 0.25), at(rect, 13.0 / 12.0, 0.5)],
        color,
    );
}

pub fn vine(canvas: &dyn Canvas, rect: &Rect, color: Color) {
    // stalk hangs from well above the box
    canvas.fill_rect(
        &Rect::new_from_x_y(
            rect.x() + rect.width() / 2.0 - 5.0,
            rect.y() - 100.0,
            10.0,
            100.0 + rect.height(),
        ),
        color,
    );
    let leaf = Size {
        width: 15.0,
        height: 8.0,
    };
    canvas.fill_ellipse(
        Point {
            x: rect.x() + 10.0,
            y: rect.y() + 20.0,
        },
        leaf,
        color,
    );
    canvas.fill_ellipse(
        Point {
            x: rect.right() - 10.0,
            y: rect.y() + 40.0,
        },
        leaf,
        color,
    );
}

pub fn arrow(canvas: &dyn Canvas, rect: &Rect, color: Color) {
    let mid = rect.y() + rect.height() / 2.0;
    // shaft
    canvas.fill_rect(
        &Rect::new_from_x_y(rect.x(), mid - 2.0, rect.width() - 10.0, 4.0),
        color,
    );
    // head
    canvas.fill_polygon(
        &[
            Point { x: rect.right() - 10.0, y: rect.y() },
            Point { x: rect.right(), y: mid },
            Point { x: rect.right() - 10.0, y: rect.bottom() },
        ],
        color,
    );
    // fletching
    canvas.fill_polygon(
        &[
            Point { x: rect.x(), y: rect.y() },
            Point { x: rect.x() + 10.0, y: mid },
            Point { x: rect.x(), y: rect.bottom() },
        ],
        color,
    );
}

pub fn turret(canvas: &dyn Canvas, rect: &Rect, color: Color) {
    let base_height = 20.0;
    canvas.fill_rect(
        &Rect::new_from_x_y(rect.x(), rect.bottom() - base_height, rect.width(), base_height),
        color,
    );
    canvas.fill_rect(
        &Rect::new_from_x_y(rect.x() + 10.0, rect.y(), rect.width() - 20.0, rect.height() - base_height),
        color,
    );
    // roof
    canvas.fill_polygon(
        &[
            Point { x: rect.x() + 5.0, y: rect.y() },
            Point { x: rect.right() - 5.0, y: rect.y() },
            Point { x: rect.x() + rect.width() / 2.0, y: rect.y() - 10.0 },
        ],
        color,
    );
    // window
    canvas.fill_rect(
        &Rect::new_from_x_y(rect.x() + rect.width() / 2.0 - 5.0, rect.y() + 15.0, 10.0, 15.0),
        Color::BLACK,
    );
}

pub fn drone(canvas: &dyn Canvas, rect: &Rect, color: Color) {
    canvas.fill_rect(
        &Rect::new_from_x_y(rect.x() + 10.0, rect.y() + 10.0, rect.width() - 20.0, 10.0),
        color,
    );
    // rotors
    let rotor_left = Point { x: rect.x() + 15.0, y: rect.y() + 5.0 };
    let rotor_right = Point { x: rect.right() - 15.0, y: rect.y() + 5.0 };
    canvas.fill_circle(rotor_left, 10.0, color);
    canvas.fill_circle(rotor_right, 10.0, color);
    // running lights
    canvas.fill_circle(
        Point { x: rotor_left.x, y: rect.y() + 20.0 },
        3.0,
        Color::WHITE,
    );
    canvas.fill_circle(
        Point { x: rotor_right.x, y: rect.y() + 20.0 },
        3.0,
        Color::rgb(0xff, 0x00, 0x00),
    );
}

pub fn barrier(canvas: &dyn Canvas, rect: &Rect, color: Color) {
    canvas.fill_rect(rect, color);

    // electric zigzag across the top edge
    let segments = 5;
    let segment_width = rect.width() / f64::from(segments);
    let segment_height = rect.height() / f64::from(segments);
    let mut spark = vec![rect.position];
    spark.extend((0..segments).map(|i| Point {
        x: rect.x() + segment_width * f64::from(i + 1),
        y: if i % 2 == 0 {
            rect.y() + segment_height
        } else {
            rect.y() - segment_height
        },
    }));
    canvas.stroke_polyline(&spark, Color::WHITE, 2.0);
}

pub fn block(canvas: &dyn Canvas, rect: &Rect, color: Color) {
    canvas.fill_rect(rect, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{DrawCall, RecordingCanvas};

    #[test]
    fn barrier_zigzag_alternates_around_top_edge() {
        let canvas = RecordingCanvas::default();
        let rect = Rect::new_from_x_y(0.0, 100.0, 40.0, 50.0);
        barrier(&canvas, &rect, Color::BLACK);

        let calls = canvas.calls();
        assert_eq!(calls[0], DrawCall::Rect(rect, Color::BLACK));
        let DrawCall::Polyline(points, color, _) = &calls[1] else {
            panic!("expected zigzag, got {:?}", calls[1]);
        };
        assert_eq!(*color, Color::WHITE);
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![100.0, 110.0, 90.0, 110.0, 90.0, 110.0]);
        assert_eq!(points.last().map(|p| p.x), Some(40.0));
    }

    #[test]
    fn block_fills_exactly_its_box() {
        let canvas = RecordingCanvas::default();
        let rect = Rect::new_from_x_y(5.0, 6.0, 7.0, 8.0);
        block(&canvas, &rect, Color::WHITE);
        assert_eq!(canvas.calls(), vec![DrawCall::Rect(rect, Color::WHITE)]);
    }
}
