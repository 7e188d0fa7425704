use crate::engine::{Canvas, Color, Point, Rect};

const HEAD_RADIUS: f64 = 15.0;
const EYE_RADIUS: f64 = 3.0;
const ARM_LENGTH: f64 = 15.0;
const ARM_THICKNESS: f64 = 5.0;

/// Stroke the rope through precomputed samples
pub fn rope(canvas: &dyn Canvas, samples: &[Point], color: Color, line_width: f64) {
    canvas.stroke_polyline(samples, color, line_width);
}

/// The tightrope walker : body box, head above it, arms out for balance
/// unless crouched
pub fn walker(canvas: &dyn Canvas, body: &Rect, arms_out: bool) {
    canvas.fill_rect(body, Color::WHITE);

    let head = Point {
        x: body.x() + body.width() / 2.0,
        y: body.y() - 10.0,
    };
    canvas.fill_circle(head, HEAD_RADIUS, Color::WHITE);

    if arms_out {
        let arm_y = body.y() + 10.0;
        canvas.fill_rect(
            &Rect::new_from_x_y(body.x() - ARM_LENGTH, arm_y, ARM_LENGTH, ARM_THICKNESS),
            Color::WHITE,
        );
        canvas.fill_rect(
            &Rect::new_from_x_y(body.right(), arm_y, ARM_LENGTH, ARM_THICKNESS),
            Color::WHITE,
        );
    }

    for dx in [-5.0, 5.0] {
        canvas.fill_circle(
            Point {
                x: head.x + dx,
                y: body.y() - 12.0,
            },
            EYE_RADIUS,
            Color::BLACK,
        );
    }
}
