use crate::engine::{Canvas, Color, Point, Rect};

const TRUNK: Color = Color::rgb(0x8b, 0x45, 0x13);
const FOLIAGE: Color = Color::rgb(0x22, 0x8b, 0x22);
const STONE: Color = Color::rgb(0x80, 0x80, 0x80);
const CONCRETE: Color = Color::rgb(0x33, 0x33, 0x33);
const NEON: Color = Color::rgb(0x00, 0xff, 0xaa);
const ANTENNA: Color = Color::rgb(0x66, 0x66, 0x66);

pub fn tree(canvas: &dyn Canvas, at: Point, size: f64) {
    canvas.fill_rect(
        &Rect::new_from_x_y(at.x + size / 3.0, at.y, size / 3.0, size),
        TRUNK,
    );
    canvas.fill_circle(
        Point {
            x: at.x + size / 2.0,
            y: at.y - size / 2.0,
        },
        size / 1.5,
        FOLIAGE,
    );
}

pub fn castle(canvas: &dyn Canvas, at: Point, size: f64) {
    let tower = size / 4.0;
    canvas.fill_rect(&Rect::new_from_x_y(at.x, at.y, size, size), STONE);
    canvas.fill_rect(&Rect::new_from_x_y(at.x - tower, at.y, tower, size / 1.5), STONE);
    canvas.fill_rect(&Rect::new_from_x_y(at.x + size, at.y, tower, size / 1.5), STONE);

    // pointed tower tops
    for left in [at.x - tower, at.x + size] {
        canvas.fill_polygon(
            &[
                Point { x: left, y: at.y },
                Point { x: left + tower / 2.0, y: at.y - tower },
                Point { x: left + tower, y: at.y },
            ],
            STONE,
        );
    }
}

pub fn building(canvas: &dyn Canvas, at: Point, size: f64) {
    canvas.fill_rect(&Rect::new_from_x_y(at.x, at.y, size / 2.0, size), CONCRETE);

    // 4 rows x 3 columns of lit windows
    let window = size / 10.0;
    let gap = size / 8.0;
    for row in 0..4 {
        for column in 0..3 {
            canvas.fill_rect(
                &Rect::new_from_x_y(
                    at.x + f64::from(column) * gap + window,
                    at.y + f64::from(row) * gap + window,
                    window,
                    window,
                ),
                NEON,
            );
        }
    }

    canvas.fill_rect(
        &Rect::new_from_x_y(at.x + size / 4.0, at.y - size / 3.0, size / 20.0, size / 3.0),
        ANTENNA,
    );
}

pub fn nothing(_canvas: &dyn Canvas, _at: Point, _size: f64) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::RecordingCanvas;

    #[test]
    fn building_has_twelve_windows() {
        let canvas = RecordingCanvas::default();
        building(&canvas, Point { x: 0.0, y: 100.0 }, 40.0);
        // base + 12 windows + antenna
        assert_eq!(canvas.calls().len(), 14);
    }
}
