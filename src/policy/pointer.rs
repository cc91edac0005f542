use crate::model::{Point, Rect};

/// Насколько курсор возвращается внутрь от нарушенной границы
pub const POINTER_MARGIN: i64 = 2;

/// Ограничить курсор основным монитором.
///
/// Каждая ось проверяется отдельно: координата вне `[origin, origin + extent - 1]`
/// переносится на `POINTER_MARGIN` внутрь от нарушенного края. `None`, если
/// курсор уже на основном мониторе.
pub fn confine_pointer(pointer: Point, main: &Rect) -> Option<Point> {
    let confined = Point::new(
        clamp_axis(pointer.x, main.x, main.width),
        clamp_axis(pointer.y, main.y, main.height),
    );

    (confined != pointer).then_some(confined)
}

fn clamp_axis(value: i32, origin: i32, extent: u32) -> i32 {
    let low = i64::from(origin);
    let high = low + i64::from(extent);
    let value_wide = i64::from(value);

    let clamped = if value_wide < low {
        low + POINTER_MARGIN
    } else if value_wide > high - 1 {
        high - POINTER_MARGIN
    } else {
        return value;
    };

    i32::try_from(clamped).unwrap_or(if clamped < 0 { i32::MIN } else { i32::MAX })
}
