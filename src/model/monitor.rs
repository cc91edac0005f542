use std::fmt;

/// Точка в координатах корневого окна
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Прямоугольник в координатах корневого окна: монитор или геометрия окна
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[allow(dead_code)]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Полностью ли `other` лежит внутри прямоугольника (границы включительно)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        let (ox, oy) = (i64::from(other.x), i64::from(other.y));

        ox >= x
            && oy >= y
            && ox + i64::from(other.width) <= x + i64::from(self.width)
            && oy + i64::from(other.height) <= y + i64::from(self.height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Выход дисплея в порядке перечисления RandR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    pub name: String,
    pub connected: bool,
    /// Прямоугольник активного CRTC; `None`, если выход не привязан к CRTC
    pub crtc: Option<Rect>,
}

impl OutputInfo {
    fn active_rect(&self) -> Option<Rect> {
        if self.connected {
            self.crtc
        } else {
            None
        }
    }
}

/// Раскладка из двух слотов: основной и второй мониторы.
///
/// Первый подключённый выход с активным CRTC становится `main`, следующий
/// `secondary`, остальные отбрасываются. Порядок задаёт X-сервер, а не
/// свойства самих выходов. Незаполненный слот сохраняет прежнее значение.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Topology {
    pub main: Rect,
    pub secondary: Rect,
}

impl Topology {
    #[allow(dead_code)]
    pub fn new(main: Rect, secondary: Rect) -> Self {
        Self { main, secondary }
    }

    /// Обновить слоты по списку выходов; возвращает число найденных активных выходов
    pub fn refresh(&mut self, outputs: &[OutputInfo]) -> usize {
        let mut active = outputs.iter().filter_map(OutputInfo::active_rect);

        let mut found = 0;
        if let Some(main) = active.next() {
            self.main = main;
            found += 1;
        }
        if let Some(secondary) = active.next() {
            self.secondary = secondary;
            found += 1;
        }

        found + active.count()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "main={} secondary={}", self.main, self.secondary)
    }
}
