use std::fmt;

/// Logical drawing area for a sparkline, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Canvas {
    /// Size used by the dashboard panels.
    pub const SPARKLINE: Canvas = Canvas {
        width: 220.0,
        height: 56.0,
        padding: 4.0,
    };
}

impl Default for Canvas {
    fn default() -> Self {
        Self::SPARKLINE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
}

impl PathCommand {
    pub fn point(&self) -> Point {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => *p,
        }
    }
}

/// Ordered polyline instructions: one move-to followed by line-tos.
///
/// `Display` renders SVG path data, e.g. `M 4 28 L 110 4 L 216 52`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparkPath {
    commands: Vec<PathCommand>,
}

impl SparkPath {
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn points(&self) -> Vec<Point> {
        self.commands.iter().map(PathCommand::point).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl fmt::Display for SparkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match command {
                PathCommand::MoveTo(p) => write!(f, "M {} {}", p.x, p.y)?,
                PathCommand::LineTo(p) => write!(f, "L {} {}", p.x, p.y)?,
            }
        }
        Ok(())
    }
}

/// Reduce a price series to a polyline normalized into `canvas`.
///
/// Higher values plot nearer the top. A flat series sits on the vertical
/// center; an empty series yields an empty path.
pub fn reduce(values: &[f64], canvas: Canvas) -> SparkPath {
    let Some(&first) = values.first() else {
        return SparkPath::default();
    };

    let (min, max) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let inner_height = canvas.height - 2.0 * canvas.padding;
    let y_for = |v: f64| {
        if max == min {
            canvas.height / 2.0
        } else {
            canvas.padding + inner_height * (1.0 - (v - min) / (max - min))
        }
    };

    let segments = values.len().saturating_sub(1).max(1);
    let step = (canvas.width - 2.0 * canvas.padding) / segments as f64;
    let commands = values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let point = Point {
                x: canvas.padding + i as f64 * step,
                y: y_for(v),
            };
            if i == 0 {
                PathCommand::MoveTo(point)
            } else {
                PathCommand::LineTo(point)
            }
        })
        .collect();

    SparkPath { commands }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_path() {
        let path = reduce(&[], Canvas::SPARKLINE);
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn first_point_starts_at_padding() {
        for values in [vec![5.0], vec![1.0, 2.0], vec![3.0, 1.0, 4.0, 1.0, 5.0]] {
            let path = reduce(&values, Canvas::SPARKLINE);
            assert!(matches!(path.commands()[0], PathCommand::MoveTo(_)));
            assert_eq!(path.points()[0].x, Canvas::SPARKLINE.padding);
        }
    }

    #[test]
    fn flat_series_sits_on_center() {
        let path = reduce(&[7.5, 7.5, 7.5, 7.5], Canvas::SPARKLINE);
        assert_eq!(path.len(), 4);
        assert!(path.points().iter().all(|p| p.y == 28.0));
    }

    #[test]
    fn single_value_is_one_centered_point() {
        let path = reduce(&[42.0], Canvas::SPARKLINE);
        assert_eq!(path.points(), vec![Point { x: 4.0, y: 28.0 }]);
    }

    #[test]
    fn higher_values_plot_nearer_the_top() {
        let path = reduce(&[10.0, 12.0, 11.0], Canvas::SPARKLINE);
        let ys: Vec<f64> = path.points().iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![52.0, 4.0, 28.0]);
    }

    #[test]
    fn horizontal_spacing_is_uniform() {
        let path = reduce(&[10.0, 12.0, 11.0], Canvas::SPARKLINE);
        let xs: Vec<f64> = path.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![4.0, 110.0, 216.0]);
    }

    #[test]
    fn only_first_command_moves() {
        let path = reduce(&[1.0, 2.0, 3.0, 4.0], Canvas::SPARKLINE);
        let line_tos = path
            .commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::LineTo(_)))
            .count();
        assert_eq!(line_tos, 3);
    }

    #[test]
    fn renders_svg_path_data() {
        let path = reduce(&[10.0, 12.0, 11.0], Canvas::SPARKLINE);
        assert_eq!(path.to_string(), "M 4 52 L 110 4 L 216 28");
    }

    #[test]
    fn custom_canvas() {
        let canvas = Canvas {
            width: 100.0,
            height: 20.0,
            padding: 0.0,
        };
        let path = reduce(&[0.0, 1.0], canvas);
        assert_eq!(
            path.points(),
            vec![Point { x: 0.0, y: 20.0 }, Point { x: 100.0, y: 0.0 }]
        );
    }
}
