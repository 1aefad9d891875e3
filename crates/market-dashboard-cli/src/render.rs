use market_dashboard_client::panel::{PanelBody, PanelDisplay};
use market_dashboard_core::sparkline::{Canvas, SparkPath};

const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Text rendering of a sparkline path: one block glyph per point, taller
/// glyphs for points nearer the top of the canvas.
pub fn blocks(path: &SparkPath, canvas: Canvas) -> String {
    let inner = canvas.height - 2.0 * canvas.padding;
    path.points()
        .iter()
        .map(|p| {
            let level = if inner > 0.0 {
                (1.0 - (p.y - canvas.padding) / inner).clamp(0.0, 1.0)
            } else {
                0.5
            };
            BLOCKS[(level * (BLOCKS.len() - 1) as f64).round() as usize]
        })
        .collect()
}

pub fn render_panel(display: &PanelDisplay, svg: bool) -> String {
    let mut lines = vec![format!(
        "{} [{}]  {} ({})",
        display.symbol,
        display.timeframe,
        display.badge.direction.badge(),
        display.badge.score
    )];

    match &display.body {
        PanelBody::Loading => lines.push("  loading...".to_string()),
        PanelBody::Error { message, guidance } => {
            lines.push(format!("  ! {message}"));
            lines.push(format!("    {guidance}"));
        }
        PanelBody::Ready {
            indicators,
            updated_at,
            sparkline,
        } => {
            let fields: Vec<String> = indicators
                .iter()
                .map(|f| format!("{} {}", f.label, f.value))
                .collect();
            lines.push(format!("  {}", fields.join("   ")));
            lines.push(format!("  updated: {updated_at}"));
            if !sparkline.is_empty() {
                lines.push(format!("  {}", blocks(sparkline, Canvas::SPARKLINE)));
            }
            if svg {
                lines.push(format!("  path: {sparkline}"));
            }
        }
    }

    let mut out = String::new();
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_dashboard_client::panel::{ERROR_GUIDANCE, IndicatorField};
    use market_dashboard_core::classifier::{Classification, Direction};
    use market_dashboard_core::sparkline::reduce;
    use market_dashboard_core::symbol::Symbol;
    use market_dashboard_core::timeframe::TimeFrame;
    use rust_decimal::Decimal;

    fn display(body: PanelBody, badge: Classification) -> PanelDisplay {
        PanelDisplay {
            symbol: Symbol::parse("aapl").unwrap(),
            timeframe: TimeFrame::Day1,
            badge,
            body,
        }
    }

    #[test]
    fn blocks_follow_path_height() {
        let path = reduce(&[10.0, 12.0, 11.0], Canvas::SPARKLINE);
        assert_eq!(blocks(&path, Canvas::SPARKLINE), "▁█▅");
    }

    #[test]
    fn blocks_for_flat_series_are_mid_height() {
        let path = reduce(&[3.0, 3.0], Canvas::SPARKLINE);
        assert_eq!(blocks(&path, Canvas::SPARKLINE), "▅▅");
    }

    #[test]
    fn render_loading() {
        let text = render_panel(&display(PanelBody::Loading, Classification::NONE), false);
        assert_eq!(text, "AAPL [1d]  • neutral (0)\n  loading...\n");
    }

    #[test]
    fn render_error_includes_guidance() {
        let body = PanelBody::Error {
            message: "could not fetch data".into(),
            guidance: ERROR_GUIDANCE,
        };
        let text = render_panel(&display(body, Classification::NONE), false);
        assert!(text.contains("! could not fetch data"));
        assert!(text.contains(ERROR_GUIDANCE));
    }

    #[test]
    fn render_ready_with_svg_path() {
        let body = PanelBody::Ready {
            indicators: [
                ("MA50", "105.00"),
                ("MA200", "100.00"),
                ("RSI(14)", "-"),
                ("Vol SMA20", "1200.00"),
            ]
            .map(|(label, value)| IndicatorField {
                label,
                value: value.into(),
            }),
            updated_at: "2025-01-15 00:00 UTC".into(),
            sparkline: reduce(&[10.0, 12.0, 11.0], Canvas::SPARKLINE),
        };
        let badge = Classification {
            direction: Direction::Up,
            score: Decimal::new(7, 1),
        };

        let text = render_panel(&display(body, badge), true);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "AAPL [1d]  ↑ up (0.7)");
        assert_eq!(
            lines[1],
            "  MA50 105.00   MA200 100.00   RSI(14) -   Vol SMA20 1200.00"
        );
        assert_eq!(lines[2], "  updated: 2025-01-15 00:00 UTC");
        assert_eq!(lines[3], "  ▁█▅");
        assert_eq!(lines[4], "  path: M 4 52 L 110 4 L 216 28");
        assert_eq!(lines.len(), 5);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn render_ready_without_history_omits_blocks() {
        let body = PanelBody::Ready {
            indicators: ["MA50", "MA200", "RSI(14)", "Vol SMA20"].map(|label| IndicatorField {
                label,
                value: "-".into(),
            }),
            updated_at: "-".into(),
            sparkline: reduce(&[], Canvas::SPARKLINE),
        };

        let text = render_panel(&display(body, Classification::NONE), false);
        assert_eq!(
            text,
            concat!(
                "AAPL [1d]  • neutral (0)\n",
                "  MA50 -   MA200 -   RSI(14) -   Vol SMA20 -\n",
                "  updated: -\n",
            )
        );
    }
}
