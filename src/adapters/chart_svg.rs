//! SVG price chart rendering for the dashboard.

use crate::domain::quote::OhlcvBar;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 280.0;
const PADDING: f64 = 40.0;

/// Render the close-price series as an inline SVG line chart with a faint
/// volume histogram underneath. Empty input renders a placeholder message
/// instead of an empty frame.
pub fn price_chart_svg(bars: &[OhlcvBar]) -> String {
    if bars.is_empty() {
        return String::from(r#"<p class="chart-empty">No chart data available.</p>"#);
    }

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;

    let min_close = bars.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);
    let max_close = bars
        .iter()
        .map(|b| b.close)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_volume = bars.iter().map(|b| b.volume).max().unwrap_or(0);

    let range = max_close - min_close;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if bars.len() > 1 {
        plot_width / (bars.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<String> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let x = PADDING + i as f64 * scale_x;
            let y = HEIGHT - PADDING - (bar.close - min_close) * scale_y;
            format!("{x:.1},{y:.1}")
        })
        .collect();
    let polyline_points = points.join(" ");

    let mut volume_bars = String::new();
    if max_volume > 0 {
        let bar_width = (plot_width / bars.len() as f64 * 0.6).max(1.0);
        for (i, bar) in bars.iter().enumerate() {
            let h = bar.volume as f64 / max_volume as f64 * (plot_height * 0.25);
            if h <= 0.0 {
                continue;
            }
            let x = PADDING + i as f64 * scale_x - bar_width / 2.0;
            let y = HEIGHT - PADDING - h;
            volume_bars.push_str(&format!(
                r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_width:.1}" height="{h:.1}" class="vol"/>"#,
            ));
        }
    }

    let rising = bars[bars.len() - 1].close >= bars[0].close;
    let stroke = if rising { "#00c853" } else { "#ff1744" };
    let axis_left = PADDING;
    let axis_bottom = HEIGHT - PADDING;

    format!(
        r#"<svg viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}" xmlns="http://www.w3.org/2000/svg" class="price-chart" role="img">
<style>.axis{{stroke:#30363d;stroke-width:1}}.vol{{fill:#58a6ff;opacity:0.25}}.lbl{{fill:#8b949e;font-size:11px;font-family:monospace}}</style>
<line class="axis" x1="{axis_left:.0}" y1="{PADDING:.0}" x2="{axis_left:.0}" y2="{axis_bottom:.0}"/>
<line class="axis" x1="{axis_left:.0}" y1="{axis_bottom:.0}" x2="{right:.0}" y2="{axis_bottom:.0}"/>
<text class="lbl" x="2" y="{PADDING:.0}">{max_close:.2}</text>
<text class="lbl" x="2" y="{axis_bottom:.0}">{min_close:.2}</text>
{volume_bars}
<polyline fill="none" stroke="{stroke}" stroke-width="1.5" points="{polyline_points}"/>
</svg>"#,
        right = WIDTH - PADDING,
    )
}
