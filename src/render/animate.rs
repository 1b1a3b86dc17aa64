use crate::pipeline::types::PivotTable;
use crate::render::config::{RenderConfig, axis_start};
use anyhow::{Result, anyhow, bail};
use chrono::{Datelike, Days, Months, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info};

/// Number of dates visible on each frame, in order. Frames past the end of
/// the data repeat the full series.
pub fn frame_windows(dates: usize, start: usize, pad: usize) -> impl Iterator<Item = usize> {
    (start..dates + pad).map(move |j| j.min(dates))
}

/// First day of every month from `start` through `end`.
pub fn month_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut month = start.with_day(1).unwrap_or(start);
    let mut ticks = Vec::new();
    while month <= end {
        ticks.push(month);
        match month.checked_add_months(Months::new(1)) {
            Some(next) => month = next,
            None => break,
        }
    }
    ticks
}

fn drawing_error(err: impl Display) -> anyhow::Error {
    anyhow!("drawing failed: {err}")
}

fn text_style<'a>(font: &'a str, size: u32, colour: &RGBColor) -> TextStyle<'a> {
    (font, f64::from(size)).into_font().color(colour)
}

/// Writes the smoothed series as an animated GIF, one frame per entry of
/// [`frame_windows`]. Returns the number of frames written.
///
/// # Errors
///
/// Fails if the table has no dates or the output cannot be written.
#[tracing::instrument(skip(table, config, output), fields(dates = table.len(), output = %output.display()))]
pub fn render_animation(table: &PivotTable, config: &RenderConfig, output: &Path) -> Result<usize> {
    let Some(first) = table.dates().first() else {
        bail!("no dates left to plot after smoothing");
    };
    let start = axis_start(*first);

    let root = BitMapBackend::gif(output, config.size, config.frame_delay_ms)
        .map_err(drawing_error)?
        .into_drawing_area();

    let mut frames = 0;
    for visible in frame_windows(table.len(), config.frame_start, config.frame_pad) {
        draw_frame(&root, table, config, start, visible)?;
        root.present().map_err(drawing_error)?;
        frames += 1;
    }

    info!(frames, "Animation written");
    Ok(frames)
}

fn draw_frame(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    table: &PivotTable,
    config: &RenderConfig,
    start: NaiveDate,
    visible: usize,
) -> Result<()> {
    let font = config.font_family.as_str();
    let fg = config.foreground;

    root.fill(&config.background).map_err(drawing_error)?;
    let body = root
        .titled(&config.title, text_style(font, config.title_size, &fg))
        .map_err(drawing_error)?;

    let plot_width = config.size.0.saturating_sub(config.colorbar_width) as i32;
    let (plot_area, bar_area) = body.split_horizontally(plot_width);

    let dates = &table.dates()[..visible];
    let rows = &table.rows()[..visible];
    let end = dates
        .last()
        .copied()
        .unwrap_or(start)
        .max(start + Days::new(1));

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(&config.caption, text_style(font, config.caption_size, &fg))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(100)
        .build_cartesian_2d(start..end, 0f64..config.y_max)
        .map_err(drawing_error)?;

    chart
        .configure_mesh()
        .x_labels(month_starts(start, end).len().max(2))
        .y_labels(config.y_ticks().len())
        .bold_line_style(fg.mix(0.3))
        .light_line_style(TRANSPARENT)
        .axis_style(fg)
        .label_style(text_style(font, config.tick_size, &fg))
        .axis_desc_style(text_style(font, config.label_size, &fg))
        .x_label_formatter(&|d: &NaiveDate| d.format("%b").to_string())
        .y_label_formatter(&|v: &f64| format!("{v:.0}%"))
        .x_desc(format!("Month ({})", start.year()))
        .y_desc(config.y_label.as_str())
        .draw()
        .map_err(drawing_error)?;

    for (index, bin) in table.bins().iter().enumerate() {
        let colour = config.colour_scale.colour(bin.value());
        let points: Vec<(NaiveDate, f64)> = dates
            .iter()
            .zip(rows)
            .filter_map(|(date, row)| row[index].map(|rate| (*date, rate)))
            .collect();

        chart
            .draw_series(LineSeries::new(points, colour.stroke_width(config.line_width)))
            .map_err(drawing_error)?;
    }

    draw_colorbar(&bar_area, config)?;
    debug!(visible, "Frame drawn");
    Ok(())
}

fn draw_colorbar(area: &DrawingArea<BitMapBackend<'_>, Shift>, config: &RenderConfig) -> Result<()> {
    const STEPS: usize = 100;

    let font = config.font_family.as_str();
    let fg = config.foreground;
    let scale = config.colour_scale;

    let mut bar = ChartBuilder::on(area)
        .margin_top(60)
        .margin_bottom(90)
        .margin_left(10)
        .right_y_label_area_size(110)
        .build_cartesian_2d(0f64..1f64, scale.low..scale.high)
        .map_err(drawing_error)?;

    bar.configure_mesh()
        .y_labels(9)
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .axis_style(fg)
        .label_style(text_style(font, config.tick_size, &fg))
        .axis_desc_style(text_style(font, config.label_size, &fg))
        .y_label_formatter(&|v: &f64| format!("{:.0}%", v * 100.0))
        .y_desc(config.colorbar_label.as_str())
        .draw()
        .map_err(drawing_error)?;

    let span = scale.high - scale.low;
    bar.draw_series((0..STEPS).map(|i| {
        let y0 = scale.low + span * i as f64 / STEPS as f64;
        let y1 = scale.low + span * (i + 1) as f64 / STEPS as f64;
        Rectangle::new(
            [(0.0, y0), (1.0, y1)],
            scale.colour((y0 + y1) / 2.0).filled(),
        )
    }))
    .map_err(drawing_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, d).unwrap()
    }

    #[test]
    fn test_frame_windows_hold_last_frame() {
        let frames: Vec<usize> = frame_windows(5, 2, 10).collect();
        assert_eq!(frames.len(), 5 + 10 - 2);
        assert_eq!(&frames[..4], &[2, 3, 4, 5]);
        assert!(frames[3..].iter().all(|&n| n == 5));
    }

    #[test]
    fn test_frame_windows_short_series() {
        let frames: Vec<usize> = frame_windows(1, 2, 10).collect();
        assert_eq!(frames.len(), 9);
        assert!(frames.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_month_starts() {
        let ticks = month_starts(date(1, 1), date(3, 15));
        assert_eq!(ticks, vec![date(1, 1), date(2, 1), date(3, 1)]);
        assert_eq!(month_starts(date(1, 1), date(1, 2)), vec![date(1, 1)]);
    }
}
