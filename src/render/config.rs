use chrono::{Datelike, NaiveDate};
use plotters::style::{BLACK, BLUE, RED, RGBColor, WHITE};

/// Democratic share drawn in pure red.
pub const COLOUR_LOW: f64 = 0.1;
/// Democratic share drawn in pure blue.
pub const COLOUR_HIGH: f64 = 0.9;
/// Top of the y-axis, in percent.
pub const Y_MAX_PERCENT: f64 = 70.0;
/// Gridline spacing on the y-axis, in percent.
pub const Y_STEP_PERCENT: f64 = 5.0;
/// Number of dates shown on the first frame.
pub const FRAME_START: usize = 2;
/// Frames added past the last date so the finished chart holds.
pub const FRAME_PAD: usize = 10;

/// Linear colour ramp keyed to a bin's numeric value. Values outside
/// `low..=high` take the end colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourScale {
    pub low: f64,
    pub high: f64,
    pub from: RGBColor,
    pub to: RGBColor,
}

impl Default for ColourScale {
    fn default() -> Self {
        Self {
            low: COLOUR_LOW,
            high: COLOUR_HIGH,
            from: RED,
            to: BLUE,
        }
    }
}

impl ColourScale {
    pub fn colour(&self, value: f64) -> RGBColor {
        let span = self.high - self.low;
        let t = if span == 0.0 {
            0.0
        } else {
            ((value - self.low) / span).clamp(0.0, 1.0)
        };
        let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        RGBColor(
            lerp(self.from.0, self.to.0),
            lerp(self.from.1, self.to.1),
            lerp(self.from.2, self.to.2),
        )
    }
}

/// Everything the renderer needs to draw the animation. Passed explicitly
/// so separate renders never share plotting state.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub size: (u32, u32),
    pub background: RGBColor,
    pub foreground: RGBColor,
    pub font_family: String,
    pub title: String,
    pub title_size: u32,
    pub caption: String,
    pub caption_size: u32,
    pub label_size: u32,
    pub tick_size: u32,
    pub y_label: String,
    pub colorbar_label: String,
    pub colorbar_width: u32,
    pub y_max: f64,
    pub y_step: f64,
    pub colour_scale: ColourScale,
    pub line_width: u32,
    pub frame_delay_ms: u32,
    pub frame_start: usize,
    pub frame_pad: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: (1400, 1000),
            background: BLACK,
            foreground: WHITE,
            font_family: "sans-serif".to_string(),
            title: "Average Covid Vaccination Rates by County Political Demographic".to_string(),
            title_size: 40,
            caption: "* County demographics compiled from 2020 presidential election voting results   \
                      * Vaccination data source: Centers for Disease Control and Prevention"
                .to_string(),
            caption_size: 18,
            label_size: 24,
            tick_size: 20,
            y_label: "Full Vaccination Rate".to_string(),
            colorbar_label: "% of Vote Democratic".to_string(),
            colorbar_width: 160,
            y_max: Y_MAX_PERCENT,
            y_step: Y_STEP_PERCENT,
            colour_scale: ColourScale::default(),
            line_width: 4,
            frame_delay_ms: 50,
            frame_start: FRAME_START,
            frame_pad: FRAME_PAD,
        }
    }
}

impl RenderConfig {
    /// Y-axis tick positions: `0, step, 2*step, ..` up to `y_max`.
    pub fn y_ticks(&self) -> Vec<f64> {
        if self.y_step <= 0.0 {
            return vec![0.0, self.y_max];
        }
        let steps = (self.y_max / self.y_step).floor() as usize;
        (0..=steps).map(|i| i as f64 * self.y_step).collect()
    }
}

/// January 1 of the year the series starts in.
pub fn axis_start(first: NaiveDate) -> NaiveDate {
    first.with_ordinal(1).unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_scale_ends() {
        let scale = ColourScale::default();
        assert_eq!(scale.colour(0.1), RGBColor(255, 0, 0));
        assert_eq!(scale.colour(0.9), RGBColor(0, 0, 255));
        assert_eq!(scale.colour(0.3), RGBColor(191, 0, 64));
    }

    #[test]
    fn test_colour_scale_clamps() {
        let scale = ColourScale::default();
        assert_eq!(scale.colour(0.0), scale.colour(0.1));
        assert_eq!(scale.colour(1.0), scale.colour(0.9));
    }

    #[test]
    fn test_y_ticks_every_five_percent() {
        let ticks = RenderConfig::default().y_ticks();
        assert_eq!(ticks.len(), 15);
        assert_eq!(ticks[0], 0.0);
        assert_eq!(ticks[1], 5.0);
        assert_eq!(ticks[14], 70.0);
    }

    #[test]
    fn test_axis_start_is_new_year() {
        let first = NaiveDate::from_ymd_opt(2021, 2, 14).unwrap();
        assert_eq!(axis_start(first), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    }
}
