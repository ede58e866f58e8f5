/// Vertical gap between the title and subtitle blocks when both are present.
pub const BLOCK_SPACING: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockMetrics {
    pub line_count: usize,
    pub line_height: f32,
    pub present: bool,
}

impl BlockMetrics {
    pub fn new(line_count: usize, line_height: f32, present: bool) -> Self {
        Self {
            line_count,
            line_height,
            present,
        }
    }

    pub fn absent() -> Self {
        Self::new(0, 0.0, false)
    }

    pub fn height(&self) -> f32 {
        if self.present {
            self.line_count as f32 * self.line_height
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub title_start_y: f32,
    pub subtitle_start_y: f32,
}

/// Centers the title and subtitle blocks, stacked, inside `canvas_height`.
pub fn layout_blocks(title: BlockMetrics, subtitle: BlockMetrics, canvas_height: f32) -> Layout {
    let title_height = title.height();
    let spacing = if title.present && subtitle.present {
        BLOCK_SPACING
    } else {
        0.0
    };
    let total_height = title_height + subtitle.height() + spacing;
    let title_start_y = (canvas_height - total_height) / 2.0;
    Layout {
        title_start_y,
        subtitle_start_y: title_start_y + title_height + spacing,
    }
}

/// Baseline of line `index` within a block starting at `start_y`.
pub fn line_y(start_y: f32, line_height: f32, index: usize) -> f32 {
    start_y + index as f32 * line_height + line_height / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_title_and_subtitle() {
        let layout = layout_blocks(
            BlockMetrics::new(2, 100.0, true),
            BlockMetrics::new(1, 50.0, true),
            540.0,
        );
        assert_eq!(layout.title_start_y, 135.0);
        assert_eq!(layout.subtitle_start_y, 355.0);
    }

    #[test]
    fn title_only_has_no_spacing() {
        let layout = layout_blocks(
            BlockMetrics::new(2, 100.0, true),
            BlockMetrics::new(3, 50.0, false),
            540.0,
        );
        assert_eq!(layout.title_start_y, 170.0);
        assert_eq!(layout.subtitle_start_y, 370.0);
    }

    #[test]
    fn subtitle_only_starts_at_title_start() {
        let layout = layout_blocks(
            BlockMetrics::absent(),
            BlockMetrics::new(2, 50.0, true),
            540.0,
        );
        assert_eq!(layout.title_start_y, 220.0);
        assert_eq!(layout.subtitle_start_y, 220.0);
    }

    #[test]
    fn overflowing_blocks_start_above_canvas() {
        let layout = layout_blocks(
            BlockMetrics::new(6, 100.0, true),
            BlockMetrics::absent(),
            540.0,
        );
        assert_eq!(layout.title_start_y, -30.0);
    }

    #[test]
    fn line_baselines_step_by_line_height() {
        assert_eq!(line_y(135.0, 100.0, 0), 185.0);
        assert_eq!(line_y(135.0, 100.0, 1), 285.0);
        assert_eq!(line_y(355.0, 50.0, 0), 380.0);
    }
}
