use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::color::Rgba;
use crate::sim::{Simulation, TickAccumulator};
use crate::tuning::Tuning;

// Logical pixels per character cell; terminal cells are roughly twice as
// tall as they are wide.
const CELL_W: f32 = 4.0;
const CELL_H: f32 = 8.0;

#[derive(Debug, Clone, Copy)]
pub struct ConsoleArgs {
    pub fps: u32,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
}

impl Cell {
    const BLANK: Self = Self {
        ch: ' ',
        fg: Color::Reset,
    };
}

struct Grid {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl Grid {
    fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::BLANK; cols as usize * rows as usize],
        }
    }

    fn put(&mut self, col: i32, row: i32, ch: char, fg: Color) {
        if col < 0 || row < 0 || col >= i32::from(self.cols) || row >= i32::from(self.rows) {
            return;
        }
        self.cells[row as usize * self.cols as usize + col as usize] = Cell { ch, fg };
    }
}

/// ANSI terminal renderer: maps the same scene state onto character cells.
/// Runs until `q`/Esc; `r` regenerates in place.
pub fn run_console(tuning: Tuning, args: ConsoleArgs) -> Result<()> {
    let fps = args.fps.max(1);
    let (cols, rows) = terminal::size().context("failed to query terminal size")?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut sim = Simulation::with_tuning(logical_width(cols), logical_height(rows), tuning, rng);

    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)
        .context("failed to enter alternate screen")?;

    let result = event_loop(&mut stdout, &mut sim, fps);

    // Restore the terminal even when the loop failed.
    let _ = execute!(stdout, ResetColor, cursor::Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    result
}

fn logical_width(cols: u16) -> u32 {
    (f32::from(cols) * CELL_W) as u32
}

fn logical_height(rows: u16) -> u32 {
    (f32::from(rows) * CELL_H) as u32
}

fn event_loop(stdout: &mut io::Stdout, sim: &mut Simulation, fps: u32) -> Result<()> {
    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(fps));
    let mut accumulator = TickAccumulator::new();
    let mut last = Instant::now();
    let (mut cols, mut rows) = terminal::size().context("failed to query terminal size")?;

    loop {
        let deadline = Instant::now() + frame_interval;
        while event::poll(deadline.saturating_duration_since(Instant::now()))
            .context("failed to poll terminal events")?
        {
            match event::read().context("failed to read terminal event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('r') => sim.regenerate(logical_width(cols), logical_height(rows)),
                    _ => {}
                },
                Event::Resize(new_cols, new_rows) => {
                    cols = new_cols;
                    rows = new_rows;
                    sim.regenerate(logical_width(cols), logical_height(rows));
                }
                _ => {}
            }
        }

        let now = Instant::now();
        for _ in 0..accumulator.advance(now - last) {
            sim.step();
        }
        last = now;

        draw(stdout, sim, cols, rows).context("failed to draw frame")?;
    }
}

fn draw(stdout: &mut io::Stdout, sim: &Simulation, cols: u16, rows: u16) -> Result<()> {
    let mut grid = Grid::new(cols, rows);
    paint_tree(&mut grid, sim);
    paint_garlands(&mut grid, sim);
    paint_ornaments(&mut grid, sim);
    paint_snow(&mut grid, sim);

    queue!(stdout, cursor::MoveTo(0, 0), ResetColor)?;
    queue!(
        stdout,
        Print("tannenbaum (console) - q quits, r regenerates")
    )?;

    let mut current = Color::Reset;
    for row in 1..grid.rows {
        queue!(stdout, cursor::MoveTo(0, row))?;
        for col in 0..grid.cols {
            let cell = grid.cells[row as usize * grid.cols as usize + col as usize];
            if cell.fg != current {
                queue!(stdout, SetForegroundColor(cell.fg))?;
                current = cell.fg;
            }
            queue!(stdout, Print(cell.ch))?;
        }
    }
    stdout.flush()?;
    Ok(())
}

fn cell_of(x: f32, y: f32) -> (i32, i32) {
    ((x / CELL_W) as i32, (y / CELL_H) as i32)
}

fn fg(color: Rgba) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

fn paint_tree(grid: &mut Grid, sim: &Simulation) {
    let layout = sim.layout();
    let tuning = sim.tuning();
    let center_col = (layout.center_x() / CELL_W) as i32;

    for row in 0..i32::from(grid.rows) {
        let y = (row as f32 + 0.5) * CELL_H;
        let half_w = layout.half_width_at(y);
        if half_w > 0.0 {
            let reach = (half_w / CELL_W) as i32;
            // Alternate shade per row so the cone reads as boughs.
            let shade = if row % 2 == 0 {
                fg(tuning.needle_green.adjust(60))
            } else {
                fg(tuning.needle_green)
            };
            for col in (center_col - reach)..=(center_col + reach) {
                grid.put(col, row, '^', shade);
            }
        }
    }

    let trunk = layout.trunk();
    let (trunk_col0, trunk_row0) = cell_of(trunk.x, trunk.y);
    let (trunk_col1, trunk_row1) = cell_of(trunk.x + trunk.width, trunk.y + trunk.height);
    for row in trunk_row0..=trunk_row1 {
        for col in trunk_col0..=trunk_col1.max(trunk_col0 + 1) {
            grid.put(col, row, '#', fg(Rgba::rgb(120, 65, 28)));
        }
    }

    let (star_x, star_y) = layout.star_center();
    let (star_col, star_row) = cell_of(star_x, star_y);
    grid.put(star_col, star_row, '*', fg(tuning.star_gold));
}

fn paint_garlands(grid: &mut Grid, sim: &Simulation) {
    let tuning = sim.tuning();
    let spacing = tuning.garland_bead_spacing.max(1) as usize;

    for layer_index in 0..sim.layout().layers().len() {
        for (i, (x, y)) in sim.garland_points(layer_index).iter().enumerate().step_by(spacing) {
            let (col, row) = cell_of(*x, *y);
            let color = if sim.garland_bead_lit(i as u32, layer_index) {
                fg(Rgba::rgb(255, 80, 80))
            } else {
                fg(tuning.garland_gold)
            };
            grid.put(col, row, 'o', color);
        }
    }
}

fn paint_ornaments(grid: &mut Grid, sim: &Simulation) {
    for ornament in &sim.scene().ornaments {
        let (col, row) = cell_of(ornament.x, ornament.y);
        let color = if ornament.on {
            ornament.color_a
        } else {
            ornament.color_b
        };
        grid.put(col, row, 'o', fg(color));
    }
}

fn paint_snow(grid: &mut Grid, sim: &Simulation) {
    for flake in &sim.scene().snowflakes {
        let (col, row) = cell_of(flake.x, flake.y);
        let ch = if flake.radius >= 2.0 { '*' } else { '.' };
        grid.put(col, row, ch, Color::White);
    }
}

#[cfg(test)]
mod tests {
    use super::{cell_of, Grid};
    use crossterm::style::Color;

    #[test]
    fn grid_ignores_out_of_range_cells() {
        let mut grid = Grid::new(10, 4);
        grid.put(-1, 0, 'x', Color::White);
        grid.put(0, 99, 'x', Color::White);
        grid.put(3, 2, 'x', Color::White);
        assert_eq!(grid.cells.iter().filter(|c| c.ch == 'x').count(), 1);
    }

    #[test]
    fn cells_map_logical_pixels_down() {
        assert_eq!(cell_of(0.0, 0.0), (0, 0));
        assert_eq!(cell_of(9.0, 17.0), (2, 2));
    }
}
