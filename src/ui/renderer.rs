/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Rasterize the world into the `front` buffer (array of Cell),
///      painting back to front: ground, platforms, player, cheese, finish line
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// World units are stretched to fill the terminal between the status row
/// and the help row, so the picture follows terminal resizes.

use std::io::{self, BufWriter, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::WorldConfig;
use crate::domain::geometry::Rect;
use crate::domain::rules::Outcome;
use crate::sim::world::{Phase, WorldState};
use super::sprite::Sprite;

// ── Palette ──

const SOIL: Color = Color::Rgb { r: 139, g: 90, b: 43 };
const GRASS: Color = Color::Rgb { r: 108, g: 194, b: 74 };
const PLATFORM: Color = Color::Rgb { r: 107, g: 142, b: 35 };
const PLAYER: Color = Color::Rgb { r: 34, g: 34, b: 34 };
const CHEESE: Color = Color::Rgb { r: 255, g: 209, b: 102 };
const CHEESE_HOLE: Color = Color::Rgb { r: 181, g: 101, b: 29 };
const POLE: Color = Color::Rgb { r: 51, g: 51, b: 51 };
const STATUS_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const WIN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const LOSE: Color = Color::Rgb { r: 255, g: 80, b: 80 };

/// Grass band thickness below the ground line (world units).
const GRASS_DEPTH: f32 = 16.0;
/// Finish pole size and flag stripes (world units).
const POLE_W: f32 = 6.0;
const POLE_H: f32 = 80.0;
const FLAG_W: f32 = 14.0;
const FLAG_STRIPE: f32 = 10.0;
const FLAG_STRIPES: usize = 8;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every empty cell; never the terminal default,
    /// which would show up as stripes between rows on some terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }

    fn solid(bg: Color) -> Self {
        Cell { ch: ' ', fg: Color::White, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::solid(bg));
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Viewport: world units → map cells ──

/// Terminal rows reserved above and below the map.
const STATUS_ROW: usize = 0;
const MAP_TOP: usize = 1;
const RESERVED_ROWS: usize = 2;

struct Viewport {
    cols: usize,
    rows: usize,
    /// World units per cell.
    sx: f32,
    sy: f32,
}

impl Viewport {
    fn new(world: &WorldConfig, buf_w: usize, buf_h: usize) -> Self {
        let cols = buf_w.max(1);
        let rows = buf_h.saturating_sub(RESERVED_ROWS).max(1);
        Viewport {
            cols,
            rows,
            sx: world.width / cols as f32,
            sy: world.height / rows as f32,
        }
    }

    /// Map cells touched by a world rectangle (map-relative rows), clipped.
    fn cells(&self, r: &Rect) -> Option<(Range<usize>, Range<usize>)> {
        let c0 = (r.x / self.sx).floor().max(0.0) as usize;
        let c1 = ((r.right() / self.sx).ceil().max(0.0) as usize).min(self.cols);
        let r0 = (r.y / self.sy).floor().max(0.0) as usize;
        let r1 = ((r.bottom() / self.sy).ceil().max(0.0) as usize).min(self.rows);
        if c0 >= c1 || r0 >= r1 {
            return None;
        }
        Some((c0..c1, r0..r1))
    }

    /// World coordinates of a map cell's center.
    fn cell_center(&self, col: usize, row: usize) -> (f32, f32) {
        ((col as f32 + 0.5) * self.sx, (row as f32 + 0.5) * self.sy)
    }
}

// ── Compose: build front buffer content ──

fn compose(buf: &mut FrameBuffer, w: &WorldState, sprite: Option<&Sprite>) {
    let view = Viewport::new(&w.bounds, buf.width, buf.height);
    let ground = w.bounds.ground_y();

    // Ground: soil first so the grass band survives coarse rows
    fill_world_rect(buf, &view, &Rect::new(0.0, ground, w.bounds.width, w.bounds.height - ground), Cell::solid(SOIL));
    fill_world_rect(buf, &view, &Rect::new(0.0, ground, w.bounds.width, GRASS_DEPTH), Cell::solid(GRASS));

    for p in &w.platforms {
        fill_world_rect(buf, &view, &p.rect, Cell::solid(PLATFORM));
    }

    compose_player(buf, &view, w, sprite);
    compose_cheese(buf, &view, w);
    compose_finish_line(buf, &view, &w.bounds);

    compose_status(buf, w);
    if let Phase::Ended(outcome) = w.phase {
        compose_banner(buf, &view, outcome);
    }
    compose_help(buf);
}

fn fill_world_rect(buf: &mut FrameBuffer, view: &Viewport, r: &Rect, cell: Cell) {
    let Some((cols, rows)) = view.cells(r) else { return };
    for row in rows {
        for col in cols.clone() {
            buf.set(col, MAP_TOP + row, cell);
        }
    }
}

fn compose_player(buf: &mut FrameBuffer, view: &Viewport, w: &WorldState, sprite: Option<&Sprite>) {
    let bounds = w.player.body.bounds();
    let Some((cols, rows)) = view.cells(&bounds) else { return };

    let Some(sprite) = sprite else {
        fill_world_rect(buf, view, &bounds, Cell::solid(PLAYER));
        return;
    };

    for row in rows {
        for col in cols.clone() {
            let (cx, cy) = view.cell_center(col, row);
            let u = (cx - bounds.x) / bounds.w;
            let v = (cy - bounds.y) / bounds.h;
            if let Some(ch) = sprite.sample(u, v) {
                let bg = buf.get(col, MAP_TOP + row).bg;
                buf.set(col, MAP_TOP + row, Cell::new(ch, Color::White, bg));
            }
        }
    }
}

fn compose_cheese(buf: &mut FrameBuffer, view: &Viewport, w: &WorldState) {
    let body = &w.cheese.body;
    let r = w.cheese.radius();
    let (ccx, ccy) = body.center();
    let Some((cols, rows)) = view.cells(&body.bounds()) else { return };

    let mut painted = false;
    for row in rows {
        for col in cols.clone() {
            let (x, y) = view.cell_center(col, row);
            if (x - ccx).hypot(y - ccy) <= r {
                let hole = (col + row) % 3 == 0;
                let cell = if hole { Cell::new('o', CHEESE_HOLE, CHEESE) } else { Cell::solid(CHEESE) };
                buf.set(col, MAP_TOP + row, cell);
                painted = true;
            }
        }
    }

    // Smaller than a cell: mark the cell under its center
    if !painted {
        let col = ((ccx / view.sx) as usize).min(view.cols - 1);
        let row = ((ccy / view.sy) as usize).min(view.rows - 1);
        buf.set(col, MAP_TOP + row, Cell::new('o', CHEESE_HOLE, CHEESE));
    }
}

fn compose_finish_line(buf: &mut FrameBuffer, view: &Viewport, world: &WorldConfig) {
    let x = world.level_end_x();
    let top = world.ground_y() - POLE_H;
    fill_world_rect(buf, view, &Rect::new(x, top, POLE_W, POLE_H), Cell::solid(POLE));
    for i in 0..FLAG_STRIPES {
        let color = if i % 2 == 1 { Color::White } else { Color::Black };
        let stripe = Rect::new(x - FLAG_W, top + i as f32 * FLAG_STRIPE, FLAG_W, FLAG_STRIPE);
        fill_world_rect(buf, view, &stripe, Cell::solid(color));
    }
}

fn compose_status(buf: &mut FrameBuffer, w: &WorldState) {
    let fg = match w.outcome() {
        Some(Outcome::Captured) => WIN,
        Some(Outcome::Escaped) => LOSE,
        None => Color::White,
    };
    buf.fill_row(STATUS_ROW, STATUS_BG);
    buf.put_str(1, STATUS_ROW, &w.message, fg, STATUS_BG);
}

fn compose_banner(buf: &mut FrameBuffer, view: &Viewport, outcome: Outcome) {
    let (title, color) = match outcome {
        Outcome::Captured => ("★  GOT IT!  ★", WIN),
        Outcome::Escaped => ("✕  IT GOT AWAY  ✕", LOSE),
    };
    let lines = [title, "", "R: play again    Esc: quit"];
    let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    let box_w = inner.min(buf.width);
    let box_h = lines.len() + 2;
    let x0 = buf.width.saturating_sub(box_w) / 2;
    let y0 = MAP_TOP + view.rows.saturating_sub(box_h) / 3;

    for y in y0..y0 + box_h {
        for x in x0..x0 + box_w {
            buf.set(x, y, Cell::solid(STATUS_BG));
        }
    }
    for (i, line) in lines.iter().enumerate() {
        let lx = x0 + box_w.saturating_sub(line.chars().count()) / 2;
        let fg = if i == 0 { color } else { Color::Grey };
        buf.put_str(lx, y0 + 1 + i, line, fg, STATUS_BG);
    }
}

fn compose_help(buf: &mut FrameBuffer) {
    let Some(row) = buf.height.checked_sub(1) else { return };
    if row <= STATUS_ROW { return; }
    let help = " ←/→ A/D: run   ↑ W Space: jump   R: restart   Esc/Q: quit";
    buf.fill_row(row, Cell::BASE_BG);
    buf.put_str(0, row, help, Color::DarkGrey, Cell::BASE_BG);
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen.
    /// Returns whether the terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, sprite: Option<&Sprite>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clean repaint so the banner leaves no residue
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        compose(&mut self.front, world, sprite);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        // Position of the terminal cursor after the last print, if known
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(last_fg),
            SetBackgroundColor(last_bg),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn world() -> WorldState {
        WorldState::new(&GameConfig::default())
    }

    fn frame(w: &WorldState, sprite: Option<&Sprite>) -> FrameBuffer {
        let mut buf = FrameBuffer::new(80, 24);
        compose(&mut buf, w, sprite);
        buf
    }

    fn row_text(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width).map(|x| buf.get(x, y).ch).collect()
    }

    /// Buffer cell under a world point.
    fn cell_at(buf: &FrameBuffer, w: &WorldState, x: f32, y: f32) -> Cell {
        let view = Viewport::new(&w.bounds, buf.width, buf.height);
        buf.get((x / view.sx) as usize, MAP_TOP + (y / view.sy) as usize)
    }

    #[test]
    fn viewport_covers_whole_world() {
        let w = world();
        let view = Viewport::new(&w.bounds, 80, 24);
        let (cols, rows) = view.cells(&Rect::new(0.0, 0.0, 800.0, 400.0)).unwrap();
        assert_eq!(cols, 0..80);
        assert_eq!(rows, 0..22);
    }

    #[test]
    fn thin_rect_still_gets_a_cell() {
        let w = world();
        let view = Viewport::new(&w.bounds, 80, 24);
        let (cols, _) = view.cells(&Rect::new(761.0, 0.0, 1.0, 10.0)).unwrap();
        assert_eq!(cols.len(), 1);
    }

    #[test]
    fn offscreen_rect_has_no_cells() {
        let w = world();
        let view = Viewport::new(&w.bounds, 80, 24);
        assert!(view.cells(&Rect::new(900.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn status_row_shows_message() {
        let w = world();
        let buf = frame(&w, None);
        assert!(row_text(&buf, STATUS_ROW).contains(&w.message));
    }

    #[test]
    fn placeholder_player_without_sprite() {
        let w = world();
        let buf = frame(&w, None);
        let (x, y) = w.player.body.center();
        assert_eq!(cell_at(&buf, &w, x, y).bg, PLAYER);
    }

    #[test]
    fn sprite_replaces_placeholder() {
        let w = world();
        let sprite = Sprite::parse("@@@\n@@@\n@@@").unwrap();
        let buf = frame(&w, Some(&sprite));
        let (x, y) = w.player.body.center();
        let cell = cell_at(&buf, &w, x, y);
        assert_eq!(cell.ch, '@');
        assert_ne!(cell.bg, PLAYER);
    }

    #[test]
    fn cheese_and_ground_are_drawn() {
        let w = world();
        let buf = frame(&w, None);
        let (x, y) = w.cheese.body.center();
        assert_eq!(cell_at(&buf, &w, x, y).bg, CHEESE);
        assert_eq!(cell_at(&buf, &w, 400.0, 395.0).bg, SOIL);
    }

    #[test]
    fn banner_only_when_ended() {
        let mut w = world();
        let playing = frame(&w, None);
        assert!(!(0..playing.height).any(|y| row_text(&playing, y).contains("play again")));

        w.finish(Outcome::Escaped);
        let ended = frame(&w, None);
        assert!((0..ended.height).any(|y| row_text(&ended, y).contains("IT GOT AWAY")));
        assert!(row_text(&ended, STATUS_ROW).contains(Outcome::Escaped.message()));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let w = world();
        for (cw, ch) in [(1, 1), (2, 3), (5, 2), (0, 0)] {
            let mut buf = FrameBuffer::new(cw, ch);
            compose(&mut buf, &w, None);
        }
    }
}
