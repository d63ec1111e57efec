/// Presentation layer: double-buffered, diff-based terminal renderer that
/// plays the part of the character LCD.
///
/// How it works:
///   1. `Surface` calls update the LCD contents (`lcd`, one glyph per cell)
///   2. `present` composes the next frame into the `front` buffer
///      (HUD, bezel, LCD, help line)
///   3. Compare each cell with the `back` buffer (previous frame)
///   4. Only emit terminal commands for cells that changed, batched with
///      `queue!` and flushed once
///   5. Swap front/back
///
/// Custom glyphs cannot be programmed into a terminal, so each registered
/// glyph is shown as its stand-in character in its tint.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::glyph::{CustomGlyph, Glyph};
use crate::domain::grid::Pos;
use super::surface::Surface;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every terminal cell, so the gaps between
    /// rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    /// LCD panel background.
    const LCD_BG: Color = Color::Rgb { r: 40, g: 70, b: 40 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    /// Write a string at (x, y). Each char occupies 1 column, so callers
    /// pass ASCII only.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Renderer ──

/// Each LCD cell is 2 terminal columns wide so the grid looks square.
const CELL_W: usize = 2;

/// Vertical layout
const HUD_ROW: usize = 0;
const BEZEL_ROW: usize = 2;

/// Status line shown above the LCD.
pub struct Hud<'a> {
    pub level: &'a str,
    pub deaths: u32,
    pub clears: u32,
}

pub struct TerminalSurface {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    rows: usize,
    cols: usize,
    /// Current LCD contents, row-major.
    lcd: Vec<Glyph>,
    custom: Vec<CustomGlyph>,
}

impl TerminalSurface {
    pub fn new(rows: usize, cols: usize) -> Self {
        TerminalSurface {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            rows,
            cols,
            lcd: vec![Glyph::BLANK; rows * cols],
            custom: vec![],
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn present(&mut self, hud: &Hud) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_hud(hud);
        self.compose_bezel();
        self.compose_lcd();
        self.compose_help();

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, never ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
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
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, hud: &Hud) {
        let bg = Color::Rgb { r: 20, g: 20, b: 60 };
        let line = format!(" {}   Deaths:{:<4} Clears:{:<4}", hud.level, hud.deaths, hud.clears);
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, bg));
        }
        self.front.put_str(0, HUD_ROW, &line, Color::White, bg);
    }

    fn compose_bezel(&mut self) {
        let fg = Color::Rgb { r: 120, g: 120, b: 140 };
        let inner = self.cols * CELL_W;
        let edge = format!("+{}+", "-".repeat(inner));
        self.front.put_str(0, BEZEL_ROW, &edge, fg, Cell::BASE_BG);
        for r in 0..self.rows {
            let y = BEZEL_ROW + 1 + r;
            self.front.set(0, y, Cell::new('|', fg, Cell::BASE_BG));
            self.front.set(inner + 1, y, Cell::new('|', fg, Cell::BASE_BG));
        }
        self.front.put_str(0, BEZEL_ROW + 1 + self.rows, &edge, fg, Cell::BASE_BG);
    }

    fn compose_lcd(&mut self) {
        for r in 0..self.rows {
            for c in 0..self.cols {
                let (ch, fg) = self.appearance(self.lcd[r * self.cols + c]);
                let x = 1 + c * CELL_W;
                let y = BEZEL_ROW + 1 + r;
                self.front.set(x, y, Cell::new(ch, fg, Cell::LCD_BG));
                self.front.set(x + 1, y, Cell::new(' ', fg, Cell::LCD_BG));
            }
        }
    }

    fn compose_help(&mut self) {
        let y = BEZEL_ROW + self.rows + 3;
        let help = " Left/A  Right/D  Up/W/Space:Jump  R:Reset  Esc/Q:Quit";
        self.front.put_str(0, y, help, Color::DarkGrey, Cell::BASE_BG);
    }

    /// Terminal character and color for a glyph.
    fn appearance(&self, glyph: Glyph) -> (char, Color) {
        match glyph {
            Glyph::Char(ch) => (ch, Color::Rgb { r: 200, g: 230, b: 200 }),
            Glyph::Custom(id) => match self.custom.iter().find(|g| g.id == id) {
                Some(g) => {
                    let (r, gr, b) = g.tint;
                    (g.stand_in, Color::Rgb { r, g: gr, b })
                }
                None => ('?', Color::Red),
            },
        }
    }
}

impl Surface for TerminalSurface {
    fn clear(&mut self) {
        self.lcd.fill(Glyph::BLANK);
    }

    fn draw(&mut self, pos: Pos, glyph: Glyph) {
        assert!(pos.row < self.rows && pos.col < self.cols, "draw out of range: {:?}", pos);
        self.lcd[pos.row * self.cols + pos.col] = glyph;
    }

    fn register_custom_glyph(&mut self, glyph: &CustomGlyph) {
        log::debug!("glyph {} as {:?}, bitmap {:02x?}", glyph.id, glyph.stand_in, glyph.bitmap);
        self.custom.retain(|g| g.id != glyph.id);
        self.custom.push(*glyph);
    }
}
