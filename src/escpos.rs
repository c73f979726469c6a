//! Minimal ESC/POS binary command builder for thermal receipt printers.
//!
//! Produces raw byte payloads for the printer bridge. Bold, alignment, and
//! cut are opaque control sequences wrapped around text spans; the receipt
//! renderer stays printer-agnostic and only talks to this builder. Text is
//! emitted as ASCII with `?` replacement, matching a printer fed CP437 with
//! replacement on unknown characters.

// ESC/POS command bytes
const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;

/// Paper width in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperWidth {
    Mm58,
    Mm80,
}

impl PaperWidth {
    pub fn chars(self) -> usize {
        match self {
            PaperWidth::Mm58 => 32,
            PaperWidth::Mm80 => 48,
        }
    }

    pub fn from_mm(mm: i32) -> Self {
        if mm <= 58 {
            PaperWidth::Mm58
        } else {
            PaperWidth::Mm80
        }
    }
}

/// Builder for generating ESC/POS binary command buffers.
///
/// ```rust,ignore
/// let data = {
///     let mut b = EscPosBuilder::new();
///     b.init()
///         .center()
///         .bold(true).text("CRAVEHUB CAFE").lf().bold(false)
///         .left()
///         .line_pair("NET TOTAL", "Rs. 900.00")
///         .feed(4)
///         .cut();
///     b.build()
/// };
/// ```
pub struct EscPosBuilder {
    buffer: Vec<u8>,
    paper: PaperWidth,
}

impl EscPosBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
            paper: PaperWidth::Mm80,
        }
    }

    pub fn with_paper(mut self, paper: PaperWidth) -> Self {
        self.paper = paper;
        self
    }

    pub fn paper(&self) -> PaperWidth {
        self.paper
    }

    /// ESC @ — Initialize printer, reset to defaults.
    pub fn init(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x40]);
        self
    }

    /// ESC t n — Select character code page.
    pub fn code_page(&mut self, page: u8) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x74, page]);
        self
    }

    /// ESC E n — Bold on/off.
    pub fn bold(&mut self, on: bool) -> &mut Self {
        self.buffer
            .extend_from_slice(&[ESC, 0x45, if on { 1 } else { 0 }]);
        self
    }

    /// ESC a 0 — Left-align.
    pub fn left(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 0]);
        self
    }

    /// ESC a 1 — Centre-align.
    pub fn center(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 1]);
        self
    }

    /// ESC a 2 — Right-align.
    pub fn right(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 2]);
        self
    }

    /// Append text. Bytes < 0x80 pass through; the rest become `?`.
    pub fn text(&mut self, s: &str) -> &mut Self {
        for ch in s.chars() {
            let code = ch as u32;
            if code < 0x80 {
                self.buffer.push(code as u8);
            } else {
                self.buffer.push(b'?');
            }
        }
        self
    }

    /// Append a line-feed.
    pub fn lf(&mut self) -> &mut Self {
        self.buffer.push(LF);
        self
    }

    /// Print a horizontal separator using dashes, matching paper width.
    pub fn separator(&mut self) -> &mut Self {
        let width = self.paper.chars();
        for _ in 0..width {
            self.buffer.push(b'-');
        }
        self.buffer.push(LF);
        self
    }

    /// Print a line with left-aligned label and right-aligned value.
    pub fn line_pair(&mut self, label: &str, value: &str) -> &mut Self {
        let width = self.paper.chars();
        let gap = width.saturating_sub(label.chars().count() + value.chars().count());
        self.text(label);
        for _ in 0..gap {
            self.buffer.push(b' ');
        }
        self.text(value);
        self.lf()
    }

    /// ESC d n — Feed n lines.
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x64, lines]);
        self
    }

    /// GS V A 16 — Partial cut with 16-dot feed.
    pub fn cut(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[GS, 0x56, 0x41, 0x10]);
        self
    }

    /// Consume the builder and return the binary ESC/POS payload.
    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new()
    }
}
