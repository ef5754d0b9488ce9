use owo_colors::{OwoColorize, Stream, Style};
use pciinfo::{BarIndex, DevicePath};

pub const ERROR_STYLE: Style = Style::new().red().bold();
pub const LABEL_STYLE: Style = Style::new().blue().bold();
pub const UNUSED_STYLE: Style = Style::new().dimmed();

/// Width of the widest label, `Device`
const LABEL_WIDTH: usize = 6;

pub struct Cell {
    pub text: String,
    pub style: Style,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Cell {
            text: text.into(),
            style: Style::new(),
        }
    }
    pub fn unused() -> Self {
        Cell {
            text: "unused".into(),
            style: UNUSED_STYLE,
        }
    }
    pub fn dimmed(text: impl Into<String>) -> Self {
        Cell {
            text: text.into(),
            style: UNUSED_STYLE,
        }
    }
}

/// One labelled line of the report.
pub struct ReportRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

impl ReportRow {
    pub fn device(path: &DevicePath) -> Self {
        ReportRow {
            label: "Device".into(),
            cells: vec![Cell::plain(path.to_string())],
        }
    }
    /// Empty row for one BAR slot, filled in by the caller.
    pub fn bar(bar: BarIndex) -> Self {
        ReportRow {
            label: format!("BAR{bar}"),
            cells: Vec::with_capacity(3),
        }
    }
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }
}

pub fn print_rows(rows: &[ReportRow]) {
    for ReportRow { label, cells } in rows {
        let label = format!("{label:<LABEL_WIDTH$}");
        print!(
            "{}: ",
            label.if_supports_color(Stream::Stdout, |text| text.style(LABEL_STYLE))
        );
        for Cell { text, style } in cells {
            print!(
                "{}",
                text.if_supports_color(Stream::Stdout, |text| text.style(*style))
            );
        }
        println!();
    }
}

pub fn print_error(err: &impl std::fmt::Display) {
    eprintln!(
        "{}",
        err.if_supports_color(Stream::Stderr, |text| text.style(ERROR_STYLE))
    );
}
